//! Line framing for compiler output.
//!
//! The compiler writes one record per line, but pipe reads deliver arbitrary
//! chunks. [`LineReader`] reassembles complete lines before anything is
//! classified, so a marker split across two reads is still seen whole.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Maximum retained line length (64 KiB). Bytes past it are discarded up to
/// the next newline, so a runaway line never grows the buffer further.
const MAX_LINE_BYTES: usize = 64 * 1024;

/// Reads `\n` or `\r\n` terminated lines from an async reader.
///
/// Invalid UTF-8 is replaced lossily; a trailing line without a terminator
/// is returned at EOF.
pub struct LineReader<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            buf: Vec::new(),
        }
    }

    /// Read the next line without its terminator.
    ///
    /// Returns `Ok(None)` on EOF.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        let mut read_any = false;
        let mut terminated = false;
        let mut dropped = 0usize;

        while !terminated {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                break;
            }
            read_any = true;

            let (chunk, used) = match available.iter().position(|&b| b == b'\n') {
                Some(newline) => {
                    terminated = true;
                    (&available[..newline], newline + 1)
                }
                None => (available, available.len()),
            };
            let room = MAX_LINE_BYTES - self.buf.len();
            let kept = chunk.len().min(room);
            self.buf.extend_from_slice(&chunk[..kept]);
            dropped += chunk.len() - kept;
            self.reader.consume(used);
        }

        if !read_any {
            return Ok(None);
        }
        if dropped > 0 {
            tracing::debug!(dropped, "Truncating over-long compiler output line");
        } else if terminated && self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }

        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}
