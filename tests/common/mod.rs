//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub const SCRIPT: &str = "\
on init
    declare $count
    declare ui_knob $volume (0, 100, 1)
end on

on ui_control ($volume)
    $count := $count + 1
end on
";

/// Upper-cases the input file into the output file.
pub const UPPERCASE: &str = "while [ $# -gt 2 ]; do shift; done\ntr a-z A-Z < \"$1\" > \"$2\"\n";

/// Scratch directory that also serves as `HOME`, so a developer's own
/// `~/.ksp/config.toml` never leaks into a test.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Write a config whose compiler is a shell script with `body`.
    /// The script sees the input file as `$input`.
    pub fn fake_compiler(&self, body: &str) -> PathBuf {
        let script = self.write(
            "compiler.sh",
            &format!("for arg; do input=$arg; done\n{body}\n"),
        );
        self.config(&format!(
            "[compiler]\nexecutable = \"sh\"\nscript = '{}'\n",
            script.display()
        ))
    }

    /// Write a config whose compiler script is used verbatim.
    pub fn raw_compiler(&self, body: &str) -> PathBuf {
        let script = self.write("compiler.sh", body);
        self.config(&format!(
            "[compiler]\nexecutable = \"sh\"\nscript = '{}'\n",
            script.display()
        ))
    }

    pub fn config(&self, content: &str) -> PathBuf {
        self.write("config.toml", content)
    }

    /// The `ksp` binary with `HOME` pointed at this workspace.
    pub fn ksp(&self) -> Command {
        let mut cmd = Command::cargo_bin("ksp").unwrap();
        cmd.env("HOME", self.path()).env("RUST_LOG", "warn");
        cmd
    }
}
