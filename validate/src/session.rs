//! Per-document sessions and the registry that owns them.
//!
//! A session bundles the debounce gate, the running flag and the last
//! published diagnostics for one document. Removing a session from the
//! registry is how it dies; a later request for the same key creates a fresh
//! one with a new id, so results of the old session's run are discarded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ksp_types::{Diagnostic, DocumentKey};

use crate::debounce::DebounceGate;
use crate::types::DiagnosticsSnapshot;

/// Identity of one session instance.
pub type SessionId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    /// A compiler process is in flight.
    Running,
    /// A setup failure tripped the breaker; requests are suppressed until
    /// the compiler executable changes.
    Paused,
}

pub struct Session {
    id: SessionId,
    gate: DebounceGate,
    running: Arc<AtomicBool>,
    paused: bool,
    diagnostics: Vec<Diagnostic>,
    last_executable: Option<PathBuf>,
}

impl Session {
    fn new(id: SessionId) -> Self {
        Self {
            id,
            gate: DebounceGate::new(Duration::ZERO),
            running: Arc::new(AtomicBool::new(false)),
            paused: false,
            diagnostics: Vec::new(),
            last_executable: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.running.load(Ordering::Acquire) {
            SessionState::Running
        } else if self.paused {
            SessionState::Paused
        } else {
            SessionState::Idle
        }
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub(crate) fn gate_mut(&mut self) -> &mut DebounceGate {
        &mut self.gate
    }

    /// Shared handle to the running flag, set by the run task for the
    /// lifetime of the process.
    pub(crate) fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub(crate) fn set_last_executable(&mut self, executable: PathBuf) {
        self.last_executable = Some(executable);
    }

    pub(crate) fn pause(&mut self) {
        self.paused = true;
    }

    /// Clear the breaker after a run that started and exited.
    pub(crate) fn resume(&mut self) {
        self.paused = false;
    }

    /// Replace the whole diagnostic set.
    pub(crate) fn publish(&mut self, diagnostics: Vec<Diagnostic>) {
        self.diagnostics = diagnostics;
    }
}

/// Registry of live sessions, keyed by document.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: HashMap<DocumentKey, Session>,
    next_id: SessionId,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `key`, creating it on first use.
    pub fn get_or_create(&mut self, key: &DocumentKey) -> &mut Session {
        let next_id = &mut self.next_id;
        self.sessions.entry(key.clone()).or_insert_with(|| {
            *next_id += 1;
            tracing::debug!(document = %key, session = *next_id, "Session created");
            Session::new(*next_id)
        })
    }

    #[must_use]
    pub fn get(&self, key: &DocumentKey) -> Option<&Session> {
        self.sessions.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &DocumentKey) -> Option<&mut Session> {
        self.sessions.get_mut(key)
    }

    /// The live session for `key` if it is still the instance `id`.
    pub(crate) fn current_mut(&mut self, key: &DocumentKey, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(key).filter(|s| s.id == id)
    }

    /// Remove the session for `key`, cancelling its pending run and dropping
    /// its diagnostics. Returns whether a session existed.
    pub fn dispose(&mut self, key: &DocumentKey) -> bool {
        match self.sessions.remove(key) {
            Some(mut session) => {
                session.gate.cancel();
                tracing::debug!(document = %key, session = session.id, "Session disposed");
                true
            }
            None => false,
        }
    }

    pub fn dispose_all(&mut self) {
        let keys: Vec<DocumentKey> = self.sessions.keys().cloned().collect();
        for key in keys {
            self.dispose(&key);
        }
    }

    /// Clear the breaker on sessions that last ran a different executable.
    /// Returns the number of sessions resumed.
    pub fn resume_changed(&mut self, executable: &Path) -> usize {
        let mut resumed = 0;
        for (key, session) in &mut self.sessions {
            if session.paused && session.last_executable.as_deref() != Some(executable) {
                session.paused = false;
                resumed += 1;
                tracing::info!(document = %key, "Validation resumed after executable change");
            }
        }
        resumed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Snapshot of non-empty diagnostic sets: documents with errors first,
    /// then by key.
    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        let mut documents: Vec<(DocumentKey, Vec<Diagnostic>)> = self
            .sessions
            .iter()
            .filter(|(_, session)| !session.diagnostics.is_empty())
            .map(|(key, session)| (key.clone(), session.diagnostics.clone()))
            .collect();

        documents.sort_by(|a, b| {
            let a_has_errors = a.1.iter().any(|d| d.severity().is_error());
            let b_has_errors = b.1.iter().any(|d| d.severity().is_error());
            b_has_errors
                .cmp(&a_has_errors)
                .then_with(|| a.0.as_str().cmp(b.0.as_str()))
        });

        DiagnosticsSnapshot::new(documents)
    }
}
