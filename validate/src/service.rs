//! `ValidationService`: the facade editors and the CLI drive.
//!
//! All state lives here and is mutated only through `&mut self`, on whatever
//! task owns the service. Debounce timers and compiler processes run as
//! spawned tasks that report back over a channel; results are applied by
//! [`ValidationService::poll_events`] or [`ValidationService::next_run`].

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use globset::{Glob, GlobSet, GlobSetBuilder};
use ksp_types::{Diagnostic, DocumentKey};
use tokio::sync::mpsc;

use crate::exec::{self, RunReport};
use crate::observer::{OutputEcho, RunObserver};
use crate::runner;
use crate::session::{Session, SessionId, SessionRegistry, SessionState};
use crate::types::{
    CompilerOptions, DEFAULT_LIVE_DELAY_MS, DiagnosticsSnapshot, DocumentEvent, MIN_LIVE_DELAY_MS,
    Notice, NoticeKind, RunOutcome, RunRequest, RunSummary, ValidateSettings,
};

/// Channel capacity for completed runs waiting to be applied.
const RESULT_CHANNEL_CAPACITY: usize = 64;

struct RunResult {
    document: DocumentKey,
    session: SessionId,
    /// Executable the run was started with.
    executable: PathBuf,
    report: RunReport,
}

/// Compile file patterns into a matcher. Invalid patterns are returned
/// separately and left out.
fn build_patterns(patterns: &[String]) -> (GlobSet, Vec<String>) {
    let mut builder = GlobSetBuilder::new();
    let mut invalid = Vec::new();
    for pattern in patterns {
        match Glob::new(pattern) {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => {
                tracing::warn!("Ignoring invalid file pattern '{pattern}': {e}");
                invalid.push(pattern.clone());
            }
        }
    }
    let set = builder.build().unwrap_or_else(|e| {
        tracing::warn!("Failed to build file pattern set: {e}");
        GlobSet::empty()
    });
    (set, invalid)
}

pub struct ValidationService {
    compiler: CompilerOptions,
    settings: ValidateSettings,
    /// Effective live delay after the minimum check.
    live_delay: Duration,
    /// The short-delay warning is surfaced once per service.
    delay_warned: bool,
    patterns: GlobSet,
    registry: SessionRegistry,
    observers: Vec<Arc<dyn RunObserver>>,
    open: HashSet<DocumentKey>,
    programmatic_saves: HashSet<DocumentKey>,
    live_edits: HashSet<DocumentKey>,
    notices: VecDeque<Notice>,
    result_rx: mpsc::Receiver<RunResult>,
    result_tx: mpsc::Sender<RunResult>,
}

impl ValidationService {
    #[must_use]
    pub fn new(compiler: CompilerOptions, settings: ValidateSettings) -> Self {
        let (result_tx, result_rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        let mut service = Self {
            compiler,
            settings: ValidateSettings::default(),
            live_delay: Duration::from_millis(DEFAULT_LIVE_DELAY_MS),
            delay_warned: false,
            patterns: GlobSet::empty(),
            registry: SessionRegistry::new(),
            observers: Vec::new(),
            open: HashSet::new(),
            programmatic_saves: HashSet::new(),
            live_edits: HashSet::new(),
            notices: VecDeque::new(),
            result_rx,
            result_tx,
        };
        service.set_settings(settings);
        service
    }

    fn set_settings(&mut self, settings: ValidateSettings) {
        self.live_delay = if let Some(delay) = settings.live_delay() {
            delay
        } else {
            tracing::warn!(
                delay_ms = settings.delay_ms,
                "Live validation delay below minimum; using default"
            );
            if !self.delay_warned {
                self.delay_warned = true;
                self.notices.push_back(Notice::new(
                    NoticeKind::ConfigWarning,
                    None,
                    format!(
                        "Live validation delay of {} ms is below the minimum of {MIN_LIVE_DELAY_MS} ms; using {DEFAULT_LIVE_DELAY_MS} ms",
                        settings.delay_ms
                    ),
                ));
            }
            Duration::from_millis(DEFAULT_LIVE_DELAY_MS)
        };

        let (patterns, invalid) = build_patterns(&settings.file_patterns);
        for pattern in invalid {
            self.notices.push_back(Notice::new(
                NoticeKind::ConfigWarning,
                None,
                format!("Ignoring invalid file pattern '{pattern}'"),
            ));
        }
        self.patterns = patterns;
        self.settings = settings;
    }

    /// Replace the configuration.
    ///
    /// Takes effect on the next request. Paused sessions resume when the
    /// executable changed; with validation enabled, every open document is
    /// validated again.
    pub fn apply_config(&mut self, compiler: CompilerOptions, settings: ValidateSettings) {
        let executable_changed = compiler.executable != self.compiler.executable;
        self.compiler = compiler;
        self.set_settings(settings);

        if executable_changed {
            let resumed = self.registry.resume_changed(&self.compiler.executable);
            tracing::debug!(resumed, "Compiler executable changed");
        }

        if self.settings.enabled {
            let mut open: Vec<DocumentKey> = self.open.iter().cloned().collect();
            open.sort();
            for key in open {
                if self.matches(&key) {
                    self.validate(&key, Duration::ZERO);
                }
            }
        }
    }

    /// Register an observer for all future runs.
    pub fn add_observer(&mut self, observer: Arc<dyn RunObserver>) {
        self.observers.push(observer);
    }

    fn matches(&self, key: &DocumentKey) -> bool {
        self.patterns.is_match(key.as_str())
    }

    fn should_validate(&self, key: &DocumentKey) -> bool {
        self.settings.enabled && self.matches(key)
    }

    /// React to a document lifecycle event.
    pub fn handle(&mut self, event: DocumentEvent) {
        match event {
            DocumentEvent::Opened(key) => {
                self.open.insert(key.clone());
                if self.should_validate(&key) {
                    self.validate(&key, Duration::ZERO);
                }
            }
            DocumentEvent::Saved(key) => {
                if self.programmatic_saves.contains(&key) {
                    tracing::debug!(document = %key, "Ignoring programmatic save");
                    return;
                }
                self.live_edits.remove(&key);
                if self.should_validate(&key) {
                    self.validate(&key, Duration::ZERO);
                }
            }
            DocumentEvent::Edited(key) => {
                if self.settings.live && self.should_validate(&key) {
                    self.live_edits.insert(key.clone());
                    self.validate(&key, self.live_delay);
                }
            }
            DocumentEvent::Closed(key) => {
                self.open.remove(&key);
                self.live_edits.remove(&key);
                self.programmatic_saves.remove(&key);
                self.registry.dispose(&key);
            }
        }
    }

    /// Mark a save of `key` as issued by the host on our behalf; its
    /// `Saved` event is ignored until [`Self::end_programmatic_save`].
    pub fn begin_programmatic_save(&mut self, key: &DocumentKey) {
        self.programmatic_saves.insert(key.clone());
    }

    pub fn end_programmatic_save(&mut self, key: &DocumentKey) {
        self.programmatic_saves.remove(key);
    }

    fn run_observers(&self) -> Vec<Arc<dyn RunObserver>> {
        let mut observers = self.observers.clone();
        let echo = OutputEcho::new(self.compiler.show_stdout, self.compiler.show_stderr);
        if echo.is_active() {
            observers.push(Arc::new(echo));
        }
        observers
    }

    /// Schedule a run for `key` after `delay`, replacing any pending one.
    ///
    /// Returns `false` when the session is paused. A run that fires while the
    /// previous process is still running is dropped.
    pub fn validate(&mut self, key: &DocumentKey, delay: Duration) -> bool {
        let request = RunRequest::build(&self.compiler, &key.to_path(), None);
        let observers = self.run_observers();
        let result_tx = self.result_tx.clone();

        let session = self.registry.get_or_create(key);
        if session.is_paused() {
            tracing::debug!(document = %key, "Validation paused; request suppressed");
            return false;
        }
        let executable = request.executable.clone();
        session.set_last_executable(executable.clone());

        let session_id = session.id();
        let running = session.running_flag();
        let document = key.clone();
        let gate = session.gate_mut();
        gate.set_delay(delay);
        gate.trigger(async move {
            if running.swap(true, Ordering::AcqRel) {
                tracing::debug!(document = %document, "Compiler already running; request dropped");
                return;
            }
            tokio::spawn(async move {
                let events = runner::run(request);
                let report = exec::collect(&document, events, &observers).await;
                running.store(false, Ordering::Release);
                let _ = result_tx
                    .send(RunResult {
                        document,
                        session: session_id,
                        executable,
                        report,
                    })
                    .await;
            });
        });
        true
    }

    /// Apply one completed run. Returns `None` when its session is gone.
    fn handle_result(&mut self, result: RunResult) -> Option<RunSummary> {
        let RunResult {
            document,
            session: session_id,
            executable,
            report,
        } = result;

        let Some(session) = self.registry.current_mut(&document, session_id) else {
            tracing::debug!(document = %document, "Discarding result of disposed session");
            return None;
        };

        let RunReport {
            outcome,
            diagnostics,
            notices,
        } = report;

        match &outcome {
            // Setup failures only count against the configured executable.
            RunOutcome::Failed(err) if err.is_setup_failure() => {
                if executable == self.compiler.executable {
                    session.pause();
                    tracing::warn!(document = %document, "Validation paused: {err}");
                } else {
                    tracing::debug!(document = %document, "Ignoring setup failure of a replaced executable: {err}");
                }
            }
            RunOutcome::Exited(_) => session.resume(),
            RunOutcome::Failed(_) => {}
        }
        session.publish(diagnostics.clone());

        tracing::debug!(
            document = %document,
            count = diagnostics.len(),
            "Diagnostics updated"
        );
        self.notices.extend(notices);

        Some(RunSummary {
            document,
            exit_code: outcome.exit_code(),
            diagnostics,
        })
    }

    /// Apply completed runs, up to `budget`, without waiting.
    pub fn poll_events(&mut self, budget: usize) -> Vec<RunSummary> {
        let mut summaries = Vec::new();
        let mut handled = 0;
        while handled < budget {
            match self.result_rx.try_recv() {
                Ok(result) => {
                    handled += 1;
                    summaries.extend(self.handle_result(result));
                }
                Err(mpsc::error::TryRecvError::Empty | mpsc::error::TryRecvError::Disconnected) => {
                    break;
                }
            }
        }
        summaries
    }

    /// Wait for the next run that still has a live session and apply it.
    pub async fn next_run(&mut self) -> Option<RunSummary> {
        loop {
            let result = self.result_rx.recv().await?;
            if let Some(summary) = self.handle_result(result) {
                return Some(summary);
            }
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        self.registry.snapshot()
    }

    /// Published diagnostics of `key`; empty when it has no session.
    #[must_use]
    pub fn diagnostics(&self, key: &DocumentKey) -> &[Diagnostic] {
        match self.registry.get(key) {
            Some(session) => session.diagnostics(),
            None => &[],
        }
    }

    /// Take all pending notices, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    #[must_use]
    pub fn session_state(&self, key: &DocumentKey) -> Option<SessionState> {
        self.registry.get(key).map(Session::state)
    }

    #[must_use]
    pub fn is_running(&self, key: &DocumentKey) -> bool {
        self.session_state(key) == Some(SessionState::Running)
    }

    #[must_use]
    pub fn is_paused(&self, key: &DocumentKey) -> bool {
        self.registry.get(key).is_some_and(Session::is_paused)
    }

    /// Whether `key` has been edited since its last save.
    #[must_use]
    pub fn live_edit_pending(&self, key: &DocumentKey) -> bool {
        self.live_edits.contains(key)
    }

    #[must_use]
    pub fn compiler(&self) -> &CompilerOptions {
        &self.compiler
    }

    #[must_use]
    pub fn settings(&self) -> &ValidateSettings {
        &self.settings
    }

    #[must_use]
    pub fn live_delay(&self) -> Duration {
        self.live_delay
    }

    /// Dispose every session. Processes already running finish on their own
    /// and their results are discarded.
    pub fn shutdown(&mut self) {
        tracing::info!(sessions = self.registry.len(), "Shutting down validation");
        self.registry.dispose_all();
        self.open.clear();
        self.live_edits.clear();
        self.programmatic_saves.clear();
    }
}
