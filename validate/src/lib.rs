//! Compiler-backed validation for KSP documents.
//!
//! [`ValidationService`] owns one session per open document. Each session
//! debounces requests, runs the external compiler at most once at a time and
//! publishes the diagnostics it reports. [`compile`] runs the same compiler
//! once to produce output.

pub mod classify;
pub mod codec;
pub mod error;
pub mod types;

mod compile;
mod debounce;
mod exec;
mod observer;
mod runner;
mod service;
mod session;

pub use compile::{CompileReport, compile};
pub use debounce::DebounceGate;
pub use error::{CompileError, RunError};
pub use exec::{RunReport, collect};
pub use observer::{OutputEcho, RunObserver};
pub use runner::{ProcessEvent, run};
pub use service::ValidationService;
pub use session::{Session, SessionId, SessionRegistry, SessionState};
pub use types::{
    CompilerOptions, DEFAULT_LIVE_DELAY_MS, DiagnosticsSnapshot, DocumentEvent, MIN_LIVE_DELAY_MS,
    Notice, NoticeKind, RunOutcome, RunRequest, RunSummary, ValidateSettings,
};
