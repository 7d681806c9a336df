//! Operator-facing diagnostics for the jitc object cache.
//!
//! Cache problems never fail a compilation, but some of them (a read-only
//! cache root, a corrupted object on disk) deserve to be reported. This crate
//! provides structured [`Diagnostic`] messages with severity levels and codes,
//! a thread-safe [`DiagnosticSink`] that many per-thread caches can share, and
//! [`DiagnosticRenderer`] implementations for terminal and JSON output.

#![warn(missing_docs)]

pub mod code;
pub mod diagnostic;
pub mod renderer;
pub mod severity;
pub mod sink;

pub use code::{Category, DiagnosticCode};
pub use diagnostic::Diagnostic;
pub use renderer::{DiagnosticRenderer, JsonRenderer, TerminalRenderer};
pub use severity::Severity;
pub use sink::DiagnosticSink;
