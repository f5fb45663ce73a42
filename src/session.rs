//! Session facade
//!
//! Ties one connection and one transcript together and exposes them to the
//! presentation layer through a [`SessionHandle`].

mod diagnostics;
mod handle;
mod identity;
mod runtime;

#[cfg(test)]
mod testing;

pub use diagnostics::{Diagnostic, DiagnosticSink, TracingDiagnostics};
pub use handle::{SessionError, SessionHandle, SessionSnapshot};
pub use identity::SessionId;
pub use runtime::{SessionOptions, SessionRuntime};
