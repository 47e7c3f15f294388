//! Crash-isolated handler execution
//!
//! [`SafeExecutor`] runs a handler and turns every failure into a value.
//! Control signals are absorbed silently, while errors and panics are
//! recorded through the injected [`CrashReporter`] and logged once.

use crate::crash::{CrashReport, CrashReporter};
use crate::logging::Timer;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Expected ways for a handler to stop early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// Normal termination was requested
    Exit,
    /// The incoming stanza was already handled elsewhere
    Handled,
}

/// Why a handler did not produce a value
#[derive(Debug)]
pub enum HandlerError {
    Control(ControlSignal),
    Failure(anyhow::Error),
}

impl HandlerError {
    pub fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }
}

impl From<ControlSignal> for HandlerError {
    fn from(signal: ControlSignal) -> Self {
        Self::Control(signal)
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(error: anyhow::Error) -> Self {
        Self::Failure(error)
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Control(signal) => write!(f, "control signal: {:?}", signal),
            Self::Failure(e) => write!(f, "{:#}", e),
        }
    }
}

pub type HandlerResult<T> = std::result::Result<T, HandlerError>;

/// Outcome of a guarded invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult<T> {
    Success(T),
    /// A control signal was absorbed; callers treat this as success
    Suppressed(ControlSignal),
    /// Unexpected failure, already reported
    Failed { handler: String },
}

impl<T> ExecutionResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Success or suppressed
    pub fn is_ok(&self) -> bool {
        !self.is_failed()
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }
}

/// Runs handlers so that no failure reaches the caller
#[derive(Clone)]
pub struct SafeExecutor {
    reporter: Arc<dyn CrashReporter>,
    report_failures: bool,
}

impl SafeExecutor {
    pub fn new(reporter: Arc<dyn CrashReporter>) -> Self {
        Self {
            reporter,
            report_failures: true,
        }
    }

    /// Executor that converts failures without recording or logging them
    pub fn quiet(reporter: Arc<dyn CrashReporter>) -> Self {
        Self {
            reporter,
            report_failures: false,
        }
    }

    pub fn reporter(&self) -> &Arc<dyn CrashReporter> {
        &self.reporter
    }

    /// Invoke `handler(args)`, converting any failure into an [`ExecutionResult`].
    ///
    /// Panics are caught, but the process panic hook still runs first and by
    /// default prints the panic to stderr. Hosts that want the crash report to
    /// be the only trace should install their own hook with
    /// [`std::panic::set_hook`].
    pub fn execute<A, T, F>(&self, name: &str, handler: F, args: A) -> ExecutionResult<T>
    where
        A: fmt::Debug,
        F: FnOnce(A) -> HandlerResult<T>,
    {
        let args_repr = format!("{:?}", args);
        let _timer = Timer::new(name);

        match panic::catch_unwind(AssertUnwindSafe(move || handler(args))) {
            Ok(Ok(value)) => ExecutionResult::Success(value),
            Ok(Err(HandlerError::Control(signal))) => {
                tracing::trace!(handler = %name, signal = ?signal, "Control signal absorbed");
                ExecutionResult::Suppressed(signal)
            }
            Ok(Err(HandlerError::Failure(e))) => self.fail(name, args_repr, format!("{:#}", e)),
            Err(payload) => self.fail(name, args_repr, panic_message(payload.as_ref())),
        }
    }

    /// Wrap a handler so every call runs through [`execute`](Self::execute);
    /// failures come back as `None`
    pub fn safe<A, T, F, N>(
        &self,
        name: N,
        handler: F,
    ) -> impl Fn(A) -> Option<T> + use<A, T, F, N>
    where
        A: fmt::Debug,
        F: Fn(A) -> HandlerResult<T>,
        N: Into<String>,
    {
        let executor = self.clone();
        let name = name.into();
        move |args| executor.execute(&name, &handler, args).into_value()
    }

    fn fail<T>(&self, name: &str, args: String, error: String) -> ExecutionResult<T> {
        if self.report_failures {
            tracing::error!(
                handler = %name,
                args = %args,
                error = %error,
                "Exception happened during executing function"
            );
            self.reporter.record(&CrashReport::new(name, args, error));
        }
        ExecutionResult::Failed {
            handler: name.to_string(),
        }
    }
}

impl fmt::Debug for SafeExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeExecutor")
            .field("report_failures", &self.report_failures)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic: <non-string payload>".to_string()
    }
}
