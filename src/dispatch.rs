//! Background dispatch of handlers on named worker threads
//!
//! Every dispatch spawns its own OS thread; delayed work sleeps on that thread
//! before running. Handlers always go through [`SafeExecutor`], so nothing a
//! handler does can reach the caller. There is no pool, no ordering between
//! dispatched handlers, and no cancellation.

use crate::error::{Result, TransportError};
use crate::executor::{ExecutionResult, HandlerResult, SafeExecutor};
use crate::logging::log_error;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A started background invocation.
///
/// Dropping the handle detaches the worker; the dispatcher keeps no registry.
pub struct ThreadHandle<T> {
    name: String,
    handler: String,
    args: String,
    delay: Duration,
    created_at: DateTime<Utc>,
    inner: JoinHandle<ExecutionResult<T>>,
}

impl<T> ThreadHandle<T> {
    /// Diagnostic name, `<name>-<timestamp>`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &str {
        &self.handler
    }

    pub fn args(&self) -> &str {
        &self.args
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Block until the handler has run and return its outcome
    pub fn join(self) -> ExecutionResult<T> {
        match self.inner.join() {
            Ok(result) => result,
            // only reachable if the crash reporter itself panicked
            Err(_) => ExecutionResult::Failed {
                handler: self.handler,
            },
        }
    }
}

impl<T> fmt::Debug for ThreadHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadHandle")
            .field("name", &self.name)
            .field("handler", &self.handler)
            .field("args", &self.args)
            .field("delay", &self.delay)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Spawns crash-isolated background work
#[derive(Debug, Clone)]
pub struct ThreadDispatcher {
    executor: SafeExecutor,
}

impl ThreadDispatcher {
    pub fn new(executor: SafeExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &SafeExecutor {
        &self.executor
    }

    /// Run `handler(args)` in the background, right away or after `delay`.
    ///
    /// `handler_name` identifies the handler in crash reports; `name` (falling
    /// back to `handler_name`) prefixes the thread name. Returns as soon as the
    /// thread is started.
    pub fn dispatch<A, T, F>(
        &self,
        handler_name: &str,
        handler: F,
        args: A,
        name: Option<&str>,
        delay: Duration,
    ) -> Result<ThreadHandle<T>>
    where
        A: fmt::Debug + Send + 'static,
        T: Send + 'static,
        F: FnOnce(A) -> HandlerResult<T> + Send + 'static,
    {
        let created_at = Utc::now();
        let thread_name = thread_name(name.unwrap_or(handler_name), created_at);
        let args_repr = format!("{:?}", args);

        if !delay.is_zero() {
            tracing::debug!(
                handler = %handler_name,
                args = %args_repr,
                thread = %thread_name,
                delay_ms = delay.as_millis() as u64,
                "Starting timer"
            );
        }

        let executor = self.executor.clone();
        let target = handler_name.to_string();
        let spawned = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
                executor.execute(&target, handler, args)
            });

        let inner = match spawned {
            Ok(inner) => inner,
            Err(source) => {
                log_error("dispatch", &source);
                return Err(TransportError::Spawn {
                    name: thread_name,
                    source,
                });
            }
        };

        Ok(ThreadHandle {
            name: thread_name,
            handler: handler_name.to_string(),
            args: args_repr,
            delay,
            created_at,
            inner,
        })
    }

    /// Dispatch immediately under the handler's own name
    pub fn spawn<A, T, F>(&self, handler_name: &str, handler: F, args: A) -> Result<ThreadHandle<T>>
    where
        A: fmt::Debug + Send + 'static,
        T: Send + 'static,
        F: FnOnce(A) -> HandlerResult<T> + Send + 'static,
    {
        self.dispatch(handler_name, handler, args, None, Duration::ZERO)
    }

    /// Wrap a handler so every call is dispatched in the background instead
    /// of running on the caller's thread
    pub fn threaded<A, T, F, N>(
        &self,
        handler_name: N,
        handler: F,
    ) -> impl Fn(A) -> Result<ThreadHandle<T>> + use<A, T, F, N>
    where
        A: fmt::Debug + Send + 'static,
        T: Send + 'static,
        F: Fn(A) -> HandlerResult<T> + Send + Sync + 'static,
        N: Into<String>,
    {
        let dispatcher = self.clone();
        let handler_name = handler_name.into();
        let handler = Arc::new(handler);
        move |args| {
            let handler = Arc::clone(&handler);
            dispatcher.spawn(&handler_name, move |args| handler(args), args)
        }
    }
}

fn thread_name(base: &str, created_at: DateTime<Utc>) -> String {
    // interior NUL bytes are rejected by the thread builder
    let base: String = base.chars().filter(|c| *c != '\0').collect();
    format!(
        "{}-{}.{:06}",
        base,
        created_at.timestamp(),
        created_at.timestamp_subsec_micros()
    )
}
