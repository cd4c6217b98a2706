//! Last-resort handling for errors that escape routing.

use std::any::Any;
use std::backtrace::Backtrace;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;

use super::DispatchError;
use crate::logging::LogSink;

/// The process-wide uncaught-error boundary.
///
/// Everything reaching the boundary is logged at error severity with its full
/// trace. Nothing propagates past it; the process keeps running. Each escaped
/// failure produces exactly one record.
#[derive(Clone)]
pub struct Boundary {
    sink: Arc<dyn LogSink>,
    panic_hook: Arc<AtomicBool>,
}

impl Boundary {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            panic_hook: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Returns true once [`Boundary::install_panic_hook`] has run on this boundary.
    pub fn panic_hook_installed(&self) -> bool {
        self.panic_hook.load(Ordering::SeqCst)
    }

    /// Logs an error that escaped routing.
    pub fn report(&self, error: &DispatchError) {
        self.sink.error(
            &format!("Uncaught exception: {}", error),
            Some(&error.trace()),
        );
    }

    /// Awaits `fut`, reporting an escaped error or a panic instead of propagating it.
    ///
    /// With the panic hook installed, the hook has already logged the panic
    /// (with location and backtrace) by the time it unwinds here.
    pub async fn guard<F, T>(&self, fut: F) -> Option<T>
    where
        F: Future<Output = Result<T, DispatchError>>,
    {
        match AssertUnwindSafe(fut).catch_unwind().await {
            Ok(Ok(value)) => Some(value),
            Ok(Err(error)) => {
                self.report(&error);
                None
            }
            Err(payload) => {
                if !self.panic_hook_installed() {
                    self.sink.error(
                        &format!("Uncaught panic: {}", panic_message(&*payload)),
                        None,
                    );
                }
                None
            }
        }
    }

    /// Installs a panic hook that logs panics through this boundary's sink.
    ///
    /// The previous hook is replaced; panics in spawned tasks are then logged
    /// with location and backtrace while the runtime keeps serving.
    pub fn install_panic_hook(&self) {
        let sink = Arc::clone(&self.sink);
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map(|l| format!(" at {}:{}", l.file(), l.line()))
                .unwrap_or_default();
            let message = format!(
                "Uncaught panic: {}{}",
                panic_message(info.payload()),
                location
            );
            let backtrace = Backtrace::force_capture().to_string();
            sink.error(&message, Some(&backtrace));
        }));
        self.panic_hook.store(true, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Boundary")
            .field("sink", &self.sink.name())
            .field("panic_hook", &self.panic_hook_installed())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RaisedError;
    use crate::logging::MemorySink;

    #[tokio::test]
    async fn test_guard_reports_escaped_error() {
        let sink = Arc::new(MemorySink::new("test"));
        let boundary = Boundary::new(sink.clone());

        let result: Option<()> = boundary
            .guard(async {
                Err(DispatchError::Escalated(RaisedError::handler(
                    anyhow::anyhow!("boom"),
                )))
            })
            .await;

        assert!(result.is_none());
        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Uncaught exception: boom");
        assert!(errors[0].trace.as_deref().unwrap().contains("HandlerError: boom"));
    }

    #[tokio::test]
    async fn test_guard_passes_through_success() {
        let sink = Arc::new(MemorySink::new("test"));
        let boundary = Boundary::new(sink.clone());

        let result = boundary.guard(async { Ok::<_, DispatchError>(7) }).await;

        assert_eq!(result, Some(7));
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_guard_catches_panics() {
        let sink = Arc::new(MemorySink::new("test"));
        let boundary = Boundary::new(sink.clone());

        async fn exploding() -> Result<(), DispatchError> {
            panic!("handler exploded")
        }

        let result = boundary.guard(exploding()).await;

        assert!(result.is_none());
        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Uncaught panic: handler exploded");
        assert!(!boundary.panic_hook_installed());
    }

    #[test]
    fn test_report_notify_failure() {
        let sink = Arc::new(MemorySink::new("test"));
        let boundary = Boundary::new(sink.clone());

        boundary.report(&DispatchError::NotifyFailed {
            source: anyhow::anyhow!("dm closed"),
        });

        assert_eq!(sink.errors()[0].message, "Uncaught exception: notify failed: dm closed");
    }
}
