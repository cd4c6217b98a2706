//! Dispatch of handler errors raised inside the chat framework.
//!
//! The framework registers one [`Dispatcher`] at startup as the receiver for
//! both event-handler and command-handler failures. The dispatcher routes each
//! error through the [`Router`] and funnels anything the router re-raises to
//! the process-wide [`Boundary`].
//!
//! Notify and reply sends are awaited without a timeout; a hung send blocks
//! only the task handling that one error.

mod boundary;
mod router;

pub use boundary::Boundary;
pub use router::{DispatchError, Outcome, ReplyChannel, Router, APOLOGY_MESSAGE};

use std::sync::Arc;

use crate::error::RaisedError;
use crate::logging::{init_logging, LogSink, LogSinks, LoggingConfig};

/// The error-handling hook registered with the framework.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    router: Router,
    boundary: Boundary,
}

impl Dispatcher {
    /// Creates a dispatcher whose router and boundary both write to `sink`.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            router: Router::new(Arc::clone(&sink)),
            boundary: Boundary::new(sink),
        }
    }

    /// Creates a dispatcher writing to the core sink.
    pub fn from_sinks(sinks: &LogSinks) -> Self {
        Self::new(Arc::clone(&sinks.core))
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn boundary(&self) -> &Boundary {
        &self.boundary
    }

    /// Entry point for errors raised by event handlers.
    pub fn handle_event_error(&self, event: &str, args: &[String], error: RaisedError) -> Outcome {
        self.router.on_event_error(event, args, error)
    }

    /// Entry point for errors raised by command handlers.
    ///
    /// Returns `None` when the error escaped to the boundary.
    pub async fn handle_command_error(
        &self,
        reply: &dyn ReplyChannel,
        error: RaisedError,
    ) -> Option<Outcome> {
        self.boundary
            .guard(self.router.on_command_error(reply, error))
            .await
    }
}

/// Process startup: logging sinks, panic hook, and the dispatcher.
///
/// Safe to call more than once; sinks are created only by the first call.
pub fn bootstrap(config: LoggingConfig) -> Dispatcher {
    let sinks = init_logging(config);
    sinks.framework.info("framework log sink ready");

    let dispatcher = Dispatcher::from_sinks(sinks);
    dispatcher.boundary().install_panic_hook();
    sinks.core.info("error dispatcher registered");
    dispatcher
}
