//! Routing of handler errors to their side effects.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{classify, Disposition, HandlerContext, RaisedError};
use crate::logging::LogSink;

/// Reply sent to the invoker when a command fails unexpectedly.
pub const APOLOGY_MESSAGE: &str = "Oops! I encountered a problem. Please contact an admin.";

/// The channel a command context replies on.
#[async_trait]
pub trait ReplyChannel: Send + Sync {
    /// Send text to the channel that invoked the command.
    async fn send(&self, text: &str) -> anyhow::Result<()>;
}

/// An error that routing could not resolve locally and re-raises.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// An unexpected command error, after the apology was sent.
    #[error("{0}")]
    Escalated(RaisedError),

    /// The error's notify capability itself failed.
    #[error("notify failed: {source}")]
    NotifyFailed {
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Full trace of the re-raised value.
    pub fn trace(&self) -> String {
        match self {
            Self::Escalated(error) => error.trace(),
            Self::NotifyFailed { source } => format!("{:?}", source),
        }
    }
}

/// How a routed error was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Expected usage error; nothing happened.
    Ignored,
    /// The notify capability ran and succeeded.
    Notified,
    /// Event error written to the log.
    Logged,
}

/// Receives every error raised by event and command handlers.
#[derive(Clone)]
pub struct Router {
    sink: Arc<dyn LogSink>,
}

impl Router {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }

    /// Handles an error raised by an event handler.
    ///
    /// Event handlers have no reply channel and nothing upstream to catch a
    /// re-raise, so the error is logged once and swallowed. Nothing here
    /// suspends.
    pub fn on_event_error(&self, event: &str, args: &[String], error: RaisedError) -> Outcome {
        let mut message = format!("Ignoring exception in {}", event);
        if !args.is_empty() {
            message.push_str(&format!(" (args: {})", args.join(", ")));
        }
        self.sink.error(&message, Some(&error.trace()));
        Outcome::Logged
    }

    /// Handles an error raised by a command handler.
    ///
    /// Returns the value to re-raise when the error could not be resolved
    /// locally.
    pub async fn on_command_error(
        &self,
        reply: &dyn ReplyChannel,
        error: RaisedError,
    ) -> Result<Outcome, DispatchError> {
        match classify(HandlerContext::Command, &error) {
            Disposition::Ignore => return Ok(Outcome::Ignored),
            Disposition::SelfNotify(notify) => {
                return match notify.notify().await {
                    Ok(()) => Ok(Outcome::Notified),
                    Err(source) => Err(DispatchError::NotifyFailed { source }),
                };
            }
            Disposition::Escalate => {}
        }

        if let Err(e) = reply.send(APOLOGY_MESSAGE).await {
            self.sink
                .warn(&format!("Failed to send apology for command error: {:#}", e));
        }
        Err(DispatchError::Escalated(error.unwrap_cause()))
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("sink", &self.sink.name())
            .finish()
    }
}
