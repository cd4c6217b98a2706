//! The error value handed to the dispatcher when a handler fails.
//!
//! A [`RaisedError`] wraps an opaque [`anyhow::Error`] together with the
//! framework's classification of it ([`ErrorKind`]), an optional original
//! cause (when the framework wraps a handler's error in an invoke envelope),
//! and an optional [`Notify`] capability attached by the handler author.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

/// Command-layer error kinds that are normal outcomes of user input.
///
/// Errors of these kinds raised by a command handler are dropped silently.
pub const EXPECTED_COMMAND_ERROR_KINDS: [ErrorKind; 6] = [
    ErrorKind::CommandNotFound,
    ErrorKind::DisabledCommand,
    ErrorKind::MissingRequiredArgument,
    ErrorKind::TooManyArguments,
    ErrorKind::ArgumentParsing,
    ErrorKind::BadArgument,
];

/// What kind of failure a [`RaisedError`] represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The invoked command does not exist.
    CommandNotFound,
    /// The invoked command exists but is disabled.
    DisabledCommand,
    /// A required command argument was not supplied.
    MissingRequiredArgument,
    /// More arguments were supplied than the command accepts.
    TooManyArguments,
    /// The argument string could not be tokenized.
    ArgumentParsing,
    /// An argument could not be converted to the expected type.
    BadArgument,
    /// A command check (permissions, channel type, ...) rejected the invocation.
    CheckFailure,
    /// The command is rate limited for the invoker.
    CommandOnCooldown,
    /// Envelope around an error raised from inside a command body.
    CommandInvoke,
    /// Any other failure raised by handler code.
    Handler,
}

impl ErrorKind {
    /// Returns true if this kind is one of [`EXPECTED_COMMAND_ERROR_KINDS`].
    pub fn is_expected_command_error(self) -> bool {
        EXPECTED_COMMAND_ERROR_KINDS.contains(&self)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CommandNotFound => "CommandNotFound",
            Self::DisabledCommand => "DisabledCommand",
            Self::MissingRequiredArgument => "MissingRequiredArgument",
            Self::TooManyArguments => "TooManyArguments",
            Self::ArgumentParsing => "ArgumentParsingError",
            Self::BadArgument => "BadArgument",
            Self::CheckFailure => "CheckFailure",
            Self::CommandOnCooldown => "CommandOnCooldown",
            Self::CommandInvoke => "CommandInvokeError",
            Self::Handler => "HandlerError",
        };
        f.write_str(name)
    }
}

/// A self-contained remediation action attached to an error.
///
/// When dispatch finds this capability on an error it calls it instead of
/// escalating; a successful call fully discharges the error.
#[async_trait]
pub trait Notify: Send + Sync {
    /// Perform the remediation, typically messaging whoever triggered the handler.
    async fn notify(&self) -> anyhow::Result<()>;
}

/// Adapter that lets an async closure act as a [`Notify`] capability.
pub struct NotifyFn<F>(F);

#[async_trait]
impl<F, Fut> Notify for NotifyFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn notify(&self) -> anyhow::Result<()> {
        (self.0)().await
    }
}

/// Builds a shareable [`Notify`] capability from an async closure.
pub fn notify_fn<F, Fut>(f: F) -> Arc<dyn Notify>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(NotifyFn(f))
}

/// An error raised by an event or command handler.
pub struct RaisedError {
    kind: ErrorKind,
    error: anyhow::Error,
    cause: Option<Box<RaisedError>>,
    notify: Option<Arc<dyn Notify>>,
}

impl RaisedError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, error: impl Into<anyhow::Error>) -> Self {
        Self {
            kind,
            error: error.into(),
            cause: None,
            notify: None,
        }
    }

    /// Creates a plain handler failure.
    pub fn handler(error: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorKind::Handler, error)
    }

    /// Creates a command-layer error from a message.
    pub fn command(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, anyhow::Error::msg(message.into()))
    }

    /// Wraps `cause` in a framework envelope of the given kind.
    pub fn wrap(kind: ErrorKind, cause: RaisedError) -> Self {
        let error = anyhow::anyhow!("Command raised an exception: {}", cause);
        Self {
            kind,
            error,
            cause: Some(Box::new(cause)),
            notify: None,
        }
    }

    /// Wraps `cause` the way the framework does for errors escaping a command body.
    pub fn invoke(cause: RaisedError) -> Self {
        Self::wrap(ErrorKind::CommandInvoke, cause)
    }

    /// Attaches a notify capability.
    pub fn with_notify(mut self, notify: Arc<dyn Notify>) -> Self {
        self.notify = Some(notify);
        self
    }

    /// Attaches an async closure as the notify capability.
    pub fn with_notify_fn<F, Fut>(self, f: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.with_notify(notify_fn(f))
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The underlying opaque error.
    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    /// The original cause, if this error is a framework envelope.
    pub fn cause(&self) -> Option<&RaisedError> {
        self.cause.as_deref()
    }

    pub fn is_wrapped(&self) -> bool {
        self.cause.is_some()
    }

    /// The notify capability attached directly to this value.
    pub fn notify(&self) -> Option<&dyn Notify> {
        self.notify.as_deref()
    }

    /// The original cause if present, else `self`. Never looks deeper than one layer.
    pub fn effective(&self) -> &RaisedError {
        self.cause.as_deref().unwrap_or(self)
    }

    /// Consuming form of [`RaisedError::effective`].
    pub fn unwrap_cause(mut self) -> RaisedError {
        match self.cause.take() {
            Some(cause) => *cause,
            None => self,
        }
    }

    /// Renders the full cause chain, including backtraces when captured.
    pub fn trace(&self) -> String {
        let mut out = format!("{}: {:?}", self.kind, self.error);
        let mut next = self.cause.as_deref();
        while let Some(cause) = next {
            out.push_str(&format!("\n\nCaused by {}: {:?}", cause.kind, cause.error));
            next = cause.cause.as_deref();
        }
        out
    }
}

impl fmt::Debug for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RaisedError")
            .field("kind", &self.kind)
            .field("error", &self.error)
            .field("cause", &self.cause)
            .field("notify", &self.notify.is_some())
            .finish()
    }
}

impl fmt::Display for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for RaisedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.cause.as_deref() {
            Some(cause) => Some(cause),
            None => self.error.source(),
        }
    }
}
