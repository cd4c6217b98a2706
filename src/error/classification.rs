//! Classification of raised handler errors into dispatch outcomes.
//!
//! [`classify`] is pure: it only inspects the error and the kind of handler
//! that raised it. Side effects belong to [`crate::dispatch::Router`].

use std::fmt;

use super::{Notify, RaisedError};

/// Which kind of handler raised the error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandlerContext {
    /// Fire-and-forget lifecycle handler (ready, message, ...). No reply channel.
    Event,
    /// User-invoked command. Has a reply channel.
    Command,
}

/// The terminal classification outcome for a raised error.
pub enum Disposition<'a> {
    /// Normal usage mistake; drop it without logging or replying.
    Ignore,
    /// Delegate remediation to the error's own notify capability.
    SelfNotify(&'a dyn Notify),
    /// Apologize on the reply channel (commands only) and re-raise.
    Escalate,
}

impl Disposition<'_> {
    /// Returns true if no further propagation follows this outcome.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Escalate)
    }

    pub fn is_ignore(&self) -> bool {
        matches!(self, Self::Ignore)
    }

    pub fn is_self_notify(&self) -> bool {
        matches!(self, Self::SelfNotify(_))
    }

    pub fn is_escalate(&self) -> bool {
        matches!(self, Self::Escalate)
    }
}

impl fmt::Debug for Disposition<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => f.write_str("Ignore"),
            Self::SelfNotify(_) => f.write_str("SelfNotify(..)"),
            Self::Escalate => f.write_str("Escalate"),
        }
    }
}

/// Classifies `error` raised from a handler of the given `context`.
///
/// Expected command errors are ignored outright. Everything else is unwrapped
/// at most one layer; the notify capability is looked up on the cause first,
/// then on the envelope.
pub fn classify(context: HandlerContext, error: &RaisedError) -> Disposition<'_> {
    if context == HandlerContext::Command && error.kind().is_expected_command_error() {
        return Disposition::Ignore;
    }

    match error.effective().notify().or_else(|| error.notify()) {
        Some(notify) => Disposition::SelfNotify(notify),
        None => Disposition::Escalate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, EXPECTED_COMMAND_ERROR_KINDS};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn noop() -> impl std::future::Future<Output = anyhow::Result<()>> + Send {
        async { Ok(()) }
    }

    #[test]
    fn test_expected_command_errors_are_ignored() {
        for kind in EXPECTED_COMMAND_ERROR_KINDS {
            let err = RaisedError::command(kind, "usage");
            assert!(classify(HandlerContext::Command, &err).is_ignore(), "{kind}");
        }
    }

    #[test]
    fn test_expected_kind_ignored_even_with_notify() {
        let err = RaisedError::command(ErrorKind::BadArgument, "not a number").with_notify_fn(noop);
        assert!(classify(HandlerContext::Command, &err).is_ignore());
    }

    #[test]
    fn test_expected_kind_not_filtered_for_events() {
        let err = RaisedError::command(ErrorKind::CommandNotFound, "odd");
        assert!(classify(HandlerContext::Event, &err).is_escalate());
    }

    #[test]
    fn test_unexpected_command_error_escalates() {
        let err = RaisedError::command(ErrorKind::CheckFailure, "not allowed here");
        let disposition = classify(HandlerContext::Command, &err);
        assert!(disposition.is_escalate());
        assert!(!disposition.is_terminal());
    }

    #[test]
    fn test_plain_error_with_notify_self_notifies() {
        let err = RaisedError::handler(anyhow::anyhow!("not verified")).with_notify_fn(noop);
        let disposition = classify(HandlerContext::Command, &err);
        assert!(disposition.is_self_notify());
        assert!(disposition.is_terminal());
    }

    #[test]
    fn test_event_error_with_notify_self_notifies() {
        let err = RaisedError::handler(anyhow::anyhow!("x")).with_notify_fn(noop);
        assert!(classify(HandlerContext::Event, &err).is_self_notify());
    }

    #[tokio::test]
    async fn test_cause_notify_is_bound() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cause = RaisedError::handler(anyhow::anyhow!("no such member")).with_notify_fn(
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
        );
        let err = RaisedError::invoke(cause);

        match classify(HandlerContext::Command, &err) {
            Disposition::SelfNotify(notify) => notify.notify().await.unwrap(),
            other => panic!("expected SelfNotify, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_envelope_notify_used_when_cause_has_none() {
        let err = RaisedError::invoke(RaisedError::handler(anyhow::anyhow!("x"))).with_notify_fn(noop);
        assert!(classify(HandlerContext::Command, &err).is_self_notify());
    }

    #[test]
    fn test_wrapped_without_notify_escalates() {
        let err = RaisedError::invoke(RaisedError::handler(anyhow::anyhow!("db down")));
        assert!(classify(HandlerContext::Command, &err).is_escalate());
    }

    #[test]
    fn test_unwrap_only_one_level_deep() {
        let innermost = RaisedError::handler(anyhow::anyhow!("deep")).with_notify_fn(noop);
        let middle = RaisedError::wrap(ErrorKind::Handler, innermost);
        let err = RaisedError::invoke(middle);

        assert!(classify(HandlerContext::Command, &err).is_escalate());
    }

    #[test]
    fn test_wrapped_expected_kind_checked_on_envelope_only() {
        // The envelope kind decides expected-ness, not the cause's kind.
        let err = RaisedError::invoke(RaisedError::command(ErrorKind::BadArgument, "inner"));
        assert!(classify(HandlerContext::Command, &err).is_escalate());
    }
}
