//! Panic handling at the process-wide boundary.
//!
//! The panic hook is process global, so these checks live in their own test
//! binary and run sequentially inside a single test.

use std::sync::Arc;

use iam_dispatch::dispatch::{Boundary, DispatchError};
use iam_dispatch::logging::MemorySink;

async fn exploding_handler() -> Result<(), DispatchError> {
    panic!("handler exploded")
}

#[tokio::test]
async fn test_installed_hook_logs_each_panic_once() {
    let sink = Arc::new(MemorySink::new("iam"));
    let boundary = Boundary::new(sink.clone());
    boundary.install_panic_hook();
    assert!(boundary.panic_hook_installed());

    // Panic caught by the guard: the hook's record is the only one.
    let result = boundary.guard(exploding_handler()).await;

    assert!(result.is_none());
    let errors = sink.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .message
        .starts_with("Uncaught panic: handler exploded at "));
    assert!(errors[0].message.contains("panic_hook_tests.rs"));
    assert!(errors[0].trace.is_some());

    // Panic in a spawned task outside any guard: logged by the hook, and the
    // runtime keeps serving.
    let join = tokio::spawn(async { panic!("event task exploded") }).await;
    assert!(join.is_err());

    let errors = sink.errors();
    assert_eq!(errors.len(), 2);
    assert!(errors[1]
        .message
        .starts_with("Uncaught panic: event task exploded"));

    // Clones share the hook state, so a cloned boundary does not double-log.
    let cloned = boundary.clone();
    assert!(cloned.panic_hook_installed());
    assert!(cloned.guard(exploding_handler()).await.is_none());
    assert_eq!(sink.errors().len(), 3);
}
