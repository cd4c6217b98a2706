//! Handler error model and classification.
//!
//! This module defines the value the framework hands over when a handler
//! fails ([`RaisedError`]) and the pure policy that decides what to do with
//! it ([`classify`]).

pub mod classification;
pub mod raised;

// Re-export main types for convenient access
pub use classification::{classify, Disposition, HandlerContext};
pub use raised::{
    notify_fn, ErrorKind, Notify, NotifyFn, RaisedError, EXPECTED_COMMAND_ERROR_KINDS,
};
