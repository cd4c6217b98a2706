//! iam-dispatch - error classification and dispatch for the iam chat bot
//!
//! Every error raised inside an event or command handler is handed to a
//! [`dispatch::Dispatcher`], which classifies it, runs any remediation the
//! error carries, apologizes to the invoker when appropriate, and makes sure
//! whatever is left reaches the log.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;

pub use dispatch::{bootstrap, Dispatcher, Outcome, ReplyChannel};
pub use error::{classify, Disposition, ErrorKind, HandlerContext, Notify, RaisedError};
