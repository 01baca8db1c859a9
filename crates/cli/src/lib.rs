//! Console front end: command parsing and the read-dispatch-print loop.

pub mod command;
pub mod console;

pub use command::{Command, CommandError, HELP};
pub use console::{Console, Flow};
