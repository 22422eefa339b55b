//! An embeddable interpreter for single-line textual commands.
//!
//! A line such as `move 3 {sum 1 2} "a label"` is split into a command name
//! and parameter tokens, the tokens are bound against the command's declared
//! schema with type conversion, and the command's action produces a string.
//! Brace-delimited parts are executed as commands of their own and their
//! result is substituted before binding.
//!
//! The main entry point is [`CommandRegistry`], which stores [`Command`]s by
//! name and executes whole lines. [`ParameterTypes`] maps the type names used
//! in schemas to parse functions. [`Interpreter`] adds a REPL and a handful of
//! built-in commands on top.

mod binder;
mod builtin;
pub mod command;
pub mod error;
pub mod interpreter;
mod lexer;
pub mod logging;
pub mod registry;
pub mod schema;
pub mod types;
pub mod value;

pub use binder::{BoundParameter, Invocation};
pub use command::{Command, CommandBuilder, DEFAULT_MAX_DEPTH, NestedExecutor};
pub use error::{CommandError, Result};
pub use interpreter::Interpreter;
pub use registry::{CommandRegistry, WeakCommandRegistry};
pub use schema::{ParameterSpec, Schema};
pub use types::ParameterTypes;
pub use value::ParameterValue;
