//! # Coedit
//!
//! Document versioning and collaborative locking, with a command-line front
//! end over a directory of JSON document records.
//!
//! The library surface re-exports the engine; [`commands`] holds the CLI
//! subcommands so they can be driven without spawning the binary.

pub mod commands;

pub use coedit_engine::prelude;
pub use commands::{Command, ContentSource, execute};
