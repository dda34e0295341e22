//! Domain types and pure logic shared by the launchkit crates.
//!
//! Nothing in here touches the network or the database: the tolerant
//! response parser, prompt assembly, and status vocabularies are all plain
//! functions so they can be tested in isolation.

pub mod error;
pub mod extract;
pub mod generation;
pub mod prompt;
pub mod types;
