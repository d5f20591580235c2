//! Library half of the `anidb-udp` command line client
//!
//! Configuration layering, output rendering and terminal detection live here
//! so they can be tested without spawning the binary.

pub mod config;
pub mod output;
pub mod paths;
pub mod terminal;
