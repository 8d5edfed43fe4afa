//! Bookshelf application library
//!
//! Project modules and the process wiring shared by the binaries.

pub mod app;
pub mod modules;
pub mod utils;

pub use modules::*;
