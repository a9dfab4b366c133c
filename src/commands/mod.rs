//! CLI commands implementation

pub mod run;
pub mod status;

pub use run::*;
pub use status::*;
