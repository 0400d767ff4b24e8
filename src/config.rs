//! Configuration loader and schema types.
//!
//! This module exposes the configuration schema shared by the server and
//! the client, and helpers to load it from disk and the environment.

mod load;
mod schema;

pub use load::load_or_default;
pub use schema::*;
