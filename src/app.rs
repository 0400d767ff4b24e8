//! Application module: the browsing model and the transport controller.
//!
//! `App` (in `app::model`) holds the catalog view, cursor and search prompt.
//! `TransportController` (in `app::transport`) turns user intents into
//! session transitions and remote jobs.

mod model;
mod transport;

pub use model::*;
pub use transport::{Intent, Job, Reply, TransportController};
