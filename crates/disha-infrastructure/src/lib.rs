//! Persistence layer for the Disha portal client.
//!
//! Holds the durable client-side state the core depends on: the
//! session, remembered login emails, and the theme preference.

pub mod paths;
pub mod session_store;

pub use paths::DishaPaths;
pub use session_store::{SessionStore, Theme};
