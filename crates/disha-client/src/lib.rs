//! Network layer for the Disha portal client.
//!
//! Wraps the portal's REST endpoints, drives the streaming chat
//! exchange, and keeps the notification feed polled. Domain state
//! lives in `disha-core`, durable state in `disha-infrastructure`.

pub mod api;
pub mod auth;
pub mod chat;
pub mod config;
pub mod poller;

pub use api::{PortalApi, SignupForm, UserProfile};
pub use auth::AuthFlow;
pub use chat::{CancelHandle, ChatEvent, ChatExchange, ChatTransport};
pub use config::PortalConfig;
pub use poller::{NotificationPoller, NotificationSource, StopHandle};
