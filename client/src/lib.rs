//! TickTick HTTP client.
//!
//! Production implementation of [`ticktick_core::TickTickApi`]:
//!
//! - [`oauth`] - OAuth2 token management with an on-disk cache
//! - [`http`] - the reqwest-backed API client (sign-on, sync, batch ops)
//! - [`state`] - deserialization of the sync payload

pub mod http;
pub mod oauth;
pub mod state;

pub use http::TickTickHttpClient;
pub use oauth::{OAuth2Session, OAuthConfig, OAuthToken};
pub use state::BatchCheck;
