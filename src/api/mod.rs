//! HTTP surface — REST endpoints and the OAuth redirect dance.

pub mod routes;

pub use routes::{AppState, api_routes};
