//! Authenticated request layer for the Privilege Cloud REST API.

pub mod api_client;
pub mod guidance;

pub use api_client::ApiClient;
