pub mod api_token;
pub mod bundles;
pub mod catalog;
pub mod client;
pub mod error;
pub mod health;
pub mod routes;
pub mod state;
