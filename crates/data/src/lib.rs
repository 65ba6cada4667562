pub mod api_token;
pub mod app;
pub mod bundle;
pub mod client;
pub mod environment;
pub mod version;
