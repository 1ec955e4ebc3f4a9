pub mod archive;
pub mod cache;
pub mod error;
pub mod github;
pub mod http;
pub mod http_client;
pub mod release;
pub mod transport;
pub mod trust;
pub mod types;
pub mod utils;
