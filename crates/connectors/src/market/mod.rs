pub mod client;
pub mod error;
pub mod http;
