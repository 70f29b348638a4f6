pub mod context;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod retry;
