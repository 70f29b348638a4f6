pub mod batch;
pub mod error;
pub mod request;
pub mod session;
pub mod summary;

#[cfg(test)]
mod tests;
