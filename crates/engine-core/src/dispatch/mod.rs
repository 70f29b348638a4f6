pub mod dispatcher;
pub mod pending;
