pub mod core;
pub mod operation;
pub mod records;
