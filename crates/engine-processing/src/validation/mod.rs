pub mod record;
pub mod reference;

pub use record::{MAX_FEEDBACK_CHARS, validate_bonus, validate_record};
pub use reference::cross_reference;
