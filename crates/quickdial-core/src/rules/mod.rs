pub mod validation;

pub use validation::{merge_same_id, sanitize, validate};
