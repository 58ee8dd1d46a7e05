pub mod call;
pub mod contact;
pub mod ids;

pub use call::{CallRecord, CallType};
pub use contact::{normalize_display_name, Contact};
pub use ids::ContactId;
