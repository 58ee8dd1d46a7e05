pub mod calls;
pub mod contacts;

pub use calls::{CallLogRepo, CallNew};
pub use contacts::{ContactNew, ContactsRepo, StoredContact};

pub(crate) use contacts::fold_name;
