use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("contact id is required")]
    EmptyContactId,
    #[error("display name is required")]
    EmptyDisplayName,
    #[error("contact has no phone numbers")]
    NoPhoneNumbers,
    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(String),
    #[error("primary number is not one of the contact's numbers: {0}")]
    PrimaryNotMember(String),
}
