pub mod error;
pub mod source;
pub mod vcf;

pub use error::{Result, SyncError};
