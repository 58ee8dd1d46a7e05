pub mod aggregate;
pub mod cache;
pub mod domain;
pub mod error;
pub mod phone;
pub mod provider;
pub mod recents;
pub mod rules;
pub mod search;
pub mod time;

pub use aggregate::{aggregate, ContactAggregator};
pub use cache::{CacheSettings, EvictionReport, EvictionWorker, SearchResultCache};
pub use domain::*;
pub use error::CoreError;
pub use provider::{CallLogRow, ContactProvider, ProviderError, ProviderRow};
pub use search::{MatchPass, SearchEngine, SearchOutcome, SearchSession};
pub use time::{Clock, ManualClock, SystemClock};
