pub mod cache;
pub mod clock;
pub mod error;
pub mod fingerprint;
pub mod invalidation;
pub mod ledger;
pub mod source;
pub mod store;
#[cfg(test)]
mod test_util;
pub mod types;

pub use cache::{CacheLookup, ProfileCache};
pub use error::CoreError;
pub use types::{CacheSettings, ProfilePayload, UserId};
