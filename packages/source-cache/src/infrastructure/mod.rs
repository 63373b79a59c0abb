//! Infrastructure layer for source-cache
//!
//! Implementations of the domain port traits:
//!
//! - `MemoryCache`: process-lifetime maps
//! - `PersistentCache`: SQLite file (feature `sqlite`)
//! - `MultiTierCache`: fast tier in front of a slow tier
//! - `DiscardCache`: caching disabled

mod discard;
mod memory;
mod tiered;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use discard::{DiscardCache, DiscardSingleSourceCache};
pub use memory::{MemoryCache, MemorySingleSourceCache};
pub use tiered::{MultiTierCache, MultiTierSingleSourceCache};

#[cfg(feature = "sqlite")]
pub use sqlite::{PersistentCache, PersistentSingleSourceCache, DB_FILE_NAME, SCHEMA_VERSION};
