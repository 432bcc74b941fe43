//! Configuration loading, validation and logging setup.

mod backfill;
mod cache;
mod logging;
mod settings;
mod store;

pub use backfill::BackfillConfig;
pub use cache::CacheConfig;
pub use logging::LoggingConfig;
pub use settings::{ArchiveConfig, Config, EntityDecl};
pub use store::{StoreConfig, StoreStrategy};
