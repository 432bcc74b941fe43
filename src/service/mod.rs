//! Application services composing the pipeline behind stable contracts.

mod bootstrap;
mod query;

pub use bootstrap::{build_auditor, build_query_service, build_reconciler, build_store};
pub use query::QueryService;
