//! Archive collaborator adapters.

mod http;

pub use http::HttpArchive;
