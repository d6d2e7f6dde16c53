//! Source dataset fetching
//!
//! The Extract stage depends on the [`SourceFetcher`] capability rather
//! than a shell command, so transfers are typed and testable without a
//! network in the way.

pub mod http;

pub use http::HttpFetcher;

use crate::domain::result::Result;
use async_trait::async_trait;
use std::path::Path;
use url::Url;

/// Capability: retrieve a source file to a staging path
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetches `url` into `dest`, returning the number of bytes written
    ///
    /// The destination's parent directory must already exist. Any
    /// transfer failure is fatal for the surrounding Extract task; no
    /// content validation is performed here.
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64>;
}
