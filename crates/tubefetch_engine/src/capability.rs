use std::path::Path;

use crate::{AudioFormat, CapabilityError};

/// Turns a free-text query into a canonical link.
///
/// An `Err` or an empty link both count as "all variants exhausted".
#[async_trait::async_trait]
pub trait Resolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<String, CapabilityError>;
}

/// Downloads one link into `dest_dir` as a single file of the given format.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(
        &self,
        link: &str,
        dest_dir: &Path,
        format: AudioFormat,
    ) -> Result<(), CapabilityError>;
}
