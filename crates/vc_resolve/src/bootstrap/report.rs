use alloc::vec::Vec;

use thiserror::Error;

use crate::error::HostError;

/// Why a contributor was skipped.
#[derive(Debug, Error)]
pub enum ContributorError {
    #[error("failed to instantiate: {0}")]
    Instantiate(HostError),
    #[error("failed to contribute: {0}")]
    Contribute(HostError),
}

/// A contributor whose hints were discarded.
#[derive(Debug)]
pub struct SkippedContributor {
    pub name: &'static str,
    pub error: ContributorError,
}

/// What a bootstrap did, in run order.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    pub(super) applied: Vec<&'static str>,
    pub(super) skipped: Vec<SkippedContributor>,
    pub(super) replaced: usize,
}

impl BootstrapReport {
    /// Contributors whose hints were merged.
    #[inline]
    pub fn applied(&self) -> &[&'static str] {
        &self.applied
    }

    #[inline]
    pub fn skipped(&self) -> &[SkippedContributor] {
        &self.skipped
    }

    /// How many bundles were replaced by a later contributor.
    #[inline]
    pub fn replaced(&self) -> usize {
        self.replaced
    }

    #[inline]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}
