//! Build-discovery backend contract.
//!
//! The backend owns the "new builds since last check" bookkeeping per
//! branch and board; events only query it. Checkpoint state never lives
//! in this crate.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::BuildLookupError;

/// Branch identifier → ordered list of build names to install.
pub type BranchBuilds = BTreeMap<String, Vec<String>>;

/// External component tracking new builds per branch and board.
#[async_trait]
pub trait DiscoveryBackend: Send + Sync {
    /// Refresh the backend's view of the world (e.g. re-fetch the manifest
    /// repository). Events call this from their `update_criteria`
    /// implementations; failures propagate without retries.
    async fn refresh(&self) -> Result<(), BuildLookupError>;

    /// Builds that appeared per branch for `board` since the checkpoint
    /// the backend keeps for its caller.
    async fn branch_builds_since(&self, board: &str) -> Result<BranchBuilds, BuildLookupError>;
}
