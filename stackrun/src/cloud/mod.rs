//! Cloud status lookups
//!
//! Stacks can be selected by the state a remote service reports for them
//! (deployment failed, drift detected). The service is keyed by repository
//! identity and the stack's logical id.

pub mod client;
pub mod status;

pub use client::{fetch_all, CloudClient, PaginatedResult, StacksPage, StatusSource};
pub use status::{matching_ids, CloudStack, DeploymentStatus, DriftStatus, StackStatus, StatusFilter};

use std::collections::BTreeSet;

use tracing::info;

use crate::error::CloudError;
use crate::git::Repository;

/// Ids of the stacks the cloud reports as matching `filter`.
///
/// Filesystem remotes have no cloud identity and are rejected.
pub fn stack_ids_with_status(
    source: &dyn StatusSource,
    repository: &Repository,
    filter: StatusFilter,
    per_page: u32,
) -> Result<BTreeSet<String>, CloudError> {
    let repository = match repository {
        Repository::Hosted(name) => name,
        Repository::Local(_) => {
            return Err(CloudError::LocalRepository {
                filter: filter.to_string(),
            })
        }
    };

    let stacks = fetch_all(source, repository, per_page)?;
    let ids = matching_ids(&stacks, repository, filter);
    info!(repository = %repository, %filter, fetched = stacks.len(), matched = ids.len(), "cloud status lookup");
    Ok(ids)
}
