//! Cloud-reported stack states and the filters matched against them

use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;

/// Overall stack status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackStatus {
    Ok,
    Failed,
    Drifted,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Status of the last deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Ok,
    Failed,
    Pending,
    Running,
    Canceled,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Status of the last drift check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftStatus {
    Ok,
    Drifted,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A stack as known to the cloud service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CloudStack {
    /// The stack's logical id (`id` in `stack.toml`)
    pub meta_id: String,
    /// Repository identity, `host/owner/repo`
    pub repository: String,
    #[serde(default)]
    pub status: StackStatus,
    #[serde(default)]
    pub deployment_status: DeploymentStatus,
    #[serde(default)]
    pub drift_status: DriftStatus,
}

/// Status filter accepted by `--cloud-status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Stack status is ok
    Healthy,
    /// Last deployment failed or drift detected
    Unhealthy,
    /// Last deployment failed
    Failed,
    /// Drift detected
    Drifted,
}

impl StatusFilter {
    pub fn matches(&self, stack: &CloudStack) -> bool {
        match self {
            StatusFilter::Healthy => stack.status == StackStatus::Ok,
            StatusFilter::Unhealthy => {
                stack.deployment_status == DeploymentStatus::Failed
                    || stack.drift_status == DriftStatus::Drifted
            }
            StatusFilter::Failed => stack.deployment_status == DeploymentStatus::Failed,
            StatusFilter::Drifted => stack.drift_status == DriftStatus::Drifted,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusFilter::Healthy => write!(f, "healthy"),
            StatusFilter::Unhealthy => write!(f, "unhealthy"),
            StatusFilter::Failed => write!(f, "failed"),
            StatusFilter::Drifted => write!(f, "drifted"),
        }
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ok" | "healthy" => Ok(StatusFilter::Healthy),
            "unhealthy" => Ok(StatusFilter::Unhealthy),
            "failed" => Ok(StatusFilter::Failed),
            "drifted" => Ok(StatusFilter::Drifted),
            _ => anyhow::bail!(
                "Invalid cloud status filter: {s}. Use: ok, healthy, unhealthy, failed, drifted"
            ),
        }
    }
}

/// Ids of the stacks in `repository` whose state matches `filter`
pub fn matching_ids(stacks: &[CloudStack], repository: &str, filter: StatusFilter) -> BTreeSet<String> {
    stacks
        .iter()
        .filter(|s| s.repository == repository && filter.matches(s))
        .map(|s| s.meta_id.clone())
        .collect()
}
