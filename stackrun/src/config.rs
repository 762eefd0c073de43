//! Project configuration.
//!
//! Settings live in an optional `stackrun.toml` at the project root. A few
//! cloud settings can be overridden from the environment so CI can inject
//! them without touching the repository.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::git;

/// Project configuration file name, also marking the project root
pub const CONFIG_FILE: &str = "stackrun.toml";

pub const ENV_CLOUD_URL: &str = "STACKRUN_CLOUD_URL";
pub const ENV_CLOUD_PAGESIZE: &str = "STACKRUN_CLOUD_PAGESIZE";
pub const ENV_CLOUD_TOKEN: &str = "STACKRUN_CLOUD_TOKEN";

/// Default page size for cloud status lookups
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub run: RunSettings,
    pub git: GitSettings,
    pub cloud: CloudSettings,
}

/// `[run]`: execution driver behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    /// Keep running the remaining stacks after one fails
    pub continue_on_error: bool,
    /// Kill a stack's command after this many seconds
    pub timeout_secs: Option<u64>,
}

impl RunSettings {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// `[git]`: change detection
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitSettings {
    pub default_remote: String,
    pub default_branch: String,
    /// Fixed base ref for change detection, overriding the computed one
    pub change_base: Option<String>,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            default_remote: "origin".to_string(),
            default_branch: "main".to_string(),
            change_base: None,
        }
    }
}

/// `[cloud]`: remote status lookups
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloudSettings {
    pub api_url: Option<String>,
    pub page_size: u32,
    /// Only ever read from the environment
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self {
            api_url: None,
            page_size: DEFAULT_PAGE_SIZE,
            token: None,
        }
    }
}

impl ProjectConfig {
    /// Load `stackrun.toml` from the project root, falling back to defaults
    /// when it does not exist, then apply environment overrides.
    pub fn load(root: &Path) -> Result<Self> {
        let mut config = Self::load_file(root)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_file(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply environment-style overrides looked up through `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_CLOUD_URL).filter(|v| !v.is_empty()) {
            self.cloud.api_url = Some(url);
        }
        if let Some(size) = lookup(ENV_CLOUD_PAGESIZE).filter(|v| !v.is_empty()) {
            self.cloud.page_size = size
                .parse()
                .with_context(|| format!("{ENV_CLOUD_PAGESIZE} must be a number, got {size:?}"))?;
        }
        if let Some(token) = lookup(ENV_CLOUD_TOKEN).filter(|v| !v.is_empty()) {
            self.cloud.token = Some(token);
        }
        Ok(())
    }
}

/// Find the project root for a working directory.
///
/// The nearest ancestor holding `stackrun.toml` wins; otherwise the git
/// toplevel; otherwise the working directory itself.
pub fn find_project_root(workdir: &Path) -> PathBuf {
    if let Some(dir) = workdir
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
    {
        return dir.to_path_buf();
    }

    match git::toplevel(workdir) {
        Ok(top) => top,
        Err(_) => workdir.to_path_buf(),
    }
}
