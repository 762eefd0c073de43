//! Loading a project and selecting the stacks a command acts on

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cloud::{self, CloudClient, StatusFilter, StatusSource};
use crate::config::{find_project_root, ProjectConfig};
use crate::error::{CloudError, StackError};
use crate::git::{self, Repository};
use crate::plan::{DependencyGraph, ExecutionPlan, Selection};
use crate::stack::{discover, Registry, StackPath};

/// Selection flags shared by `list`, `run` and `plan run-order`
#[derive(Debug, Clone, Default)]
pub struct SelectArgs {
    /// Only stacks changed since the change base
    pub changed: bool,
    /// Explicit change base, overriding config and defaults
    pub git_change_base: Option<String>,
    /// Only stacks whose cloud state matches
    pub cloud_status: Option<StatusFilter>,
}

/// A loaded project: configuration, stacks and their dependency graph
#[derive(Debug)]
pub struct Project {
    pub root: PathBuf,
    /// Where the command was invoked, as a project path
    pub workdir: StackPath,
    pub config: ProjectConfig,
    pub registry: Registry,
    pub graph: DependencyGraph,
}

impl Project {
    /// Locate the project containing `workdir` and load it
    pub fn load(workdir: &Path) -> Result<Self> {
        let workdir = workdir
            .canonicalize()
            .with_context(|| format!("Failed to resolve directory: {}", workdir.display()))?;
        let root = find_project_root(&workdir)
            .canonicalize()
            .context("Failed to resolve project root")?;
        let scope = StackPath::from_fs_path(&root, &workdir).with_context(|| {
            format!(
                "{} is not inside project {}",
                workdir.display(),
                root.display()
            )
        })?;

        Self::open(&root, scope)
    }

    /// Load the project rooted at `root`, scoped to `workdir`
    pub fn open(root: &Path, workdir: StackPath) -> Result<Self> {
        let config = ProjectConfig::load(root)?;
        let registry = discover(root)?;
        let graph = DependencyGraph::build(&registry)?;
        info!(root = %root.display(), stacks = registry.len(), "loaded project");

        Ok(Self {
            root: root.to_path_buf(),
            workdir,
            config,
            registry,
            graph,
        })
    }

    /// Run order of every stack in the project
    pub fn run_order(&self) -> Result<ExecutionPlan, StackError> {
        self.graph.run_order()
    }

    /// Run order narrowed to the working directory and the selection flags.
    ///
    /// `source` overrides the cloud client built from configuration.
    pub fn select(
        &self,
        args: &SelectArgs,
        source: Option<&dyn StatusSource>,
    ) -> Result<ExecutionPlan> {
        let plan = self.run_order()?;
        let mut selection = Selection::all().within(self.workdir.clone());

        if args.changed {
            let changed = git::detect_changed_stacks(
                &self.root,
                &self.registry,
                &self.config.git,
                args.git_change_base.as_deref(),
            )?;
            if changed.is_empty() {
                debug!("no changed stacks");
                return Ok(ExecutionPlan::default());
            }
            selection = selection.changed(changed);
        }

        if let Some(filter) = args.cloud_status {
            selection = selection.with_ids(self.cloud_ids(filter, source)?);
        }

        Ok(selection.apply(plan))
    }

    fn cloud_ids(
        &self,
        filter: StatusFilter,
        source: Option<&dyn StatusSource>,
    ) -> Result<BTreeSet<String>> {
        let remote = &self.config.git.default_remote;
        let repository = git::repository_identity(remote, &self.root)?.ok_or_else(|| {
            CloudError::MissingRemote {
                remote: remote.clone(),
            }
        })?;
        if let Repository::Local(_) = repository {
            return Err(CloudError::LocalRepository {
                filter: filter.to_string(),
            }
            .into());
        }

        let client;
        let source = match source {
            Some(source) => source,
            None => {
                client = CloudClient::new(&self.config.cloud)?;
                &client as &dyn StatusSource
            }
        };

        Ok(cloud::stack_ids_with_status(
            source,
            &repository,
            filter,
            self.config.cloud.page_size,
        )?)
    }

    /// `path` as shown to the user, relative to the working directory
    pub fn display_path(&self, path: &StackPath) -> String {
        path.relative_to(&self.workdir)
    }
}
