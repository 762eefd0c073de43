//! `--cloud-status` selection against a fake status service

use std::cell::Cell;

use super::helpers::{git, Sandbox};
use stackrun::cloud::{
    CloudStack, DeploymentStatus, DriftStatus, PaginatedResult, StackStatus, StacksPage,
    StatusFilter, StatusSource,
};
use stackrun::commands::list::{self, ListArgs};
use stackrun::commands::SelectArgs;
use stackrun::CloudError;

const REPO: &str = "github.com/acme/infra";

/// Serves a fixed stack list, two entries per page
struct FakeCloud {
    stacks: Vec<CloudStack>,
    requests: Cell<u32>,
}

impl StatusSource for FakeCloud {
    fn fetch_page(&self, repository: &str, page: u32, per_page: u32) -> Result<StacksPage, CloudError> {
        assert_eq!(repository, REPO);
        self.requests.set(self.requests.get() + 1);
        let start = ((page - 1) * per_page) as usize;
        let stacks = self
            .stacks
            .iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect();
        Ok(StacksPage {
            stacks,
            paginated_result: PaginatedResult {
                total: self.stacks.len() as u64,
                page,
                per_page,
            },
        })
    }
}

fn cloud_stack(id: &str, deployment: DeploymentStatus, drift: DriftStatus) -> CloudStack {
    CloudStack {
        meta_id: id.to_string(),
        repository: REPO.to_string(),
        status: StackStatus::Unknown,
        deployment_status: deployment,
        drift_status: drift,
    }
}

fn sandbox_with_ids() -> Sandbox {
    let sandbox = Sandbox::new();
    for (dir, id) in [("net", Some("net")), ("app", Some("app")), ("db", Some("db")), ("tmp", None)] {
        let path = sandbox.create_stack(dir, &[]);
        if let Some(id) = id {
            std::fs::write(
                path.join("stack.toml"),
                format!("[stack]\nid = \"{id}\"\n"),
            )
            .unwrap();
        }
    }
    sandbox
}

fn list_with(sandbox: &Sandbox, filter: StatusFilter, cloud: &FakeCloud) -> anyhow::Result<String> {
    let project = sandbox.project_at("");
    let args = ListArgs {
        select: SelectArgs {
            cloud_status: Some(filter),
            ..SelectArgs::default()
        },
        run_order: false,
    };
    let mut out = Vec::new();
    list::execute(&project, &args, Some(cloud), &mut out)?;
    Ok(String::from_utf8(out)?)
}

fn fake_cloud() -> FakeCloud {
    FakeCloud {
        stacks: vec![
            cloud_stack("net", DeploymentStatus::Failed, DriftStatus::Ok),
            cloud_stack("app", DeploymentStatus::Ok, DriftStatus::Drifted),
            cloud_stack("db", DeploymentStatus::Ok, DriftStatus::Ok),
            cloud_stack("tmp", DeploymentStatus::Failed, DriftStatus::Drifted),
            cloud_stack("gone", DeploymentStatus::Failed, DriftStatus::Ok),
        ],
        requests: Cell::new(0),
    }
}

#[test]
fn test_local_remote_is_rejected() {
    let sandbox = sandbox_with_ids();
    let err = list_with(&sandbox, StatusFilter::Unhealthy, &fake_cloud()).unwrap_err();
    assert!(
        err.to_string()
            .contains("status filter does not work with filesystem based remotes"),
        "{err}"
    );
}

#[test]
fn test_unhealthy_selects_failed_and_drifted() {
    let sandbox = sandbox_with_ids();
    git(
        &["remote", "set-url", "origin", "git@github.com:acme/infra.git"],
        sandbox.root(),
    );
    let cloud = fake_cloud();

    // the stack without an id never matches, even though "tmp" is unhealthy
    assert_eq!(
        list_with(&sandbox, StatusFilter::Unhealthy, &cloud).unwrap(),
        "app\nnet\n"
    );
    assert_eq!(
        list_with(&sandbox, StatusFilter::Drifted, &cloud).unwrap(),
        "app\n"
    );
    assert_eq!(
        list_with(&sandbox, StatusFilter::Failed, &cloud).unwrap(),
        "net\n"
    );
}

#[test]
fn test_every_page_is_fetched() {
    let sandbox = sandbox_with_ids();
    sandbox.write_file("stackrun.toml", "[cloud]\npage_size = 2\n");
    git(
        &["remote", "set-url", "origin", "https://github.com/acme/infra"],
        sandbox.root(),
    );
    let cloud = fake_cloud();

    list_with(&sandbox, StatusFilter::Unhealthy, &cloud).unwrap();
    assert_eq!(cloud.requests.get(), 3);
}
