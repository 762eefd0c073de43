//! Sandbox helpers: temporary git repositories populated with stacks

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use stackrun::commands::Project;
use stackrun::stack::StackPath;

/// A git repository with a bare `origin` remote, both temporary
pub struct Sandbox {
    repo: TempDir,
    _remote: TempDir,
}

impl Sandbox {
    /// Create a repository on `main` with an initial commit pushed to origin
    pub fn new() -> Self {
        let remote = TempDir::new().expect("Failed to create remote directory");
        git(&["init", "--bare", "--quiet"], remote.path());

        let repo = TempDir::new().expect("Failed to create temp directory");
        let root = repo.path();
        git(&["init", "--quiet"], root);
        git(&["config", "user.email", "test@test.com"], root);
        git(&["config", "user.name", "Test User"], root);
        git(&["config", "commit.gpgsign", "false"], root);

        fs::write(root.join("README.md"), "# Test Repository\n").expect("Failed to write README.md");
        git(&["add", "."], root);
        git(&["commit", "--quiet", "-m", "Initial commit"], root);
        git(&["branch", "-M", "main"], root);

        let remote_path = remote.path().to_string_lossy().to_string();
        git(&["remote", "add", "origin", &remote_path], root);
        git(&["push", "--quiet", "origin", "main"], root);

        Self {
            repo,
            _remote: remote,
        }
    }

    pub fn root(&self) -> &Path {
        self.repo.path()
    }

    /// Create a stack directory with a `stack.toml`
    pub fn create_stack(&self, rel: &str, after: &[&str]) -> PathBuf {
        let dir = self.root().join(rel);
        fs::create_dir_all(&dir).expect("Failed to create stack directory");
        let after = after
            .iter()
            .map(|a| format!("{a:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        fs::write(
            dir.join("stack.toml"),
            format!("[stack]\nafter = [{after}]\n"),
        )
        .expect("Failed to write stack.toml");
        dir
    }

    pub fn write_file(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(path, content).expect("Failed to write file");
    }

    pub fn commit_all(&self, message: &str) {
        git(&["add", "-A"], self.root());
        git(&["commit", "--quiet", "-m", message], self.root());
    }

    pub fn push_main(&self) {
        git(&["push", "--quiet", "origin", "main"], self.root());
    }

    pub fn checkout_new(&self, branch: &str) {
        git(&["checkout", "--quiet", "-b", branch], self.root());
    }

    /// Load the project as seen from `rel` (`""` for the root)
    pub fn project_at(&self, rel: &str) -> Project {
        Project::load(&self.root().join(rel)).expect("Failed to load project")
    }
}

/// Run git in `dir`, panicking on failure
pub fn git(args: &[&str], dir: &Path) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Build a stack layout from compact specs:
/// `s:<dir>` or `s:<dir>:after=[a,b]`, `f:<file>:<content>`
pub fn build_tree(sandbox: &Sandbox, layout: &[&str]) {
    for spec in layout {
        let mut parts = spec.splitn(3, ':');
        let kind = parts.next().unwrap_or_default();
        let target = parts.next().expect("layout entry needs a target");
        let rest = parts.next();

        match kind {
            "s" => {
                let after: Vec<&str> = rest
                    .and_then(|r| r.strip_prefix("after=["))
                    .and_then(|r| r.strip_suffix(']'))
                    .map(|list| list.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
                    .unwrap_or_default();
                sandbox.create_stack(target, &after);
            }
            "f" => sandbox.write_file(target, rest.unwrap_or_default()),
            other => panic!("unknown layout kind {other:?}"),
        }
    }
}

/// Displayed run order of `project`, one entry per stack
pub fn run_order(project: &Project) -> Vec<String> {
    project
        .run_order()
        .expect("Failed to compute run order")
        .iter()
        .map(|s| project.display_path(&s.path))
        .collect()
}

/// Absolute path of `program` on `PATH`, as run headers print it
pub fn resolved(program: &str) -> String {
    which::which(program)
        .expect("program on PATH")
        .display()
        .to_string()
}

pub fn sp(s: &str) -> StackPath {
    StackPath::root().resolve(s).expect("valid stack path")
}
