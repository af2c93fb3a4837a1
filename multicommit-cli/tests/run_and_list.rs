use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use git2::{Repository, RepositoryInitOptions, Signature};
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn multicommit_cmd(home: &Path) -> assert_cmd::Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("multicommit"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    assert_cmd::Command::from_std(cmd)
}

struct Layout {
    dir: TempDir,
}

impl Layout {
    fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    fn root(&self) -> PathBuf {
        self.dir.path().join("projects")
    }

    fn update(&self) -> PathBuf {
        self.dir.path().join("app.yaml")
    }

    fn target(&self) -> PathBuf {
        self.root().join("api/config/app.yaml")
    }

    fn read(&self, project: &str) -> String {
        fs::read_to_string(self.root().join(project).join("config/app.yaml")).expect("read")
    }

    fn batch_args(&self) -> Vec<String> {
        vec![
            "--root".into(),
            self.root().display().to_string(),
            "--update".into(),
            self.update().display().to_string(),
            "--target".into(),
            self.target().display().to_string(),
        ]
    }
}

/// `api` and `web` have `config/app.yaml`; `docs` does not.
fn plain_layout() -> Layout {
    let layout = Layout {
        dir: TempDir::new().expect("tempdir"),
    };
    fs::create_dir_all(layout.home()).expect("home");
    for name in ["api", "web"] {
        let config = layout.root().join(name).join("config");
        fs::create_dir_all(&config).expect("mkdir");
        fs::write(config.join("app.yaml"), "v: 1\n").expect("write");
    }
    fs::create_dir_all(layout.root().join("docs")).expect("mkdir");
    fs::write(layout.update(), "v: 2\n").expect("write update");
    layout
}

/// Same projects, but `api` is a git repository pushing to a local bare remote.
fn git_layout() -> Layout {
    let layout = plain_layout();
    let api = layout.root().join("api");
    let remote = layout.dir.path().join("api.git");

    let mut options = RepositoryInitOptions::new();
    options.initial_head("main");
    let repo = Repository::init_opts(&api, &options).expect("init");
    options.bare(true);
    Repository::init_opts(&remote, &options).expect("init bare");

    let mut index = repo.index().expect("index");
    index
        .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
        .expect("add");
    index.write().expect("write index");
    let tree = repo
        .find_tree(index.write_tree().expect("tree"))
        .expect("find tree");
    let sig = Signature::now("tester", "tester@example.com").expect("sig");
    repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
        .expect("commit");
    repo.remote("origin", remote.to_str().expect("utf8"))
        .expect("remote");
    layout
}

fn remote_head(layout: &Layout) -> Option<String> {
    let remote = Repository::open_bare(layout.dir.path().join("api.git")).ok()?;
    remote
        .refname_to_id("refs/heads/main")
        .ok()
        .map(|oid| oid.to_string())
}

#[test]
fn list_shows_projects_and_labels() {
    let layout = git_layout();
    multicommit_cmd(&layout.home())
        .arg("list")
        .arg(layout.root())
        .assert()
        .success()
        .stdout(contains("api"))
        .stdout(contains("main"))
        .stdout(contains("docs"))
        .stdout(contains("not a repository"));
}

#[test]
fn list_json_is_machine_readable() {
    let layout = plain_layout();
    let output = multicommit_cmd(&layout.home())
        .args(["list", "--json"])
        .arg(layout.root())
        .output()
        .expect("run");
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let projects = parsed.as_array().expect("array");
    assert_eq!(projects.len(), 3);
    assert!(projects
        .iter()
        .all(|p| p["branch"] == "not a repository"));
}

#[test]
fn debug_run_copies_without_publishing() {
    let layout = plain_layout();
    multicommit_cmd(&layout.home())
        .arg("run")
        .args(layout.batch_args())
        .arg("--debug")
        .assert()
        .success()
        .stdout(contains("Copied (2)"))
        .stdout(contains("Copy failed (1)"))
        .stdout(contains("target not found"))
        .stdout(contains("[debug] publish skipped"))
        .stdout(contains("Published").not());
    assert_eq!(layout.read("api"), "v: 2\n");
    assert_eq!(layout.read("web"), "v: 2\n");
    assert!(!layout.root().join("docs/config/app.yaml").exists());
}

#[test]
fn target_outside_projects_is_a_configuration_error() {
    let layout = plain_layout();
    multicommit_cmd(&layout.home())
        .arg("run")
        .args(["--root"])
        .arg(layout.root())
        .args(["--update"])
        .arg(layout.update())
        .args(["--target"])
        .arg(layout.update())
        .arg("--debug")
        .assert()
        .failure()
        .stderr(contains("must lie inside exactly one project"));
    assert_eq!(layout.read("api"), "v: 1\n");
}

#[test]
fn empty_root_reports_no_projects() {
    let layout = plain_layout();
    let empty = layout.dir.path().join("empty");
    fs::create_dir_all(&empty).expect("mkdir");
    multicommit_cmd(&layout.home())
        .args(["run", "--root"])
        .arg(&empty)
        .args(["--update"])
        .arg(layout.update())
        .args(["--target"])
        .arg(empty.join("a/app.yaml"))
        .assert()
        .failure()
        .stderr(contains("no projects found"));
}

#[test]
fn declined_confirmation_publishes_nothing() {
    let layout = git_layout();
    multicommit_cmd(&layout.home())
        .arg("run")
        .args(layout.batch_args())
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(contains("Publish cancelled"));
    assert_eq!(layout.read("api"), "v: 2\n");
    assert_eq!(remote_head(&layout), None);
}

#[test]
fn confirmed_run_commits_and_pushes() {
    let layout = git_layout();
    multicommit_cmd(&layout.home())
        .arg("run")
        .args(layout.batch_args())
        .write_stdin("y\n")
        .assert()
        .success()
        .stdout(contains("Published (1)"))
        .stdout(contains("Publish failed (1)"))
        .stdout(contains("cannot open repository"));

    let repo = Repository::open(layout.root().join("api")).expect("open");
    let head = repo.head().expect("head").peel_to_commit().expect("commit");
    assert_eq!(head.message(), Some("Automatic update: config/app.yaml"));
    assert_eq!(remote_head(&layout), Some(head.id().to_string()));
}

#[test]
fn settings_file_changes_commit_message_and_push() {
    let layout = git_layout();
    let config_dir = layout.home().join(".multicommit");
    fs::create_dir_all(&config_dir).expect("mkdir");
    fs::write(
        config_dir.join("config.yaml"),
        "commit_message: \"chore: sync {path}\"\npush: false\n",
    )
    .expect("write settings");

    multicommit_cmd(&layout.home())
        .arg("run")
        .args(layout.batch_args())
        .args(["--yes", "--exclude", "web"])
        .assert()
        .success();

    let repo = Repository::open(layout.root().join("api")).expect("open");
    let head = repo.head().expect("head").peel_to_commit().expect("commit");
    assert_eq!(head.message(), Some("chore: sync config/app.yaml"));
    assert_eq!(remote_head(&layout), None, "push disabled in settings");
}

#[test]
fn json_run_emits_report() {
    let layout = plain_layout();
    let output = multicommit_cmd(&layout.home())
        .arg("run")
        .args(layout.batch_args())
        .args(["--debug", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(report["copied_ok"].as_array().map(Vec::len), Some(2));
    assert_eq!(report["copy_failed"].as_array().map(Vec::len), Some(1));
    assert_eq!(report["published_ok"].as_array().map(Vec::len), Some(0));
}

#[test]
fn diff_previews_each_project() {
    let layout = plain_layout();
    multicommit_cmd(&layout.home())
        .arg("diff")
        .args(layout.batch_args())
        .assert()
        .success()
        .stdout(contains("--- a/config/app.yaml"))
        .stdout(contains("+v: 2"))
        .stdout(contains("docs: missing"));
    assert_eq!(layout.read("api"), "v: 1\n");
}
