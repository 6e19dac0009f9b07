use git2::{IndexAddOption, Repository as Git2Repo, RepositoryInitOptions, Signature};
use mono_release::config::Config;
use mono_release::git::{Git2Repository, Repository};
use mono_release::release::{Orchestrator, ReleaseOptions};
use mono_release::ErrorKind;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ============================================================================
// Helpers
// ============================================================================

fn init_repo() -> (TempDir, Git2Repo) {
    let dir = TempDir::new().unwrap();
    let mut options = RepositoryInitOptions::new();
    options.initial_head("main");
    let repo = Git2Repo::init_opts(dir.path(), &options).unwrap();
    (dir, repo)
}

fn write(root: &Path, path: &str, content: &str) {
    let path = root.join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn commit_all(repo: &Git2Repo, message: &str) -> git2::Oid {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"], IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let signature = Signature::now("Test", "test@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .unwrap()
}

fn tag_head(repo: &Git2Repo, name: &str) {
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    repo.tag_lightweight(name, head.as_object(), false).unwrap();
}

fn head_message(repo: &Git2Repo) -> String {
    repo.head()
        .unwrap()
        .peel_to_commit()
        .unwrap()
        .message()
        .unwrap()
        .to_string()
}

fn workdir(repo: &Git2Repo) -> PathBuf {
    repo.workdir().unwrap().to_path_buf()
}

/// api at 1.2.0 (tagged) and web at 0.1.0 (tagged), plus one api fix
fn released_monorepo() -> (TempDir, Git2Repo) {
    let (dir, repo) = init_repo();
    let root = workdir(&repo);
    write(&root, "api/package.json", "{\n  \"name\": \"api\",\n  \"version\": \"1.2.0\"\n}\n");
    write(
        &root,
        "web/Cargo.toml",
        "[package]\nname = \"web\"\nversion = \"0.1.0\"\nedition = \"2021\"\n",
    );
    commit_all(&repo, "chore: initial import");
    tag_head(&repo, "api-1.2.0");
    tag_head(&repo, "web-0.1.0");

    write(&root, "api/src/x.js", "module.exports = 1;\n");
    commit_all(&repo, "fix: handle empty payload");
    (dir, repo)
}

fn config() -> Config {
    Config {
        projects: vec!["api".to_string(), "web".to_string()],
        common: vec!["common".to_string()],
        ..Config::default()
    }
}

// ============================================================================
// Repository collaborator
// ============================================================================

#[test]
fn test_log_is_path_scoped_and_bounded_by_tag() {
    let (_dir, git) = released_monorepo();
    let root = workdir(&git);
    write(&root, "common/util.js", "x\n");
    write(&root, "api/src/y.js", "y\n");
    commit_all(&git, "feat: touches api and common");

    let repo = Git2Repository::from_git2(git);
    let paths = vec!["api".to_string(), "common".to_string()];
    let commits = repo.log(Some("api-1.2.0"), &paths).unwrap();
    let messages: Vec<&str> = commits.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(
        messages,
        vec!["fix: handle empty payload", "feat: touches api and common"]
    );

    let web = repo.log(Some("web-0.1.0"), &["web".to_string()]).unwrap();
    assert!(web.is_empty());

    let err = repo.log(Some("web-9.9.9"), &["web".to_string()]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HistoryInconsistency);
}

#[test]
fn test_list_tags_with_pattern() {
    let (_dir, git) = released_monorepo();
    tag_head(&git, "api-gateway-0.1.0");
    let repo = Git2Repository::from_git2(git);

    let mut tags = repo.list_tags("api-*").unwrap();
    tags.sort();
    assert_eq!(tags, vec!["api-1.2.0", "api-gateway-0.1.0"]);
    assert_eq!(repo.current_branch().unwrap(), "main");
}

#[test]
fn test_unstaged_diff_counts_tracked_edits() {
    let (_dir, git) = released_monorepo();
    let root = workdir(&git);
    write(&root, "api/package.json", "{\n  \"name\": \"api\",\n  \"version\": \"9.9.9\"\n}\n");
    write(&root, "scratch.txt", "untracked\n");

    let repo = Git2Repository::from_git2(git);
    let unstaged = repo.diff_summary(false).unwrap();
    assert_eq!(unstaged.changed, 1);
    assert_eq!(unstaged.insertions, 1);
    assert_eq!(unstaged.deletions, 1);
    assert_eq!(repo.diff_summary(true).unwrap().changed, 0);
}

#[test]
fn test_detached_head_is_configuration_error() {
    let (_dir, git) = released_monorepo();
    let head = git.head().unwrap().target().unwrap();
    git.set_head_detached(head).unwrap();

    let root = workdir(&git);
    let mut repo = Git2Repository::from_git2(git);
    let err = repo.current_branch().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("HEAD is detached"));
    assert!(err.to_string().contains("git checkout"));

    let err = Orchestrator::new(&mut repo, &config(), &root, ReleaseOptions::default())
        .run()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

// ============================================================================
// End-to-end release
// ============================================================================

#[test]
fn test_release_end_to_end() {
    let (_dir, mut git) = released_monorepo();
    let root = workdir(&git);
    let config = config();

    // Uncommitted local work must survive the run untouched
    write(&root, "notes.txt", "draft\n");

    let mut repo = Git2Repository::from_git2(Git2Repo::open(&root).unwrap());
    let report = Orchestrator::new(&mut repo, &config, &root, ReleaseOptions::default())
        .run()
        .unwrap();

    assert_eq!(report.tags, vec!["api-1.2.1"]);
    assert!(report.commit.is_some());
    assert_eq!(report.diff.map(|d| d.changed), Some(2));

    assert_eq!(head_message(&git), "chore(release): api-1.2.1");
    assert!(git.find_reference("refs/tags/api-1.2.1").is_ok());
    assert!(git.find_reference("refs/tags/web-0.1.1").is_err());

    let manifest = fs::read_to_string(root.join("api/package.json")).unwrap();
    assert!(manifest.contains("\"version\": \"1.2.1\""));
    let changelog = fs::read_to_string(root.join("api/CHANGELOG.md")).unwrap();
    assert!(changelog.contains("handle empty payload"));

    assert_eq!(fs::read_to_string(root.join("notes.txt")).unwrap(), "draft\n");
    let mut stashes = 0;
    git.stash_foreach(|_, _, _| {
        stashes += 1;
        true
    })
    .unwrap();
    assert_eq!(stashes, 0);

    // Nothing left staged
    let mut repo = Git2Repository::from_git2(git);
    assert_eq!(repo.diff_summary(true).unwrap().changed, 0);

    // Second run finds nothing to do
    let second = Orchestrator::new(&mut repo, &config, &root, ReleaseOptions::default())
        .run()
        .unwrap();
    assert!(second.decisions.iter().all(|d| !d.is_release()));
    assert!(second.commit.is_none());
}

#[test]
fn test_invalid_version_rolls_back_real_repository() {
    let (_dir, git) = released_monorepo();
    let root = workdir(&git);
    write(
        &root,
        "web/Cargo.toml",
        "[package]\nname = \"web\"\nversion = \"not-a-version\"\n",
    );
    commit_all(&git, "chore: break web version");
    let head_before = git.head().unwrap().target().unwrap();
    write(&root, "notes.txt", "draft\n");

    let mut repo = Git2Repository::from_git2(Git2Repo::open(&root).unwrap());
    let err = Orchestrator::new(&mut repo, &config(), &root, ReleaseOptions::default())
        .run()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Version);

    assert_eq!(git.head().unwrap().target().unwrap(), head_before);
    assert!(git.find_reference("refs/tags/api-1.2.1").is_err());
    let manifest = fs::read_to_string(root.join("api/package.json")).unwrap();
    assert!(manifest.contains("\"version\": \"1.2.0\""));
    assert!(!root.join("api/CHANGELOG.md").exists());
    assert_eq!(fs::read_to_string(root.join("notes.txt")).unwrap(), "draft\n");
}
