use log::debug;
use std::path::Path;
use std::process::Command;

use crate::error::{Result, TravisStatusError};

const BRANCH_REF_PREFIX: &str = "refs/heads/";

/// Repository slug and branch of the active file.
///
/// `error` short-circuits the pipeline: `Some("")` means "clear the status
/// and stop", a non-empty message is shown to the user as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoInfo {
    pub repository_id: Option<String>,
    pub branch: Option<String>,
    pub error: Option<String>,
}

impl RepoInfo {
    pub fn resolved(repository_id: String, branch: String) -> Self {
        Self {
            repository_id: Some(repository_id),
            branch: Some(branch),
            error: None,
        }
    }

    /// Silent suppression: nothing to show, nothing to fetch.
    pub fn suppressed() -> Self {
        Self {
            error: Some(String::new()),
            ..Self::default()
        }
    }
}

/// Read-only queries against the local source-control client.
pub trait SourceControl {
    /// Run the client with `args` inside `dir` and return trimmed stdout.
    fn query(&self, dir: &Path, args: &[&str]) -> Result<String>;
}

/// `git` on `PATH`.
#[derive(Debug, Default, Clone, Copy)]
pub struct GitCli;

impl SourceControl for GitCli {
    fn query(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()?;

        if !output.status.success() {
            return Err(TravisStatusError::SourceControl(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

pub struct RepoResolver<S> {
    source_control: S,
}

impl<S: SourceControl> RepoResolver<S> {
    pub fn new(source_control: S) -> Self {
        Self { source_control }
    }

    /// Resolve slug and branch for `file`.
    ///
    /// Every failure collapses to [`RepoInfo::suppressed`]; the detail only
    /// goes to the debug log.
    pub fn resolve(&self, file: Option<&Path>, repo_override: Option<&str>) -> RepoInfo {
        let Some(dir) = file.and_then(Path::parent) else {
            debug!("No file on disk for this view, skipping repository lookup");
            return RepoInfo::suppressed();
        };

        match self.lookup(dir, repo_override) {
            Ok((repository_id, branch)) => RepoInfo::resolved(repository_id, branch),
            Err(e) => {
                debug!("Repository lookup failed in {}: {e}", dir.display());
                RepoInfo::suppressed()
            }
        }
    }

    fn lookup(&self, dir: &Path, repo_override: Option<&str>) -> Result<(String, String)> {
        let repository_id = match repo_override {
            Some(repo) => repo.to_string(),
            None => self.slug(dir)?,
        };

        let head = self.source_control.query(dir, &["symbolic-ref", "HEAD"])?;
        let branch = head.strip_prefix(BRANCH_REF_PREFIX).unwrap_or(&head);
        if branch.is_empty() {
            return Err(TravisStatusError::SourceControl("empty HEAD reference".into()));
        }

        Ok((repository_id, branch.to_string()))
    }

    fn slug(&self, dir: &Path) -> Result<String> {
        let raw = self
            .source_control
            .query(dir, &["config", "--local", "--get", "travis.slug"])?;

        let slug: String = raw.lines().collect();
        if slug.is_empty() {
            return Err(TravisStatusError::SourceControl("travis.slug is empty".into()));
        }

        Ok(slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::PathBuf;

    /// Canned answers keyed by the joined argument list.
    #[derive(Default)]
    struct FakeGit {
        answers: HashMap<String, String>,
        calls: RefCell<Vec<(PathBuf, String)>>,
    }

    impl FakeGit {
        fn answer(mut self, args: &str, value: &str) -> Self {
            self.answers.insert(args.to_string(), value.to_string());
            self
        }
    }

    impl SourceControl for FakeGit {
        fn query(&self, dir: &Path, args: &[&str]) -> Result<String> {
            let key = args.join(" ");
            self.calls.borrow_mut().push((dir.to_path_buf(), key.clone()));
            self.answers
                .get(&key)
                .cloned()
                .ok_or_else(|| TravisStatusError::SourceControl("not a git repository".into()))
        }
    }

    fn working_repo() -> FakeGit {
        FakeGit::default()
            .answer("config --local --get travis.slug", "acme/widget")
            .answer("symbolic-ref HEAD", "refs/heads/main")
    }

    #[test]
    fn test_resolves_slug_and_branch_in_file_directory() {
        let resolver = RepoResolver::new(working_repo());
        let info = resolver.resolve(Some(Path::new("/work/widget/src/lib.rs")), None);

        assert_eq!(info, RepoInfo::resolved("acme/widget".into(), "main".into()));
        let calls = resolver.source_control.calls.borrow();
        assert!(calls
            .iter()
            .all(|(dir, _)| dir == Path::new("/work/widget/src")));
    }

    #[test]
    fn test_override_skips_slug_lookup() {
        let git = FakeGit::default().answer("symbolic-ref HEAD", "refs/heads/feature/x");
        let resolver = RepoResolver::new(git);
        let info = resolver.resolve(Some(Path::new("/w/a.rs")), Some("other/repo"));

        assert_eq!(info.repository_id.as_deref(), Some("other/repo"));
        assert_eq!(info.branch.as_deref(), Some("feature/x"));
        assert_eq!(resolver.source_control.calls.borrow().len(), 1);
    }

    #[test]
    fn test_no_file_is_suppressed() {
        let resolver = RepoResolver::new(working_repo());
        let info = resolver.resolve(None, None);

        assert_eq!(info.error.as_deref(), Some(""));
        assert!(resolver.source_control.calls.borrow().is_empty());
    }

    #[test]
    fn test_missing_slug_is_suppressed() {
        let git = FakeGit::default().answer("symbolic-ref HEAD", "refs/heads/main");
        let info = RepoResolver::new(git).resolve(Some(Path::new("/w/a.rs")), None);
        assert_eq!(info, RepoInfo::suppressed());
    }

    #[test]
    fn test_detached_head_is_suppressed() {
        let git = FakeGit::default().answer("config --local --get travis.slug", "acme/widget");
        let info = RepoResolver::new(git).resolve(Some(Path::new("/w/a.rs")), None);
        assert_eq!(info, RepoInfo::suppressed());
    }

    #[test]
    fn test_git_cli_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        let info = RepoResolver::new(GitCli).resolve(Some(&dir.path().join("file.txt")), None);
        assert_eq!(info, RepoInfo::suppressed());
    }

    #[test]
    fn test_git_cli_in_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");

        let err = GitCli.query(&missing, &["symbolic-ref", "HEAD"]).unwrap_err();
        assert!(matches!(err, TravisStatusError::Io(_)));

        let info = RepoResolver::new(GitCli).resolve(Some(&missing.join("file.txt")), None);
        assert_eq!(info, RepoInfo::suppressed());
    }
}
