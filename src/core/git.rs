use crate::core::context::Context;
use crate::utils::error::{Result, SemifoldError};
use std::path::Path;
use std::process::Command;

/// One commit from `git log`: hash, subject, body.
#[derive(Debug, Clone)]
pub struct RawCommit {
    pub hash: String,
    pub subject: String,
    pub body: String,
}

fn git_output(root: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .map_err(|e| SemifoldError::GitError {
            message: format!("failed to run git {}: {}", args.join(" "), e),
        })?;

    if !output.status.success() {
        return Err(SemifoldError::GitError {
            message: format!(
                "git {} failed: {}",
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

pub fn is_repository(root: &Path) -> bool {
    Command::new("git")
        .args(["rev-parse", "--git-dir"])
        .current_dir(root)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub fn is_clean(root: &Path) -> Result<bool> {
    let output = git_output(root, &["status", "--porcelain"])?;
    Ok(output.trim().is_empty())
}

/// Newest tag starting with `prefix` whose remainder parses as a version.
/// Tags come back version-sorted descending, so the first match wins.
pub fn latest_tag(root: &Path, prefix: &str) -> Result<Option<String>> {
    let output = match git_output(root, &["tag", "--list", "--sort=-v:refname"]) {
        Ok(o) => o,
        Err(_) => return Ok(None),
    };

    for tag in output.lines() {
        let tag = tag.trim();
        if let Some(rest) = tag.strip_prefix(prefix) {
            if semver::Version::parse(rest).is_ok() {
                return Ok(Some(tag.to_string()));
            }
        }
    }

    Ok(None)
}

/// Commits touching `path` since `tag` (or the whole history when no tag
/// exists yet), oldest first.
pub fn commits_since(root: &Path, tag: Option<&str>, path: &Path) -> Result<Vec<RawCommit>> {
    // %x1e separates commits, %x1f separates fields within one commit.
    let format = "--format=%H%x1f%s%x1f%b%x1e";
    let range;

    let mut args = vec!["log", "--reverse", format];
    if let Some(tag) = tag {
        range = format!("{}..HEAD", tag);
        args.push(&range);
    }
    args.push("--");
    let path_str = path.to_string_lossy();
    args.push(&path_str);

    let output = git_output(root, &args)?;

    let commits = output
        .split('\u{1e}')
        .filter_map(|chunk| {
            let chunk = chunk.trim();
            if chunk.is_empty() {
                return None;
            }
            let mut fields = chunk.split('\u{1f}');
            let hash = fields.next()?.trim().to_string();
            let subject = fields.next().unwrap_or("").trim().to_string();
            let body = fields.next().unwrap_or("").trim().to_string();
            Some(RawCommit {
                hash,
                subject,
                body,
            })
        })
        .collect();

    Ok(commits)
}

pub fn create_tag(ctx: &Context, name: &str, message: &str) -> Result<()> {
    if ctx.dry_run {
        tracing::warn!("Skip tag {} due to dry run", name);
        return Ok(());
    }

    git_output(&ctx.root, &["tag", "-a", name, "-m", message])?;
    tracing::info!("Created tag {}", name);
    Ok(())
}

/// Stage the given paths and commit them with `message`.
pub fn commit_paths(ctx: &Context, paths: &[&Path], message: &str) -> Result<()> {
    if ctx.dry_run {
        tracing::warn!("Skip release commit due to dry run");
        return Ok(());
    }

    let mut args = vec!["add", "--"];
    let path_strs: Vec<String> = paths
        .iter()
        .map(|p| p.to_string_lossy().to_string())
        .collect();
    args.extend(path_strs.iter().map(String::as_str));
    git_output(&ctx.root, &args)?;

    git_output(&ctx.root, &["commit", "-m", message])?;
    tracing::info!("Created release commit");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::TempDir;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn run(dir: &Path, args: &[&str]) {
        let status = Command::new(args[0])
            .args(&args[1..])
            .current_dir(dir)
            .output()
            .unwrap();
        assert!(status.status.success(), "command failed: {:?}", args);
    }

    fn init_repo(dir: &Path) {
        run(dir, &["git", "init", "-q"]);
        run(dir, &["git", "config", "user.email", "test@example.com"]);
        run(dir, &["git", "config", "user.name", "Test"]);
        run(dir, &["git", "config", "commit.gpgsign", "false"]);
    }

    fn commit_file(dir: &Path, file: &str, content: &str, message: &str) {
        let path = dir.join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        run(dir, &["git", "add", "."]);
        run(dir, &["git", "commit", "-q", "-m", message]);
    }

    #[test]
    fn test_is_repository_and_clean() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        assert!(!is_repository(dir.path()));

        init_repo(dir.path());
        assert!(is_repository(dir.path()));
        assert!(is_clean(dir.path()).unwrap());

        std::fs::write(dir.path().join("untracked.txt"), "x").unwrap();
        assert!(!is_clean(dir.path()).unwrap());
    }

    #[test]
    fn test_latest_tag_prefers_newest_version() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "a.txt", "1", "chore: init");

        run(dir.path(), &["git", "tag", "core-v0.1.0"]);
        run(dir.path(), &["git", "tag", "core-v0.2.0"]);
        run(dir.path(), &["git", "tag", "other-v9.9.9"]);
        run(dir.path(), &["git", "tag", "core-vnot-a-version"]);

        let tag = latest_tag(dir.path(), "core-v").unwrap();
        assert_eq!(tag.as_deref(), Some("core-v0.2.0"));

        assert!(latest_tag(dir.path(), "missing-v").unwrap().is_none());
    }

    #[test]
    fn test_commits_since_filters_by_path() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "pkg-a/file.txt", "1", "feat: a change");
        run(dir.path(), &["git", "tag", "a-v0.1.0"]);
        commit_file(dir.path(), "pkg-a/file.txt", "2", "fix: a fix");
        commit_file(dir.path(), "pkg-b/file.txt", "1", "feat: b change");

        let commits =
            commits_since(dir.path(), Some("a-v0.1.0"), Path::new("pkg-a")).unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].subject, "fix: a fix");

        let all = commits_since(dir.path(), None, Path::new("pkg-a")).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].subject, "feat: a change");
    }

    #[test]
    fn test_create_tag_dry_run_is_noop() {
        if !git_available() {
            return;
        }
        let dir = TempDir::new().unwrap();
        init_repo(dir.path());
        commit_file(dir.path(), "a.txt", "1", "chore: init");

        let ctx = Context::new(dir.path().to_path_buf(), true);
        create_tag(&ctx, "core-v1.0.0", "release").unwrap();
        assert!(latest_tag(dir.path(), "core-v").unwrap().is_none());

        let ctx = Context::new(dir.path().to_path_buf(), false);
        create_tag(&ctx, "core-v1.0.0", "release").unwrap();
        assert_eq!(
            latest_tag(dir.path(), "core-v").unwrap().as_deref(),
            Some("core-v1.0.0")
        );
    }
}
