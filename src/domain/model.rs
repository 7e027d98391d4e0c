use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which ecosystem a package belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverType {
    Cargo,
    Node,
    Go,
}

impl fmt::Display for ResolverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverType::Cargo => write!(f, "cargo"),
            ResolverType::Node => write!(f, "node"),
            ResolverType::Go => write!(f, "go"),
        }
    }
}

/// How a package's version advances.
///
/// `Semantic` packages are bumped from conventional commits; `Fixed`
/// packages keep their manifest version and never enter a release plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionMode {
    Semantic,
    Fixed,
}

impl Default for VersionMode {
    fn default() -> Self {
        VersionMode::Semantic
    }
}

/// A package located in the repository with its current manifest version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub name: String,
    pub version: Version,
    pub path: PathBuf,
    pub private: bool,
}

/// The semver component a set of commits calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BumpLevel {
    None,
    Patch,
    Minor,
    Major,
}

impl fmt::Display for BumpLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BumpLevel::None => write!(f, "none"),
            BumpLevel::Patch => write!(f, "patch"),
            BumpLevel::Minor => write!(f, "minor"),
            BumpLevel::Major => write!(f, "major"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitKind {
    Feat,
    Fix,
    Perf,
    Docs,
    Refactor,
    Test,
    Chore,
    Ci,
    Build,
    Style,
    Revert,
    Other(String),
}

impl CommitKind {
    pub fn parse(s: &str) -> CommitKind {
        match s {
            "feat" => CommitKind::Feat,
            "fix" => CommitKind::Fix,
            "perf" => CommitKind::Perf,
            "docs" => CommitKind::Docs,
            "refactor" => CommitKind::Refactor,
            "test" => CommitKind::Test,
            "chore" => CommitKind::Chore,
            "ci" => CommitKind::Ci,
            "build" => CommitKind::Build,
            "style" => CommitKind::Style,
            "revert" => CommitKind::Revert,
            other => CommitKind::Other(other.to_string()),
        }
    }
}

/// A parsed conventional commit subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalCommit {
    pub hash: String,
    pub kind: CommitKind,
    pub scope: Option<String>,
    pub breaking: bool,
    pub description: String,
}

impl ConventionalCommit {
    pub fn bump_level(&self) -> BumpLevel {
        if self.breaking {
            return BumpLevel::Major;
        }
        match self.kind {
            CommitKind::Feat => BumpLevel::Minor,
            CommitKind::Fix | CommitKind::Perf => BumpLevel::Patch,
            _ => BumpLevel::None,
        }
    }
}

/// One package's pending release.
#[derive(Debug, Clone)]
pub struct PackageRelease {
    pub id: String,
    pub package: ResolvedPackage,
    pub next_version: Version,
    pub level: BumpLevel,
    pub commits: Vec<ConventionalCommit>,
}

/// Everything `bump`/`release` will do, computed up front.
#[derive(Debug, Clone, Default)]
pub struct ReleasePlan {
    pub releases: Vec<PackageRelease>,
}

impl ReleasePlan {
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bump_level_ordering() {
        assert!(BumpLevel::Major > BumpLevel::Minor);
        assert!(BumpLevel::Minor > BumpLevel::Patch);
        assert!(BumpLevel::Patch > BumpLevel::None);
    }

    #[test]
    fn test_breaking_commit_is_major() {
        let commit = ConventionalCommit {
            hash: "abc123".to_string(),
            kind: CommitKind::Fix,
            scope: None,
            breaking: true,
            description: "change wire format".to_string(),
        };
        assert_eq!(commit.bump_level(), BumpLevel::Major);
    }

    #[test]
    fn test_chore_commit_does_not_bump() {
        let commit = ConventionalCommit {
            hash: "abc123".to_string(),
            kind: CommitKind::Chore,
            scope: Some("deps".to_string()),
            breaking: false,
            description: "update dependencies".to_string(),
        };
        assert_eq!(commit.bump_level(), BumpLevel::None);
    }
}
