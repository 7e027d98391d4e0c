use crate::domain::model::{BumpLevel, CommitKind, ConventionalCommit};
use regex::Regex;
use semver::Version;

/// Parse a commit subject in conventional form: `type(scope)!: description`.
///
/// Subjects that do not match the convention are kept as `Other` with the
/// whole subject as description, so they still show up in changelogs when a
/// release happens for other reasons.
pub fn parse_commit(hash: &str, subject: &str) -> ConventionalCommit {
    let re = Regex::new(r"^([a-zA-Z]+)(?:\(([^)]*)\))?(!)?:\s+(.+)$").unwrap();

    if let Some(caps) = re.captures(subject.trim()) {
        let kind = CommitKind::parse(&caps[1].to_lowercase());
        let scope = caps.get(2).map(|m| m.as_str().to_string()).filter(|s| !s.is_empty());
        let breaking = caps.get(3).is_some();
        let description = caps[4].trim().to_string();

        return ConventionalCommit {
            hash: hash.to_string(),
            kind,
            scope,
            breaking,
            description,
        };
    }

    ConventionalCommit {
        hash: hash.to_string(),
        kind: CommitKind::Other("unknown".to_string()),
        scope: None,
        breaking: false,
        description: subject.trim().to_string(),
    }
}

/// A commit body marks a breaking change through the standard footer.
pub fn body_marks_breaking(body: &str) -> bool {
    body.lines()
        .any(|line| line.starts_with("BREAKING CHANGE:") || line.starts_with("BREAKING-CHANGE:"))
}

/// The strongest bump any of the commits calls for.
pub fn required_bump(commits: &[ConventionalCommit]) -> BumpLevel {
    commits
        .iter()
        .map(ConventionalCommit::bump_level)
        .max()
        .unwrap_or(BumpLevel::None)
}

/// Advance `current` by `level`. Plain semver component arithmetic; no
/// special casing for 0.x versions.
pub fn next_version(current: &Version, level: BumpLevel) -> Version {
    match level {
        BumpLevel::Major => Version::new(current.major + 1, 0, 0),
        BumpLevel::Minor => Version::new(current.major, current.minor + 1, 0),
        BumpLevel::Patch => Version::new(current.major, current.minor, current.patch + 1),
        BumpLevel::None => current.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feat_with_scope() {
        let commit = parse_commit("abc123", "feat(resolver): support go workspaces");
        assert_eq!(commit.kind, CommitKind::Feat);
        assert_eq!(commit.scope.as_deref(), Some("resolver"));
        assert!(!commit.breaking);
        assert_eq!(commit.description, "support go workspaces");
        assert_eq!(commit.bump_level(), BumpLevel::Minor);
    }

    #[test]
    fn test_parse_breaking_marker() {
        let commit = parse_commit("abc123", "fix!: drop legacy manifest field");
        assert!(commit.breaking);
        assert_eq!(commit.bump_level(), BumpLevel::Major);
    }

    #[test]
    fn test_parse_breaking_with_scope() {
        let commit = parse_commit("abc123", "feat(api)!: rename endpoints");
        assert_eq!(commit.scope.as_deref(), Some("api"));
        assert!(commit.breaking);
    }

    #[test]
    fn test_parse_plain_fix() {
        let commit = parse_commit("abc123", "fix: handle empty go.mod");
        assert_eq!(commit.kind, CommitKind::Fix);
        assert_eq!(commit.bump_level(), BumpLevel::Patch);
    }

    #[test]
    fn test_non_conventional_subject() {
        let commit = parse_commit("abc123", "Merge branch 'main' into dev");
        assert!(matches!(commit.kind, CommitKind::Other(_)));
        assert_eq!(commit.bump_level(), BumpLevel::None);
        assert_eq!(commit.description, "Merge branch 'main' into dev");
    }

    #[test]
    fn test_uppercase_type_is_normalized() {
        let commit = parse_commit("abc123", "Fix: normalize case");
        assert_eq!(commit.kind, CommitKind::Fix);
    }

    #[test]
    fn test_body_breaking_footer() {
        assert!(body_marks_breaking("some body\n\nBREAKING CHANGE: api removed"));
        assert!(body_marks_breaking("BREAKING-CHANGE: api removed"));
        assert!(!body_marks_breaking("mentions breaking change casually"));
    }

    #[test]
    fn test_required_bump_takes_strongest() {
        let commits = vec![
            parse_commit("a", "chore: tidy"),
            parse_commit("b", "fix: one"),
            parse_commit("c", "feat: two"),
        ];
        assert_eq!(required_bump(&commits), BumpLevel::Minor);
    }

    #[test]
    fn test_required_bump_empty() {
        assert_eq!(required_bump(&[]), BumpLevel::None);
    }

    #[test]
    fn test_next_version() {
        let v = Version::new(1, 4, 2);
        assert_eq!(next_version(&v, BumpLevel::Major), Version::new(2, 0, 0));
        assert_eq!(next_version(&v, BumpLevel::Minor), Version::new(1, 5, 0));
        assert_eq!(next_version(&v, BumpLevel::Patch), Version::new(1, 4, 3));
        assert_eq!(next_version(&v, BumpLevel::None), v);
    }

    #[test]
    fn test_next_version_zero_major_is_plain() {
        let v = Version::new(0, 3, 1);
        assert_eq!(next_version(&v, BumpLevel::Major), Version::new(1, 0, 0));
    }
}
