use crate::config::RootConfig;
use crate::core::context::Context;
use crate::domain::model::{CommitKind, ConventionalCommit, PackageRelease};
use crate::utils::error::Result;
use chrono::Local;
use std::path::PathBuf;

const CHANGELOG_HEADER: &str = "# Changelog\n";

/// Render the markdown section for one release.
pub fn render_section(config: &RootConfig, release: &PackageRelease) -> String {
    let date = Local::now().format("%Y-%m-%d");
    let mut out = String::new();

    let heading = match compare_link(config, release) {
        Some(link) => format!("## [{}]({}) - {}\n\n", release.next_version, link, date),
        None => format!("## {} - {}\n\n", release.next_version, date),
    };
    out.push_str(&heading);

    let breaking: Vec<&ConventionalCommit> =
        release.commits.iter().filter(|c| c.breaking).collect();
    if !breaking.is_empty() {
        out.push_str("### Breaking Changes\n\n");
        for commit in breaking {
            out.push_str(&entry_line(commit));
        }
        out.push('\n');
    }

    push_group(&mut out, "### Features\n\n", &release.commits, |c| {
        !c.breaking && c.kind == CommitKind::Feat
    });
    push_group(&mut out, "### Bug Fixes\n\n", &release.commits, |c| {
        !c.breaking && c.kind == CommitKind::Fix
    });
    push_group(&mut out, "### Performance\n\n", &release.commits, |c| {
        !c.breaking && c.kind == CommitKind::Perf
    });
    push_group(&mut out, "### Other\n\n", &release.commits, |c| {
        !c.breaking
            && !matches!(c.kind, CommitKind::Feat | CommitKind::Fix | CommitKind::Perf)
    });

    out
}

fn push_group<F>(out: &mut String, heading: &str, commits: &[ConventionalCommit], filter: F)
where
    F: Fn(&ConventionalCommit) -> bool,
{
    let selected: Vec<&ConventionalCommit> = commits.iter().filter(|c| filter(c)).collect();
    if selected.is_empty() {
        return;
    }
    out.push_str(heading);
    for commit in selected {
        out.push_str(&entry_line(commit));
    }
    out.push('\n');
}

fn entry_line(commit: &ConventionalCommit) -> String {
    let short_hash: String = commit.hash.chars().take(7).collect();
    match &commit.scope {
        Some(scope) => format!("- **{}**: {} ({})\n", scope, commit.description, short_hash),
        None => format!("- {} ({})\n", commit.description, short_hash),
    }
}

/// Compare link between the previous and next release tags, when the
/// project has a repository URL configured.
fn compare_link(config: &RootConfig, release: &PackageRelease) -> Option<String> {
    let repository = config.project.repository.as_ref()?;
    let repository = repository.trim_end_matches('/');
    let prev_tag = config.tag_name(&release.package.name, &release.package.version);
    let next_tag = config.tag_name(&release.package.name, &release.next_version);
    Some(format!("{}/compare/{}...{}", repository, prev_tag, next_tag))
}

/// Path of the changelog file for a release's package.
pub fn changelog_path(ctx: &Context, config: &RootConfig, release: &PackageRelease) -> PathBuf {
    ctx.root
        .join(&release.package.path)
        .join(&config.changelog.file)
}

/// Prepend the rendered section to the package's changelog, keeping an
/// existing `# Changelog` header at the top.
pub fn write_changelog(ctx: &Context, config: &RootConfig, release: &PackageRelease) -> Result<()> {
    let path = changelog_path(ctx, config, release);
    let section = render_section(config, release);

    if ctx.dry_run {
        tracing::warn!(
            "Skip changelog update for {} due to dry run",
            release.package.name
        );
        tracing::debug!("Would prepend to {}:\n{}", path.display(), section);
        return Ok(());
    }

    let existing = if path.exists() {
        std::fs::read_to_string(&path)?
    } else {
        String::new()
    };

    let content = if let Some(rest) = existing.strip_prefix(CHANGELOG_HEADER) {
        format!("{}\n{}{}", CHANGELOG_HEADER, section, rest.trim_start_matches('\n'))
    } else if existing.is_empty() {
        format!("{}\n{}", CHANGELOG_HEADER, section)
    } else {
        format!("{}{}", section, existing)
    };

    std::fs::write(&path, content)?;
    tracing::info!(
        "Updated {} for {} {}",
        config.changelog.file,
        release.package.name,
        release.next_version
    );
    Ok(())
}
