use crate::adapters::resolver_for;
use crate::config::{PackageConfig, RootConfig};
use crate::core::context::Context;
use crate::core::{changelog, commits, git};
use crate::domain::model::{
    BumpLevel, PackageRelease, ReleasePlan, ResolvedPackage, ResolverType, VersionMode,
};
use crate::utils::error::{Result, SemifoldError};

/// Drives the release flow: resolve, plan, bump, changelog, tag, publish.
pub struct ReleaseEngine {
    config: RootConfig,
    ctx: Context,
}

impl ReleaseEngine {
    pub fn new(config: RootConfig, ctx: Context) -> Self {
        Self { config, ctx }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Configured packages in publish order: deterministic id order first,
    /// then each resolver type reorders its own packages so dependencies
    /// come before dependents.
    fn sorted_package_configs(&self) -> Result<Vec<(String, PackageConfig)>> {
        let mut packages = self.config.packages_sorted();
        for resolver_type in [ResolverType::Cargo, ResolverType::Node, ResolverType::Go] {
            if packages.iter().any(|(_, cfg)| cfg.resolver == resolver_type) {
                resolver_for(resolver_type).sort_packages(&self.ctx.root, &mut packages)?;
            }
        }
        Ok(packages)
    }

    /// Resolve every configured package to its current manifest version.
    pub fn resolve_packages(&self) -> Result<Vec<(String, PackageConfig, ResolvedPackage)>> {
        let mut resolved = Vec::new();
        for (id, cfg) in self.sorted_package_configs()? {
            let package = resolver_for(cfg.resolver).resolve(&self.ctx.root, &cfg)?;
            tracing::debug!(
                "Resolved {} as {} {} ({})",
                id,
                package.name,
                package.version,
                cfg.resolver
            );
            resolved.push((id, cfg, package));
        }
        Ok(resolved)
    }

    /// Compute the pending release plan from conventional commits since
    /// each package's last release tag.
    pub fn plan(&self) -> Result<ReleasePlan> {
        if !git::is_repository(&self.ctx.root) {
            return Err(SemifoldError::GitError {
                message: format!("{} is not a git repository", self.ctx.root.display()),
            });
        }

        let mut releases = Vec::new();
        for (id, cfg, package) in self.resolve_packages()? {
            if cfg.version_mode == VersionMode::Fixed {
                tracing::debug!("Skipping fixed-version package {}", id);
                continue;
            }

            let prefix = self.config.tag_prefix(&package.name);
            let tag = git::latest_tag(&self.ctx.root, &prefix)?;
            let raw_commits =
                git::commits_since(&self.ctx.root, tag.as_deref(), &package.path)?;

            let parsed: Vec<_> = raw_commits
                .iter()
                .map(|raw| {
                    let mut commit = commits::parse_commit(&raw.hash, &raw.subject);
                    if commits::body_marks_breaking(&raw.body) {
                        commit.breaking = true;
                    }
                    commit
                })
                .collect();

            let level = commits::required_bump(&parsed);
            if level == BumpLevel::None {
                tracing::debug!("No release-worthy commits for {}", id);
                continue;
            }

            let next_version = commits::next_version(&package.version, level);
            tracing::info!(
                "{}: {} -> {} ({} bump, {} commits)",
                package.name,
                package.version,
                next_version,
                level,
                parsed.len()
            );

            releases.push(PackageRelease {
                id,
                package,
                next_version,
                level,
                commits: parsed,
            });
        }

        Ok(ReleasePlan { releases })
    }

    /// Write planned versions into manifests and update changelogs.
    pub fn apply(&self, plan: &ReleasePlan) -> Result<()> {
        for release in &plan.releases {
            let cfg = self.package_config(&release.id)?;
            resolver_for(cfg.resolver).bump(
                &self.ctx,
                &self.ctx.root,
                &release.package,
                &release.next_version,
            )?;

            if self.config.changelog.enabled {
                changelog::write_changelog(&self.ctx, &self.config, release)?;
            }
        }
        Ok(())
    }

    /// Regenerate changelogs only, without touching manifests.
    pub fn write_changelogs(&self, plan: &ReleasePlan) -> Result<()> {
        for release in &plan.releases {
            changelog::write_changelog(&self.ctx, &self.config, release)?;
        }
        Ok(())
    }

    fn commit_releases(&self, plan: &ReleasePlan) -> Result<()> {
        let paths: Vec<&std::path::Path> = plan
            .releases
            .iter()
            .map(|r| r.package.path.as_path())
            .collect();
        git::commit_paths(&self.ctx, &paths, &self.config.git.commit_message)
    }

    fn tag_releases(&self, plan: &ReleasePlan) -> Result<()> {
        for release in &plan.releases {
            let tag = self
                .config
                .tag_name(&release.package.name, &release.next_version);
            let message = format!("{} {}", release.package.name, release.next_version);
            git::create_tag(&self.ctx, &tag, &message)?;
        }
        Ok(())
    }

    /// Run prepublish/publish commands for every configured package, in
    /// dependency order.
    pub fn publish_all(&self) -> Result<()> {
        for (id, cfg, package) in self.resolve_packages()? {
            tracing::info!("Publishing {} ({})", id, cfg.resolver);
            let resolver_config = self.config.resolver_config(cfg.resolver);
            // commands run inside the package directory under the repo root
            let mut located = package.clone();
            located.path = self.ctx.root.join(&package.path);
            resolver_for(cfg.resolver)
                .publish(&located, &resolver_config, self.ctx.dry_run)
                .map_err(|e| as_publish_error(&package.name, e))?;
        }
        Ok(())
    }

    fn publish_planned(&self, plan: &ReleasePlan) -> Result<()> {
        for release in &plan.releases {
            let cfg = self.package_config(&release.id)?;
            let resolver_config = self.config.resolver_config(cfg.resolver);
            tracing::info!("Publishing {} {}", release.package.name, release.next_version);
            let mut located = release.package.clone();
            located.path = self.ctx.root.join(&release.package.path);
            resolver_for(cfg.resolver)
                .publish(&located, &resolver_config, self.ctx.dry_run)
                .map_err(|e| as_publish_error(&release.package.name, e))?;
        }
        Ok(())
    }

    /// The full flow: plan, bump, changelog, release commit, tags, publish.
    pub fn release(&self, no_tag: bool, no_publish: bool) -> Result<ReleasePlan> {
        if !self.config.git.allow_dirty && !git::is_clean(&self.ctx.root)? {
            return Err(SemifoldError::GitError {
                message: "working tree has uncommitted changes (set git.allow_dirty to override)"
                    .to_string(),
            });
        }

        let plan = self.plan()?;
        if plan.is_empty() {
            tracing::info!("Nothing to release");
            return Ok(plan);
        }

        self.apply(&plan)?;

        if self.config.git.commit {
            self.commit_releases(&plan)?;
        }

        if no_tag {
            tracing::info!("Skipping tags (--no-tag)");
        } else {
            self.tag_releases(&plan)?;
        }

        if no_publish {
            tracing::info!("Skipping publish (--no-publish)");
        } else {
            self.publish_planned(&plan)?;
        }

        Ok(plan)
    }

    fn package_config(&self, id: &str) -> Result<PackageConfig> {
        self.config
            .packages
            .get(id)
            .cloned()
            .ok_or_else(|| SemifoldError::MissingConfigError {
                field: format!("packages.{}", id),
            })
    }
}

/// Publish failures carry the package name regardless of which command
/// stage produced them.
fn as_publish_error(package: &str, e: SemifoldError) -> SemifoldError {
    match e {
        SemifoldError::CommandError { command, reason } => SemifoldError::PublishError {
            package: package.to_string(),
            reason: format!("'{}' failed: {}", command, reason),
        },
        other => other,
    }
}
