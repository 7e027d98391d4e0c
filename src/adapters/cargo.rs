use crate::config::{PackageConfig, ResolverConfig};
use crate::core::context::Context;
use crate::domain::model::{ResolvedPackage, ResolverType, VersionMode};
use crate::domain::ports::Resolver;
use crate::utils::command::run_command;
use crate::utils::error::{Result, SemifoldError};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The subset of Cargo.toml semifold reads.
#[derive(Debug, Deserialize)]
struct CargoManifest {
    package: Option<CargoPackage>,
    workspace: Option<CargoWorkspace>,
    #[serde(default)]
    dependencies: HashMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
struct CargoPackage {
    name: String,
    version: Option<toml::Value>,
    publish: Option<toml::Value>,
}

#[derive(Debug, Deserialize)]
struct CargoWorkspace {
    #[serde(default)]
    members: Vec<String>,
}

pub struct CargoResolver;

impl CargoResolver {
    fn read_manifest(path: &Path) -> Result<CargoManifest> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SemifoldError::ParseError {
            path: path.to_path_buf(),
            reason: format!("invalid Cargo.toml: {}", e),
        })
    }

    /// `publish = false` marks the crate private. A registry list counts
    /// as publishable.
    fn is_private(package: &CargoPackage) -> bool {
        matches!(package.publish, Some(toml::Value::Boolean(false)))
    }

    fn package_version(package: &CargoPackage, path: &Path) -> Result<semver::Version> {
        let version_str = match &package.version {
            Some(toml::Value::String(s)) => s.clone(),
            // `version.workspace = true` is out of scope for per-package
            // version management; surface it instead of guessing.
            Some(other) => {
                return Err(SemifoldError::ParseError {
                    path: path.to_path_buf(),
                    reason: format!("unsupported version value: {}", other),
                })
            }
            None => {
                return Err(SemifoldError::ParseError {
                    path: path.to_path_buf(),
                    reason: "package.version missing".to_string(),
                })
            }
        };
        Ok(semver::Version::parse(&version_str)?)
    }

    /// Expand workspace member entries; trailing `/*` globs expand to the
    /// directory's subdirectories containing a Cargo.toml.
    fn expand_members(root: &Path, members: &[String]) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for member in members {
            if let Some(parent) = member.strip_suffix("/*") {
                let parent_dir = root.join(parent);
                let Ok(entries) = std::fs::read_dir(&parent_dir) else {
                    tracing::warn!("Workspace member glob {} matches nothing", member);
                    continue;
                };
                let mut found: Vec<PathBuf> = entries
                    .flatten()
                    .filter(|e| e.path().join("Cargo.toml").exists())
                    .map(|e| PathBuf::from(parent).join(e.file_name()))
                    .collect();
                found.sort();
                paths.extend(found);
            } else {
                paths.push(PathBuf::from(member));
            }
        }
        paths
    }

    /// Dependency ids of a package among the configured packages, matched
    /// by crate name.
    fn internal_deps<'a>(
        manifest: &CargoManifest,
        name_to_id: &'a HashMap<String, String>,
    ) -> Vec<&'a String> {
        manifest
            .dependencies
            .keys()
            .filter_map(|dep| name_to_id.get(dep))
            .collect()
    }
}

impl Resolver for CargoResolver {
    fn resolve(&mut self, root: &Path, pkg_config: &PackageConfig) -> Result<ResolvedPackage> {
        let manifest_path = root.join(&pkg_config.path).join("Cargo.toml");
        if !manifest_path.exists() {
            return Err(SemifoldError::FileOrDirNotFound {
                path: manifest_path,
            });
        }

        let manifest = Self::read_manifest(&manifest_path)?;
        let package = manifest.package.ok_or_else(|| SemifoldError::ParseError {
            path: manifest_path.clone(),
            reason: "no [package] section".to_string(),
        })?;

        let version = Self::package_version(&package, &manifest_path)?;
        let private = Self::is_private(&package);

        Ok(ResolvedPackage {
            name: package.name,
            version,
            path: pkg_config.path.clone(),
            private,
        })
    }

    fn resolve_all(&mut self, root: &Path) -> Result<Vec<ResolvedPackage>> {
        let manifest_path = root.join("Cargo.toml");
        if !manifest_path.exists() {
            tracing::warn!(
                "Cannot resolve packages in {}, Cargo.toml not found",
                root.display()
            );
            return Ok(vec![]);
        }

        let manifest = Self::read_manifest(&manifest_path)?;
        let discover = |path: PathBuf| PackageConfig {
            path,
            resolver: ResolverType::Cargo,
            version_mode: VersionMode::Semantic,
            assets: vec![],
        };

        if let Some(workspace) = &manifest.workspace {
            let mut packages = Vec::new();
            for member in Self::expand_members(root, &workspace.members) {
                if !root.join(&member).join("Cargo.toml").exists() {
                    tracing::warn!("Skipping workspace member {} without Cargo.toml", member.display());
                    continue;
                }
                packages.push(self.resolve(root, &discover(member))?);
            }
            return Ok(packages);
        }

        Ok(vec![self.resolve(root, &discover(".".into()))?])
    }

    fn bump(
        &mut self,
        ctx: &Context,
        root: &Path,
        package: &ResolvedPackage,
        version: &semver::Version,
    ) -> Result<()> {
        if ctx.dry_run {
            tracing::warn!(
                "Skip bump for {} to version {} due to dry run",
                package.name,
                version
            );
            return Ok(());
        }

        let manifest_path = root.join(&package.path).join("Cargo.toml");
        let content = std::fs::read_to_string(&manifest_path)?;

        // Rewrite only the version key of the [package] table, leaving
        // dependency tables and keys like rust-version untouched.
        let version_re =
            Regex::new(r#"(?m)(^\[package\][^\[]*?^version\s*=\s*")[^"]+(")"#).unwrap();
        if !version_re.is_match(&content) {
            return Err(SemifoldError::ParseError {
                path: manifest_path,
                reason: "could not locate package.version for rewrite".to_string(),
            });
        }

        let updated = version_re.replace(&content, |caps: &regex::Captures| {
            format!("{}{}{}", &caps[1], version, &caps[2])
        });

        std::fs::write(&manifest_path, updated.as_ref())?;
        tracing::info!("Updated {} to version {}", manifest_path.display(), version);
        Ok(())
    }

    fn sort_packages(
        &mut self,
        root: &Path,
        packages: &mut Vec<(String, PackageConfig)>,
    ) -> Result<()> {
        let parsed = packages
            .iter()
            .filter(|(_, cfg)| cfg.resolver == ResolverType::Cargo)
            .try_fold(HashMap::new(), |mut acc, (id, cfg)| {
                let manifest_path = root.join(&cfg.path).join("Cargo.toml");
                let manifest = Self::read_manifest(&manifest_path)?;
                acc.insert(id.clone(), manifest);
                Ok::<_, SemifoldError>(acc)
            })?;

        let name_to_id: HashMap<String, String> = parsed
            .iter()
            .filter_map(|(id, manifest)| {
                manifest
                    .package
                    .as_ref()
                    .map(|p| (p.name.clone(), id.clone()))
            })
            .collect();

        packages.sort_by(|(a, a_cfg), (b, b_cfg)| {
            if a_cfg.resolver != ResolverType::Cargo || b_cfg.resolver != ResolverType::Cargo {
                return std::cmp::Ordering::Equal;
            }
            let (Some(a_manifest), Some(b_manifest)) = (parsed.get(a), parsed.get(b)) else {
                return std::cmp::Ordering::Equal;
            };

            let a_depends_on_b = Self::internal_deps(a_manifest, &name_to_id)
                .iter()
                .any(|id| *id == b);
            let b_depends_on_a = Self::internal_deps(b_manifest, &name_to_id)
                .iter()
                .any(|id| *id == a);

            if a_depends_on_b {
                std::cmp::Ordering::Greater
            } else if b_depends_on_a {
                std::cmp::Ordering::Less
            } else {
                std::cmp::Ordering::Equal
            }
        });

        Ok(())
    }

    fn publish(
        &mut self,
        package: &ResolvedPackage,
        resolver_config: &ResolverConfig,
        dry_run: bool,
    ) -> Result<()> {
        if package.private {
            tracing::info!("Skipping private crate {}", package.name);
            return Ok(());
        }

        for stage in [&resolver_config.prepublish, &resolver_config.publish] {
            for cmd in stage {
                let args = cmd.args.clone().unwrap_or_default();
                if dry_run && !cmd.dry_run.unwrap_or(false) {
                    tracing::warn!(
                        "Skip command {} {} due to dry run",
                        cmd.command,
                        args.join(" ")
                    );
                    continue;
                }
                tracing::info!("Running {} {}", cmd.command, args.join(" "));
                run_command(cmd, &package.path)?;
            }
        }
        Ok(())
    }
}
