use crate::config::{PackageConfig, ResolverConfig};
use crate::core::context::Context;
use crate::domain::model::{ResolvedPackage, ResolverType, VersionMode};
use crate::domain::ports::Resolver;
use crate::utils::command::run_command;
use crate::utils::error::{Result, SemifoldError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The subset of package.json semifold reads.
#[derive(Debug, Deserialize)]
struct PackageJson {
    name: String,
    version: Option<String>,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    workspaces: Vec<String>,
    #[serde(default)]
    dependencies: HashMap<String, String>,
    #[serde(rename = "devDependencies", default)]
    dev_dependencies: HashMap<String, String>,
}

pub struct NodeResolver;

impl NodeResolver {
    fn read_manifest(path: &Path) -> Result<PackageJson> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| SemifoldError::ParseError {
            path: path.to_path_buf(),
            reason: format!("invalid package.json: {}", e),
        })
    }

    fn expand_workspaces(root: &Path, workspaces: &[String]) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for entry in workspaces {
            if let Some(parent) = entry.strip_suffix("/*") {
                let parent_dir = root.join(parent);
                let Ok(entries) = std::fs::read_dir(&parent_dir) else {
                    tracing::warn!("Workspace glob {} matches nothing", entry);
                    continue;
                };
                let mut found: Vec<PathBuf> = entries
                    .flatten()
                    .filter(|e| e.path().join("package.json").exists())
                    .map(|e| PathBuf::from(parent).join(e.file_name()))
                    .collect();
                found.sort();
                paths.extend(found);
            } else {
                paths.push(PathBuf::from(entry));
            }
        }
        paths
    }

    fn depends_on(manifest: &PackageJson, dep_name: &str) -> bool {
        manifest.dependencies.contains_key(dep_name)
            || manifest.dev_dependencies.contains_key(dep_name)
    }
}

impl Resolver for NodeResolver {
    fn resolve(&mut self, root: &Path, pkg_config: &PackageConfig) -> Result<ResolvedPackage> {
        let manifest_path = root.join(&pkg_config.path).join("package.json");
        if !manifest_path.exists() {
            return Err(SemifoldError::FileOrDirNotFound {
                path: manifest_path,
            });
        }

        let manifest = Self::read_manifest(&manifest_path)?;
        let version_str = manifest.version.ok_or_else(|| SemifoldError::ParseError {
            path: manifest_path.clone(),
            reason: "version field missing".to_string(),
        })?;
        let version = semver::Version::parse(&version_str)?;

        Ok(ResolvedPackage {
            name: manifest.name,
            version,
            path: pkg_config.path.clone(),
            private: manifest.private,
        })
    }

    fn resolve_all(&mut self, root: &Path) -> Result<Vec<ResolvedPackage>> {
        let manifest_path = root.join("package.json");
        if !manifest_path.exists() {
            tracing::warn!(
                "Cannot resolve packages in {}, package.json not found",
                root.display()
            );
            return Ok(vec![]);
        }

        let manifest = Self::read_manifest(&manifest_path)?;
        let discover = |path: PathBuf| PackageConfig {
            path,
            resolver: ResolverType::Node,
            version_mode: VersionMode::Semantic,
            assets: vec![],
        };

        if !manifest.workspaces.is_empty() {
            let mut packages = Vec::new();
            for member in Self::expand_workspaces(root, &manifest.workspaces) {
                if !root.join(&member).join("package.json").exists() {
                    tracing::warn!(
                        "Skipping workspace {} without package.json",
                        member.display()
                    );
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

        let manifest_path = root.join(&package.path).join("package.json");
        let content = std::fs::read_to_string(&manifest_path)?;

        // Rewrite through serde_json to preserve key order.
        let mut value: serde_json::Value = serde_json::from_str(&content)?;
        let Some(object) = value.as_object_mut() else {
            return Err(SemifoldError::ParseError {
                path: manifest_path,
                reason: "package.json is not an object".to_string(),
            });
        };
        object.insert(
            "version".to_string(),
            serde_json::Value::String(version.to_string()),
        );

        let mut serialized = serde_json::to_string_pretty(&value)?;
        serialized.push('\n');
        std::fs::write(&manifest_path, serialized)?;
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
            .filter(|(_, cfg)| cfg.resolver == ResolverType::Node)
            .try_fold(HashMap::new(), |mut acc, (id, cfg)| {
                let manifest_path = root.join(&cfg.path).join("package.json");
                let manifest = Self::read_manifest(&manifest_path)?;
                acc.insert(id.clone(), manifest);
                Ok::<_, SemifoldError>(acc)
            })?;

        let name_to_id: HashMap<String, String> = parsed
            .iter()
            .map(|(id, manifest)| (manifest.name.clone(), id.clone()))
            .collect();

        packages.sort_by(|(a, a_cfg), (b, b_cfg)| {
            if a_cfg.resolver != ResolverType::Node || b_cfg.resolver != ResolverType::Node {
                return std::cmp::Ordering::Equal;
            }
            let (Some(a_manifest), Some(b_manifest)) = (parsed.get(a), parsed.get(b)) else {
                return std::cmp::Ordering::Equal;
            };

            let a_depends_on_b = name_to_id
                .iter()
                .any(|(name, id)| id == b && Self::depends_on(a_manifest, name));
            let b_depends_on_a = name_to_id
                .iter()
                .any(|(name, id)| id == a && Self::depends_on(b_manifest, name));

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
            tracing::info!("Skipping private package {}", package.name);
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
