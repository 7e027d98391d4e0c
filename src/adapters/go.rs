use crate::config::{PackageConfig, ResolverConfig};
use crate::core::context::Context;
use crate::domain::model::{ResolvedPackage, ResolverType, VersionMode};
use crate::domain::ports::Resolver;
use crate::utils::command::run_command;
use crate::utils::error::{Result, SemifoldError};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Parsed go.mod contents, reduced to what version management needs.
#[derive(Debug)]
struct GoMod {
    module: String,
    require: Vec<(String, String)>,
}

pub struct GoResolver;

impl GoResolver {
    fn parse_go_mod(content: &str, path: &Path) -> Result<GoMod> {
        let module_re = Regex::new(r"^module\s+(\S+)").unwrap();
        let require_single_re = Regex::new(r"^require\s+(\S+)\s+(\S+)").unwrap();
        let require_entry_re = Regex::new(r"^(\S+)\s+(\S+)").unwrap();

        let mut module = None;
        let mut require = Vec::new();
        let mut in_require_block = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            match line {
                "require (" => {
                    in_require_block = true;
                    continue;
                }
                ")" if in_require_block => {
                    in_require_block = false;
                    continue;
                }
                _ => {}
            }

            if let Some(caps) = module_re.captures(line) {
                module = Some(caps[1].to_string());
            } else if let Some(caps) = require_single_re.captures(line) {
                require.push((caps[1].to_string(), caps[2].to_string()));
            } else if in_require_block {
                if let Some(caps) = require_entry_re.captures(line) {
                    require.push((caps[1].to_string(), caps[2].to_string()));
                }
            }
        }

        let module = module.ok_or_else(|| SemifoldError::ParseError {
            path: path.to_path_buf(),
            reason: "module directive not found in go.mod".to_string(),
        })?;

        Ok(GoMod { module, require })
    }

    /// Directories listed in a go.work file's use directives.
    fn parse_go_work(content: &str) -> Vec<String> {
        let use_single_re = Regex::new(r"^use\s+(\S+)").unwrap();

        let mut use_dirs = Vec::new();
        let mut in_use_block = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            match line {
                "use (" => {
                    in_use_block = true;
                    continue;
                }
                ")" if in_use_block => {
                    in_use_block = false;
                    continue;
                }
                _ => {}
            }

            if let Some(caps) = use_single_re.captures(line) {
                use_dirs.push(caps[1].to_string());
            } else if in_use_block && !line.starts_with("go ") {
                use_dirs.push(line.to_string());
            }
        }

        use_dirs
    }

    /// Go has no version field in go.mod; look for a version.go constant.
    fn version_from_version_go(package_path: &Path) -> Result<Option<String>> {
        let version_go_path = package_path.join("version.go");
        if !version_go_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&version_go_path)?;
        let version_re = Regex::new(
            r#"(?i)(?:const|var)\s+version\s*=\s*"v?([\d]+\.[\d]+\.[\d]+(?:-[a-zA-Z0-9.-]+)?(?:\+[a-zA-Z0-9.-]+)?)""#,
        )
        .unwrap();

        Ok(version_re
            .captures(&content)
            .map(|caps| caps[1].to_string()))
    }

    /// Fall back to release tags: submodule tags like `<module>/v1.2.3`
    /// first, then bare `v1.2.3` tags for the root module.
    fn version_from_git_tag(root: &Path, module_path: &str) -> Option<String> {
        let output = std::process::Command::new("git")
            .args(["tag", "--list", "--sort=-v:refname"])
            .current_dir(root)
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let version_re =
            Regex::new(r"^v?([\d]+\.[\d]+\.[\d]+(?:-[a-zA-Z0-9.-]+)?(?:\+[a-zA-Z0-9.-]+)?)$")
                .unwrap();
        let tags = String::from_utf8_lossy(&output.stdout);
        let submodule_prefix = format!("{}/", module_path);

        for tag in tags.lines() {
            let tag = tag.trim();
            if let Some(stripped) = tag.strip_prefix(&submodule_prefix) {
                if let Some(caps) = version_re.captures(stripped) {
                    return Some(caps[1].to_string());
                }
            }
            if let Some(caps) = version_re.captures(tag) {
                return Some(caps[1].to_string());
            }
        }

        None
    }

    /// Version priority: version.go, then git tag, then 0.0.0.
    fn get_version(root: &Path, package_path: &Path, module_path: &str) -> Result<String> {
        let full_path = root.join(package_path);

        if let Some(version) = Self::version_from_version_go(&full_path)? {
            tracing::debug!("Found version {} from version.go", version);
            return Ok(version);
        }

        if let Some(version) = Self::version_from_git_tag(root, module_path) {
            tracing::debug!("Found version {} from git tag", version);
            return Ok(version);
        }

        tracing::debug!("Using default version 0.0.0");
        Ok("0.0.0".to_string())
    }

    fn update_version_go(package_path: &Path, new_version: &str) -> Result<()> {
        let version_go_path = package_path.join("version.go");

        if !version_go_path.exists() {
            let content = format!(
                "package main\n\n// Version is the current version of the module.\nconst Version = \"{}\"\n",
                new_version
            );
            std::fs::write(&version_go_path, content)?;
            tracing::info!(
                "Created {} with version {}",
                version_go_path.display(),
                new_version
            );
            return Ok(());
        }

        let content = std::fs::read_to_string(&version_go_path)?;
        let version_re = Regex::new(
            r#"(?i)((?:const|var)\s+version\s*=\s*")v?[\d]+\.[\d]+\.[\d]+(?:-[a-zA-Z0-9.-]+)?(?:\+[a-zA-Z0-9.-]+)?(")"#,
        )
        .unwrap();

        let updated = version_re.replace(&content, |caps: &regex::Captures| {
            format!("{}{}{}", &caps[1], new_version, &caps[2])
        });

        std::fs::write(&version_go_path, updated.as_ref())?;
        tracing::info!(
            "Updated {} to version {}",
            version_go_path.display(),
            new_version
        );
        Ok(())
    }

    fn module_name(module_path: &str) -> String {
        module_path
            .rsplit('/')
            .next()
            .unwrap_or(module_path)
            .to_string()
    }
}

impl Resolver for GoResolver {
    fn resolve(&mut self, root: &Path, pkg_config: &PackageConfig) -> Result<ResolvedPackage> {
        let go_mod_path = root.join(&pkg_config.path).join("go.mod");
        if !go_mod_path.exists() {
            return Err(SemifoldError::FileOrDirNotFound { path: go_mod_path });
        }

        let go_mod_str = std::fs::read_to_string(&go_mod_path)?;
        let go_mod = Self::parse_go_mod(&go_mod_str, &go_mod_path)?;

        let version_str = Self::get_version(root, &pkg_config.path, &go_mod.module)?;
        let version = semver::Version::parse(&version_str)?;

        Ok(ResolvedPackage {
            name: Self::module_name(&go_mod.module),
            version,
            path: pkg_config.path.clone(),
            private: false,
        })
    }

    fn resolve_all(&mut self, root: &Path) -> Result<Vec<ResolvedPackage>> {
        let discover = |path: std::path::PathBuf| PackageConfig {
            path,
            resolver: ResolverType::Go,
            version_mode: VersionMode::Semantic,
            assets: vec![],
        };

        // A go.work workspace takes precedence over a root go.mod.
        let go_work_path = root.join("go.work");
        if go_work_path.exists() {
            let go_work_str = std::fs::read_to_string(&go_work_path)?;
            let use_dirs = Self::parse_go_work(&go_work_str);

            return use_dirs
                .iter()
                .map(|dir| {
                    let rel_path = if dir == "." {
                        ".".into()
                    } else {
                        dir.trim_start_matches("./").into()
                    };
                    self.resolve(root, &discover(rel_path))
                })
                .collect();
        }

        if !root.join("go.mod").exists() {
            tracing::warn!(
                "Cannot resolve package in {}, go.mod not found",
                root.display()
            );
            return Ok(vec![]);
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

        Self::update_version_go(&root.join(&package.path), &version.to_string())
    }

    fn sort_packages(
        &mut self,
        root: &Path,
        packages: &mut Vec<(String, PackageConfig)>,
    ) -> Result<()> {
        let parsed = packages
            .iter()
            .filter(|(_, cfg)| cfg.resolver == ResolverType::Go)
            .try_fold(HashMap::new(), |mut acc, (id, cfg)| {
                let go_mod_path = root.join(&cfg.path).join("go.mod");
                let go_mod_str = std::fs::read_to_string(&go_mod_path)?;
                let go_mod = Self::parse_go_mod(&go_mod_str, &go_mod_path)?;
                acc.insert(id.clone(), go_mod);
                Ok::<_, SemifoldError>(acc)
            })?;

        let module_to_id: HashMap<String, String> = parsed
            .iter()
            .map(|(id, go_mod)| (go_mod.module.clone(), id.clone()))
            .collect();

        packages.sort_by(|(a, a_cfg), (b, b_cfg)| {
            if a_cfg.resolver != ResolverType::Go || b_cfg.resolver != ResolverType::Go {
                return std::cmp::Ordering::Equal;
            }
            let (Some(a_mod), Some(b_mod)) = (parsed.get(a), parsed.get(b)) else {
                return std::cmp::Ordering::Equal;
            };

            let a_depends_on_b = a_mod
                .require
                .iter()
                .any(|(path, _)| module_to_id.get(path).is_some_and(|id| id == b));
            let b_depends_on_a = b_mod
                .require
                .iter()
                .any(|(path, _)| module_to_id.get(path).is_some_and(|id| id == a));

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
        // Go modules are distributed via git tags; publishing only runs
        // whatever commands the configuration asks for.
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GO_MOD: &str = r#"
module github.com/acme/widgets

go 1.22

// single form
require github.com/pkg/errors v0.9.1

require (
    github.com/acme/base v1.2.0
    golang.org/x/sync v0.8.0
)
"#;

    #[test]
    fn test_parse_go_mod() {
        let go_mod = GoResolver::parse_go_mod(GO_MOD, Path::new("go.mod")).unwrap();
        assert_eq!(go_mod.module, "github.com/acme/widgets");
        assert_eq!(go_mod.require.len(), 3);
        assert_eq!(go_mod.require[0].0, "github.com/pkg/errors");
        assert_eq!(go_mod.require[1], ("github.com/acme/base".to_string(), "v1.2.0".to_string()));
    }

    #[test]
    fn test_parse_go_mod_without_module_fails() {
        let err = GoResolver::parse_go_mod("go 1.22\n", Path::new("go.mod")).unwrap_err();
        assert!(matches!(err, SemifoldError::ParseError { .. }));
    }

    #[test]
    fn test_parse_go_work() {
        let content = r#"
go 1.22

use ./cmd/api

use (
    ./internal/core
    ./internal/store
)
"#;
        let dirs = GoResolver::parse_go_work(content);
        assert_eq!(
            dirs,
            vec!["./cmd/api", "./internal/core", "./internal/store"]
        );
    }

    #[test]
    fn test_resolve_uses_version_go() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module github.com/acme/widgets\n").unwrap();
        std::fs::write(
            dir.path().join("version.go"),
            "package main\n\nconst Version = \"1.4.2\"\n",
        )
        .unwrap();

        let mut resolver = GoResolver;
        let pkg = resolver
            .resolve(
                dir.path(),
                &PackageConfig {
                    path: ".".into(),
                    resolver: ResolverType::Go,
                    version_mode: VersionMode::Semantic,
                    assets: vec![],
                },
            )
            .unwrap();

        assert_eq!(pkg.name, "widgets");
        assert_eq!(pkg.version, semver::Version::new(1, 4, 2));
    }

    #[test]
    fn test_resolve_defaults_to_zero_version() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module example.com/solo\n").unwrap();

        let mut resolver = GoResolver;
        let pkg = resolver
            .resolve(
                dir.path(),
                &PackageConfig {
                    path: ".".into(),
                    resolver: ResolverType::Go,
                    version_mode: VersionMode::Semantic,
                    assets: vec![],
                },
            )
            .unwrap();

        assert_eq!(pkg.version, semver::Version::new(0, 0, 0));
    }

    #[test]
    fn test_resolve_missing_go_mod() {
        let dir = TempDir::new().unwrap();
        let mut resolver = GoResolver;
        let err = resolver
            .resolve(
                dir.path(),
                &PackageConfig {
                    path: ".".into(),
                    resolver: ResolverType::Go,
                    version_mode: VersionMode::Semantic,
                    assets: vec![],
                },
            )
            .unwrap_err();
        assert!(matches!(err, SemifoldError::FileOrDirNotFound { .. }));
    }

    #[test]
    fn test_resolve_all_prefers_go_work() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("svc")).unwrap();
        std::fs::write(dir.path().join("go.work"), "go 1.22\n\nuse ./svc\n").unwrap();
        std::fs::write(dir.path().join("svc/go.mod"), "module example.com/svc\n").unwrap();
        std::fs::write(dir.path().join("go.mod"), "module example.com/root\n").unwrap();

        let mut resolver = GoResolver;
        let packages = resolver.resolve_all(dir.path()).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].name, "svc");
    }

    #[test]
    fn test_resolve_all_without_manifests_is_empty() {
        let dir = TempDir::new().unwrap();
        let mut resolver = GoResolver;
        assert!(resolver.resolve_all(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_bump_rewrites_version_go() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module example.com/solo\n").unwrap();
        std::fs::write(
            dir.path().join("version.go"),
            "package main\n\nvar Version = \"v0.1.0\"\n",
        )
        .unwrap();

        let package = ResolvedPackage {
            name: "solo".to_string(),
            version: semver::Version::new(0, 1, 0),
            path: ".".into(),
            private: false,
        };

        let ctx = Context::new(dir.path().to_path_buf(), false);
        let mut resolver = GoResolver;
        resolver
            .bump(&ctx, dir.path(), &package, &semver::Version::new(0, 2, 0))
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("version.go")).unwrap();
        assert!(content.contains("var Version = \"0.2.0\""));
    }

    #[test]
    fn test_bump_creates_version_go() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module example.com/solo\n").unwrap();

        let package = ResolvedPackage {
            name: "solo".to_string(),
            version: semver::Version::new(0, 0, 0),
            path: ".".into(),
            private: false,
        };

        let ctx = Context::new(dir.path().to_path_buf(), false);
        let mut resolver = GoResolver;
        resolver
            .bump(&ctx, dir.path(), &package, &semver::Version::new(0, 1, 0))
            .unwrap();

        let content = std::fs::read_to_string(dir.path().join("version.go")).unwrap();
        assert!(content.contains("const Version = \"0.1.0\""));
    }

    #[test]
    fn test_bump_dry_run_is_noop() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module example.com/solo\n").unwrap();

        let package = ResolvedPackage {
            name: "solo".to_string(),
            version: semver::Version::new(0, 0, 0),
            path: ".".into(),
            private: false,
        };

        let ctx = Context::new(dir.path().to_path_buf(), true);
        let mut resolver = GoResolver;
        resolver
            .bump(&ctx, dir.path(), &package, &semver::Version::new(0, 1, 0))
            .unwrap();

        assert!(!dir.path().join("version.go").exists());
    }

    #[test]
    fn test_sort_packages_orders_dependencies_first() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("app")).unwrap();
        std::fs::create_dir_all(dir.path().join("base")).unwrap();
        std::fs::write(
            dir.path().join("app/go.mod"),
            "module example.com/app\n\nrequire example.com/base v1.0.0\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("base/go.mod"), "module example.com/base\n").unwrap();

        let pkg = |path: &str| PackageConfig {
            path: path.into(),
            resolver: ResolverType::Go,
            version_mode: VersionMode::Semantic,
            assets: vec![],
        };

        let mut packages = vec![("app".to_string(), pkg("app")), ("base".to_string(), pkg("base"))];
        let mut resolver = GoResolver;
        resolver.sort_packages(dir.path(), &mut packages).unwrap();

        assert_eq!(packages[0].0, "base");
        assert_eq!(packages[1].0, "app");
    }
}
