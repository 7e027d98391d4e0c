pub mod cli;

use crate::domain::model::{ResolverType, VersionMode};
use crate::utils::error::{Result, SemifoldError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "semifold.toml";
pub const DEFAULT_TAG_FORMAT: &str = "{name}-v{version}";
pub const DEFAULT_CHANGELOG_FILE: &str = "CHANGELOG.md";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootConfig {
    pub project: ProjectConfig,
    #[serde(default)]
    pub packages: HashMap<String, PackageConfig>,
    #[serde(default)]
    pub resolvers: HashMap<String, ResolverConfig>,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub changelog: ChangelogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub repository: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
    pub path: PathBuf,
    pub resolver: ResolverType,
    #[serde(default)]
    pub version_mode: VersionMode,
    #[serde(default)]
    pub assets: Vec<String>,
}

/// Prepublish/publish command hooks for one resolver type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub prepublish: Vec<CommandConfig>,
    #[serde(default)]
    pub publish: Vec<CommandConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    pub command: String,
    pub args: Option<Vec<String>>,
    /// When true the command also runs under --dry-run.
    pub dry_run: Option<bool>,
    pub env: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
    #[serde(default = "default_tag_format")]
    pub tag_format: String,
    #[serde(default)]
    pub allow_dirty: bool,
    #[serde(default = "default_true")]
    pub commit: bool,
    #[serde(default = "default_commit_message")]
    pub commit_message: String,
}

impl Default for GitConfig {
    fn default() -> Self {
        GitConfig {
            tag_format: default_tag_format(),
            allow_dirty: false,
            commit: true,
            commit_message: default_commit_message(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_changelog_file")]
    pub file: String,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        ChangelogConfig {
            enabled: true,
            file: default_changelog_file(),
        }
    }
}

fn default_tag_format() -> String {
    DEFAULT_TAG_FORMAT.to_string()
}

fn default_true() -> bool {
    true
}

fn default_commit_message() -> String {
    "chore(release): publish".to_string()
}

fn default_changelog_file() -> String {
    DEFAULT_CHANGELOG_FILE.to_string()
}

impl RootConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SemifoldError::FileOrDirNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SemifoldError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("project.name", &self.project.name)?;

        if let Some(repository) = &self.project.repository {
            validation::validate_url("project.repository", repository)?;
        }

        if self.packages.is_empty() {
            return Err(SemifoldError::MissingConfigError {
                field: "packages".to_string(),
            });
        }

        for (id, pkg) in &self.packages {
            let field = format!("packages.{}.path", id);
            let path_str = pkg.path.to_string_lossy();
            validation::validate_path(&field, &path_str)?;
        }

        let valid_resolvers = ["cargo", "node", "go"];
        for key in self.resolvers.keys() {
            if !valid_resolvers.contains(&key.as_str()) {
                return Err(SemifoldError::InvalidConfigValueError {
                    field: "resolvers".to_string(),
                    value: key.clone(),
                    reason: format!(
                        "Unknown resolver type. Valid resolvers: {}",
                        valid_resolvers.join(", ")
                    ),
                });
            }
        }

        if !self.git.tag_format.contains("{version}") {
            return Err(SemifoldError::InvalidConfigValueError {
                field: "git.tag_format".to_string(),
                value: self.git.tag_format.clone(),
                reason: "tag format must contain {version}".to_string(),
            });
        }

        Ok(())
    }

    /// Packages sorted by id, for deterministic iteration order.
    pub fn packages_sorted(&self) -> Vec<(String, PackageConfig)> {
        let mut packages: Vec<(String, PackageConfig)> = self
            .packages
            .iter()
            .map(|(id, cfg)| (id.clone(), cfg.clone()))
            .collect();
        packages.sort_by(|(a, _), (b, _)| a.cmp(b));
        packages
    }

    pub fn resolver_config(&self, resolver: ResolverType) -> ResolverConfig {
        self.resolvers
            .get(&resolver.to_string())
            .cloned()
            .unwrap_or_default()
    }

    /// Render the release tag for a package, e.g. `core-v1.2.0`.
    pub fn tag_name(&self, package_name: &str, version: &semver::Version) -> String {
        self.git
            .tag_format
            .replace("{name}", package_name)
            .replace("{version}", &version.to_string())
    }

    /// Tag prefix used when searching for a package's previous release tag.
    pub fn tag_prefix(&self, package_name: &str) -> String {
        match self.git.tag_format.split("{version}").next() {
            Some(prefix) => prefix.replace("{name}", package_name),
            None => String::new(),
        }
    }
}

/// Replace `${VAR}` references with environment values. Unset variables are
/// left as-is so validation reports them in context.
fn substitute_env_vars(content: &str) -> String {
    use regex::Regex;
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}

impl Validate for RootConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
