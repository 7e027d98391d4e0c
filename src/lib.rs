pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use config::{cli::Cli, PackageConfig, RootConfig};
pub use core::{Context, ReleaseEngine};
pub use domain::model::{ReleasePlan, ResolvedPackage, ResolverType, VersionMode};
pub use utils::error::{Result, SemifoldError};
