use crate::config::{PackageConfig, ResolverConfig};
use crate::core::context::Context;
use crate::domain::model::ResolvedPackage;
use crate::utils::error::Result;
use semver::Version;
use std::path::Path;

/// Ecosystem-specific package operations.
///
/// A resolver knows how to read one manifest format, rewrite its version,
/// order packages so dependencies release before dependents, and run the
/// configured publish commands.
pub trait Resolver {
    /// Resolve a single configured package under `root`.
    fn resolve(&mut self, root: &Path, pkg_config: &PackageConfig) -> Result<ResolvedPackage>;

    /// Discover and resolve every package of this ecosystem under `root`,
    /// without explicit package configuration.
    fn resolve_all(&mut self, root: &Path) -> Result<Vec<ResolvedPackage>>;

    /// Write `version` into the package's manifest. Must be a no-op under
    /// `ctx.dry_run`.
    fn bump(
        &mut self,
        ctx: &Context,
        root: &Path,
        package: &ResolvedPackage,
        version: &Version,
    ) -> Result<()>;

    /// Reorder `packages` so that, among packages of this resolver's type,
    /// dependencies come before their dependents. Packages of other types
    /// are left where they are.
    fn sort_packages(
        &mut self,
        root: &Path,
        packages: &mut Vec<(String, PackageConfig)>,
    ) -> Result<()>;

    /// Run the configured prepublish and publish commands for `package`.
    fn publish(
        &mut self,
        package: &ResolvedPackage,
        resolver_config: &ResolverConfig,
        dry_run: bool,
    ) -> Result<()>;
}
