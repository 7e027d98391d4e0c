pub mod model;
pub mod ports;

pub use model::{
    BumpLevel, CommitKind, ConventionalCommit, PackageRelease, ReleasePlan, ResolvedPackage,
    ResolverType, VersionMode,
};
pub use ports::Resolver;
