pub mod changelog;
pub mod commits;
pub mod context;
pub mod git;
pub mod release;

pub use context::Context;
pub use release::ReleaseEngine;
