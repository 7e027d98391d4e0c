use std::path::PathBuf;

/// Execution context threaded through every mutating operation.
#[derive(Debug, Clone)]
pub struct Context {
    pub root: PathBuf,
    pub dry_run: bool,
}

impl Context {
    pub fn new(root: PathBuf, dry_run: bool) -> Self {
        Self { root, dry_run }
    }
}
