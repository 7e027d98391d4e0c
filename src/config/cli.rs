use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "semifold")]
#[command(about = "Version management and release automation for multi-package repositories")]
#[command(version)]
pub struct Cli {
    /// Path to the semifold configuration file
    #[arg(short, long, default_value = super::DEFAULT_CONFIG_FILE, global = true)]
    pub config: String,

    /// Repository root (defaults to the current directory)
    #[arg(long, default_value = ".", global = true)]
    pub root: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON (for CI log collectors)
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Show what would happen without modifying anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List packages with their current versions
    List,

    /// Compute the pending release plan from conventional commits
    Plan,

    /// Bump manifest versions and write changelogs
    Bump,

    /// Regenerate changelogs for the pending release plan
    Changelog,

    /// Run prepublish and publish commands in dependency order
    Publish,

    /// Bump, commit, tag, and publish in one pass
    Release {
        /// Skip the publish step
        #[arg(long)]
        no_publish: bool,

        /// Skip tag creation
        #[arg(long)]
        no_tag: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["semifold", "plan", "--dry-run", "--log-json"]).unwrap();
        assert!(cli.dry_run);
        assert!(cli.log_json);
        assert!(matches!(cli.command, Command::Plan));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["semifold", "list"]).unwrap();
        assert_eq!(cli.config, super::super::DEFAULT_CONFIG_FILE);
        assert_eq!(cli.root, ".");
        assert!(!cli.verbose);
        assert!(!cli.log_json);
        assert!(!cli.dry_run);
    }
}

