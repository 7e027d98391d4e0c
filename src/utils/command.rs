use crate::config::CommandConfig;
use crate::utils::error::{Result, SemifoldError};
use std::path::Path;
use std::process::Command;

/// Run a configured command in the given working directory, inheriting
/// stdout/stderr so the operator sees tool output directly.
pub fn run_command(config: &CommandConfig, cwd: &Path) -> Result<()> {
    let args = config.args.clone().unwrap_or_default();

    let mut command = Command::new(&config.command);
    command.args(&args).current_dir(cwd);

    if let Some(env) = &config.env {
        command.envs(env);
    }

    let status = command
        .status()
        .map_err(|e| SemifoldError::CommandError {
            command: config.command.clone(),
            reason: format!("failed to start: {}", e),
        })?;

    if !status.success() {
        return Err(SemifoldError::CommandError {
            command: format!("{} {}", config.command, args.join(" ")),
            reason: match status.code() {
                Some(code) => format!("exited with status {}", code),
                None => "terminated by signal".to_string(),
            },
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(command: &str, args: &[&str]) -> CommandConfig {
        CommandConfig {
            command: command.to_string(),
            args: Some(args.iter().map(|s| s.to_string()).collect()),
            dry_run: None,
            env: None,
        }
    }

    #[test]
    fn test_successful_command() {
        let config = cmd("true", &[]);
        assert!(run_command(&config, Path::new(".")).is_ok());
    }

    #[test]
    fn test_failing_command_reports_status() {
        let config = cmd("false", &[]);
        let err = run_command(&config, Path::new(".")).unwrap_err();
        match err {
            SemifoldError::CommandError { reason, .. } => {
                assert!(reason.contains("status"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_binary_is_command_error() {
        let config = cmd("semifold-definitely-not-a-binary", &[]);
        assert!(matches!(
            run_command(&config, Path::new(".")),
            Err(SemifoldError::CommandError { .. })
        ));
    }
}
