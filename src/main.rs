use clap::Parser;
use semifold::config::cli::{Cli, Command};
use semifold::utils::{error::ErrorSeverity, logger, validation::Validate};
use semifold::{Context, ReleaseEngine, ReleasePlan, RootConfig, SemifoldError};
use std::path::PathBuf;

fn main() {
    let cli = Cli::parse();

    if cli.log_json {
        logger::init_ci_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting semifold");
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
    }

    let root = PathBuf::from(&cli.root);
    let config_path = root.join(&cli.config);

    let config = match RootConfig::from_file(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config '{}': {}", config_path.display(), e);
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(exit_code(&e));
        }
    };

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(exit_code(&e));
    }

    if cli.dry_run {
        tracing::info!("Dry run mode: nothing will be modified");
    }

    let ctx = Context::new(root, cli.dry_run);
    let engine = ReleaseEngine::new(config, ctx);

    let result = run(&engine, &cli.command);

    if let Err(e) = result {
        tracing::error!(
            "Command failed: {} (category: {:?}, severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(exit_code(&e));
    }
}

fn run(engine: &ReleaseEngine, command: &Command) -> semifold::Result<()> {
    match command {
        Command::List => {
            let packages = engine.resolve_packages()?;
            println!("📦 {} package(s):", packages.len());
            for (id, cfg, package) in packages {
                let marker = if package.private { " (private)" } else { "" };
                println!(
                    "  {} — {} {} [{}]{}",
                    id, package.name, package.version, cfg.resolver, marker
                );
            }
        }
        Command::Plan => {
            let plan = engine.plan()?;
            print_plan(&plan);
        }
        Command::Bump => {
            let plan = engine.plan()?;
            if plan.is_empty() {
                println!("Nothing to bump.");
                return Ok(());
            }
            engine.apply(&plan)?;
            print_plan(&plan);
            println!("✅ Versions bumped.");
        }
        Command::Changelog => {
            let plan = engine.plan()?;
            if plan.is_empty() {
                println!("No pending releases; changelogs unchanged.");
                return Ok(());
            }
            engine.write_changelogs(&plan)?;
            println!("✅ Changelogs updated for {} package(s).", plan.releases.len());
        }
        Command::Publish => {
            engine.publish_all()?;
            println!("✅ Publish commands completed.");
        }
        Command::Release {
            no_publish,
            no_tag,
        } => {
            let plan = engine.release(*no_tag, *no_publish)?;
            if plan.is_empty() {
                println!("Nothing to release.");
            } else {
                print_plan(&plan);
                if engine.context().dry_run {
                    println!("🔍 Dry run complete; no changes were made.");
                } else {
                    println!("✅ Released {} package(s).", plan.releases.len());
                }
            }
        }
    }
    Ok(())
}

fn print_plan(plan: &ReleasePlan) {
    if plan.is_empty() {
        println!("No pending releases.");
        return;
    }
    println!("🚀 Pending releases:");
    for release in &plan.releases {
        println!(
            "  {}: {} -> {} ({} bump, {} commit(s))",
            release.package.name,
            release.package.version,
            release.next_version,
            release.level,
            release.commits.len()
        );
    }
}

fn exit_code(e: &SemifoldError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}
