use anyhow::Context;
use clap::Parser;
use debugsym::{Cli, DebugSym, DebugSymError, OutputFormatter, OutputMode};
use std::path::PathBuf;
use std::process;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();
    setup_logging(&cli);
    log::debug!("{}", debugsym::build_info());

    if cli.generate_config {
        return match handle_generate_config(&cli) {
            Ok(path) => {
                println!("Generated sample configuration file: {}", path.display());
                println!("\nTo use this configuration:");
                println!("  debugsym --config {}", path.display());
                0
            }
            Err(e) => {
                eprintln!("Failed to generate configuration file: {:#}", e);
                1
            }
        };
    }

    let debugsym = match DebugSym::from_cli(&cli) {
        Ok(debugsym) => debugsym,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    let pattern = cli.package_pattern(debugsym.config()).to_string();

    if cli.dry_run {
        return match debugsym.plan(&pattern) {
            Ok(_) => 0,
            Err(e) => {
                debugsym.handle_error(&e);
                exit_code_for(&e)
            }
        };
    }

    match debugsym.extract_kernel_debug_symbols(&pattern).await {
        Ok(manifest) => {
            if manifest.failures().next().is_none() {
                0
            } else {
                2
            }
        }
        Err(e) => {
            debugsym.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &DebugSymError) -> i32 {
    match error {
        DebugSymError::Cancelled => 130,
        DebugSymError::NoMatchingRepositories { .. } => 3,
        DebugSymError::WorkspaceUnavailable { .. } => 4,
        DebugSymError::Config { .. } | DebugSymError::InvalidPattern { .. } => 5,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> anyhow::Result<PathBuf> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("debugsym.toml"));

    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    DebugSym::generate_sample_config(&config_path)
        .with_context(|| format!("writing {}", config_path.display()))?;

    Ok(config_path)
}

fn print_startup_error(error: &DebugSymError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn setup_logging(cli: &Cli) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .format_timestamp(None)
        .init();
}
