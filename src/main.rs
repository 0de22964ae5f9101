use anyhow::Result;
use clap::Parser;
use emotag::app::{RunPaths, run_tag_command};
use emotag::cli::Cli;
use emotag::config::Config;
use emotag::output::Reporter;
use owo_colors::OwoColorize;
use std::io::IsTerminal;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(jobs) = cli.jobs {
        config.batch.jobs = usize::from(jobs);
    }
    if cli.dry_run {
        config = config.dry_run();
    }
    if let Err(e) = config.validate() {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(2);
    }

    let reporter = Reporter::new(cli.quiet, std::io::stderr().is_terminal());
    if cli.dry_run {
        reporter.dry_run_notice();
    }
    tracing::debug!(version = %emotag::version_string(), "starting");

    let paths = RunPaths {
        input: cli.input,
        audio_dir: cli.audio_dir,
        output: cli.output,
    };
    if let Err(e) = run_tag_command(&config, &paths, reporter).await {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }

    Ok(())
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "emotag=debug",
        _ => "emotag=trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

/// Load configuration from custom path or default location, then apply
/// environment overrides.
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}
