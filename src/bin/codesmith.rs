//! CodeSmith - ask the coding assistant from the command line

use std::process::ExitCode;

use novaatom::agent::CodeSmith;
use novaatom::cli::{self, CliArgs, Invocation, USAGE};
use novaatom::core::config::{process_env, AppConfig};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(Invocation::Run(args)) => args,
        Ok(Invocation::Help) => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("codesmith: {}\n\n{}", e, USAGE);
            return ExitCode::from(2);
        }
    };

    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(level)
        .init();

    match run(&args) {
        Ok(line) => {
            println!("{}", line);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &CliArgs) -> anyhow::Result<String> {
    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Using default config: {:#}", e);
        AppConfig::default()
    });
    let agent = CodeSmith::from_config(reqwest::Client::new(), &config.agent, process_env);
    let root = std::env::current_dir()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let line = runtime.block_on(cli::execute(&agent, args, &root))?;
    Ok(line)
}
