mod commands;
mod config;
mod watcher;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{eval, watch, EvalArgs, WatchArgs};
use tracing_subscriber::EnvFilter;

/// Interspy - live values for every line of a script
#[derive(Parser, Debug)]
#[command(name = "interspy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a script once and print each line's values
    Eval(EvalArgs),

    /// Re-annotate a script every time it is saved
    Watch(WatchArgs),
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = std::env::current_dir()
        .map_err(|err| anyhow::anyhow!("Cannot get current directory: {}", err))
        .and_then(|cwd| {
            let cwd = cwd.display().to_string();
            match cli.command {
                Command::Eval(args) => eval(args, &cwd),
                Command::Watch(args) => watch(args, &cwd),
            }
        });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
