mod cli;
mod commands;
mod project;
mod report;

use clap::Parser;

use cli::{Cli, Command};
use commands::{check_cmd, dump_cmd, run_cmd};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).try_init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run {
            stage,
            seconds,
            fps,
            walk,
            config,
            seed,
            report,
        } => run_cmd::run(run_cmd::RunOptions {
            stage,
            seconds,
            fps,
            walk,
            config,
            seed,
            report,
        }),
        Command::Check { files } => check_cmd::check(files),
        Command::Dump { stage, output } => dump_cmd::dump(&stage, output.as_deref()),
        Command::List => {
            dump_cmd::list();
            Ok(())
        }
    }
}
