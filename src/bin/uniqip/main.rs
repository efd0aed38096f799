use anyhow::Result;
use clap::Parser;
use env_logger::{Builder, Env};
use log::error;

mod cli;
mod cmd_count;
mod cmd_params;

fn init_logger() {
    // Уровень берём из RUST_LOG, иначе дефолт: info.
    // Пример: RUST_LOG=debug uniqip count --path ./ip_addresses
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = run() {
        error!("{:?}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = cli::Cli::parse();
    match cli.cmd {
        cli::Cmd::Count {
            path,
            block_size,
            queue,
            workers,
            expected,
            fp_rate,
            hash,
            json,
        } => cmd_count::exec(
            path,
            cmd_count::Overrides {
                block_size,
                queue,
                workers,
                expected,
                fp_rate,
                hash,
            },
            json,
        ),

        cli::Cmd::Params { expected, fp_rate, json } =>
            cmd_params::exec(expected, fp_rate, json),
    }
}
