use clap::Parser;
use colored::Colorize;

use deeplinker::cli::Cli;
use deeplinker::config;
use deeplinker::errors::DeeplinkerError;
use deeplinker::{runtime, system};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    match cli.config.as_deref() {
        Some(path) => config::init_config_from(path),
        None => config::init_config(),
    }

    let guard = match system::init_logging(&config::get_config()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let exit_code = match runtime::modes::run(cli.command).await {
        Ok(()) => 0,
        Err(e) => {
            match e.downcast_ref::<DeeplinkerError>() {
                Some(err) => eprintln!("{}", err.format_colored()),
                None => eprintln!("{} {:#}", "Error:".red().bold(), e),
            }
            1
        }
    };

    // 退出前刷新日志
    drop(guard);
    std::process::exit(exit_code);
}
