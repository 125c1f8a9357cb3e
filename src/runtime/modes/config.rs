//! Configuration file helpers

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::{StaticConfig, get_config};

pub fn run_config(action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Generate { output_path, force } => config_generate(output_path, force),
        ConfigCommands::Show => {
            let config = get_config();
            let mut shown = (*config).clone();
            if !shown.database.database_url.starts_with("sqlite") {
                shown.database.database_url = "<hidden>".to_string();
            }
            print!("{}", toml::to_string_pretty(&shown)?);
            Ok(())
        }
    }
}

/// Generate example configuration file
fn config_generate(output_path: Option<String>, force: bool) -> Result<()> {
    let path = output_path.unwrap_or_else(|| "config.example.toml".to_string());

    // 文件已存在时，非 --force 模式下交互确认
    if !force && Path::new(&path).exists() {
        print!(
            "{} {} {}",
            "File already exists:".yellow(),
            path.blue(),
            "Overwrite? [y/N] ".yellow()
        );
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{}", "Aborted.".red());
            return Ok(());
        }
    }

    StaticConfig::default()
        .save_to_file(&path)
        .with_context(|| format!("Unable to write configuration file {}", path))?;

    println!(
        "  {} {}",
        "Configuration file generated successfully".green(),
        path.blue()
    );
    Ok(())
}
