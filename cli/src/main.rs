mod cli_args;

use anyhow::{Context, Result};
use byte_unit::{Byte, UnitType};
use clap::Parser;
use colored::*;
use ctxcat_core::{read_context, AppError, ContextOptions};
use std::io::Write;
use std::process;

use cli_args::Cli;

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.quiet, cli.verbose, cli.debug_explain);
    log::debug!("CLI args parsed: {:?}", cli);

    let exit_code = match run_app(&cli) {
        Ok(()) => {
            log::debug!("Finished successfully.");
            0
        }
        Err(err) => report_error(&err),
    };
    process::exit(exit_code);
}

fn setup_logging(quiet: bool, verbose: u8, debug_explain: bool) {
    let mut log_level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    if debug_explain && !quiet && log_level < log::LevelFilter::Debug {
        log_level = log::LevelFilter::Debug;
    }
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();
}

fn run_app(cli: &Cli) -> Result<()> {
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Could not determine the current directory")?,
    };

    let override_rules = match &cli.overrides {
        Some(path) => ctxcat_core::load_rule_file(path)?,
        None => Vec::new(),
    };

    let options = ContextOptions {
        override_rules,
        list_only: cli.list_only,
        include_sizes: cli.show_sizes,
        size_limit_bytes: cli.size_limit,
        debug_explain: cli.debug_explain,
        cancel: None,
    };

    let result = read_context(&root, &cli.targets, &options)?;

    match &cli.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Could not create {}", parent.display()))?;
            }
            let mut content = result;
            if !content.is_empty() && !content.ends_with('\n') {
                content.push('\n');
            }
            std::fs::write(path, content)
                .with_context(|| format!("Could not write {}", path.display()))?;
            if !cli.quiet {
                eprintln!("Context written to {}", path.display());
            }
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(result.as_bytes())?;
            if !result.is_empty() && !result.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

fn report_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AppError>() {
        Some(AppError::SizeLimitExceeded {
            limit_bytes,
            observed_bytes,
            largest_files,
        }) => {
            eprintln!(
                "{} context size {} exceeds the {} limit",
                "Error:".red().bold(),
                human_size(*observed_bytes),
                human_size(*limit_bytes)
            );
            if !largest_files.is_empty() {
                eprintln!("Largest files (relative to the project root):");
                for file in largest_files {
                    eprintln!(
                        "  {:>12}  {}",
                        human_size(file.size_bytes),
                        file.rel_path.dimmed()
                    );
                }
            }
            eprintln!("Exclude large files with a .contextfiles entry, or raise -s/--size-limit.");
            3
        }
        Some(AppError::Cancelled) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            130
        }
        Some(
            AppError::InvalidRoot { .. }
            | AppError::TargetNotFound { .. }
            | AppError::TargetOutsideRoot { .. }
            | AppError::RuleRead { .. },
        ) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            1
        }
        Some(_) | None => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            2
        }
    }
}

fn human_size(bytes: u64) -> String {
    format!(
        "{:.2}",
        Byte::from_u64(bytes).get_appropriate_unit(UnitType::Binary)
    )
}
