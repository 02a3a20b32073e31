mod commands;
mod logging;
mod progress;

use std::io::{self, Write};
use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, MatchArgs, OrphanArgs, RootArgs};
use dotenv::dotenv;
use progress::CliReporter;
use takeout_meta_core::{AppConfig, CancelToken, MatchKind, SidecarCleaner, TakeoutEngine};
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let Some(command) = Cli::parse().command else {
        let _ = Cli::command().print_long_help();
        return;
    };

    let guard = logging::init_logger();

    let config = match takeout_meta_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            drop(guard);
            process::exit(1);
        }
    };

    let outcome = match command {
        Commands::Match(args) => run_match(config, &args),
        Commands::Orphans(args) => run_orphans(config, &args),
        Commands::PrintConfig => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        drop(guard);
        process::exit(1);
    }
}

/// Command-line roots replace the configured ones.
fn apply_roots(mut config: AppConfig, roots: &RootArgs) -> AppConfig {
    if !roots.paths.is_empty() {
        config.root_paths = roots
            .paths
            .iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect();
    }
    if roots.no_recursive {
        config.recursive = false;
    }
    config
}

fn run_match(config: AppConfig, args: &MatchArgs) -> anyhow::Result<()> {
    let engine = TakeoutEngine::new(apply_roots(config, &args.roots));
    let reporter = CliReporter::new();
    let run = engine
        .run_match(&reporter, &CancelToken::new())
        .context("matching media files")?;

    let results: Vec<_> = run
        .results
        .iter()
        .filter(|result| !args.unmatched || !result.is_matched())
        .collect();

    if args.json {
        let json = serde_json::to_string_pretty(&results).context("serializing results")?;
        println!("{}", json);
        return Ok(());
    }

    for result in &results {
        match &result.sidecar_path {
            Some(sidecar) => println!(
                "{} -> {} [{}]",
                result.media_path.display(),
                sidecar.display(),
                result.kind.to_string().cyan()
            ),
            None => println!("{} {}", result.media_path.display(), "(no sidecar)".red()),
        }
    }

    println!();
    info!(
        "Walk: {}, Match: {}",
        format!("{:.2}s", run.walk_duration.as_secs_f64()).green(),
        format!("{:.2}s", run.match_duration.as_secs_f64()).green(),
    );
    info!(
        "{} of {} media files matched ({}), {} without sidecar",
        format!("{}", run.stats.matched).green(),
        run.stats.total(),
        format!("{:.1}%", run.stats.match_rate() * 100.0).green(),
        format!("{}", run.stats.unmatched).red(),
    );
    for kind in MatchKind::ALL {
        let count = run.stats.count(kind);
        if count > 0 && kind != MatchKind::None {
            info!("  {:<14} {}", kind.as_str(), format!("{}", count).cyan());
        }
    }
    if run.cancelled {
        warn!("Run was cancelled; results are partial");
    }

    Ok(())
}

fn run_orphans(config: AppConfig, args: &OrphanArgs) -> anyhow::Result<()> {
    let engine = TakeoutEngine::new(apply_roots(config, &args.roots));
    let reporter = CliReporter::new();
    let run = engine
        .run_orphans(&reporter)
        .context("scanning for orphaned sidecars")?;

    for orphan in &run.orphans {
        println!("{}", orphan.display());
    }
    info!(
        "{} orphaned sidecar files in {}",
        format!("{}", run.orphans.len()).red(),
        format!("{:.2}s", run.duration.as_secs_f64()).green(),
    );

    if !args.delete || run.orphans.is_empty() {
        return Ok(());
    }

    if !args.yes && !args.dry_run {
        let prompt = format!("Delete {} orphaned sidecar files?", run.orphans.len());
        if !prompt_confirm(&prompt, Some(false))? {
            info!("Nothing deleted");
            return Ok(());
        }
    }

    let report = SidecarCleaner::new()
        .dry_run(args.dry_run)
        .backup_dir(args.backup_dir.clone())
        .delete(&run.orphans);

    let verb = if args.dry_run { "would be deleted" } else { "deleted" };
    info!(
        "{} {}, {} skipped, {} failed",
        format!("{}", report.deleted.len()).green(),
        verb,
        report.skipped.len(),
        format!("{}", report.failed.len()).red(),
    );
    for (path, reason) in &report.failed {
        error!("Could not delete {}: {}", path.display(), reason);
    }

    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(default.unwrap_or(false));
        }

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
