//! `nrts-seed` - CLI for the bootstrap seeder
//!
//! Intended to run from a container entrypoint or database init hook. A
//! failed seed exits non-zero so the harness can abort startup.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use nrts_seed::cli::{CheckCommand, Cli, Command, ConfigCommand, RunCommand, ShowCommand};
use nrts_seed::{init_logging, store, Config, Seeder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config_path = cli.config.clone();
    match cli.into_command() {
        Command::Run(run_cmd) => handle_run(load_config(config_path)?, &run_cmd).await,
        Command::Check(check_cmd) => handle_check(load_config(config_path)?, &check_cmd).await,
        Command::Show(show_cmd) => handle_show(load_config(config_path)?, &show_cmd),
        Command::Config(config_cmd) => handle_config(config_path, config_cmd),
    }
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<Config> {
    Config::load_from(path).context("loading configuration")
}

async fn handle_run(mut config: Config, cmd: &RunCommand) -> anyhow::Result<()> {
    cmd.store.apply(&mut config);
    if cmd.record.is_some() {
        config.seed.record_file.clone_from(&cmd.record);
    }
    config.validate()?;

    let plan = config.seed_plan().context("resolving seed record")?;
    let store = store::open(&config).await?;
    let seeder = Seeder::new(store, plan);

    let outcome = seeder.ensure_seeded().await?;
    let mut stdout = std::io::stdout().lock();
    outcome.write_report(seeder.plan(), &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

async fn handle_check(mut config: Config, cmd: &CheckCommand) -> anyhow::Result<()> {
    cmd.store.apply(&mut config);
    if cmd.record.is_some() {
        config.seed.record_file.clone_from(&cmd.record);
    }
    config.validate()?;

    let plan = config.seed_plan().context("resolving seed record")?;
    let store = store::open(&config).await?;
    let seeder = Seeder::new(store, plan);
    let state = seeder.check().await?;

    let plan = seeder.plan();
    if cmd.json {
        let report = serde_json::json!({
            "state": state,
            "backend": config.store.backend,
            "collection": plan.collection,
            "id": plan.record.id,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "{} {} in {}: {state}",
            plan.label, plan.record.id, plan.collection
        );
    }
    Ok(())
}

fn handle_show(mut config: Config, cmd: &ShowCommand) -> anyhow::Result<()> {
    if cmd.record.is_some() {
        config.seed.record_file.clone_from(&cmd.record);
    }
    let record = config.seed_record()?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = load_config(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Store]");
                println!("  Backend:            {}", config.store.backend);
                println!("  URI:                {}", config.store.uri);
                println!("  Database:           {}", config.store.database);
                println!("  SQLite path:        {}", config.sqlite_path().display());
                println!(
                    "  Selection timeout:  {} ms",
                    config.store.server_selection_timeout_ms
                );
                println!();
                println!("[Seed]");
                println!("  Collection:         {}", config.seed.collection);
                println!("  Label:              {}", config.seed.label);
                println!("  Completion marker:  {}", config.seed.completion_marker);
                match &config.seed.record_file {
                    Some(path) => println!("  Record file:        {}", path.display()),
                    None => println!("  Record file:        (built-in test application)"),
                }
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            Config::load_from(Some(path.clone()))
                .and_then(|config| config.validate())
                .with_context(|| format!("invalid configuration in {}", path.display()))?;
            println!("Configuration is valid.");
        }
    }
    Ok(())
}
