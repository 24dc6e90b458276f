//! `cardiosync` - CLI for recording and syncing observations
//!
//! This binary is the form surface: it collects one observation per
//! invocation and hands it to the synchronizer.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{BufRead, Write};

use anyhow::{bail, Context};
use clap::Parser;

use cardiosync::auth::{digest_secret, verifier_from_config};
use cardiosync::cli::{Cli, Command, ConfigCommand, RemoteCommand, ShowCommand, SubmitCommand};
use cardiosync::{init_logging, Config, Synchronizer, UploadOutcome};

/// Environment variable consulted for the operator password before stdin.
const PASSWORD_ENV: &str = "CARDIOSYNC_PASSWORD";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    match cli.command {
        Command::Submit(cmd) => handle_submit(&config, &cmd).await,
        Command::Show(cmd) => handle_show(&config, &cmd).await,
        Command::Remote(cmd) => handle_remote(&config, &cmd).await,
        Command::HashPassword => handle_hash_password(),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn read_secret(prompt: &str) -> anyhow::Result<String> {
    if let Ok(secret) = std::env::var(PASSWORD_ENV) {
        return Ok(secret);
    }
    eprint!("{prompt}");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}

async fn handle_submit(config: &Config, cmd: &SubmitCommand) -> anyhow::Result<()> {
    if config.auth.required {
        let verifier = verifier_from_config(&config.auth)?;
        let operator = cmd
            .operator
            .clone()
            .or_else(|| config.auth.operator.clone())
            .unwrap_or_default();
        let secret = read_secret("Password: ")?;
        verifier.verify(&operator, &secret)?;
    }

    let sync = Synchronizer::from_config(config)?;
    let record = cmd.to_record();
    let report = sync.submit(&record).await?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        if let Some(warning) = &report.resolution.warning {
            eprintln!("warning: {warning}");
        }
        println!(
            "Saved {} rows to {}",
            report.rows,
            report.local_path.display()
        );
        match &report.upload {
            UploadOutcome::Created { id } => {
                println!("Created remote {} ({id})", sync.remote_name());
            }
            UploadOutcome::Updated { id } => {
                println!("Updated remote {} ({id})", sync.remote_name());
            }
            UploadOutcome::Failed { .. } => {}
        }
    }

    if let UploadOutcome::Failed { message } = &report.upload {
        bail!("local file saved but remote upload failed: {message}");
    }
    Ok(())
}

async fn handle_show(config: &Config, cmd: &ShowCommand) -> anyhow::Result<()> {
    let sync = Synchronizer::from_config(config)?;
    let Some(dataset) = sync.load_local().await? else {
        println!("No local dataset at {}", sync.local_path().display());
        return Ok(());
    };

    if cmd.csv {
        let bytes = dataset.to_csv()?;
        std::io::stdout().write_all(&bytes)?;
    } else {
        println!("{}", dataset.pretty()?);
        println!("{} rows", dataset.len());
    }
    Ok(())
}

async fn handle_remote(config: &Config, cmd: &RemoteCommand) -> anyhow::Result<()> {
    let sync = Synchronizer::from_config(config)?;
    let resolution = sync.resolve().await;

    if cmd.json {
        let status = serde_json::json!({
            "name": sync.remote_name(),
            "store": sync.store().name(),
            "exists": resolution.exists(),
            "id": resolution.id,
            "warning": resolution.warning,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("Store:   {}", sync.store().name());
        println!("Name:    {}", sync.remote_name());
        match &resolution.id {
            Some(id) => println!("Exists:  yes ({id})"),
            None => println!("Exists:  no"),
        }
        if let Some(warning) = &resolution.warning {
            println!("Warning: {warning}");
        }
    }
    Ok(())
}

fn handle_hash_password() -> anyhow::Result<()> {
    let secret = read_secret("Password to digest: ")?;
    if secret.is_empty() {
        bail!("refusing to digest an empty password");
    }
    println!("{}", digest_secret(&secret));
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Dataset]");
                println!("  File name:          {}", config.dataset.file_name);
                println!("  Local path:         {}", config.dataset_path().display());
                println!();
                println!("[Remote]");
                println!("  Backend:            {}", config.remote.backend);
                println!(
                    "  Directory:          {}",
                    config.remote_directory().display()
                );
                println!(
                    "  Drive token set:    {}",
                    config.remote.drive.access_token.is_some()
                );
                println!();
                println!("[Auth]");
                println!("  Required:           {}", config.auth.required);
                println!(
                    "  Operator:           {}",
                    config.auth.operator.as_deref().unwrap_or("(unset)")
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
