//! Sync through the Mahara web services

use anyhow::{Context as _, Result, bail};
use dialoguer::{Confirm, Input};
use mahara::sync::{self, SyncOptions};
use mahara::{ApiSink, Client, Consumer, CredentialStore, Phases, VerifierPrompt};
use reconcile::{PasswordPolicy, Sink};

use crate::Context;
use crate::cli::MaharaArgs;
use crate::commands::{load_input, require};
use crate::{report, ui};

/// Asks for the OAuth verifier on the terminal
struct TerminalPrompt;

impl VerifierPrompt for TerminalPrompt {
    fn verifier(&self, authorize_url: &str) -> mahara::Result<String> {
        println!();
        ui::info("Authorize this application at:");
        println!("  {authorize_url}");
        println!();

        Input::<String>::new()
            .with_prompt("Enter the PIN / OAuth verifier")
            .interact_text()
            .map_err(|e| mahara::Error::Authorization(e.to_string()))
    }
}

fn phases(args: &MaharaArgs) -> Phases {
    Phases {
        create: args.create,
        update: args.update,
        delete: args.delete,
        groups: args.groups,
    }
}

pub fn run(ctx: &Context, args: MaharaArgs) -> Result<()> {
    let config = &ctx.config;
    let domain = require(
        args.input.domain.as_deref(),
        config.domain.as_deref(),
        "school domain",
    )?;
    let consumer = Consumer::new(
        require(
            args.consumer_key.as_deref(),
            config.mahara.consumer_key.as_deref(),
            "OAuth consumer key",
        )?,
        require(
            args.consumer_secret.as_deref(),
            config.mahara.consumer_secret.as_deref(),
            "OAuth consumer secret",
        )?,
    );
    let url = args
        .url
        .clone()
        .or_else(|| config.mahara.url.clone())
        .unwrap_or_else(|| mahara::DEFAULT_URL.to_string());
    let store = args
        .token_file
        .clone()
        .or_else(|| config.token_file())
        .map_or_else(CredentialStore::default, CredentialStore::new);

    let file = load_input(&args.input.file)?;
    log::info!("records loaded: {}", file.len());

    let client = Client::authorized(&url, consumer, &store, &TerminalPrompt)
        .with_context(|| format!("Could not connect to {url}"))?;

    let options = SyncOptions::new(domain)
        .passwords(PasswordPolicy {
            default: args.input.password.clone().or_else(|| config.password.clone()),
            ..Default::default()
        })
        .groups(args.groups || args.dry_run);
    let plan = sync::plan(&client, &file, &options)?;

    if !ctx.quiet {
        ui::header("Mahara sync");
        ui::kv("Site", &url);
        ui::kv("Institution", &plan.institution);
        report::changes(&plan.changes);
    }

    if args.dry_run {
        println!();
        ui::info("Dry run, nothing was applied");
        return Ok(());
    }

    let phases = phases(&args);
    if phases != Phases::default() && !plan.changes.is_empty() && !args.yes {
        println!();
        let confirmed = Confirm::new()
            .with_prompt("Apply these changes?")
            .default(false)
            .interact()
            .context("Failed to read confirmation")?;
        if !confirmed {
            bail!("Sync cancelled");
        }
    }

    let summary = ApiSink::new(&client, phases).emit(&plan.changes)?;
    if !ctx.quiet {
        report::emitted(&summary);
    }
    Ok(())
}
