mod app_system;
mod catalog_actor;
mod cli;
mod clients;
mod domain;
mod remote;
mod render;
mod session;
mod view;

#[cfg(test)]
mod mock_framework;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, Instrument};

use crate::app_system::{setup_tracing, CatalogSystem};
use crate::cli::{load_config, Cli, Command};
use crate::clients::CatalogClient;

/// Prints a notice on stderr whenever a catalog load starts.
fn spawn_loading_indicator(catalog: &CatalogClient) -> tokio::task::JoinHandle<()> {
    let mut loading = catalog.loading();
    tokio::spawn(async move {
        while loading.changed().await.is_ok() {
            if *loading.borrow_and_update() {
                eprintln!("Loading products...");
            }
        }
    })
}

/// Runs one UI interaction. Login and logout only touch the session gate; every
/// other command passes the gate, brings the catalog up to date, acts, and prints
/// the resulting projection.
async fn run(system: &CatalogSystem, command: &Command) -> anyhow::Result<()> {
    let catalog = &system.catalog;

    let view = match command {
        Command::Login { pin } => {
            system.session.login(pin)?;
            println!("Logged in.");
            return Ok(());
        }
        Command::Logout => {
            system.session.logout()?;
            println!("Logged out.");
            return Ok(());
        }
        Command::List(view) => {
            system.session.require()?;
            catalog.load().await?;
            view
        }
        Command::Add { view, .. } => {
            system.session.require()?;
            // Validated before any request; a successful create reloads the catalog.
            let product = command.product_create().context("add command without product fields")?;
            let created = catalog.create(product).await?;
            println!("Added {} ({}).", created.name, created.id);
            view
        }
        Command::Edit { id, view, .. } => {
            system.session.require()?;
            let patch = command.product_patch().context("edit command without changes")?;
            anyhow::ensure!(!patch.is_empty(), "Nothing to change: pass at least one field to edit.");
            catalog.load().await?;
            let updated = catalog.update(id.clone(), patch).await?;
            println!("Updated {} ({}).", updated.name, updated.id);
            view
        }
        Command::Delete { id, view } => {
            system.session.require()?;
            catalog.load().await?;
            catalog.remove(id.clone()).await?;
            println!("Deleted {}.", id);
            view
        }
    };

    let products = catalog.project(view.query()).await?;
    print!("{}", render::product_table(&products));
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_tracing();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };
    info!(api_base_url = %config.api_base_url, "Starting catalog");

    let system = match CatalogSystem::from_config(&config) {
        Ok(system) => system,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let indicator = spawn_loading_indicator(&system.catalog);

    let span = tracing::info_span!("command");
    let outcome = run(&system, &cli.command).instrument(span).await;

    indicator.abort();
    if let Err(e) = system.shutdown().await {
        error!(error = %e, "Shutdown failed");
    }

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
