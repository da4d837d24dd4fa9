use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;

use crate::domain::{ProductCreate, ProductPatch, Unit};
use crate::view::{SortKey, ViewQuery};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_SESSION_FILE: &str = ".catalog-session.json";
pub const DEFAULT_ACCESS_PIN: &str = "1990";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Parser, Debug)]
#[command(author, version, about = "Manage the shop catalog", long_about = None)]
pub struct Cli {
    /// Path to a JSON configuration file. Command-line flags take precedence over it.
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Root URL of the catalog service.
    #[arg(long, value_name = "URL", env = "CATALOG_API_BASE_URL", global = true)]
    pub api_base_url: Option<String>,

    /// Where the login flag is kept between runs.
    #[arg(long, value_name = "FILE", global = true)]
    pub session_file: Option<PathBuf>,

    /// Per-request timeout for calls to the catalog service, in seconds.
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Unlock the catalog with the shared MPIN.
    Login {
        #[arg(long)]
        pin: String,
    },
    /// Forget a previous login.
    Logout,
    /// Fetch the catalog and show it.
    List(ListArgs),
    /// Add a product.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long, allow_negative_numbers = true)]
        quantity: f64,
        #[arg(long, default_value_t = Unit::Kg)]
        unit: Unit,
        #[arg(long, allow_negative_numbers = true)]
        cost_price: f64,
        #[arg(long)]
        shop_name: String,
        #[arg(long, allow_negative_numbers = true)]
        sell_price: Option<f64>,
        #[command(flatten)]
        view: ListArgs,
    },
    /// Change fields of an existing product. Omitted fields keep their value.
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        quantity: Option<f64>,
        #[arg(long)]
        unit: Option<Unit>,
        #[arg(long, allow_negative_numbers = true)]
        cost_price: Option<f64>,
        #[arg(long)]
        shop_name: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        sell_price: Option<f64>,
        #[command(flatten)]
        view: ListArgs,
    },
    /// Delete a product.
    Delete {
        id: String,
        #[command(flatten)]
        view: ListArgs,
    },
}

/// How the catalog is shown after a command.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only show products whose name contains this text (case-insensitive).
    #[arg(long, default_value = "")]
    pub search: String,
    /// `shop` (A→Z by shop name) or `recent` (newest first).
    #[arg(long, default_value_t = SortKey::ShopName)]
    pub sort: SortKey,
}

impl ListArgs {
    pub fn query(&self) -> ViewQuery {
        ViewQuery::new(self.search.clone(), self.sort)
    }
}

impl Command {
    /// The product described by an `add` command.
    pub fn product_create(&self) -> Option<ProductCreate> {
        match self {
            Command::Add { name, quantity, unit, cost_price, shop_name, sell_price, .. } => Some(ProductCreate {
                name: name.clone(),
                quantity: *quantity,
                unit: *unit,
                cost_price: *cost_price,
                sell_price: *sell_price,
                shop_name: shop_name.clone(),
            }),
            _ => None,
        }
    }

    /// The changes described by an `edit` command.
    pub fn product_patch(&self) -> Option<ProductPatch> {
        match self {
            Command::Edit { name, quantity, unit, cost_price, shop_name, sell_price, .. } => Some(ProductPatch {
                name: name.clone(),
                quantity: *quantity,
                unit: *unit,
                cost_price: *cost_price,
                sell_price: *sell_price,
                shop_name: shop_name.clone(),
                created_at: None,
            }),
            _ => None,
        }
    }
}

/// Settings that can come from the configuration file.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_base_url: Option<String>,
    pub session_file: Option<PathBuf>,
    pub access_pin: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

/// Effective configuration after merging flags, the config file and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub session_file: PathBuf,
    pub access_pin: String,
    pub request_timeout: Duration,
}

/// Loads the configuration from the CLI arguments and, if given, a config file.
///
/// Flags (and `CATALOG_API_BASE_URL`) win over the file; the file wins over the
/// built-in defaults. The access PIN can only be set through the file.
///
/// # Errors
///
/// Returns an `Err` if the config file cannot be read or parsed.
pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let file = match &cli.config {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Could not read config file {}", path.display()))?;
            serde_json::from_str::<FileConfig>(&content)
                .with_context(|| format!("Could not parse config file {}", path.display()))?
        }
        None => FileConfig::default(),
    };
    Ok(merge(cli, file))
}

fn merge(cli: &Cli, file: FileConfig) -> Config {
    let timeout_secs = cli
        .timeout_secs
        .or(file.request_timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    Config {
        api_base_url: cli
            .api_base_url
            .clone()
            .or(file.api_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        session_file: cli
            .session_file
            .clone()
            .or(file.session_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE)),
        access_pin: file.access_pin.unwrap_or_else(|| DEFAULT_ACCESS_PIN.to_string()),
        request_timeout: Duration::from_secs(timeout_secs),
    }
}
