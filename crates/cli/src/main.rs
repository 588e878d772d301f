//! Segishop CLI - drive a checkout against a live backend.
//!
//! # Usage
//!
//! ```bash
//! # Quote shipping and totals for an address and cart
//! segishop quote --first-name Jane --last-name Doe --street "1 Main St" \
//!     --city Troy --state NY --zip 12180 --line 1:2:25.00 --coupon SAVE10
//!
//! # Address book (needs SEGISHOP_AUTH_TOKEN)
//! segishop addresses list
//! segishop addresses default 4
//! segishop addresses remove 4
//!
//! # Promotions
//! segishop coupons available
//! ```
//!
//! # Commands
//!
//! - `quote` - Run a checkout to completion and print options, totals and gate
//! - `addresses` - List, remove or set the default saved address
//! - `coupons available` - List promotable coupons

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use segishop_core::{AddressId, Country};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::quote::QuoteArgs;
use config::CliConfig;

#[derive(Parser)]
#[command(name = "segishop")]
#[command(author, version, about = "Segishop checkout tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Quote shipping options and totals for an address and cart
    Quote(QuoteArgs),
    /// Manage the signed-in shopper's address book
    Addresses {
        #[command(subcommand)]
        action: AddressAction,
    },
    /// Browse coupons
    Coupons {
        #[command(subcommand)]
        action: CouponAction,
    },
}

#[derive(Subcommand)]
enum AddressAction {
    /// List saved addresses, default first
    List,
    /// Remove a saved address
    Remove { id: AddressId },
    /// Make a saved address the default
    Default { id: AddressId },
    /// Suggest postal codes for a partial entry
    Suggest {
        partial: String,
        #[arg(long, default_value = "US")]
        country: Country,
        #[arg(long)]
        state: Option<String>,
    },
}

#[derive(Subcommand)]
enum CouponAction {
    /// List coupons the store currently promotes
    Available,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &CliConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match CliConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Tracing is not installed yet.
            #[allow(clippy::print_stderr)]
            {
                eprintln!("Configuration error: {e}");
            }
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "segishop_checkout=info,segishop_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: CliConfig) -> Result<(), Box<dyn std::error::Error>> {
    let config = config.checkout;
    match cli.command {
        Commands::Quote(args) => commands::quote::run(&config, args).await?,
        Commands::Addresses { action } => match action {
            AddressAction::List => commands::addresses::list(&config).await?,
            AddressAction::Remove { id } => commands::addresses::remove(&config, id).await?,
            AddressAction::Default { id } => commands::addresses::set_default(&config, id).await?,
            AddressAction::Suggest {
                partial,
                country,
                state,
            } => commands::addresses::suggest(&config, &partial, &country, state.as_deref()).await?,
        },
        Commands::Coupons { action } => match action {
            CouponAction::Available => commands::coupons::available(&config).await?,
        },
    }
    Ok(())
}
