//! Gift shop CLI - cart, checkout and register from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the server cart with checkout totals
//! giftshop cart show
//!
//! # Add two units of product 7
//! giftshop cart add 7 -q 2 --price 1500 --name "Elephant Carving"
//!
//! # Change a quantity (checked against cached stock)
//! giftshop cart update 7 3
//!
//! # Place the order for everything in the cart
//! giftshop cart checkout --address "18 Lake Drive" --city Kandy --postal-code 20000
//!
//! # Ring up a sale at the register
//! giftshop pos sell 4791234567890 4791234567890 --payment credit
//! ```
//!
//! # Commands
//!
//! - `cart` - Show, add, remove, update, clear and check out the online cart
//! - `tax` - Print the store tax rate
//! - `pos sell` - Scan barcodes and complete a register sale
//!
//! Configuration comes from the environment (see `GiftshopConfig`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use giftshop_core::{CustomerId, PaymentMethod, ProductId, ShippingAddress};
use giftshop_storefront::GiftshopConfig;
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CommandError;

#[derive(Parser)]
#[command(name = "giftshop")]
#[command(author, version, about = "Gift shop cart and register client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with the online shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Print the store tax rate
    Tax,
    /// Point-of-sale register
    Pos {
        #[command(subcommand)]
        action: PosAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and checkout totals
    Show,
    /// Add a product
    Add {
        product_id: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Product name, used if the cart has to be updated offline
        #[arg(long)]
        name: Option<String>,

        /// Online price, used if the cart has to be updated offline
        #[arg(long, default_value_t = Decimal::ZERO)]
        price: Decimal,

        /// Known stock level
        #[arg(long, default_value_t = 0)]
        stock: u32,
    },
    /// Remove a product's line
    Remove { product_id: ProductId },
    /// Set a product's quantity (0 removes it)
    Update { product_id: ProductId, quantity: u32 },
    /// Empty the cart
    Clear,
    /// Place an order for the whole cart
    Checkout {
        /// First address line
        #[arg(long)]
        address: String,

        #[arg(long)]
        address_line2: Option<String>,

        #[arg(long)]
        city: String,

        #[arg(long)]
        postal_code: String,

        /// Payment method (credit, cod)
        #[arg(short, long, default_value = "credit")]
        payment: PaymentMethod,
    },
}

#[derive(Subcommand)]
enum PosAction {
    /// Scan barcodes and complete the sale
    Sell {
        /// Barcodes to scan, one unit per occurrence
        #[arg(required = true)]
        barcodes: Vec<String>,

        /// Payment method (cash, credit, debit)
        #[arg(short, long, default_value = "cash")]
        payment: PaymentMethod,

        /// Registered customer, walk-in when omitted
        #[arg(short, long)]
        customer: Option<CustomerId>,

        #[arg(short, long)]
        notes: Option<String>,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &GiftshopConfig) -> Option<sentry::ClientInitGuard> {
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
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = GiftshopConfig::from_env();

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "giftshop_storefront=info,giftshop_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: &GiftshopConfig) -> Result<(), CommandError> {
    match cli.command {
        Commands::Cart { action } => {
            let session = commands::cart::Session::open(config).await?;
            match action {
                CartAction::Show => {}
                CartAction::Add {
                    product_id,
                    quantity,
                    name,
                    price,
                    stock,
                } => {
                    let product = commands::cart::product_from_args(product_id, name, price, stock);
                    session.add(&product, quantity).await?;
                }
                CartAction::Remove { product_id } => session.remove(product_id).await,
                CartAction::Update {
                    product_id,
                    quantity,
                } => session.update(product_id, quantity).await?,
                CartAction::Clear => session.clear().await,
                CartAction::Checkout {
                    address,
                    address_line2,
                    city,
                    postal_code,
                    payment,
                } => {
                    let address = ShippingAddress {
                        address_line2,
                        ..ShippingAddress::new(address, city, postal_code)
                    };
                    return session.checkout(&address, payment).await;
                }
            }
            session.show().await;
        }
        Commands::Tax => commands::tax::show(config).await?,
        Commands::Pos { action } => match action {
            PosAction::Sell {
                barcodes,
                payment,
                customer,
                notes,
            } => {
                commands::pos::sell(config, &barcodes, payment, customer, notes).await?;
            }
        },
    }
    Ok(())
}
