use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use isoko_analytics::{DashboardOptions, DashboardReport};
use isoko_config::IsokoConfig;
use isoko_core::{
    NewGroceryPayment, NewRentalPayment, PaymentMode, PaymentReference, RentalType, VehicleStatus,
};
use isoko_ledger::{
    billed_units, quote_goods, quote_rental, LedgerRepository, RecordQuery, SqliteLedgerRepository,
};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::import::{import_bundle, ImportBundle};
use crate::render;
use crate::telemetry::init_tracing;

#[derive(Parser)]
#[command(author, version, about = "Isoko wholesale and rental ledger")]
pub struct Cli {
    /// Configuration file (defaults to config/isoko.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configured business record unless it already exists
    Init,
    /// Import a JSON bundle of records
    Import { file: PathBuf },
    /// Preview totals before recording anything
    Quote {
        #[command(subcommand)]
        command: QuoteCommand,
    },
    /// Record a payment against a purchase, sale or rental contract
    Pay(PayArgs),
    /// Close a rental contract
    Contract { action: ContractAction, id: Uuid },
    /// Fleet operations
    Vehicle {
        #[command(subcommand)]
        command: VehicleCommand,
    },
    /// Per-item stock with package breakdown
    Stock {
        /// Show a single item
        #[arg(long)]
        item: Option<Uuid>,
    },
    /// Dashboard KPIs, trends and rankings
    Dashboard {
        /// Reporting date (defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Subcommand)]
enum QuoteCommand {
    Purchase(GoodsQuoteArgs),
    Sale(GoodsQuoteArgs),
    Rental {
        #[arg(long)]
        rental_type: RentalType,
        #[arg(long)]
        rate: Decimal,
        #[arg(long)]
        start: DateTime<Utc>,
        #[arg(long)]
        end: DateTime<Utc>,
        #[arg(long, default_value = "0")]
        paid: Decimal,
    },
}

#[derive(Args)]
struct GoodsQuoteArgs {
    #[arg(long)]
    quantity: Decimal,
    #[arg(long)]
    unit_price: Decimal,
    #[arg(long, default_value = "0")]
    paid: Decimal,
}

#[derive(Args)]
struct PayArgs {
    target: PayTarget,
    id: Uuid,
    #[arg(long)]
    amount: Decimal,
    /// Payment date (defaults to today)
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long, default_value = "CASH")]
    mode: PaymentMode,
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PayTarget {
    Purchase,
    Sale,
    Rental,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ContractAction {
    Complete,
    Cancel,
}

#[derive(Subcommand)]
enum VehicleCommand {
    /// Set AVAILABLE, MAINTENANCE or OFFLINE by hand
    Status { id: Uuid, status: VehicleStatus },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = IsokoConfig::load(cli.config.as_deref())?;
    let _guard = init_tracing(&config.log)?;
    execute(cli.command, &config)
}

fn execute(command: Commands, config: &IsokoConfig) -> Result<()> {
    let currency = config.currency_format();
    match command {
        Commands::Quote { command } => {
            println!("{}", quote(command, config)?);
            Ok(())
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Commands::Init => {
            let repo = open_repository(config)?;
            let outcome = repo.ensure_seed(&config.business.name)?;
            if outcome.created {
                println!("created business {} ({})", outcome.business.name, outcome.business.id);
            } else {
                println!(
                    "business {} already exists ({})",
                    outcome.business.name, outcome.business.id
                );
            }
            Ok(())
        }
        Commands::Import { file } => {
            let repo = open_repository(config)?;
            let business_id = business_id(&repo, config)?;
            let bundle = ImportBundle::from_path(&file)?;
            let summary = import_bundle(&repo, business_id, bundle)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Commands::Pay(args) => {
            let repo = open_repository(config)?;
            let business_id = business_id(&repo, config)?;
            let payment_date = args.date.unwrap_or_else(today);
            let (payment_id, settlement, status) = match args.target {
                PayTarget::Purchase | PayTarget::Sale => {
                    let reference_type = match args.target {
                        PayTarget::Sale => PaymentReference::Sale,
                        _ => PaymentReference::Purchase,
                    };
                    let applied = repo.apply_grocery_payment(
                        business_id,
                        NewGroceryPayment {
                            id: None,
                            reference_type,
                            reference_id: args.id,
                            amount: args.amount,
                            payment_date,
                            mode: args.mode,
                            notes: args.notes,
                        },
                    )?;
                    let status = match reference_type {
                        PaymentReference::Sale => applied.settlement.receipt_status().to_string(),
                        PaymentReference::Purchase => {
                            applied.settlement.settlement_status().to_string()
                        }
                    };
                    (applied.payment.id, applied.settlement, status)
                }
                PayTarget::Rental => {
                    let applied = repo.apply_rental_payment(
                        business_id,
                        NewRentalPayment {
                            id: None,
                            contract_id: args.id,
                            amount: args.amount,
                            payment_date,
                            mode: args.mode,
                            notes: args.notes,
                        },
                    )?;
                    let status = applied.settlement.settlement_status().to_string();
                    (applied.payment.id, applied.settlement, status)
                }
            };
            println!("payment {payment_id}");
            println!("{}", render::settlement(&settlement, &status, &currency));
            Ok(())
        }
        Commands::Contract { action, id } => {
            let repo = open_repository(config)?;
            let business_id = business_id(&repo, config)?;
            let contract = match action {
                ContractAction::Complete => repo.complete_contract(business_id, id)?,
                ContractAction::Cancel => repo.cancel_contract(business_id, id)?,
            };
            println!("contract {} {}", contract.id, contract.operational_status);
            Ok(())
        }
        Commands::Vehicle {
            command: VehicleCommand::Status { id, status },
        } => {
            let repo = open_repository(config)?;
            let business_id = business_id(&repo, config)?;
            let vehicle = repo.set_vehicle_status(business_id, id, status)?;
            println!("vehicle {} {}", vehicle.id, vehicle.current_status);
            Ok(())
        }
        Commands::Stock { item } => {
            let repo = open_repository(config)?;
            let business_id = business_id(&repo, config)?;
            let mut query = RecordQuery::for_business(business_id);
            if let Some(item_id) = item {
                query = query.with_item(item_id);
            }
            let snapshot = repo.snapshot(&query)?;
            if let (Some(item_id), true) = (item, snapshot.items.is_empty()) {
                bail!("item {item_id} not found");
            }
            println!("{}", render::stock(&snapshot));
            Ok(())
        }
        Commands::Dashboard { as_of, json } => {
            let repo = open_repository(config)?;
            let business_id = business_id(&repo, config)?;
            let as_of = as_of.unwrap_or_else(today);
            let snapshot = repo.snapshot(&RecordQuery::for_business(business_id))?;
            let options = DashboardOptions {
                trend_points: config.dashboard.trend_points,
                top_vehicles: config.dashboard.top_vehicles,
            };
            let report = DashboardReport::compute(&snapshot, as_of, options);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", render::dashboard(&report, &snapshot, &currency));
            }
            Ok(())
        }
    }
}

fn quote(command: QuoteCommand, config: &IsokoConfig) -> Result<String> {
    let currency = config.currency_format();
    match command {
        QuoteCommand::Purchase(args) => {
            let settlement = quote_goods(args.quantity, args.unit_price, args.paid)?;
            let status = settlement.settlement_status().to_string();
            Ok(render::settlement(&settlement, &status, &currency))
        }
        QuoteCommand::Sale(args) => {
            let settlement = quote_goods(args.quantity, args.unit_price, args.paid)?;
            let status = settlement.receipt_status().to_string();
            Ok(render::settlement(&settlement, &status, &currency))
        }
        QuoteCommand::Rental {
            rental_type,
            rate,
            start,
            end,
            paid,
        } => {
            let settlement = quote_rental(rental_type, rate, start, end, paid)?;
            let units = billed_units(rental_type, start, end);
            let status = settlement.settlement_status().to_string();
            Ok(format!(
                "billed     {units} x {} at {}\n{}",
                rental_type,
                currency.format(rate),
                render::settlement(&settlement, &status, &currency)
            ))
        }
    }
}

fn open_repository(config: &IsokoConfig) -> Result<SqliteLedgerRepository> {
    let path = &config.database.path;
    info!(path = %path.display(), "opening ledger database");
    SqliteLedgerRepository::new(path)
        .with_context(|| format!("failed to open ledger database {}", path.display()))
}

fn business_id(repo: &dyn LedgerRepository, config: &IsokoConfig) -> Result<Uuid> {
    repo.find_business(&config.business.name)?
        .map(|business| business.id)
        .ok_or_else(|| {
            anyhow!(
                "business '{}' is not set up; run `isoko init` first",
                config.business.name
            )
        })
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
