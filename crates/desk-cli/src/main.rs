use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use desk_core::{
    seed, HoldingStore, OrderSettlement, OrderStore, OrderTicket, PositionStore,
};
use desk_db::PgStore;

#[derive(Parser)]
#[command(name = "desk")]
#[command(about = "Brokerage desk operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Insert the demo dataset (fails if any row already exists)
    Seed {
        #[arg(value_enum)]
        table: SeedTable,
    },

    /// Print a table as JSON lines
    List {
        #[arg(value_enum)]
        table: ListTable,
    },

    /// Settle one order against the database
    Order {
        /// Instrument symbol, e.g. INFY
        #[arg(long)]
        name: String,

        #[arg(long, allow_negative_numbers = true)]
        qty: i64,

        #[arg(long, allow_negative_numbers = true)]
        price: f64,

        /// BUY | SELL
        #[arg(long)]
        mode: String,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply SQL migrations.
    Migrate,
}

#[derive(Clone, Copy, ValueEnum)]
enum SeedTable {
    Holdings,
    Positions,
}

#[derive(Clone, Copy, ValueEnum)]
enum ListTable {
    Holdings,
    Positions,
    Orders,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => {
            let pool = desk_db::connect_from_env().await?;
            match cmd {
                DbCmd::Status => {
                    let s = desk_db::status(&pool).await?;
                    println!("db_ok={} has_holdings_table={}", s.ok, s.has_holdings_table);
                }
                DbCmd::Migrate => {
                    desk_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::Seed { table } => {
            let store = store_from_env().await?;
            match table {
                SeedTable::Holdings => {
                    let batch = seed::demo_holdings();
                    store
                        .insert_holdings(&batch)
                        .await
                        .context("seeding holdings failed")?;
                    println!("holdings_seeded={}", batch.len());
                }
                SeedTable::Positions => {
                    let batch = seed::demo_positions();
                    store
                        .insert_positions(&batch)
                        .await
                        .context("seeding positions failed")?;
                    println!("positions_seeded={}", batch.len());
                }
            }
        }

        Commands::List { table } => {
            let store = store_from_env().await?;
            match table {
                ListTable::Holdings => {
                    for row in store.list_holdings().await? {
                        println!("{}", serde_json::to_string(&row)?);
                    }
                }
                ListTable::Positions => {
                    for row in store.list_positions().await? {
                        println!("{}", serde_json::to_string(&row)?);
                    }
                }
                ListTable::Orders => {
                    for row in store.list_orders().await? {
                        println!("{}", serde_json::to_string(&row)?);
                    }
                }
            }
        }

        Commands::Order {
            name,
            qty,
            price,
            mode,
        } => {
            // Validate before touching the database.
            let ticket = OrderTicket::from_wire(&name, qty, price, &mode)?;

            let store = store_from_env().await?;
            let settlement = OrderSettlement::new(store);
            let outcome = settlement.submit_order(&ticket).await?;

            println!("order_name={}", outcome.order.name);
            println!("order_mode={}", outcome.order.mode);
            println!("order_qty={}", outcome.order.qty);
            println!("order_price={}", outcome.order.price);
            match outcome.holding {
                Some(h) => {
                    println!("holding_qty={}", h.qty);
                    println!("holding_avg={}", h.avg);
                    println!("holding_price={}", h.price);
                }
                None => println!("holding_closed=true"),
            }
        }
    }

    Ok(())
}

async fn store_from_env() -> Result<Arc<PgStore>> {
    let pool = desk_db::connect_from_env().await?;
    desk_db::migrate(&pool).await?;
    tracing::debug!("database connected and migrated");
    Ok(Arc::new(PgStore::new(pool)))
}

/// Logs go to stderr; stdout carries only the key=value result lines.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}
