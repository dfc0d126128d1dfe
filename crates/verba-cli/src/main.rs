use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use verba_core::{ScopeKind, TriggerKind};
use verba_etl::{ingest_range, EtlConfig, IngestParams};
use verba_storage::DbConfig;

/// The eleven-unit default scope of the ingestion.
const DEFAULT_CODES: &str =
    "158454,158148,158341,158342,158343,158345,158376,158332,158533,158635,158636";

#[derive(Debug, Parser)]
#[command(name = "verba")]
#[command(about = "Transparency-portal expense warehouse")]
struct Cli {
    /// Log level: debug, info, warn, error
    #[arg(long, default_value = "info", global = true)]
    loglevel: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Ingest daily expense bundles for a date range
    Ingest {
        /// Inclusive start date, YYYY-MM-DD (default: yesterday)
        #[arg(long)]
        init: Option<String>,
        /// Inclusive end date, YYYY-MM-DD (default: yesterday)
        #[arg(long)]
        end: Option<String>,
        /// Comma-separated unit codes to ingest
        #[arg(long, default_value = DEFAULT_CODES)]
        codes: String,
        /// Interpret codes as management codes instead of unit codes
        #[arg(long, alias = "byManagingCode", default_value_t = false)]
        by_managing_code: bool,
        /// Trigger source: MANUAL, SCHEDULED
        #[arg(long, default_value = "MANUAL")]
        trigger: String,
        /// Number of concurrent workers
        #[arg(long, default_value_t = 10)]
        concurrency: usize,
    },
    /// Serve the read-only report API
    Serve,
    /// Apply database migrations
    Migrate,
    /// Run the cron-driven daily ingestion loop
    Schedule {
        #[arg(long, default_value = DEFAULT_CODES)]
        codes: String,
        #[arg(long, alias = "byManagingCode", default_value_t = false)]
        by_managing_code: bool,
        #[arg(long, default_value_t = 10)]
        concurrency: usize,
    },
}

fn init_tracing(loglevel: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(loglevel.to_string()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn parse_date(raw: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid {flag} date {raw:?} (expected YYYY-MM-DD)"))
}

fn parse_codes(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .with_context(|| format!("invalid code {part:?}"))
        })
        .collect()
}

fn yesterday() -> NaiveDate {
    chrono::Utc::now().date_naive() - chrono::Duration::days(1)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.loglevel);

    let db_config = DbConfig::from_env();

    match cli.command {
        Commands::Ingest {
            init,
            end,
            codes,
            by_managing_code,
            trigger,
            concurrency,
        } => {
            let start_date = match init {
                Some(raw) => parse_date(&raw, "init")?,
                None => yesterday(),
            };
            let end_date = match end {
                Some(raw) => parse_date(&raw, "end")?,
                None => yesterday(),
            };
            let codes = parse_codes(&codes)?;
            let trigger = TriggerKind::parse(&trigger)?;
            let scope = if by_managing_code {
                ScopeKind::Management
            } else {
                ScopeKind::ManagementUnit
            };

            let pool = verba_storage::connect(&db_config)
                .await
                .context("connecting to the warehouse")?;
            let stats = ingest_range(
                pool,
                EtlConfig::from_env(),
                IngestParams {
                    start_date,
                    end_date,
                    codes,
                    scope,
                    trigger,
                    concurrency,
                },
            )
            .await?;
            println!(
                "ingestion complete: succeeded={} skipped={} failed={} retried={}",
                stats.succeeded, stats.skipped, stats.failed, stats.retried
            );
        }
        Commands::Serve => {
            let addr =
                std::env::var("VERBA_HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
            let pool = verba_storage::connect(&db_config)
                .await
                .context("connecting to the warehouse")?;
            verba_web::serve(pool, &addr).await?;
        }
        Commands::Migrate => {
            let pool = verba_storage::connect(&db_config)
                .await
                .context("connecting to the warehouse")?;
            verba_storage::MIGRATOR
                .run(&pool)
                .await
                .context("applying migrations")?;
            println!("migrations applied");
        }
        Commands::Schedule {
            codes,
            by_managing_code,
            concurrency,
        } => {
            let codes = parse_codes(&codes)?;
            let scope = if by_managing_code {
                ScopeKind::Management
            } else {
                ScopeKind::ManagementUnit
            };
            let pool = verba_storage::connect(&db_config)
                .await
                .context("connecting to the warehouse")?;
            let _scheduler = verba_etl::schedule::start_daily(
                pool,
                EtlConfig::from_env(),
                codes,
                scope,
                concurrency,
            )
            .await?;
            println!("scheduler running; press ctrl-c to stop");
            tokio::signal::ctrl_c().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_codes_parse_to_the_eleven_unit_set() {
        let codes = parse_codes(DEFAULT_CODES).unwrap();
        assert_eq!(codes.len(), 11);
        assert_eq!(codes[0], 158454);
        assert_eq!(codes[10], 158636);
    }

    #[test]
    fn bad_codes_and_dates_fail_startup() {
        assert!(parse_codes("158454,abc").is_err());
        assert!(parse_date("16/01/2025", "init").is_err());
        assert!(parse_date("2025-01-16", "init").is_ok());
    }
}
