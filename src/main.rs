use std::net::Ipv4Addr;
use std::time::Duration as StdDuration;

use anyhow::Context;
use chrono::{Duration, Local};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

use gazette::auth::JwtConfig;
use gazette::mail::{SmtpConfig, SmtpMailer};
use gazette::mailing::{MailingRunner, MailingScheduler, PgMailingRepo};
use gazette::stats::StatsCache;
use gazette::{routes, serve, AppState, Config, EnvConfig};

#[derive(Parser)]
#[command(name = "gazette", about = "Scheduled newsletter delivery service", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and, unless disabled, the mailing scheduler (default)
    Serve,
    /// Execute one mailing pass for newsletters due today, then exit
    RunMailings,
    /// Apply pending database migrations, then exit
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;

    let db = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .context("connecting to postgres")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve_app(config, db).await,
        Commands::RunMailings => run_mailings(db).await,
        Commands::Migrate => {
            sqlx::migrate!()
                .run(&db)
                .await
                .context("running migrations")?;
            Ok(())
        }
    }
}

async fn serve_app(config: Config, db: PgPool) -> anyhow::Result<()> {
    sqlx::migrate!()
        .run(&db)
        .await
        .context("running migrations")?;

    let jwt = JwtConfig::new(&config.hmac_key)
        .ttl(Duration::hours(config.token_ttl_hours))
        .cookie_secure(config.cookie_secure)
        .build();
    let stats = StatsCache::new(
        StdDuration::from_secs(config.cache_ttl_secs),
        config.cache_enabled,
    );

    if config.scheduler_enabled {
        let runner = MailingRunner::new(PgMailingRepo::new(db.clone()), smtp_mailer()?);
        MailingScheduler::new(runner, &config.mailing_cron)?.start();
    } else {
        tracing::info!("mailing scheduler disabled");
    }

    let state = AppState { db, jwt, stats };
    let app = routes::router(state);

    serve((Ipv4Addr::UNSPECIFIED, config.port), app).await?;

    Ok(())
}

async fn run_mailings(db: PgPool) -> anyhow::Result<()> {
    let runner = MailingRunner::new(PgMailingRepo::new(db), smtp_mailer()?);
    let summary = runner.run_due(Local::now().naive_local()).await?;

    tracing::info!(
        processed = summary.processed,
        sent = summary.sent,
        failed = summary.failed,
        skipped = summary.skipped,
        "mailing pass finished",
    );

    Ok(())
}

fn smtp_mailer() -> anyhow::Result<SmtpMailer> {
    let smtp = SmtpConfig::from_env().context("loading SMTP configuration")?;
    Ok(SmtpMailer::from_config(smtp)?)
}
