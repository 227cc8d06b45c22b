//! Grants the admin role to an existing account.
//!
//! ```bash
//! DATABASE_URL=postgresql://localhost/dailyreport promote-admin --email ada@example.com
//! ```

use clap::Parser;
use dailyreport_shared::db::{
    migrations::run_migrations,
    pool::{close_pool, create_pool, DatabaseConfig},
};
use dailyreport_shared::services::{TokenSettings, UserService};
use dailyreport_shared::store::postgres::PgStore;
use std::sync::Arc;

/// Promote a user to admin.
#[derive(Parser)]
#[command(name = "promote-admin", version)]
struct Args {
    /// Email of the account to promote.
    #[arg(short, long)]
    email: String,

    /// PostgreSQL connection string.
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dailyreport_shared=info".into()),
        )
        .init();

    let args = Args::parse();

    let pool = create_pool(DatabaseConfig::with_url(args.database_url)).await?;
    run_migrations(&pool).await?;

    // No tokens are issued here, the secret is never read.
    let users = UserService::new(
        Arc::new(PgStore::new(pool.clone())),
        TokenSettings {
            secret: String::new(),
            expiration_hours: 24,
        },
    );

    let promoted = users.promote_to_admin(&args.email).await;
    close_pool(pool).await;

    match promoted? {
        Some(user) => println!("{} ({}) is now an admin", user.name, user.email),
        None => {
            println!("No user with email {}", args.email);
            std::process::exit(1);
        }
    }

    Ok(())
}
