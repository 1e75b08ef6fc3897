//! Schema runner: `migration [up [N] | down [N] | fresh | refresh | reset | status]`.
//!
//! The database comes from `DATABASE_URL`, defaulting to the file the app
//! uses out of the box.

use migration::Migrator;
use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_DATABASE_URL: &str = "sqlite:./sample_app.db?mode=rwc";
const USAGE: &str = "Usage: migration [up [N]|down [N]|fresh|refresh|reset|status]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut args = std::env::args().skip(1);
    let cmd = args.next().unwrap_or_else(|| "up".to_string());
    let steps = match args.next().map(|n| n.parse::<u32>()) {
        Some(Ok(n)) => Some(n),
        Some(Err(_)) => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
        None => None,
    };

    let db_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let db = Database::connect(&db_url).await?;

    match cmd.as_str() {
        "up" => Migrator::up(&db, steps).await?,
        // Without a count, roll back only the latest migration.
        "down" => Migrator::down(&db, Some(steps.unwrap_or(1))).await?,
        "fresh" => Migrator::fresh(&db).await?,
        "refresh" => Migrator::refresh(&db).await?,
        "reset" => Migrator::reset(&db).await?,
        "status" => Migrator::status(&db).await?,
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}
