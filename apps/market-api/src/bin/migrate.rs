//! Standalone migration runner for market-api.
//!
//! Usage:
//!   cargo run -p market-api --bin market-migrate
//!   cargo run -p market-api --bin market-migrate -- --test
//!   cargo run -p market-api --bin market-migrate -- --revert
//!
//! Reads DATABASE_URL from the environment (or .env via dotenvy).

use std::path::Path;

use diesel::pg::PgConnection;
use diesel::Connection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

fn main() {
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path(Path::new(env!("CARGO_MANIFEST_DIR")).join(".env"));
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let use_test_db = args.iter().any(|a| a == "--test");
    let revert = args.iter().any(|a| a == "--revert");

    let mut database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL env var is required");
    if use_test_db {
        database_url = test_database_url(&database_url);
    }

    let mut conn =
        PgConnection::establish(&database_url).expect("failed to connect to database");

    if revert {
        let reverted = conn
            .revert_last_migration(MIGRATIONS)
            .expect("failed to revert migration");
        println!("Reverted: {reverted}");
        return;
    }

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .expect("failed to run migrations");
    if applied.is_empty() {
        println!("Schema is up to date.");
    }
    for version in &applied {
        println!("Applied: {version}");
    }
}

/// Point `url` at the `<name>_test` database, keeping any query string.
fn test_database_url(url: &str) -> String {
    let (base, query) = match url.split_once('?') {
        Some((b, q)) => (b, Some(q)),
        None => (url, None),
    };
    let Some((host, db_name)) = base.rsplit_once('/') else {
        return url.to_string();
    };
    if db_name.is_empty() || db_name.ends_with("_test") {
        return url.to_string();
    }

    let mut out = format!("{host}/{db_name}_test");
    if let Some(q) = query {
        out.push('?');
        out.push_str(q);
    }
    out
}
