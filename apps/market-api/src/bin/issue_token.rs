//! Mint a bearer token for local development.
//!
//! Usage:
//!   cargo run -p market-api --bin issue-token -- <user_id> <customer|seller|admin> [ttl_secs]
//!
//! Signs with JWT_SECRET from the environment (or .env via dotenvy), so the
//! token is accepted by a server running with the same secret.

use std::path::Path;
use std::process::ExitCode;

use chrono::Duration;
use market_api::auth::principal::Principal;
use market_api::auth::tokens::{TokenVerifier, DEFAULT_TOKEN_TTL_SECS};
use market_common::Role;

fn main() -> ExitCode {
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path(Path::new(env!("CARGO_MANIFEST_DIR")).join(".env"));
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (user_id, role) = match args.as_slice() {
        [user_id, role, ..] => (user_id, role),
        _ => {
            eprintln!("usage: issue-token <user_id> <customer|seller|admin> [ttl_secs]");
            return ExitCode::FAILURE;
        }
    };
    let role: Role = match role.parse() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let ttl_secs = match args.get(2).map(|s| s.parse::<i64>()) {
        None => DEFAULT_TOKEN_TTL_SECS,
        Some(Ok(secs)) if secs > 0 => secs,
        Some(_) => {
            eprintln!("ttl_secs must be a positive integer");
            return ExitCode::FAILURE;
        }
    };

    let Ok(secret) = std::env::var("JWT_SECRET") else {
        eprintln!("JWT_SECRET env var is required");
        return ExitCode::FAILURE;
    };

    let principal = Principal::new(user_id.as_str(), role);
    match TokenVerifier::new(&secret).mint(&principal, Duration::seconds(ttl_secs)) {
        Ok(token) => {
            println!("{token}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
