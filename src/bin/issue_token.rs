//! Dev tool: mint a bearer token signed with `JWT_SECRET`.
//!
//! Usage: `issue_token [--wallet 0x...] [--role admin|employer|viewer] [--hours N]`

use std::env;

use anyhow::{Context, Result, bail};
use chrono::Duration;
use secrecy::SecretString;
use web3_payroll_api::api::{Role, TokenVerifier, WALLET_HEADER};

const DEV_WALLET: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args: Vec<String> = env::args().collect();

    let secret = env::var("JWT_SECRET").context("JWT_SECRET must be set to sign tokens")?;
    if secret.is_empty() {
        bail!("JWT_SECRET is empty");
    }

    let wallet = arg_value(&args, "--wallet").unwrap_or_else(|| DEV_WALLET.to_string());
    let role: Role = arg_value(&args, "--role")
        .as_deref()
        .unwrap_or("employer")
        .parse()?;
    let hours: i64 = arg_value(&args, "--hours")
        .map(|h| h.parse())
        .transpose()
        .context("--hours must be an integer")?
        .unwrap_or(24);

    let verifier = TokenVerifier::new(SecretString::from(secret));
    let token = verifier.issue(&wallet, role, Duration::hours(hours))?;

    println!(" Wallet: {}", wallet);
    println!(" Role:   {}", role);
    println!(" Valid:  {}h", hours);
    println!("\n--------------------------------------------------\n");
    println!("{}", token);
    println!("\nExample request:\n");
    println!(
        "curl 'http://localhost:3000/api/employees' \\\n  -H 'Authorization: Bearer {}'",
        token
    );
    println!(
        "\nOr act as the wallet without a token:\n\ncurl 'http://localhost:3000/api/companies/me' \\\n  -H '{}: {}'",
        WALLET_HEADER, wallet
    );
    Ok(())
}
