use anyhow::Context;
use serde_json::json;

use crate::auth::JwtKeys;
use crate::cli::OutputFormat;
use crate::config;

pub fn handle(username: &str, admin: bool, output_format: OutputFormat) -> anyhow::Result<()> {
    let security = &config::config().security;
    let keys = JwtKeys::from_config(security).context("SECRET_KEY is not configured")?;
    let token = keys.create_token(username, admin)?;

    match output_format {
        OutputFormat::Json => {
            let out = json!({
                "token": token,
                "username": username,
                "isAdmin": admin,
                "expires_in_hours": security.jwt_expiry_hours
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}
