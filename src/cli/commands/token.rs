use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::JwtKeys;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::types::{Caller, Role};

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "User (profile) id")]
    pub user: Uuid,
    #[arg(long, help = "Organization id")]
    pub org: Uuid,
    #[arg(long, default_value = "manager", help = "manager or leader")]
    pub role: Role,
    #[arg(long, help = "Override the configured lifetime in hours")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let hours = args.hours.unwrap_or(config.security.jwt_expiry_hours);
    let keys = JwtKeys::new(&config.security.jwt_secret, hours)?;
    let caller = Caller::new(args.user, args.org, args.role);
    let token = keys.issue(&caller)?;

    match output_format {
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
        OutputFormat::Json => output_success(
            &output_format,
            "Token issued",
            Some(json!({ "token": token, "expires_in_hours": hours, "caller": caller })),
        ),
    }
}
