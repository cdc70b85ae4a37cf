use clap::Args;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(help = "User name recorded in the token")]
    pub user: String,

    #[arg(long, default_value = "full", help = "Access level claim")]
    pub access: String,
}

/// Signs with ORGCHART_JWT_SECRET from the local environment, so the token is
/// only accepted by servers sharing that secret.
pub async fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let claims = Claims::new(args.user, args.access);
    let jwt = generate_jwt(&claims)?;

    match output_format {
        OutputFormat::Json => crate::cli::utils::output_json(&json!({ "token": jwt, "expires_at": claims.exp })),
        OutputFormat::Text => {
            println!("{}", jwt);
            Ok(())
        }
    }
}
