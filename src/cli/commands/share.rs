use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ShareClient;
use crate::cli::utils::{output_success, render_tree};
use crate::cli::OutputFormat;

const DEFAULT_SERVER: &str = "http://localhost:3000";

#[derive(Subcommand)]
pub enum ShareCommands {
    #[command(about = "Freeze the server's current hierarchy behind a public link")]
    Create {
        #[arg(long, help = "Seconds until the link expires (server default if omitted)")]
        ttl: Option<i64>,
        #[command(flatten)]
        conn: Connection,
    },

    #[command(about = "Show the snapshot behind a share token")]
    Show {
        #[arg(help = "Share token")]
        share_token: String,
        #[command(flatten)]
        conn: Connection,
    },

    #[command(about = "Revoke a share token")]
    Revoke {
        #[arg(help = "Share token")]
        share_token: String,
        #[command(flatten)]
        conn: Connection,
    },
}

#[derive(clap::Args)]
pub struct Connection {
    #[arg(long, help = "Server base URL (default: ORGCHART_SERVER or http://localhost:3000)")]
    pub server: Option<String>,

    #[arg(long, help = "JWT for protected calls (default: ORGCHART_TOKEN)")]
    pub token: Option<String>,
}

impl Connection {
    fn client(self) -> anyhow::Result<ShareClient> {
        let server = self
            .server
            .or_else(|| std::env::var("ORGCHART_SERVER").ok())
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        let jwt = self.token.or_else(|| std::env::var("ORGCHART_TOKEN").ok());
        ShareClient::new(&server, jwt)
    }
}

pub async fn handle(cmd: ShareCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ShareCommands::Create { ttl, conn } => {
            let created = conn.client()?.create(ttl).await?;
            output_success(&output_format, &format!("Share link: {}", created.url), &created)?;
            if let OutputFormat::Text = output_format {
                println!("  expires {}", created.expires_at.to_rfc3339());
            }
            Ok(())
        }
        ShareCommands::Show { share_token, conn } => {
            let snapshot = conn.client()?.show(&share_token).await?;
            match output_format {
                OutputFormat::Json => output_success(&output_format, "", &snapshot),
                OutputFormat::Text => {
                    println!(
                        "Snapshot of {} employees taken {} (expires {})",
                        snapshot.statistics.total_employees,
                        snapshot.created_at.to_rfc3339(),
                        snapshot.expires_at.to_rfc3339()
                    );
                    print!("{}", render_tree(&snapshot.forest));
                    Ok(())
                }
            }
        }
        ShareCommands::Revoke { share_token, conn } => {
            conn.client()?.revoke(&share_token).await?;
            output_success(&output_format, "Share link revoked", &json!({ "revoked": true }))
        }
    }
}
