use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::StatusCode;

use orgchart_api::auth::{generate_jwt_with_secret, Claims};

pub const JWT_SECRET: &str = "integration-test-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let fixture = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/employees.json");

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_orgchart-api"));
        cmd.env("APP_ENV", "development")
            .env("ORGCHART_PORT", port.to_string())
            .env("ORGCHART_PUBLIC_BASE_URL", format!("{}/", base_url))
            .env("ORGCHART_EMPLOYEES_FILE", fixture)
            .env("ORGCHART_JWT_SECRET", JWT_SECRET)
            .env("SHARE_STORE_PATH", "")
            .env_remove("DATABASE_URL")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Bearer token the spawned server accepts.
pub fn jwt() -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        user: "tester".to_string(),
        access: "full".to_string(),
        exp: now + 3600,
        iat: now,
    };
    Ok(generate_jwt_with_secret(&claims, JWT_SECRET)?)
}
