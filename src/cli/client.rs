use std::time::Duration;

use anyhow::{anyhow, Context};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use url::Url;

use crate::api::{ShareCreated, SnapshotView};

/// Thin HTTP client for the share endpoints of a running server.
pub struct ShareClient {
    http: Client,
    base: Url,
    jwt: Option<String>,
}

impl ShareClient {
    pub fn new(server: &str, jwt: Option<String>) -> anyhow::Result<Self> {
        let mut server = server.to_string();
        if !server.ends_with('/') {
            server.push('/');
        }

        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base: Url::parse(&server).with_context(|| format!("invalid server URL '{}'", server))?,
            jwt,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        Ok(self.base.join(path)?)
    }

    fn authorized(&self, request: RequestBuilder) -> anyhow::Result<RequestBuilder> {
        let jwt = self
            .jwt
            .as_deref()
            .ok_or_else(|| anyhow!("this command needs a JWT (--token or ORGCHART_TOKEN)"))?;
        Ok(request.bearer_auth(jwt))
    }

    pub async fn create(&self, ttl_secs: Option<i64>) -> anyhow::Result<ShareCreated> {
        let request = self.http.post(self.url("api/share")?).json(&json!({ "ttl_secs": ttl_secs }));
        let response = self.authorized(request)?.send().await?;
        unwrap_envelope(response).await
    }

    pub async fn show(&self, share_token: &str) -> anyhow::Result<SnapshotView> {
        let response = self
            .http
            .get(self.url(&format!("public/share/{}", share_token))?)
            .send()
            .await?;
        unwrap_envelope(response).await
    }

    pub async fn revoke(&self, share_token: &str) -> anyhow::Result<()> {
        let request = self.http.delete(self.url(&format!("api/share/{}", share_token))?);
        let response = self.authorized(request)?.send().await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        Err(envelope_error(response).await)
    }
}

async fn unwrap_envelope<T: DeserializeOwned>(response: Response) -> anyhow::Result<T> {
    if !response.status().is_success() {
        return Err(envelope_error(response).await);
    }

    let mut body: Value = response.json().await?;
    let data = body
        .get_mut("data")
        .map(Value::take)
        .ok_or_else(|| anyhow!("response has no data field"))?;
    Ok(serde_json::from_value(data)?)
}

async fn envelope_error(response: Response) -> anyhow::Error {
    let status = response.status();
    match response.json::<Value>().await {
        Ok(body) => anyhow!(
            "{} ({}): {}",
            status,
            body["code"].as_str().unwrap_or("UNKNOWN"),
            body["error"].as_str().unwrap_or("no message")
        ),
        Err(_) => anyhow!("server answered {}", status),
    }
}
