//! Friendbot funding

use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;

#[async_trait]
pub trait Faucet: Send + Sync {
    /// Request test funds for an account
    async fn fund(&self, public_key: &str) -> Result<()>;
}

pub struct FriendbotFaucet {
    client: Client,
    url: String,
}

impl FriendbotFaucet {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Faucet for FriendbotFaucet {
    async fn fund(&self, public_key: &str) -> Result<()> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("addr", public_key)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::info!(public_key, "Account funded by friendbot");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if is_already_funded(&body) {
            tracing::debug!(public_key, "Account already funded");
            return Ok(());
        }

        Err(Error::Faucet(format!("friendbot returned {}: {}", status, body.trim())))
    }
}

/// Friendbot rejects a second funding of an existing account
fn is_already_funded(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    lower.contains("createaccountalreadyexist") || lower.contains("already funded")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_already_funded_body() {
        let body = r#"{"title":"Transaction Failed","extras":{"result_codes":{"operations":["op_already_exists"]},"result_xdr":"createAccountAlreadyExist"}}"#;
        assert!(is_already_funded(body));
        assert!(!is_already_funded(r#"{"title":"Bad Request"}"#));
    }
}
