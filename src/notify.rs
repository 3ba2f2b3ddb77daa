//! Push notifications sent by the contact tools.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::PushoverConfig;

const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

/// Delivers a short text notification to the persona owner.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> anyhow::Result<()>;
}

/// Sends notifications through the Pushover API.
pub struct PushoverNotifier {
    config: PushoverConfig,
    url: String,
    client: reqwest::Client,
}

impl PushoverNotifier {
    pub fn new(config: PushoverConfig) -> anyhow::Result<Self> {
        Self::with_url(config, PUSHOVER_URL)
    }

    /// Post to `url` instead of the public Pushover endpoint.
    pub fn with_url(config: PushoverConfig, url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            config,
            url: url.into(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn notify(&self, text: &str) -> anyhow::Result<()> {
        tracing::info!("Push: {}", text);

        let response = self
            .client
            .post(&self.url)
            .form(&[
                ("token", self.config.token.as_str()),
                ("user", self.config.user.as_str()),
                ("message", text),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Pushover returned {}: {}", status, body));
        }
        Ok(())
    }
}

/// Writes notifications to the log only.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) -> anyhow::Result<()> {
        tracing::info!("Push (not delivered, Pushover not configured): {}", text);
        Ok(())
    }
}

/// Pushover when credentials are configured, log-only otherwise.
pub fn notifier_from_config(pushover: Option<&PushoverConfig>) -> anyhow::Result<Arc<dyn Notifier>> {
    Ok(match pushover {
        Some(config) => Arc::new(PushoverNotifier::new(config.clone())?),
        None => {
            tracing::warn!("PUSHOVER_TOKEN/PUSHOVER_USER not set, notifications will only be logged");
            Arc::new(LogNotifier)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn credentials() -> PushoverConfig {
        PushoverConfig {
            token: "app-token".to_string(),
            user: "user-key".to_string(),
        }
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        let notifier = notifier_from_config(None).unwrap();
        notifier.notify("hello").await.unwrap();
    }

    #[tokio::test]
    async fn pushover_posts_token_user_and_message_as_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/1/messages.json")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::AllOf(vec![
                Matcher::UrlEncoded("token".into(), "app-token".into()),
                Matcher::UrlEncoded("user".into(), "user-key".into()),
                Matcher::UrlEncoded("message".into(), "Recording Ada & co".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"status":1}"#)
            .create_async()
            .await;

        let notifier =
            PushoverNotifier::with_url(credentials(), format!("{}/1/messages.json", server.url())).unwrap();
        notifier.notify("Recording Ada & co").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn pushover_rejection_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/1/messages.json")
            .with_status(400)
            .with_body(r#"{"errors":["application token is invalid"]}"#)
            .create_async()
            .await;

        let notifier =
            PushoverNotifier::with_url(credentials(), format!("{}/1/messages.json", server.url())).unwrap();
        let err = notifier.notify("hello").await.unwrap_err();

        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("application token is invalid"));
    }
}
