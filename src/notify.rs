//! Outbound patient/doctor notifications (SMS and email).
//!
//! The provider sits behind the [`Notifier`] trait so handlers and tests
//! never touch the wire directly. Booking and registration confirmations are
//! dispatched post-commit via [`dispatch_sms`], best effort, logged on
//! failure, never gating the primary write. OTP delivery is the exception:
//! its failure is surfaced to the caller, because a code the user never
//! received is a dead end.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification provider not configured")]
    NotConfigured,

    #[error("provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("provider returned status {0}")]
    Status(reqwest::StatusCode),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), NotifyError>;
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Notifier backed by HTTP provider APIs, with an explicit request timeout.
pub struct HttpNotifier {
    client: reqwest::Client,
    sms_url: Option<String>,
    sms_key: Option<String>,
    sms_from: Option<String>,
    email_url: Option<String>,
    email_key: Option<String>,
    email_from: Option<String>,
}

impl HttpNotifier {
    pub fn from_config(config: &Config) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.provider_timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            sms_url: config.sms_api_url.clone(),
            sms_key: config.sms_api_key.clone(),
            sms_from: config.sms_from.clone(),
            email_url: config.email_api_url.clone(),
            email_key: config.email_api_key.clone(),
            email_from: config.email_from.clone(),
        }
    }

    async fn post(
        &self,
        url: &Option<String>,
        key: &Option<String>,
        payload: serde_json::Value,
    ) -> Result<(), NotifyError> {
        let url = url.as_deref().ok_or(NotifyError::NotConfigured)?;
        let mut req = self.client.post(url).json(&payload);
        if let Some(key) = key {
            req = req.bearer_auth(key);
        }
        let response = req.send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), NotifyError> {
        self.post(
            &self.sms_url,
            &self.sms_key,
            json!({ "from": self.sms_from, "to": to, "body": body }),
        )
        .await
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.post(
            &self.email_url,
            &self.email_key,
            json!({ "from": self.email_from, "to": to, "subject": subject, "body": body }),
        )
        .await
    }
}

/// Fire-and-forget SMS: spawned off the request path, failures logged.
pub fn dispatch_sms(notifier: Arc<dyn Notifier>, to: String, body: String) {
    tokio::spawn(async move {
        if let Err(e) = notifier.send_sms(&to, &body).await {
            tracing::warn!(error = %e, "best-effort SMS dispatch failed");
        }
    });
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    pub enum Sent {
        Sms { to: String, body: String },
        Email { to: String, subject: String, body: String },
    }

    /// Records every message instead of sending it; can be told to fail.
    pub struct RecordingNotifier {
        pub sent: Mutex<Vec<Sent>>,
        pub fail: std::sync::atomic::AtomicBool,
    }

    impl RecordingNotifier {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
                fail: std::sync::atomic::AtomicBool::new(false),
            })
        }

        fn should_fail(&self) -> bool {
            self.fail.load(std::sync::atomic::Ordering::SeqCst)
        }

        pub fn sent_messages(&self) -> Vec<Sent> {
            self.sent.lock().map(|v| v.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send_sms(&self, to: &str, body: &str) -> Result<(), NotifyError> {
            if self.should_fail() {
                return Err(NotifyError::NotConfigured);
            }
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(Sent::Sms {
                    to: to.to_string(),
                    body: body.to_string(),
                });
            }
            Ok(())
        }

        async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
            if self.should_fail() {
                return Err(NotifyError::NotConfigured);
            }
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(Sent::Email {
                    to: to.to_string(),
                    subject: subject.to_string(),
                    body: body.to_string(),
                });
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{RecordingNotifier, Sent};
    use super::*;

    #[tokio::test]
    async fn unconfigured_provider_reports_not_configured() {
        let notifier = HttpNotifier::from_config(&Config::default());
        let err = notifier.send_sms("+919876543210", "hello").await.unwrap_err();
        assert!(matches!(err, NotifyError::NotConfigured));
        let err = notifier.send_email("a@example.org", "s", "b").await.unwrap_err();
        assert!(matches!(err, NotifyError::NotConfigured));
    }

    #[tokio::test]
    async fn dispatch_swallows_provider_failure() {
        let recorder = RecordingNotifier::new();
        recorder.fail.store(true, std::sync::atomic::Ordering::SeqCst);

        dispatch_sms(recorder.clone(), "+919876543210".into(), "hi".into());
        tokio::task::yield_now().await;
        // Nothing recorded, nothing panicked; the failure stayed contained
        assert!(recorder.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn dispatch_delivers_when_provider_works() {
        let recorder = RecordingNotifier::new();
        dispatch_sms(recorder.clone(), "+919876543210".into(), "hi".into());

        // The spawned task needs a beat to run
        for _ in 0..50 {
            if !recorder.sent_messages().is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        assert_eq!(
            recorder.sent_messages(),
            vec![Sent::Sms {
                to: "+919876543210".into(),
                body: "hi".into()
            }]
        );
    }
}
