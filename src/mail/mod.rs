use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    config::SmtpConfig,
    error::{AppError, Result},
};

/// Outbound notification sink. Callers treat delivery as best-effort:
/// failures are logged and swallowed, never surfaced to the person booking.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()>;
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpNotifier {
    /// None when the SMTP section is disabled or incomplete; main falls
    /// back to the noop sink.
    pub fn from_config(config: &SmtpConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }

        let host = config.host.clone()?;
        let username = config.username.clone()?;
        let password = config.password.clone()?;
        let from_address = config.from_address.clone()?;
        let from_name = config.from_name.clone().unwrap_or_else(|| "Soiree".to_string());

        let mut builder = match AsyncSmtpTransport::<Tokio1Executor>::relay(&host) {
            Ok(builder) => builder,
            Err(e) => {
                tracing::warn!("Invalid SMTP relay {}: {}", host, e);
                return None;
            }
        };
        if let Some(port) = config.port {
            builder = builder.port(port);
        }

        Some(Self {
            transport: builder
                .credentials(Credentials::new(username, password))
                .build(),
            from: format!("{} <{}>", from_name, from_address),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        let message = Message::builder()
            .from(self.from.parse().map_err(|e| {
                AppError::Mail(format!("Invalid from address: {}", e))
            })?)
            .to(to.parse().map_err(|e| {
                AppError::Mail(format!("Invalid recipient {}: {}", to, e))
            })?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| AppError::Mail(format!("Failed to build message: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(format!("SMTP send failed: {}", e)))?;

        Ok(())
    }
}

/// Stands in when SMTP isn't configured; bookings work, mail just doesn't go out.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn send(&self, to: &str, subject: &str, _html_body: &str) -> Result<()> {
        tracing::debug!("Mail disabled; dropping \"{}\" to {}", subject, to);
        Ok(())
    }
}

/// Captures outbound mail for assertions instead of delivering it.
#[cfg(any(test, feature = "test-utils"))]
pub struct RecordingNotifier {
    pub sent: std::sync::Mutex<Vec<(String, String, String)>>,
    pub fail: std::sync::atomic::AtomicBool,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: std::sync::Mutex::new(Vec::new()),
            fail: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn sent_subjects(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, s, _)| s.clone()).collect()
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AppError::Mail("simulated delivery failure".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html_body.to_string()));
        Ok(())
    }
}
