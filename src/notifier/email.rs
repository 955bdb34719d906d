// notifier/email.rs

use crate::config::{Credentials, EmailConfig};
use crate::model::{MatchRecord, NotifyError};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials as SmtpCredentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::info;

const BODY_HEADER: &str = "Die folgenden neuen Übereinstimmungen wurden gefunden:\n\n";

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Sends one digest for all `matches`.
    async fn notify(&self, matches: &[MatchRecord]) -> Result<(), NotifyError>;
}

pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    subject: String,
}

impl EmailNotifier {
    /// Parses addresses and prepares the SMTP relay; no connection is opened.
    pub fn new(cfg: &EmailConfig, creds: &Credentials) -> Result<Self, NotifyError> {
        let from: Mailbox = creds.email_address.parse()?;
        let to: Mailbox = match &cfg.recipient {
            Some(r) => r.parse()?,
            None => from.clone(),
        };

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)?
            .port(cfg.smtp_port)
            .credentials(SmtpCredentials::new(
                creds.email_address.clone(),
                creds.email_password.clone(),
            ))
            .timeout(Some(Duration::from_secs(cfg.timeout_secs)))
            .build();

        Ok(Self {
            transport,
            from,
            to,
            subject: cfg.subject.clone(),
        })
    }

    fn message(&self, matches: &[MatchRecord]) -> Result<Message, NotifyError> {
        Ok(Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(compose_body(matches))?)
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, matches: &[MatchRecord]) -> Result<(), NotifyError> {
        let message = self.message(matches)?;
        info!("📤 Sending digest with {} matches to {}", matches.len(), self.to);
        self.transport.send(message).await?;
        info!("✅ Email sent!");
        Ok(())
    }
}

/// Plain-text digest: title and link per match. The date is not part of it.
pub fn compose_body(matches: &[MatchRecord]) -> String {
    let mut body = String::from(BODY_HEADER);
    for m in matches {
        body.push_str(&format!("Title: {}\nLink: {}\n\n", m.title, m.link));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn creds(address: &str) -> Credentials {
        Credentials {
            api_token: "t".into(),
            email_address: address.into(),
            email_password: "p".into(),
        }
    }

    fn record(title: &str, date: &str, link: &str) -> MatchRecord {
        MatchRecord {
            title: title.into(),
            date: date.into(),
            link: link.into(),
            result: json!({"scores": [0.9]}),
        }
    }

    #[test]
    fn body_lists_title_and_link_only() {
        let body = compose_body(&[
            record("Catering Ausschreibung Schule", "01.02.2025", "XYZ"),
            record("Mittagessen Kita", "", "ABC"),
        ]);

        assert_eq!(
            body,
            "Die folgenden neuen Übereinstimmungen wurden gefunden:\n\n\
             Title: Catering Ausschreibung Schule\nLink: XYZ\n\n\
             Title: Mittagessen Kita\nLink: ABC\n\n"
        );
        assert!(!body.contains("01.02.2025"));
    }

    #[tokio::test]
    async fn recipient_defaults_to_sender() {
        let notifier =
            EmailNotifier::new(&EmailConfig::default(), &creds("bot@example.org")).unwrap();
        assert_eq!(notifier.to.email.to_string(), "bot@example.org");
        assert_eq!(notifier.subject, "Neue Ausschreibungen verfügbar!!");
    }

    #[tokio::test]
    async fn message_has_fixed_subject_and_recipient() {
        let cfg = EmailConfig {
            recipient: Some("einkauf@example.org".into()),
            ..EmailConfig::default()
        };
        let notifier = EmailNotifier::new(&cfg, &creds("bot@example.org")).unwrap();
        let message = notifier.message(&[record("T", "", "L")]).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("To: einkauf@example.org"));
        assert!(raw.contains("From: bot@example.org"));
        assert!(raw.contains("Subject: "));
    }

    #[tokio::test]
    async fn invalid_sender_address_is_rejected() {
        let err = EmailNotifier::new(&EmailConfig::default(), &creds("not an address"))
            .err()
            .unwrap();
        assert!(matches!(err, NotifyError::Address(_)));
    }
}
