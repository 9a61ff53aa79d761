use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::Serialize;
use tracing::warn;

use crate::calendar::EventRecord;
use crate::config::MailConfig;

#[derive(Clone, Debug, Serialize)]
pub struct FailedRecipient {
    pub address: String,
    pub reason: String,
}

/// Per-recipient outcome partition for one invitation batch.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DispatchReport {
    pub sent: Vec<String>,
    pub failed: Vec<FailedRecipient>,
}

/// Authenticated STARTTLS submission to the configured relay. The transport
/// is built once and shared by every recipient of a batch.
pub struct Mailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl Mailer {
    pub fn new(config: &MailConfig) -> Result<Self> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let transport = SmtpTransport::starttls_relay(&config.host)
            .context("invalid mail relay host")?
            .port(config.port)
            .credentials(credentials)
            .build();
        let from: Mailbox = config
            .from
            .parse()
            .context("invalid mail sender address")?;
        Ok(Self { transport, from })
    }

    pub fn dispatch(&self, event: &EventRecord) -> DispatchReport {
        dispatch_over(&self.transport, &self.from, event)
    }
}

/// Compose one plain-text message per recipient and attempt each delivery
/// independently: a failure is recorded and the batch moves on.
pub fn dispatch_over<T>(transport: &T, from: &Mailbox, event: &EventRecord) -> DispatchReport
where
    T: Transport,
    T::Error: std::fmt::Display,
{
    let subject = format!("Event invitation: {}", event.name);
    let participants = event.recipients.join(", ");
    let body = format!(
        "Dear all,\n\nYou are invited to attend the event '{}' starting at {}.\n\nParticipants: {}\n",
        event.name, event.start, participants
    );

    let mut report = DispatchReport::default();
    for recipient in &event.recipients {
        let to: Mailbox = match recipient.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                warn!("invalid recipient address {}: {}", recipient, e);
                report.failed.push(FailedRecipient {
                    address: recipient.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let message = match Message::builder()
            .from(from.clone())
            .to(to)
            .subject(&subject)
            .body(body.clone())
        {
            Ok(message) => message,
            Err(e) => {
                report.failed.push(FailedRecipient {
                    address: recipient.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        match transport.send(&message) {
            Ok(_) => report.sent.push(recipient.clone()),
            Err(e) => {
                warn!("failed to send invitation to {}: {}", recipient, e);
                report.failed.push(FailedRecipient {
                    address: recipient.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use lettre::address::Envelope;

    /// Accepts everything except one address, like a relay bouncing a single
    /// mailbox mid-batch.
    struct RejectOne {
        reject: &'static str,
    }

    impl Transport for RejectOne {
        type Ok = ();
        type Error = String;

        fn send_raw(&self, envelope: &Envelope, _email: &[u8]) -> Result<(), String> {
            if envelope.to().iter().any(|a| a.to_string() == self.reject) {
                Err("550 mailbox unavailable".to_string())
            } else {
                Ok(())
            }
        }
    }

    fn event(recipients: &[&str]) -> EventRecord {
        EventRecord {
            name: "Demo Day".to_string(),
            start: "2026-05-01T18:00:00Z".to_string(),
            organizer: "host@example.org".to_string(),
            recipients: recipients.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn sender() -> Mailbox {
        "CRM <crm@example.org>".parse().unwrap()
    }

    #[test]
    fn one_failure_does_not_block_the_rest() {
        let transport = RejectOne {
            reject: "r2@example.org",
        };
        let report = dispatch_over(
            &transport,
            &sender(),
            &event(&["r1@example.org", "r2@example.org", "r3@example.org"]),
        );
        assert_eq!(report.sent, vec!["r1@example.org", "r3@example.org"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].address, "r2@example.org");
        assert!(report.failed[0].reason.contains("550"));
    }

    #[test]
    fn unparseable_recipient_fails_alone() {
        let transport = RejectOne { reject: "" };
        let report = dispatch_over(
            &transport,
            &sender(),
            &event(&["not an address", "ok@example.org"]),
        );
        assert_eq!(report.sent, vec!["ok@example.org"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].address, "not an address");
    }

    #[test]
    fn all_success_leaves_failed_empty() {
        let transport = RejectOne { reject: "" };
        let report = dispatch_over(&transport, &sender(), &event(&["a@example.org"]));
        assert_eq!(report.sent.len(), 1);
        assert!(report.failed.is_empty());
    }
}
