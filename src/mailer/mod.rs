use crate::config::EmailConfig;
use crate::error::{ReportError, ReportResult};
use crate::models::Report;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::{debug, info};

pub const PLAIN_BODY: &str = "This is an automated world indices report. See below for details.";

pub fn subject_for(report: &Report) -> String {
    format!("World Indices Report - {} (Eastern)", report.timestamp())
}

/// Sender, credential and recipient must all be filled in.
pub fn check_settings(settings: &EmailConfig) -> ReportResult<()> {
    for (name, value) in [
        ("sender", &settings.sender),
        ("credential", &settings.credential),
        ("recipient", &settings.recipient),
    ] {
        if value.trim().is_empty() {
            return Err(ReportError::MissingEmailSetting(name));
        }
    }
    Ok(())
}

/// Plain-text fallback plus the report as the HTML alternative.
pub fn build_message(sender: &str, recipient: &str, report: &Report) -> ReportResult<Message> {
    let from: Mailbox = sender.trim().parse()?;
    let to: Mailbox = recipient.trim().parse()?;

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(subject_for(report))
        .multipart(MultiPart::alternative_plain_html(
            PLAIN_BODY.to_string(),
            report.html.clone(),
        ))?;
    Ok(message)
}

/// Deliver the report: STARTTLS upgrade, login as the sender, one message.
/// Nothing is retried.
pub async fn send_report(settings: &EmailConfig, report: &Report) -> ReportResult<()> {
    check_settings(settings)?;
    let message = build_message(&settings.sender, &settings.recipient, report)?;

    debug!("Connecting to {}:{}", settings.smtp_host, settings.smtp_port);
    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)?
        .port(settings.smtp_port)
        .credentials(Credentials::new(
            settings.sender.trim().to_string(),
            settings.credential.clone(),
        ))
        .timeout(Some(Duration::from_secs(settings.timeout_secs)))
        .build();

    let response = transport.send(message).await?;
    info!(
        "Report sent to {} ({})",
        settings.recipient,
        response.code()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::US::Eastern;

    fn report() -> Report {
        Report {
            generated_at: Eastern
                .with_ymd_and_hms(2025, 11, 3, 16, 5, 0)
                .single()
                .unwrap(),
            html: "<html><body><h1>World Indices Report</h1></body></html>".into(),
        }
    }

    fn settings() -> EmailConfig {
        EmailConfig {
            sender: "desk@example.com".into(),
            credential: "app-password".into(),
            recipient: "analyst@example.com".into(),
            ..EmailConfig::default()
        }
    }

    #[test]
    fn test_subject_uses_report_timestamp() {
        assert_eq!(
            subject_for(&report()),
            "World Indices Report - 2025-11-03 16:05:00 (Eastern)"
        );
    }

    #[test]
    fn test_message_is_multipart_alternative() {
        let msg = build_message("desk@example.com", "analyst@example.com", &report()).unwrap();
        assert_eq!(
            msg.headers().get_raw("Subject"),
            Some("World Indices Report - 2025-11-03 16:05:00 (Eastern)")
        );

        let raw = String::from_utf8(msg.formatted()).unwrap();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
        assert!(raw.contains(PLAIN_BODY));
        assert!(raw.contains("From: desk@example.com"));
        assert!(raw.contains("To: analyst@example.com"));
    }

    #[test]
    fn test_bad_address_is_transport_error() {
        let err = build_message("not an address", "analyst@example.com", &report()).unwrap_err();
        assert!(matches!(err, ReportError::EmailTransport(_)));
    }

    #[test]
    fn test_missing_settings_rejected() {
        assert!(check_settings(&settings()).is_ok());

        let mut s = settings();
        s.credential = "  ".into();
        assert!(matches!(
            check_settings(&s),
            Err(ReportError::MissingEmailSetting("credential"))
        ));

        let s = EmailConfig::default();
        assert!(matches!(
            check_settings(&s),
            Err(ReportError::MissingEmailSetting("sender"))
        ));
    }

    #[tokio::test]
    async fn test_send_checks_settings_before_connecting() {
        let s = EmailConfig {
            recipient: String::new(),
            ..settings()
        };
        let err = send_report(&s, &report()).await.unwrap_err();
        assert!(matches!(err, ReportError::MissingEmailSetting("recipient")));
    }
}
