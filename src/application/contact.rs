//! Contact relay: validated form submission → outbound email.
//!
//! The write path has no fallback channel, so a missing transport is a
//! hard failure rather than a silent degrade. Transport diagnostics stay
//! in server logs; clients get a generic message.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use crate::{application::error::AppError, domain::contact::ContactSubmission};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("message could not be built: {0}")]
    Message(String),
    #[error("smtp transport failure: {0}")]
    Transport(String),
}

#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Seam over the SMTP transport.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError>;
}

pub struct ContactService {
    mailer: Option<Arc<dyn Mailer>>,
    recipient: Option<String>,
}

impl ContactService {
    pub fn new(mailer: Option<Arc<dyn Mailer>>, recipient: Option<String>) -> Self {
        Self { mailer, recipient }
    }

    pub async fn relay(&self, submission: ContactSubmission) -> Result<(), AppError> {
        submission.validate()?;

        let (Some(mailer), Some(recipient)) = (self.mailer.as_ref(), self.recipient.as_ref())
        else {
            return Err(AppError::configuration(
                "contact relay requires smtp transport and recipient",
            ));
        };

        let email = build_email(recipient, &submission);

        match mailer.send(email).await {
            Ok(()) => {
                info!(
                    target = "vetrina::contact",
                    project_type = %submission.project_type,
                    "contact enquiry relayed"
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    target = "vetrina::contact",
                    error = %err,
                    "contact relay transport failure"
                );
                Err(AppError::unexpected(err.to_string()))
            }
        }
    }
}

fn build_email(recipient: &str, submission: &ContactSubmission) -> OutboundEmail {
    let subject = format!(
        "New project enquiry: {} ({})",
        submission.name.trim(),
        submission.project_type.trim()
    );

    let mut lines = vec![
        format!("Name: {}", submission.name.trim()),
        format!("Email: {}", submission.email.trim()),
        format!("Phone: {}", submission.phone.trim()),
        format!("Project type: {}", submission.project_type.trim()),
    ];
    if let Some(company) = submission.company.as_deref().map(str::trim)
        && !company.is_empty()
    {
        lines.push(format!("Company: {company}"));
    }
    if let Some(plan) = submission.plan.as_deref().map(str::trim)
        && !plan.is_empty()
    {
        lines.push(format!("Plan: {plan}"));
    }
    lines.push(String::new());
    lines.push(submission.message.trim().to_string());
    let text = lines.join("\n");

    let html = {
        let mut rows = String::new();
        for line in lines.iter().filter(|line| !line.is_empty()) {
            rows.push_str(&format!("<p>{}</p>\n", escape_html(line)));
        }
        format!("<div>\n{rows}</div>")
    };

    OutboundEmail {
        to: recipient.to_string(),
        reply_to: Some(submission.email.trim().to_string()),
        subject,
        text,
        html,
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use tokio::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<OutboundEmail>>,
        fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::Transport(
                    "code=451 command=DATA response=try again later".to_string(),
                ));
            }
            self.sent.lock().await.push(email);
            Ok(())
        }
    }

    fn submission() -> ContactSubmission {
        ContactSubmission {
            plan: Some("starter".to_string()),
            name: "Ada".to_string(),
            email: "a@b.co".to_string(),
            phone: "+39 02 1234".to_string(),
            company: None,
            project_type: "web".to_string(),
            message: "We would like a new marketing site.".to_string(),
        }
    }

    #[tokio::test]
    async fn relay_builds_and_sends_the_email() {
        let mailer = Arc::new(RecordingMailer::default());
        let service = ContactService::new(
            Some(mailer.clone() as Arc<dyn Mailer>),
            Some("studio@example.com".to_string()),
        );

        service.relay(submission()).await.expect("relayed");

        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        let email = &sent[0];
        assert_eq!(email.to, "studio@example.com");
        assert_eq!(email.reply_to.as_deref(), Some("a@b.co"));
        assert!(email.subject.contains("Ada"));
        assert!(email.text.contains("Plan: starter"));
        assert!(email.html.contains("<p>"));
    }

    #[tokio::test]
    async fn missing_transport_is_a_configuration_error() {
        let service = ContactService::new(None, Some("studio@example.com".to_string()));
        let err = service.relay(submission()).await.expect_err("unconfigured");
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn transport_failure_is_generic_to_callers() {
        let mailer = Arc::new(RecordingMailer {
            fail: true,
            ..Default::default()
        });
        let service = ContactService::new(
            Some(mailer as Arc<dyn Mailer>),
            Some("studio@example.com".to_string()),
        );

        let err = service.relay(submission()).await.expect_err("transport down");
        assert!(matches!(err, AppError::Unexpected(_)));
    }

    #[tokio::test]
    async fn invalid_submission_never_reaches_the_mailer() {
        let mailer = Arc::new(RecordingMailer::default());
        let service = ContactService::new(
            Some(mailer.clone() as Arc<dyn Mailer>),
            Some("studio@example.com".to_string()),
        );

        let mut bad = submission();
        bad.email = "not-an-email".to_string();
        assert!(service.relay(bad).await.is_err());
        assert!(mailer.sent.lock().await.is_empty());
    }

    #[test]
    fn html_body_escapes_user_input() {
        let mut s = submission();
        s.message = "love your <script>alert(1)</script> work".to_string();
        let email = build_email("x@y.co", &s);
        assert!(!email.html.contains("<script>"));
        assert!(email.html.contains("&lt;script&gt;"));
    }
}
