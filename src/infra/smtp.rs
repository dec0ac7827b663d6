//! SMTP transport for the contact relay, built on lettre.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use async_trait::async_trait;
use tracing::info;

use crate::{
    application::contact::{MailError, Mailer, OutboundEmail},
    config::{ContactSettings, SmtpSettings},
};

use super::error::InfraError;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    /// Build a mailer from settings; `None` when no SMTP host is
    /// configured, which downgrades the contact endpoint to a
    /// configuration error instead of failing startup.
    pub fn from_settings(
        smtp: &SmtpSettings,
        contact: &ContactSettings,
    ) -> Result<Option<Self>, InfraError> {
        let Some(host) = smtp.host.as_deref() else {
            return Ok(None);
        };

        let mut builder = if smtp.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        }
        .map_err(|err| {
            InfraError::configuration(format!("smtp relay `{host}` rejected: {err}"))
        })?
        .port(smtp.port);

        if let (Some(user), Some(pass)) = (smtp.user.as_ref(), smtp.pass.as_ref()) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let sender: Mailbox = contact.sender.parse().map_err(|err| {
            InfraError::configuration(format!(
                "invalid sender address `{}`: {err}",
                contact.sender
            ))
        })?;

        info!(
            target = "vetrina::smtp",
            host,
            port = smtp.port,
            secure = smtp.secure,
            "smtp transport configured"
        );

        Ok(Some(Self {
            transport: builder.build(),
            sender,
        }))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailError> {
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|err| MailError::Message(format!("invalid recipient: {err}")))?;

        let mut builder = Message::builder()
            .from(self.sender.clone())
            .to(to)
            .subject(email.subject);

        if let Some(reply_to) = email.reply_to.as_deref()
            && let Ok(mailbox) = reply_to.parse::<Mailbox>()
        {
            builder = builder.reply_to(mailbox);
        }

        let message = builder
            .multipart(MultiPart::alternative_plain_html(email.text, email.html))
            .map_err(|err| MailError::Message(err.to_string()))?;

        self.transport
            .send(message)
            .await
            .map(|_| ())
            .map_err(|err| MailError::Transport(err.to_string()))
    }
}
