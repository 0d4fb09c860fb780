//! Composing and sending emails.

use askama::Template;
use async_trait::async_trait;

use crate::error::{GigoError, GigoResult};

pub mod plan;
pub mod reset_password;

pub const MAILGUN_NAME: &str = "Gig-o-Matic";
pub const MAILGUN_EMAIL: &str = "superuser@gig-o-matic.com";
const MAILGUN_API: &str = "https://api.mailgun.net/v3";

pub trait Email: Template {
    fn subject(&self) -> String;
    fn address(&self) -> EmailAddress;
    fn reply_to(&self) -> Option<String> {
        None
    }

    fn compose(&self) -> GigoResult<EmailMessage> {
        Ok(EmailMessage {
            to: self.address(),
            reply_to: self.reply_to(),
            subject: self.subject(),
            body: self.render()?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailAddress {
    pub name: String,
    pub address: String,
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} <{}>", self.name, self.address)
    }
}

/// A rendered email, ready to hand to a mailer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: EmailAddress,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> GigoResult<()>;
}

/// Sends mail through Mailgun's HTTP API.
pub struct MailgunMailer {
    client: reqwest::Client,
    token: String,
    domain: String,
}

impl MailgunMailer {
    pub fn new(token: String, domain: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            domain,
        }
    }
}

#[async_trait]
impl Mailer for MailgunMailer {
    async fn send(&self, message: &EmailMessage) -> GigoResult<()> {
        let sender = EmailAddress {
            name: MAILGUN_NAME.to_owned(),
            address: MAILGUN_EMAIL.to_owned(),
        };
        let mut form = vec![
            ("from", sender.to_string()),
            ("to", message.to.to_string()),
            ("subject", message.subject.clone()),
            ("html", message.body.clone()),
        ];
        if let Some(reply_to) = &message.reply_to {
            form.push(("h:Reply-To", reply_to.clone()));
        }

        self.client
            .post(format!("{}/{}/messages", MAILGUN_API, self.domain))
            .basic_auth("api", Some(&self.token))
            .form(&form)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map(|_| ())
            .map_err(|err| GigoError::Mail(format!("Failed to send email: {}", err)))
    }
}

/// Logs emails instead of sending them, for when no Mailgun token is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> GigoResult<()> {
        tracing::info!(to = %message.to, subject = %message.subject, "not sending email");
        Ok(())
    }
}
