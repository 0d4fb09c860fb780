use std::net::SocketAddr;

use anyhow::Context;

pub const DEFAULT_MAILGUN_DOMAIN: &str = "mail.gig-o-matic.com";
pub const DEFAULT_BASE_URL: &str = "https://www.gig-o-matic.com";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Settings read from the environment (and a `.env` file, if present).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: SocketAddr,
    /// Root of the public site, used to build links in emails
    pub base_url: String,
    pub mailgun_token: Option<String>,
    pub mailgun_domain: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL").context("`DATABASE_URL` not set")?;
        let bind_address = std::env::var("BIND_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_owned())
            .parse()
            .context("`BIND_ADDRESS` is not a valid socket address")?;

        Ok(Self {
            database_url,
            bind_address,
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned())
                .trim_end_matches('/')
                .to_owned(),
            mailgun_token: std::env::var("MAILGUN_TOKEN").ok(),
            mailgun_domain: std::env::var("MAILGUN_DOMAIN")
                .unwrap_or_else(|_| DEFAULT_MAILGUN_DOMAIN.to_owned()),
        })
    }

    /// A configuration for tests and local tooling that never touches the network.
    pub fn local(base_url: &str) -> Self {
        Self {
            database_url: String::new(),
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            base_url: base_url.trim_end_matches('/').to_owned(),
            mailgun_token: None,
            mailgun_domain: DEFAULT_MAILGUN_DOMAIN.to_owned(),
        }
    }
}
