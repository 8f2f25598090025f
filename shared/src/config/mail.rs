//! SMTP mail configuration

use serde::{Deserialize, Serialize};

/// Outbound SMTP settings used for code delivery
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    /// SMTP relay host
    pub smtp_host: String,

    /// SMTP port (587 for STARTTLS)
    pub smtp_port: u16,

    /// SMTP username
    #[serde(default)]
    pub username: String,

    /// SMTP password
    #[serde(default)]
    pub password: String,

    /// Sender address
    pub from_address: String,

    /// Display name shown as the sender
    pub from_name: String,

    /// Send timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: String::from("localhost"),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
            from_address: String::from("no-reply@boardhub.local"),
            from_name: String::from("BoardHub"),
            timeout_seconds: default_timeout(),
        }
    }
}

impl MailConfig {
    /// Formatted `From` mailbox, e.g. `BoardHub <no-reply@boardhub.local>`
    pub fn mailbox(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_address)
    }
}

fn default_timeout() -> u64 {
    10
}
