//! Mail transport seam. Production sends over authenticated SMTP with TLS;
//! tests substitute a recording fake.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use crate::error::DispatchError;

/// One fully-resolved outgoing message.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

pub trait MailTransport {
    fn send(&self, email: &OutgoingEmail) -> Result<(), DispatchError>;
}

/// SMTP relay with TLS. Credentials are supplied per run and never stored.
pub struct SmtpMailer {
    host: String,
    port: u16,
    username: String,
    password: String,
}

impl SmtpMailer {
    pub fn new(host: &str, port: u16, username: &str, password: &str) -> Self {
        Self {
            host: host.to_string(),
            port,
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn build_transport(&self) -> Result<SmtpTransport, DispatchError> {
        let builder = SmtpTransport::relay(&self.host)
            .map_err(|e| DispatchError::Transport(format!("invalid SMTP host: {e}")))?
            .port(self.port)
            .credentials(Credentials::new(self.username.clone(), self.password.clone()));
        Ok(builder.build())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, DispatchError> {
    address
        .trim()
        .parse()
        .map_err(|_| DispatchError::Address(address.trim().to_string()))
}

impl MailTransport for SmtpMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<(), DispatchError> {
        let mut builder = Message::builder()
            .from(mailbox(&email.from)?)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML);
        for to in &email.to {
            builder = builder.to(mailbox(to)?);
        }
        for cc in &email.cc {
            builder = builder.cc(mailbox(cc)?);
        }
        let message = builder
            .body(email.html_body.clone())
            .map_err(|e| DispatchError::Message(e.to_string()))?;

        let transport = self.build_transport()?;
        transport
            .send(&message)
            .map(|_| ())
            .map_err(|e| DispatchError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailbox_rejects_garbage() {
        assert!(mailbox("a@x.com").is_ok());
        assert!(mailbox("  padded@x.com  ").is_ok());
        let err = mailbox("not-an-address").unwrap_err();
        assert!(matches!(err, DispatchError::Address(a) if a == "not-an-address"));
    }
}
