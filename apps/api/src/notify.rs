//! New-sale notifications.
//!
//! A contracted sale produces two plain-text e-mails: a confirmation to the
//! customer and a copy to the operations mailbox. Delivery is best effort:
//! the service spawns it after the record is stored and only logs failures.
//!
//! ```text
//! SalesService::contract
//!      │  tokio::spawn
//!      ▼
//! Notifier::sale_created ──► SmtpNotifier  (MailHog: plain SMTP, no TLS/auth)
//!                        └─► LogNotifier   (SMTP disabled)
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use micks_core::{DeviceKind, SaleRecord};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Notification delivery errors. Never reach the HTTP client.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SMTP server did not answer within {0:?}")]
    Timeout(Duration),

    #[error("SMTP I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered with an unexpected reply code.
    #[error("SMTP {stage} expected {expected}, got: {reply}")]
    Protocol {
        stage: &'static str,
        expected: u16,
        reply: String,
    },
}

/// Sends notifications about contracted sales.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn sale_created(&self, sale: &SaleRecord) -> Result<(), NotifyError>;
}

/// Only writes the notification to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn sale_created(&self, sale: &SaleRecord) -> Result<(), NotifyError> {
        info!(
            sale_id = %sale.id,
            email = %sale.customer.email,
            plan = %sale.plan.plan,
            "New sale (SMTP disabled, e-mail not sent)"
        );
        Ok(())
    }
}

// =============================================================================
// SMTP
// =============================================================================

/// One outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Plain SMTP client, one connection per message.
#[derive(Debug, Clone)]
pub struct SmtpNotifier {
    host: String,
    port: u16,
    from: String,
    operations: String,
    timeout: Duration,
}

impl SmtpNotifier {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        from: impl Into<String>,
        operations: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        SmtpNotifier {
            host: host.into(),
            port,
            from: from.into(),
            operations: operations.into(),
            timeout,
        }
    }

    /// Delivers one message, bounded by the configured timeout.
    pub async fn send(&self, email: &Email) -> Result<(), NotifyError> {
        tokio::time::timeout(self.timeout, self.deliver(email))
            .await
            .map_err(|_| NotifyError::Timeout(self.timeout))?
    }

    async fn deliver(&self, email: &Email) -> Result<(), NotifyError> {
        let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
        let (read, mut write) = stream.into_split();
        let mut reader = BufReader::new(read);

        expect_reply(&mut reader, "greeting", 220).await?;
        command(&mut write, &mut reader, "HELO micks-api", "HELO", 250).await?;
        command(
            &mut write,
            &mut reader,
            &format!("MAIL FROM:<{}>", self.from),
            "MAIL FROM",
            250,
        )
        .await?;
        command(
            &mut write,
            &mut reader,
            &format!("RCPT TO:<{}>", email.to),
            "RCPT TO",
            250,
        )
        .await?;
        command(&mut write, &mut reader, "DATA", "DATA", 354).await?;

        write
            .write_all(render_message(&self.from, email).as_bytes())
            .await?;
        write.write_all(b".\r\n").await?;
        write.flush().await?;
        expect_reply(&mut reader, "message", 250).await?;

        // The message is accepted at this point; a failed QUIT changes nothing.
        let _ = command(&mut write, &mut reader, "QUIT", "QUIT", 221).await;

        debug!(to = %email.to, "E-mail delivered");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    /// Sends both e-mails even when the first fails; returns the first error.
    async fn sale_created(&self, sale: &SaleRecord) -> Result<(), NotifyError> {
        let mut first_error = None;

        for email in [customer_email(sale), operations_email(sale, &self.operations)] {
            if let Err(err) = self.send(&email).await {
                warn!(sale_id = %sale.id, to = %email.to, error = %err, "E-mail not delivered");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                info!(sale_id = %sale.id, "Sale notifications sent");
                Ok(())
            }
        }
    }
}

async fn command(
    write: &mut OwnedWriteHalf,
    reader: &mut BufReader<OwnedReadHalf>,
    line: &str,
    stage: &'static str,
    expected: u16,
) -> Result<(), NotifyError> {
    write.write_all(line.as_bytes()).await?;
    write.write_all(b"\r\n").await?;
    write.flush().await?;
    expect_reply(reader, stage, expected).await
}

/// Reads one (possibly multi-line) reply and checks its code.
async fn expect_reply(
    reader: &mut BufReader<OwnedReadHalf>,
    stage: &'static str,
    expected: u16,
) -> Result<(), NotifyError> {
    let mut reply = String::new();

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(NotifyError::Protocol {
                stage,
                expected,
                reply: format!("{}<connection closed>", reply),
            });
        }
        reply.push_str(&line);

        // "250-..." continues, "250 ..." ends the reply
        if line.as_bytes().get(3) != Some(&b'-') {
            break;
        }
    }

    let code = reply.get(..3).and_then(|c| c.parse::<u16>().ok());
    if code == Some(expected) {
        Ok(())
    } else {
        Err(NotifyError::Protocol {
            stage,
            expected,
            reply: reply.trim_end().to_string(),
        })
    }
}

/// Headers plus body with CRLF line endings and dot-stuffing, ready for DATA.
pub fn render_message(from: &str, email: &Email) -> String {
    let mut out = String::new();
    out.push_str(&format!("From: Micks <{}>\r\n", from));
    out.push_str(&format!("To: <{}>\r\n", email.to));
    out.push_str(&format!("Subject: {}\r\n", email.subject));
    out.push_str(&format!("Date: {}\r\n", Utc::now().to_rfc2822()));
    out.push_str("MIME-Version: 1.0\r\n");
    out.push_str("Content-Type: text/plain; charset=utf-8\r\n");
    out.push_str("Content-Transfer-Encoding: 8bit\r\n");
    out.push_str("\r\n");

    for line in email.body.lines() {
        if line.starts_with('.') {
            out.push('.');
        }
        out.push_str(line);
        out.push_str("\r\n");
    }

    out
}

// =============================================================================
// Messages
// =============================================================================

fn plan_summary(sale: &SaleRecord) -> String {
    format!(
        "Plano: {} ({} Mbps)\nPeso total: {}",
        sale.plan.plan, sale.plan.speed_mbps, sale.plan.total_weight
    )
}

fn inventory_summary(sale: &SaleRecord) -> String {
    let mut lines: Vec<String> = DeviceKind::ALL
        .iter()
        .map(|&kind| format!("  {}: {}", kind, sale.inventory.count(kind)))
        .collect();
    lines.push(format!("  total: {}", sale.inventory.total_devices()));
    lines.push(format!(
        "  gamer: {}",
        if sale.inventory.gamer { "sim" } else { "não" }
    ));
    lines.join("\n")
}

/// Confirmation sent to the customer.
pub fn customer_email(sale: &SaleRecord) -> Email {
    Email {
        to: sale.customer.email.clone(),
        subject: "Micks - contratacao confirmada".to_string(),
        body: format!(
            "Olá, {}!\n\nRecebemos a sua contratação.\n\n{}\n\nDispositivos declarados:\n{}\n\nProtocolo: {}\n\nEquipe Micks\n",
            sale.customer.name,
            plan_summary(sale),
            inventory_summary(sale),
            sale.id
        ),
    }
}

/// Copy sent to the operations mailbox.
pub fn operations_email(sale: &SaleRecord, operations: &str) -> Email {
    Email {
        to: operations.to_string(),
        subject: format!("Nova venda - plano {}", sale.plan.plan),
        body: format!(
            "Cliente: {}\nE-mail: {}\nTelefone: {}\n\n{}\n\nDispositivos:\n{}\n\nId: {}\nCriada em: {}\n",
            sale.customer.name,
            sale.customer.email,
            sale.customer.phone,
            plan_summary(sale),
            inventory_summary(sale),
            sale.id,
            sale.created_at.to_rfc3339()
        ),
    }
}
