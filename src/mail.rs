//! Outbound trader mail carrying resolved insurance packages.

use crate::common::Result;
use crate::items::Item;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnOutcome {
    /// At least one item survived the rolls
    Returned,
    /// Every item was lost
    NothingReturned,
    /// The raid map does not honour insurance
    LocationDisabled,
}

impl ReturnOutcome {
    /// Dialogue template the trader answers with.
    pub fn message_kind(&self) -> &'static str {
        match self {
            ReturnOutcome::Returned => "insuranceFound",
            ReturnOutcome::NothingReturned => "insuranceFailed",
            ReturnOutcome::LocationDisabled => "insuranceFailedLabs",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsuranceMail {
    pub id: Uuid,
    pub session_id: String,
    pub trader_id: String,
    pub outcome: ReturnOutcome,
    pub items: Vec<Item>,
    /// Seconds the attachments stay claimable
    pub max_storage_time: i64,
    pub location: String,
    pub sent_at: i64,
}

/// Delivery channel for insurance mail.
pub trait MailSink {
    fn deliver(&mut self, mail: InsuranceMail) -> Result<()>;
}

/// Collects delivered mail in memory.
#[derive(Debug, Clone, Default)]
pub struct Mailbox {
    delivered: Vec<InsuranceMail>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> &[InsuranceMail] {
        &self.delivered
    }

    pub fn take(&mut self) -> Vec<InsuranceMail> {
        std::mem::take(&mut self.delivered)
    }

    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }
}

impl MailSink for Mailbox {
    fn deliver(&mut self, mail: InsuranceMail) -> Result<()> {
        self.delivered.push(mail);
        Ok(())
    }
}

/// Writes a summary of each mail to the log and drops it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailSink;

impl MailSink for LogMailSink {
    fn deliver(&mut self, mail: InsuranceMail) -> Result<()> {
        info!(
            session_id = %mail.session_id,
            trader_id = %mail.trader_id,
            kind = mail.outcome.message_kind(),
            items = mail.items.len(),
            location = %mail.location,
            "Insurance mail sent"
        );
        Ok(())
    }
}
