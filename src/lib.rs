//! Raid Insurance - post-raid insurance resolution library
//!
//! Detects insured gear a player lost in a raid, holds it with the trader that
//! insured it, and later rolls each item against that trader's return chance
//! before mailing back whatever survived.

pub mod common;
pub mod insurance;
pub mod items;
pub mod mail;
pub mod profile;
pub mod utils;

pub use crate::common::{InsuranceError, Result, RetentionPolicy};
pub use insurance::{InsuranceProcessor, RaidSnapshot};
pub use mail::{InsuranceMail, MailSink, Mailbox, ReturnOutcome};
pub use profile::{FileProfileStore, MemoryProfileStore, Profile, ProfileStore};
