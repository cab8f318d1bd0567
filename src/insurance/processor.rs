//! Drives both insurance stages against a profile store and a mail sink.

use super::detection::LossDetector;
use super::packaging::build_packages;
use super::retention::{finalize_package, RetentionRoller};
use super::types::{InsurancePackage, RaidSnapshot};
use crate::common::{Result, RetentionPolicy};
use crate::items::TemplateDb;
use crate::mail::{InsuranceMail, MailSink, ReturnOutcome};
use crate::profile::ProfileStore;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

/// What happened to one package when it was processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    pub package_id: Uuid,
    pub trader_id: String,
    pub outcome: ReturnOutcome,
    pub items_returned: usize,
    pub items_lost: usize,
}

pub struct InsuranceProcessor<S: ProfileStore, M: MailSink, R: Rng> {
    policy: RetentionPolicy,
    templates: TemplateDb,
    store: S,
    mail: M,
    rng: R,
}

impl<S: ProfileStore, M: MailSink, R: Rng> InsuranceProcessor<S, M, R> {
    pub fn new(policy: RetentionPolicy, templates: TemplateDb, store: S, mail: M, rng: R) -> Self {
        Self {
            policy,
            templates,
            store,
            mail,
            rng,
        }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn mail(&self) -> &M {
        &self.mail
    }

    pub fn mail_mut(&mut self) -> &mut M {
        &mut self.mail
    }

    /// Stage 1: find lost insured gear and store it as pending packages.
    ///
    /// Packaged items stop being insured. Returns the number of packages
    /// created. A detection failure leaves the stored profile untouched.
    pub fn end_raid(
        &mut self,
        session_id: &str,
        snapshot: &RaidSnapshot,
        now: i64,
    ) -> Result<usize> {
        let mut profile = self.store.load(session_id)?;

        let detector = LossDetector::new(&self.policy, &self.templates);
        let lost =
            detector.find_lost_gear(profile.root_item_id(), &profile.insured_items, snapshot)?;
        if lost.is_empty() {
            debug!(%session_id, "No insured items lost");
            return Ok(0);
        }

        let packages = build_packages(
            &self.policy,
            session_id,
            lost,
            &snapshot.location,
            now,
            profile.bonuses.insurance_return_time_percent,
            &mut self.rng,
        );

        let packaged: HashSet<(&str, &str)> = packages
            .iter()
            .flat_map(|package| {
                package
                    .items
                    .iter()
                    .map(move |item| (package.trader_id.as_str(), item.id.as_str()))
            })
            .collect();
        profile
            .insured_items
            .retain(|r| !packaged.contains(&(r.trader_id.as_str(), r.item_id.as_str())));

        let created = packages.len();
        info!(
            %session_id,
            packages = created,
            items = packages.iter().map(|p| p.items.len()).sum::<usize>(),
            location = %snapshot.location,
            "Stored insurance packages"
        );
        profile.insurance.extend(packages);
        self.store.save(&profile)?;

        Ok(created)
    }

    /// Stage 2: roll, finalize and mail every package due at `now`.
    ///
    /// Packages are handled one at a time; each is removed and the profile
    /// saved only after its mail was delivered, so a failed delivery leaves
    /// that package pending.
    pub fn process_due(&mut self, session_id: &str, now: i64) -> Result<Vec<PackageReport>> {
        let mut profile = self.store.load(session_id)?;

        let due: Vec<InsurancePackage> = profile
            .insurance
            .iter()
            .filter(|package| package.is_due(now))
            .cloned()
            .collect();
        if due.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Processing {} insurance packages, which includes a total of {} items, in profile {}",
            due.len(),
            due.iter().map(|p| p.items.len()).sum::<usize>(),
            session_id
        );

        let root_id = profile.root_item_id().to_string();
        let mut reports = Vec::with_capacity(due.len());
        for mut package in due {
            let before = package.items.len();
            let outcome = self.resolve_package(&root_id, &mut package);

            let report = PackageReport {
                package_id: package.id,
                trader_id: package.trader_id.clone(),
                outcome,
                items_returned: package.items.len(),
                items_lost: before.saturating_sub(package.items.len()),
            };

            self.mail.deliver(InsuranceMail {
                id: Uuid::new_v4(),
                session_id: session_id.to_string(),
                trader_id: package.trader_id.clone(),
                outcome,
                items: package.items,
                max_storage_time: package.max_storage_time,
                location: package.system_data.location.clone(),
                sent_at: now,
            })?;

            profile.insurance.retain(|pending| pending.id != package.id);
            self.store.save(&profile)?;

            info!(
                %session_id,
                trader_id = %report.trader_id,
                returned = report.items_returned,
                lost = report.items_lost,
                "Insurance package processed"
            );
            reports.push(report);
        }

        Ok(reports)
    }

    /// `process_due` for every stored session.
    pub fn process_all_due(&mut self, now: i64) -> Result<Vec<PackageReport>> {
        let mut reports = Vec::new();
        for session_id in self.store.sessions()? {
            reports.extend(self.process_due(&session_id, now)?);
        }
        Ok(reports)
    }

    fn resolve_package(
        &mut self,
        root_id: &str,
        package: &mut InsurancePackage,
    ) -> ReturnOutcome {
        if self.policy.insurance_disabled_at(&package.system_data.location) {
            debug!(
                location = %package.system_data.location,
                "Insurance disabled on this location, nothing returned"
            );
            package.items.clear();
            package.strip_drop_markers();
            return ReturnOutcome::LocationDisabled;
        }

        let mut roller = RetentionRoller::new(&self.policy, &self.templates, &mut self.rng);
        let to_delete = roller.find_items_to_delete(root_id, package);
        finalize_package(root_id, package, &to_delete);

        if package.items.is_empty() {
            ReturnOutcome::NothingReturned
        } else {
            ReturnOutcome::Returned
        }
    }
}
