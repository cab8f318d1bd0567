//! Group lost gear into per-trader packages and schedule their return.

use super::types::{DropMarkers, InsurancePackage, LostGear, SystemData};
use crate::common::constants::SECONDS_PER_HOUR;
use crate::common::RetentionPolicy;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};
use uuid::Uuid;

/// When a trader's package for a raid ending at `now` becomes due.
///
/// A configured override wins. Otherwise a random time inside the trader's
/// return window is shortened by the profile's return-time bonus.
pub fn return_timestamp<R: Rng>(
    policy: &RetentionPolicy,
    trader_id: &str,
    now: i64,
    return_time_bonus_percent: f64,
    rng: &mut R,
) -> i64 {
    let override_seconds = policy.insurance.return_time_override_seconds;
    if override_seconds > 0 {
        return now.saturating_add(override_seconds);
    }

    let Some(trader) = policy.trader(trader_id) else {
        warn!(%trader_id, "Unknown trader, scheduling insurance return immediately");
        return now;
    };

    let min_seconds = trader
        .min_return_hours
        .max(0)
        .saturating_mul(SECONDS_PER_HOUR);
    let max_seconds = trader
        .max_return_hours
        .saturating_mul(SECONDS_PER_HOUR)
        .max(min_seconds);
    let seconds = rng.gen_range(min_seconds..=max_seconds);

    let multiplier = (1.0 - return_time_bonus_percent / 100.0).clamp(0.0, 1.0);
    now.saturating_add((seconds as f64 * multiplier).round() as i64)
}

/// Build one package per trader, in the order traders first appear.
///
/// An item id already in a trader's package is not added again, so an insert
/// that was also insured on its own comes back once.
pub fn build_packages<R: Rng>(
    policy: &RetentionPolicy,
    session_id: &str,
    lost: Vec<LostGear>,
    location: &str,
    now: i64,
    return_time_bonus_percent: f64,
    rng: &mut R,
) -> Vec<InsurancePackage> {
    let mut packages: Vec<InsurancePackage> = Vec::new();
    let mut by_trader: HashMap<String, usize> = HashMap::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for gear in lost {
        if !seen.insert((gear.trader_id.clone(), gear.item.id.clone())) {
            continue;
        }

        let index = match by_trader.get(&gear.trader_id) {
            Some(&index) => index,
            None => {
                let max_storage_hours = policy
                    .trader(&gear.trader_id)
                    .map_or(0, |trader| trader.max_storage_hours);
                packages.push(InsurancePackage {
                    id: Uuid::new_v4(),
                    trader_id: gear.trader_id.clone(),
                    session_id: session_id.to_string(),
                    items: Vec::new(),
                    dropped: DropMarkers::new(),
                    scheduled_time: return_timestamp(
                        policy,
                        &gear.trader_id,
                        now,
                        return_time_bonus_percent,
                        rng,
                    ),
                    max_storage_time: max_storage_hours.saturating_mul(SECONDS_PER_HOUR),
                    system_data: SystemData {
                        location: location.to_string(),
                        raid_end_time: now,
                    },
                });
                by_trader.insert(gear.trader_id.clone(), packages.len() - 1);
                packages.len() - 1
            }
        };

        let package = &mut packages[index];
        package.dropped.mark(gear.item.id.clone(), gear.dropped);
        package.items.push(gear.item);
    }

    for package in &packages {
        debug!(
            trader_id = %package.trader_id,
            items = package.items.len(),
            scheduled_time = package.scheduled_time,
            "Stored insurance package"
        );
    }

    packages
}
