//! Settling a box to the present.
//!
//! Settlement ties the accrual clock, reproduction and world events
//! together: if at least one tick is due, reproduction runs first and
//! events run against the grown inventory, both for the same tick count.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::debug;

use jellybox_types::{BoxEvent, BoxField, EventMeta, JellyfishBox, SpeciesMeta};

use crate::clock::{self, Accrual};
use crate::config::JellyboxConfig;
use crate::event_engine;
use crate::random::ChoiceError;
use crate::reproduction;

/// Static data a settlement reads.
#[derive(Debug, Clone, Copy)]
pub struct SettlementContext<'a> {
    /// Species metadata keyed by id.
    pub species: &'a BTreeMap<String, SpeciesMeta>,
    /// The world event table.
    pub events: &'a [EventMeta],
    /// Simulation configuration.
    pub config: &'a JellyboxConfig,
}

/// What a settlement did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// The accrual that drove it.
    pub accrual: Accrual,
    /// Reproduction events followed by world events.
    pub events: Vec<BoxEvent>,
    /// Box fields the settlement modified.
    pub changed: BTreeSet<BoxField>,
}

impl Settlement {
    /// A settlement that did nothing.
    pub const fn idle(accrual: Accrual) -> Self {
        Self {
            accrual,
            events: Vec::new(),
            changed: BTreeSet::new(),
        }
    }
}

/// Settle `record` to `now`.
///
/// Returns the settled box and a summary. When nothing is due the box is
/// returned unchanged. When due, `last_refresh_time` moves forward to the
/// start of the current hour if any event occurred, or unconditionally
/// when `accrual.advance_on_quiet_tick` is set.
///
/// # Errors
///
/// Returns [`ChoiceError`] if species rates or event probabilities cannot
/// be used as weights.
pub fn settle(
    record: &JellyfishBox,
    now: DateTime<Utc>,
    privileged: bool,
    ctx: SettlementContext<'_>,
    rng: &mut impl Rng,
) -> Result<(JellyfishBox, Settlement), ChoiceError> {
    let config = ctx.config;
    let accrual = clock::compute_ticks(record.last_refresh_time, now, privileged, &config.accrual);
    if !accrual.due {
        return Ok((record.clone(), Settlement::idle(accrual)));
    }

    let capacity = config.box_settings.capacity;
    let grown = reproduction::apply_reproduction(
        &record.inventory,
        ctx.species,
        accrual.ticks,
        record.population(),
        capacity,
        &config.reproduction,
        rng,
    )?;
    let fired = event_engine::apply_events(
        ctx.events,
        accrual.ticks,
        &grown.inventory,
        ctx.species,
        capacity,
        rng,
    )?;

    let mut events: Vec<BoxEvent> = grown
        .events
        .into_iter()
        .map(BoxEvent::Reproduction)
        .collect();
    events.extend(fired.events.into_iter().map(BoxEvent::World));

    let mut settled = record.clone();
    let mut changed = BTreeSet::new();
    if fired.inventory != record.inventory {
        settled.inventory = fired.inventory;
        changed.insert(BoxField::Inventory);
    }

    if !events.is_empty() || config.accrual.advance_on_quiet_tick {
        let refreshed = clock::truncate_to_hour(now).max(record.last_refresh_time);
        if refreshed != record.last_refresh_time {
            settled.last_refresh_time = refreshed;
            changed.insert(BoxField::LastRefreshTime);
        }
    }

    debug!(
        user_id = %record.user_id,
        platform = %record.platform,
        ticks = accrual.ticks,
        events = events.len(),
        "box settled"
    );

    Ok((
        settled,
        Settlement {
            accrual,
            events,
            changed,
        },
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use jellybox_types::{BoxKey, EventKind, Group};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 15, 42, 0).unwrap()
    }

    fn boxed(hours_ago: i64, inventory: &[(&str, u32)]) -> JellyfishBox {
        let then = now() - TimeDelta::try_hours(hours_ago).unwrap();
        let mut record = JellyfishBox::new(&BoxKey::new("u1", "qq"), then, then);
        record.inventory = inventory
            .iter()
            .map(|(id, n)| ((*id).to_owned(), *n))
            .collect();
        record
    }

    fn species(id: &str, rate: f64) -> SpeciesMeta {
        SpeciesMeta {
            id: id.to_owned(),
            name: id.to_owned(),
            group: Group::Good,
            description: String::new(),
            reproductive_rate: rate,
            draw_size: 1.0,
        }
    }

    #[test]
    fn not_due_changes_nothing() {
        let config = JellyboxConfig::default();
        let species = BTreeMap::new();
        let ctx = SettlementContext {
            species: &species,
            events: &[],
            config: &config,
        };
        let record = boxed(0, &[("moon", 3)]);
        let mut rng = SmallRng::seed_from_u64(1);
        let (settled, settlement) = settle(&record, now(), false, ctx, &mut rng).unwrap();
        assert_eq!(settled, record);
        assert!(!settlement.accrual.due);
        assert!(settlement.changed.is_empty());
    }

    #[test]
    fn quiet_tick_advances_refresh_by_default() {
        let config = JellyboxConfig::default();
        let species = BTreeMap::new();
        let ctx = SettlementContext {
            species: &species,
            events: &[],
            config: &config,
        };
        let record = boxed(5, &[]);
        let mut rng = SmallRng::seed_from_u64(2);
        let (settled, settlement) = settle(&record, now(), false, ctx, &mut rng).unwrap();
        assert!(settlement.events.is_empty());
        assert_eq!(
            settled.last_refresh_time,
            Utc.with_ymd_and_hms(2026, 5, 10, 15, 0, 0).unwrap()
        );
        assert!(settlement.changed.contains(&BoxField::LastRefreshTime));
    }

    #[test]
    fn quiet_tick_keeps_refresh_when_disabled() {
        let mut config = JellyboxConfig::default();
        config.accrual.advance_on_quiet_tick = false;
        let species = BTreeMap::new();
        let ctx = SettlementContext {
            species: &species,
            events: &[],
            config: &config,
        };
        let record = boxed(5, &[]);
        let mut rng = SmallRng::seed_from_u64(3);
        let (settled, settlement) = settle(&record, now(), false, ctx, &mut rng).unwrap();
        assert_eq!(settled.last_refresh_time, record.last_refresh_time);
        assert!(settlement.changed.is_empty());
    }

    #[test]
    fn reproduction_precedes_world_events() {
        let config = JellyboxConfig::default();
        // 720 * 1 * 1 / 720 = 1 new moon per tick.
        let species = BTreeMap::from([("moon".to_owned(), species("moon", 720.0))]);
        let table = [EventMeta {
            id: "calm".to_owned(),
            name: "Calm".to_owned(),
            description: "Nothing stirs".to_owned(),
            kind: EventKind::Normal,
            probability: 1.0,
            relation: Vec::new(),
        }];
        let ctx = SettlementContext {
            species: &species,
            events: &table,
            config: &config,
        };
        let record = boxed(1, &[("moon", 1)]);
        let mut rng = SmallRng::seed_from_u64(4);
        let (settled, settlement) = settle(&record, now(), false, ctx, &mut rng).unwrap();
        assert_eq!(settlement.events.len(), 2);
        assert!(matches!(settlement.events[0], BoxEvent::Reproduction(_)));
        assert!(matches!(settlement.events[1], BoxEvent::World(_)));
        assert_eq!(settled.count_of("moon"), 2);
        assert!(settlement.changed.contains(&BoxField::Inventory));
    }

    #[test]
    fn privileged_account_settles_ten_ticks() {
        let config = JellyboxConfig::default();
        let species = BTreeMap::new();
        let ctx = SettlementContext {
            species: &species,
            events: &[],
            config: &config,
        };
        let record = boxed(0, &[]);
        let mut rng = SmallRng::seed_from_u64(5);
        let (_, settlement) = settle(&record, now(), true, ctx, &mut rng).unwrap();
        assert_eq!(settlement.accrual.ticks, 10);
    }

    #[test]
    fn refresh_never_moves_backwards() {
        let config = JellyboxConfig::default();
        let species = BTreeMap::new();
        let ctx = SettlementContext {
            species: &species,
            events: &[],
            config: &config,
        };
        // Refreshed at 15:30 already; privileged settlement at 15:42 would
        // otherwise snap back to 15:00.
        let mut record = boxed(0, &[]);
        record.last_refresh_time = Utc.with_ymd_and_hms(2026, 5, 10, 15, 30, 0).unwrap();
        let mut rng = SmallRng::seed_from_u64(6);
        let (settled, _) = settle(&record, now(), true, ctx, &mut rng).unwrap();
        assert_eq!(settled.last_refresh_time, record.last_refresh_time);
    }
}
