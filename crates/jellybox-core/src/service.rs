//! The box service: settle-then-act orchestration over a repository.
//!
//! Each operation locks the box key, loads or creates the box, settles it
//! to `now`, applies the requested action and persists the union of the
//! changed fields with a single write. A repository failure aborts the
//! operation with nothing persisted.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use jellybox_types::{
    BoxField, BoxKey, BoxReport, CatalogueEntry, CatchReport, EventMeta, JellyfishBox,
    ReleaseReport, SpeciesMeta, StatisticsReport,
};

use crate::catalogue;
use crate::catch;
use crate::clock;
use crate::config::JellyboxConfig;
use crate::error::{BoxError, CatchError};
use crate::locks::KeyedLocks;
use crate::release::{self, ReleaseRequest};
use crate::repository::BoxRepository;
use crate::settlement::{self, Settlement, SettlementContext};

/// Catalogue data loaded for one operation.
struct Loaded {
    record: JellyfishBox,
    species: Vec<SpeciesMeta>,
    by_id: BTreeMap<String, SpeciesMeta>,
    events: Vec<EventMeta>,
}

/// Orchestrates box operations over a [`BoxRepository`].
#[derive(Debug)]
pub struct BoxService<R> {
    repository: R,
    config: JellyboxConfig,
    locks: KeyedLocks,
    rng: Mutex<SmallRng>,
}

impl<R: BoxRepository> BoxService<R> {
    /// Create a service seeded from the operating system.
    pub fn new(repository: R, config: JellyboxConfig) -> Self {
        Self::with_rng(repository, config, SmallRng::from_os_rng())
    }

    /// Create a service with a fixed seed, for reproducible runs.
    pub fn with_seed(repository: R, config: JellyboxConfig, seed: u64) -> Self {
        Self::with_rng(repository, config, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(repository: R, config: JellyboxConfig, rng: SmallRng) -> Self {
        Self {
            repository,
            config,
            locks: KeyedLocks::new(),
            rng: Mutex::new(rng),
        }
    }

    /// The repository this service writes to.
    pub const fn repository(&self) -> &R {
        &self.repository
    }

    /// The active configuration.
    pub const fn config(&self) -> &JellyboxConfig {
        &self.config
    }

    /// Settle and return the box.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::Repository`] if storage fails, or
    /// [`BoxError::Choice`] if the catalogue holds unusable weights.
    pub async fn open(&self, key: &BoxKey, now: DateTime<Utc>) -> Result<BoxReport, BoxError> {
        let _guard = self.locks.acquire(key).await;
        let loaded = self.load(key, now).await?;
        let (settled, settlement) = self.settle(&loaded, now).await?;
        self.persist(&settled, &settlement.changed).await?;
        debug!(%key, events = settlement.events.len(), "box opened");
        Ok(BoxReport {
            record: settled,
            events: settlement.events,
        })
    }

    /// Settle the box, then catch into it.
    ///
    /// The cooldown is checked before settlement; a cooldown refusal
    /// persists nothing. A full box still persists the settlement.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::Catch`] if the catch is refused, or the
    /// infrastructure errors of [`BoxService::open`].
    pub async fn catch(&self, key: &BoxKey, now: DateTime<Utc>) -> Result<CatchReport, BoxError> {
        let _guard = self.locks.acquire(key).await;
        let loaded = self.load(key, now).await?;
        let privileged = self.config.is_test_account(&key.user_id);
        catch::check_cooldown(&loaded.record, now, privileged, &self.config.catch)?;

        let (settled, settlement) = self.settle(&loaded, now).await?;
        let attempt = {
            let mut rng = self.rng.lock().await;
            catch::catch(
                &settled,
                &loaded.species,
                now,
                self.config.box_settings.capacity,
                &self.config.catch,
                &mut *rng,
            )
        };

        match attempt {
            Ok((updated, added)) => {
                let mut fields = settlement.changed.clone();
                fields.insert(BoxField::Inventory);
                fields.insert(BoxField::LastCatchTime);
                self.persist(&updated, &fields).await?;
                info!(
                    %key,
                    species_id = %added.species_id,
                    count = added.count,
                    events = settlement.events.len(),
                    "catch succeeded"
                );
                Ok(CatchReport {
                    record: updated,
                    events: settlement.events,
                    added,
                })
            }
            Err(err) => {
                self.persist(&settled, &settlement.changed).await?;
                if matches!(err, CatchError::Choice(_)) {
                    warn!(%key, error = %err, "catch draw failed");
                } else {
                    debug!(%key, error = %err, "catch refused");
                }
                Err(err.into())
            }
        }
    }

    /// Settle the box, then release the requested individuals.
    ///
    /// A rejected release still persists the settlement.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::Release`] listing every validation problem, or
    /// the infrastructure errors of [`BoxService::open`].
    pub async fn release(
        &self,
        key: &BoxKey,
        requests: &[ReleaseRequest],
        now: DateTime<Utc>,
    ) -> Result<ReleaseReport, BoxError> {
        let _guard = self.locks.acquire(key).await;
        let loaded = self.load(key, now).await?;
        let (settled, settlement) = self.settle(&loaded, now).await?;

        match release::release(&settled, requests, &loaded.by_id) {
            Ok((updated, released)) => {
                let mut fields = settlement.changed.clone();
                fields.insert(BoxField::Inventory);
                self.persist(&updated, &fields).await?;
                info!(%key, species = released.len(), "release succeeded");
                Ok(ReleaseReport {
                    record: updated,
                    events: settlement.events,
                    released,
                })
            }
            Err(rejected) => {
                self.persist(&settled, &settlement.changed).await?;
                debug!(%key, problems = rejected.errors.len(), "release rejected");
                Err(rejected.into())
            }
        }
    }

    /// Parse raw command tokens and release them.
    ///
    /// # Errors
    ///
    /// See [`BoxService::release`].
    pub async fn release_tokens<S: AsRef<str> + Sync>(
        &self,
        key: &BoxKey,
        tokens: &[S],
        now: DateTime<Utc>,
    ) -> Result<ReleaseReport, BoxError> {
        let requests = release::parse_release_tokens(tokens, &self.config.release.all_synonyms);
        self.release(key, &requests, now).await
    }

    /// Settle the box and summarise its contents.
    ///
    /// # Errors
    ///
    /// See [`BoxService::open`].
    pub async fn statistics(
        &self,
        key: &BoxKey,
        now: DateTime<Utc>,
    ) -> Result<StatisticsReport, BoxError> {
        let _guard = self.locks.acquire(key).await;
        let loaded = self.load(key, now).await?;
        let (settled, settlement) = self.settle(&loaded, now).await?;
        self.persist(&settled, &settlement.changed).await?;
        Ok(StatisticsReport {
            statistics: catalogue::statistics(
                &settled,
                &loaded.by_id,
                self.config.box_settings.capacity,
            ),
            events: settlement.events,
        })
    }

    /// Change the box's presentation style. Does not settle.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::UnknownStyle`] if `style` is not configured, or
    /// [`BoxError::Repository`] if storage fails.
    pub async fn set_style(
        &self,
        key: &BoxKey,
        style: &str,
        now: DateTime<Utc>,
    ) -> Result<BoxReport, BoxError> {
        if !self.config.box_settings.styles.iter().any(|s| s == style) {
            return Err(BoxError::UnknownStyle {
                style: style.to_owned(),
            });
        }
        let _guard = self.locks.acquire(key).await;
        let mut record = self.get_or_create(key, now).await?;
        if record.style != style {
            style.clone_into(&mut record.style);
            self.persist(&record, &BTreeSet::from([BoxField::Style]))
                .await?;
            info!(%key, style, "style changed");
        }
        Ok(BoxReport {
            record,
            events: Vec::new(),
        })
    }

    /// The species catalogue, with owned counts when `key` is given.
    ///
    /// # Errors
    ///
    /// Returns [`BoxError::Repository`] if storage fails.
    pub async fn catalogue(
        &self,
        key: Option<&BoxKey>,
        now: DateTime<Utc>,
    ) -> Result<Vec<CatalogueEntry>, BoxError> {
        let species = self.repository.get_species_meta(None).await?;
        let Some(key) = key else {
            return Ok(catalogue::catalogue(&species, None));
        };
        let _guard = self.locks.acquire(key).await;
        let record = self.get_or_create(key, now).await?;
        Ok(catalogue::catalogue(&species, Some(&record)))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn get_or_create(&self, key: &BoxKey, now: DateTime<Utc>) -> Result<JellyfishBox, BoxError> {
        let backdated = clock::backdate(now, self.config.box_settings.initial_backdate_hours);
        let fresh = JellyfishBox::new(key, backdated, clock::truncate_to_hour(backdated));
        Ok(self.repository.get_or_create_box(&fresh).await?)
    }

    async fn load(&self, key: &BoxKey, now: DateTime<Utc>) -> Result<Loaded, BoxError> {
        let record = self.get_or_create(key, now).await?;
        let species = self.repository.get_species_meta(None).await?;
        let events = self.repository.get_event_meta().await?;
        let by_id = catalogue::index_species(&species);
        Ok(Loaded {
            record,
            species,
            by_id,
            events,
        })
    }

    async fn settle(
        &self,
        loaded: &Loaded,
        now: DateTime<Utc>,
    ) -> Result<(JellyfishBox, Settlement), BoxError> {
        let privileged = self.config.is_test_account(&loaded.record.user_id);
        let ctx = SettlementContext {
            species: &loaded.by_id,
            events: &loaded.events,
            config: &self.config,
        };
        let mut rng = self.rng.lock().await;
        Ok(settlement::settle(
            &loaded.record,
            now,
            privileged,
            ctx,
            &mut *rng,
        )?)
    }

    async fn persist(&self, record: &JellyfishBox, fields: &BTreeSet<BoxField>) -> Result<(), BoxError> {
        if fields.is_empty() {
            return Ok(());
        }
        self.repository.save_box(record, fields).await.map_err(|err| {
            warn!(key = %record.key(), error = %err, "failed to persist box");
            BoxError::from(err)
        })
    }
}
