//! Persistence boundary of the box service.
//!
//! [`BoxRepository`] is the only way the core touches storage. The
//! `PostgreSQL` implementation lives in `jellybox-db`;
//! [`MemoryRepository`] backs tests and local experiments.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::RwLock;

use jellybox_types::{BoxField, BoxKey, EventMeta, JellyfishBox, SpeciesMeta};

use crate::error::RepositoryError;

/// Storage for boxes and the static catalogue.
pub trait BoxRepository: Send + Sync {
    /// Return the stored box for `fresh`'s key, storing `fresh` first if
    /// no box exists yet.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the store cannot be read or written.
    fn get_or_create_box(
        &self,
        fresh: &JellyfishBox,
    ) -> impl Future<Output = Result<JellyfishBox, RepositoryError>> + Send;

    /// Species metadata, restricted to `ids` when given.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the store cannot be read.
    fn get_species_meta(
        &self,
        ids: Option<&BTreeSet<String>>,
    ) -> impl Future<Output = Result<Vec<SpeciesMeta>, RepositoryError>> + Send;

    /// The full world event table.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the store cannot be read.
    fn get_event_meta(&self) -> impl Future<Output = Result<Vec<EventMeta>, RepositoryError>> + Send;

    /// Persist the listed `fields` of `record`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the write fails; nothing is written
    /// in that case.
    fn save_box(
        &self,
        record: &JellyfishBox,
        fields: &BTreeSet<BoxField>,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// In-process repository.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    boxes: RwLock<HashMap<BoxKey, JellyfishBox>>,
    species: RwLock<Vec<SpeciesMeta>>,
    events: RwLock<Vec<EventMeta>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryRepository {
    /// An empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// A repository preloaded with a catalogue.
    pub fn with_catalogue(species: Vec<SpeciesMeta>, events: Vec<EventMeta>) -> Self {
        Self {
            species: RwLock::new(species),
            events: RwLock::new(events),
            ..Self::default()
        }
    }

    /// Store `record` directly, replacing any box with the same key.
    pub async fn insert_box(&self, record: JellyfishBox) {
        self.boxes.write().await.insert(record.key(), record);
    }

    /// The stored box for `key`, if any.
    pub async fn stored_box(&self, key: &BoxKey) -> Option<JellyfishBox> {
        self.boxes.read().await.get(key).cloned()
    }

    /// Make every subsequent write fail with [`RepositoryError::Unavailable`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful [`BoxRepository::save_box`] calls.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable {
                message: "memory repository is read-only".to_owned(),
            });
        }
        Ok(())
    }
}

impl BoxRepository for MemoryRepository {
    async fn get_or_create_box(&self, fresh: &JellyfishBox) -> Result<JellyfishBox, RepositoryError> {
        let key = fresh.key();
        if let Some(existing) = self.boxes.read().await.get(&key) {
            return Ok(existing.clone());
        }
        self.check_writable()?;
        let mut boxes = self.boxes.write().await;
        Ok(boxes.entry(key).or_insert_with(|| fresh.clone()).clone())
    }

    async fn get_species_meta(
        &self,
        ids: Option<&BTreeSet<String>>,
    ) -> Result<Vec<SpeciesMeta>, RepositoryError> {
        let species = self.species.read().await;
        Ok(species
            .iter()
            .filter(|meta| ids.is_none_or(|wanted| wanted.contains(&meta.id)))
            .cloned()
            .collect())
    }

    async fn get_event_meta(&self) -> Result<Vec<EventMeta>, RepositoryError> {
        Ok(self.events.read().await.clone())
    }

    async fn save_box(
        &self,
        record: &JellyfishBox,
        fields: &BTreeSet<BoxField>,
    ) -> Result<(), RepositoryError> {
        self.check_writable()?;
        let mut boxes = self.boxes.write().await;
        let stored = boxes
            .get_mut(&record.key())
            .ok_or_else(|| RepositoryError::Corrupt {
                message: format!("box {} was never created", record.key()),
            })?;
        for field in fields {
            match field {
                BoxField::Inventory => stored.inventory.clone_from(&record.inventory),
                BoxField::Decorations => stored.decorations.clone_from(&record.decorations),
                BoxField::LastCatchTime => stored.last_catch_time = record.last_catch_time,
                BoxField::LastRefreshTime => stored.last_refresh_time = record.last_refresh_time,
                BoxField::Environment => {
                    stored.salinity = record.salinity;
                    stored.temperature = record.temperature;
                }
                BoxField::Style => stored.style.clone_from(&record.style),
            }
        }
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use jellybox_types::Group;

    use super::*;

    fn fresh(user: &str) -> JellyfishBox {
        let now = Utc::now();
        JellyfishBox::new(&BoxKey::new(user, "qq"), now, now)
    }

    #[tokio::test]
    async fn get_or_create_returns_existing() {
        let repo = MemoryRepository::new();
        let first = repo.get_or_create_box(&fresh("u1")).await.unwrap();
        let second = repo.get_or_create_box(&fresh("u1")).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn save_writes_only_listed_fields() {
        let repo = MemoryRepository::new();
        let mut record = repo.get_or_create_box(&fresh("u1")).await.unwrap();
        record.inventory.insert("moon".to_owned(), 3);
        record.style = "pixel".to_owned();
        repo.save_box(&record, &BTreeSet::from([BoxField::Inventory]))
            .await
            .unwrap();
        let stored = repo.stored_box(&record.key()).await.unwrap();
        assert_eq!(stored.count_of("moon"), 3);
        assert_eq!(stored.style, "normal");
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test]
    async fn failed_writes_leave_state_untouched() {
        let repo = MemoryRepository::new();
        let mut record = repo.get_or_create_box(&fresh("u1")).await.unwrap();
        repo.set_fail_writes(true);
        record.inventory.insert("moon".to_owned(), 3);
        let result = repo
            .save_box(&record, &BTreeSet::from([BoxField::Inventory]))
            .await;
        assert!(matches!(result, Err(RepositoryError::Unavailable { .. })));
        let stored = repo.stored_box(&record.key()).await.unwrap();
        assert!(stored.inventory.is_empty());
    }

    #[tokio::test]
    async fn species_filter_by_ids() {
        let meta = |id: &str| SpeciesMeta {
            id: id.to_owned(),
            name: id.to_owned(),
            group: Group::Normal,
            description: String::new(),
            reproductive_rate: 0.0,
            draw_size: 1.0,
        };
        let repo = MemoryRepository::with_catalogue(vec![meta("a"), meta("b")], Vec::new());
        let wanted = BTreeSet::from(["b".to_owned()]);
        let filtered = repo.get_species_meta(Some(&wanted)).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(repo.get_species_meta(None).await.unwrap().len(), 2);
    }
}
