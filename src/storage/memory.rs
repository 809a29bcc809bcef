//! In-memory item storage
//!
//! Stands in for the production store in tests, benchmarks and the simulator.
//! Per-item serialization is optimistic: every committed write bumps the
//! item's `version`, and a write carrying an outdated version is rejected.

use crate::error::{ArenaError, Result};
use crate::storage::ItemRepository;
use crate::types::{Item, ItemId, ItemStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Debug, Default)]
struct ItemTable {
    items: HashMap<ItemId, Item>,
    /// Insertion order, used for stable listing
    order: Vec<ItemId>,
}

impl ItemTable {
    fn topic_items<'a>(&'a self, topic_id: &'a str) -> impl Iterator<Item = &'a Item> + 'a {
        self.order
            .iter()
            .filter_map(|id| self.items.get(id))
            .filter(move |item| item.topic_id == topic_id)
    }

    fn check_version(&self, candidate: &Item) -> Result<()> {
        let stored = self
            .items
            .get(&candidate.id)
            .ok_or_else(|| ArenaError::NotFound {
                item_id: candidate.id.clone(),
            })?;

        if stored.version != candidate.version {
            return Err(ArenaError::Conflict {
                item_id: candidate.id.clone(),
            });
        }

        Ok(())
    }

    fn commit(&mut self, candidate: &Item) {
        let mut next = candidate.clone();
        next.version = candidate.version + 1;
        self.items.insert(next.id.clone(), next);
    }
}

/// In-memory item storage implementation
#[derive(Debug, Default)]
pub struct InMemoryItemRepository {
    table: RwLock<ItemTable>,
}

impl InMemoryItemRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with items
    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Result<Self> {
        let repository = Self::new();
        {
            let mut table = repository.write()?;
            for item in items {
                if table.items.contains_key(&item.id) {
                    return Err(ArenaError::DuplicateItem { item_id: item.id });
                }
                table.order.push(item.id.clone());
                table.items.insert(item.id.clone(), item);
            }
        }
        Ok(repository)
    }

    /// Total number of stored items across all topics
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.items.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, ItemTable>> {
        self.table.read().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire items read lock".to_string(),
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, ItemTable>> {
        self.table.write().map_err(|_| ArenaError::InternalError {
            message: "Failed to acquire items write lock".to_string(),
        })
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn get_eligible(&self, topic_id: &str) -> Result<Vec<Item>> {
        let table = self.read()?;
        Ok(table
            .topic_items(topic_id)
            .filter(|item| item.is_active())
            .cloned()
            .collect())
    }

    async fn get_all(&self, topic_id: &str) -> Result<Vec<Item>> {
        let table = self.read()?;
        Ok(table.topic_items(topic_id).cloned().collect())
    }

    async fn get_by_id(&self, item_id: &str) -> Result<Item> {
        let table = self.read()?;
        table
            .items
            .get(item_id)
            .cloned()
            .ok_or_else(|| ArenaError::NotFound {
                item_id: item_id.to_string(),
            })
    }

    async fn atomic_update(&self, winner: &Item, loser: &Item) -> Result<()> {
        if winner.id == loser.id {
            return Err(ArenaError::InvalidVote {
                reason: format!("item {} cannot be compared with itself", winner.id),
            });
        }

        // Both checks happen under the same write lock as both writes.
        let mut table = self.write()?;
        table.check_version(winner)?;
        table.check_version(loser)?;
        table.commit(winner);
        table.commit(loser);

        debug!(
            winner_id = %winner.id,
            loser_id = %loser.id,
            "Committed paired item update"
        );
        Ok(())
    }

    async fn insert(&self, item: Item) -> Result<()> {
        let mut table = self.write()?;
        if table.items.contains_key(&item.id) {
            return Err(ArenaError::DuplicateItem { item_id: item.id });
        }
        table.order.push(item.id.clone());
        table.items.insert(item.id.clone(), item);
        Ok(())
    }

    async fn set_status(&self, item_id: &str, status: ItemStatus) -> Result<Item> {
        let mut table = self.write()?;
        let item = table
            .items
            .get_mut(item_id)
            .ok_or_else(|| ArenaError::NotFound {
                item_id: item_id.to_string(),
            })?;
        item.status = status;
        item.version += 1;
        Ok(item.clone())
    }
}
