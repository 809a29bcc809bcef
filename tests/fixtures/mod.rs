//! Test fixtures and repository wrappers for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use duel_arena::config::AppConfig;
use duel_arena::error::Result;
use duel_arena::storage::{InMemoryItemRepository, ItemRepository};
use duel_arena::types::{Item, ItemStatus, SkillEstimate};
use duel_arena::ArenaService;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const TOPIC: &str = "topic";

/// Build an item with the given skill in the shared test topic
pub fn item(id: &str, mu: f64, sigma: f64) -> Item {
    Item::new(id, TOPIC, id, SkillEstimate::new(mu, sigma))
}

/// Build an item at the default prior
pub fn fresh_item(id: &str) -> Item {
    Item::new(id, TOPIC, id, SkillEstimate::default())
}

/// Configuration with a fixed matchmaking seed
pub fn seeded_config(seed: u64) -> AppConfig {
    let mut config = AppConfig::default();
    config.matchmaking.seed = Some(seed);
    config
}

/// Service over an in-memory store preloaded with `items`
pub fn service_with(items: Vec<Item>) -> (ArenaService, Arc<InMemoryItemRepository>) {
    let repository = Arc::new(InMemoryItemRepository::with_items(items).unwrap());
    let service = ArenaService::new(&seeded_config(42), repository.clone()).unwrap();
    (service, repository)
}

/// Store that loses the race for its first `conflicts` commits
///
/// Before each of those commits it writes the winner again through the inner
/// store, exactly as a concurrent vote would, so the commit that follows is
/// stale and the inner store rejects it.
pub struct RacingRepository {
    inner: InMemoryItemRepository,
    conflicts: usize,
    commits: AtomicUsize,
}

impl RacingRepository {
    pub fn new(items: Vec<Item>, conflicts: usize) -> Self {
        Self {
            inner: InMemoryItemRepository::with_items(items).unwrap(),
            conflicts,
            commits: AtomicUsize::new(0),
        }
    }

    /// Number of commits attempted so far
    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ItemRepository for RacingRepository {
    async fn get_eligible(&self, topic_id: &str) -> Result<Vec<Item>> {
        self.inner.get_eligible(topic_id).await
    }

    async fn get_all(&self, topic_id: &str) -> Result<Vec<Item>> {
        self.inner.get_all(topic_id).await
    }

    async fn get_by_id(&self, item_id: &str) -> Result<Item> {
        self.inner.get_by_id(item_id).await
    }

    async fn atomic_update(&self, winner: &Item, loser: &Item) -> Result<()> {
        let attempt = self.commits.fetch_add(1, Ordering::SeqCst);
        if attempt < self.conflicts {
            self.inner.set_status(&winner.id, ItemStatus::Active).await?;
        }
        self.inner.atomic_update(winner, loser).await
    }

    async fn insert(&self, item: Item) -> Result<()> {
        self.inner.insert(item).await
    }

    async fn set_status(&self, item_id: &str, status: ItemStatus) -> Result<Item> {
        self.inner.set_status(item_id, status).await
    }
}
