//! Item storage interface and implementations
//!
//! This module defines the contract the arena needs from whatever persists
//! items (a relational table, a key-value store, or the in-memory map used by
//! tests and the simulator).

pub mod memory;

pub use memory::InMemoryItemRepository;

use crate::error::Result;
use crate::types::{Item, ItemStatus};
use async_trait::async_trait;

/// Trait for item storage operations
///
/// Implementations must serialize updates per item: an `atomic_update` built
/// from a stale read has to fail with `Conflict` instead of overwriting the
/// newer state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Active items of a topic, in insertion order
    async fn get_eligible(&self, topic_id: &str) -> Result<Vec<Item>>;

    /// All items of a topic including retired ones, in insertion order
    async fn get_all(&self, topic_id: &str) -> Result<Vec<Item>>;

    /// Fetch one item, failing with `NotFound` when it does not exist
    async fn get_by_id(&self, item_id: &str) -> Result<Item>;

    /// Write both items as one unit
    ///
    /// Each item carries the `version` it was read at. If either stored
    /// version moved on, nothing is written and `Conflict` is returned.
    async fn atomic_update(&self, winner: &Item, loser: &Item) -> Result<()>;

    /// Add a new item, failing with `DuplicateItem` when the id is taken
    async fn insert(&self, item: Item) -> Result<()>;

    /// Retire or restore an item; history is kept either way
    async fn set_status(&self, item_id: &str, status: ItemStatus) -> Result<Item>;
}
