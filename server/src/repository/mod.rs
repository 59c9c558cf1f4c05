//! Resource store seams. Each collection gets its own trait; a backend
//! implements all of them and [`ResourceStore`] on top.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, StoreBackend};
use crate::models::{Event, NewEvent, NewRoom, NewVenue, ObjectId, Room, Venue};
use crate::services::query::EventFilter;
use crate::utils::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait VenueRepository: Send + Sync {
    async fn list_venues(&self) -> AppResult<Vec<Venue>>;
    async fn find_venue(&self, id: &ObjectId) -> AppResult<Venue>;
    async fn insert_venue(&self, venue: NewVenue) -> AppResult<Venue>;
    /// Full replacement. Fails with `NotFound` without creating anything.
    async fn replace_venue(&self, id: &ObjectId, venue: NewVenue) -> AppResult<Venue>;
    async fn delete_venue(&self, id: &ObjectId) -> AppResult<()>;
}

#[async_trait]
pub trait RoomRepository: Send + Sync {
    async fn list_rooms(&self) -> AppResult<Vec<Room>>;
    async fn list_rooms_by_venue(&self, venue_id: &str) -> AppResult<Vec<Room>>;
    async fn find_room(&self, id: &ObjectId) -> AppResult<Room>;
    async fn insert_room(&self, room: NewRoom) -> AppResult<Room>;
    async fn replace_room(&self, id: &ObjectId, room: NewRoom) -> AppResult<Room>;
    async fn delete_room(&self, id: &ObjectId) -> AppResult<()>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    async fn list_events(&self, filter: &EventFilter) -> AppResult<Vec<Event>>;
    async fn find_event(&self, id: &ObjectId) -> AppResult<Event>;
    async fn insert_event(&self, event: NewEvent) -> AppResult<Event>;
    async fn replace_event(&self, id: &ObjectId, event: NewEvent) -> AppResult<Event>;
    async fn delete_event(&self, id: &ObjectId) -> AppResult<()>;
}

#[async_trait]
pub trait ResourceStore: VenueRepository + RoomRepository + EventRepository {
    fn backend(&self) -> StoreBackend;

    /// Releases connections on shutdown.
    async fn close(&self) {}
}

pub async fn open_store(config: &Config) -> AppResult<Arc<dyn ResourceStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let store = PgStore::connect(config).await?;
            Ok(Arc::new(store))
        }
    }
}
