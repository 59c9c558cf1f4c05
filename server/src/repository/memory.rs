use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::config::StoreBackend;
use crate::models::{Event, NewEvent, NewRoom, NewVenue, ObjectId, Room, Venue};
use crate::repository::{EventRepository, ResourceStore, RoomRepository, VenueRepository};
use crate::services::query::EventFilter;
use crate::utils::error::{AppError, AppResult};

trait Record: Clone {
    const KIND: &'static str;

    fn id(&self) -> &ObjectId;
}

impl Record for Venue {
    const KIND: &'static str = "Venue";

    fn id(&self) -> &ObjectId {
        &self.id
    }
}

impl Record for Room {
    const KIND: &'static str = "Room";

    fn id(&self) -> &ObjectId {
        &self.id
    }
}

impl Record for Event {
    const KIND: &'static str = "Event";

    fn id(&self) -> &ObjectId {
        &self.id
    }
}

fn not_found<T: Record>(id: &ObjectId) -> AppError {
    AppError::NotFound(format!("{} with id '{}' was not found", T::KIND, id))
}

/// Insertion-ordered records behind an async lock.
struct Collection<T> {
    records: RwLock<Vec<T>>,
}

impl<T: Record> Collection<T> {
    fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    async fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<T> {
        self.records
            .read()
            .await
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    async fn find(&self, id: &ObjectId) -> AppResult<T> {
        self.records
            .read()
            .await
            .iter()
            .find(|record| record.id() == id)
            .cloned()
            .ok_or_else(|| not_found::<T>(id))
    }

    async fn insert(&self, record: T) -> T {
        self.records.write().await.push(record.clone());
        record
    }

    async fn replace(&self, id: &ObjectId, rebuild: impl FnOnce(&T) -> T) -> AppResult<T> {
        let mut records = self.records.write().await;
        let slot = records
            .iter_mut()
            .find(|record| record.id() == id)
            .ok_or_else(|| not_found::<T>(id))?;
        *slot = rebuild(&*slot);
        Ok(slot.clone())
    }

    async fn delete(&self, id: &ObjectId) -> AppResult<()> {
        let mut records = self.records.write().await;
        let index = records
            .iter()
            .position(|record| record.id() == id)
            .ok_or_else(|| not_found::<T>(id))?;
        records.remove(index);
        Ok(())
    }
}

/// Process-local store for development and tests.
pub struct MemoryStore {
    venues: Collection<Venue>,
    rooms: Collection<Room>,
    events: Collection<Event>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            venues: Collection::new(),
            rooms: Collection::new(),
            events: Collection::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VenueRepository for MemoryStore {
    async fn list_venues(&self) -> AppResult<Vec<Venue>> {
        Ok(self.venues.filter(|_| true).await)
    }

    async fn find_venue(&self, id: &ObjectId) -> AppResult<Venue> {
        self.venues.find(id).await
    }

    async fn insert_venue(&self, venue: NewVenue) -> AppResult<Venue> {
        let now = Utc::now();
        let record = Venue {
            id: ObjectId::generate(),
            name: venue.name,
            created_at: now,
            updated_at: now,
        };
        Ok(self.venues.insert(record).await)
    }

    async fn replace_venue(&self, id: &ObjectId, venue: NewVenue) -> AppResult<Venue> {
        self.venues
            .replace(id, |current| Venue {
                id: current.id.clone(),
                name: venue.name,
                created_at: current.created_at,
                updated_at: Utc::now(),
            })
            .await
    }

    async fn delete_venue(&self, id: &ObjectId) -> AppResult<()> {
        self.venues.delete(id).await
    }
}

#[async_trait]
impl RoomRepository for MemoryStore {
    async fn list_rooms(&self) -> AppResult<Vec<Room>> {
        Ok(self.rooms.filter(|_| true).await)
    }

    async fn list_rooms_by_venue(&self, venue_id: &str) -> AppResult<Vec<Room>> {
        Ok(self.rooms.filter(|room| room.venue_id == venue_id).await)
    }

    async fn find_room(&self, id: &ObjectId) -> AppResult<Room> {
        self.rooms.find(id).await
    }

    async fn insert_room(&self, room: NewRoom) -> AppResult<Room> {
        let now = Utc::now();
        let record = Room {
            id: ObjectId::generate(),
            name: room.name,
            venue_id: room.venue_id,
            capacity: room.capacity,
            created_at: now,
            updated_at: now,
        };
        Ok(self.rooms.insert(record).await)
    }

    async fn replace_room(&self, id: &ObjectId, room: NewRoom) -> AppResult<Room> {
        self.rooms
            .replace(id, |current| Room {
                id: current.id.clone(),
                name: room.name,
                venue_id: room.venue_id,
                capacity: room.capacity,
                created_at: current.created_at,
                updated_at: Utc::now(),
            })
            .await
    }

    async fn delete_room(&self, id: &ObjectId) -> AppResult<()> {
        self.rooms.delete(id).await
    }
}

#[async_trait]
impl EventRepository for MemoryStore {
    async fn list_events(&self, filter: &EventFilter) -> AppResult<Vec<Event>> {
        let mut events = self.events.filter(|event| filter.matches(event)).await;
        events.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        Ok(events)
    }

    async fn find_event(&self, id: &ObjectId) -> AppResult<Event> {
        self.events.find(id).await
    }

    async fn insert_event(&self, event: NewEvent) -> AppResult<Event> {
        let now = Utc::now();
        let record = Event {
            id: ObjectId::generate(),
            name: event.name,
            location_id: event.location_id,
            location: event.location,
            description: event.description,
            guests: event.guests,
            owner: event.owner,
            start_time: event.start_time,
            end_time: event.end_time,
            created_at: now,
            updated_at: now,
        };
        Ok(self.events.insert(record).await)
    }

    async fn replace_event(&self, id: &ObjectId, event: NewEvent) -> AppResult<Event> {
        self.events
            .replace(id, |current| Event {
                id: current.id.clone(),
                name: event.name,
                location_id: event.location_id,
                location: event.location,
                description: event.description,
                guests: event.guests,
                owner: event.owner,
                start_time: event.start_time,
                end_time: event.end_time,
                created_at: current.created_at,
                updated_at: Utc::now(),
            })
            .await
    }

    async fn delete_event(&self, id: &ObjectId) -> AppResult<()> {
        self.events.delete(id).await
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(name: &str, venue_id: &str) -> NewRoom {
        NewRoom {
            name: name.into(),
            venue_id: venue_id.into(),
            capacity: "12".into(),
        }
    }

    #[tokio::test]
    async fn test_rooms_by_venue() {
        let store = MemoryStore::new();
        let alpha = store.insert_room(room("Alpha", "V1")).await.unwrap();
        store.insert_room(room("Beta", "V2")).await.unwrap();

        let rooms = store.list_rooms_by_venue("V1").await.unwrap();
        assert_eq!(rooms, vec![alpha]);
        assert!(store.list_rooms_by_venue("V3").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let store = MemoryStore::new();
        let first = store.insert_venue(NewVenue { name: "HQ".into() }).await.unwrap();
        let second = store.insert_venue(NewVenue { name: "HQ".into() }).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.created_at, first.updated_at);
        assert_eq!(store.find_venue(&first.id).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_replace_keeps_creation_time() {
        let store = MemoryStore::new();
        let created = store.insert_room(room("Alpha", "V1")).await.unwrap();

        let replaced = store
            .replace_room(&created.id, room("Alpha 2", "V2"))
            .await
            .unwrap();

        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.name, "Alpha 2");
        assert_eq!(replaced.venue_id, "V2");
        assert_eq!(replaced.created_at, created.created_at);
        assert!(replaced.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_replace_missing_creates_nothing() {
        let store = MemoryStore::new();
        let missing = ObjectId::generate();

        let result = store
            .replace_venue(&missing, NewVenue { name: "Ghost".into() })
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(store.list_venues().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let created = store.insert_venue(NewVenue { name: "HQ".into() }).await.unwrap();

        store.delete_venue(&created.id).await.unwrap();
        assert!(matches!(
            store.find_venue(&created.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_venue(&created.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
