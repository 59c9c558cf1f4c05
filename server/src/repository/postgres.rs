use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::config::{Config, StoreBackend};
use crate::models::{Event, NewEvent, NewRoom, NewVenue, ObjectId, Room, Venue};
use crate::repository::{EventRepository, ResourceStore, RoomRepository, VenueRepository};
use crate::services::query::EventFilter;
use crate::utils::error::{AppError, AppResult};

const VENUE_COLUMNS: &str = "id, name, created_at, updated_at";
const ROOM_COLUMNS: &str = "id, name, venue_id, capacity, created_at, updated_at";
const EVENT_COLUMNS: &str = "id, name, location_id, location, description, guests, owner, \
                             start_time, end_time, created_at, updated_at";

/// PostgreSQL-backed store. Every operation is bounded by `timeout`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub async fn connect(config: &Config) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.store_timeout)
            .connect(&config.database_url)
            .await?;

        tracing::info!("Successfully connected to database");

        sqlx::migrate!()
            .run(&pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.into()))?;

        tracing::info!("Migrations run successfully");

        Ok(Self::new(pool, config.store_timeout))
    }

    async fn bounded<T, F>(&self, operation: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        match tokio::time::timeout(self.timeout, operation).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => Err(AppError::StoreTimeout(self.timeout)),
        }
    }

    async fn delete_from(&self, table: &str, kind: &str, id: &ObjectId) -> AppResult<()> {
        let sql = format!("DELETE FROM {table} WHERE id = $1");
        let result = self
            .bounded(sqlx::query(&sql).bind(id).execute(&self.pool))
            .await?;

        if result.rows_affected() == 0 {
            return Err(missing(kind, id));
        }
        Ok(())
    }
}

fn missing(kind: &str, id: &ObjectId) -> AppError {
    AppError::NotFound(format!("{kind} with id '{id}' was not found"))
}

/// Window bounds are inclusive. The participant clause is parenthesised so it
/// binds as one AND term.
fn event_filter_query(filter: &EventFilter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE start_time >= "
    ));
    query
        .push_bind(filter.window.start_utc())
        .push(" AND start_time <= ")
        .push_bind(filter.window.end_utc());

    if let Some(rooms) = &filter.rooms {
        query
            .push(" AND location_id = ANY(")
            .push_bind(rooms.clone())
            .push(")");
    }

    if let Some(participant) = &filter.participant {
        query
            .push(" AND (owner = ")
            .push_bind(participant.owner.clone())
            .push(" OR ")
            .push_bind(participant.guest.clone())
            .push(" = ANY(guests))");
    }

    query.push(" ORDER BY start_time, id");
    query
}

#[async_trait]
impl VenueRepository for PgStore {
    async fn list_venues(&self) -> AppResult<Vec<Venue>> {
        let sql = format!("SELECT {VENUE_COLUMNS} FROM venues ORDER BY created_at, id");
        self.bounded(sqlx::query_as::<_, Venue>(&sql).fetch_all(&self.pool))
            .await
    }

    async fn find_venue(&self, id: &ObjectId) -> AppResult<Venue> {
        let sql = format!("SELECT {VENUE_COLUMNS} FROM venues WHERE id = $1");
        self.bounded(
            sqlx::query_as::<_, Venue>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| missing("Venue", id))
    }

    async fn insert_venue(&self, venue: NewVenue) -> AppResult<Venue> {
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO venues ({VENUE_COLUMNS}) VALUES ($1, $2, $3, $3) RETURNING {VENUE_COLUMNS}"
        );
        self.bounded(
            sqlx::query_as::<_, Venue>(&sql)
                .bind(ObjectId::generate())
                .bind(venue.name)
                .bind(now)
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn replace_venue(&self, id: &ObjectId, venue: NewVenue) -> AppResult<Venue> {
        let sql = format!(
            "UPDATE venues SET name = $2, updated_at = $3 WHERE id = $1 RETURNING {VENUE_COLUMNS}"
        );
        self.bounded(
            sqlx::query_as::<_, Venue>(&sql)
                .bind(id)
                .bind(venue.name)
                .bind(Utc::now())
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| missing("Venue", id))
    }

    async fn delete_venue(&self, id: &ObjectId) -> AppResult<()> {
        self.delete_from("venues", "Venue", id).await
    }
}

#[async_trait]
impl RoomRepository for PgStore {
    async fn list_rooms(&self) -> AppResult<Vec<Room>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms ORDER BY created_at, id");
        self.bounded(sqlx::query_as::<_, Room>(&sql).fetch_all(&self.pool))
            .await
    }

    async fn list_rooms_by_venue(&self, venue_id: &str) -> AppResult<Vec<Room>> {
        let sql = format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE venue_id = $1 ORDER BY created_at, id"
        );
        self.bounded(
            sqlx::query_as::<_, Room>(&sql)
                .bind(venue_id)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn find_room(&self, id: &ObjectId) -> AppResult<Room> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1");
        self.bounded(
            sqlx::query_as::<_, Room>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| missing("Room", id))
    }

    async fn insert_room(&self, room: NewRoom) -> AppResult<Room> {
        let sql = format!(
            "INSERT INTO rooms ({ROOM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $5) \
             RETURNING {ROOM_COLUMNS}"
        );
        self.bounded(
            sqlx::query_as::<_, Room>(&sql)
                .bind(ObjectId::generate())
                .bind(room.name)
                .bind(room.venue_id)
                .bind(room.capacity)
                .bind(Utc::now())
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn replace_room(&self, id: &ObjectId, room: NewRoom) -> AppResult<Room> {
        let sql = format!(
            "UPDATE rooms SET name = $2, venue_id = $3, capacity = $4, updated_at = $5 \
             WHERE id = $1 RETURNING {ROOM_COLUMNS}"
        );
        self.bounded(
            sqlx::query_as::<_, Room>(&sql)
                .bind(id)
                .bind(room.name)
                .bind(room.venue_id)
                .bind(room.capacity)
                .bind(Utc::now())
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| missing("Room", id))
    }

    async fn delete_room(&self, id: &ObjectId) -> AppResult<()> {
        self.delete_from("rooms", "Room", id).await
    }
}

#[async_trait]
impl EventRepository for PgStore {
    async fn list_events(&self, filter: &EventFilter) -> AppResult<Vec<Event>> {
        let mut query = event_filter_query(filter);
        self.bounded(query.build_query_as::<Event>().fetch_all(&self.pool))
            .await
    }

    async fn find_event(&self, id: &ObjectId) -> AppResult<Event> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        self.bounded(
            sqlx::query_as::<_, Event>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| missing("Event", id))
    }

    async fn insert_event(&self, event: NewEvent) -> AppResult<Event> {
        let sql = format!(
            "INSERT INTO events ({EVENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) \
             RETURNING {EVENT_COLUMNS}"
        );
        self.bounded(
            sqlx::query_as::<_, Event>(&sql)
                .bind(ObjectId::generate())
                .bind(event.name)
                .bind(event.location_id)
                .bind(event.location)
                .bind(event.description)
                .bind(event.guests)
                .bind(event.owner)
                .bind(event.start_time)
                .bind(event.end_time)
                .bind(Utc::now())
                .fetch_one(&self.pool),
        )
        .await
    }

    async fn replace_event(&self, id: &ObjectId, event: NewEvent) -> AppResult<Event> {
        let sql = format!(
            "UPDATE events SET name = $2, location_id = $3, location = $4, description = $5, \
             guests = $6, owner = $7, start_time = $8, end_time = $9, updated_at = $10 \
             WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        );
        self.bounded(
            sqlx::query_as::<_, Event>(&sql)
                .bind(id)
                .bind(event.name)
                .bind(event.location_id)
                .bind(event.location)
                .bind(event.description)
                .bind(event.guests)
                .bind(event.owner)
                .bind(event.start_time)
                .bind(event.end_time)
                .bind(Utc::now())
                .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(|| missing("Event", id))
    }

    async fn delete_event(&self, id: &ObjectId) -> AppResult<()> {
        self.delete_from("events", "Event", id).await
    }
}

#[async_trait]
impl ResourceStore for PgStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Postgres
    }

    async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}
