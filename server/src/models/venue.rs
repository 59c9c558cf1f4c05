use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::{ObjectId, Room};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Venue {
    pub id: ObjectId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVenue {
    pub name: String,
}

/// Venue with its rooms attached at read time.
#[derive(Debug, Clone, Serialize)]
pub struct VenueWithRooms {
    #[serde(flatten)]
    pub venue: Venue,
    pub rooms: Vec<Room>,
}
