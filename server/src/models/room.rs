use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::ObjectId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Room {
    pub id: ObjectId,
    pub name: String,
    pub venue_id: String,
    pub capacity: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewRoom {
    pub name: String,
    pub venue_id: String,
    #[serde(default)]
    pub capacity: String,
}
