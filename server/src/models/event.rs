use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::ObjectId;
use crate::services::mapper;
use crate::utils::error::AppResult;

/// A bookable event as persisted. Start and end are absolute instants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: ObjectId,
    pub name: String,
    pub location_id: String,
    pub location: String,
    pub description: String,
    pub guests: Vec<String>,
    pub owner: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything the client controls on an event. End is not checked against
/// start.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub name: String,
    pub location_id: String,
    pub location: String,
    pub description: String,
    pub guests: Vec<String>,
    pub owner: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Start/end split into calendar fields in the fixed +07:00 offset. The date
/// is shared, so an event crossing midnight cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecomposedTiming {
    pub year: i32,
    pub month: u32,
    pub date: u32,
    pub start_hour: u32,
    pub start_minute: u32,
    pub end_hour: u32,
    pub end_minute: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: ObjectId,
    pub name: String,
    pub location_id: String,
    pub location: String,
    pub description: String,
    pub guests: Vec<String>,
    pub owner: String,
    #[serde(flatten)]
    pub timing: DecomposedTiming,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Event request body. Timing comes either as RFC 3339 instants or in the
/// decomposed response shape.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    pub name: String,
    pub location_id: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub guests: Vec<String>,
    pub owner: String,
    #[serde(flatten)]
    pub timing: EventTiming,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EventTiming {
    Instants {
        start_time: DateTime<FixedOffset>,
        end_time: DateTime<FixedOffset>,
    },
    Decomposed(DecomposedTiming),
}

impl EventPayload {
    pub fn into_new_event(self) -> AppResult<NewEvent> {
        let (start_time, end_time) = match self.timing {
            EventTiming::Instants {
                start_time,
                end_time,
            } => (start_time.with_timezone(&Utc), end_time.with_timezone(&Utc)),
            EventTiming::Decomposed(timing) => mapper::compose(&timing)?,
        };

        Ok(NewEvent {
            name: self.name,
            location_id: self.location_id,
            location: self.location,
            description: self.description,
            guests: self.guests,
            owner: self.owner,
            start_time,
            end_time,
        })
    }
}
