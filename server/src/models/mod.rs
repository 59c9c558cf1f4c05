use serde::{Deserialize, Serialize};

pub mod event;
pub mod id;
pub mod room;
pub mod venue;

pub use event::{DecomposedTiming, Event, EventPayload, EventResponse, EventTiming, NewEvent};
pub use id::ObjectId;
pub use room::{NewRoom, Room};
pub use venue::{NewVenue, Venue, VenueWithRooms};

/// Top-level `{"data": ...}` document wrapping every request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document<T> {
    pub data: T,
}
