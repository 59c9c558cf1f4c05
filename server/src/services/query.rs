//! Event search: room membership, start inside the window, and owner OR guest.

use crate::models::Event;
use crate::repository::EventRepository;
use crate::services::calendar::Window;
use crate::utils::error::AppResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub owner: String,
    pub guest: String,
}

impl Participant {
    /// Matches when `owner` owns the event or `guest` is on its guest list.
    pub fn matches(&self, event: &Event) -> bool {
        event.owner == self.owner || event.guests.iter().any(|g| *g == self.guest)
    }
}

/// Predicate handed to the store. `None` fields do not filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    pub window: Window,
    pub rooms: Option<Vec<String>>,
    pub participant: Option<Participant>,
}

impl EventFilter {
    pub fn within(window: Window) -> Self {
        Self {
            window,
            rooms: None,
            participant: None,
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.window.contains(&event.start_time)
            && self
                .rooms
                .as_ref()
                .map_or(true, |rooms| rooms.contains(&event.location_id))
            && self
                .participant
                .as_ref()
                .map_or(true, |participant| participant.matches(event))
    }
}

pub struct EventQueryEngine<'a, R: ?Sized> {
    events: &'a R,
}

impl<'a, R> EventQueryEngine<'a, R>
where
    R: EventRepository + ?Sized,
{
    pub fn new(events: &'a R) -> Self {
        Self { events }
    }

    /// Events in one of `room_ids`, starting inside `window`, owned by
    /// `owner` or listing `guest`. An empty room set matches nothing.
    pub async fn query(
        &self,
        room_ids: Vec<String>,
        owner: String,
        guest: String,
        window: Window,
    ) -> AppResult<Vec<Event>> {
        if room_ids.is_empty() {
            return Ok(Vec::new());
        }

        let filter = EventFilter {
            window,
            rooms: Some(room_ids),
            participant: Some(Participant { owner, guest }),
        };
        self.events.list_events(&filter).await
    }

    /// Every event starting inside `window`.
    pub async fn list_all(&self, window: Window) -> AppResult<Vec<Event>> {
        self.events.list_events(&EventFilter::within(window)).await
    }
}
