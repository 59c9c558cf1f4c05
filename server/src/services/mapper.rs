//! Projection between stored events and the decomposed response shape.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Timelike, Utc};

use crate::models::{DecomposedTiming, Event, EventResponse};
use crate::services::calendar::local_offset;
use crate::utils::error::{AppError, AppResult};

/// Splits start/end into calendar fields at +07:00. The date comes from the
/// start instant only.
pub fn decompose(start: DateTime<Utc>, end: DateTime<Utc>) -> DecomposedTiming {
    let start = start.with_timezone(&local_offset());
    let end = end.with_timezone(&local_offset());

    DecomposedTiming {
        year: start.year(),
        month: start.month(),
        date: start.day(),
        start_hour: start.hour(),
        start_minute: start.minute(),
        end_hour: end.hour(),
        end_minute: end.minute(),
    }
}

/// Rebuilds both instants on the shared calendar date, seconds zeroed.
pub fn compose(timing: &DecomposedTiming) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let date = NaiveDate::from_ymd_opt(timing.year, timing.month, timing.date).ok_or_else(|| {
        AppError::ValidationError(format!(
            "{:04}-{:02}-{:02} is not a calendar date",
            timing.year, timing.month, timing.date
        ))
    })?;

    let at = |hour: u32, minute: u32| -> AppResult<DateTime<Utc>> {
        let naive = date.and_hms_opt(hour, minute, 0).ok_or_else(|| {
            AppError::ValidationError(format!("{hour:02}:{minute:02} is not a time of day"))
        })?;
        local_offset()
            .from_local_datetime(&naive)
            .single()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| AppError::ValidationError(format!("{naive} is out of range")))
    };

    Ok((
        at(timing.start_hour, timing.start_minute)?,
        at(timing.end_hour, timing.end_minute)?,
    ))
}

pub fn to_response(event: Event) -> EventResponse {
    let timing = decompose(event.start_time, event.end_time);

    EventResponse {
        id: event.id,
        name: event.name,
        location_id: event.location_id,
        location: event.location,
        description: event.description,
        guests: event.guests,
        owner: event.owner,
        timing,
        created_at: event.created_at,
        updated_at: event.updated_at,
    }
}

pub fn from_response(response: EventResponse) -> AppResult<Event> {
    let (start_time, end_time) = compose(&response.timing)?;

    Ok(Event {
        id: response.id,
        name: response.name,
        location_id: response.location_id,
        location: response.location,
        description: response.description,
        guests: response.guests,
        owner: response.owner,
        start_time,
        end_time,
        created_at: response.created_at,
        updated_at: response.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ObjectId;

    fn event(start: &str, end: &str) -> Event {
        Event {
            id: ObjectId::generate(),
            name: "Planning".into(),
            location_id: "R1".into(),
            location: "Alpha".into(),
            description: "sprint planning".into(),
            guests: vec!["u2".into(), "u3".into()],
            owner: "u1".into(),
            start_time: DateTime::parse_from_rfc3339(start).unwrap().with_timezone(&Utc),
            end_time: DateTime::parse_from_rfc3339(end).unwrap().with_timezone(&Utc),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 3, 2, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_forward_decomposes_in_local_offset() {
        // 22:30 UTC on the 3rd is 05:30 on the 4th at +07:00.
        let response = to_response(event("2024-03-03T22:30:00Z", "2024-03-04T01:45:00Z"));

        assert_eq!(
            response.timing,
            DecomposedTiming {
                year: 2024,
                month: 3,
                date: 4,
                start_hour: 5,
                start_minute: 30,
                end_hour: 8,
                end_minute: 45,
            }
        );
        assert_eq!(response.owner, "u1");
        assert_eq!(response.guests, vec!["u2", "u3"]);
        assert_eq!(response.location, "Alpha");
    }

    #[test]
    fn test_reverse_of_forward_is_identity() {
        for (start, end) in [
            ("2024-03-04T09:00:00+07:00", "2024-03-04T10:00:00+07:00"),
            ("2024-02-29T00:00:00+07:00", "2024-02-29T23:59:00+07:00"),
            ("2023-12-31T16:15:00Z", "2023-12-31T16:45:00Z"),
        ] {
            let original = event(start, end);
            let restored = from_response(to_response(original.clone())).unwrap();
            assert_eq!(restored, original);
        }
    }

    #[test]
    fn test_reverse_truncates_seconds() {
        let original = event("2024-03-04T09:00:42.5+07:00", "2024-03-04T10:00:00+07:00");
        let restored = from_response(to_response(original.clone())).unwrap();

        assert_ne!(restored.start_time, original.start_time);
        assert_eq!(
            restored.start_time,
            DateTime::parse_from_rfc3339("2024-03-04T09:00:00+07:00").unwrap()
        );
    }

    #[test]
    fn test_midnight_span_is_not_representable() {
        let original = event("2024-03-04T23:00:00+07:00", "2024-03-05T01:00:00+07:00");
        let restored = from_response(to_response(original.clone())).unwrap();

        // The end lands on the start's date.
        assert_eq!(
            restored.end_time,
            DateTime::parse_from_rfc3339("2024-03-04T01:00:00+07:00").unwrap()
        );
    }

    #[test]
    fn test_compose_rejects_invalid_fields() {
        let valid = DecomposedTiming {
            year: 2024,
            month: 3,
            date: 4,
            start_hour: 9,
            start_minute: 0,
            end_hour: 10,
            end_minute: 0,
        };
        assert!(compose(&valid).is_ok());

        for invalid in [
            DecomposedTiming { month: 13, ..valid },
            DecomposedTiming { year: 2023, month: 2, date: 29, ..valid },
            DecomposedTiming { start_hour: 24, ..valid },
            DecomposedTiming { end_minute: 60, ..valid },
        ] {
            assert!(matches!(compose(&invalid), Err(AppError::ValidationError(_))));
        }
    }
}
