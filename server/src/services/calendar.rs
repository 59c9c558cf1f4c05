//! Calendar window resolution for event queries.
//!
//! Every window is computed and reported in a fixed +07:00 offset, no matter
//! which offset a client-supplied bound carried.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday,
};

use crate::utils::error::{AppError, AppResult};

pub const LOCAL_OFFSET_SECS: i32 = 7 * 60 * 60;

/// First day of a calendar week.
pub const WEEK_START: Weekday = Weekday::Sun;

pub fn local_offset() -> FixedOffset {
    FixedOffset::east_opt(LOCAL_OFFSET_SECS).expect("+07:00 is a valid UTC offset")
}

/// Which calendar period supplies the default bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WindowPolicy {
    #[default]
    Week,
    Month,
}

impl FromStr for WindowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(format!("unknown window policy '{other}'")),
        }
    }
}

impl fmt::Display for WindowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Week => f.write_str("week"),
            Self::Month => f.write_str("month"),
        }
    }
}

/// Closed interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl Window {
    pub fn start_utc(&self) -> DateTime<Utc> {
        self.start.with_timezone(&Utc)
    }

    pub fn end_utc(&self) -> DateTime<Utc> {
        self.end.with_timezone(&Utc)
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start_utc() && *instant <= self.end_utc()
    }

    /// The week (per [`WEEK_START`]) containing `anchor`.
    pub fn week_of(anchor: DateTime<Utc>) -> AppResult<Self> {
        let date = anchor.with_timezone(&local_offset()).date_naive();
        let first = date - Duration::days(days_since_week_start(date.weekday()));
        let start = local_midnight(first)?;

        Ok(Self {
            start,
            end: start + Duration::days(7) - Duration::nanoseconds(1),
        })
    }

    /// The calendar month containing `anchor`.
    pub fn month_of(anchor: DateTime<Utc>) -> AppResult<Self> {
        let date = anchor.with_timezone(&local_offset()).date_naive();
        let (next_year, next_month) = if date.month() == 12 {
            (date.year() + 1, 1)
        } else {
            (date.year(), date.month() + 1)
        };

        let first = calendar_date(date.year(), date.month(), 1)?;
        let next = calendar_date(next_year, next_month, 1)?;

        Ok(Self {
            start: local_midnight(first)?,
            end: local_midnight(next)? - Duration::nanoseconds(1),
        })
    }
}

/// Days between the most recent [`WEEK_START`] and `day`, in `0..7`.
fn days_since_week_start(day: Weekday) -> i64 {
    let day = i64::from(day.num_days_from_monday());
    let start = i64::from(WEEK_START.num_days_from_monday());
    (day - start).rem_euclid(7)
}

fn calendar_date(year: i32, month: u32, day: u32) -> AppResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        AppError::ValidationError(format!("{year:04}-{month:02}-{day:02} is not a calendar date"))
    })
}

fn local_midnight(date: NaiveDate) -> AppResult<DateTime<FixedOffset>> {
    local_offset()
        .from_local_datetime(&date.and_time(NaiveTime::MIN))
        .single()
        .ok_or_else(|| AppError::ValidationError(format!("{date} is out of range")))
}

/// Parses an RFC 3339 bound and moves it into the +07:00 offset.
pub fn parse_bound(raw: &str) -> AppResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|instant| instant.with_timezone(&local_offset()))
        .map_err(|e| AppError::ValidationError(format!("'{raw}' is not an RFC 3339 timestamp: {e}")))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WindowResolver {
    policy: WindowPolicy,
}

impl WindowResolver {
    pub fn new(policy: WindowPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    pub fn default_window(&self, now: DateTime<Utc>) -> AppResult<Window> {
        match self.policy {
            WindowPolicy::Week => Window::week_of(now),
            WindowPolicy::Month => Window::month_of(now),
        }
    }

    /// Fills in whichever bound the client left out from the calendar period
    /// around `now`. Blank strings count as missing.
    pub fn resolve(
        &self,
        start: Option<&str>,
        end: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<Window> {
        let start = start.filter(|raw| !raw.trim().is_empty());
        let end = end.filter(|raw| !raw.trim().is_empty());

        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (parse_bound(start)?, parse_bound(end)?),
            (start, end) => {
                let default = self.default_window(now)?;
                (
                    start.map(parse_bound).transpose()?.unwrap_or(default.start),
                    end.map(parse_bound).transpose()?.unwrap_or(default.end),
                )
            }
        };

        if start > end {
            tracing::debug!(%start, %end, "window start is after its end, nothing will match");
        }

        Ok(Window { start, end })
    }
}
