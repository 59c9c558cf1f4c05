pub mod calendar;
pub mod mapper;
pub mod query;

pub use calendar::{Window, WindowPolicy, WindowResolver};
pub use query::{EventFilter, EventQueryEngine, Participant};
