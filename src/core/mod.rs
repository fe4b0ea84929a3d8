pub mod error;
pub mod time;
pub mod types;

pub use error::{Result, TrackerError};
pub use time::{Clock, MS_PER_DAY, MS_PER_MINUTE, utc_date};
pub use types::{DEFAULT_DAILY_GOAL, Document, Event, ITEMS_PER_PAGE, Position};
