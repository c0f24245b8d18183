#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod progress;
pub mod time;

pub use error::{CourseError, NotFoundError, ValidationError};
pub use time::{Clock, fixed_clock, fixed_now};
