//! Course table-of-contents collaborator
//!
//! Supplies, per lesson, the ordered source objects that feed automatic zone
//! placement. Fetching is cooperative: progress is reported and a
//! cancellation flag is polled between lesson fetches, so only a completed,
//! validated table of contents (or a failure) ever reaches the core.

mod fetch;
mod types;

pub use fetch::{CancelFlag, FetchProgress, HttpLessonSource, LessonSource, TocFetcher};
pub use types::{CourseToc, Lesson, LessonObject};
