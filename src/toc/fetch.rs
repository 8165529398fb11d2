//! Cooperative table-of-contents fetch
//!
//! Fetches lessons one by one, reporting progress and polling a cancellation
//! flag between fetches. On cancellation the partial result is dropped and
//! the caller gets `MarkupError::Cancelled`; the registry never sees an
//! unfinished table of contents.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use super::types::{CourseToc, Lesson};
use crate::error::{MarkupError, Result};

/// Externally settable cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    inner: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.load(Ordering::SeqCst)
    }
}

/// Progress report emitted after each lesson fetch
#[derive(Debug, Clone)]
pub struct FetchProgress {
    pub job_id: Uuid,
    pub lesson_id: String,
    pub fetched: usize,
    pub total: usize,
}

/// Course-system lesson provider
#[async_trait]
pub trait LessonSource: Send + Sync {
    /// Ids of all lessons, in course order
    async fn list_lessons(&self) -> Result<Vec<String>>;

    /// Fetch one lesson with its objects
    async fn fetch_lesson(&self, lesson_id: &str) -> Result<Lesson>;
}

/// HTTP lesson source against the course-management system
pub struct HttpLessonSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLessonSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LessonSource for HttpLessonSource {
    async fn list_lessons(&self) -> Result<Vec<String>> {
        let url = format!("{}/lessons", self.base_url);
        let ids = self.client.get(&url).send().await?.error_for_status()?.json().await?;
        Ok(ids)
    }

    async fn fetch_lesson(&self, lesson_id: &str) -> Result<Lesson> {
        let url = format!("{}/lessons/{}", self.base_url, lesson_id);
        let lesson = self.client.get(&url).send().await?.error_for_status()?.json().await?;
        Ok(lesson)
    }
}

/// Fetches a whole table of contents from a lesson source
pub struct TocFetcher<'a, S: LessonSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: LessonSource + ?Sized> TocFetcher<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Fetch every lesson, polling `cancel` between fetches
    pub async fn fetch(
        &self,
        cancel: &CancelFlag,
        mut progress: impl FnMut(FetchProgress),
    ) -> Result<CourseToc> {
        let job_id = Uuid::new_v4();
        let lesson_ids = self.source.list_lessons().await?;
        let total = lesson_ids.len();
        tracing::info!(%job_id, total, "Fetching table of contents");

        let mut lessons = Vec::with_capacity(total);
        for (fetched, lesson_id) in lesson_ids.into_iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!(%job_id, fetched, total, "TOC fetch cancelled, dropping partial result");
                return Err(MarkupError::Cancelled);
            }
            let lesson = self.source.fetch_lesson(&lesson_id).await?;
            lessons.push(lesson);
            progress(FetchProgress {
                job_id,
                lesson_id,
                fetched: fetched + 1,
                total,
            });
        }

        tracing::info!(%job_id, total, "TOC fetch complete");
        Ok(CourseToc { lessons })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource {
        lessons: Vec<Lesson>,
    }

    impl StaticSource {
        fn with_count(count: usize) -> Self {
            Self {
                lessons: (0..count)
                    .map(|i| Lesson {
                        id: format!("l{}", i),
                        title: format!("Lesson {}", i),
                        objects: vec![],
                    })
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl LessonSource for StaticSource {
        async fn list_lessons(&self) -> Result<Vec<String>> {
            Ok(self.lessons.iter().map(|l| l.id.clone()).collect())
        }

        async fn fetch_lesson(&self, lesson_id: &str) -> Result<Lesson> {
            self.lessons
                .iter()
                .find(|l| l.id == lesson_id)
                .cloned()
                .ok_or_else(|| MarkupError::TocFetch(format!("unknown lesson {}", lesson_id)))
        }
    }

    #[tokio::test]
    async fn test_fetch_reports_progress_for_each_lesson() {
        let source = StaticSource::with_count(3);
        let cancel = CancelFlag::new();
        let mut reports = Vec::new();

        let toc = TocFetcher::new(&source)
            .fetch(&cancel, |p| reports.push((p.fetched, p.total)))
            .await
            .unwrap();

        assert_eq!(toc.lessons.len(), 3);
        assert_eq!(reports, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn test_cancellation_drops_partial_results() {
        let source = StaticSource::with_count(5);
        let cancel = CancelFlag::new();
        let cancel_after_two = cancel.clone();
        let mut fetched = 0usize;

        let result = TocFetcher::new(&source)
            .fetch(&cancel, |p| {
                fetched = p.fetched;
                if p.fetched == 2 {
                    cancel_after_two.cancel();
                }
            })
            .await;

        assert!(matches!(result, Err(MarkupError::Cancelled)));
        assert_eq!(fetched, 2);
    }

    #[tokio::test]
    async fn test_source_failure_propagates() {
        struct Failing;

        #[async_trait]
        impl LessonSource for Failing {
            async fn list_lessons(&self) -> Result<Vec<String>> {
                Ok(vec!["l1".into()])
            }

            async fn fetch_lesson(&self, _lesson_id: &str) -> Result<Lesson> {
                Err(MarkupError::TocFetch("backend unavailable".into()))
            }
        }

        let cancel = CancelFlag::new();
        let result = TocFetcher::new(&Failing).fetch(&cancel, |_| {}).await;
        assert!(matches!(result, Err(MarkupError::TocFetch(_))));
    }
}
