//! Task execution: claim, generate, publish, and record the outcome.
//!
//! Claims use the version-guarded UPDATE in the store, so concurrent
//! executors racing for the same task resolve without locks: the loser of
//! a claim simply moves to the next candidate. The store mutex is held
//! only around individual store calls, never across generator or
//! publisher awaits, so a slow backend cannot starve other store users.
//! Every attempt leaves a publishing_log row, and every outcome feeds
//! the hourly analytics.

use crate::config::RetryConfig;
use crate::engine::retry::RetryPolicy;
use crate::error::{PostrError, Result};
use crate::id::generate_run_id;
use crate::publish::{ContentGenerator, Publisher};
use crate::store::{LogStatus, MediaType, PublishingLog, Task, TaskStatus, TaskStore, now_ms};
use log::{info, warn};
use rand::Rng;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Claim candidates fetched per attempt. Losing a claim race moves on to
/// the next candidate in the same batch.
const CLAIM_BATCH: usize = 10;

/// Task phases, recorded so the recovery sweep can apply phase-specific
/// stuck timeouts.
pub const PHASE_RUNNING: &str = "running";
pub const PHASE_PROCESSING: &str = "processing";
pub const PHASE_UPLOADING: &str = "uploading";

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub executed: usize,
    pub succeeded: usize,
    pub retried: usize,
    pub failed: usize,
}

/// Executes claimed tasks against the publishing backends.
pub struct TaskExecutor {
    generator: Arc<dyn ContentGenerator>,
    publisher: Arc<dyn Publisher>,
    policy: RetryPolicy,
    retry: RetryConfig,
}

impl TaskExecutor {
    pub fn new(generator: Arc<dyn ContentGenerator>, publisher: Arc<dyn Publisher>, retry: RetryConfig) -> Self {
        Self {
            generator,
            publisher,
            policy: RetryPolicy::new(retry.clone()),
            retry,
        }
    }

    /// Claim the highest-priority ready task, if any.
    ///
    /// Fetches a batch of candidates and attempts the conditional claim on
    /// each in order. A claim that matches zero rows means another worker
    /// got there first; that is not an error.
    pub async fn claim_next(
        &self,
        store: &Mutex<TaskStore>,
        project_id: Option<i64>,
        language: Option<&str>,
    ) -> Result<Option<Task>> {
        let mut store = store.lock().await;
        let candidates = store.next_ready(now_ms(), CLAIM_BATCH, project_id, language)?;
        for candidate in candidates {
            if store.claim_task(candidate.id, candidate.version)? {
                // Re-read to pick up the claimed status, phase, and version
                if let Some(task) = store.get_task(candidate.id)? {
                    return Ok(Some(task));
                }
            }
        }
        Ok(None)
    }

    /// Execute one claimed task end to end.
    ///
    /// Returns the log status recorded for the attempt. Publish failures
    /// never propagate as errors; they become retry or failed transitions.
    /// Store errors do propagate, leaving the task for the recovery sweep.
    pub async fn execute(&self, store: &Mutex<TaskStore>, task: &mut Task, rng: &mut (impl Rng + Send)) -> Result<LogStatus> {
        let run_id = generate_run_id();
        let started = now_ms();
        info!("[{}] executing task {} ({})", run_id, task.id, task.media_path);

        match self.attempt(store, task).await {
            Ok(url) => {
                task.status = TaskStatus::Success;
                task.phase = None;
                task.posted_url = url.clone();
                task.completed_at = Some(now_ms());
                let duration = (now_ms() - started) as f64 / 1000.0;

                let mut store = store.lock().await;
                store.update_task(task)?;
                self.log_attempt(&mut store, task, LogStatus::Success, None, duration)?;
                store.record_outcome(task.project_id, now_ms(), true, duration)?;
                info!("[{}] task {} published: {:?}", run_id, task.id, url);
                Ok(LogStatus::Success)
            }
            Err(e) => {
                let duration = (now_ms() - started) as f64 / 1000.0;
                let mut store = store.lock().await;
                let status = self.handle_failure(&mut store, task, &e.to_string(), duration, rng)?;
                Ok(status)
            }
        }
    }

    /// Claim and execute ready tasks until `limit` attempts have run or no
    /// ready task remains. A courtesy gap follows each successful publish
    /// so posts do not land back to back; failures skip the gap.
    ///
    /// A store error while executing one task is reported as a failure for
    /// that task and the batch continues; the recovery sweep picks up
    /// whatever state the task was left in.
    pub async fn run_batch(
        &self,
        store: &Mutex<TaskStore>,
        limit: usize,
        project_id: Option<i64>,
        language: Option<&str>,
        rng: &mut (impl Rng + Send),
    ) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let mut prior_success = false;

        while report.executed < limit {
            let Some(mut task) = self.claim_next(store, project_id, language).await? else {
                break;
            };

            if prior_success {
                let gap = rng.random_range(
                    self.retry.batch_gap_secs_min..=self.retry.batch_gap_secs_max.max(self.retry.batch_gap_secs_min),
                );
                tokio::time::sleep(Duration::from_secs(gap)).await;
            }
            report.executed += 1;

            match self.execute(store, &mut task, rng).await {
                Ok(LogStatus::Success) => {
                    report.succeeded += 1;
                    prior_success = true;
                }
                Ok(LogStatus::Retry) => {
                    report.retried += 1;
                    prior_success = false;
                }
                Ok(LogStatus::Failed) => {
                    report.failed += 1;
                    prior_success = false;
                }
                Err(e) => {
                    warn!("task {} execution aborted: {}", task.id, e);
                    report.failed += 1;
                    prior_success = false;
                }
            }
        }

        info!(
            "batch finished: {} executed, {} succeeded, {} retried, {} failed",
            report.executed, report.succeeded, report.retried, report.failed
        );
        Ok(report)
    }

    /// The generate-then-upload pipeline for one task. Phase transitions
    /// are persisted before each stage so crashes are recoverable; the
    /// store lock is released before each backend call.
    async fn attempt(&self, store: &Mutex<TaskStore>, task: &mut Task) -> Result<Option<String>> {
        let media_path = Path::new(&task.media_path).to_path_buf();
        if !media_path.exists() {
            return Err(PostrError::Publish(format!(
                "media file not exist: {}",
                task.media_path
            )));
        }

        let project = {
            let mut store = store.lock().await;
            task.phase = Some(PHASE_PROCESSING.to_string());
            store.update_task(task)?;
            store
                .get_project(task.project_id)?
                .ok_or_else(|| PostrError::ProjectNotFound(task.project_id.to_string()))?
        };

        let filename = media_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| task.media_path.clone());
        let generated = self.generator.generate(&task.content_data, &filename, &project).await?;
        let caption = compose_caption(&generated.text, &task.content_data.hashtags);

        {
            let mut store = store.lock().await;
            task.phase = Some(PHASE_UPLOADING.to_string());
            store.update_task(task)?;
        }

        let result = match MediaType::from_path(&task.media_path) {
            MediaType::Video => self.publisher.publish_video(&media_path, &caption).await?,
            MediaType::Image => self.publisher.publish_images(&[media_path.as_path()], &caption).await?,
        };

        Ok(result.url.or(Some(format!("post:{}", result.external_id))))
    }

    /// Transition a failed attempt to retry or failed, with backoff.
    /// Every failed attempt lands in the hourly rollup, retries included.
    fn handle_failure(
        &self,
        store: &mut TaskStore,
        task: &mut Task,
        error: &str,
        duration: f64,
        rng: &mut impl Rng,
    ) -> Result<LogStatus> {
        task.retry_count += 1;

        if self.policy.should_retry(error, task.retry_count) {
            let next_at = self.policy.next_attempt_at(now_ms(), task.retry_count, rng);
            task.status = TaskStatus::Retry;
            task.phase = None;
            task.scheduled_at = next_at;
            store.update_task(task)?;

            self.log_attempt(store, task, LogStatus::Retry, Some(error), duration)?;
            store.record_outcome(task.project_id, now_ms(), false, duration)?;
            warn!(
                "task {} attempt {} failed, retrying in {} min: {}",
                task.id,
                task.retry_count,
                (next_at - now_ms()) / 60_000,
                error
            );
            Ok(LogStatus::Retry)
        } else {
            task.status = TaskStatus::Failed;
            task.phase = None;
            task.completed_at = Some(now_ms());
            store.update_task(task)?;

            self.log_attempt(store, task, LogStatus::Failed, Some(error), duration)?;
            store.record_outcome(task.project_id, now_ms(), false, duration)?;
            warn!("task {} failed permanently after {} attempts: {}", task.id, task.retry_count, error);
            Ok(LogStatus::Failed)
        }
    }

    fn log_attempt(
        &self,
        store: &mut TaskStore,
        task: &Task,
        status: LogStatus,
        error: Option<&str>,
        duration: f64,
    ) -> Result<()> {
        store.append_log(&PublishingLog {
            id: 0,
            task_id: task.id,
            status,
            tweet_id: None,
            url: task.posted_url.clone(),
            error_message: error.map(|e| e.to_string()),
            duration_seconds: duration,
            published_at: now_ms(),
        })?;
        Ok(())
    }
}

/// Join generated text with the hashtag block, when there is one.
fn compose_caption(text: &str, hashtags: &[String]) -> String {
    if hashtags.is_empty() {
        return text.to_string();
    }
    let tags = hashtags
        .iter()
        .map(|t| {
            if t.starts_with('#') {
                t.clone()
            } else {
                format!("#{}", t)
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}\n\n{}", text, tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::{GeneratedText, PublishResult};
    use crate::store::{ContentData, ContentSource, Project};
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FakeGenerator;

    #[async_trait]
    impl ContentGenerator for FakeGenerator {
        async fn generate(&self, content: &ContentData, _media_filename: &str, _project: &Project) -> crate::error::Result<GeneratedText> {
            Ok(GeneratedText {
                text: format!("caption for {}", content.title),
                latency_ms: 5,
            })
        }
    }

    /// Generator that bumps the in-progress task's version through a
    /// second store connection, simulating a recovery sweep racing the
    /// executor between pipeline stages.
    struct VersionBumpingGenerator {
        store_dir: PathBuf,
        bumps_left: AtomicUsize,
    }

    #[async_trait]
    impl ContentGenerator for VersionBumpingGenerator {
        async fn generate(&self, _content: &ContentData, _media_filename: &str, _project: &Project) -> crate::error::Result<GeneratedText> {
            if self.bumps_left.load(Ordering::SeqCst) > 0 {
                self.bumps_left.fetch_sub(1, Ordering::SeqCst);
                let mut store = TaskStore::open_at(&self.store_dir).unwrap();
                let mut task = store.list_by_status(TaskStatus::InProgress).unwrap().remove(0);
                store.update_task(&mut task).unwrap();
            }
            Ok(GeneratedText {
                text: "caption".to_string(),
                latency_ms: 1,
            })
        }
    }

    /// Generator that acquires the shared store lock itself, the way a
    /// concurrent recovery sweep would. Deadlocks if the executor still
    /// holds the lock across the generate call.
    struct StoreReadingGenerator {
        store: Arc<Mutex<TaskStore>>,
        observed: AtomicUsize,
    }

    #[async_trait]
    impl ContentGenerator for StoreReadingGenerator {
        async fn generate(&self, _content: &ContentData, _media_filename: &str, _project: &Project) -> crate::error::Result<GeneratedText> {
            let store = self.store.lock().await;
            self.observed
                .fetch_add(store.list_tasks().unwrap().len(), Ordering::SeqCst);
            Ok(GeneratedText {
                text: "caption".to_string(),
                latency_ms: 1,
            })
        }
    }

    /// Publisher scripted to fail a fixed number of times before
    /// succeeding, recording which entry point was used.
    struct FakePublisher {
        failures_left: AtomicUsize,
        error: String,
        calls: StdMutex<Vec<&'static str>>,
    }

    impl FakePublisher {
        fn succeeding() -> Self {
            Self::failing(0, "")
        }

        fn failing(times: usize, error: &str) -> Self {
            Self {
                failures_left: AtomicUsize::new(times),
                error: error.to_string(),
                calls: StdMutex::new(Vec::new()),
            }
        }

        fn publish(&self, kind: &'static str) -> crate::error::Result<PublishResult> {
            self.calls.lock().unwrap().push(kind);
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(PostrError::Publish(self.error.clone()));
            }
            Ok(PublishResult {
                external_id: "post-1".to_string(),
                url: Some("https://example.com/post-1".to_string()),
                latency_ms: 10,
            })
        }
    }

    #[async_trait]
    impl Publisher for FakePublisher {
        async fn publish_video(&self, _media_path: &Path, _caption: &str) -> crate::error::Result<PublishResult> {
            self.publish("video")
        }

        async fn publish_images(&self, _media_paths: &[&Path], _caption: &str) -> crate::error::Result<PublishResult> {
            self.publish("images")
        }
    }

    fn setup(media_name: &str) -> (TaskStore, TempDir, TempDir, Task) {
        let store_dir = TempDir::new().unwrap();
        let mut store = TaskStore::open_at(store_dir.path()).unwrap();

        let media_dir = TempDir::new().unwrap();
        let media_path = media_dir.path().join(media_name);
        fs::write(&media_path, "media").unwrap();

        let project = store.create_project(&Project::new("travel", 1)).unwrap();
        let source = store
            .create_source(&ContentSource::new(project.id, &media_dir.path().to_string_lossy(), "en"))
            .unwrap();

        let content = ContentData::placeholder(&media_path.to_string_lossy(), "en");
        let task = Task::new(
            project.id,
            source.id,
            &media_path.to_string_lossy(),
            content,
            now_ms() - 1000,
        );
        let task = store.insert_task(&task).unwrap();

        (store, store_dir, media_dir, task)
    }

    /// Insert a second ready task for the same project, scheduled after
    /// the one from `setup`.
    fn add_task(store: &mut TaskStore, media_dir: &Path, name: &str) -> Task {
        let first = store.list_tasks().unwrap()[0].clone();
        let path = media_dir.join(name);
        fs::write(&path, "media").unwrap();
        let task = Task::new(
            first.project_id,
            first.source_id,
            &path.to_string_lossy(),
            ContentData::placeholder(&path.to_string_lossy(), "en"),
            now_ms() - 500,
        );
        store.insert_task(&task).unwrap()
    }

    fn executor(publisher: FakePublisher) -> (TaskExecutor, Arc<FakePublisher>) {
        let publisher = Arc::new(publisher);
        let executor = TaskExecutor::new(Arc::new(FakeGenerator), publisher.clone(), RetryConfig::default());
        (executor, publisher)
    }

    fn gapless_config() -> RetryConfig {
        let mut config = RetryConfig::default();
        config.batch_gap_secs_min = 0;
        config.batch_gap_secs_max = 0;
        config
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    #[tokio::test]
    async fn test_successful_execution() {
        let (store, _sd, _md, _task) = setup("clip.mp4");
        let store = Mutex::new(store);
        let (executor, publisher) = executor(FakePublisher::succeeding());

        let mut task = executor.claim_next(&store, None, None).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);

        let status = executor.execute(&store, &mut task, &mut rng()).await.unwrap();
        assert_eq!(status, LogStatus::Success);

        let store = store.into_inner();
        let stored = store.get_task(task.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Success);
        assert_eq!(stored.posted_url.as_deref(), Some("https://example.com/post-1"));
        assert!(stored.completed_at.is_some());
        assert!(stored.phase.is_none());
        assert_eq!(*publisher.calls.lock().unwrap(), vec!["video"]);

        let logs = store.logs_for_task(task.id).unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, LogStatus::Success);
    }

    #[tokio::test]
    async fn test_image_dispatch() {
        let (store, _sd, _md, _task) = setup("photo.jpg");
        let store = Mutex::new(store);
        let (executor, publisher) = executor(FakePublisher::succeeding());

        let mut task = executor.claim_next(&store, None, None).await.unwrap().unwrap();
        executor.execute(&store, &mut task, &mut rng()).await.unwrap();

        assert_eq!(*publisher.calls.lock().unwrap(), vec!["images"]);
    }

    #[tokio::test]
    async fn test_transient_failure_schedules_retry() {
        let (store, _sd, _md, _task) = setup("clip.mp4");
        let store = Mutex::new(store);
        let (executor, _publisher) = executor(FakePublisher::failing(1, "connection reset"));

        let before = now_ms();
        let mut task = executor.claim_next(&store, None, None).await.unwrap().unwrap();
        let status = executor.execute(&store, &mut task, &mut rng()).await.unwrap();
        assert_eq!(status, LogStatus::Retry);

        let store = store.into_inner();
        let stored = store.get_task(task.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Retry);
        assert_eq!(stored.retry_count, 1);
        // Backoff pushes the schedule into the future
        assert!(stored.scheduled_at > before);
        assert!(store.next_ready(now_ms(), 10, None, None).unwrap().is_empty());

        // Retry attempts count as failed in the hourly rollup
        let hourly = store.hourly_for_project(task.project_id).unwrap();
        assert_eq!(hourly.len(), 1);
        assert_eq!(hourly[0].failed, 1);
        assert_eq!(hourly[0].successful, 0);
    }

    #[tokio::test]
    async fn test_permanent_failure_goes_failed() {
        let (store, _sd, _md, _task) = setup("clip.mp4");
        let store = Mutex::new(store);
        let (executor, _publisher) = executor(FakePublisher::failing(1, "401 Unauthorized"));

        let mut task = executor.claim_next(&store, None, None).await.unwrap().unwrap();
        let status = executor.execute(&store, &mut task, &mut rng()).await.unwrap();
        assert_eq!(status, LogStatus::Failed);

        let store = store.into_inner();
        let stored = store.get_task(task.id).unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Failed);
        assert!(stored.completed_at.is_some());

        let hourly = store.hourly_for_project(task.project_id).unwrap();
        assert_eq!(hourly.len(), 1);
        assert_eq!(hourly[0].failed, 1);
    }

    #[tokio::test]
    async fn test_retry_exhaustion_fails_task() {
        let (mut store, _sd, _md, task) = setup("clip.mp4");
        let (executor, _publisher) = executor(FakePublisher::failing(10, "timeout"));

        let mut task = store.get_task(task.id).unwrap().unwrap();
        task.retry_count = 3;
        store.update_task(&mut task).unwrap();

        let store = Mutex::new(store);
        let mut claimed = executor.claim_next(&store, None, None).await.unwrap().unwrap();
        let status = executor.execute(&store, &mut claimed, &mut rng()).await.unwrap();
        assert_eq!(status, LogStatus::Failed);
    }

    #[tokio::test]
    async fn test_missing_media_is_permanent() {
        let (store, _sd, md, _task) = setup("clip.mp4");
        let store = Mutex::new(store);
        let (executor, publisher) = executor(FakePublisher::succeeding());

        fs::remove_file(md.path().join("clip.mp4")).unwrap();

        let mut task = executor.claim_next(&store, None, None).await.unwrap().unwrap();
        let status = executor.execute(&store, &mut task, &mut rng()).await.unwrap();
        assert_eq!(status, LogStatus::Failed);
        assert!(publisher.calls.lock().unwrap().is_empty());

        let store = store.into_inner();
        let logs = store.logs_for_task(task.id).unwrap();
        assert!(logs[0].error_message.as_deref().unwrap().contains("not exist"));
    }

    #[tokio::test]
    async fn test_claim_next_returns_none_when_idle() {
        let store_dir = TempDir::new().unwrap();
        let store = Mutex::new(TaskStore::open_at(store_dir.path()).unwrap());
        let (executor, _publisher) = executor(FakePublisher::succeeding());

        assert!(executor.claim_next(&store, None, None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_run_batch_counts_outcomes() {
        let (mut store, _sd, md, _task) = setup("clip.mp4");
        add_task(&mut store, md.path(), "other.mp4");
        let store = Mutex::new(store);

        let publisher = Arc::new(FakePublisher::succeeding());
        let executor = TaskExecutor::new(Arc::new(FakeGenerator), publisher, gapless_config());

        let report = executor.run_batch(&store, 10, None, None, &mut rng()).await.unwrap();
        assert_eq!(report.executed, 2);
        assert_eq!(report.succeeded, 2);
    }

    #[tokio::test]
    async fn test_run_batch_survives_version_conflict() {
        let (mut store, sd, md, _task) = setup("clip.mp4");
        add_task(&mut store, md.path(), "other.mp4");
        let store = Mutex::new(store);

        // The first generate call invalidates the claimed task's version,
        // so its next phase update hits a version conflict.
        let generator = Arc::new(VersionBumpingGenerator {
            store_dir: sd.path().to_path_buf(),
            bumps_left: AtomicUsize::new(1),
        });
        let publisher = Arc::new(FakePublisher::succeeding());
        let executor = TaskExecutor::new(generator, publisher, gapless_config());

        let report = executor.run_batch(&store, 10, None, None, &mut rng()).await.unwrap();

        // The conflicted task is reported failed; the batch still runs
        // the second task to completion.
        assert_eq!(report.executed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.succeeded, 1);
    }

    #[tokio::test]
    async fn test_store_lock_free_during_backend_calls() {
        let (store, _sd, _md, _task) = setup("clip.mp4");
        let store = Arc::new(Mutex::new(store));

        let generator = Arc::new(StoreReadingGenerator {
            store: store.clone(),
            observed: AtomicUsize::new(0),
        });
        let publisher = Arc::new(FakePublisher::succeeding());
        let executor = TaskExecutor::new(generator.clone(), publisher, gapless_config());

        let report = tokio::time::timeout(
            Duration::from_secs(5),
            executor.run_batch(&store, 1, None, None, &mut rng()),
        )
        .await
        .expect("run_batch deadlocked on the store mutex")
        .unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(generator.observed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gap_follows_each_success() {
        let (mut store, _sd, md, _task) = setup("clip.mp4");
        add_task(&mut store, md.path(), "other.mp4");
        let store = Mutex::new(store);

        let mut config = RetryConfig::default();
        config.batch_gap_secs_min = 30;
        config.batch_gap_secs_max = 30;
        let publisher = Arc::new(FakePublisher::succeeding());
        let executor = TaskExecutor::new(Arc::new(FakeGenerator), publisher, config);

        let start = tokio::time::Instant::now();
        let report = executor.run_batch(&store, 10, None, None, &mut rng()).await.unwrap();
        assert_eq!(report.succeeded, 2);
        // One gap between the two successful publishes
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_skip_the_gap() {
        let (mut store, _sd, md, _task) = setup("clip.mp4");
        add_task(&mut store, md.path(), "other.mp4");
        let store = Mutex::new(store);

        let mut config = RetryConfig::default();
        config.batch_gap_secs_min = 30;
        config.batch_gap_secs_max = 30;
        let publisher = Arc::new(FakePublisher::failing(10, "401 Unauthorized"));
        let executor = TaskExecutor::new(Arc::new(FakeGenerator), publisher, config);

        let start = tokio::time::Instant::now();
        let report = executor.run_batch(&store, 10, None, None, &mut rng()).await.unwrap();
        assert_eq!(report.failed, 2);
        assert_eq!(start.elapsed(), Duration::from_secs(0));
    }

    #[test]
    fn test_compose_caption_appends_hashtags() {
        let caption = compose_caption("hello", &["travel".to_string(), "#asia".to_string()]);
        assert_eq!(caption, "hello\n\n#travel #asia");
    }

    #[test]
    fn test_compose_caption_without_hashtags() {
        assert_eq!(compose_caption("hello", &[]), "hello");
    }
}
