//! Task creation orchestration.
//!
//! Cross-references media files found in content sources against existing
//! tasks, creates new task records with derived content payloads, and
//! enforces the global daily cap plus per-project quotas. One project's
//! scan failure never aborts the others: failures are collected as error
//! strings in the returned report.

use crate::config::SchedulingConfig;
use crate::creator::metadata::resolve_content;
use crate::error::Result;
use crate::scheduler;
use crate::store::{Project, Task, TaskStore};
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};

/// Media extensions considered publishable.
const MEDIA_EXTENSIONS: &[&str] = &["mp4", "mov", "jpg", "jpeg", "png", "gif"];

/// Outcome of one creation run. Batch operations report rather than raise:
/// the caller decides whether partial success is acceptable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreationReport {
    pub created: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl CreationReport {
    /// Fold another report into this one.
    pub fn merge(&mut self, other: CreationReport) {
        self.created += other.created;
        self.skipped += other.skipped;
        self.errors.extend(other.errors);
    }
}

/// Creates publishing tasks from scanned media, bounded by quotas and
/// daily caps.
pub struct TaskCreator {
    scheduling: SchedulingConfig,
}

impl TaskCreator {
    /// Create a new TaskCreator with the given scheduling config.
    pub fn new(scheduling: SchedulingConfig) -> Self {
        Self { scheduling }
    }

    /// Create tasks for every active project.
    ///
    /// Applies the global daily cap first: only `daily_target - existing`
    /// tasks may still be created today, unless `force`, which creates
    /// exactly `daily_min_tasks` regardless of what already exists. The
    /// remaining budget is split across projects by priority weight.
    pub fn create_for_all_projects(&self, store: &mut TaskStore, force: bool, rng: &mut impl Rng) -> CreationReport {
        let mut report = CreationReport::default();

        let projects = match store.list_active_projects() {
            Ok(projects) => projects,
            Err(e) => {
                report.errors.push(format!("failed to list projects: {}", e));
                return report;
            }
        };
        if projects.is_empty() {
            return report;
        }

        let now = Utc::now();
        let (today_start, today_end) = self.today_bounds(now);
        let existing = match store.count_scheduled_between(None, today_start, today_end) {
            Ok(count) => count,
            Err(e) => {
                report.errors.push(format!("failed to count scheduled tasks: {}", e));
                return report;
            }
        };

        let budget = if force {
            self.scheduling.daily_min_tasks
        } else {
            self.scheduling.daily_max_tasks.saturating_sub(existing)
        };
        if budget == 0 {
            info!("daily budget exhausted ({} tasks already scheduled today)", existing);
            return report;
        }

        for (project_id, quota) in scheduler::allocate(&projects, budget) {
            // Isolated per project: one bad project must not stop the rest
            let project = projects.iter().find(|p| p.id == project_id);
            let Some(project) = project else { continue };
            let project_report = self.create_for_project(store, project, quota, force, rng);
            report.merge(project_report);
        }

        info!(
            "task creation finished: {} created, {} skipped, {} errors",
            report.created,
            report.skipped,
            report.errors.len()
        );
        report
    }

    /// Create up to `quota` tasks for one project from its content sources.
    ///
    /// Candidates are shuffled so a small quota does not always pick the
    /// same files. An existing task for (project, media_path) with a
    /// blocking status is skipped unless `force`; any other pre-existing
    /// task for that path is deleted first to satisfy the uniqueness
    /// constraint.
    pub fn create_for_project(
        &self,
        store: &mut TaskStore,
        project: &Project,
        quota: usize,
        force: bool,
        rng: &mut impl Rng,
    ) -> CreationReport {
        let mut report = CreationReport::default();
        if quota == 0 {
            return report;
        }

        let sources = match store.list_sources(project.id) {
            Ok(sources) => sources,
            Err(e) => {
                report.errors.push(format!("{}: failed to list sources: {}", project.name, e));
                return report;
            }
        };
        if sources.is_empty() {
            report.errors.push(format!("{}: no content sources configured", project.name));
            return report;
        }

        let slots = self.schedule_slots(quota, Utc::now(), rng);

        for source in sources {
            if report.created >= quota {
                break;
            }

            let mut media = match scan_media(Path::new(&source.path)) {
                Ok(media) => media,
                Err(e) => {
                    report.errors.push(format!("{}: scan failed for {}: {}", project.name, source.path, e));
                    continue;
                }
            };
            let total_items = media.len() as i64;
            media.shuffle(rng);

            let mut used_delta = 0i64;
            for path in media {
                if report.created >= quota {
                    break;
                }
                let media_path = path.to_string_lossy().to_string();

                match store.find_task_by_media(project.id, &media_path) {
                    Ok(Some(existing)) => {
                        if existing.status.blocks_duplicate() && !force {
                            report.skipped += 1;
                            continue;
                        }
                        // Force, or a failed/retry leftover: replace it
                        if let Err(e) = store.delete_task(existing.id) {
                            report.errors.push(format!("{}: failed to replace task for {}: {}", project.name, media_path, e));
                            continue;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        report.errors.push(format!("{}: lookup failed for {}: {}", project.name, media_path, e));
                        continue;
                    }
                }

                let content = resolve_content(&path, &source.language);
                let scheduled_at = slots
                    .get(report.created)
                    .map(|s| s.timestamp_millis())
                    .unwrap_or_else(|| Utc::now().timestamp_millis());

                let mut task = Task::new(project.id, source.id, &media_path, content, scheduled_at);
                task.priority = project.priority;
                match store.insert_task(&task) {
                    Ok(_) => {
                        report.created += 1;
                        used_delta += 1;
                    }
                    Err(e) => {
                        report.errors.push(format!("{}: failed to create task for {}: {}", project.name, media_path, e));
                    }
                }
            }

            let used = source.used_items + used_delta;
            if let Err(e) = store.update_source_counters(source.id, total_items, used) {
                warn!("failed to update counters for source {}: {}", source.id, e);
            }
        }

        report
    }

    /// Build blackout-adjusted, interval-spaced publish slots for `count`
    /// tasks starting now.
    fn schedule_slots(&self, count: usize, now: DateTime<Utc>, rng: &mut impl Rng) -> Vec<DateTime<Utc>> {
        let mut slots = scheduler::generate_multi_day(
            count,
            self.scheduling.days_ahead,
            self.scheduling.daily_max_tasks.max(1),
            now,
            &self.scheduling.optimal_hours,
            rng,
        );
        for slot in slots.iter_mut() {
            *slot = scheduler::adjust_for_blackout(*slot, &self.scheduling.blackout_hours);
        }
        slots.sort();
        scheduler::space_out(
            &mut slots,
            Duration::minutes(self.scheduling.interval_minutes_min),
            Duration::minutes(self.scheduling.interval_minutes_max),
            rng,
        );
        slots
    }

    /// Unix-ms bounds of "today" in the configured timezone offset.
    fn today_bounds(&self, now: DateTime<Utc>) -> (i64, i64) {
        const DAY_MS: i64 = 86_400_000;
        let offset_ms = self.scheduling.utc_offset_minutes as i64 * 60_000;
        let local = now.timestamp_millis() + offset_ms;
        let start = local - local.rem_euclid(DAY_MS) - offset_ms;
        (start, start + DAY_MS)
    }
}

/// Scan a content-source directory for publishable media files.
pub fn scan_media(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)?;
    let mut media = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if MEDIA_EXTENSIONS.contains(&ext.as_str()) {
            media.push(path);
        }
    }
    media.sort();
    Ok(media)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ContentSource, TaskStatus};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::fs;
    use tempfile::TempDir;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    fn setup() -> (TaskStore, TempDir, Project, TempDir) {
        let store_dir = TempDir::new().unwrap();
        let mut store = TaskStore::open_at(store_dir.path()).unwrap();
        let project = store.create_project(&Project::new("travel", 1)).unwrap();

        let media_dir = TempDir::new().unwrap();
        store
            .create_source(&ContentSource::new(
                project.id,
                &media_dir.path().to_string_lossy(),
                "en",
            ))
            .unwrap();

        (store, store_dir, project, media_dir)
    }

    fn add_media(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), "media").unwrap();
        }
    }

    fn creator() -> TaskCreator {
        TaskCreator::new(SchedulingConfig::default())
    }

    #[test]
    fn test_scan_media_filters_extensions() {
        let temp = TempDir::new().unwrap();
        add_media(temp.path(), &["a.mp4", "b.jpg", "c.txt", "d.json"]);

        let media = scan_media(temp.path()).unwrap();
        assert_eq!(media.len(), 2);
    }

    #[test]
    fn test_scan_media_missing_dir_is_error() {
        assert!(scan_media(Path::new("/nonexistent/media/dir")).is_err());
    }

    #[test]
    fn test_create_up_to_quota() {
        let (mut store, _sd, project, media_dir) = setup();
        add_media(media_dir.path(), &["a.mp4", "b.mp4", "c.mp4", "d.mp4"]);

        let report = creator().create_for_project(&mut store, &project, 2, false, &mut rng());

        assert_eq!(report.created, 2);
        assert!(report.errors.is_empty());
        assert_eq!(store.list_by_project(project.id).unwrap().len(), 2);
    }

    #[test]
    fn test_creation_is_idempotent() {
        let (mut store, _sd, project, media_dir) = setup();
        add_media(media_dir.path(), &["a.mp4", "b.mp4"]);

        let first = creator().create_for_project(&mut store, &project, 10, false, &mut rng());
        assert_eq!(first.created, 2);

        // Second run with the same media set: all skipped, no net new tasks
        let second = creator().create_for_project(&mut store, &project, 10, false, &mut rng());
        assert_eq!(second.created, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(store.list_by_project(project.id).unwrap().len(), 2);
    }

    #[test]
    fn test_force_replaces_existing_task() {
        let (mut store, _sd, project, media_dir) = setup();
        add_media(media_dir.path(), &["a.mp4"]);

        creator().create_for_project(&mut store, &project, 5, false, &mut rng());
        let original = store.list_by_project(project.id).unwrap()[0].clone();

        let report = creator().create_for_project(&mut store, &project, 5, true, &mut rng());
        assert_eq!(report.created, 1);

        let tasks = store.list_by_project(project.id).unwrap();
        // Count stays at 1 but the task was recreated
        assert_eq!(tasks.len(), 1);
        assert_ne!(tasks[0].id, original.id);
    }

    #[test]
    fn test_failed_task_is_replaced_without_force() {
        let (mut store, _sd, project, media_dir) = setup();
        add_media(media_dir.path(), &["a.mp4"]);

        creator().create_for_project(&mut store, &project, 5, false, &mut rng());
        let mut task = store.list_by_project(project.id).unwrap()[0].clone();
        task.status = TaskStatus::Failed;
        store.update_task(&mut task).unwrap();

        let report = creator().create_for_project(&mut store, &project, 5, false, &mut rng());
        assert_eq!(report.created, 1);
        assert_eq!(store.list_by_project(project.id).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_source_dir_recorded_as_error() {
        let store_dir = TempDir::new().unwrap();
        let mut store = TaskStore::open_at(store_dir.path()).unwrap();
        let project = store.create_project(&Project::new("broken", 1)).unwrap();
        store
            .create_source(&ContentSource::new(project.id, "/nonexistent/dir", "en"))
            .unwrap();

        let report = creator().create_for_project(&mut store, &project, 5, false, &mut rng());
        assert_eq!(report.created, 0);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("scan failed"));
    }

    #[test]
    fn test_project_without_sources_recorded_as_error() {
        let store_dir = TempDir::new().unwrap();
        let mut store = TaskStore::open_at(store_dir.path()).unwrap();
        let project = store.create_project(&Project::new("empty", 1)).unwrap();

        let report = creator().create_for_project(&mut store, &project, 5, false, &mut rng());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("no content sources"));
    }

    #[test]
    fn test_bad_project_does_not_abort_others() {
        let store_dir = TempDir::new().unwrap();
        let mut store = TaskStore::open_at(store_dir.path()).unwrap();

        let broken = store.create_project(&Project::new("broken", 1)).unwrap();
        store
            .create_source(&ContentSource::new(broken.id, "/nonexistent/dir", "en"))
            .unwrap();

        let media_dir = TempDir::new().unwrap();
        add_media(media_dir.path(), &["a.mp4", "b.mp4"]);
        let healthy = store.create_project(&Project::new("healthy", 1)).unwrap();
        store
            .create_source(&ContentSource::new(
                healthy.id,
                &media_dir.path().to_string_lossy(),
                "en",
            ))
            .unwrap();

        let report = creator().create_for_all_projects(&mut store, false, &mut rng());

        assert!(report.created >= 1);
        assert_eq!(report.errors.len(), 1);
        assert!(store.list_by_project(healthy.id).unwrap().len() >= 1);
        assert!(store.list_by_project(broken.id).unwrap().is_empty());
    }

    #[test]
    fn test_daily_cap_limits_creation() {
        let (mut store, _sd, project, media_dir) = setup();
        add_media(media_dir.path(), &["a.mp4", "b.mp4", "c.mp4"]);

        // Pre-schedule enough tasks today to exhaust the daily budget
        let mut config = SchedulingConfig::default();
        config.daily_max_tasks = 2;
        let creator = TaskCreator::new(config);

        let first = creator.create_for_all_projects(&mut store, false, &mut rng());
        assert_eq!(first.created, 2);

        let second = creator.create_for_all_projects(&mut store, false, &mut rng());
        assert_eq!(second.created, 0);
        assert_eq!(store.list_by_project(project.id).unwrap().len(), 2);
    }

    #[test]
    fn test_force_creates_daily_min_despite_cap() {
        let (mut store, _sd, _project, media_dir) = setup();
        add_media(media_dir.path(), &["a.mp4", "b.mp4", "c.mp4", "d.mp4", "e.mp4"]);

        let mut config = SchedulingConfig::default();
        config.daily_max_tasks = 1;
        config.daily_min_tasks = 3;
        let creator = TaskCreator::new(config);

        let first = creator.create_for_all_projects(&mut store, false, &mut rng());
        assert_eq!(first.created, 1);

        // Budget exhausted, but force still creates exactly daily_min_tasks
        let forced = creator.create_for_all_projects(&mut store, true, &mut rng());
        assert_eq!(forced.created, 3);
    }

    #[test]
    fn test_created_tasks_have_content_and_schedule() {
        let (mut store, _sd, project, media_dir) = setup();
        add_media(media_dir.path(), &["a.mp4"]);
        fs::write(
            media_dir.path().join("en_prompt_results_x.json"),
            r#"{"a.mp4": {"title": "Alpha", "description": "First clip"}}"#,
        )
        .unwrap();

        creator().create_for_project(&mut store, &project, 1, false, &mut rng());

        let task = &store.list_by_project(project.id).unwrap()[0];
        assert_eq!(task.content_data.title, "Alpha");
        assert!(task.scheduled_at > 0);
        assert_eq!(task.status, TaskStatus::Pending);
    }

    #[test]
    fn test_report_merge() {
        let mut a = CreationReport {
            created: 2,
            skipped: 1,
            errors: vec!["x".to_string()],
        };
        let b = CreationReport {
            created: 3,
            skipped: 0,
            errors: vec!["y".to_string()],
        };
        a.merge(b);
        assert_eq!(a.created, 5);
        assert_eq!(a.skipped, 1);
        assert_eq!(a.errors.len(), 2);
    }
}
