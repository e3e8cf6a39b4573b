//! TaskStore implementation backed by SQLite.
//!
//! The TaskStore is the single shared mutable resource in the system. It
//! persists projects, content sources, publishing tasks, the append-only
//! publishing log, and hourly analytics rollups. Status transitions are
//! conditional updates guarded by the task's `version` column, so two
//! engine instances can never double-claim the same task.

use crate::error::{PostrError, Result};
use crate::store::records::{
    AnalyticsHourly, ContentData, ContentSource, LogStatus, Project, ProjectStatus, PublishingLog, Task, TaskStatus,
    hour_bucket, now_ms,
};
use rusqlite::{Connection, Row, params};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// TaskStore manages publishing state in a single SQLite database.
pub struct TaskStore {
    /// Base directory for this store
    base_dir: PathBuf,

    /// SQLite connection
    db: Connection,
}

impl TaskStore {
    /// Open or create a TaskStore for the given workspace directory.
    ///
    /// The store is created at `~/.postr/<workspace-hash>/`.
    pub fn open(workspace_dir: &Path) -> Result<Self> {
        let workspace_hash = compute_workspace_hash(workspace_dir)?;
        let postr_dir = dirs::home_dir()
            .ok_or_else(|| PostrError::Storage("Cannot determine home directory".to_string()))?
            .join(".postr")
            .join(&workspace_hash);

        Self::open_at(&postr_dir)
    }

    /// Open or create a TaskStore at the specified directory.
    ///
    /// Useful for testing with custom paths.
    pub fn open_at(base_dir: &Path) -> Result<Self> {
        let store_dir = base_dir.join(".taskstore");
        fs::create_dir_all(&store_dir)
            .map_err(|e| PostrError::Storage(format!("Failed to create store directory {}: {}", store_dir.display(), e)))?;

        let db_path = store_dir.join("postr.db");

        let db = Connection::open(&db_path)
            .map_err(|e| PostrError::Storage(format!("Failed to open SQLite database {}: {}", db_path.display(), e)))?;

        Self::init_schema(&db)?;

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            db,
        })
    }

    /// Initialize the SQLite schema.
    fn init_schema(db: &Connection) -> Result<()> {
        db.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                priority INTEGER NOT NULL DEFAULT 1,
                status TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sources (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                path TEXT NOT NULL,
                language TEXT NOT NULL,
                total_items INTEGER NOT NULL DEFAULT 0,
                used_items INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                source_id INTEGER NOT NULL,
                media_path TEXT NOT NULL,
                content_data TEXT NOT NULL,
                scheduled_at INTEGER NOT NULL,
                priority INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                phase TEXT,
                retry_count INTEGER NOT NULL DEFAULT 0,
                version INTEGER NOT NULL DEFAULT 0,
                posted_url TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                started_at INTEGER,
                completed_at INTEGER,
                UNIQUE(project_id, media_path)
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
            CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
            CREATE INDEX IF NOT EXISTS idx_tasks_scheduled ON tasks(scheduled_at);

            CREATE TABLE IF NOT EXISTS publishing_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id INTEGER NOT NULL,
                status TEXT NOT NULL,
                tweet_id TEXT,
                url TEXT,
                error_message TEXT,
                duration_seconds REAL NOT NULL DEFAULT 0,
                published_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_log_task ON publishing_log(task_id);

            CREATE TABLE IF NOT EXISTS analytics_hourly (
                project_id INTEGER NOT NULL,
                hour_ts INTEGER NOT NULL,
                successful INTEGER NOT NULL DEFAULT 0,
                failed INTEGER NOT NULL DEFAULT 0,
                total_duration_seconds REAL NOT NULL DEFAULT 0,
                PRIMARY KEY (project_id, hour_ts)
            );
            "#,
        )
        .map_err(|e| PostrError::Storage(format!("Failed to initialize database schema: {}", e)))?;

        Ok(())
    }

    /// Get the base directory for this store.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    // ----- projects -----

    /// Insert a new project and return it with its assigned id.
    pub fn create_project(&mut self, project: &Project) -> Result<Project> {
        self.db.execute(
            "INSERT INTO projects (name, priority, status, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![project.name, project.priority, project.status.as_str(), project.created_at],
        )?;
        let mut created = project.clone();
        created.id = self.db.last_insert_rowid();
        Ok(created)
    }

    /// Get a project by id.
    pub fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let result = self.db.query_row(
            "SELECT id, name, priority, status, created_at FROM projects WHERE id = ?1",
            [id],
            row_to_project,
        );
        optional(result)
    }

    /// Get a project by name.
    pub fn get_project_by_name(&self, name: &str) -> Result<Option<Project>> {
        let result = self.db.query_row(
            "SELECT id, name, priority, status, created_at FROM projects WHERE name = ?1",
            [name],
            row_to_project,
        );
        optional(result)
    }

    /// List projects that participate in allocation and scheduling.
    pub fn list_active_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self
            .db
            .prepare("SELECT id, name, priority, status, created_at FROM projects WHERE status = 'active' ORDER BY id")?;
        let rows = stmt.query_map([], row_to_project)?;
        collect(rows)
    }

    /// List all projects.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self
            .db
            .prepare("SELECT id, name, priority, status, created_at FROM projects ORDER BY id")?;
        let rows = stmt.query_map([], row_to_project)?;
        collect(rows)
    }

    /// Update a project's status.
    pub fn set_project_status(&mut self, id: i64, status: ProjectStatus) -> Result<()> {
        let changed = self.db.execute(
            "UPDATE projects SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if changed == 0 {
            return Err(PostrError::ProjectNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Delete a project. Tasks and sources cascade.
    pub fn delete_project(&mut self, id: i64) -> Result<()> {
        self.db.execute("DELETE FROM projects WHERE id = ?1", [id])?;
        Ok(())
    }

    // ----- sources -----

    /// Insert a new content source and return it with its assigned id.
    pub fn create_source(&mut self, source: &ContentSource) -> Result<ContentSource> {
        self.db.execute(
            "INSERT INTO sources (project_id, path, language, total_items, used_items) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                source.project_id,
                source.path,
                source.language,
                source.total_items,
                source.used_items
            ],
        )?;
        let mut created = source.clone();
        created.id = self.db.last_insert_rowid();
        Ok(created)
    }

    /// List content sources for a project.
    pub fn list_sources(&self, project_id: i64) -> Result<Vec<ContentSource>> {
        let mut stmt = self.db.prepare(
            "SELECT id, project_id, path, language, total_items, used_items FROM sources WHERE project_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([project_id], row_to_source)?;
        collect(rows)
    }

    /// Update a source's bookkeeping counters.
    pub fn update_source_counters(&mut self, id: i64, total_items: i64, used_items: i64) -> Result<()> {
        self.db.execute(
            "UPDATE sources SET total_items = ?1, used_items = ?2 WHERE id = ?3",
            params![total_items, used_items, id],
        )?;
        Ok(())
    }

    // ----- tasks -----

    /// Insert a new task and return it with its assigned id.
    ///
    /// A uniqueness violation on (project_id, media_path) surfaces as a
    /// Storage error; the creation orchestrator checks for duplicates first.
    pub fn insert_task(&mut self, task: &Task) -> Result<Task> {
        let content_json = serde_json::to_string(&task.content_data)?;
        self.db.execute(
            r#"
            INSERT INTO tasks
            (project_id, source_id, media_path, content_data, scheduled_at, priority, status, phase,
             retry_count, version, posted_url, created_at, updated_at, started_at, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                task.project_id,
                task.source_id,
                task.media_path,
                content_json,
                task.scheduled_at,
                task.priority,
                task.status.as_str(),
                task.phase,
                task.retry_count,
                task.version,
                task.posted_url,
                task.created_at,
                task.updated_at,
                task.started_at,
                task.completed_at,
            ],
        )?;
        let mut created = task.clone();
        created.id = self.db.last_insert_rowid();
        Ok(created)
    }

    /// Get a task by id.
    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let result = self
            .db
            .query_row(&format!("{} WHERE id = ?1", SELECT_TASK), [id], row_to_task);
        optional(result)
    }

    /// Find the task for a (project, media_path) pair, if any.
    pub fn find_task_by_media(&self, project_id: i64, media_path: &str) -> Result<Option<Task>> {
        let result = self.db.query_row(
            &format!("{} WHERE project_id = ?1 AND media_path = ?2", SELECT_TASK),
            params![project_id, media_path],
            row_to_task,
        );
        optional(result)
    }

    /// Delete a task.
    pub fn delete_task(&mut self, id: i64) -> Result<()> {
        self.db.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        Ok(())
    }

    /// Test hook: rewrite `updated_at` directly so stuck-task cutoffs can
    /// be exercised without waiting.
    #[cfg(test)]
    pub fn backdate_task_update(&mut self, id: i64, updated_at: i64) -> Result<()> {
        self.db
            .execute("UPDATE tasks SET updated_at = ?1 WHERE id = ?2", params![updated_at, id])?;
        Ok(())
    }

    /// Persist every mutable field of a task, guarded by its version.
    ///
    /// The stored row must still carry `task.version`; on success the row is
    /// written with `version + 1` and the passed task is bumped to match.
    /// A mismatch means another worker got there first.
    pub fn update_task(&mut self, task: &mut Task) -> Result<()> {
        task.touch();
        let content_json = serde_json::to_string(&task.content_data)?;
        let changed = self.db.execute(
            r#"
            UPDATE tasks
            SET content_data = ?1, scheduled_at = ?2, priority = ?3, status = ?4, phase = ?5,
                retry_count = ?6, posted_url = ?7, updated_at = ?8, started_at = ?9,
                completed_at = ?10, version = version + 1
            WHERE id = ?11 AND version = ?12
            "#,
            params![
                content_json,
                task.scheduled_at,
                task.priority,
                task.status.as_str(),
                task.phase,
                task.retry_count,
                task.posted_url,
                task.updated_at,
                task.started_at,
                task.completed_at,
                task.id,
                task.version,
            ],
        )?;
        if changed == 0 {
            return Err(PostrError::VersionConflict {
                task_id: task.id,
                expected: task.version,
            });
        }
        task.version += 1;
        Ok(())
    }

    /// Atomically claim a task for execution.
    ///
    /// The claim succeeds only if the row still has the expected version and
    /// a claimable status; a losing claim returns `Ok(false)` and the caller
    /// just moves on to the next candidate.
    pub fn claim_task(&mut self, task_id: i64, expected_version: i64) -> Result<bool> {
        let now = now_ms();
        let changed = self.db.execute(
            r#"
            UPDATE tasks
            SET status = 'in_progress', phase = 'running', started_at = ?1, updated_at = ?1,
                version = version + 1
            WHERE id = ?2 AND version = ?3 AND status IN ('pending', 'retry')
            "#,
            params![now, task_id, expected_version],
        )?;
        Ok(changed == 1)
    }

    /// List ready tasks in claim order: highest priority first, then earliest
    /// scheduled, optionally filtered by project and language.
    pub fn next_ready(
        &self,
        now: i64,
        limit: usize,
        project_id: Option<i64>,
        language: Option<&str>,
    ) -> Result<Vec<Task>> {
        let mut sql = format!(
            "{} WHERE status IN ('pending', 'retry') AND scheduled_at <= ?1",
            SELECT_TASK
        );
        let mut bindings: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(now)];

        if let Some(pid) = project_id {
            bindings.push(Box::new(pid));
            sql.push_str(&format!(" AND project_id = ?{}", bindings.len()));
        }
        if let Some(lang) = language {
            bindings.push(Box::new(lang.to_string()));
            sql.push_str(&format!(
                " AND json_extract(content_data, '$.language') = ?{}",
                bindings.len()
            ));
        }
        bindings.push(Box::new(limit as i64));
        sql.push_str(&format!(
            " ORDER BY priority DESC, scheduled_at ASC LIMIT ?{}",
            bindings.len()
        ));

        let mut stmt = self.db.prepare(&sql)?;
        let params_ref: Vec<&dyn rusqlite::ToSql> = bindings.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(params_ref.as_slice(), row_to_task)?;
        collect(rows)
    }

    /// List tasks by status.
    pub fn list_by_status(&self, status: TaskStatus) -> Result<Vec<Task>> {
        let mut stmt = self
            .db
            .prepare(&format!("{} WHERE status = ?1 ORDER BY scheduled_at", SELECT_TASK))?;
        let rows = stmt.query_map([status.as_str()], row_to_task)?;
        collect(rows)
    }

    /// List every task, soonest first.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self.db.prepare(&format!("{} ORDER BY scheduled_at", SELECT_TASK))?;
        let rows = stmt.query_map([], row_to_task)?;
        collect(rows)
    }

    /// List tasks for a project.
    pub fn list_by_project(&self, project_id: i64) -> Result<Vec<Task>> {
        let mut stmt = self
            .db
            .prepare(&format!("{} WHERE project_id = ?1 ORDER BY scheduled_at", SELECT_TASK))?;
        let rows = stmt.query_map([project_id], row_to_task)?;
        collect(rows)
    }

    /// Count tasks with `scheduled_at` inside `[start, end)`, optionally for
    /// one project. Drives the global daily cap.
    pub fn count_scheduled_between(&self, project_id: Option<i64>, start: i64, end: i64) -> Result<usize> {
        let count: i64 = match project_id {
            Some(pid) => self.db.query_row(
                "SELECT COUNT(*) FROM tasks WHERE project_id = ?1 AND scheduled_at >= ?2 AND scheduled_at < ?3",
                params![pid, start, end],
                |row| row.get(0),
            )?,
            None => self.db.query_row(
                "SELECT COUNT(*) FROM tasks WHERE scheduled_at >= ?1 AND scheduled_at < ?2",
                params![start, end],
                |row| row.get(0),
            )?,
        };
        Ok(count as usize)
    }

    /// Count tasks by status.
    pub fn count_by_status(&self, status: TaskStatus) -> Result<usize> {
        let count: i64 = self.db.query_row(
            "SELECT COUNT(*) FROM tasks WHERE status = ?1",
            [status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// List tasks that look actively running but have not been updated since
    /// their phase's cutoff. `cutoffs` maps phase name to the oldest
    /// acceptable `updated_at`; phases not listed use `default_cutoff`.
    pub fn list_stuck(&self, cutoffs: &[(&str, i64)], default_cutoff: i64) -> Result<Vec<Task>> {
        let mut stmt = self.db.prepare(&format!(
            "{} WHERE status IN ('locked', 'in_progress') ORDER BY updated_at",
            SELECT_TASK
        ))?;
        let rows = stmt.query_map([], row_to_task)?;
        let candidates = collect(rows)?;

        Ok(candidates
            .into_iter()
            .filter(|t| {
                let cutoff = t
                    .phase
                    .as_deref()
                    .and_then(|p| cutoffs.iter().find(|(name, _)| *name == p))
                    .map(|(_, c)| *c)
                    .unwrap_or(default_cutoff);
                t.updated_at < cutoff
            })
            .collect())
    }

    // ----- publishing log -----

    /// Append one execution-attempt record. Log rows are never mutated.
    pub fn append_log(&mut self, log: &PublishingLog) -> Result<PublishingLog> {
        self.db.execute(
            r#"
            INSERT INTO publishing_log (task_id, status, tweet_id, url, error_message, duration_seconds, published_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                log.task_id,
                log.status.as_str(),
                log.tweet_id,
                log.url,
                log.error_message,
                log.duration_seconds,
                log.published_at,
            ],
        )?;
        let mut created = log.clone();
        created.id = self.db.last_insert_rowid();
        Ok(created)
    }

    /// List log rows for a task, oldest first.
    pub fn logs_for_task(&self, task_id: i64) -> Result<Vec<PublishingLog>> {
        let mut stmt = self.db.prepare(
            "SELECT id, task_id, status, tweet_id, url, error_message, duration_seconds, published_at
             FROM publishing_log WHERE task_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map([task_id], row_to_log)?;
        collect(rows)
    }

    // ----- analytics -----

    /// Upsert the hourly rollup for one completed attempt. At most one row
    /// exists per (project_id, hour bucket).
    pub fn record_outcome(&mut self, project_id: i64, at_ms: i64, success: bool, duration_seconds: f64) -> Result<()> {
        let bucket = hour_bucket(at_ms);
        let (s, f) = if success { (1, 0) } else { (0, 1) };
        self.db.execute(
            r#"
            INSERT INTO analytics_hourly (project_id, hour_ts, successful, failed, total_duration_seconds)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(project_id, hour_ts) DO UPDATE SET
                successful = successful + excluded.successful,
                failed = failed + excluded.failed,
                total_duration_seconds = total_duration_seconds + excluded.total_duration_seconds
            "#,
            params![project_id, bucket, s, f, duration_seconds],
        )?;
        Ok(())
    }

    /// Hourly rollups for a project, oldest bucket first.
    pub fn hourly_for_project(&self, project_id: i64) -> Result<Vec<AnalyticsHourly>> {
        let mut stmt = self.db.prepare(
            "SELECT project_id, hour_ts, successful, failed, total_duration_seconds
             FROM analytics_hourly WHERE project_id = ?1 ORDER BY hour_ts",
        )?;
        let rows = stmt.query_map([project_id], |row| {
            Ok(AnalyticsHourly {
                project_id: row.get(0)?,
                hour_ts: row.get(1)?,
                successful: row.get(2)?,
                failed: row.get(3)?,
                total_duration_seconds: row.get(4)?,
            })
        })?;
        collect(rows)
    }
}

const SELECT_TASK: &str = "SELECT id, project_id, source_id, media_path, content_data, scheduled_at, priority, \
     status, phase, retry_count, version, posted_url, created_at, updated_at, started_at, completed_at FROM tasks";

fn row_to_project(row: &Row) -> rusqlite::Result<Project> {
    let status: String = row.get(3)?;
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        priority: row.get(2)?,
        status: ProjectStatus::parse(&status).unwrap_or(ProjectStatus::Inactive),
        created_at: row.get(4)?,
    })
}

fn row_to_source(row: &Row) -> rusqlite::Result<ContentSource> {
    Ok(ContentSource {
        id: row.get(0)?,
        project_id: row.get(1)?,
        path: row.get(2)?,
        language: row.get(3)?,
        total_items: row.get(4)?,
        used_items: row.get(5)?,
    })
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let content_json: String = row.get(4)?;
    let content: ContentData = serde_json::from_str(&content_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let status: String = row.get(7)?;
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        source_id: row.get(2)?,
        media_path: row.get(3)?,
        content_data: content,
        scheduled_at: row.get(5)?,
        priority: row.get(6)?,
        status: TaskStatus::parse(&status).unwrap_or(TaskStatus::Failed),
        phase: row.get(8)?,
        retry_count: row.get(9)?,
        version: row.get(10)?,
        posted_url: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
        started_at: row.get(14)?,
        completed_at: row.get(15)?,
    })
}

fn row_to_log(row: &Row) -> rusqlite::Result<PublishingLog> {
    let status: String = row.get(2)?;
    Ok(PublishingLog {
        id: row.get(0)?,
        task_id: row.get(1)?,
        status: LogStatus::parse(&status).unwrap_or(LogStatus::Failed),
        tweet_id: row.get(3)?,
        url: row.get(4)?,
        error_message: row.get(5)?,
        duration_seconds: row.get(6)?,
        published_at: row.get(7)?,
    })
}

fn optional<T>(result: rusqlite::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn collect<T>(rows: impl Iterator<Item = rusqlite::Result<T>>) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Compute a hash of the workspace directory path for storage isolation.
pub fn compute_workspace_hash(workspace_dir: &Path) -> Result<String> {
    let canonical = workspace_dir
        .canonicalize()
        .map_err(|e| PostrError::Storage(format!("Failed to canonicalize path {}: {}", workspace_dir.display(), e)))?;

    let path_str = canonical.to_string_lossy();
    let mut hasher = Sha256::new();
    hasher.update(path_str.as_bytes());
    let result = hasher.finalize();

    // Take first 16 chars of hex
    Ok(hex::encode(&result[..8]))
}
