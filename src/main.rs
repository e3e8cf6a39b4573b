use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use postr::cli::{Cli, Commands, ProjectCommands};
use postr::config::Config;
use postr::creator::TaskCreator;
use postr::daemon::{self, DaemonContext};
use postr::engine::TaskExecutor;
use postr::publish::{HttpContentGenerator, HttpPublisher};
use postr::recovery::RecoveryManager;
use postr::store::{ContentSource, Project, TaskStatus, TaskStore};
use tokio::sync::watch;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("postr")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("postr.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn open_store(config: &Config) -> Result<TaskStore> {
    let store = match &config.storage.taskstore_dir {
        Some(dir) => TaskStore::open_at(dir)?,
        None => TaskStore::open(&std::env::current_dir().context("Failed to resolve current directory")?)?,
    };
    Ok(store)
}

async fn handle_run(config: Config) -> Result<()> {
    println!("{}", "Starting postr daemon (ctrl-c to stop)...".cyan());
    let context = Arc::new(DaemonContext::new(config)?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received ctrl-c, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    daemon::run(context, shutdown_rx).await?;
    println!("{}", "Daemon stopped.".cyan());
    Ok(())
}

fn handle_create(config: &Config, force: bool) -> Result<()> {
    let mut store = open_store(config)?;
    let creator = TaskCreator::new(config.scheduling.clone());
    let mut rng = StdRng::from_os_rng();

    let report = creator.create_for_all_projects(&mut store, force, &mut rng);

    println!("{} {}", "created:".green(), report.created);
    println!("{} {}", "skipped:".yellow(), report.skipped);
    for error in &report.errors {
        println!("{} {}", "error:".red(), error);
    }
    Ok(())
}

async fn handle_execute(config: &Config, limit: usize, project: Option<&str>, language: Option<&str>) -> Result<()> {
    let store = open_store(config)?;
    let project_id = match project {
        Some(name) => Some(
            store
                .get_project_by_name(name)?
                .ok_or_else(|| eyre!("no such project: {}", name))?
                .id,
        ),
        None => None,
    };
    let store = tokio::sync::Mutex::new(store);

    let generator = Arc::new(HttpContentGenerator::new(&config.api)?);
    let publisher = Arc::new(HttpPublisher::new(&config.api)?);
    let executor = TaskExecutor::new(generator, publisher, config.retry.clone());
    let mut rng = StdRng::from_os_rng();

    let report = executor.run_batch(&store, limit, project_id, language, &mut rng).await?;

    println!("{} {}", "executed:".cyan(), report.executed);
    println!("{} {}", "succeeded:".green(), report.succeeded);
    println!("{} {}", "retried:".yellow(), report.retried);
    println!("{} {}", "failed:".red(), report.failed);
    Ok(())
}

fn handle_list(config: &Config, status: Option<&str>, project: Option<&str>) -> Result<()> {
    let store = open_store(config)?;

    let mut tasks = match status {
        Some(s) => {
            let status = TaskStatus::parse(s).ok_or_else(|| eyre!("unknown status: {}", s))?;
            store.list_by_status(status)?
        }
        None => store.list_tasks()?,
    };

    if let Some(name) = project {
        let project = store
            .get_project_by_name(name)?
            .ok_or_else(|| eyre!("no such project: {}", name))?;
        tasks.retain(|t| t.project_id == project.id);
    }

    if tasks.is_empty() {
        println!("{}", "No tasks.".yellow());
        return Ok(());
    }

    for task in tasks {
        let status = colorize_status(task.status);
        println!(
            "{:>6}  {:<12} {:>3}x  {}  {}",
            task.id,
            status,
            task.retry_count,
            format_ms(task.scheduled_at),
            task.media_path
        );
    }

    println!(
        "{} {} pending, {} retry, {} success, {} failed",
        "totals:".bold(),
        store.count_by_status(TaskStatus::Pending)?,
        store.count_by_status(TaskStatus::Retry)?,
        store.count_by_status(TaskStatus::Success)?,
        store.count_by_status(TaskStatus::Failed)?,
    );
    Ok(())
}

fn handle_status(config: &Config, id: i64) -> Result<()> {
    let store = open_store(config)?;
    let task = store.get_task(id)?.ok_or_else(|| eyre!("no such task: {}", id))?;

    println!("{} {}", "task:".bold(), task.id);
    println!("  project:    {}", task.project_id);
    println!("  media:      {}", task.media_path);
    println!("  status:     {}", colorize_status(task.status));
    if let Some(phase) = &task.phase {
        println!("  phase:      {}", phase);
    }
    println!("  retries:    {}", task.retry_count);
    println!("  scheduled:  {}", format_ms(task.scheduled_at));
    if let Some(url) = &task.posted_url {
        println!("  posted:     {}", url.green());
    }

    let logs = store.logs_for_task(id)?;
    if !logs.is_empty() {
        println!("{}", "attempts:".bold());
        for log in logs {
            let line = format!(
                "  {}  {:<8} {:.1}s  {}",
                format_ms(log.published_at),
                log.status.as_str(),
                log.duration_seconds,
                log.error_message.as_deref().unwrap_or("-")
            );
            println!("{}", line);
        }
    }
    Ok(())
}

fn handle_recover(config: &Config) -> Result<()> {
    let mut store = open_store(config)?;
    let mut manager = RecoveryManager::new(config.recovery.clone());

    let report = manager.sweep(&mut store)?;
    if report.scanned == 0 {
        println!("{}", "No stuck tasks.".green());
        return Ok(());
    }

    println!("{} {}", "stuck:".yellow(), report.scanned);
    println!("  reset:      {}", report.reset);
    println!("  retried:    {}", report.retried);
    println!("  escalated:  {}", report.escalated);
    println!("  manual:     {}", report.manual);
    println!("  aborted:    {}", report.aborted);
    println!("  skipped:    {}", report.skipped);
    Ok(())
}

fn handle_project(config: &Config, command: &ProjectCommands) -> Result<()> {
    let mut store = open_store(config)?;
    match command {
        ProjectCommands::Add {
            name,
            source,
            language,
            priority,
        } => {
            let project = store.create_project(&Project::new(name, *priority))?;
            store.create_source(&ContentSource::new(
                project.id,
                &source.to_string_lossy(),
                language,
            ))?;
            println!(
                "{} project {} (id {}) with source {}",
                "added".green(),
                project.name,
                project.id,
                source.display()
            );
        }
        ProjectCommands::List => {
            let projects = store.list_projects()?;
            if projects.is_empty() {
                println!("{}", "No projects.".yellow());
                return Ok(());
            }
            for project in projects {
                println!(
                    "{:>4}  {:<20} priority {:<3} {}",
                    project.id,
                    project.name,
                    project.priority,
                    project.status
                );
            }
        }
    }
    Ok(())
}

fn colorize_status(status: TaskStatus) -> ColoredString {
    match status {
        TaskStatus::Pending => status.as_str().normal(),
        TaskStatus::Locked | TaskStatus::InProgress => status.as_str().cyan(),
        TaskStatus::Retry => status.as_str().yellow(),
        TaskStatus::Success => status.as_str().green(),
        TaskStatus::Failed => status.as_str().red(),
    }
}

fn format_ms(ts_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts_ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts_ms.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref())?;

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match &cli.command {
        Commands::Run => handle_run(config).await,
        Commands::Create { force } => handle_create(&config, *force),
        Commands::Execute { limit, project, language } => {
            handle_execute(&config, *limit, project.as_deref(), language.as_deref()).await
        }
        Commands::List { status, project } => handle_list(&config, status.as_deref(), project.as_deref()),
        Commands::Status { id } => handle_status(&config, *id),
        Commands::Recover => handle_recover(&config),
        Commands::Project { command } => handle_project(&config, command),
    }
}
