// Inherit lint configuration from lib.rs for consistency
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::items_after_statements,
    clippy::too_many_lines,
    clippy::similar_names,
    clippy::fn_params_excessive_bools,
    clippy::unnecessary_wraps,
    clippy::match_same_arms
)]

use chrono::FixedOffset;
use clap::Parser;
use serde::Serialize;

use digitrack::aggregate::{
    classify_window, dashboard_stats, display_offset, file_table, filter_projects,
    recent_discoveries, reconcile, scans_due, summarize_activity, ActivityChart, ActivityLevel,
    DashboardStats, FileRow, FileTableQuery, Reconciliation, SortDirection, SortState,
};
use digitrack::cli::commands::{
    CategoryCommand, Cli, Command, GlobalArgs, ProjectCommand, RootCommand, TaskCommand,
};
use digitrack::cli::output;
use digitrack::clock::{Clock, SystemClock};
use digitrack::config::Config;
use digitrack::db::Database;
use digitrack::models::{
    ActivityLogEntry, ActivitySummary, NewCategory, NewProject, NewRoot, NewTask, Project,
    ProjectDetail, ProjectFilter, Task, TaskDetail, TaskFilter, TaskUpdate,
};
use digitrack::service::{
    fetch_activity_chart, ActivityWindow, Backend, ChartSelection, FileQuery, HttpService,
    LocalService, ProjectService, TaskService,
};
use digitrack::state::StateStore;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{}", output::format_error(&e));
        std::process::exit(1);
    }
}

/// Logs go to stderr; stdout carries JSON only.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

type CmdResult = Result<(), Box<dyn std::fmt::Display>>;

fn map_err(e: impl std::fmt::Display + 'static) -> Box<dyn std::fmt::Display> {
    Box::new(e.to_string())
}

/// Everything a command needs, resolved once per invocation.
struct Context {
    backend: Backend,
    offset: FixedOffset,
    scan_interval: chrono::Duration,
    pretty: bool,
}

impl Context {
    fn emit<T: Serialize>(&self, value: &T) {
        println!("{}", output::render(value, self.pretty));
    }
}

fn run(cli: Cli) -> CmdResult {
    let config = get_config(&cli.global)?;

    // Commands that never touch a backend.
    match cli.command {
        Command::Settings { init } => return cmd_settings(&config, init),
        Command::Welcome { dismiss } => return cmd_welcome(&config, dismiss),
        _ => {}
    }

    let backend = open_backend(&config, cli.global.remote.as_deref())?;
    let ctx = Context {
        offset: display_offset(config.settings.display.utc_offset_minutes),
        scan_interval: config.settings.scan.scan_interval(),
        pretty: config.settings.output.is_pretty(),
        backend,
    };

    let rt = tokio::runtime::Runtime::new().map_err(map_err)?;
    rt.block_on(dispatch(&ctx, cli.command))
}

async fn dispatch(ctx: &Context, command: Command) -> CmdResult {
    match command {
        Command::Root(cmd) => cmd_root(ctx, cmd).await,
        Command::Project(cmd) => cmd_project(ctx, cmd).await,
        Command::Task(cmd) => cmd_task(ctx, cmd).await,
        Command::Category(cmd) => cmd_category(ctx, cmd).await,
        Command::Scan { id } => cmd_scan(ctx, id).await,
        Command::ScanAll => cmd_scan_all(ctx).await,
        Command::Dashboard { project, days } => cmd_dashboard(ctx, project, days).await,
        Command::Activity { id, days } => cmd_activity(ctx, id, days).await,
        Command::Files {
            id,
            search,
            sort,
            desc,
            category,
        } => {
            let direction = if desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            let query = FileTableQuery {
                sort: SortState::new(sort, direction),
                category,
            };
            cmd_files(ctx, id, search, &query).await
        }
        Command::Status { id } => cmd_status(ctx, id).await,
        Command::Verify { id } => cmd_verify(ctx, id).await,
        Command::Settings { .. } | Command::Welcome { .. } => Ok(()),
    }
}

fn get_config(global: &GlobalArgs) -> Result<Config, Box<dyn std::fmt::Display>> {
    match &global.data_dir {
        Some(dir) => Ok(Config::new(dir)),
        None => Config::from_cwd().map_err(map_err),
    }
}

/// Remote when a URL is given on the command line, in the environment or in
/// config.toml; the local store otherwise.
fn open_backend(config: &Config, remote: Option<&str>) -> Result<Backend, Box<dyn std::fmt::Display>> {
    let url = remote
        .filter(|u| !u.trim().is_empty())
        .or_else(|| config.remote_url());
    if let Some(url) = url {
        tracing::debug!("using remote service at {url}");
        let http = HttpService::new(url, &config.settings.service).map_err(map_err)?;
        return Ok(Backend::Remote(http));
    }

    let db = Database::open(&config.db_path).map_err(map_err)?;
    tracing::debug!("using local store at {}", config.db_path.display());
    Ok(Backend::Local(LocalService::new(
        db,
        config.settings.scan.clone(),
        Box::new(SystemClock),
        display_offset(config.settings.display.utc_offset_minutes),
    )))
}

fn window(days: u32) -> Result<ActivityWindow, Box<dyn std::fmt::Display>> {
    ActivityWindow::from_days(days).map_err(map_err)
}

// ─── Roots ──────────────────────────────────────────────────────

async fn cmd_root(ctx: &Context, cmd: RootCommand) -> CmdResult {
    let svc = &ctx.backend;
    match cmd {
        RootCommand::Add {
            path,
            name,
            no_discover,
        } => {
            let path = absolute(&path);
            let root = svc
                .create_root(&NewRoot::from_path(&path, name.as_deref(), !no_discover))
                .await
                .map_err(map_err)?;
            ctx.emit(&root);
        }
        RootCommand::List => ctx.emit(&svc.list_roots().await.map_err(map_err)?),
        RootCommand::Remove { id } => {
            svc.delete_root(id).await.map_err(map_err)?;
            ctx.emit(&serde_json::json!({ "removed": id }));
        }
        RootCommand::Scan { id } => ctx.emit(&svc.scan_root(id).await.map_err(map_err)?),
    }
    Ok(())
}

// ─── Projects ───────────────────────────────────────────────────

#[derive(Serialize)]
struct LevelView {
    level: ActivityLevel,
    label: &'static str,
    variant: &'static str,
    progress: u8,
}

impl From<ActivityLevel> for LevelView {
    fn from(level: ActivityLevel) -> Self {
        Self {
            level,
            label: level.label(),
            variant: level.variant(),
            progress: level.weight(),
        }
    }
}

#[derive(Serialize)]
struct ProjectView<'a> {
    #[serde(flatten)]
    detail: &'a ProjectDetail,
    total_size_display: String,
    activity_level: LevelView,
}

impl<'a> ProjectView<'a> {
    fn new(detail: &'a ProjectDetail) -> Self {
        Self {
            detail,
            total_size_display: output::format_file_size(detail.project.total_size),
            activity_level: classify_window(&detail.recent_activity).into(),
        }
    }
}

async fn cmd_project(ctx: &Context, cmd: ProjectCommand) -> CmdResult {
    let svc = &ctx.backend;
    match cmd {
        ProjectCommand::Add { path, name } => {
            let path = absolute(&path);
            let project = svc
                .create_project(&NewProject::from_path(&path, name.as_deref()))
                .await
                .map_err(map_err)?;
            ctx.emit(&project);
        }
        ProjectCommand::List { status, search } => {
            let projects = svc
                .list_projects(&ProjectFilter::default())
                .await
                .map_err(map_err)?;
            let shown = filter_projects(&projects, status, search.as_deref().unwrap_or(""));
            ctx.emit(&shown);
        }
        ProjectCommand::Show { id } => {
            let detail = svc.get_project(id).await.map_err(map_err)?;
            ctx.emit(&ProjectView::new(&detail));
        }
        ProjectCommand::Activate { id } => {
            ctx.emit(&svc.set_project_active(id, true).await.map_err(map_err)?);
        }
        ProjectCommand::Deactivate { id } => {
            ctx.emit(&svc.set_project_active(id, false).await.map_err(map_err)?);
        }
        ProjectCommand::Remove { id } => {
            svc.delete_project(id).await.map_err(map_err)?;
            ctx.emit(&serde_json::json!({ "removed": id }));
        }
    }
    Ok(())
}

// ─── Tasks ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct TaskView<'a> {
    #[serde(flatten)]
    task: &'a Task,
    status_display: &'static str,
    priority_display: &'static str,
}

impl<'a> From<&'a Task> for TaskView<'a> {
    fn from(task: &'a Task) -> Self {
        Self {
            task,
            status_display: task.status.label(),
            priority_display: task.priority.label(),
        }
    }
}

#[derive(Serialize)]
struct TaskDetailView<'a> {
    #[serde(flatten)]
    detail: &'a TaskDetail,
    status_display: &'static str,
    priority_display: &'static str,
}

async fn cmd_task(ctx: &Context, cmd: TaskCommand) -> CmdResult {
    let svc = &ctx.backend;
    match cmd {
        TaskCommand::Add {
            project,
            title,
            description,
            category,
            status,
            priority,
            due,
        } => {
            let mut new = NewTask::new(project, &title);
            new.description = description.unwrap_or_default();
            new.category = category;
            new.status = status.unwrap_or_default();
            new.priority = priority.unwrap_or_default();
            new.due_date = due;
            let task = svc.create_task(&new).await.map_err(map_err)?;
            ctx.emit(&TaskView::from(&task));
        }
        TaskCommand::List {
            project,
            status,
            priority,
            category,
        } => {
            let filter = TaskFilter {
                project,
                status,
                priority,
                category,
            };
            let tasks = svc.list_tasks(&filter).await.map_err(map_err)?;
            let views: Vec<TaskView> = tasks.iter().map(TaskView::from).collect();
            ctx.emit(&views);
        }
        TaskCommand::Show { id } => {
            let detail = svc.get_task(id).await.map_err(map_err)?;
            ctx.emit(&TaskDetailView {
                status_display: detail.task.status.label(),
                priority_display: detail.task.priority.label(),
                detail: &detail,
            });
        }
        TaskCommand::Update {
            id,
            title,
            description,
            category,
            no_category,
            status,
            priority,
            due,
            no_due,
        } => {
            let update = TaskUpdate {
                title,
                description,
                category: if no_category { Some(None) } else { category.map(Some) },
                status,
                priority,
                due_date: if no_due { Some(None) } else { due.map(Some) },
            };
            if update.is_empty() {
                return Err(map_err("nothing to update"));
            }
            let task = svc.update_task(id, &update).await.map_err(map_err)?;
            ctx.emit(&TaskView::from(&task));
        }
        TaskCommand::Remove { id } => {
            svc.delete_task(id).await.map_err(map_err)?;
            ctx.emit(&serde_json::json!({ "removed": id }));
        }
        TaskCommand::Comment { id, text } => {
            ctx.emit(&svc.add_comment(id, &text).await.map_err(map_err)?);
        }
        TaskCommand::Comments { id } => {
            ctx.emit(&svc.list_comments(id).await.map_err(map_err)?);
        }
    }
    Ok(())
}

async fn cmd_category(ctx: &Context, cmd: CategoryCommand) -> CmdResult {
    let svc = &ctx.backend;
    match cmd {
        CategoryCommand::Add {
            name,
            description,
            color,
        } => {
            let mut new = NewCategory::new(&name);
            new.description = description.unwrap_or_default();
            if let Some(color) = color {
                new.color = color;
            }
            ctx.emit(&svc.create_category(&new).await.map_err(map_err)?);
        }
        CategoryCommand::List => ctx.emit(&svc.list_categories().await.map_err(map_err)?),
        CategoryCommand::Remove { id } => {
            svc.delete_category(id).await.map_err(map_err)?;
            ctx.emit(&serde_json::json!({ "removed": id }));
        }
    }
    Ok(())
}

// ─── Scanning ───────────────────────────────────────────────────

async fn cmd_scan(ctx: &Context, id: i64) -> CmdResult {
    let summary = ctx.backend.scan_project(id).await.map_err(map_err)?;
    ctx.emit(&summary);
    Ok(())
}

async fn cmd_scan_all(ctx: &Context) -> CmdResult {
    let summary = ctx.backend.scan_all().await.map_err(map_err)?;
    ctx.emit(&summary);
    Ok(())
}

// ─── Views ──────────────────────────────────────────────────────

#[derive(Serialize)]
struct DashboardView<'a> {
    stats: DashboardStats,
    total_files_display: String,
    total_size_display: String,
    window_days: u32,
    chart: ActivityChart,
    recent_discoveries: Vec<&'a Project>,
    scan_interval_minutes: i64,
    /// Active projects whose last scan is older than the scan interval.
    scans_due: Vec<&'a Project>,
}

async fn cmd_dashboard(ctx: &Context, project: Option<i64>, days: u32) -> CmdResult {
    let window = window(days)?;
    let projects = ctx
        .backend
        .list_projects(&ProjectFilter::default())
        .await
        .map_err(map_err)?;
    let selection = project.map_or(ChartSelection::AllProjects, ChartSelection::Project);
    let chart = fetch_activity_chart(&ctx.backend, &projects, selection, window, ctx.offset)
        .await
        .map_err(map_err)?;

    let stats = dashboard_stats(&projects);
    let view = DashboardView {
        total_files_display: output::format_number(stats.total_files),
        total_size_display: output::format_file_size(stats.total_size),
        stats,
        window_days: window.days(),
        chart,
        recent_discoveries: recent_discoveries(&projects),
        scan_interval_minutes: ctx.scan_interval.num_minutes(),
        scans_due: scans_due(&projects, SystemClock.now(), ctx.scan_interval),
    };
    ctx.emit(&view);
    Ok(())
}

#[derive(Serialize)]
struct LogView<'a> {
    #[serde(flatten)]
    entry: &'a ActivityLogEntry,
    size_change_display: String,
}

#[derive(Serialize)]
struct SummaryView {
    #[serde(flatten)]
    summary: ActivitySummary,
    net_size_change_display: String,
}

#[derive(Serialize)]
struct ActivityView<'a> {
    logs: Vec<LogView<'a>>,
    summary: SummaryView,
}

async fn cmd_activity(ctx: &Context, id: i64, days: u32) -> CmdResult {
    let report = ctx
        .backend
        .get_activity(id, window(days)?)
        .await
        .map_err(map_err)?;
    // Paged remote responses carry no summary.
    let summary = report
        .summary
        .unwrap_or_else(|| summarize_activity(&report.logs, ctx.offset));
    let logs = report
        .logs
        .iter()
        .map(|entry| LogView {
            entry,
            size_change_display: output::format_size_change(entry.size_change),
        })
        .collect();
    ctx.emit(&ActivityView {
        logs,
        summary: SummaryView {
            net_size_change_display: output::format_size_change(summary.net_size_change),
            summary,
        },
    });
    Ok(())
}

#[derive(Serialize)]
struct FileView {
    #[serde(flatten)]
    row: FileRow,
    size_display: String,
}

async fn cmd_files(
    ctx: &Context,
    id: i64,
    search: Option<String>,
    query: &FileTableQuery,
) -> CmdResult {
    let files = ctx
        .backend
        .list_files(
            id,
            &FileQuery {
                filename_contains: search,
            },
        )
        .await
        .map_err(map_err)?;
    let rows: Vec<FileView> = file_table(&files, query)
        .into_iter()
        .map(|row| FileView {
            size_display: output::format_file_size(row.file.size),
            row,
        })
        .collect();
    ctx.emit(&rows);
    Ok(())
}

#[derive(Serialize)]
struct StatusView {
    id: i64,
    name: String,
    active: bool,
    is_auto_discovered: bool,
    root: Option<i64>,
    created_at: String,
    last_scan: Option<String>,
    activity_level: LevelView,
}

async fn cmd_status(ctx: &Context, id: i64) -> CmdResult {
    let detail = ctx.backend.get_project(id).await.map_err(map_err)?;
    let level = classify_window(&detail.recent_activity);
    let p = detail.project;
    ctx.emit(&StatusView {
        id: p.id,
        name: p.name,
        active: p.active,
        is_auto_discovered: p.is_auto_discovered,
        root: p.root,
        created_at: p.created_at,
        last_scan: p.last_scan,
        activity_level: level.into(),
    });
    Ok(())
}

#[derive(Serialize)]
struct VerifyView {
    #[serde(flatten)]
    reconciliation: Reconciliation,
    /// False when only the last 90 days of history were available.
    complete_log: bool,
}

async fn cmd_verify(ctx: &Context, id: i64) -> CmdResult {
    let detail = ctx.backend.get_project(id).await.map_err(map_err)?;
    let files = ctx
        .backend
        .list_files(id, &FileQuery::default())
        .await
        .map_err(map_err)?;

    // The local store has the whole log; a remote service only exposes windows.
    let (log, complete_log) = match &ctx.backend {
        Backend::Local(local) => (local.database().all_activity(id).map_err(map_err)?, true),
        Backend::Remote(remote) => {
            let report = remote
                .get_activity(id, ActivityWindow::Quarter)
                .await
                .map_err(map_err)?;
            (report.logs, false)
        }
    };

    let reconciliation = reconcile(&detail.project, &files, &log);
    if !reconciliation.consistent {
        tracing::warn!(project = id, "totals drift from inventory or activity log");
    }
    ctx.emit(&VerifyView {
        reconciliation,
        complete_log,
    });
    Ok(())
}

// ─── Local state ────────────────────────────────────────────────

fn cmd_settings(config: &Config, init: bool) -> CmdResult {
    if init {
        config.save_settings().map_err(map_err)?;
    }
    let view = serde_json::json!({
        "data_dir": config.data_dir.display().to_string(),
        "config_path": config.config_path.display().to_string(),
        "settings": config.settings,
    });
    println!("{}", output::render(&view, config.settings.output.is_pretty()));
    Ok(())
}

fn cmd_welcome(config: &Config, dismiss: bool) -> CmdResult {
    let mut state = StateStore::load(&config.state_path);
    let show = !state.has_seen_welcome();
    if dismiss && show {
        state.mark_welcome_seen().map_err(map_err)?;
    }
    println!(
        "{}",
        output::format_json(&serde_json::json!({ "show_welcome": show && !dismiss }))
    );
    Ok(())
}

/// Store folders as absolute paths so discovery and scans agree on identity.
fn absolute(path: &str) -> String {
    std::path::absolute(path)
        .map_or_else(|_| path.to_string(), |p| p.to_string_lossy().into_owned())
}
