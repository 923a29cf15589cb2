use crate::dashboard::DashboardCore;
use crate::db::Database;
use crate::errors::AppResult;
use crate::export::{ExportArtifact, ExportFormat};
use crate::models::{
    Alert, AuditEntry, DashboardView, EventMarker, FilterCriteria, FilterField, LoadOutcome,
    MeasurementRecord, MetricInsights, MetricKind, Note, NoteBook, OverallInsights,
    RefreshOutcome, Task,
};
use crate::source::HttpDataSource;
use std::path::Path;
use std::sync::Arc;
use tauri::Manager;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

#[derive(Clone)]
pub struct AppState {
    core: Arc<DashboardCore>,
}

// ─── Data Commands ───────────────────────────────────────────────────────

#[tauri::command]
async fn load_data(state: tauri::State<'_, AppState>) -> Result<LoadOutcome, String> {
    state.core.load().await.map_err(to_client_error)
}

#[tauri::command]
async fn manual_refresh(state: tauri::State<'_, AppState>) -> Result<RefreshOutcome, String> {
    state.core.refresh().await.map_err(to_client_error)
}

#[tauri::command]
fn dashboard_view(state: tauri::State<'_, AppState>) -> Result<DashboardView, String> {
    state.core.view().map_err(to_client_error)
}

#[tauri::command]
fn drilldown(
    state: tauri::State<'_, AppState>,
    date: String,
) -> Result<Vec<MeasurementRecord>, String> {
    state.core.drilldown(&date).map_err(to_client_error)
}

#[tauri::command]
fn metric_insights(
    state: tauri::State<'_, AppState>,
    metric: MetricKind,
) -> Result<MetricInsights, String> {
    state.core.metric_insights(metric).map_err(to_client_error)
}

#[tauri::command]
fn overall_insights(state: tauri::State<'_, AppState>) -> Result<OverallInsights, String> {
    state.core.overall_insights().map_err(to_client_error)
}

#[tauri::command]
async fn set_auto_refresh(state: tauri::State<'_, AppState>, enabled: bool) -> Result<bool, String> {
    state.core.set_auto_refresh(enabled).map_err(to_client_error)
}

#[tauri::command]
fn export_view(
    state: tauri::State<'_, AppState>,
    format: ExportFormat,
) -> Result<ExportArtifact, String> {
    state.core.export(format).map_err(to_client_error)
}

// ─── Filter Commands ─────────────────────────────────────────────────────

#[tauri::command]
fn update_filter(
    state: tauri::State<'_, AppState>,
    field: FilterField,
    value: Option<String>,
) -> Result<FilterCriteria, String> {
    state
        .core
        .update_filter(field, value)
        .map_err(to_client_error)
}

#[tauri::command]
fn set_filters(
    state: tauri::State<'_, AppState>,
    criteria: FilterCriteria,
) -> Result<FilterCriteria, String> {
    state.core.set_filters(criteria).map_err(to_client_error)
}

#[tauri::command]
fn reset_filters(state: tauri::State<'_, AppState>) -> Result<FilterCriteria, String> {
    state.core.reset_filters().map_err(to_client_error)
}

// ─── Annotation Commands ─────────────────────────────────────────────────

#[tauri::command]
fn acknowledge_alert(state: tauri::State<'_, AppState>, alert: Alert) -> Result<bool, String> {
    state.core.acknowledge(&alert).map_err(to_client_error)
}

#[tauri::command]
fn create_task_from_alert(
    state: tauri::State<'_, AppState>,
    alert: Alert,
) -> Result<Task, String> {
    state
        .core
        .create_task_from_alert(alert)
        .map_err(to_client_error)
}

#[tauri::command]
fn toggle_task(state: tauri::State<'_, AppState>, id: String) -> Result<Task, String> {
    state.core.toggle_task(&id).map_err(to_client_error)
}

#[tauri::command]
fn remove_task(state: tauri::State<'_, AppState>, id: String) -> Result<(), String> {
    state.core.remove_task(&id).map_err(to_client_error)
}

#[tauri::command]
fn add_note(
    state: tauri::State<'_, AppState>,
    key: String,
    text: String,
) -> Result<Note, String> {
    state.core.add_note(&key, &text).map_err(to_client_error)
}

#[tauri::command]
fn add_event(
    state: tauri::State<'_, AppState>,
    date: String,
    label: String,
) -> Result<EventMarker, String> {
    state.core.add_event(&date, &label).map_err(to_client_error)
}

#[tauri::command]
fn remove_event(state: tauri::State<'_, AppState>, id: String) -> Result<(), String> {
    state.core.remove_event(&id).map_err(to_client_error)
}

#[tauri::command]
fn list_tasks(state: tauri::State<'_, AppState>) -> Result<Vec<Task>, String> {
    state.core.tasks().map_err(to_client_error)
}

#[tauri::command]
fn list_notes(state: tauri::State<'_, AppState>) -> Result<NoteBook, String> {
    state.core.notes().map_err(to_client_error)
}

#[tauri::command]
fn list_events(state: tauri::State<'_, AppState>) -> Result<Vec<EventMarker>, String> {
    state.core.events().map_err(to_client_error)
}

#[tauri::command]
fn audit_log(state: tauri::State<'_, AppState>) -> Result<Vec<AuditEntry>, String> {
    state.core.audit_entries().map_err(to_client_error)
}

/// Build the dashboard core against the app data directory.
pub fn init_core(app_data_dir: &Path) -> AppResult<Arc<DashboardCore>> {
    let db = Arc::new(Database::new(&app_data_dir.join("state.sqlite"))?);
    Ok(DashboardCore::new(db, Arc::new(HttpDataSource::default())))
}

/// Wire the core into a Tauri application; called from the desktop shell's
/// `Builder::setup`. The initial data load runs in the background so the UI
/// stays responsive while it is pending.
pub fn setup(app: &mut tauri::App) -> Result<(), Box<dyn std::error::Error>> {
    let app_data_dir = app.path().app_data_dir()?;
    std::fs::create_dir_all(&app_data_dir)?;
    init_tracing(&app_data_dir)?;

    let core = init_core(&app_data_dir)?;

    tauri::async_runtime::spawn({
        let core = core.clone();
        async move {
            if let Err(error) = core.load().await {
                tracing::warn!(error = %error, "initial data load failed");
            }
        }
    });

    app.manage(AppState { core });
    Ok(())
}

/// The command surface handed to `tauri::Builder::invoke_handler` by the
/// desktop shell.
pub fn invoke_handler<R: tauri::Runtime>(
) -> impl Fn(tauri::ipc::Invoke<R>) -> bool + Send + Sync + 'static {
    tauri::generate_handler![
        load_data,
        manual_refresh,
        dashboard_view,
        drilldown,
        metric_insights,
        overall_insights,
        set_auto_refresh,
        export_view,
        update_filter,
        set_filters,
        reset_filters,
        acknowledge_alert,
        create_task_from_alert,
        toggle_task,
        remove_task,
        add_note,
        add_event,
        remove_event,
        list_tasks,
        list_notes,
        list_events,
        audit_log
    ]
}

fn init_tracing(app_data_dir: &Path) -> Result<(), String> {
    let log_dir = app_data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "dashboard.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}

fn to_client_error(error: impl std::fmt::Display) -> String {
    error.to_string()
}
