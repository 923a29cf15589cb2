use crate::aggregate;
use crate::alerts;
use crate::annotations::AnnotationStore;
use crate::audit::AuditLog;
use crate::db::{self, keys, StateGateway};
use crate::errors::{AppError, AppResult};
use crate::export::{self, ExportArtifact, ExportFormat};
use crate::filter;
use crate::goals;
use crate::models::{
    AcknowledgementSet, Alert, AuditEntry, DashboardView, EventMarker, FilterCriteria,
    FilterField, LoadOutcome, MeasurementRecord, MetricInsights, MetricKind, Note, NoteBook,
    OverallInsights, RefreshOutcome, Task,
};
use crate::refresh::{self, AutoRefreshDriver};
use crate::source::{self, DataSource, SAMPLE_DATASET_SIZE};
use crate::store::RecordStore;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

const HOTSPOT_LIMIT: usize = 5;

/// The application-state aggregate behind the dashboard: record store,
/// filters, annotations, and audit log, with every mutation audited and
/// write-through mirrored to the persistence gateway. Derived data is
/// recomputed from current state on every read; nothing is cached.
pub struct DashboardCore {
    gateway: Arc<dyn StateGateway>,
    source: Arc<dyn DataSource>,
    driver: AutoRefreshDriver,
    state: Mutex<DashboardState>,
}

struct DashboardState {
    records: RecordStore,
    filters: FilterCriteria,
    annotations: AnnotationStore,
    audit: AuditLog,
    auto_refresh: bool,
}

impl DashboardCore {
    pub fn new(gateway: Arc<dyn StateGateway>, source: Arc<dyn DataSource>) -> Arc<Self> {
        Self::with_driver(gateway, source, AutoRefreshDriver::default())
    }

    pub fn with_driver(
        gateway: Arc<dyn StateGateway>,
        source: Arc<dyn DataSource>,
        driver: AutoRefreshDriver,
    ) -> Arc<Self> {
        let state = DashboardState {
            records: RecordStore::default(),
            filters: db::load_or_default(gateway.as_ref(), keys::FILTERS),
            annotations: AnnotationStore {
                tasks: db::load_or_default(gateway.as_ref(), keys::TASKS),
                notes: db::load_or_default(gateway.as_ref(), keys::NOTES),
                events: db::load_or_default(gateway.as_ref(), keys::EVENTS),
                acknowledged: AcknowledgementSet::new(),
            },
            audit: AuditLog::seed(db::load_or_default(gateway.as_ref(), keys::AUDIT)),
            auto_refresh: false,
        };

        let this = Arc::new(Self {
            gateway,
            source,
            driver,
            state: Mutex::new(state),
        });

        let weak = Arc::downgrade(&this);
        this.driver.set_tick(Arc::new(move || {
            if let Some(core) = weak.upgrade() {
                core.auto_refresh_tick();
            }
        }));

        this
    }

    /// Initial dataset load. Any fetch failure falls back to the generated
    /// dataset so the store is never left empty; one audit entry names the
    /// path taken.
    pub async fn load(&self) -> AppResult<LoadOutcome> {
        let (records, outcome, action) = match self.source.fetch().await {
            Ok(records) => (
                records,
                LoadOutcome::SourceEndpoint,
                "data loaded from source endpoint",
            ),
            Err(error) => {
                tracing::warn!(error = %error, "data source fetch failed, using generated fallback");
                (
                    source::sample_dataset(SAMPLE_DATASET_SIZE),
                    LoadOutcome::GeneratedFallback,
                    "data loaded from generated fallback",
                )
            }
        };

        let mut state = self.lock_state()?;
        state.records.replace_all(records);
        self.log(&mut state, action);
        self.mirror_records(&state);
        Ok(outcome)
    }

    /// User-triggered refresh. Falls back like `load`, but the failure is
    /// surfaced in the returned notice rather than handled silently.
    pub async fn refresh(&self) -> AppResult<RefreshOutcome> {
        match self.source.fetch().await {
            Ok(records) => {
                let mut state = self.lock_state()?;
                state.records.replace_all(records);
                self.log(&mut state, "manual refresh");
                self.mirror_records(&state);
                Ok(RefreshOutcome {
                    source: LoadOutcome::SourceEndpoint,
                    notice: "Refreshed from source endpoint".to_string(),
                })
            }
            Err(error) => {
                tracing::warn!(error = %error, "manual refresh failed, using generated fallback");
                let mut state = self.lock_state()?;
                state
                    .records
                    .replace_all(source::sample_dataset(SAMPLE_DATASET_SIZE));
                self.mirror_records(&state);
                Ok(RefreshOutcome {
                    source: LoadOutcome::GeneratedFallback,
                    notice: "Failed to refresh from source endpoint. Using generated fallback data."
                        .to_string(),
                })
            }
        }
    }

    pub fn view(&self) -> AppResult<DashboardView> {
        let state = self.lock_state()?;
        Ok(derive(&state))
    }

    pub fn update_filter(
        &self,
        field: FilterField,
        value: Option<String>,
    ) -> AppResult<FilterCriteria> {
        let mut state = self.lock_state()?;
        let mut next = state.filters.clone();
        filter::update(&mut next, field, value)?;
        state.filters = next;
        self.log(&mut state, "filters updated");
        self.mirror(keys::FILTERS, &state.filters);
        self.mirror_filtered(&state);
        Ok(state.filters.clone())
    }

    pub fn set_filters(&self, criteria: FilterCriteria) -> AppResult<FilterCriteria> {
        let mut state = self.lock_state()?;
        state.filters = criteria;
        self.log(&mut state, "filters updated");
        self.mirror(keys::FILTERS, &state.filters);
        self.mirror_filtered(&state);
        Ok(state.filters.clone())
    }

    pub fn reset_filters(&self) -> AppResult<FilterCriteria> {
        self.set_filters(FilterCriteria::default())
    }

    /// Toggle the auto-refresh driver. Requesting the current state is a
    /// no-op; only one timer is ever active per running period.
    pub fn set_auto_refresh(&self, enabled: bool) -> AppResult<bool> {
        {
            let mut state = self.lock_state()?;
            if state.auto_refresh == enabled {
                return Ok(false);
            }
            state.auto_refresh = enabled;
            let action = if enabled {
                "auto-refresh started"
            } else {
                "auto-refresh stopped"
            };
            self.log(&mut state, action);
        }

        if enabled {
            self.driver.start();
        } else {
            self.driver.stop();
        }
        Ok(true)
    }

    fn auto_refresh_tick(&self) {
        let Ok(mut state) = self.lock_state() else {
            return;
        };
        // A tick that lost the race against stop must not append.
        if !state.auto_refresh {
            return;
        }
        let options = filter::options(state.records.records());
        let Some(record) = refresh::synthesize_record(&options) else {
            return;
        };
        state.records.prepend(record);
        self.log(&mut state, "auto-refresh new record appended");
        self.mirror_records(&state);
    }

    /// Idempotent one-way dismissal; returns whether the alert was newly
    /// acknowledged.
    pub fn acknowledge(&self, alert: &Alert) -> AppResult<bool> {
        let mut state = self.lock_state()?;
        if !state.annotations.acknowledge(alert) {
            return Ok(false);
        }
        let action = format!(
            "acknowledged alert {} {}",
            alert.metric.as_str(),
            alert.date
        );
        self.log(&mut state, action);
        Ok(true)
    }

    pub fn create_task_from_alert(&self, alert: Alert) -> AppResult<Task> {
        let mut state = self.lock_state()?;
        let action = format!(
            "task created from alert: {} on {}",
            alert.metric.as_str(),
            alert.date
        );
        let task = state.annotations.create_task_from_alert(alert);
        self.log(&mut state, action);
        self.mirror(keys::TASKS, &state.annotations.tasks);
        Ok(task)
    }

    pub fn toggle_task(&self, id: &str) -> AppResult<Task> {
        let mut state = self.lock_state()?;
        let task = state.annotations.toggle_task(id)?;
        self.log(&mut state, format!("task toggled {id}"));
        self.mirror(keys::TASKS, &state.annotations.tasks);
        Ok(task)
    }

    pub fn remove_task(&self, id: &str) -> AppResult<()> {
        let mut state = self.lock_state()?;
        state.annotations.remove_task(id)?;
        self.log(&mut state, format!("task removed {id}"));
        self.mirror(keys::TASKS, &state.annotations.tasks);
        Ok(())
    }

    pub fn add_note(&self, key: &str, text: &str) -> AppResult<Note> {
        let mut state = self.lock_state()?;
        let note = state.annotations.add_note(key, text)?;
        self.log(&mut state, format!("note added for {key}"));
        self.mirror(keys::NOTES, &state.annotations.notes);
        Ok(note)
    }

    pub fn add_event(&self, date: &str, label: &str) -> AppResult<EventMarker> {
        let mut state = self.lock_state()?;
        let event = state.annotations.add_event(date, label)?;
        self.log(&mut state, format!("event added {label} @ {date}"));
        self.mirror(keys::EVENTS, &state.annotations.events);
        Ok(event)
    }

    pub fn remove_event(&self, id: &str) -> AppResult<()> {
        let mut state = self.lock_state()?;
        let event = state.annotations.remove_event(id)?;
        self.log(
            &mut state,
            format!("event removed {}@{}", event.label, event.date),
        );
        self.mirror(keys::EVENTS, &state.annotations.events);
        Ok(())
    }

    pub fn drilldown(&self, date: &str) -> AppResult<Vec<MeasurementRecord>> {
        let mut state = self.lock_state()?;
        let rows: Vec<MeasurementRecord> =
            filter::apply(state.records.records(), &state.filters)
                .into_iter()
                .filter(|record| record.date == date)
                .collect();
        self.log(&mut state, format!("drilldown opened for {date}"));
        Ok(rows)
    }

    /// Produce an export artifact from the currently displayed subset as-is.
    /// An empty subset is a validation failure and writes no audit entry.
    pub fn export(&self, format: ExportFormat) -> AppResult<ExportArtifact> {
        let mut state = self.lock_state()?;
        let filtered = filter::apply(state.records.records(), &state.filters);
        let artifact = export::build(format, &filtered)?;
        let action = match format {
            ExportFormat::Csv => "export csv",
            ExportFormat::Xlsx => "export xlsx",
            ExportFormat::Pdf => "export pdf",
        };
        self.log(&mut state, action);
        Ok(artifact)
    }

    pub fn metric_insights(&self, metric: MetricKind) -> AppResult<MetricInsights> {
        let state = self.lock_state()?;
        let filtered = filter::apply(state.records.records(), &state.filters);
        Ok(MetricInsights {
            metric,
            trend: aggregate::by_date(&filtered, metric),
            hotspots: aggregate::department_hotspots(&filtered, metric, HOTSPOT_LIMIT),
            total: aggregate::totals(&filtered).get(metric),
        })
    }

    pub fn overall_insights(&self) -> AppResult<OverallInsights> {
        let state = self.lock_state()?;
        let filtered = filter::apply(state.records.records(), &state.filters);
        Ok(OverallInsights {
            trend: aggregate::overall_by_date(&filtered),
            totals: aggregate::totals(&filtered),
        })
    }

    pub fn filters(&self) -> AppResult<FilterCriteria> {
        Ok(self.lock_state()?.filters.clone())
    }

    pub fn tasks(&self) -> AppResult<Vec<Task>> {
        Ok(self.lock_state()?.annotations.tasks.clone())
    }

    pub fn notes(&self) -> AppResult<NoteBook> {
        Ok(self.lock_state()?.annotations.notes.clone())
    }

    pub fn events(&self) -> AppResult<Vec<EventMarker>> {
        Ok(self.lock_state()?.annotations.events.clone())
    }

    pub fn audit_entries(&self) -> AppResult<Vec<AuditEntry>> {
        Ok(self.lock_state()?.audit.to_vec())
    }

    fn lock_state(&self) -> AppResult<MutexGuard<'_, DashboardState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("state mutex poisoned".to_string()))
    }

    fn log(&self, state: &mut DashboardState, action: impl Into<String>) {
        state.audit.record(action);
        self.mirror(keys::AUDIT, &state.audit.to_vec());
    }

    // Storage is a mirror of authoritative in-memory state; a failed write
    // degrades to a warning.
    fn mirror<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => {
                if let Err(error) = self.gateway.save(key, &json) {
                    tracing::warn!(key, error = %error, "state mirror write failed");
                }
            }
            Err(error) => {
                tracing::warn!(key, error = %error, "state mirror serialization failed");
            }
        }
    }

    fn mirror_records(&self, state: &DashboardState) {
        self.mirror(keys::DATA, &state.records.records());
        self.mirror_filtered(state);
    }

    fn mirror_filtered(&self, state: &DashboardState) {
        self.mirror(
            keys::FILTERED,
            &filter::apply(state.records.records(), &state.filters),
        );
    }
}

/// Full derivation pass: one pure function of current state, invoked after
/// each mutation by whoever renders.
fn derive(state: &DashboardState) -> DashboardView {
    let records = state.records.records();
    let filtered = filter::apply(records, &state.filters);
    let totals = aggregate::totals(&filtered);
    let alerts = alerts::scan(&filtered);
    let active_alerts = alerts::active(&alerts, &state.annotations.acknowledged);

    DashboardView {
        records_loaded: filtered.len(),
        energy_series: aggregate::by_date(&filtered, MetricKind::Energy),
        water_series: aggregate::by_date(&filtered, MetricKind::Water),
        waste_series: aggregate::by_date(&filtered, MetricKind::Waste),
        emissions_series: aggregate::by_date(&filtered, MetricKind::Emissions),
        overall_series: aggregate::overall_by_date(&filtered),
        goal_progress: goals::progress(&totals),
        options: filter::options(records),
        active_alerts,
        alerts,
        totals,
        filtered,
        auto_refresh: state.auto_refresh,
    }
}
