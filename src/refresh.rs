use crate::models::{FilterOptions, MeasurementRecord};
use chrono::Utc;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::sync::{Arc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant};

pub const AUTO_REFRESH_INTERVAL: Duration = Duration::from_secs(10);

type TickFn = Arc<dyn Fn() + Send + Sync>;

/// Timed background task that feeds synthetic records into the store while
/// enabled. Two states: stopped (no task) and running (one task); stopping
/// aborts the task so no further tick fires.
pub struct AutoRefreshDriver {
    interval: Duration,
    tick: RwLock<Option<TickFn>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Default for AutoRefreshDriver {
    fn default() -> Self {
        Self::with_interval(AUTO_REFRESH_INTERVAL)
    }
}

impl AutoRefreshDriver {
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            tick: RwLock::new(None),
            handle: Mutex::new(None),
        }
    }

    pub fn set_tick(&self, tick: TickFn) {
        let mut writer = self.tick.write().expect("driver tick write lock");
        *writer = Some(tick);
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }

    /// Spawns the tick loop. The first tick fires one full interval after
    /// start. Returns false (and changes nothing) when already running.
    pub fn start(&self) -> bool {
        let mut slot = match self.handle.lock() {
            Ok(slot) => slot,
            Err(_) => return false,
        };
        if slot.is_some() {
            return false;
        }

        let interval = self.interval;
        let tick = self.tick.read().expect("driver tick read lock").clone();
        *slot = Some(tokio::spawn(async move {
            let mut timer = interval_at(Instant::now() + interval, interval);
            loop {
                timer.tick().await;
                if let Some(tick) = &tick {
                    tick();
                }
            }
        }));
        true
    }

    /// Aborts the tick loop. Returns false when already stopped.
    pub fn stop(&self) -> bool {
        let handle = match self.handle.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        match handle {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for AutoRefreshDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One synthetic record sampled from the current picker options; None when no
/// departments are known yet (nothing loaded).
pub fn synthesize_record(options: &FilterOptions) -> Option<MeasurementRecord> {
    if options.departments.is_empty() {
        return None;
    }

    let mut rng = rand::rng();
    Some(MeasurementRecord {
        date: Utc::now().format("%Y-%m-%d").to_string(),
        department: sample_or(&options.departments, "Unit", &mut rng),
        unit: sample_or(&options.units, "Unit A", &mut rng),
        machine: sample_or(&options.machines, "Machine 1", &mut rng),
        shift: sample_or(&options.shifts, "1", &mut rng),
        energy: rng.random_range(20.0..=170.0_f64).round(),
        water: rng.random_range(50.0..=450.0_f64).round(),
        waste: rng.random_range(5.0..=65.0_f64).round(),
        emissions: rng.random_range(10.0..=130.0_f64).round(),
    })
}

fn sample_or(values: &[String], fallback: &str, rng: &mut impl Rng) -> String {
    values
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}
