use crate::errors::AppResult;
use crate::models::MeasurementRecord;
use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use once_cell::sync::Lazy;
use rand::seq::IndexedRandom;
use rand::Rng;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/api/sustainability";
pub const SAMPLE_DATASET_SIZE: usize = 300;

const SAMPLE_DEPARTMENTS: [&str; 4] = ["Spinning", "Weaving", "Dyeing", "Finishing"];
const SAMPLE_UNITS: [&str; 2] = ["Unit A", "Unit B"];
const SAMPLE_MACHINES: [&str; 5] = [
    "Machine 1",
    "Machine 2",
    "Machine 3",
    "Machine 4",
    "Machine 5",
];
const SAMPLE_SHIFTS: [&str; 3] = ["1", "2", "3"];

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self) -> AppResult<Vec<MeasurementRecord>>;
}

/// Fetches the full dataset as a JSON array; any extra fields in the payload
/// are ignored by deserialization.
#[derive(Debug, Clone)]
pub struct HttpDataSource {
    endpoint: String,
}

impl HttpDataSource {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

impl Default for HttpDataSource {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch(&self) -> AppResult<Vec<MeasurementRecord>> {
        let records = HTTP_CLIENT
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<MeasurementRecord>>()
            .await?;
        Ok(records)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Locally generated dataset with a plausible distribution of plant tags and
/// metric ranges; the fallback when the source endpoint is unavailable.
pub fn sample_dataset(count: usize) -> Vec<MeasurementRecord> {
    let mut rng = rand::rng();
    let year_start =
        NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid calendar date");

    (0..count)
        .map(|_| {
            let date = year_start + Duration::days(rng.random_range(0..365));
            MeasurementRecord {
                date: date.format("%Y-%m-%d").to_string(),
                department: pick(&SAMPLE_DEPARTMENTS, &mut rng),
                unit: pick(&SAMPLE_UNITS, &mut rng),
                machine: pick(&SAMPLE_MACHINES, &mut rng),
                shift: pick(&SAMPLE_SHIFTS, &mut rng),
                energy: round1(rng.random_range(50.0..200.0)),
                water: round1(rng.random_range(100.0..500.0)),
                waste: round1(rng.random_range(10.0..100.0)),
                emissions: round1(rng.random_range(20.0..150.0)),
            }
        })
        .collect()
}

fn pick(values: &[&str], rng: &mut impl Rng) -> String {
    values
        .choose(rng)
        .copied()
        .unwrap_or_default()
        .to_string()
}
