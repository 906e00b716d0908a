//! FRED API integration for daily Treasury constant-maturity yields.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain::{SeriesName, WideSeriesTable};
use crate::error::AppError;

const BASE_URL: &str = "https://api.stlouisfed.org/fred/series/observations";
const OBS_LIMIT: usize = 100000;

pub struct FredClient {
    client: Client,
    api_key: String,
}

impl FredClient {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("FRED_API_KEY")
            .map_err(|_| AppError::new(2, "Missing FRED_API_KEY in environment (.env)."))?;
        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }

    /// Fetch every series and join them on date.
    pub fn fetch_table(
        &self,
        series: &[SeriesName],
        observation_start: NaiveDate,
    ) -> Result<WideSeriesTable, AppError> {
        let mut fetched = Vec::with_capacity(series.len());
        for &name in series {
            let obs = self.fetch_series(name, observation_start)?;
            if obs.is_empty() {
                return Err(AppError::new(
                    4,
                    format!("No observations returned for series {}.", name.fred_id()),
                ));
            }
            log::info!("fetched {} observations for {}", obs.len(), name.fred_id());
            fetched.push((name, obs));
        }

        let table = WideSeriesTable::from_series(fetched);
        log::info!(
            "joined table: {} dates, latest {:?}",
            table.len(),
            table.latest_date()
        );
        Ok(table)
    }

    /// Fetch one series as `(date, percent)` pairs, skipping missing markers.
    pub fn fetch_series(
        &self,
        series: SeriesName,
        observation_start: NaiveDate,
    ) -> Result<Vec<(NaiveDate, f64)>, AppError> {
        let resp = self
            .client
            .get(BASE_URL)
            .query(&[
                ("series_id", series.fred_id()),
                ("api_key", &self.api_key),
                ("file_type", "json"),
                ("sort_order", "asc"),
                ("observation_start", &observation_start.to_string()),
                ("limit", &OBS_LIMIT.to_string()),
            ])
            .send()
            .map_err(|e| AppError::new(4, format!("FRED request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::new(
                4,
                format!("FRED request failed with status {}.", resp.status()),
            ));
        }

        let body: ObservationsResponse = resp
            .json()
            .map_err(|e| AppError::new(4, format!("Failed to parse FRED response: {e}")))?;

        parse_observations(body)
    }
}

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

fn parse_observations(body: ObservationsResponse) -> Result<Vec<(NaiveDate, f64)>, AppError> {
    let mut out = Vec::with_capacity(body.observations.len());
    for obs in body.observations {
        let Some(value) = parse_value(&obs.value) else {
            continue;
        };
        let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d")
            .map_err(|e| AppError::new(4, format!("Invalid FRED date '{}': {e}", obs.date)))?;
        out.push((date, value));
    }
    Ok(out)
}

/// FRED marks holidays and gaps with `"."`.
pub(crate) fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "." || trimmed.is_empty() {
        return None;
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
