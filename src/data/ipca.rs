//! IPCA monetary correction from the Banco Central SGS API.
//!
//! The accumulated factor is `Π (1 + v/100)` over the monthly IPCA variations
//! (series 433) published since August 2013. The remote series is tried first;
//! on any failure the bundled copy of the same series is used instead.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

const BASE_URL: &str = "https://api.bcb.gov.br/dados/serie/bcdata.sgs.433/dados";
const START_DATE: &str = "01/08/2013";
const DATE_FORMAT: &str = "%d/%m/%Y";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// One monthly observation as served by SGS.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SgsObservation {
    pub data: String,
    pub valor: SgsValue,
}

/// SGS serves `valor` as text; hand-edited copies sometimes use numbers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SgsValue {
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyIndex {
    pub date: NaiveDate,
    /// Monthly variation in percent.
    pub percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexSource {
    Remote,
    Bundled,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndexCorrection {
    /// Corrected value, rounded to cents.
    pub value: f64,
    pub factor: f64,
    /// Date of the latest observation used.
    pub index_date: NaiveDate,
    pub source: IndexSource,
}

pub struct IpcaClient {
    client: Client,
    fallback_path: PathBuf,
    offline: bool,
}

impl IpcaClient {
    pub fn new(fallback_path: impl Into<PathBuf>, offline: bool) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            fallback_path: fallback_path.into(),
            offline,
        }
    }

    /// Apply the accumulated IPCA factor to `value`.
    pub fn correct(&self, value: f64) -> Result<IndexCorrection, EngineError> {
        let (rows, source) = self.series()?;
        let (factor, index_date) = accumulate(&rows).map_err(EngineError::IndexCorrection)?;
        tracing::info!(?source, factor, %index_date, "applied IPCA correction");
        Ok(IndexCorrection {
            value: round_cents(value * factor),
            factor,
            index_date,
            source,
        })
    }

    /// Observations from the remote source, or the bundled copy on failure.
    pub fn series(&self) -> Result<(Vec<MonthlyIndex>, IndexSource), EngineError> {
        let remote_err = if self.offline {
            "offline mode".to_string()
        } else {
            match self.fetch_remote() {
                Ok(rows) => return Ok((rows, IndexSource::Remote)),
                Err(e) => e,
            }
        };
        tracing::warn!(reason = %remote_err, path = %self.fallback_path.display(), "using bundled IPCA series");

        match load_bundled(&self.fallback_path) {
            Ok(rows) => Ok((rows, IndexSource::Bundled)),
            Err(bundled_err) => Err(EngineError::IndexCorrection(format!(
                "remote: {remote_err}; bundled '{}': {bundled_err}",
                self.fallback_path.display()
            ))),
        }
    }

    /// Raw remote observations (used to refresh the bundled copy).
    pub fn fetch_observations(&self) -> Result<Vec<SgsObservation>, EngineError> {
        let resp = self
            .client
            .get(BASE_URL)
            .query(&[("formato", "json"), ("dataInicial", START_DATE)])
            .send()
            .map_err(|e| EngineError::IndexCorrection(format!("SGS request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EngineError::IndexCorrection(format!("SGS request failed: HTTP {status}")));
        }

        resp.json::<Vec<SgsObservation>>()
            .map_err(|e| EngineError::IndexCorrection(format!("SGS JSON parse failed: {e}")))
    }

    fn fetch_remote(&self) -> Result<Vec<MonthlyIndex>, String> {
        let obs = self.fetch_observations().map_err(|e| e.to_string())?;
        parse_observations(&obs)
    }
}

/// Write observations in the bundled-file format.
pub fn write_bundled(path: &Path, observations: &[SgsObservation]) -> Result<(), EngineError> {
    let text = serde_json::to_string_pretty(observations)
        .map_err(|e| EngineError::IndexCorrection(format!("serialize IPCA series: {e}")))?;
    fs::write(path, text).map_err(|e| EngineError::output("IPCA series", path, e))
}

fn load_bundled(path: &Path) -> Result<Vec<MonthlyIndex>, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let obs: Vec<SgsObservation> = serde_json::from_str(&text).map_err(|e| e.to_string())?;
    parse_observations(&obs)
}

pub fn parse_observations(obs: &[SgsObservation]) -> Result<Vec<MonthlyIndex>, String> {
    obs.iter()
        .map(|o| {
            let date = NaiveDate::parse_from_str(o.data.trim(), DATE_FORMAT)
                .map_err(|e| format!("bad date '{}': {e}", o.data))?;
            let percent = match &o.valor {
                SgsValue::Number(v) => *v,
                SgsValue::Text(s) => s
                    .trim()
                    .replace(',', ".")
                    .parse::<f64>()
                    .map_err(|e| format!("bad value '{s}' for {}: {e}", o.data))?,
            };
            if !percent.is_finite() {
                return Err(format!("non-finite value for {}", o.data));
            }
            Ok(MonthlyIndex { date, percent })
        })
        .collect()
}

/// Accumulated factor over observations from the start month on, and the
/// latest date used.
pub fn accumulate(rows: &[MonthlyIndex]) -> Result<(f64, NaiveDate), String> {
    let start = NaiveDate::parse_from_str(START_DATE, DATE_FORMAT).map_err(|e| e.to_string())?;
    let mut factor = 1.0;
    let mut last: Option<NaiveDate> = None;
    for row in rows.iter().filter(|r| r.date >= start) {
        factor *= 1.0 + row.percent / 100.0;
        last = Some(last.map_or(row.date, |d| d.max(row.date)));
    }
    let last = last.ok_or_else(|| "no IPCA observations since 08/2013".to_string())?;
    Ok((factor, last))
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
