//! Export the result record and the covered set.
//!
//! The JSON record is what the document renderers consume; the CSV is meant for
//! spreadsheets.

use std::fs::File;
use std::path::Path;

use serde::Serialize;

use crate::domain::CoveredMunicipality;
use crate::error::EngineError;
use crate::report::PromotionReport;

/// Write the result record as pretty-printed JSON.
pub fn write_report_json(path: &Path, report: &PromotionReport) -> Result<(), EngineError> {
    let file = File::create(path).map_err(|e| EngineError::output("result record", path, e))?;
    serde_json::to_writer_pretty(file, report).map_err(|e| EngineError::output("result record", path, e))
}

#[derive(Debug, Serialize)]
struct CoveredRow<'a> {
    uf: &'a str,
    codigo: &'a str,
    municipio: &'a str,
    populacao: u64,
}

/// Write the covered municipalities, one row each, in coverage order.
pub fn write_covered_csv(path: &Path, covered: &[CoveredMunicipality]) -> Result<(), EngineError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| EngineError::output("covered export", path, e))?;

    for m in covered {
        writer
            .serialize(CoveredRow {
                uf: &m.state_name,
                codigo: &m.code,
                municipio: &m.name,
                populacao: m.population,
            })
            .map_err(|e| EngineError::output("covered export", path, e))?;
    }

    writer.flush().map_err(|e| EngineError::output("covered export", path, e))
}
