//! Coverage resolver: which municipalities have urban area inside the contour.
//!
//! The loaded base dataset is never modified. Every narrowing step works on
//! index lists into the base (or on the masked reload), and per-municipality
//! aggregates live in a separately built table.

use std::collections::{BTreeMap, HashSet};

use geo::{MultiPolygon, Point, Polygon};

use crate::coverage::ProtectedContour;
use crate::data::{CensusSector, SectorMask, SectorSource};
use crate::domain::CoveredMunicipality;
use crate::error::EngineError;

/// One municipality after dissolving its sectors.
#[derive(Debug, Clone, PartialEq)]
pub struct MunicipalityTotals {
    pub code: String,
    /// First name encountered for the code.
    pub name: String,
    pub state_name: String,
    pub population: u64,
    pub geometry: MultiPolygon<f64>,
}

/// Geometry handed to the map renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageGeometry {
    pub contour: Polygon<f64>,
    pub station: Point<f64>,
    /// Sectors whose boundary touches the contour.
    pub touched_sectors: Vec<MultiPolygon<f64>>,
    /// Dissolved outlines of the covered municipalities.
    pub covered_municipalities: Vec<MultiPolygon<f64>>,
    /// Urban sectors reached by the contour.
    pub reached_urban_sectors: Vec<MultiPolygon<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    /// Covered set, in order of first appearance in the dataset.
    pub covered: Vec<CoveredMunicipality>,
    /// Code of the proposed municipality, `None` when it is not in the dataset.
    pub proposed_municipality_code: Option<String>,
    /// Distinct municipality codes whose boundary touches the contour.
    pub touched_codes: Vec<String>,
    /// State names kept in the working set.
    pub touched_states: Vec<String>,
    pub geometry: CoverageGeometry,
}

/// Resolve the covered set for a contour.
///
/// `base` is the full dataset load; `source` serves the masked reload.
/// `municipality` and `state_name` identify the proposed municipality; a failed
/// match is logged and reported as `proposed_municipality_code = None`.
pub fn resolve_coverage<S>(
    base: &[CensusSector],
    source: &S,
    contour: &ProtectedContour,
    municipality: &str,
    state_name: Option<&str>,
) -> Result<Coverage, EngineError>
where
    S: SectorSource + ?Sized,
{
    // Sectors whose boundary touches the contour.
    let touched: Vec<usize> = base
        .iter()
        .enumerate()
        .filter(|(_, s)| s.intersects_polygon(&contour.polygon, &contour.bbox))
        .map(|(i, _)| i)
        .collect();

    let touched_states = distinct(touched.iter().map(|&i| base[i].state_name.as_str()));
    let touched_codes = distinct(touched.iter().map(|&i| base[i].municipality_code.as_str()));
    tracing::debug!(
        touched_sectors = touched.len(),
        municipalities = touched_codes.len(),
        states = ?touched_states,
        "contour intersects dataset"
    );

    // Working set: every sector of a touched state.
    let working: Vec<&CensusSector> = base
        .iter()
        .filter(|s| touched_states.iter().any(|st| *st == s.state_name))
        .collect();

    let proposed_municipality_code = match_municipality(&working, municipality, state_name);
    if proposed_municipality_code.is_none() {
        let err = EngineError::MunicipalityNotFound {
            municipality: municipality.to_string(),
            state: state_name.unwrap_or("?").to_string(),
        };
        tracing::warn!(error = %err, "reference lookup falls back to the not-found sentinel");
    }

    let municipalities = dissolve(working.iter().copied());

    // Reload masked to the touched sectors and keep urban ones.
    let mask_polygons: Vec<Polygon<f64>> = touched
        .iter()
        .flat_map(|&i| base[i].geometry.0.iter().cloned())
        .collect();
    let urban: Vec<CensusSector> = match SectorMask::new(MultiPolygon(mask_polygons)) {
        Some(mask) => source
            .read_sectors(Some(&mask))?
            .into_iter()
            .filter(|s| s.urban)
            .collect(),
        None => Vec::new(),
    };

    let reached: Vec<&CensusSector> = urban
        .iter()
        .filter(|s| s.intersects_polygon(&contour.polygon, &contour.bbox))
        .collect();
    let covered_codes = distinct(reached.iter().map(|s| s.municipality_code.as_str()));

    let mut covered = Vec::with_capacity(covered_codes.len());
    let mut covered_geometry = Vec::with_capacity(covered_codes.len());
    for code in &covered_codes {
        match municipalities.get(code) {
            Some(m) => {
                covered.push(CoveredMunicipality {
                    code: m.code.clone(),
                    state_name: m.state_name.clone(),
                    name: m.name.clone(),
                    population: m.population,
                });
                covered_geometry.push(m.geometry.clone());
            }
            None => tracing::warn!(code = %code, "urban sector outside the working set; skipped"),
        }
    }
    tracing::info!(covered = covered.len(), "resolved covered municipalities");

    Ok(Coverage {
        covered,
        proposed_municipality_code,
        touched_codes,
        touched_states,
        geometry: CoverageGeometry {
            contour: contour.polygon.clone(),
            station: contour.station,
            touched_sectors: touched.iter().map(|&i| base[i].geometry.clone()).collect(),
            covered_municipalities: covered_geometry,
            reached_urban_sectors: reached.iter().map(|s| s.geometry.clone()).collect(),
        },
    })
}

/// Merge sectors into per-municipality totals keyed by code.
pub fn dissolve<'a>(sectors: impl IntoIterator<Item = &'a CensusSector>) -> BTreeMap<String, MunicipalityTotals> {
    let mut out: BTreeMap<String, MunicipalityTotals> = BTreeMap::new();
    for s in sectors {
        let entry = out
            .entry(s.municipality_code.clone())
            .or_insert_with(|| MunicipalityTotals {
                code: s.municipality_code.clone(),
                name: s.municipality_name.clone(),
                state_name: s.state_name.clone(),
                population: 0,
                geometry: MultiPolygon(Vec::new()),
            });
        entry.population += s.population;
        entry.geometry.0.extend(s.geometry.0.iter().cloned());
    }
    out
}

/// Code of the first sector matching the municipality/state names.
///
/// Names are compared case-insensitively after trimming.
fn match_municipality(sectors: &[&CensusSector], municipality: &str, state_name: Option<&str>) -> Option<String> {
    let state_name = state_name?;
    let municipality = municipality.trim().to_lowercase();
    let state_name = state_name.trim().to_lowercase();
    sectors
        .iter()
        .find(|s| s.municipality_name.to_lowercase() == municipality && s.state_name.to_lowercase() == state_name)
        .map(|s| s.municipality_code.clone())
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}
