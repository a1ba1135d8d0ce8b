//! Census-sector dataset loading.
//!
//! The dataset is a GeoJSON `FeatureCollection` with one (multi)polygon per census
//! sector and the IBGE attribute columns:
//!
//! | property   | meaning                         |
//! |------------|---------------------------------|
//! | `CD_MUN`   | municipality code               |
//! | `NM_MUN`   | municipality name               |
//! | `NM_UF`    | state name                      |
//! | `v0001`    | resident population             |
//! | `SITUACAO` | `Urbana` / `Rural`              |
//!
//! Loading is strict about the file (unreadable or non-GeoJSON input is a
//! `DatasetLoad` error) and lenient about rows: a feature with missing attributes
//! or degenerate geometry is skipped and counted.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use geo::{BoundingRect, Coord, Intersects, LineString, MultiPolygon, Polygon, Rect};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::EngineError;

const URBAN_LABEL: &str = "urbana";

/// One census sector, read-only once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct CensusSector {
    pub municipality_code: String,
    pub municipality_name: String,
    pub state_name: String,
    pub population: u64,
    pub urban: bool,
    pub geometry: MultiPolygon<f64>,
    pub bbox: Rect<f64>,
}

impl CensusSector {
    /// Build a sector; returns `None` for empty geometry.
    pub fn new(
        municipality_code: impl Into<String>,
        municipality_name: impl Into<String>,
        state_name: impl Into<String>,
        population: u64,
        urban: bool,
        geometry: MultiPolygon<f64>,
    ) -> Option<Self> {
        let bbox = geometry.bounding_rect()?;
        Some(Self {
            municipality_code: municipality_code.into(),
            municipality_name: municipality_name.into(),
            state_name: state_name.into(),
            population,
            urban,
            geometry,
            bbox,
        })
    }

    /// Bounding-box test first, exact intersection second.
    pub fn intersects_polygon(&self, polygon: &Polygon<f64>, polygon_bbox: &Rect<f64>) -> bool {
        self.bbox.intersects(polygon_bbox) && self.geometry.intersects(polygon)
    }

    pub fn intersects_mask(&self, mask: &SectorMask) -> bool {
        self.bbox.intersects(&mask.bbox)
            && mask
                .geometry
                .0
                .iter()
                .any(|poly| self.geometry.intersects(poly))
    }
}

/// Spatial mask applied while (re)loading sectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SectorMask {
    pub geometry: MultiPolygon<f64>,
    pub bbox: Rect<f64>,
}

impl SectorMask {
    pub fn new(geometry: MultiPolygon<f64>) -> Option<Self> {
        let bbox = geometry.bounding_rect()?;
        Some(Self { geometry, bbox })
    }
}

/// Anything that can produce census sectors, optionally restricted to a mask.
pub trait SectorSource {
    fn read_sectors(&self, mask: Option<&SectorMask>) -> Result<Vec<CensusSector>, EngineError>;
}

/// In-memory datasets (tests, or callers that keep a private copy loaded).
impl SectorSource for [CensusSector] {
    fn read_sectors(&self, mask: Option<&SectorMask>) -> Result<Vec<CensusSector>, EngineError> {
        Ok(self
            .iter()
            .filter(|s| mask.is_none_or(|m| s.intersects_mask(m)))
            .cloned()
            .collect())
    }
}

/// A feature skipped during load.
#[derive(Debug, Clone)]
pub struct FeatureError {
    pub index: usize,
    pub message: String,
}

/// GeoJSON file on disk; every read parses the file again.
#[derive(Debug, Clone)]
pub struct SectorFile {
    path: PathBuf,
}

impl SectorFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parse the file, returning kept sectors and skipped features.
    pub fn load(&self, mask: Option<&SectorMask>) -> Result<(Vec<CensusSector>, Vec<FeatureError>), EngineError> {
        let file = File::open(&self.path).map_err(|e| EngineError::dataset("census sectors", &self.path, e))?;
        let collection: FeatureCollection = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| EngineError::dataset("census sectors", &self.path, e))?;

        let mut sectors = Vec::new();
        let mut errors = Vec::new();
        for (index, feature) in collection.features.into_iter().enumerate() {
            match parse_feature(feature) {
                Ok(sector) => {
                    if mask.is_none_or(|m| sector.intersects_mask(m)) {
                        sectors.push(sector);
                    }
                }
                Err(message) => errors.push(FeatureError { index, message }),
            }
        }
        Ok((sectors, errors))
    }
}

impl SectorSource for SectorFile {
    fn read_sectors(&self, mask: Option<&SectorMask>) -> Result<Vec<CensusSector>, EngineError> {
        let (sectors, errors) = self.load(mask)?;
        if let Some(first) = errors.first() {
            tracing::warn!(
                path = %self.path.display(),
                skipped = errors.len(),
                first_index = first.index,
                first_error = %first.message,
                "skipped malformed census-sector features"
            );
        }
        tracing::debug!(
            path = %self.path.display(),
            masked = mask.is_some(),
            sectors = sectors.len(),
            "loaded census sectors"
        );
        Ok(sectors)
    }
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    geometry: Option<GeometryJson>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum GeometryJson {
    Polygon {
        coordinates: Vec<Vec<Vec<f64>>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Vec<f64>>>>,
    },
    #[serde(other)]
    Unsupported,
}

fn parse_feature(feature: Feature) -> Result<CensusSector, String> {
    let props = feature.properties.unwrap_or_default();

    let code = text_property(&props, "CD_MUN").ok_or("missing `CD_MUN`")?;
    let name = text_property(&props, "NM_MUN").ok_or("missing `NM_MUN`")?;
    let state = text_property(&props, "NM_UF").ok_or("missing `NM_UF`")?;
    let population = population_property(&props, "v0001")?;
    let urban = text_property(&props, "SITUACAO").is_some_and(|s| s.to_lowercase() == URBAN_LABEL);

    let geometry = match feature.geometry {
        Some(GeometryJson::Polygon { coordinates }) => MultiPolygon(vec![to_polygon(coordinates)?]),
        Some(GeometryJson::MultiPolygon { coordinates }) => MultiPolygon(
            coordinates
                .into_iter()
                .map(to_polygon)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Some(GeometryJson::Unsupported) => return Err("geometry is not a (multi)polygon".to_string()),
        None => return Err("missing geometry".to_string()),
    };

    CensusSector::new(code, name, state, population, urban, geometry).ok_or_else(|| "empty geometry".to_string())
}

fn to_polygon(rings: Vec<Vec<Vec<f64>>>) -> Result<Polygon<f64>, String> {
    let mut rings = rings.into_iter().map(to_ring);
    let exterior = rings.next().ok_or("polygon without rings")??;
    let interiors = rings.collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn to_ring(positions: Vec<Vec<f64>>) -> Result<LineString<f64>, String> {
    if positions.len() < 3 {
        return Err(format!("ring with {} positions", positions.len()));
    }
    positions
        .into_iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
            _ => Err("invalid position".to_string()),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::from)
}

/// Property lookup tolerant of column-name case (`cd_mun` vs `CD_MUN`).
fn property<'a>(props: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    props
        .get(key)
        .or_else(|| props.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v))
}

fn text_property(props: &Map<String, Value>, key: &str) -> Option<String> {
    match property(props, key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn population_property(props: &Map<String, Value>, key: &str) -> Result<u64, String> {
    let value = match property(props, key) {
        None | Some(Value::Null) => return Ok(0),
        Some(v) => v,
    };
    let parsed = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(non_negative_count)),
        Value::String(s) if s.trim().is_empty() => Some(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(non_negative_count))
        }
        _ => None,
    };
    parsed.ok_or_else(|| format!("invalid `{key}` value {value}"))
}

fn non_negative_count(v: f64) -> Option<u64> {
    (v.is_finite() && v >= 0.0).then(|| v.round() as u64)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use geo::{LineString, MultiPolygon, Polygon};

    use super::CensusSector;

    /// Axis-aligned square sector in lon/lat degrees.
    pub fn square_sector(
        code: &str,
        name: &str,
        state: &str,
        population: u64,
        urban: bool,
        (x0, y0, x1, y1): (f64, f64, f64, f64),
    ) -> CensusSector {
        let ring = LineString::from(vec![(x0, y0), (x1, y0), (x1, y1), (x0, y1), (x0, y0)]);
        CensusSector::new(
            code,
            name,
            state,
            population,
            urban,
            MultiPolygon(vec![Polygon::new(ring, vec![])]),
        )
        .expect("non-empty square")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::fixtures::square_sector;
    use super::*;

    fn write_geojson(value: &Value) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{value}").unwrap();
        file
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Value {
        json!([[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]])
    }

    #[test]
    fn loads_features_and_skips_bad_rows() {
        let file = write_geojson(&json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "CD_MUN": "3509502", "NM_MUN": "Campinas", "NM_UF": "São Paulo",
                                    "v0001": 1200, "SITUACAO": "Urbana" },
                    "geometry": { "type": "Polygon", "coordinates": square(0.0, 0.0, 1.0, 1.0) }
                },
                {
                    "type": "Feature",
                    "properties": { "cd_mun": 3509502, "nm_mun": "Campinas", "nm_uf": "São Paulo",
                                    "V0001": "35", "situacao": "Rural" },
                    "geometry": { "type": "MultiPolygon", "coordinates": [square(1.0, 0.0, 2.0, 1.0)] }
                },
                {
                    "type": "Feature",
                    "properties": { "NM_MUN": "Sem código", "NM_UF": "São Paulo" },
                    "geometry": { "type": "Polygon", "coordinates": square(0.0, 0.0, 1.0, 1.0) }
                },
                {
                    "type": "Feature",
                    "properties": { "CD_MUN": "1", "NM_MUN": "Ponto", "NM_UF": "X" },
                    "geometry": { "type": "Point", "coordinates": [0.0, 0.0] }
                }
            ]
        }));

        let (sectors, errors) = SectorFile::new(file.path()).load(None).unwrap();
        assert_eq!(sectors.len(), 2);
        assert_eq!(errors.len(), 2);
        assert!(sectors[0].urban);
        assert!(!sectors[1].urban);
        assert_eq!(sectors[1].municipality_code, "3509502");
        assert_eq!(sectors[1].population, 35);
        assert_eq!(errors[0].index, 2);
    }

    #[test]
    fn mask_keeps_only_intersecting_sectors() {
        let sectors = vec![
            square_sector("1", "A", "S", 10, true, (0.0, 0.0, 1.0, 1.0)),
            square_sector("2", "B", "S", 10, true, (5.0, 5.0, 6.0, 6.0)),
        ];
        let mask_poly = square_sector("m", "m", "m", 0, false, (0.5, 0.5, 2.0, 2.0)).geometry;
        let mask = SectorMask::new(mask_poly).unwrap();
        let kept = sectors.as_slice().read_sectors(Some(&mask)).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].municipality_code, "1");
    }

    #[test]
    fn missing_file_is_a_dataset_error() {
        let err = SectorFile::new("/definitely/not/here.geojson").read_sectors(None).unwrap_err();
        assert!(matches!(err, EngineError::DatasetLoad { .. }));
    }

    #[test]
    fn corrupt_file_is_a_dataset_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = SectorFile::new(file.path()).read_sectors(None).unwrap_err();
        assert!(matches!(err, EngineError::DatasetLoad { .. }));
    }
}
