//! Shared calculation pipeline.
//!
//! form -> request -> contour -> coverage -> valuation -> index correction
//! -> map -> result record
//!
//! The CLI only prints and exports what this returns.

use std::path::{Path, PathBuf};

use crate::coverage::{Coverage, ProtectedContour, protected_contour, resolve_coverage};
use crate::data::{CensusSector, IpcaClient, SectorFile, SectorSource, StateNames};
use crate::domain::{CalcConfig, PromotionRequest};
use crate::error::EngineError;
use crate::geodesy::to_decimal_degrees;
use crate::io::read_form;
use crate::plot::{render_coverage_map, temp_map_path};
use crate::report::{PromotionReport, assemble};
use crate::tables::contour_radius;
use crate::valuation::{ValuationInput, ValuationResult, evaluate};

/// All computed outputs of a single `promocao calc` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub request: PromotionRequest,
    pub contour: ProtectedContour,
    pub coverage: Coverage,
    pub valuation: ValuationResult,
    pub report: PromotionReport,
    /// Temporary coverage map, when it could be written.
    pub map_path: Option<PathBuf>,
}

/// Side effects of a run that callers may want to switch off.
#[derive(Clone, Copy, Default)]
pub struct RunOptions<'a> {
    /// Index correction client; `None` skips the correction.
    pub index: Option<&'a IpcaClient>,
    /// Directory for the coverage map; `None` skips it.
    pub map_dir: Option<&'a Path>,
}

/// Execute the full calculation from the configured files.
pub fn run_calculation(config: &CalcConfig) -> Result<RunOutput, EngineError> {
    // 1) Input form, validated and normalized.
    let request = read_form(&config.input)?.into_request()?;

    // 2) Reference datasets. Either failing aborts before any computation.
    let states = StateNames::load(&config.states_path)?;
    let sectors = SectorFile::new(&config.sectors_path);
    let base = sectors.read_sectors(None)?;

    let client = (!config.skip_index).then(|| IpcaClient::new(&config.ipca_fallback_path, config.offline));
    let map_dir = std::env::temp_dir();

    run_engine(
        request,
        &states,
        &base,
        &sectors,
        RunOptions {
            index: client.as_ref(),
            map_dir: Some(&map_dir),
        },
    )
}

/// Execute the calculation over already-loaded datasets.
///
/// `base` is the full sector load; `source` serves the masked reload.
pub fn run_engine<S>(
    request: PromotionRequest,
    states: &StateNames,
    base: &[CensusSector],
    source: &S,
    options: RunOptions<'_>,
) -> Result<RunOutput, EngineError>
where
    S: SectorSource + ?Sized,
{
    let proposed = &request.proposed;

    // 3) Protected contour around the proposed site.
    let latitude = to_decimal_degrees(&proposed.latitude)?;
    let longitude = to_decimal_degrees(&proposed.longitude)?;
    let radius = contour_radius(&proposed.class, proposed.channel);
    tracing::info!(
        class = %proposed.class,
        channel = proposed.channel,
        km = radius.km,
        source = ?radius.source,
        "protected contour radius"
    );
    let contour = protected_contour(latitude, longitude, radius)?;

    // 4) Covered municipalities.
    let state_name = states.name_of(&proposed.state);
    if state_name.is_none() {
        tracing::warn!(state = %proposed.state, "state abbreviation not in the state-name table");
    }
    let coverage = resolve_coverage(base, source, &contour, &proposed.municipality, state_name)?;

    // 5) Valuation.
    let valuation = evaluate(&ValuationInput {
        current_class: &request.current.class,
        proposed_class: &proposed.class,
        proposed_state: &proposed.state,
        proposed_municipality_code: coverage.proposed_municipality_code.as_deref(),
        covered: &coverage.covered,
        sectors: base,
    })?;

    // 6) Index correction, only for an applicable value. Runs before the map
    // so a failure here leaves no file behind.
    let correction = match (options.index, valuation.vpc.value()) {
        (Some(client), Some(vpc)) => Some(client.correct(vpc)?),
        _ => None,
    };

    // 7) Map artifact, the last fallible step. A failed drawing loses the
    // picture, not the result.
    let map_path = match options.map_dir {
        Some(dir) => draw_map(dir, &request.process.process_number, &coverage),
        None => None,
    };

    let report = assemble(
        &request,
        radius,
        &coverage,
        &valuation,
        map_path.as_deref(),
        correction.as_ref(),
    );

    Ok(RunOutput {
        request,
        contour,
        coverage,
        valuation,
        report,
        map_path,
    })
}

fn draw_map(dir: &Path, process_number: &str, coverage: &Coverage) -> Option<PathBuf> {
    let path = match temp_map_path(dir, process_number) {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!(error = %e, "coverage map not written");
            return None;
        }
    };
    match render_coverage_map(&path, &coverage.geometry) {
        Ok(()) => Some(path),
        Err(e) => {
            tracing::warn!(error = %e, "coverage map not written");
            if let Err(e) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), error = %e, "could not delete partial map");
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::{Value, json};

    use super::*;
    use crate::domain::Applicability;

    fn write_json(dir: &Path, name: &str, value: &Value) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{value}").unwrap();
        path
    }

    fn sector(code: &str, name: &str, state: &str, pop: u64, situacao: &str, (x0, y0, x1, y1): (f64, f64, f64, f64)) -> Value {
        json!({
            "type": "Feature",
            "properties": { "CD_MUN": code, "NM_MUN": name, "NM_UF": state, "v0001": pop, "SITUACAO": situacao },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[[x0, y0], [x1, y0], [x1, y1], [x0, y1], [x0, y0]]]
            }
        })
    }

    fn sectors_geojson() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                sector("3509502", "Campinas", "São Paulo", 1000, "Urbana", (-47.10, -22.95, -47.02, -22.87)),
                sector("3509502", "Campinas", "São Paulo", 200, "Rural", (-47.30, -23.10, -47.10, -22.95)),
                sector("3519071", "Hortolândia", "São Paulo", 300, "Urbana", (-47.25, -22.90, -47.20, -22.85)),
                sector("3552205", "Sorocaba", "São Paulo", 500, "Urbana", (-47.50, -23.55, -47.40, -23.45)),
                sector("3106200", "Belo Horizonte", "Minas Gerais", 900, "Urbana", (-44.00, -20.00, -43.90, -19.90)),
            ]
        })
    }

    fn form(current: &str, proposed: &str) -> Value {
        json!({
            "numero_processo": "53500.000001/2024-01",
            "servico": "radiodifusão sonora em fm",
            "entidade": "rádio teste ltda",
            "finalidade": "promoção de classe",
            "consulta_publica": "Não",
            "municipio_atual": "campinas",
            "uf_atual": "sp",
            "classe_atual": current,
            "canal_atual": "220",
            "latitude_atual": "22°54'25\" S",
            "longitude_atual": "47°03'39\" W",
            "municipio_proposto": "CAMPINAS",
            "uf_proposta": "sp",
            "classe_proposta": proposed,
            "canal_proposto": "220",
            "latitude_proposta": "22°54'25\" S",
            "longitude_proposta": "47°03'39\" W"
        })
    }

    fn config(dir: &Path, form_value: &Value) -> CalcConfig {
        CalcConfig {
            input: write_json(dir, "form.json", form_value),
            sectors_path: write_json(dir, "setores.geojson", &sectors_geojson()),
            states_path: write_json(dir, "uf_code.json", &json!({ "SP": "São Paulo", "MG": "Minas Gerais" })),
            ipca_fallback_path: dir.join("ipca.json"),
            offline: true,
            skip_index: true,
            output: None,
            export_covered: None,
            keep_map: false,
        }
    }

    #[test]
    fn group_promotion_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), &form("b1", "a4"));
        let run = run_calculation(&cfg).unwrap();

        let names: Vec<&str> = run.coverage.covered.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Campinas", "Hortolândia"]);
        assert_eq!(run.coverage.proposed_municipality_code.as_deref(), Some("3509502"));
        assert_eq!(run.coverage.touched_states, ["São Paulo"]);

        assert_eq!(run.valuation.ptot, 1500);
        assert_eq!(run.valuation.pref, 1200);
        assert_eq!(run.valuation.reference_city, "Campinas");
        assert_eq!(run.valuation.tcp, Applicability::Applicable(0));
        let vpc = run.valuation.vpc.value().unwrap();
        assert!((vpc - 312_028.19).abs() < 1e-6, "vpc = {vpc}");

        assert_eq!(run.report.dmax, 24.0);
        assert_eq!(run.report.municipios_afetados[0], "São Paulo/Campinas/1200");
        assert!(run.report.ipca.is_none());

        let map = run.map_path.expect("map written");
        assert!(map.exists());
        std::fs::remove_file(map).unwrap();
    }

    #[test]
    fn demotion_is_not_applicable_and_skips_correction() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), &form("a4", "b1"));
        // Missing fallback file: a correction attempt would fail the run.
        cfg.skip_index = false;

        let request = read_form(&cfg.input).unwrap().into_request().unwrap();
        let states = StateNames::load(&cfg.states_path).unwrap();
        let file = SectorFile::new(&cfg.sectors_path);
        let base = file.read_sectors(None).unwrap();
        let client = IpcaClient::new(&cfg.ipca_fallback_path, true);

        let run = run_engine(
            request,
            &states,
            &base,
            &file,
            RunOptions {
                index: Some(&client),
                map_dir: None,
            },
        )
        .unwrap();

        assert_eq!(run.valuation.vpc, Applicability::NotApplicable);
        assert_eq!(run.report.dmax, 16.5);
        assert!(run.report.ipca.is_none());
        assert!(run.map_path.is_none());
    }

    #[test]
    fn index_correction_uses_bundled_series() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), &form("b1", "a4"));
        cfg.skip_index = false;
        write_json(
            dir.path(),
            "ipca.json",
            &json!([
                { "data": "01/08/2013", "valor": "0.24" },
                { "data": "01/09/2013", "valor": "0.35" }
            ]),
        );

        let request = read_form(&cfg.input).unwrap().into_request().unwrap();
        let states = StateNames::load(&cfg.states_path).unwrap();
        let base = SectorFile::new(&cfg.sectors_path).read_sectors(None).unwrap();
        let client = IpcaClient::new(&cfg.ipca_fallback_path, true);
        let run = run_engine(
            request,
            &states,
            &base,
            base.as_slice(),
            RunOptions {
                index: Some(&client),
                map_dir: None,
            },
        )
        .unwrap();

        let corrected = run.report.ipca.unwrap();
        let expected = (312_028.19_f64 * 1.0024 * 1.0035 * 100.0).round() / 100.0;
        assert!((corrected - expected).abs() < 0.011, "{corrected} vs {expected}");
        assert_eq!(run.report.data_ipca.as_deref(), Some("01/09/2013"));
    }

    #[test]
    fn failed_correction_leaves_no_map_behind() {
        let dir = tempfile::tempdir().unwrap();
        let map_dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), &form("b1", "a4"));

        let request = read_form(&cfg.input).unwrap().into_request().unwrap();
        let states = StateNames::load(&cfg.states_path).unwrap();
        let base = SectorFile::new(&cfg.sectors_path).read_sectors(None).unwrap();
        // Offline with no bundled series: the correction fails.
        let client = IpcaClient::new(dir.path().join("missing_ipca.json"), true);

        let err = run_engine(
            request,
            &states,
            &base,
            base.as_slice(),
            RunOptions {
                index: Some(&client),
                map_dir: Some(map_dir.path()),
            },
        )
        .unwrap_err();

        assert!(matches!(err, EngineError::IndexCorrection(_)));
        let left: Vec<_> = std::fs::read_dir(map_dir.path()).unwrap().collect();
        assert!(left.is_empty(), "map files left behind: {left:?}");
    }

    #[test]
    fn successful_run_hands_back_the_map() {
        let dir = tempfile::tempdir().unwrap();
        let map_dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path(), &form("b1", "a4"));

        let request = read_form(&cfg.input).unwrap().into_request().unwrap();
        let states = StateNames::load(&cfg.states_path).unwrap();
        let base = SectorFile::new(&cfg.sectors_path).read_sectors(None).unwrap();
        let run = run_engine(
            request,
            &states,
            &base,
            base.as_slice(),
            RunOptions {
                index: None,
                map_dir: Some(map_dir.path()),
            },
        )
        .unwrap();

        let map = run.map_path.expect("map written");
        assert!(map.starts_with(map_dir.path()));
        assert!(std::fs::read_to_string(&map).unwrap().contains("<svg"));
        assert_eq!(run.report.caminho_mapa_temp, Some(map.display().to_string()));
    }

    #[test]
    fn incomplete_form_stops_before_loading_datasets() {
        let dir = tempfile::tempdir().unwrap();
        let mut value = form("b1", "a4");
        value["latitude_proposta"] = json!(crate::io::PLACEHOLDER_LATITUDE);
        let mut cfg = config(dir.path(), &value);
        cfg.sectors_path = dir.path().join("missing.geojson");

        let err = run_calculation(&cfg).unwrap_err();
        assert_eq!(err, EngineError::IncompleteForm(vec!["Latitude Proposta".to_string()]));
    }

    #[test]
    fn missing_sector_file_is_a_dataset_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path(), &form("b1", "a4"));
        cfg.sectors_path = dir.path().join("missing.geojson");
        assert!(matches!(run_calculation(&cfg), Err(EngineError::DatasetLoad { .. })));
    }
}
