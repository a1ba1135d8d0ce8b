//! Result assembly: one flat record for the document renderers.

use std::path::Path;

use serde::Serialize;

use crate::coverage::Coverage;
use crate::data::IndexCorrection;
use crate::domain::{Applicability, CoveredMunicipality, Group, PromotionPeriod, PromotionRequest};
use crate::tables::ContourRadius;
use crate::valuation::ValuationResult;

pub mod format;

pub use format::*;

const INDEX_DATE_FORMAT: &str = "%d/%m/%Y";

/// The assembled calculation result, keyed the way the renderers expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromotionReport {
    pub numero_processo: String,
    pub servico: String,
    pub entidade: String,
    pub finalidade: String,
    pub consulta_publica: String,

    pub municipio_atual: String,
    pub uf_atual: String,
    pub classe_atual: String,
    pub canal_atual: u32,
    pub latitude_atual: String,
    pub longitude_atual: String,

    pub municipio_proposto: String,
    pub uf_proposta: String,
    pub classe_proposta: String,
    pub canal_proposto: u32,
    pub latitude_proposta: String,
    pub longitude_proposta: String,

    pub grupo_atual: Group,
    pub grupo_proposto: Group,
    /// `"<state>/<municipality>/<population>"` per covered municipality.
    pub municipios_afetados: Vec<String>,
    pub tcp: PromotionPeriod,
    /// Protected-contour radius in km.
    pub dmax: f64,
    pub municipio_referencia: String,
    pub pref: u64,
    pub valor_ab: f64,
    pub valor_bc: f64,
    pub ptot: u64,
    pub vpc: Applicability<f64>,
    pub caminho_mapa_temp: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipca: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_ipca: Option<String>,

    /// Structured covered set, for exports.
    #[serde(skip)]
    pub covered: Vec<CoveredMunicipality>,
}

/// Merge request, coverage and valuation into the result record.
pub fn assemble(
    request: &PromotionRequest,
    radius: ContourRadius,
    coverage: &Coverage,
    valuation: &ValuationResult,
    map_path: Option<&Path>,
    correction: Option<&IndexCorrection>,
) -> PromotionReport {
    let process = &request.process;
    let current = &request.current;
    let proposed = &request.proposed;

    PromotionReport {
        numero_processo: process.process_number.clone(),
        servico: process.service.clone(),
        entidade: process.entity.clone(),
        finalidade: process.purpose.clone(),
        consulta_publica: process.public_consultation.clone(),

        municipio_atual: current.municipality.clone(),
        uf_atual: current.state.clone(),
        classe_atual: current.class.clone(),
        canal_atual: current.channel,
        latitude_atual: current.latitude.clone(),
        longitude_atual: current.longitude.clone(),

        municipio_proposto: proposed.municipality.clone(),
        uf_proposta: proposed.state.clone(),
        classe_proposta: proposed.class.clone(),
        canal_proposto: proposed.channel,
        latitude_proposta: proposed.latitude.clone(),
        longitude_proposta: proposed.longitude.clone(),

        grupo_atual: valuation.current_group,
        grupo_proposto: valuation.proposed_group,
        municipios_afetados: coverage.covered.iter().map(ToString::to_string).collect(),
        tcp: valuation.tcp,
        dmax: radius.km,
        municipio_referencia: valuation.reference_city.clone(),
        pref: valuation.pref,
        valor_ab: valuation.vab,
        valor_bc: valuation.vbc,
        ptot: valuation.ptot,
        vpc: valuation.vpc,
        caminho_mapa_temp: map_path.map(|p| p.display().to_string()),

        ipca: correction.map(|c| c.value),
        data_ipca: correction.map(|c| c.index_date.format(INDEX_DATE_FORMAT).to_string()),

        covered: coverage.covered.clone(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use geo::{LineString, Point, Polygon};

    use super::*;
    use crate::coverage::CoverageGeometry;
    use crate::data::IndexSource;
    use crate::domain::{ChangeKind, ClassChange, PaymentRequirement, ProcessInfo, StationSite};
    use crate::tables::RadiusSource;

    fn site(class: &str, channel: u32) -> StationSite {
        StationSite {
            municipality: "Campinas".into(),
            state: "SP".into(),
            class: class.into(),
            channel,
            latitude: "22°54'25\" S".into(),
            longitude: "47°03'39\" W".into(),
        }
    }

    pub(crate) fn sample_inputs(vpc: Applicability<f64>) -> (PromotionRequest, Coverage, ValuationResult) {
        let request = PromotionRequest {
            process: ProcessInfo {
                process_number: "53500.000001/2024-01".into(),
                service: "Radiodifusão Sonora em FM".into(),
                entity: "Rádio Teste LTDA".into(),
                purpose: "Promoção de Classe".into(),
                public_consultation: "Não".into(),
            },
            current: site("B1", 220),
            proposed: site("A4", 221),
        };
        let coverage = Coverage {
            covered: vec![CoveredMunicipality {
                code: "3509502".into(),
                state_name: "São Paulo".into(),
                name: "Campinas".into(),
                population: 1_139_047,
            }],
            proposed_municipality_code: Some("3509502".into()),
            touched_codes: vec!["3509502".into()],
            touched_states: vec!["São Paulo".into()],
            geometry: CoverageGeometry {
                contour: Polygon::new(LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)]), vec![]),
                station: Point::new(0.2, 0.2),
                touched_sectors: vec![],
                covered_municipalities: vec![],
                reached_urban_sectors: vec![],
            },
        };
        let valuation = ValuationResult {
            current_group: Group::A,
            proposed_group: Group::B,
            class_change: ClassChange::Promoted,
            tcp: Applicability::Applicable(0),
            change_kind: ChangeKind::Gradual,
            payment: PaymentRequirement::Required,
            reference_city: "Campinas".into(),
            reference_code: Some("3509502".into()),
            pref: 1_139_047,
            vab: 249_622.55,
            vbc: 0.0,
            ptot: 1_139_047,
            vpc,
        };
        (request, coverage, valuation)
    }

    #[test]
    fn serializes_with_renderer_keys() {
        let (request, coverage, valuation) = sample_inputs(Applicability::Applicable(249_622.55));
        let radius = ContourRadius {
            km: 24.0,
            source: RadiusSource::Flat,
        };
        let correction = IndexCorrection {
            value: 420_000.10,
            factor: 1.6825,
            index_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            source: IndexSource::Bundled,
        };
        let report = assemble(
            &request,
            radius,
            &coverage,
            &valuation,
            Some(Path::new("/tmp/img_53500_000001-2024-01.svg")),
            Some(&correction),
        );
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["numero_processo"], "53500.000001/2024-01");
        assert_eq!(json["classe_proposta"], "A4");
        assert_eq!(json["canal_proposto"], 221);
        assert_eq!(json["grupo_atual"], "A");
        assert_eq!(json["grupo_proposto"], "B");
        assert_eq!(json["municipios_afetados"][0], "São Paulo/Campinas/1139047");
        assert_eq!(json["tcp"], 0);
        assert_eq!(json["dmax"], 24.0);
        assert_eq!(json["municipio_referencia"], "Campinas");
        assert_eq!(json["vpc"], 249_622.55);
        assert_eq!(json["data_ipca"], "01/09/2025");
        assert_eq!(json["caminho_mapa_temp"], "/tmp/img_53500_000001-2024-01.svg");
        assert!(json.get("covered").is_none());
    }

    #[test]
    fn not_applicable_values_use_the_sentinel_text() {
        let (mut request, coverage, mut valuation) = sample_inputs(Applicability::NotApplicable);
        request.proposed.class = "B1".into();
        valuation.tcp = Applicability::NotApplicable;
        let radius = ContourRadius {
            km: 16.5,
            source: RadiusSource::Flat,
        };
        let report = assemble(&request, radius, &coverage, &valuation, None, None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["tcp"], "não se aplica");
        assert_eq!(json["vpc"], "não se aplica");
        assert!(json.get("ipca").is_none());
        assert!(json["caminho_mapa_temp"].is_null());
    }
}
