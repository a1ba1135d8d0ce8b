//! Input form: load, validate, normalize.
//!
//! The form is a flat JSON object with the Portuguese keys used by the result
//! record (`numero_processo`, `municipio_atual`, `canal_proposto`, ...). Every
//! field is required; coordinates still holding the form placeholder count as
//! missing.

use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{ProcessInfo, PromotionRequest, StationSite};
use crate::error::EngineError;

pub const PLACEHOLDER_LATITUDE: &str = "10° 10' 10\" S";
pub const PLACEHOLDER_LONGITUDE: &str = "10° 10' 10\" W";

/// Words kept lower case when title-casing names.
const LOWER_WORDS: &[&str] = &["de", "em", "do", "da", "dos", "das", "e", "o", "a"];
/// Words kept upper case when title-casing names.
const UPPER_WORDS: &[&str] = &["fm", "am", "ltda", "tv"];

/// A form value; channels in particular arrive as text or as numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl FormValue {
    pub fn text(&self) -> String {
        match self {
            FormValue::Text(s) => s.trim().to_string(),
            FormValue::Integer(v) => v.to_string(),
            FormValue::Float(v) => v.to_string(),
        }
    }
}

/// Raw form as read from disk.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProcessForm {
    pub numero_processo: Option<FormValue>,
    pub servico: Option<FormValue>,
    pub entidade: Option<FormValue>,
    pub finalidade: Option<FormValue>,
    pub consulta_publica: Option<FormValue>,

    pub municipio_atual: Option<FormValue>,
    pub uf_atual: Option<FormValue>,
    pub classe_atual: Option<FormValue>,
    pub canal_atual: Option<FormValue>,
    pub latitude_atual: Option<FormValue>,
    pub longitude_atual: Option<FormValue>,

    pub municipio_proposto: Option<FormValue>,
    pub uf_proposta: Option<FormValue>,
    pub classe_proposta: Option<FormValue>,
    pub canal_proposto: Option<FormValue>,
    pub latitude_proposta: Option<FormValue>,
    pub longitude_proposta: Option<FormValue>,
}

pub fn read_form(path: &Path) -> Result<ProcessForm, EngineError> {
    let file = File::open(path).map_err(|e| EngineError::dataset("input form", path, e))?;
    serde_json::from_reader(file).map_err(|e| EngineError::dataset("input form", path, e))
}

impl ProcessForm {
    fn fields(&self) -> [(&Option<FormValue>, &'static str, Option<&'static str>); 17] {
        [
            (&self.numero_processo, "Número do processo", None),
            (&self.servico, "Serviço", None),
            (&self.entidade, "Entidade", None),
            (&self.finalidade, "Finalidade", None),
            (&self.consulta_publica, "Consulta Pública", None),
            (&self.uf_atual, "UF Atual", None),
            (&self.municipio_atual, "Município Atual", None),
            (&self.classe_atual, "Classe Atual", None),
            (&self.canal_atual, "Canal Atual", None),
            (&self.latitude_atual, "Latitude Atual", Some(PLACEHOLDER_LATITUDE)),
            (&self.longitude_atual, "Longitude Atual", Some(PLACEHOLDER_LONGITUDE)),
            (&self.uf_proposta, "UF Proposta", None),
            (&self.municipio_proposto, "Município Proposto", None),
            (&self.classe_proposta, "Classe Proposta", None),
            (&self.canal_proposto, "Canal Proposto", None),
            (&self.latitude_proposta, "Latitude Proposta", Some(PLACEHOLDER_LATITUDE)),
            (&self.longitude_proposta, "Longitude Proposta", Some(PLACEHOLDER_LONGITUDE)),
        ]
    }

    /// Friendly names of every missing or placeholder field.
    pub fn missing_fields(&self) -> Vec<String> {
        self.fields()
            .into_iter()
            .filter(|(value, _, placeholder)| {
                let text = value.as_ref().map(FormValue::text).unwrap_or_default();
                text.is_empty() || placeholder.is_some_and(|p| text == p)
            })
            .map(|(_, name, _)| name.to_string())
            .collect()
    }

    /// Validate, normalize and build the request.
    pub fn into_request(self) -> Result<PromotionRequest, EngineError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(EngineError::IncompleteForm(missing));
        }

        let text = |v: &Option<FormValue>| v.as_ref().map(FormValue::text).unwrap_or_default();

        let process = ProcessInfo {
            process_number: text(&self.numero_processo),
            service: title_case(&text(&self.servico)),
            entity: title_case(&text(&self.entidade)),
            purpose: title_case(&text(&self.finalidade)),
            public_consultation: text(&self.consulta_publica),
        };
        let current = StationSite {
            municipality: title_case(&text(&self.municipio_atual)),
            state: text(&self.uf_atual).to_uppercase(),
            class: text(&self.classe_atual).to_uppercase(),
            channel: parse_channel("canal_atual", self.canal_atual.as_ref())?,
            latitude: text(&self.latitude_atual),
            longitude: text(&self.longitude_atual),
        };
        let proposed = StationSite {
            municipality: title_case(&text(&self.municipio_proposto)),
            state: text(&self.uf_proposta).to_uppercase(),
            class: text(&self.classe_proposta).to_uppercase(),
            channel: parse_channel("canal_proposto", self.canal_proposto.as_ref())?,
            latitude: text(&self.latitude_proposta),
            longitude: text(&self.longitude_proposta),
        };

        Ok(PromotionRequest {
            process,
            current,
            proposed,
        })
    }
}

fn parse_channel(field: &'static str, value: Option<&FormValue>) -> Result<u32, EngineError> {
    let Some(value) = value else {
        return Err(EngineError::format(field, "", "missing channel"));
    };
    match value {
        FormValue::Integer(v) => u32::try_from(*v).map_err(|_| EngineError::format(field, v.to_string(), "channel out of range")),
        FormValue::Text(s) => s
            .trim()
            .parse::<u32>()
            .map_err(|e| EngineError::format(field, s.trim(), e.to_string())),
        FormValue::Float(v) => Err(EngineError::format(field, v.to_string(), "channel must be an integer")),
    }
}

/// Title-case a name, keeping Portuguese connectors lower case and broadcast
/// acronyms upper case.
pub fn title_case(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| {
            if LOWER_WORDS.iter().any(|w| *w == word) {
                word.to_string()
            } else if UPPER_WORDS.iter().any(|w| *w == word) {
                word.to_uppercase()
            } else {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use serde_json::json;

    use super::*;

    fn complete_form() -> serde_json::Value {
        json!({
            "numero_processo": "53500.012345/2024-11",
            "servico": "radiodifusão sonora em fm",
            "entidade": "RÁDIO CULTURA DE CAMPINAS LTDA",
            "finalidade": "promoção de classe",
            "consulta_publica": "Não",
            "municipio_atual": "campinas",
            "uf_atual": "sp",
            "classe_atual": "b1",
            "canal_atual": "220",
            "latitude_atual": "22°54'25\" S",
            "longitude_atual": "47°03'39\" W",
            "municipio_proposto": "SANTANA DE PARNAÍBA",
            "uf_proposta": "sp",
            "classe_proposta": "a4",
            "canal_proposto": 221,
            "latitude_proposta": "23°26'38\" S",
            "longitude_proposta": "46°55'03\" W"
        })
    }

    fn parse(value: serde_json::Value) -> ProcessForm {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn normalizes_names_codes_and_channels() {
        let request = parse(complete_form()).into_request().unwrap();
        assert_eq!(request.process.service, "Radiodifusão Sonora em FM");
        assert_eq!(request.process.entity, "Rádio Cultura de Campinas LTDA");
        assert_eq!(request.current.state, "SP");
        assert_eq!(request.current.class, "B1");
        assert_eq!(request.current.channel, 220);
        assert_eq!(request.proposed.municipality, "Santana de Parnaíba");
        assert_eq!(request.proposed.class, "A4");
        assert_eq!(request.proposed.channel, 221);
    }

    #[test]
    fn collects_every_missing_or_placeholder_field() {
        let mut value = complete_form();
        value["servico"] = json!("   ");
        value["latitude_proposta"] = json!(PLACEHOLDER_LATITUDE);
        value.as_object_mut().unwrap().remove("canal_atual");

        let err = parse(value).into_request().unwrap_err();
        assert_eq!(
            err,
            EngineError::IncompleteForm(vec![
                "Serviço".to_string(),
                "Canal Atual".to_string(),
                "Latitude Proposta".to_string(),
            ])
        );
    }

    #[test]
    fn non_numeric_channel_is_a_format_error() {
        let mut value = complete_form();
        value["canal_proposto"] = json!("22O");
        let err = parse(value).into_request().unwrap_err();
        assert!(matches!(err, EngineError::Format { field: "canal_proposto", .. }));

        let mut value = complete_form();
        value["canal_atual"] = json!(-3);
        assert!(matches!(
            parse(value).into_request(),
            Err(EngineError::Format { field: "canal_atual", .. })
        ));
    }

    #[test]
    fn reads_form_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", complete_form()).unwrap();
        let form = read_form(file.path()).unwrap();
        assert!(form.missing_fields().is_empty());

        let err = read_form(Path::new("/no/such/form.json")).unwrap_err();
        assert!(matches!(err, EngineError::DatasetLoad { what: "input form", .. }));
    }

    #[test]
    fn title_case_handles_connectors_and_acronyms() {
        assert_eq!(title_case("  são   JOSÉ dos campos "), "São José dos Campos");
        assert_eq!(title_case("tv e rádio am"), "TV e Rádio AM");
        assert_eq!(title_case(""), "");
    }
}
