//! Per-state reference municipalities and transition values (R$).
//!
//! Each state has one reference city per charged group (B and C). São Paulo is
//! the only state with a metropolitan exception: stations in one of the listed
//! metropolitan municipalities are valued against the metropolitan region
//! instead of Campinas.

use crate::domain::Group;

/// Sentinel name used when no reference city applies.
pub const REFERENCE_NOT_FOUND: &str = "Referência não encontrada";

/// A resolved reference for one group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceCity {
    /// IBGE municipality code, or `None` for the metropolitan region entry.
    pub code: Option<&'static str>,
    pub name: &'static str,
    /// Transition value for the group (R$).
    pub value: f64,
    /// Municipality codes whose population makes up `Pref`.
    pub population_codes: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReferenceLookup {
    Found(ReferenceCity),
    NotFound,
}

impl ReferenceLookup {
    pub fn city(&self) -> Option<&ReferenceCity> {
        match self {
            ReferenceLookup::Found(city) => Some(city),
            ReferenceLookup::NotFound => None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.city().map_or(REFERENCE_NOT_FOUND, |c| c.name)
    }
}

struct StateReference {
    state: &'static str,
    code: &'static str,
    name: &'static str,
    value_b: f64,
    value_c: f64,
}

const fn entry(state: &'static str, code: &'static str, name: &'static str, value_b: f64, value_c: f64) -> StateReference {
    StateReference {
        state,
        code,
        name,
        value_b,
        value_c,
    }
}

const STATE_REFERENCES: &[StateReference] = &[
    entry("AC", "1200401", "Rio Branco", 32_586.82, 77_202.31),
    entry("AL", "2704302", "Maceió", 144_040.28, 337_505.73),
    entry("AM", "1302603", "Manaus", 78_099.69, 183_187.51),
    entry("AP", "1600303", "Macapá", 60_014.83, 111_663.65),
    entry("BA", "2927408", "Salvador", 169_291.50, 397_584.59),
    entry("CE", "2304400", "Fortaleza", 166_419.21, 391_262.94),
    entry("DF", "5300108", "Brasília", 307_127.24, 720_385.32),
    entry("ES", "3205200", "Vila Velha", 69_587.43, 79_940.86),
    entry("GO", "5208707", "Goiânia", 235_323.01, 551_639.11),
    entry("MA", "2111300", "São Luís", 144_005.30, 338_625.89),
    entry("MG", "3106200", "Belo Horizonte", 53_718.66, 125_672.29),
    entry("MS", "5002704", "Campo Grande", 215_788.29, 505_001.04),
    entry("MT", "5103403", "Cuiabá", 164_843.20, 387_763.39),
    entry("PA", "1501402", "Belém", 85_097.28, 199_600.76),
    entry("PB", "2507507", "João Pessoa", 144_582.39, 338_855.67),
    entry("PE", "2611606", "Recife", 157_833.60, 369_776.49),
    entry("PI", "2211001", "Teresina", 144_681.50, 339_511.65),
    entry("PR", "4106902", "Curitiba", 469_494.06, 1_098_420.32),
    entry("RJ", "3304557", "Rio de Janeiro", 701_663.27, 1_629_200.59),
    entry("RN", "2408102", "Natal", 145_172.62, 340_511.07),
    entry("RO", "1100205", "Porto Velho", 45_590.69, 105_637.44),
    entry("RR", "1400100", "Boa Vista", 27_459.32, 64_624.06),
    entry("RS", "4314902", "Porto Alegre", 425_475.87, 995_714.32),
    entry("SC", "4209102", "Joinville", 363_499.72, 852_817.55),
    entry("SE", "2800308", "Aracajú", 141_640.89, 332_431.61),
    entry("SP", "3509502", "Campinas", 249_622.55, 585_504.63),
    entry("TO", "1721000", "Palmas", 15_473.83, 36_039.46),
];

const METRO_STATE: &str = "SP";
const METRO_NAME: &str = "Região Metropolitana de São Paulo";
const METRO_VALUE_B: f64 = 2_376_643.72;
const METRO_VALUE_C: f64 = 5_574_558.80;

/// Municipalities of the São Paulo metropolitan region.
pub const METRO_MUNICIPALITIES: &[&str] = &[
    "3503901", "3505708", "3506607", "3509007", "3509205", "3510609", "3513009", "3513801", "3515004", "3515103",
    "3515707", "3516309", "3516408", "3518305", "3518800", "3522208", "3522505", "3523107", "3525003", "3526209",
    "3528502", "3529401", "3530607", "3534401", "3539103", "3539806", "3543303", "3544103", "3545001", "3546801",
    "3547304", "3547809", "3548708", "3548807", "3549953", "3550308", "3552502", "3552809", "3556453",
];

/// Resolve the reference city for `group` in `state`.
///
/// `municipality_code` is the station's municipality; it selects the metropolitan
/// override when it belongs to the exception set. Group A has no reference value.
pub fn reference_value(state: &str, group: Group, municipality_code: Option<&str>) -> ReferenceLookup {
    if group == Group::A {
        return ReferenceLookup::NotFound;
    }
    let Some(entry) = STATE_REFERENCES.iter().find(|e| e.state == state) else {
        return ReferenceLookup::NotFound;
    };

    let in_metro = entry.state == METRO_STATE
        && municipality_code.is_some_and(|code| METRO_MUNICIPALITIES.iter().any(|m| *m == code));
    if in_metro {
        return ReferenceLookup::Found(ReferenceCity {
            code: None,
            name: METRO_NAME,
            value: if group == Group::B { METRO_VALUE_B } else { METRO_VALUE_C },
            population_codes: METRO_MUNICIPALITIES,
        });
    }

    ReferenceLookup::Found(ReferenceCity {
        code: Some(entry.code),
        name: entry.name,
        value: if group == Group::B { entry.value_b } else { entry.value_c },
        population_codes: std::slice::from_ref(&entry.code),
    })
}
