//! Class-promotion valuation.
//!
//! ```text
//! Vpc = (Ptot / Pref) * (Vab + Vbc) * (1 + Tcp / 10)
//! ```
//!
//! `Vab`/`Vbc` come from the (current group, proposed group) matrix in
//! [`transition_values`]; `Vpc` only exists when `Tcp` does.

use serde::Serialize;

use crate::data::CensusSector;
use crate::domain::{
    Applicability, ChangeKind, ClassChange, CoveredMunicipality, Group, PaymentRequirement, PromotionPeriod,
};
use crate::error::EngineError;
use crate::tables::{
    change_kind, class_group, compare_classes, payment_required, reference_value, time_to_promotion,
};
use crate::valuation::{reference_population, total_covered_population};

/// Everything the engine needs for one calculation.
#[derive(Debug, Clone, Copy)]
pub struct ValuationInput<'a> {
    pub current_class: &'a str,
    pub proposed_class: &'a str,
    /// Upper-case state abbreviation of the proposed site.
    pub proposed_state: &'a str,
    /// Selects the metropolitan reference override when applicable.
    pub proposed_municipality_code: Option<&'a str>,
    pub covered: &'a [CoveredMunicipality],
    /// Dataset used for the reference population.
    pub sectors: &'a [CensusSector],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuationResult {
    pub current_group: Group,
    pub proposed_group: Group,
    pub class_change: ClassChange,
    pub tcp: PromotionPeriod,
    pub change_kind: ChangeKind,
    pub payment: PaymentRequirement,
    pub reference_city: String,
    pub reference_code: Option<String>,
    pub pref: u64,
    pub vab: f64,
    pub vbc: f64,
    pub ptot: u64,
    pub vpc: Applicability<f64>,
}

pub fn evaluate(input: &ValuationInput<'_>) -> Result<ValuationResult, EngineError> {
    let current_group = class_group(input.current_class)?;
    let proposed_group = class_group(input.proposed_class)?;

    let tcp = time_to_promotion(input.current_class, input.proposed_class);
    let state = input.proposed_state;
    let selector = input.proposed_municipality_code;

    let reference = reference_value(state, proposed_group, selector);
    let pref = reference
        .city()
        .map_or(0, |city| reference_population(input.sectors, city.population_codes));

    let (vab, vbc) = transition_values(current_group, proposed_group, tcp, state, selector)?;
    // Group A and unknown states have no reference city to divide by.
    if tcp.is_applicable() && reference.city().is_none() {
        return Err(EngineError::NoReferenceCity {
            state: state.to_string(),
            group: proposed_group.letter(),
        });
    }
    let ptot = total_covered_population(input.covered);
    let vpc = promotion_value(ptot, pref, vab, vbc, tcp, reference.name())?;

    tracing::debug!(
        current = %current_group,
        proposed = %proposed_group,
        %tcp,
        reference = reference.name(),
        pref,
        vab,
        vbc,
        ptot,
        %vpc,
        "valuation"
    );

    Ok(ValuationResult {
        current_group,
        proposed_group,
        class_change: compare_classes(input.current_class, input.proposed_class),
        tcp,
        change_kind: change_kind(input.current_class, input.proposed_class),
        payment: payment_required(input.current_class, input.proposed_class),
        reference_city: reference.name().to_string(),
        reference_code: reference.city().and_then(|c| c.code).map(str::to_string),
        pref,
        vab,
        vbc,
        ptot,
        vpc,
    })
}

/// `(Vab, Vbc)` for a group transition.
///
/// Within group B or group C a zero `Tcp` is the free gradual path and takes no
/// value; any other `Tcp` (including "not applicable") takes the group value.
pub fn transition_values(
    current: Group,
    proposed: Group,
    tcp: PromotionPeriod,
    state: &str,
    municipality_code: Option<&str>,
) -> Result<(f64, f64), EngineError> {
    let value = |group: Group| -> Result<f64, EngineError> {
        reference_value(state, group, municipality_code)
            .city()
            .map(|c| c.value)
            .ok_or_else(|| EngineError::MissingReferenceValue {
                state: state.to_string(),
                group: group.letter(),
            })
    };
    let charged_within_group = tcp != Applicability::Applicable(0);

    Ok(match (current, proposed) {
        (Group::A, Group::B) => (value(Group::B)?, 0.0),
        (Group::A, Group::C) => (value(Group::B)?, value(Group::C)?),
        (Group::B, Group::B) if charged_within_group => (value(Group::B)?, 0.0),
        (Group::B, Group::C) => (0.0, value(Group::C)?),
        (Group::C, Group::C) if charged_within_group => (0.0, value(Group::C)?),
        _ => (0.0, 0.0),
    })
}

/// `Vpc` rounded to cents, or not applicable when `Tcp` is.
///
/// A zero `Pref` fails instead of producing a non-finite value.
pub fn promotion_value(
    ptot: u64,
    pref: u64,
    vab: f64,
    vbc: f64,
    tcp: PromotionPeriod,
    reference: &str,
) -> Result<Applicability<f64>, EngineError> {
    let Some(years) = tcp.value() else {
        return Ok(Applicability::NotApplicable);
    };
    if pref == 0 {
        return Err(EngineError::ReferencePopulation {
            reference: reference.to_string(),
        });
    }
    let vpc = (ptot as f64 / pref as f64) * (vab + vbc) * (1.0 + f64::from(years) / 10.0);
    Ok(Applicability::Applicable(round_cents(vpc)))
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
