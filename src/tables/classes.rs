//! Class order, group membership and promotion periods.
//!
//! All tables are process-wide constants. Lookups that can meet an unknown
//! class either return `UnknownClass` (`class_group`) or a distinguished outcome
//! (`compare_classes`); the comparison helpers never fail.

use crate::domain::{
    Applicability, ChangeKind, ClassChange, ClassCode, Group, GroupChange, PaymentRequirement, PromotionPeriod,
};
use crate::error::EngineError;

/// Years a non-gradual promotion takes, for `(current, proposed)` pairs with
/// `proposed > current`. Pairs missing here are "not applicable".
const PROMOTION_PERIODS: &[(ClassCode, &[(ClassCode, u32)])] = {
    use ClassCode::*;
    &[
        (C, &[(B2, 0), (B1, 0), (A4, 2), (A3, 2), (A2, 6), (A1, 6), (E3, 8), (E2, 10), (E1, 12)]),
        (B2, &[(B1, 0), (A4, 0), (A3, 2), (A2, 4), (A1, 4), (E3, 6), (E2, 8), (E1, 10)]),
        (B1, &[(A4, 0), (A3, 0), (A2, 2), (A1, 2), (E3, 4), (E2, 6), (E1, 8)]),
        (A4, &[(A3, 0), (A2, 0), (A1, 2), (E3, 4), (E2, 6), (E1, 8)]),
        (A3, &[(A2, 0), (A1, 0), (E3, 2), (E2, 4), (E1, 6)]),
        (A2, &[(A1, 0), (E3, 2), (E2, 4), (E1, 6)]),
        (A1, &[(E3, 0), (E2, 2), (E1, 4)]),
        (E3, &[(E2, 0), (E1, 2)]),
        (E2, &[(E1, 0)]),
    ]
};

/// Group a class belongs to.
pub fn group_of(class: ClassCode) -> Group {
    match class {
        ClassCode::C | ClassCode::B2 | ClassCode::B1 => Group::A,
        ClassCode::A4 | ClassCode::A3 | ClassCode::A2 | ClassCode::A1 => Group::B,
        ClassCode::E3 | ClassCode::E2 | ClassCode::E1 => Group::C,
    }
}

/// Group of a class code given as text; fails for codes outside the class order.
pub fn class_group(class: &str) -> Result<Group, EngineError> {
    Ok(group_of(class.parse()?))
}

/// Compare positions in the class order.
pub fn compare_classes(current: &str, proposed: &str) -> ClassChange {
    match (current.parse::<ClassCode>(), proposed.parse::<ClassCode>()) {
        (Ok(current), Ok(proposed)) => compare_codes(current, proposed),
        (Err(_), Err(_)) => ClassChange::BothUnknown,
        _ => ClassChange::OneUnknown,
    }
}

pub fn compare_codes(current: ClassCode, proposed: ClassCode) -> ClassChange {
    match current.cmp(&proposed) {
        std::cmp::Ordering::Equal => ClassChange::Unchanged,
        std::cmp::Ordering::Less => ClassChange::Promoted,
        std::cmp::Ordering::Greater => ClassChange::Demoted,
    }
}

/// Time-to-promotion in years; not applicable unless the change is a promotion
/// listed in the promotion period table.
pub fn time_to_promotion(current: &str, proposed: &str) -> PromotionPeriod {
    match (current.parse::<ClassCode>(), proposed.parse::<ClassCode>()) {
        (Ok(current), Ok(proposed)) => promotion_period(current, proposed),
        _ => Applicability::NotApplicable,
    }
}

pub fn promotion_period(current: ClassCode, proposed: ClassCode) -> PromotionPeriod {
    if compare_codes(current, proposed) != ClassChange::Promoted {
        return Applicability::NotApplicable;
    }
    PROMOTION_PERIODS
        .iter()
        .find(|(from, _)| *from == current)
        .and_then(|(_, targets)| targets.iter().find(|(to, _)| *to == proposed))
        .map_or(Applicability::NotApplicable, |(_, years)| Applicability::Applicable(*years))
}

/// `Gradual` iff the change is a promotion with a zero-year period.
pub fn change_kind(current: &str, proposed: &str) -> ChangeKind {
    if compare_classes(current, proposed) != ClassChange::Promoted {
        return ChangeKind::NotApplicable;
    }
    match time_to_promotion(current, proposed) {
        Applicability::Applicable(0) => ChangeKind::Gradual,
        _ => ChangeKind::NonGradual,
    }
}

pub fn group_change(current: &str, proposed: &str) -> GroupChange {
    let (Ok(from), Ok(to)) = (class_group(current), class_group(proposed)) else {
        return GroupChange::Unknown;
    };
    match from.cmp(&to) {
        std::cmp::Ordering::Equal => GroupChange::Unchanged(from),
        std::cmp::Ordering::Less => GroupChange::Promoted { from, to },
        std::cmp::Ordering::Greater => GroupChange::Demoted { from, to },
    }
}

/// Whether the class change is charged.
///
/// Keeping the same class is not a change, so nothing applies. A group demotion
/// is never charged and a group promotion always is. Inside the same group only
/// a positive time-to-promotion is charged: a zero period is the free gradual
/// path, and "not applicable" is treated the same way.
pub fn payment_required(current: &str, proposed: &str) -> PaymentRequirement {
    if compare_classes(current, proposed) == ClassChange::Unchanged {
        return PaymentRequirement::NotApplicable;
    }
    match group_change(current, proposed) {
        GroupChange::Demoted { .. } => PaymentRequirement::NoCharge,
        GroupChange::Promoted { .. } => PaymentRequirement::Required,
        GroupChange::Unchanged(_) => match time_to_promotion(current, proposed) {
            Applicability::Applicable(years) if years > 0 => PaymentRequirement::Required,
            _ => PaymentRequirement::NoCharge,
        },
        GroupChange::Unknown => PaymentRequirement::NotApplicable,
    }
}
