//! Population sums for `Ptot` and `Pref`.

use crate::data::CensusSector;
use crate::domain::CoveredMunicipality;

/// `Ptot`: sum over the covered set.
pub fn total_covered_population(covered: &[CoveredMunicipality]) -> u64 {
    covered.iter().map(|m| m.population).sum()
}

/// `Ptot` from formatted `"<state>/<municipality>/<population>"` entries.
///
/// The population is the trailing run of digits; entries without one are
/// skipped.
pub fn total_from_entries<S: AsRef<str>>(entries: &[S]) -> u64 {
    entries
        .iter()
        .filter_map(|e| trailing_number(e.as_ref()))
        .sum()
}

fn trailing_number(entry: &str) -> Option<u64> {
    let entry = entry.trim_end();
    let digits = entry.len() - entry.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    entry[entry.len() - digits..].parse().ok()
}

/// `Pref`: population of every sector belonging to one of `codes`.
///
/// A municipality spans many sector rows, and the metropolitan reference spans
/// many municipalities, so this is always a sum.
pub fn reference_population(sectors: &[CensusSector], codes: &[&str]) -> u64 {
    sectors
        .iter()
        .filter(|s| codes.iter().any(|c| *c == s.municipality_code))
        .map(|s| s.population)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sectors::fixtures::square_sector;

    #[test]
    fn entries_with_unparseable_population_are_excluded() {
        let entries = [
            "São Paulo/Campinas/1139047",
            "São Paulo/Valinhos/126373",
            "São Paulo/Vinhedo/",
            "São Paulo/Itatiba/n.d.",
        ];
        assert_eq!(total_from_entries(&entries), 1_265_420);
        assert_eq!(total_from_entries::<&str>(&[]), 0);
    }

    #[test]
    fn structured_and_formatted_totals_agree() {
        let covered = vec![
            CoveredMunicipality {
                code: "1".into(),
                state_name: "Bahia".into(),
                name: "Salvador".into(),
                population: 2_418_005,
            },
            CoveredMunicipality {
                code: "2".into(),
                state_name: "Bahia".into(),
                name: "Lauro de Freitas".into(),
                population: 203_334,
            },
        ];
        let formatted: Vec<String> = covered.iter().map(ToString::to_string).collect();
        assert_eq!(total_covered_population(&covered), total_from_entries(&formatted));
    }

    #[test]
    fn reference_population_sums_split_rows() {
        let unit = (0.0, 0.0, 1.0, 1.0);
        let sectors = vec![
            square_sector("3509502", "Campinas", "São Paulo", 600_000, true, unit),
            square_sector("3509502", "Campinas", "São Paulo", 539_047, false, unit),
            square_sector("3550308", "São Paulo", "São Paulo", 11_451_999, true, unit),
            square_sector("3518800", "Guarulhos", "São Paulo", 1_291_771, true, unit),
        ];
        assert_eq!(reference_population(&sectors, &["3509502"]), 1_139_047);
        assert_eq!(reference_population(&sectors, &["3550308", "3518800"]), 12_743_770);
        assert_eq!(reference_population(&sectors, &["0000000"]), 0);
    }
}
