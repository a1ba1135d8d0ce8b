//! Protected-contour radius (`dmax`) per class and channel.
//!
//! Current classes resolve to a flat radius. Legacy classes (`E`/`ESPECIAL`,
//! `A`, `B`) and class `C` resolve by channel band; bands are half-open, so a
//! channel on a boundary belongs to the upper band.

use std::ops::Range;

use serde::Serialize;

/// Radius used when a class or channel is not covered by the table.
pub const DEFAULT_RADIUS_KM: f64 = 7.5;

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBand {
    pub channels: Range<u32>,
    pub radius_km: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RadiusRule {
    Flat(f64),
    ByChannel(&'static [ChannelBand]),
}

/// How a radius was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiusSource {
    Flat,
    ChannelBand,
    /// Class has channel bands but none contains the channel.
    ChannelFallback,
    /// Class is not in the table at all.
    UnknownClassFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContourRadius {
    pub km: f64,
    pub source: RadiusSource,
}

const fn band(start: u32, end: u32, radius_km: f64) -> ChannelBand {
    ChannelBand {
        channels: start..end,
        radius_km,
    }
}

const SPECIAL_BANDS: &[ChannelBand] = &[band(0, 14, 65.6), band(14, 47, 58.0), band(47, 100, 58.0)];
const LEGACY_A_BANDS: &[ChannelBand] = &[band(0, 14, 47.9), band(14, 100, 42.5)];
const LEGACY_B_BANDS: &[ChannelBand] = &[band(0, 14, 32.3), band(14, 100, 29.1)];
const C_BANDS: &[ChannelBand] = &[band(0, 14, 20.2), band(14, 52, 18.1), band(52, 100, 7.5)];

/// Radius rules keyed by lower-case class label.
pub const RADIUS_TABLE: &[(&str, RadiusRule)] = &[
    ("e", RadiusRule::ByChannel(SPECIAL_BANDS)),
    ("especial", RadiusRule::ByChannel(SPECIAL_BANDS)),
    ("a", RadiusRule::ByChannel(LEGACY_A_BANDS)),
    ("b", RadiusRule::ByChannel(LEGACY_B_BANDS)),
    ("c", RadiusRule::ByChannel(C_BANDS)),
    ("e1", RadiusRule::Flat(78.5)),
    ("e2", RadiusRule::Flat(67.5)),
    ("e3", RadiusRule::Flat(54.5)),
    ("a1", RadiusRule::Flat(38.5)),
    ("a2", RadiusRule::Flat(35.0)),
    ("a3", RadiusRule::Flat(30.0)),
    ("a4", RadiusRule::Flat(24.0)),
    ("b1", RadiusRule::Flat(16.5)),
    ("b2", RadiusRule::Flat(12.5)),
];

/// Resolve the protected-contour radius for a class and channel.
///
/// Always returns a radius: unmatched classes or channels take the explicit
/// [`DEFAULT_RADIUS_KM`] branch, reported through [`RadiusSource`].
pub fn contour_radius(class: &str, channel: u32) -> ContourRadius {
    let key = class.trim().to_lowercase();
    let Some((_, rule)) = RADIUS_TABLE.iter().find(|(label, _)| *label == key) else {
        return ContourRadius {
            km: DEFAULT_RADIUS_KM,
            source: RadiusSource::UnknownClassFallback,
        };
    };

    match rule {
        RadiusRule::Flat(km) => ContourRadius {
            km: *km,
            source: RadiusSource::Flat,
        },
        RadiusRule::ByChannel(bands) => match bands.iter().find(|b| b.channels.contains(&channel)) {
            Some(b) => ContourRadius {
                km: b.radius_km,
                source: RadiusSource::ChannelBand,
            },
            None => ContourRadius {
                km: DEFAULT_RADIUS_KM,
                source: RadiusSource::ChannelFallback,
            },
        },
    }
}

pub fn contour_radius_km(class: &str, channel: u32) -> f64 {
    contour_radius(class, channel).km
}
