// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Colour mapping for waterfall plots.

use plotters::style::RGBColor;

use super::PowerScale;

/// Anchors of a cividis-like map, dark blue through grey to yellow.
const CIVIDIS: [(f64, (u8, u8, u8)); 5] = [
    (0.0, (0, 34, 78)),
    (0.25, (61, 78, 108)),
    (0.5, (124, 123, 120)),
    (0.75, (188, 175, 109)),
    (1.0, (254, 232, 56)),
];

/// The colour at `x` (clamped to \[0, 1\]) on the cividis-like map.
pub(super) fn cividis(x: f64) -> RGBColor {
    let x = if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) };
    let upper = CIVIDIS
        .iter()
        .position(|(pos, _)| *pos >= x)
        .unwrap_or(CIVIDIS.len() - 1)
        .max(1);
    let (p0, (r0, g0, b0)) = CIVIDIS[upper - 1];
    let (p1, (r1, g1, b1)) = CIVIDIS[upper];
    let frac = (x - p0) / (p1 - p0);
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Which band of the scale a power falls into. Powers outside the scale (and
/// NaNs) aren't drawn.
pub(super) fn level_index(value: f64, scale: &PowerScale) -> Option<usize> {
    if value.is_nan() || value < scale.floor || value > scale.ceiling {
        return None;
    }
    let frac = (value - scale.floor) / (scale.ceiling - scale.floor);
    Some(((frac * scale.levels as f64) as usize).min(scale.levels - 1))
}

/// The colour of a band.
pub(super) fn level_colour(level: usize, scale: &PowerScale) -> RGBColor {
    if scale.levels <= 1 {
        cividis(0.5)
    } else {
        cividis(level as f64 / (scale.levels - 1) as f64)
    }
}

/// The edges of cells centred on `centres`; edges lie halfway between
/// neighbouring centres and the outermost cells are as wide as their
/// neighbours. A lone cell is `default_width` wide.
pub(super) fn cell_edges(centres: &[f64], default_width: f64) -> Vec<f64> {
    match centres {
        [] => vec![],
        [c] => vec![c - default_width / 2.0, c + default_width / 2.0],
        _ => {
            let n = centres.len();
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(centres[0] - (centres[1] - centres[0]) / 2.0);
            edges.extend(centres.windows(2).map(|w| (w[0] + w[1]) / 2.0));
            edges.push(centres[n - 1] + (centres[n - 1] - centres[n - 2]) / 2.0);
            edges
        }
    }
}
