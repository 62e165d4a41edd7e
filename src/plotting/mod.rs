// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to plot day matrices and the products of the metrics analyses.
//!
//! Only available with the "plotting" feature.

mod colour;
mod error;

pub use error::DrawError;

use std::{ops::Range, path::Path};

use chrono::NaiveDate;
use log::debug;
use plotters::prelude::*;

use crate::{
    constants::{
        DEFAULT_WATERFALL_CEILING_DBM, DEFAULT_WATERFALL_FLOOR_DBM, DEFAULT_WATERFALL_LEVELS,
        FREQ_COLUMN,
    },
    math::nan_min,
    matrix::{filter::WaterfallFilter, DayMatrix},
    metrics::Metric,
    time::{fractional_year, hours_since_midnight},
    timeseries::DailyOccupancy,
};
use colour::{cell_edges, level_colour, level_index};

const X_PIXELS: u32 = 1600;
const Y_PIXELS: u32 = 1000;
/// The width of the colour bar area on waterfall plots.
const COLOUR_BAR_PIXELS: u32 = 180;

/// Cell widths for a day matrix with a single frequency or time.
const LONE_FREQ_WIDTH_GHZ: f64 = 1e-4;
const LONE_TIME_WIDTH_HOURS: f64 = 1.0 / 60.0;

/// The powers shown on a waterfall plot, split into evenly-sized colour bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerScale {
    /// \[dBm\]
    pub floor: f64,
    /// \[dBm\]
    pub ceiling: f64,
    pub levels: usize,
}

impl Default for PowerScale {
    fn default() -> Self {
        PowerScale {
            floor: DEFAULT_WATERFALL_FLOOR_DBM,
            ceiling: DEFAULT_WATERFALL_CEILING_DBM,
            levels: DEFAULT_WATERFALL_LEVELS,
        }
    }
}

impl PowerScale {
    pub fn new(floor: f64, ceiling: f64, levels: usize) -> Result<PowerScale, DrawError> {
        if floor.is_nan() || ceiling.is_nan() || floor >= ceiling || levels == 0 {
            return Err(DrawError::BadScale { floor, ceiling });
        }
        Ok(PowerScale {
            floor,
            ceiling,
            levels,
        })
    }
}

/// The range spanned by the finite values, padded by 5% on each side. `None`
/// if there are no finite values.
fn padded_range<I: IntoIterator<Item = f64>>(values: I) -> Option<Range<f64>> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })?;
    let pad = if max > min { (max - min) * 0.05 } else { 0.5 };
    Some(min - pad..max + pad)
}

/// Plot a day matrix as a waterfall: frequency on the x axis, hours since
/// midnight on the y axis, and power as coloured bands. Powers outside the
/// scale are left blank.
pub fn plot_waterfall(
    matrix: &DayMatrix,
    filter: WaterfallFilter,
    title: &str,
    output: &Path,
    scale: PowerScale,
) -> Result<(), DrawError> {
    if matrix.num_freqs() == 0 || matrix.num_times() == 0 {
        return Err(DrawError::NoData);
    }
    let mut matrix = filter.apply(matrix);
    matrix.sort_columns();
    debug!("Plotting a {}x{} waterfall to {}", matrix.num_freqs(), matrix.num_times(), output.display());

    let hours: Vec<f64> = matrix.times.iter().copied().map(hours_since_midnight).collect();
    let x_edges = cell_edges(&matrix.freqs, LONE_FREQ_WIDTH_GHZ);
    let y_edges = cell_edges(&hours, LONE_TIME_WIDTH_HOURS);
    let x_range = x_edges[0]..x_edges[x_edges.len() - 1];

    let root = BitMapBackend::new(output, (X_PIXELS, Y_PIXELS)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    let (main_area, bar_area) = root.split_horizontally(X_PIXELS - COLOUR_BAR_PIXELS);

    let mut chart = ChartBuilder::on(&main_area)
        .caption(title, ("sans-serif", 40))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range, 0.0..24.0)
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_desc(FREQ_COLUMN)
        .y_desc("Time (hours since midnight)")
        .axis_desc_style(("sans-serif", 24))
        .draw()
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;

    let cells = matrix
        .data
        .indexed_iter()
        .filter_map(|((i_freq, i_time), &power)| {
            let level = level_index(power, &scale)?;
            Some(Rectangle::new(
                [
                    (x_edges[i_freq], y_edges[i_time]),
                    (x_edges[i_freq + 1], y_edges[i_time + 1]),
                ],
                level_colour(level, &scale).filled(),
            ))
        });
    chart
        .draw_series(cells)
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;

    // The colour bar.
    let mut bar = ChartBuilder::on(&bar_area)
        .margin_top(60)
        .margin_bottom(70)
        .margin_right(20)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..1.0, scale.floor..scale.ceiling)
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_desc("Power (dBm)")
        .draw()
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    let step = (scale.ceiling - scale.floor) / scale.levels as f64;
    bar.draw_series((0..scale.levels).map(|level| {
        let low = scale.floor + step * level as f64;
        Rectangle::new(
            [(0.0, low), (1.0, low + step)],
            level_colour(level, &scale).filled(),
        )
    }))
    .map_err(|e| DrawError::Plotters(Box::new(e)))?;

    root.present()
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    Ok(())
}

/// Draw a single line against a numeric x axis.
fn plot_line(
    points: Vec<(f64, f64)>,
    y_range: Option<Range<f64>>,
    title: &str,
    x_desc: &str,
    y_desc: &str,
    output: &Path,
) -> Result<(), DrawError> {
    let x_range = padded_range(points.iter().map(|p| p.0)).ok_or(DrawError::NoData)?;
    let y_range = match y_range {
        Some(r) => r,
        None => padded_range(points.iter().map(|p| p.1)).ok_or(DrawError::NoData)?,
    };

    let root = BitMapBackend::new(output, (X_PIXELS, Y_PIXELS)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 40))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    chart
        .configure_mesh()
        .x_desc(x_desc)
        .y_desc(y_desc)
        .axis_desc_style(("sans-serif", 24))
        .draw()
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    chart
        .draw_series(LineSeries::new(points, &BLUE))
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    root.present()
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    Ok(())
}

/// Plot the daily average of a metric over time. Days without a value are
/// skipped.
pub fn plot_daily_average(
    averages: &[(NaiveDate, f64)],
    metric: Metric,
    title: &str,
    output: &Path,
) -> Result<(), DrawError> {
    let points: Vec<(f64, f64)> = averages
        .iter()
        .filter(|(_, v)| v.is_finite())
        .map(|(d, v)| (fractional_year(*d), *v))
        .collect();
    plot_line(
        points,
        None,
        title,
        "Year",
        &format!("Daily average of {}", metric.column()),
        output,
    )
}

/// Plot the daily percentage of samples above a threshold.
pub fn plot_percent_above(
    occupancy: &[DailyOccupancy],
    title: &str,
    output: &Path,
) -> Result<(), DrawError> {
    let points: Vec<(f64, f64)> = occupancy
        .iter()
        .filter(|o| o.percent_above.is_finite())
        .map(|o| (fractional_year(o.date), o.percent_above))
        .collect();
    plot_line(
        points,
        Some(0.0..100.0),
        title,
        "Year",
        "Samples above threshold (%)",
        output,
    )
}

/// Scatter p-values against frequency on a log axis. Points below `alpha` are
/// highlighted in red and `alpha` itself is drawn as a line.
pub fn plot_p_values(
    p_values: &[(f64, f64)],
    alpha: f64,
    title: &str,
    output: &Path,
) -> Result<(), DrawError> {
    // Non-positive p-values can't go on a log axis.
    let points: Vec<(f64, f64)> = p_values
        .iter()
        .copied()
        .filter(|(f, p)| f.is_finite() && p.is_finite() && *p > 0.0)
        .collect();
    let x_range = padded_range(points.iter().map(|p| p.0)).ok_or(DrawError::NoData)?;
    let p_min = nan_min(&points.iter().map(|p| p.1).collect::<Vec<_>>()).min(alpha);
    let y_range = (p_min / 10.0)..1.0;
    let (significant, other): (Vec<_>, Vec<_>) = points.into_iter().partition(|(_, p)| *p < alpha);
    debug!("{} of {} p-values are below {alpha}", significant.len(), significant.len() + other.len());

    let root = BitMapBackend::new(output, (X_PIXELS, Y_PIXELS)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 40))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d(x_range.clone(), y_range.log_scale())
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    chart
        .configure_mesh()
        .x_desc(FREQ_COLUMN)
        .y_desc("P-value")
        .y_label_formatter(&|p| format!("{p:.0e}"))
        .axis_desc_style(("sans-serif", 24))
        .draw()
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;

    let grey = RGBColor(128, 128, 128);
    for (points, colour, label) in [
        (other, BLUE, "Not significant".to_string()),
        (significant, RED, format!("p < {alpha}")),
    ] {
        chart
            .draw_series(PointSeries::of_element(
                points,
                3,
                ShapeStyle::from(&colour).filled(),
                &|coord, size, style| EmptyElement::at(coord) + Circle::new((0, 0), size, style),
            ))
            .map_err(|e| DrawError::Plotters(Box::new(e)))?
            .label(label)
            .legend(move |(x, y)| Circle::new((x, y), 3, colour.filled()));
    }
    chart
        .draw_series(LineSeries::new(
            vec![(x_range.start, alpha), (x_range.end, alpha)],
            &grey,
        ))
        .map_err(|e| DrawError::Plotters(Box::new(e)))?
        .label(format!("alpha = {alpha}"))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 10, y)], grey));

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    root.present()
        .map_err(|e| DrawError::Plotters(Box::new(e)))?;
    Ok(())
}
