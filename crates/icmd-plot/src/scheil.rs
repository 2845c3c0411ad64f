//! Solidification and phase-fraction charts.

use icmd_extract::solidification::{LIQUID_PHASE, SOLID_PHASE};
use icmd_extract::{FractionBasis, PhaseTable, ScheilTable};
use tracing::debug;

use crate::chart::{Axis, Chart, Trace};

pub const SCHEIL_LINE_WIDTH: f64 = 3.0;
pub const PHASE_LINE_WIDTH: f64 = 2.0;
pub const LIQUID_COLOR: &str = "black";

/// Log axis range in decades: 1e-4 to 1.
pub const DEFAULT_LOG_RANGE: [f64; 2] = [-4.0, 0.0];
/// Phases whose fraction never exceeds this are left out of the chart.
pub const DEFAULT_MIN_PEAK_FRACTION: f64 = 1e-4;

pub const FRACTION_SOLID_TITLE: &str = "Fraction solid";
pub const PHASE_FRACTION_TITLE: &str = "Phase fraction (mol)";
pub const MASS_FRACTION_TITLE: &str = "Phase fraction (mass)";
pub const VOLUME_FRACTION_TITLE: &str = "Volume fraction";

/// Y axis title for phase fractions read on `basis`.
pub fn phase_fraction_title(basis: FractionBasis) -> &'static str {
    match basis {
        FractionBasis::Mole => PHASE_FRACTION_TITLE,
        FractionBasis::Mass => MASS_FRACTION_TITLE,
    }
}

/// Temperature against fraction solid, one trace per phase region.
pub fn scheil_plot(table: &ScheilTable, plotname: &str) -> Chart {
    let mut chart = Chart::new(
        plotname,
        Axis::new(FRACTION_SOLID_TITLE),
        Axis::new(table.temperature_label()),
    );

    for row in &table.rows {
        let idx = match chart
            .traces
            .iter()
            .position(|t| t.name == row.phase_region)
        {
            Some(idx) => idx,
            None => {
                chart.push_trace(Trace::new(&row.phase_region).with_width(SCHEIL_LINE_WIDTH));
                chart.traces.len() - 1
            }
        };
        chart.traces[idx].push(row.fraction_solid, row.temperature);
    }

    debug!(
        plot = plotname,
        regions = chart.traces.len(),
        "built scheil plot"
    );
    chart
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhasePlotOptions {
    pub title: String,
    pub y_title: String,
    pub log_y: bool,
    /// Y range; on a log axis the default is [`DEFAULT_LOG_RANGE`].
    pub y_range: Option<[f64; 2]>,
    pub min_peak_fraction: f64,
}

impl Default for PhasePlotOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            y_title: PHASE_FRACTION_TITLE.to_string(),
            log_y: true,
            y_range: None,
            min_peak_fraction: DEFAULT_MIN_PEAK_FRACTION,
        }
    }
}

/// Phase fractions against ascending temperature.
///
/// The aggregate `SOLID` column (exact name) is skipped. `LIQUID` is always drawn,
/// first and in black; other phases only when they peak above
/// `options.min_peak_fraction`.
pub fn phase_fraction_plot(table: &PhaseTable, options: &PhasePlotOptions) -> Chart {
    let mut y_axis = Axis::new(options.y_title.as_str());
    if options.log_y {
        y_axis = y_axis.log().with_range(options.y_range.unwrap_or(DEFAULT_LOG_RANGE));
    } else if let Some(range) = options.y_range {
        y_axis = y_axis.with_range(range);
    }
    let mut chart = Chart::new(
        options.title.as_str(),
        Axis::new(table.temperature_label()),
        y_axis,
    );

    let mut rows: Vec<_> = table.rows.iter().collect();
    rows.sort_by(|a, b| a.temperature.total_cmp(&b.temperature));
    let temperatures: Vec<f64> = rows.iter().map(|r| r.temperature).collect();

    let mut liquid = None;
    let mut others = Vec::new();
    for (idx, name) in table.phases.iter().enumerate() {
        if name == SOLID_PHASE {
            continue;
        }
        let fractions: Vec<f64> = rows.iter().map(|r| r.fractions[idx]).collect();
        if name.eq_ignore_ascii_case(LIQUID_PHASE) {
            liquid = Some(
                Trace::new(name)
                    .with_points(temperatures.clone(), fractions)
                    .with_color(LIQUID_COLOR),
            );
            continue;
        }
        let peak = fractions.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if peak > options.min_peak_fraction {
            others.push(Trace::new(name).with_points(temperatures.clone(), fractions));
        }
    }

    for trace in liquid.into_iter().chain(others) {
        chart.push_trace(trace.with_width(PHASE_LINE_WIDTH));
    }
    chart
}
