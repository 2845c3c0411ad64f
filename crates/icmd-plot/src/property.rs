use icmd_extract::PropertySeries;

use crate::chart::{Axis, Chart, Trace, TraceMode};

pub const STEP_TITLE: &str = "Step";

/// Property value over simulation steps, drawn with markers.
pub fn property_plot(series: &PropertySeries, plotname: &str) -> Chart {
    let mut chart = Chart::new(plotname, Axis::new(STEP_TITLE), Axis::new(series.label()));
    let (x, y): (Vec<f64>, Vec<f64>) = series
        .points
        .iter()
        .map(|p| (p.step as f64, p.value))
        .unzip();
    chart.push_trace(
        Trace::new(&series.name)
            .with_points(x, y)
            .with_mode(TraceMode::LinesMarkers),
    );
    chart
}
