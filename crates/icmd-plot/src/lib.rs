//! icmd-plot: chart builders over extracted ICMD tables.
//!
//! Builders return a plain [`Chart`]; nothing touches the filesystem until
//! [`Chart::write_json`] or [`Chart::write_html`] is called.

pub mod chart;
pub mod error;
pub mod property;
pub mod scheil;

pub use chart::{Axis, AxisScale, Chart, LineStyle, Trace, TraceMode};
pub use error::{PlotError, PlotResult};
pub use property::property_plot;
pub use scheil::{PhasePlotOptions, phase_fraction_plot, phase_fraction_title, scheil_plot};
