//! Plain-data chart model and Plotly export.
//!
//! A [`Chart`] holds traces and axis descriptions only. Rendering happens
//! in the browser: [`Chart::to_plotly`] produces a Plotly figure object and
//! [`Chart::write_html`] wraps it in a standalone page.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::{PlotError, PlotResult};

pub const DEFAULT_FONT_SIZE: u32 = 16;
pub const DEFAULT_TITLE_FONT_SIZE: u32 = 22;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisScale {
    #[default]
    Linear,
    Log,
}

impl AxisScale {
    fn plotly_type(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Log => "log",
        }
    }
}

/// Axis title plus scale. For log axes `range` is given in decades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub title: String,
    #[serde(default)]
    pub scale: AxisScale,
    #[serde(default)]
    pub range: Option<[f64; 2]>,
}

impl Axis {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            scale: AxisScale::Linear,
            range: None,
        }
    }

    pub fn log(mut self) -> Self {
        self.scale = AxisScale::Log;
        self
    }

    pub fn with_range(mut self, range: [f64; 2]) -> Self {
        self.range = Some(range);
        self
    }

    fn to_plotly(&self) -> Value {
        let mut axis = Map::new();
        axis.insert("title".into(), json!({ "text": self.title }));
        axis.insert("type".into(), json!(self.scale.plotly_type()));
        if let Some(range) = self.range {
            axis.insert("range".into(), json!(range));
        }
        Value::Object(axis)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    #[default]
    Lines,
    Markers,
    LinesMarkers,
}

impl TraceMode {
    fn plotly_mode(self) -> &'static str {
        match self {
            Self::Lines => "lines",
            Self::Markers => "markers",
            Self::LinesMarkers => "lines+markers",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub width: f64,
    #[serde(default)]
    pub color: Option<String>,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            width: 2.0,
            color: None,
        }
    }
}

/// One named x-y series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub name: String,
    pub x: Vec<f64>,
    /// Same length as `x`.
    pub y: Vec<f64>,
    #[serde(default)]
    pub mode: TraceMode,
    #[serde(default)]
    pub line: LineStyle,
}

impl Trace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            x: Vec::new(),
            y: Vec::new(),
            mode: TraceMode::Lines,
            line: LineStyle::default(),
        }
    }

    pub fn with_points(mut self, x: Vec<f64>, y: Vec<f64>) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_mode(mut self, mode: TraceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.line.width = width;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.line.color = Some(color.into());
        self
    }

    pub fn push(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    fn to_plotly(&self) -> Value {
        let mut line = Map::new();
        line.insert("width".into(), json!(self.line.width));
        if let Some(color) = &self.line.color {
            line.insert("color".into(), json!(color));
        }
        json!({
            "type": "scatter",
            "name": self.name,
            "mode": self.mode.plotly_mode(),
            "x": self.x,
            "y": self.y,
            "line": Value::Object(line),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub title: String,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub traces: Vec<Trace>,
    pub font_size: u32,
    pub title_font_size: u32,
    /// Pixel size; Plotly autosizes when unset.
    #[serde(default)]
    pub size: Option<(u32, u32)>,
}

impl Chart {
    pub fn new(title: impl Into<String>, x_axis: Axis, y_axis: Axis) -> Self {
        Self {
            title: title.into(),
            x_axis,
            y_axis,
            traces: Vec::new(),
            font_size: DEFAULT_FONT_SIZE,
            title_font_size: DEFAULT_TITLE_FONT_SIZE,
            size: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Some((width, height));
        self
    }

    pub fn push_trace(&mut self, trace: Trace) {
        self.traces.push(trace);
    }

    pub fn trace(&self, name: &str) -> Option<&Trace> {
        self.traces.iter().find(|t| t.name == name)
    }

    pub fn trace_names(&self) -> Vec<&str> {
        self.traces.iter().map(|t| t.name.as_str()).collect()
    }

    /// Plotly figure object (`{"data": [...], "layout": {...}}`).
    pub fn to_plotly(&self) -> Value {
        let mut layout = Map::new();
        layout.insert(
            "title".into(),
            json!({ "text": self.title, "font": { "size": self.title_font_size } }),
        );
        layout.insert("font".into(), json!({ "size": self.font_size }));
        layout.insert("xaxis".into(), self.x_axis.to_plotly());
        layout.insert("yaxis".into(), self.y_axis.to_plotly());
        if let Some((width, height)) = self.size {
            layout.insert("width".into(), json!(width));
            layout.insert("height".into(), json!(height));
        }

        json!({
            "data": self.traces.iter().map(Trace::to_plotly).collect::<Vec<_>>(),
            "layout": Value::Object(layout),
        })
    }

    pub fn write_json(&self, path: &Path) -> PlotResult<()> {
        let text = serde_json::to_string_pretty(&self.to_plotly())?;
        write_file(path, &text)?;
        debug!(path = %path.display(), traces = self.traces.len(), "wrote plotly json");
        Ok(())
    }

    /// Standalone HTML page that loads plotly.js from its CDN.
    pub fn to_html(&self) -> PlotResult<String> {
        // A literal `</` inside a trace name would close the script tag.
        let figure = serde_json::to_string(&self.to_plotly())?.replace("</", "<\\/");
        let title = html_escape(&self.title);
        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body>
<div id="chart"></div>
<script>
const figure = {figure};
Plotly.newPlot("chart", figure.data, figure.layout);
</script>
</body>
</html>
"#
        ))
    }

    pub fn write_html(&self, path: &Path) -> PlotResult<()> {
        write_file(path, &self.to_html()?)?;
        debug!(path = %path.display(), traces = self.traces.len(), "wrote plotly html");
        Ok(())
    }
}

fn write_file(path: &Path, contents: &str) -> PlotResult<()> {
    fs::write(path, contents).map_err(|source| PlotError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
