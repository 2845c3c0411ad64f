//! CSV export for rectangular results.

use std::io;

use crate::error::ExtractResult;
use crate::types::{
    ComponentTable, CompositionTable, DroppedStep, PhaseTable, PropertySeries,
    RegionTemperatureTable, ScheilTable, StudyTable,
};

pub const STEP_HEADER: &str = "step";
pub const SAMPLE_HEADER: &str = "sample";
pub const PHASE_HEADER: &str = "Phase";
pub const FRACTION_SOLID_HEADER: &str = "Fraction solid";
pub const PHASE_REGION_HEADER: &str = "Phase Region";

/// A result that can be written as one header row plus one record per step.
/// Missing values are written as empty fields.
pub trait CsvTable {
    fn headers(&self) -> Vec<String>;

    fn records(&self) -> Vec<Vec<String>>;

    /// Steps left out of the records because a source had no data there.
    fn dropped(&self) -> Vec<DroppedStep> {
        Vec::new()
    }

    fn write_csv<W: io::Write>(&self, writer: W) -> ExtractResult<()> {
        let mut out = csv::Writer::from_writer(writer);
        out.write_record(self.headers())?;
        for record in self.records() {
            out.write_record(&record)?;
        }
        out.flush()?;
        Ok(())
    }

    fn to_csv_string(&self) -> ExtractResult<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

impl CsvTable for PhaseTable {
    fn headers(&self) -> Vec<String> {
        let mut headers = vec![STEP_HEADER.to_string(), self.temperature_label()];
        headers.extend(self.phases.iter().cloned());
        headers
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = vec![row.step.to_string(), row.temperature.to_string()];
                record.extend(row.fractions.iter().map(f64::to_string));
                record
            })
            .collect()
    }

    fn dropped(&self) -> Vec<DroppedStep> {
        self.dropped.clone()
    }
}

impl CsvTable for ScheilTable {
    fn headers(&self) -> Vec<String> {
        let mut headers = vec![
            STEP_HEADER.to_string(),
            self.temperature_label(),
            FRACTION_SOLID_HEADER.to_string(),
            PHASE_REGION_HEADER.to_string(),
        ];
        headers.extend(self.phases.iter().cloned());
        headers
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = vec![
                    row.step.to_string(),
                    row.temperature.to_string(),
                    row.fraction_solid.to_string(),
                    row.phase_region.clone(),
                ];
                record.extend(row.fractions.iter().map(f64::to_string));
                record
            })
            .collect()
    }

    fn dropped(&self) -> Vec<DroppedStep> {
        self.dropped.clone()
    }
}

impl CsvTable for PropertySeries {
    fn headers(&self) -> Vec<String> {
        vec![STEP_HEADER.to_string(), self.label()]
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.points
            .iter()
            .map(|p| vec![p.step.to_string(), p.value.to_string()])
            .collect()
    }
}

impl CsvTable for RegionTemperatureTable {
    fn headers(&self) -> Vec<String> {
        let mut headers = vec![STEP_HEADER.to_string()];
        headers.extend(
            self.regions
                .iter()
                .map(|region| format!("{} in {}", region, self.temperature_unit)),
        );
        headers
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = vec![row.step.to_string()];
                record.extend(row.temperatures.iter().map(|t| optional(*t)));
                record
            })
            .collect()
    }
}

impl CsvTable for CompositionTable {
    fn headers(&self) -> Vec<String> {
        let mut headers = vec![STEP_HEADER.to_string(), PHASE_HEADER.to_string()];
        headers.extend(self.elements.iter().cloned());
        headers
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut record = vec![row.step.to_string(), row.phase.clone()];
                record.extend(row.amounts.iter().map(|a| optional(*a)));
                record
            })
            .collect()
    }
}

impl CsvTable for ComponentTable {
    fn headers(&self) -> Vec<String> {
        let mut headers = vec![SAMPLE_HEADER.to_string()];
        headers.extend(self.names.iter().cloned());
        headers
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, amounts)| {
                let mut record = vec![i.to_string()];
                record.extend(amounts.iter().map(f64::to_string));
                record
            })
            .collect()
    }
}

impl CsvTable for StudyTable {
    fn headers(&self) -> Vec<String> {
        let mut headers = vec![SAMPLE_HEADER.to_string()];
        headers.extend(self.components.iter().cloned());
        headers.push(STEP_HEADER.to_string());
        headers.push(self.temperature_label());
        headers.extend(self.phases.iter().cloned());
        headers
    }

    fn records(&self) -> Vec<Vec<String>> {
        self.blocks
            .iter()
            .flat_map(|block| {
                block.table.rows.iter().map(move |row| {
                    let mut record = vec![block.sample.to_string()];
                    record.extend(block.composition.iter().map(f64::to_string));
                    record.push(row.step.to_string());
                    record.push(row.temperature.to_string());
                    record.extend(row.fractions.iter().map(f64::to_string));
                    record
                })
            })
            .collect()
    }

    fn dropped(&self) -> Vec<DroppedStep> {
        self.blocks
            .iter()
            .flat_map(|block| block.table.dropped.iter().copied())
            .collect()
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
