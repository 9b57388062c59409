//! Output formatting for periodic bearing updates
//!
//! A `BearingUpdate` is what a transport broadcasts every cycle: the raw
//! bearings plus the fused result. Formatters render it as human-readable
//! text, JSON (the broadcast wire shape) or CSV for data logging.

use serde::{Deserialize, Serialize};

use crate::core::{BearingSample, TriangulationResult};
use crate::validation::error::RdfResult;

/// One broadcast payload: `{"bearings": [...], "result": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BearingUpdate {
    pub bearings: Vec<BearingSample>,
    pub result: TriangulationResult,
}

impl BearingUpdate {
    /// Generation time shared by the bearings, if there are any
    pub fn timestamp_ms(&self) -> Option<u64> {
        self.bearings.first().map(|b| b.timestamp)
    }
}

/// Renders a bearing update for output
pub trait ResultFormatter {
    fn format(&self, update: &BearingUpdate) -> RdfResult<String>;
}

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn formatter(self) -> Box<dyn ResultFormatter> {
        self.formatter_with(false)
    }

    /// Formatter for this format; `pretty` only affects JSON
    pub fn formatter_with(self, pretty: bool) -> Box<dyn ResultFormatter> {
        match self {
            OutputFormat::Text => Box::new(TextFormatter::new()),
            OutputFormat::Json if pretty => Box::new(JsonFormatter::pretty()),
            OutputFormat::Json => Box::new(JsonFormatter::new()),
            OutputFormat::Csv => Box::new(CsvFormatter::new()),
        }
    }
}

/// Human-readable text formatter
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    /// Single line per update
    pub compact: bool,
}

impl TextFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compact() -> Self {
        Self { compact: true }
    }

    fn estimate_line(&self, result: &TriangulationResult) -> String {
        if result.is_degenerate() {
            return "no fix (fewer than 2 usable bearings)".to_string();
        }
        format!(
            "{:.6}°N, {:.6}°E",
            result.estimated_location.latitude, result.estimated_location.longitude
        )
    }
}

impl ResultFormatter for TextFormatter {
    fn format(&self, update: &BearingUpdate) -> RdfResult<String> {
        let result = &update.result;
        let mut output = String::new();

        if self.compact {
            output.push_str(&format!(
                "Fix: {} | Conf:{:.1} | Bearings:{} | Tiles:{}",
                self.estimate_line(result),
                result.confidence,
                update.bearings.len(),
                result.heatmap_tiles.len()
            ));
            return Ok(output);
        }

        match update.timestamp_ms() {
            Some(ts) => output.push_str(&format!("Update @ {} ms\n", ts)),
            None => output.push_str("Update (no bearings)\n"),
        }

        if !update.bearings.is_empty() {
            output.push_str("Bearings:\n");
            for b in &update.bearings {
                output.push_str(&format!(
                    "  [{}] {:.6}, {:.6}  bearing {:6.2}°  conf {:4.1}  power {:7.2} dBm\n",
                    b.station_id, b.latitude, b.longitude, b.radio_bearing, b.confidence, b.power
                ));
            }
        }

        output.push_str(&format!("Estimate: {}\n", self.estimate_line(result)));
        if !result.is_degenerate() {
            let stations: Vec<String> = result.stations_used.iter().map(|id| id.to_string()).collect();
            output.push_str(&format!("  Confidence: {:.2}/10\n", result.confidence));
            output.push_str(&format!("  Stations:   {}\n", stations.join(", ")));
            output.push_str(&format!("  Heatmap:    {} tiles\n", result.heatmap_tiles.len()));
        }

        Ok(output)
    }
}

/// JSON formatter, producing the broadcast wire shape
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    /// Pretty print JSON
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl ResultFormatter for JsonFormatter {
    fn format(&self, update: &BearingUpdate) -> RdfResult<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(update)?
        } else {
            serde_json::to_string(update)?
        };
        Ok(json)
    }
}

/// CSV formatter for data logging, one row per bearing
#[derive(Debug, Clone)]
pub struct CsvFormatter {
    /// Include header row
    pub include_header: bool,
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self { include_header: true }
    }
}

impl CsvFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_header() -> Self {
        Self { include_header: false }
    }

    pub fn header(&self) -> &'static str {
        "timestamp_ms,station_id,latitude,longitude,bearing_deg,confidence,power_dbm,frequency_hz,est_latitude,est_longitude,est_confidence"
    }
}

impl ResultFormatter for CsvFormatter {
    fn format(&self, update: &BearingUpdate) -> RdfResult<String> {
        let result = &update.result;
        let mut output = String::new();

        if self.include_header {
            output.push_str(self.header());
            output.push('\n');
        }

        for b in &update.bearings {
            output.push_str(&format!(
                "{},{},{:.6},{:.6},{:.2},{:.2},{:.2},{:.0},{:.6},{:.6},{:.2}\n",
                b.timestamp,
                b.station_id,
                b.latitude,
                b.longitude,
                b.radio_bearing,
                b.confidence,
                b.power,
                b.frequency,
                result.estimated_location.latitude,
                result.estimated_location.longitude,
                result.confidence
            ));
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DoaSpectrum, GeoPoint, HeatmapTile};

    fn sample(station_id: u32, bearing: f64) -> BearingSample {
        BearingSample {
            timestamp: 1_700_000_000_000,
            station_id,
            latitude: 50.73698963565033,
            longitude: 7.009624403772563,
            radio_bearing: bearing,
            confidence: 6.5,
            power: -72.25,
            frequency: 433_420_000.0,
            doa_array: DoaSpectrum::from_fn(|_| 0.5),
        }
    }

    fn update() -> BearingUpdate {
        BearingUpdate {
            bearings: vec![sample(3826, 12.5), sample(3827, 330.0)],
            result: TriangulationResult {
                estimated_location: GeoPoint::new(50.85, 7.05),
                confidence: 9.5,
                stations_used: vec![3826, 3827],
                heatmap_tiles: vec![HeatmapTile {
                    latitude: 50.85,
                    longitude: 7.05,
                    power: 1.0,
                }],
            },
        }
    }

    #[test]
    fn test_text_format() {
        let text = TextFormatter::new().format(&update()).unwrap();
        assert!(text.starts_with("Update @ 1700000000000 ms"));
        assert!(text.contains("[3826]"));
        assert!(text.contains("Estimate: 50.850000°N, 7.050000°E"));
        assert!(text.contains("Stations:   3826, 3827"));
        assert!(text.contains("Heatmap:    1 tiles"));
    }

    #[test]
    fn test_text_format_degenerate() {
        let empty = BearingUpdate {
            bearings: Vec::new(),
            result: TriangulationResult::degenerate(),
        };
        let text = TextFormatter::new().format(&empty).unwrap();
        assert!(text.contains("no fix"));
        assert!(!text.contains("Confidence"));

        let compact = TextFormatter::compact().format(&empty).unwrap();
        assert!(!compact.contains('\n'));
    }

    #[test]
    fn test_json_wire_shape() {
        let json = JsonFormatter::new().format(&update()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["bearings"].as_array().unwrap().len(), 2);
        assert_eq!(value["bearings"][0]["radioBearing"], 12.5);
        assert_eq!(value["result"]["stationsUsed"][1], 3827);
        assert_eq!(value["result"]["estimatedLocation"]["latitude"], 50.85);

        let parsed: BearingUpdate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.result.stations_used, vec![3826, 3827]);
        assert_eq!(parsed.bearings[1].doa_array.len(), 360);
    }

    #[test]
    fn test_csv_format() {
        let csv = CsvFormatter::new().format(&update()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CsvFormatter::new().header());
        assert_eq!(lines[1].split(',').count(), lines[0].split(',').count());
        assert!(lines[2].starts_with("1700000000000,3827,"));

        let rows = CsvFormatter::without_header().format(&update()).unwrap();
        assert_eq!(rows.lines().count(), 2);
    }

    #[test]
    fn test_output_format_selects_formatter() {
        let json = OutputFormat::Json.formatter().format(&update()).unwrap();
        assert!(json.starts_with('{'));
        let csv = OutputFormat::Csv.formatter().format(&update()).unwrap();
        assert!(csv.starts_with("timestamp_ms"));
        let text = OutputFormat::Text.formatter_with(true).format(&update()).unwrap();
        assert!(text.starts_with("Update @"));
    }

    #[test]
    fn test_pretty_json() {
        let compact = JsonFormatter::new().format(&update()).unwrap();
        let pretty = OutputFormat::Json.formatter_with(true).format(&update()).unwrap();
        assert!(!compact.contains('\n'));
        assert!(pretty.contains("\n  \"bearings\": ["));

        let a: serde_json::Value = serde_json::from_str(&compact).unwrap();
        let b: serde_json::Value = serde_json::from_str(&pretty).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_text_lines_terminated() {
        let text = TextFormatter::new().format(&update()).unwrap();
        assert!(text.ends_with("Heatmap:    1 tiles\n"));
        assert_eq!(text.lines().count(), 8);

        let compact = TextFormatter::compact().format(&update()).unwrap();
        assert_eq!(
            compact,
            "Fix: 50.850000°N, 7.050000°E | Conf:9.5 | Bearings:2 | Tiles:1"
        );
    }
}
