use std::path::PathBuf;

use anyhow::{Context, Result};
use chronolane_core::LayoutConfig;
use clap::Parser;

/// Lay out and browse a timeline of people and events
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Timeline document (JSON)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Layout tuning values (JSON); missing fields keep their defaults
    #[arg(short = 'c', long = "config", value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the rendered timeline as SVG instead of opening the viewer
    #[arg(long = "svg", value_name = "OUT")]
    pub svg: Option<PathBuf>,

    /// Write the computed lane layout as JSON ("-" for stdout)
    #[arg(long = "layout-json", value_name = "OUT")]
    pub layout_json: Option<PathBuf>,

    /// Width of exported images, in pixels
    #[arg(long = "width", value_name = "PX", default_value_t = 1200.0)]
    pub width: f64,

    /// Use the light palette for SVG export
    #[arg(long = "light")]
    pub light: bool,

    /// Visible year window, overriding the one stored in the document
    #[arg(long = "range", value_names = ["START", "END"], num_args = 2, allow_negative_numbers = true)]
    pub range: Option<Vec<i32>>,

    /// Year that closes the life span of living people (default: this year)
    #[arg(long = "now", value_name = "YEAR", allow_negative_numbers = true)]
    pub now: Option<i32>,

    /// Vertical distance between rows, in pixels
    #[arg(long = "row-spacing", value_name = "PX")]
    pub row_spacing: Option<f64>,

    /// Rows searched up and down for a free slot while dragging
    #[arg(long = "max-search-steps", value_name = "N")]
    pub max_search_steps: Option<u32>,

    /// Widest visible year range at which labels are drawn
    #[arg(long = "label-threshold", value_name = "YEARS")]
    pub label_threshold: Option<f64>,

    /// Write logs to this file instead of stderr (filter with CHRONOLANE_LOG)
    #[arg(short = 'l', long = "log-file", value_name = "LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    /// The config file (if any) with command-line overrides applied.
    pub fn layout_config(&self) -> Result<LayoutConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let data = std::fs::read(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                LayoutConfig::from_json(&data)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => LayoutConfig::default(),
        };
        if let Some(spacing) = self.row_spacing {
            config.row_spacing_px = spacing;
        }
        if let Some(steps) = self.max_search_steps {
            config.max_search_steps = steps;
        }
        if let Some(threshold) = self.label_threshold {
            config.label_year_range_threshold = threshold;
        }
        Ok(config)
    }

    pub fn year_range(&self) -> Option<(i32, i32)> {
        match self.range.as_deref() {
            Some(&[start, end]) if start < end => Some((start, end)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let args = Args::parse_from([
            "chronolane",
            "timeline.json",
            "--row-spacing",
            "40",
            "--max-search-steps",
            "5",
        ]);
        let config = args.layout_config().unwrap();
        assert_eq!(config.row_spacing_px, 40.0);
        assert_eq!(config.max_search_steps, 5);
        assert_eq!(config.lane_margin_px, 100.0);
    }

    #[test]
    fn range_accepts_bce_years() {
        let args = Args::parse_from(["chronolane", "t.json", "--range", "-500", "100"]);
        assert_eq!(args.year_range(), Some((-500, 100)));

        let args = Args::parse_from(["chronolane", "t.json", "--range", "100", "50"]);
        assert_eq!(args.year_range(), None);
    }
}
