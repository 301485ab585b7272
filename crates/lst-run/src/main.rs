//! Pipeline runner: loads a serialized raster stack and runs either the
//! climatology or the projection mode, writing chart-series JSON.

use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;

use lst_core::pipeline::{
    run_climatology, run_projection, ClimatologyParams, ProjectionParams,
};
use lst_core::series::{Region, SeriesPoint, SeriesSink};
use lst_core::source::StackSource;
use lst_core::{Raster, TrendError};

#[derive(Parser, Debug)]
#[command(
    name = "lst-run",
    about = "Run the LST climatology/projection pipeline on a raster stack"
)]
struct Args {
    /// Raster stack JSON (array of tagged rasters; null = masked pixel).
    #[arg(short, long)]
    stack: String,

    #[arg(short, long, value_enum, default_value_t = Mode::Climatology)]
    mode: Mode,

    /// Climatology year windows, e.g. "2001-2010,2011-2020".
    #[arg(long, default_value = "2001-2010,2011-2020")]
    windows: String,

    /// Projection training window, e.g. "2001-2020".
    #[arg(long, default_value = "2001-2020")]
    training: String,

    /// Reference year anchoring the extrapolation.
    #[arg(long, default_value_t = 2020)]
    base_year: i32,

    /// Projection target years.
    #[arg(long, value_delimiter = ',', default_values_t = vec![2028, 2029, 2030])]
    target_years: Vec<i32>,

    /// Chart region "min_lon,min_lat,max_lon,max_lat" (whole raster if omitted).
    #[arg(long)]
    region: Option<String>,

    /// Output series JSON.
    #[arg(short, long, default_value = "data/series.json")]
    output: String,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    Climatology,
    Projection,
}

// ── Series output ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct NamedSeries {
    label: String,
    points: Vec<SeriesPoint>,
}

/// Collects rendered series in memory, then written out as one JSON file.
#[derive(Default)]
struct JsonSeriesSink {
    series: Vec<NamedSeries>,
}

impl SeriesSink for JsonSeriesSink {
    fn render(&mut self, title: &str, points: &[SeriesPoint]) -> Result<(), TrendError> {
        self.series.push(NamedSeries {
            label: title.to_string(),
            points: points.to_vec(),
        });
        Ok(())
    }
}

// ── Flag parsing ──────────────────────────────────────────────────────────────

fn parse_range(s: &str) -> Result<RangeInclusive<i32>> {
    let (a, b) = s
        .split_once('-')
        .with_context(|| format!("bad year range '{s}', expected START-END"))?;
    let start: i32 = a.trim().parse().with_context(|| format!("bad year '{a}'"))?;
    let end: i32 = b.trim().parse().with_context(|| format!("bad year '{b}'"))?;
    Ok(start..=end)
}

fn parse_region(s: &str) -> Result<Region> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .with_context(|| format!("bad region '{s}'"))?;
    if parts.len() != 4 {
        anyhow::bail!("bad region '{s}', expected min_lon,min_lat,max_lon,max_lat");
    }
    Ok(Region {
        min_lon: parts[0],
        min_lat: parts[1],
        max_lon: parts[2],
        max_lat: parts[3],
    })
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    let text = fs::read_to_string(&args.stack)
        .with_context(|| format!("cannot read stack {}", args.stack))?;
    let rasters: Vec<Raster> =
        serde_json::from_str(&text).with_context(|| format!("cannot parse {}", args.stack))?;
    eprintln!("Loaded {} rasters from {}", rasters.len(), args.stack);

    let region = args.region.as_deref().map(parse_region).transpose()?;
    let source = StackSource::new(rasters);
    let mut sink = JsonSeriesSink::default();

    match args.mode {
        Mode::Climatology => {
            let windows = args
                .windows
                .split(',')
                .map(parse_range)
                .collect::<Result<Vec<_>>>()?;
            let params = ClimatologyParams {
                windows,
                region,
                ..ClimatologyParams::default()
            };
            let result = run_climatology(&source, &params)?;
            for w in &result.windows {
                eprintln!(
                    "Window {}-{}: {} monthly means",
                    w.years.start(),
                    w.years.end(),
                    w.means.len()
                );
                sink.render(
                    &format!("{}-{}", w.years.start(), w.years.end()),
                    &w.series,
                )?;
            }
        }
        Mode::Projection => {
            let params = ProjectionParams {
                training_years: parse_range(&args.training)?,
                base_year: args.base_year,
                target_years: args.target_years.clone(),
                region,
                ..ProjectionParams::default()
            };
            let result = run_projection(&source, &params)?;
            eprintln!(
                "Fitted {} monthly slopes, projected {} rasters",
                result.slopes.len(),
                result.projections.len()
            );
            let lo = args.target_years.iter().min().copied().unwrap_or(0);
            let hi = args.target_years.iter().max().copied().unwrap_or(0);
            sink.render(&format!("projected {lo}-{hi}"), &result.series)?;
        }
    }

    let out_path = Path::new(&args.output);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&sink.series)?;
    fs::write(out_path, json).with_context(|| format!("cannot write {}", args.output))?;
    eprintln!("Wrote {}", args.output);

    Ok(())
}
