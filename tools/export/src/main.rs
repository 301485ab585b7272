//! Raster export tool: writes each raster of a stack as a 32-bit float
//! grey-scale TIFF plus a JSON sidecar with bounds and timestamp — the
//! storage-export surface of the pipeline.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tiff::encoder::{colortype, TiffEncoder};

use lst_core::source::RasterSink;
use lst_core::{Raster, TrendError};

#[derive(Parser, Debug)]
#[command(name = "export", about = "Export a raster stack as float TIFFs with JSON sidecars")]
struct Args {
    /// Raster stack JSON (array of tagged rasters).
    #[arg(short, long)]
    stack: String,

    /// Output directory.
    #[arg(short, long, default_value = "data/export")]
    output: String,

    /// Description prefix for file names.
    #[arg(short, long, default_value = "lst")]
    description: String,
}

#[derive(Serialize)]
struct Sidecar<'a> {
    description: &'a str,
    year: i32,
    month: u32,
    millis: i64,
    min_lon: f64,
    max_lon: f64,
    min_lat: f64,
    max_lat: f64,
    width: usize,
    height: usize,
    crs: &'static str,
}

/// Writes TIFF + sidecar pairs into a directory.
struct TiffSink {
    out_dir: PathBuf,
}

impl RasterSink for TiffSink {
    fn export(&mut self, raster: &Raster, description: &str) -> Result<(), TrendError> {
        let tiff_path = self.out_dir.join(format!("{description}.tif"));
        let file = fs::File::create(&tiff_path)
            .map_err(|e| TrendError::Sink(format!("{}: {e}", tiff_path.display())))?;
        let mut encoder = TiffEncoder::new(file)
            .map_err(|e| TrendError::Sink(format!("{}: {e}", tiff_path.display())))?;
        encoder
            .write_image::<colortype::Gray32Float>(
                raster.width as u32,
                raster.height as u32,
                &raster.data,
            )
            .map_err(|e| TrendError::Sink(format!("{}: {e}", tiff_path.display())))?;

        let sidecar = Sidecar {
            description,
            year: raster.stamp.year,
            month: raster.stamp.month,
            millis: raster.stamp.millis,
            min_lon: raster.min_lon,
            max_lon: raster.max_lon,
            min_lat: raster.min_lat,
            max_lat: raster.max_lat,
            width: raster.width,
            height: raster.height,
            crs: "EPSG:4326",
        };
        let json_path = self.out_dir.join(format!("{description}.json"));
        let json = serde_json::to_string_pretty(&sidecar)
            .map_err(|e| TrendError::Sink(e.to_string()))?;
        fs::write(&json_path, json)
            .map_err(|e| TrendError::Sink(format!("{}: {e}", json_path.display())))?;
        Ok(())
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let text = fs::read_to_string(&args.stack)
        .with_context(|| format!("cannot read {}", args.stack))?;
    let rasters: Vec<Raster> =
        serde_json::from_str(&text).with_context(|| format!("cannot parse {}", args.stack))?;

    let out_dir = PathBuf::from(&args.output);
    fs::create_dir_all(&out_dir).with_context(|| format!("cannot create {}", args.output))?;
    let mut sink = TiffSink {
        out_dir: out_dir.clone(),
    };

    for raster in &rasters {
        let name = format!(
            "{}_{}_{:02}",
            args.description, raster.stamp.year, raster.stamp.month
        );
        sink.export(raster, &name)?;
        eprintln!("Exported {name}");
    }
    eprintln!("{} rasters exported to {}", rasters.len(), args.output);

    Ok(())
}
