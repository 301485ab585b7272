//! Series chart renderer: draws the region-mean series JSON produced by
//! lst-run as a PNG line chart, one polyline per year (month on the x
//! axis), mirroring the seriesByRegion charts this pipeline replaces.

use std::collections::BTreeMap;
use std::fs;

use anyhow::{bail, Context, Result};
use clap::Parser;
use image::{Rgb, RgbImage};
use serde::Deserialize;

use lst_core::series::SeriesPoint;

#[derive(Parser, Debug)]
#[command(name = "chart", about = "Render a monthly series JSON as a PNG line chart")]
struct Args {
    /// Series JSON from lst-run.
    #[arg(short, long)]
    input: String,

    /// Output PNG path.
    #[arg(short, long, default_value = "data/chart.png")]
    output: String,

    #[arg(long, default_value_t = 960)]
    width: u32,

    #[arg(long, default_value_t = 540)]
    height: u32,
}

#[derive(Deserialize)]
struct NamedSeries {
    #[allow(dead_code)]
    label: String,
    points: Vec<SeriesPoint>,
}

const MARGIN: u32 = 50;

/// Distinct line colours, cycled per year.
const PALETTE: [[u8; 3]; 10] = [
    [214, 39, 40],
    [31, 119, 180],
    [44, 160, 44],
    [255, 127, 14],
    [148, 103, 189],
    [140, 86, 75],
    [227, 119, 194],
    [127, 127, 127],
    [188, 189, 34],
    [23, 190, 207],
];

fn draw_line(img: &mut RgbImage, x0: f32, y0: f32, x1: f32, y1: f32, color: Rgb<u8>) {
    let steps = ((x1 - x0).abs().max((y1 - y0).abs()).ceil() as u32).max(1);
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let x = (x0 + (x1 - x0) * t).round() as i64;
        let y = (y0 + (y1 - y0) * t).round() as i64;
        if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
            img.put_pixel(x as u32, y as u32, color);
        }
    }
}

fn draw_marker(img: &mut RgbImage, x: f32, y: f32, color: Rgb<u8>) {
    for dx in -1i64..=1 {
        for dy in -1i64..=1 {
            let px = x.round() as i64 + dx;
            let py = y.round() as i64 + dy;
            if px >= 0 && py >= 0 && (px as u32) < img.width() && (py as u32) < img.height() {
                img.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input))?;
    let series: Vec<NamedSeries> =
        serde_json::from_str(&text).with_context(|| format!("cannot parse {}", args.input))?;

    // One polyline per year, across months 1–12.
    let mut by_year: BTreeMap<i32, Vec<(u32, f32)>> = BTreeMap::new();
    for s in &series {
        for p in &s.points {
            if let Some(v) = p.value {
                by_year.entry(p.year).or_default().push((p.month, v));
            }
        }
    }
    if by_year.is_empty() {
        bail!("no plottable points in {}", args.input);
    }

    let (mut lo, mut hi) = (f32::INFINITY, f32::NEG_INFINITY);
    for pts in by_year.values() {
        for &(_, v) in pts {
            lo = lo.min(v);
            hi = hi.max(v);
        }
    }
    // Pad the value axis so flat series do not degenerate.
    let pad = ((hi - lo) * 0.1).max(0.5);
    let (lo, hi) = (lo - pad, hi + pad);

    let (w, h) = (args.width, args.height);
    let mut img = RgbImage::from_pixel(w, h, Rgb([255, 255, 255]));

    let plot_w = (w - 2 * MARGIN) as f32;
    let plot_h = (h - 2 * MARGIN) as f32;
    let x_of = |month: u32| MARGIN as f32 + (month - 1) as f32 / 11.0 * plot_w;
    let y_of = |v: f32| MARGIN as f32 + (1.0 - (v - lo) / (hi - lo)) * plot_h;

    // Axes.
    let axis = Rgb([60, 60, 60]);
    draw_line(
        &mut img,
        MARGIN as f32,
        (h - MARGIN) as f32,
        (w - MARGIN) as f32,
        (h - MARGIN) as f32,
        axis,
    );
    draw_line(
        &mut img,
        MARGIN as f32,
        MARGIN as f32,
        MARGIN as f32,
        (h - MARGIN) as f32,
        axis,
    );
    // Month ticks.
    for month in 1..=12u32 {
        let x = x_of(month);
        draw_line(
            &mut img,
            x,
            (h - MARGIN) as f32,
            x,
            (h - MARGIN + 5) as f32,
            axis,
        );
    }

    for (idx, (year, pts)) in by_year.iter().enumerate() {
        let mut pts = pts.clone();
        pts.sort_by_key(|&(m, _)| m);
        let color = Rgb(PALETTE[idx % PALETTE.len()]);
        for pair in pts.windows(2) {
            let (m0, v0) = pair[0];
            let (m1, v1) = pair[1];
            draw_line(&mut img, x_of(m0), y_of(v0), x_of(m1), y_of(v1), color);
        }
        for &(m, v) in &pts {
            draw_marker(&mut img, x_of(m), y_of(v), color);
        }
        eprintln!("Series {year}: {} points", pts.len());
    }

    if let Some(parent) = std::path::Path::new(&args.output).parent() {
        fs::create_dir_all(parent)?;
    }
    img.save(&args.output)
        .with_context(|| format!("cannot write {}", args.output))?;
    eprintln!("Wrote {}", args.output);

    Ok(())
}
