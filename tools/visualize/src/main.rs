//! Diagnostic visualizer — writes one heat-map PNG per raster in a stack.
//! Not part of the main pipeline; no tests, no clippy target.

use std::env;
use std::fs;
use std::path::Path;

use lst_core::Raster;

/// Temperature (°C) → cold-blue → hot-red ramp over [15, 40] °C.
/// Masked pixels render grey.
fn temp_to_rgb(celsius: f32) -> [u8; 3] {
    if !celsius.is_finite() {
        return [128, 128, 128];
    }
    let t = ((celsius - 15.0) / 25.0).clamp(0.0, 1.0);
    let r = (255.0 * t) as u8;
    let b = (255.0 * (1.0 - t)) as u8;
    let g = (90.0 + 60.0 * (1.0 - (2.0 * t - 1.0).abs())) as u8;
    [r, g, b]
}

fn main() {
    let mut args = env::args().skip(1);
    let stack_path = args.next().unwrap_or_else(|| "data/stack.json".to_string());
    let out_dir = args.next().unwrap_or_else(|| "data/maps".to_string());

    let text = fs::read_to_string(&stack_path)
        .unwrap_or_else(|e| panic!("cannot read {stack_path}: {e}"));
    let rasters: Vec<Raster> =
        serde_json::from_str(&text).unwrap_or_else(|e| panic!("cannot parse {stack_path}: {e}"));
    println!("Loaded {} rasters", rasters.len());

    let out_dir = Path::new(&out_dir);
    fs::create_dir_all(out_dir).expect("cannot create output directory");

    for raster in &rasters {
        let mut img = image::RgbImage::new(raster.width as u32, raster.height as u32);
        for r in 0..raster.height {
            for c in 0..raster.width {
                let [rv, gv, bv] = temp_to_rgb(raster.get(r, c));
                img.put_pixel(c as u32, r as u32, image::Rgb([rv, gv, bv]));
            }
        }
        let name = format!("lst_{}_{:02}.png", raster.stamp.year, raster.stamp.month);
        let path = out_dir.join(&name);
        img.save(&path).expect("failed to save PNG");
        println!("Wrote {}", path.display());
    }
}
