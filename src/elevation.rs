//! Terrain height sampling and grade computation for shortcut edges.
//!
//! The hierarchy builder only needs two things from elevation data: a
//! batch height lookup along a resampled polyline, and a grade summary
//! (mean, max up, max down) over those heights. The `Sampler` trait
//! keeps the data source pluggable; `HgtSampler` reads a directory of
//! SRTM-style `.hgt` tiles (1x1 degree, big-endian i16, row 0 north).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;

use crate::geo::{resample_polyline, LatLon};
use crate::graph::edge::FLAT_GRADE;

/// Height posting interval along shortcut shapes, meters.
pub const POSTING_INTERVAL: f64 = 60.0;

/// No grade is computed for edges shorter than this.
const MINIMUM_INTERVAL: f64 = 10.0;

/// Grades are clamped to this range, percent.
const MIN_GRADE: f64 = -10.0;
const MAX_GRADE: f64 = 15.0;

pub trait Sampler {
    /// Heights in meters for each polyline vertex. Vertices with no
    /// coverage sample as 0.
    fn get_all(&self, shape: &[LatLon]) -> Vec<f64>;
}

/// Grade summary over evenly spaced height postings: mean grade, max
/// upward grade, max downward grade, all in percent. With a fixed
/// posting interval every segment carries equal weight.
pub fn weighted_grade(heights: &[f64], interval_m: f64) -> (f64, f64, f64) {
    if heights.len() < 2 || interval_m <= 0.0 {
        return (0.0, 0.0, 0.0);
    }
    let mut sum = 0.0;
    let mut max_up = 0.0f64;
    let mut max_down = 0.0f64;
    for w in heights.windows(2) {
        let grade = ((w[1] - w[0]) / interval_m * 100.0).clamp(MIN_GRADE, MAX_GRADE);
        sum += grade;
        max_up = max_up.max(grade);
        max_down = max_down.min(grade);
    }
    (sum / (heights.len() - 1) as f64, max_up, max_down)
}

/// Compress a mean grade to the 4-bit code stored on an edge; 6 means
/// flat.
pub fn compress_grade(mean: f64) -> u8 {
    ((mean * 0.6 + 6.5) as i32).clamp(0, 15) as u8
}

/// Grade attributes for a shortcut shape: (compressed mean code,
/// max up slope, max down slope). `forward` tells whether the chain
/// was traversed in shape order; heights are reversed otherwise.
pub fn grade_for_shape(
    sampler: &dyn Sampler,
    shape: &[LatLon],
    length: f64,
    forward: bool,
) -> (u8, i8, i8) {
    if length < MINIMUM_INTERVAL || shape.len() < 2 {
        return (FLAT_GRADE, 0, 0);
    }

    // Evenly sample the shape; if it is really short just use the ends.
    let (resampled, interval) = if length < POSTING_INTERVAL * 3.0 {
        (vec![shape[0], *shape.last().unwrap()], length)
    } else {
        (resample_polyline(shape, POSTING_INTERVAL), POSTING_INTERVAL)
    };

    let mut heights = sampler.get_all(&resampled);
    if !forward {
        heights.reverse();
    }
    let (mean, up, down) = weighted_grade(&heights, interval);
    (
        compress_grade(mean),
        up.round() as i8,
        down.round() as i8,
    )
}

/// Void value in .hgt tiles.
const HGT_VOID: i16 = -32768;

struct HgtTile {
    samples_per_side: usize,
    data: Vec<i16>,
}

impl HgtTile {
    /// Nearest-sample height, or None for voids.
    fn height_at(&self, frac_lat: f64, frac_lon: f64) -> Option<f64> {
        let n = self.samples_per_side;
        // Row 0 is the northern edge.
        let row = (((1.0 - frac_lat) * (n - 1) as f64).round() as usize).min(n - 1);
        let col = ((frac_lon * (n - 1) as f64).round() as usize).min(n - 1);
        let v = self.data[row * n + col];
        if v == HGT_VOID {
            None
        } else {
            Some(f64::from(v))
        }
    }
}

/// Height sampler over a directory of `.hgt` files named by their SW
/// corner (`N40W077.hgt`).
pub struct HgtSampler {
    tiles: HashMap<(i16, i16), HgtTile>,
}

impl HgtSampler {
    pub fn from_dir(dir: &Path) -> Result<HgtSampler> {
        let mut tiles = HashMap::new();
        let entries =
            fs::read_dir(dir).with_context(|| format!("opening elevation dir {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) if n.to_ascii_lowercase().ends_with(".hgt") => n.to_string(),
                _ => continue,
            };
            let Some(corner) = parse_hgt_name(&name) else {
                warn!("skipping unrecognized hgt file name {}", name);
                continue;
            };
            let raw = fs::read(&path)
                .with_context(|| format!("reading elevation tile {}", path.display()))?;
            let samples = raw.len() / 2;
            let side = (samples as f64).sqrt() as usize;
            if side * side != samples || side < 2 {
                warn!("skipping {}: not a square sample grid", name);
                continue;
            }
            let data = raw
                .chunks_exact(2)
                .map(|p| i16::from_be_bytes([p[0], p[1]]))
                .collect();
            tiles.insert(
                corner,
                HgtTile {
                    samples_per_side: side,
                    data,
                },
            );
        }
        Ok(HgtSampler { tiles })
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }
}

impl Sampler for HgtSampler {
    fn get_all(&self, shape: &[LatLon]) -> Vec<f64> {
        shape
            .iter()
            .map(|&(lat, lon)| {
                let corner = (lat.floor() as i16, lon.floor() as i16);
                self.tiles
                    .get(&corner)
                    .and_then(|t| t.height_at(lat - lat.floor(), lon - lon.floor()))
                    .unwrap_or(0.0)
            })
            .collect()
    }
}

/// Parse `N40W077` / `S12E004` style names into the SW corner.
fn parse_hgt_name(name: &str) -> Option<(i16, i16)> {
    let stem = name.strip_suffix(".hgt").or_else(|| name.strip_suffix(".HGT"))?;
    if stem.len() != 7 {
        return None;
    }
    let bytes = stem.as_bytes();
    let lat_sign = match bytes[0] {
        b'N' | b'n' => 1i16,
        b'S' | b's' => -1i16,
        _ => return None,
    };
    let lat: i16 = stem[1..3].parse().ok()?;
    let lon_sign = match bytes[3] {
        b'E' | b'e' => 1i16,
        b'W' | b'w' => -1i16,
        _ => return None,
    };
    let lon: i16 = stem[4..7].parse().ok()?;
    Some((lat_sign * lat, lon_sign * lon))
}

/// Fixed-height sampler for tests and dry runs.
pub struct ConstantSampler(pub f64);

impl Sampler for ConstantSampler {
    fn get_all(&self, shape: &[LatLon]) -> Vec<f64> {
        vec![self.0; shape.len()]
    }
}
