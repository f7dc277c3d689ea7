//! Geographic helpers: distances, headings, and polyline resampling.

use geo::HaversineDistance;
use geo::HaversineIntermediate;
use geo::Point;

/// A polyline vertex as (lat, lon) in degrees.
pub type LatLon = (f64, f64);

pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let p1 = Point::new(lon1, lat1);
    let p2 = Point::new(lon2, lat2);
    p1.haversine_distance(&p2)
}

/// Total length of a polyline in meters.
pub fn polyline_length(shape: &[LatLon]) -> f64 {
    shape
        .windows(2)
        .map(|w| haversine_distance(w[0].0, w[0].1, w[1].0, w[1].1))
        .sum()
}

/// Turn angle in degrees [0, 360) when arriving with heading `from`
/// and leaving with heading `to`. 0 is straight through.
pub fn turn_degree(from: u16, to: u16) -> u16 {
    (((360 + to as u32) - from as u32) % 360) as u16
}

/// Resample a polyline at a fixed interval along its length.
///
/// The first input point is always kept; subsequent samples are placed
/// every `interval_m` meters along the great-circle arc of each
/// segment, and the final input point closes the result. Used to post
/// elevation samples at an even spacing.
pub fn resample_polyline(shape: &[LatLon], interval_m: f64) -> Vec<LatLon> {
    if shape.len() < 2 || interval_m <= 0.0 {
        return shape.to_vec();
    }

    let mut result = vec![shape[0]];
    let mut residual = 0.0; // distance already covered toward the next sample

    for w in shape.windows(2) {
        let (lat0, lon0) = w[0];
        let (lat1, lon1) = w[1];
        let seg_len = haversine_distance(lat0, lon0, lat1, lon1);
        if seg_len < 1e-9 {
            continue;
        }

        let start = Point::new(lon0, lat0);
        let end = Point::new(lon1, lat1);
        let mut along = interval_m - residual;
        while along < seg_len {
            let frac = along / seg_len;
            let p = start.haversine_intermediate(&end, frac);
            result.push((p.y(), p.x()));
            along += interval_m;
        }
        residual = seg_len - (along - interval_m);
    }

    result.push(*shape.last().unwrap());
    result
}
