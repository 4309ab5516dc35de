//! Ramer-Douglas-Peucker density reduction for charting.
//!
//! Distance is the vertical deviation from the chord between a range's
//! endpoints, not the Euclidean perpendicular: timestamps are strictly
//! increasing, so X is monotonic and the vertical form is sufficient.

use crate::model::DataPoint;

const EPSILON_GROWTH: f64 = 1.5;
const MAX_PASSES: usize = 10;

/// Reduces an ascending series to at most `max_points` points where
/// possible, preserving the first and last point and returning a
/// subsequence of the input in original order. Series of two points or
/// fewer are returned unchanged.
pub fn reduce(points: &[DataPoint], max_points: usize) -> Vec<DataPoint> {
    if points.len() <= 2 {
        return points.to_vec();
    }
    let max_points = max_points.max(2);

    let projected: Vec<(i64, f64)> = points
        .iter()
        .map(|p| (p.timestamp.timestamp_millis(), p.value))
        .collect();

    let mut epsilon = (points.len() as f64 / max_points as f64) * 0.1;
    let mut best: Option<Vec<usize>> = None;
    for _ in 0..MAX_PASSES {
        let kept = simplify(&projected, epsilon);
        let done = kept.len() <= max_points;
        if best.as_ref().map(|b| kept.len() < b.len()).unwrap_or(true) {
            best = Some(kept);
        }
        if done {
            break;
        }
        epsilon *= EPSILON_GROWTH;
    }

    best.unwrap_or_default()
        .into_iter()
        .map(|i| points[i].clone())
        .collect()
}

/// One simplification pass; returns the kept indices in ascending order.
fn simplify(points: &[(i64, f64)], epsilon: f64) -> Vec<usize> {
    let mut kept = Vec::new();
    simplify_range(points, 0, points.len() - 1, epsilon, &mut kept);
    // The recursion only ever keeps range starts; the final point is
    // appended exactly once here so both endpoints always survive.
    kept.push(points.len() - 1);
    kept
}

fn simplify_range(
    points: &[(i64, f64)],
    start: usize,
    end: usize,
    epsilon: f64,
    kept: &mut Vec<usize>,
) {
    if start + 1 >= end {
        kept.push(start);
        return;
    }

    let dx = (points[end].0 - points[start].0) as f64;
    let slope = if dx == 0.0 {
        0.0
    } else {
        (points[end].1 - points[start].1) / dx
    };

    let mut max_distance = -1.0f64;
    let mut max_index = start;
    for i in start + 1..end {
        let chord_y = points[start].1 + slope * (points[i].0 - points[start].0) as f64;
        let distance = (points[i].1 - chord_y).abs();
        if distance > max_distance {
            max_distance = distance;
            max_index = i;
        }
    }

    if max_distance < epsilon {
        kept.push(start);
        return;
    }

    simplify_range(points, start, max_index, epsilon, kept);
    simplify_range(points, max_index, end, epsilon, kept);
}
