use crate::models::GeoPoint;

/// Downsample a polyline to roughly `max_points` by stride sampling.
///
/// Input at or under the budget is returned unchanged. Otherwise every
/// `ceil(len / max_points)`-th point is kept and the final point is always
/// appended, so the output holds at most `max_points + 1` points and keeps
/// the first and last input points exactly. A zero budget is treated as 1.
pub fn simplify(points: &[GeoPoint], max_points: usize) -> Vec<GeoPoint> {
    let max_points = max_points.max(1);

    if points.len() <= max_points {
        return points.to_vec();
    }

    let step = points.len().div_ceil(max_points);
    let last_index = points.len() - 1;

    let mut simplified: Vec<GeoPoint> = points.iter().step_by(step).copied().collect();
    if last_index % step != 0 {
        simplified.push(points[last_index]);
    }

    tracing::debug!(
        input_points = points.len(),
        output_points = simplified.len(),
        step = step,
        "Simplified route polyline"
    );

    simplified
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: usize) -> Vec<GeoPoint> {
        (0..n)
            .map(|i| GeoPoint {
                lat: 32.0 + i as f64 * 0.001,
                lng: 13.0 + i as f64 * 0.0005,
            })
            .collect()
    }

    #[test]
    fn test_short_input_is_unchanged() {
        let points = line(3);
        assert_eq!(simplify(&points, 50), points);
        assert_eq!(simplify(&line(50), 50).len(), 50);
    }

    #[test]
    fn test_long_input_respects_budget_and_endpoints() {
        for n in [51, 99, 100, 101, 487, 1000, 4321] {
            let points = line(n);
            let simplified = simplify(&points, 50);
            assert!(simplified.len() <= 51, "n={n} gave {}", simplified.len());
            assert_eq!(simplified.first(), points.first());
            assert_eq!(simplified.last(), points.last());
        }
    }

    #[test]
    fn test_last_point_not_duplicated_when_stride_lands_on_it() {
        // 101 points, step 3: indices 0,3,...,99 then 100 forced
        let points = line(101);
        let simplified = simplify(&points, 50);
        assert_eq!(simplified.len(), 35);

        // 99 points, step 2: indices 0,2,...,98 land on the last point
        let points = line(99);
        let simplified = simplify(&points, 50);
        assert_eq!(simplified.len(), 50);
        assert_eq!(simplified.last(), points.last());
    }

    #[test]
    fn test_budget_of_one_keeps_endpoints() {
        let points = line(10);
        assert_eq!(simplify(&points, 1), vec![points[0], points[9]]);
        // Zero behaves like one
        assert_eq!(simplify(&points, 0), vec![points[0], points[9]]);
        assert_eq!(simplify(&line(1), 1), line(1));
    }
}
