//! Connection curve geometry.
//!
//! Connections are drawn as cubic Béziers whose control points sit half the
//! horizontal delta away from each endpoint, which yields an S-curve for any
//! relative placement of the two ports.

use egui::Pos2;

/// One connection curve in a single coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionCurve {
    pub from: Pos2,
    pub to: Pos2,
}

impl ConnectionCurve {
    pub fn new(from: Pos2, to: Pos2) -> Self {
        Self { from, to }
    }

    /// The four Bézier control points `[p0, c1, c2, p3]`.
    pub fn control_points(&self) -> [Pos2; 4] {
        let dx = (self.to.x - self.from.x) * 0.5;
        [
            self.from,
            Pos2::new(self.from.x + dx, self.from.y),
            Pos2::new(self.to.x - dx, self.to.y),
            self.to,
        ]
    }

    /// Flatten the curve into `segments + 1` points.
    pub fn points(&self, segments: usize) -> Vec<Pos2> {
        let [p0, p1, p2, p3] = self.control_points();
        bezier_points(p0, p1, p2, p3, segments.max(1))
    }

    /// Shortest distance from `point` to the flattened curve.
    pub fn distance_to(&self, point: Pos2, segments: usize) -> f32 {
        self.points(segments)
            .windows(2)
            .map(|w| distance_to_segment(point, w[0], w[1]))
            .fold(f32::INFINITY, f32::min)
    }

    /// Map both endpoints through `f` (e.g. world to screen).
    pub fn map(self, f: impl Fn(Pos2) -> Pos2) -> Self {
        Self::new(f(self.from), f(self.to))
    }
}

/// Compute points along a cubic bezier curve.
pub fn bezier_points(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, segments: usize) -> Vec<Pos2> {
    (0..=segments)
        .map(|i| {
            let t = i as f32 / segments as f32;
            let u = 1.0 - t;
            let tt = t * t;
            let uu = u * u;
            let uuu = uu * u;
            let ttt = tt * t;
            Pos2::new(
                uuu * p0.x + 3.0 * uu * t * p1.x + 3.0 * u * tt * p2.x + ttt * p3.x,
                uuu * p0.y + 3.0 * uu * t * p1.y + 3.0 * u * tt * p2.y + ttt * p3.y,
            )
        })
        .collect()
}

fn distance_to_segment(p: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_points_offset_by_half_delta() {
        let curve = ConnectionCurve::new(Pos2::new(0.0, 0.0), Pos2::new(100.0, 50.0));
        let [p0, c1, c2, p3] = curve.control_points();
        assert_eq!(p0, Pos2::new(0.0, 0.0));
        assert_eq!(c1, Pos2::new(50.0, 0.0));
        assert_eq!(c2, Pos2::new(50.0, 50.0));
        assert_eq!(p3, Pos2::new(100.0, 50.0));
    }

    #[test]
    fn test_backwards_curve_still_s_shaped() {
        let curve = ConnectionCurve::new(Pos2::new(100.0, 0.0), Pos2::new(0.0, 40.0));
        let [_, c1, c2, _] = curve.control_points();
        assert_eq!(c1, Pos2::new(50.0, 0.0));
        assert_eq!(c2, Pos2::new(50.0, 40.0));
    }

    #[test]
    fn test_points_hit_endpoints() {
        let curve = ConnectionCurve::new(Pos2::new(10.0, 10.0), Pos2::new(90.0, 70.0));
        let pts = curve.points(16);
        assert_eq!(pts.len(), 17);
        assert_eq!(pts[0], curve.from);
        assert!((pts[16] - curve.to).length() < 1e-3);
    }

    #[test]
    fn test_distance_to_curve() {
        let curve = ConnectionCurve::new(Pos2::new(0.0, 0.0), Pos2::new(100.0, 0.0));
        assert!(curve.distance_to(Pos2::new(50.0, 0.0), 24) < 1e-3);
        assert!((curve.distance_to(Pos2::new(50.0, 10.0), 24) - 10.0).abs() < 1e-3);
    }
}
