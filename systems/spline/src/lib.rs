#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Catmull-Rom smoothing of discrete waypoint lists into continuous motion.
//!
//! The curve parameter `t` in `[0, 1]` is spread uniformly over the control
//! points: waypoint `k` of `n` sits at `t = k / (n - 1)`. Indices outside the
//! point list are clamped to the first and last point, so the curve starts and
//! ends exactly on the path's endpoints and never extrapolates past them.

use glam::Vec3;

const PROJECTION_EPSILON: f32 = 1e-5;
const LOCATE_SAMPLES: usize = 16;
const LOCATE_REFINE_STEPS: usize = 32;

/// Read-only view over a non-empty list of control points.
#[derive(Clone, Copy, Debug)]
pub struct SplineCurve<'a> {
    points: &'a [Vec3],
}

impl<'a> SplineCurve<'a> {
    /// Wraps the control points. Returns `None` for an empty list.
    #[must_use]
    pub fn new(points: &'a [Vec3]) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    /// Control points backing the curve.
    #[must_use]
    pub fn points(&self) -> &'a [Vec3] {
        self.points
    }

    /// Interpolated position at parameter `t`, clamped to `[0, 1]`.
    #[must_use]
    pub fn position(&self, t: f32) -> Vec3 {
        let last = self.points.len() - 1;
        if last == 0 {
            return self.points[0];
        }

        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let point = last as f32 * t;
        let int_point = (point.floor() as usize).min(last);
        let weight = point - int_point as f32;

        let p0 = self.points[int_point.saturating_sub(1)];
        let p1 = self.points[int_point];
        let p2 = self.points[(int_point + 1).min(last)];
        let p3 = self.points[(int_point + 2).min(last)];

        interpolate(p0, p1, p2, p3, weight)
    }

    /// Total length of the straight segments joining the control points.
    #[must_use]
    pub fn polyline_length(&self) -> f32 {
        polyline_length(self.points)
    }

    /// Projects a world position onto the control polyline.
    #[must_use]
    pub fn project(&self, position: Vec3) -> Projection {
        let last = self.points.len() - 1;
        if last == 0 {
            let point = self.points[0];
            return Projection {
                t: 0.0,
                point,
                distance: position.distance(point),
            };
        }

        let mut best = Projection {
            t: 0.0,
            point: self.points[0],
            distance: f32::INFINITY,
        };
        for (segment, pair) in self.points.windows(2).enumerate() {
            let (start, end) = (pair[0], pair[1]);
            let along = end - start;
            let length_squared = along.length_squared();
            let fraction = if length_squared <= f32::EPSILON {
                0.0
            } else {
                ((position - start).dot(along) / length_squared).clamp(0.0, 1.0)
            };
            let point = start + along * fraction;
            let distance = position.distance(point);

            // Equal distances resolve toward the later segment.
            if distance <= best.distance + PROJECTION_EPSILON {
                best = Projection {
                    t: (segment as f32 + fraction) / last as f32,
                    point,
                    distance,
                };
            }
        }
        best
    }

    /// Finds the point of the curve itself nearest to `position`.
    ///
    /// The polyline projection picks the segment; the parameter is then
    /// refined against [`SplineCurve::position`] within half a segment of it,
    /// so the returned `point` lies on the curve and a position already on
    /// the curve maps back to itself.
    #[must_use]
    pub fn locate(&self, position: Vec3) -> Projection {
        let seed = self.project(position);
        let last = self.points.len() - 1;
        if last == 0 {
            return seed;
        }

        let reach = 0.5 / last as f32;
        let low = (seed.t - reach).max(0.0);
        let high = (seed.t + reach).min(1.0);
        let step = (high - low) / LOCATE_SAMPLES as f32;
        let distance_at = |t: f32| position.distance(self.position(t));

        let mut best_t = seed.t;
        let mut best_distance = distance_at(seed.t);
        for index in 0..=LOCATE_SAMPLES {
            let t = low + step * index as f32;
            let distance = distance_at(t);
            if distance + PROJECTION_EPSILON < best_distance {
                best_t = t;
                best_distance = distance;
            }
        }

        let (mut lower, mut upper) = ((best_t - step).max(low), (best_t + step).min(high));
        for _ in 0..LOCATE_REFINE_STEPS {
            let third = (upper - lower) / 3.0;
            if distance_at(lower + third) < distance_at(upper - third) {
                upper -= third;
            } else {
                lower += third;
            }
        }
        let refined = (lower + upper) * 0.5;
        let refined_distance = distance_at(refined);
        if refined_distance < best_distance {
            best_t = refined;
            best_distance = refined_distance;
        }

        Projection {
            t: best_t,
            point: self.position(best_t),
            distance: best_distance,
        }
    }
}

/// Nearest point on a control polyline or curve and its curve parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Curve parameter of the nearest point.
    pub t: f32,
    /// Nearest point found.
    pub point: Vec3,
    /// Distance between the projected position and the nearest point.
    pub distance: f32,
}

/// Samples the Catmull-Rom curve through `points` at parameter `t`.
///
/// Returns `None` for an empty point list.
#[must_use]
pub fn sample(points: &[Vec3], t: f32) -> Option<Vec3> {
    SplineCurve::new(points).map(|curve| curve.position(t))
}

/// Total length of the straight segments joining `points`.
#[must_use]
pub fn polyline_length(points: &[Vec3]) -> f32 {
    points
        .windows(2)
        .map(|pair| pair[0].distance(pair[1]))
        .sum()
}

fn interpolate(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, t: f32) -> Vec3 {
    let v0 = (p2 - p0) * 0.5;
    let v1 = (p3 - p1) * 0.5;
    let t2 = t * t;
    let t3 = t * t2;
    (2.0 * p1 - 2.0 * p2 + v0 + v1) * t3 + (-3.0 * p1 + 3.0 * p2 - 2.0 * v0 - v1) * t2 + v0 * t + p1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolate_hits_control_points_at_weight_bounds() {
        let (p0, p1, p2, p3) = (Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 1.0), Vec3::Z);
        assert!(interpolate(p0, p1, p2, p3, 0.0).abs_diff_eq(p1, 1e-6));
        assert!(interpolate(p0, p1, p2, p3, 1.0).abs_diff_eq(p2, 1e-6));
    }

    #[test]
    fn empty_point_list_has_no_curve() {
        assert!(SplineCurve::new(&[]).is_none());
        assert!(sample(&[], 0.5).is_none());
    }

    #[test]
    fn nan_parameter_is_treated_as_start() {
        let points = [Vec3::ZERO, Vec3::X, Vec3::new(2.0, 0.0, 0.0)];
        assert_eq!(sample(&points, f32::NAN), Some(Vec3::ZERO));
    }

    #[test]
    fn locate_maps_curve_points_back_to_their_parameter() {
        let points = [
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 2.0),
        ];
        let curve = SplineCurve::new(&points).expect("curve");

        for t in [0.0, 0.05, 0.2, 0.33, 0.5, 0.71, 0.98] {
            let on_curve = curve.position(t);
            let located = curve.locate(on_curve);
            assert!(located.distance < 1e-4, "t={t} located {located:?}");
            assert!(located.point.distance(on_curve) < 1e-4);
        }
    }

    #[test]
    fn projection_of_single_point_is_that_point() {
        let points = [Vec3::new(1.0, 0.0, 1.0)];
        let curve = SplineCurve::new(&points).expect("curve");
        let projection = curve.project(Vec3::new(4.0, 0.0, 5.0));
        assert_eq!(projection.t, 0.0);
        assert_eq!(projection.point, points[0]);
        assert!((projection.distance - 5.0).abs() < 1e-5);
    }
}
