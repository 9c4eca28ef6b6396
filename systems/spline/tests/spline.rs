use glam::Vec3;
use tile_defense_system_spline::{polyline_length, sample, SplineCurve};

fn l_shaped_points() -> Vec<Vec3> {
    vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(2.0, 0.0, 0.0),
        Vec3::new(2.0, 0.0, 1.0),
        Vec3::new(2.0, 0.0, 2.0),
    ]
}

#[test]
fn curve_starts_and_ends_on_path_endpoints() {
    for points in [
        l_shaped_points(),
        vec![Vec3::ZERO, Vec3::new(3.0, 1.0, -2.0)],
        vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 0.0, 1.0)],
    ] {
        let first = *points.first().expect("first point");
        let last = *points.last().expect("last point");
        assert_eq!(sample(&points, 0.0), Some(first));
        let end = sample(&points, 1.0).expect("end sample");
        assert!(end.abs_diff_eq(last, 1e-5), "expected {last:?}, got {end:?}");
    }
}

#[test]
fn single_waypoint_returns_that_point_everywhere() {
    let point = Vec3::new(4.0, 0.25, -1.0);
    for step in 0..=10 {
        let t = step as f32 / 10.0;
        assert_eq!(sample(&[point], t), Some(point));
    }
}

#[test]
fn curve_passes_through_every_waypoint() {
    let points = l_shaped_points();
    let curve = SplineCurve::new(&points).expect("curve");
    let last = (points.len() - 1) as f32;

    for (index, expected) in points.iter().enumerate() {
        let position = curve.position(index as f32 / last);
        assert!(
            position.abs_diff_eq(*expected, 1e-4),
            "waypoint {index} expected {expected:?}, got {position:?}"
        );
    }
}

#[test]
fn collinear_points_do_not_overshoot() {
    let points: Vec<_> = (0..5).map(|x| Vec3::new(x as f32, 0.0, 0.0)).collect();
    let curve = SplineCurve::new(&points).expect("curve");

    let mut previous = curve.position(0.0).x;
    for step in 1..=100 {
        let position = curve.position(step as f32 / 100.0);
        assert!(position.y.abs() < 1e-6 && position.z.abs() < 1e-6);
        assert!(position.x >= previous - 1e-6, "motion reversed at step {step}");
        assert!(position.x <= 4.0 + 1e-5);
        previous = position.x;
    }
}

#[test]
fn curve_is_continuous_across_segment_boundaries() {
    let points = l_shaped_points();
    let curve = SplineCurve::new(&points).expect("curve");
    let last = (points.len() - 1) as f32;

    for boundary in 1..points.len() - 1 {
        let t = boundary as f32 / last;
        let before = curve.position(t - 1e-4);
        let after = curve.position(t + 1e-4);
        assert!(
            before.distance(after) < 1e-2,
            "discontinuity at waypoint {boundary}: {before:?} vs {after:?}"
        );
    }
}

#[test]
fn parameter_is_clamped_to_unit_range() {
    let points = l_shaped_points();
    assert_eq!(sample(&points, -3.0), sample(&points, 0.0));
    assert_eq!(sample(&points, 7.5), sample(&points, 1.0));
}

#[test]
fn polyline_length_sums_segments() {
    assert!((polyline_length(&l_shaped_points()) - 4.0).abs() < 1e-6);
    assert_eq!(polyline_length(&[Vec3::ONE]), 0.0);
    assert_eq!(polyline_length(&[]), 0.0);
}

#[test]
fn projection_finds_nearest_point_and_parameter() {
    let points = l_shaped_points();
    let curve = SplineCurve::new(&points).expect("curve");

    let projection = curve.project(Vec3::new(1.5, 0.0, -0.5));
    assert!(projection.point.abs_diff_eq(Vec3::new(1.5, 0.0, 0.0), 1e-5));
    assert!((projection.t - 1.5 / 4.0).abs() < 1e-5);
    assert!((projection.distance - 0.5).abs() < 1e-5);

    let corner = curve.project(Vec3::new(3.0, 0.0, -1.0));
    assert!(corner.point.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
    assert!((corner.t - 0.5).abs() < 1e-5);
}

#[test]
fn projection_of_waypoint_lands_on_it() {
    let points = l_shaped_points();
    let curve = SplineCurve::new(&points).expect("curve");

    let projection = curve.project(points[3]);
    assert!(projection.distance < 1e-6);
    assert!((projection.t - 0.75).abs() < 1e-5);
    assert!(curve.position(projection.t).abs_diff_eq(points[3], 1e-4));
}
