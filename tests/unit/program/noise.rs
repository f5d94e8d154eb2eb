use super::*;

#[test]
fn noise_is_deterministic_and_bounded() {
    for i in 0..200 {
        let x = i as f64 * 0.173;
        let y = i as f64 * 0.311 - 7.0;
        let a = noise2(x, y, 3.0);
        assert_eq!(a, noise2(x, y, 3.0));
        assert!((-1.5..=1.5).contains(&a), "noise out of range: {a}");
    }
}

#[test]
fn seeds_change_the_field() {
    let differs = (0..32).any(|i| {
        let x = i as f64 * 0.37 + 0.1;
        (noise2(x, 0.4, 1.0) - noise2(x, 0.4, 2.0)).abs() > 1e-6
    });
    assert!(differs);
}

#[test]
fn perlin_vanishes_on_lattice_points() {
    assert_eq!(perlin3(3.0, -2.0, 5.0), 0.0);
    assert_eq!(perlin3(f64::NAN, 0.0, 0.0), 0.0);
}

#[test]
fn fbm_clamps_octaves() {
    let a = fbm(0.3, 0.7, 100.0, 1.0);
    let b = fbm(0.3, 0.7, MAX_OCTAVES as f64, 1.0);
    assert_eq!(a, b);
    assert_eq!(fbm(0.3, 0.7, 0.0, 1.0), noise2(0.3, 0.7, 1.0));
}
