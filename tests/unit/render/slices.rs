use super::*;
use proptest::prelude::*;

#[test]
fn last_band_absorbs_the_remainder() {
    assert_eq!(partition_rows(10, 3), vec![0..3, 3..6, 6..10]);
    assert_eq!(partition_rows(4, 9), vec![0..1, 1..2, 2..3, 3..4]);
    assert_eq!(partition_rows(7, 0), vec![0..7]);
    assert!(partition_rows(0, 4).is_empty());
}

#[test]
fn heuristics_follow_worker_count() {
    assert_eq!(slices_per_picture(8, 1), 9);
    assert_eq!(slices_per_picture(8, 3), 3);
    assert_eq!(slices_per_picture(2, 16), 1);
    assert_eq!(progress_steps(1), 50);
    assert_eq!(progress_steps(10), 5);
    assert_eq!(progress_steps(64), 2);
    assert_eq!(progress_stride(100, 4), 25);
    assert_eq!(progress_stride(3, 50), 1);
}

#[test]
fn preview_requires_minimum_size() {
    assert_eq!(preview_size(50, 50, 0.1, 8), None);
    assert_eq!(preview_size(200, 200, 0.1, 8), Some((20, 20)));
    assert_eq!(preview_size(1000, 60, 0.1, 8), None);
    assert_eq!(preview_size(200, 200, 0.0, 8), None);
}

#[test]
fn preview_sides_are_truncated() {
    assert_eq!(preview_size(55, 55, 0.1, 5), Some((5, 5)));
    assert_eq!(preview_size(79, 80, 0.1, 8), None);
    assert_eq!(preview_size(89, 80, 0.1, 8), Some((8, 8)));
}

proptest! {
    #[test]
    fn bands_cover_every_row_once(height in 0usize..2000, count in 0usize..64) {
        let bands = partition_rows(height, count);
        let mut next = 0;
        for band in &bands {
            prop_assert_eq!(band.start, next);
            prop_assert!(band.end > band.start);
            next = band.end;
        }
        prop_assert_eq!(next, height);
        if height > 0 {
            prop_assert_eq!(bands.len(), count.clamp(1, height));
        }
    }
}
