use super::*;

#[test]
fn slots_hold_cumulative_counts_in_any_order() {
    let p = TargetProgress::new(10, vec![3, 3, 4]);
    p.report(2, 4);
    p.report(0, 2);
    p.report(0, 1);
    assert_eq!(p.completed_rows(), 6);
    assert!(p.is_slice_complete(2));
    assert!(!p.is_slice_complete(0));
    assert!(!p.is_complete());

    p.report(0, 3);
    p.report(1, 99);
    assert_eq!(p.completed_rows(), 10);
    assert!(p.is_complete());
    assert_eq!(p.total_pixels(), 100);
}

#[test]
fn reports_for_unknown_slices_are_ignored() {
    let p = TargetProgress::new(1, vec![2]);
    p.report(5, 1);
    assert_eq!(p.completed_rows(), 0);
    assert!(!p.is_slice_complete(5));
}

#[test]
fn run_fraction_weights_pictures_by_pixels() {
    let big = TargetProgress::new(10, vec![10]);
    let small = TargetProgress::new(2, vec![5]);
    big.report(0, 5);
    small.report(0, 5);
    let run = RunProgress::new(vec![Some(big), Some(small)], vec![None, None], false);
    assert!((run.fraction() - 60.0 / 110.0).abs() < 1e-12);
}

#[test]
fn previews_count_only_when_tracked() {
    let mk = || {
        let pic = TargetProgress::new(4, vec![4]);
        pic.report(0, 4);
        let pre = TargetProgress::new(4, vec![4]);
        (pic, pre)
    };
    let (pic, pre) = mk();
    let untracked = RunProgress::new(vec![Some(pic)], vec![Some(pre)], false);
    assert_eq!(untracked.fraction(), 1.0);

    let (pic, pre) = mk();
    let tracked = RunProgress::new(vec![Some(pic)], vec![Some(pre)], true);
    assert_eq!(tracked.fraction(), 0.5);
    assert!(tracked.preview(0).is_some());
}

#[test]
fn empty_run_is_complete() {
    let run = RunProgress::new(vec![None], vec![None], true);
    assert_eq!(run.fraction(), 1.0);
    assert!(run.picture(0).is_none());
}
