use super::*;

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("c{i}")).collect()
}

#[test]
fn new_picture_is_zeroed_and_shaped() {
    let p = Picture::try_new(3, 2, names(4)).unwrap();
    assert_eq!(p.data().len(), 24);
    assert!(p.data().iter().all(|v| *v == 0.0));
    assert_eq!(p.pixel(2, 1).unwrap().len(), 4);
    assert!(p.pixel(3, 0).is_none());
    assert!(p.fits(3, 2, &names(4)));
    assert!(!p.fits(3, 2, &names(3)));
}

#[test]
fn overflowing_shapes_are_rejected() {
    let err = Picture::try_new(usize::MAX, 2, names(1)).unwrap_err();
    assert!(matches!(err, AllocationError::Overflow { .. }));
}

#[test]
fn split_rows_yields_disjoint_absolute_views() {
    let mut p = Picture::try_new(2, 5, names(1)).unwrap();
    {
        let mut views = p.split_rows(&[0..2, 2..5]);
        assert_eq!(views[0].row_range(), 0..2);
        assert_eq!(views[1].row_range(), 2..5);
        assert!(views[0].row_mut(2).is_none());
        views[1].row_mut(4).unwrap().fill(7.0);
        views[0].row_mut(0).unwrap()[1] = 1.0;
    }
    assert_eq!(p.row(4).unwrap(), &[7.0, 7.0]);
    assert_eq!(p.pixel(1, 0).unwrap(), &[1.0]);
    assert_eq!(p.row(2).unwrap(), &[0.0, 0.0]);
}

#[test]
fn rows_view_requires_exact_length() {
    let mut data = vec![0.0; 6];
    assert!(RowsMut::new(&mut data, 3, 2, 3).is_some());
    assert!(RowsMut::new(&mut data, 3, 2, 4).is_none());
}

#[test]
fn rgba_conversion_clamps_and_fills_alpha() {
    let mut p = Picture::try_new(1, 1, names(3)).unwrap();
    p.rows_mut().row_mut(0).unwrap().copy_from_slice(&[2.0, 0.5, -1.0]);
    let img = p.to_rgba8();
    assert_eq!(img.get_pixel(0, 0).0, [255, 128, 0, 255]);

    let mut gray = Picture::try_new(1, 1, names(1)).unwrap();
    gray.rows_mut().row_mut(0).unwrap()[0] = 1.0;
    assert_eq!(gray.to_rgba8().get_pixel(0, 0).0, [255, 255, 255, 255]);
}
