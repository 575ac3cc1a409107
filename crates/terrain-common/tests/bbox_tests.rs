//! Tests for BoundingBox operations used by clipping and map zoom.

use terrain_common::bbox::{BboxParseError, BoundingBox};

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_bbox_integer() {
    let bbox = BoundingBox::from_str_list("0,0,100,100").unwrap();
    assert_eq!(bbox, BoundingBox::new(0.0, 0.0, 100.0, 100.0));
}

#[test]
fn test_parse_bbox_scientific_notation() {
    let bbox = BoundingBox::from_str_list("1e-6,2e-6,1e6,2e6").unwrap();
    assert!((bbox.min_x - 1e-6).abs() < 1e-12);
    assert!((bbox.max_y - 2e6).abs() < 1e-6);
}

#[test]
fn test_parse_bbox_wrong_arity() {
    assert!(matches!(
        BoundingBox::from_str_list("1,2,3"),
        Err(BboxParseError::InvalidFormat(_))
    ));
    assert!(matches!(
        BoundingBox::from_str_list("1,2,3,4,5"),
        Err(BboxParseError::InvalidFormat(_))
    ));
}

#[test]
fn test_parse_bbox_bad_number() {
    assert!(matches!(
        BoundingBox::from_str_list("1,two,3,4"),
        Err(BboxParseError::InvalidNumber(_))
    ));
}

// ============================================================================
// Geometry
// ============================================================================

#[test]
fn test_scaled_pads_around_center() {
    let bbox = BoundingBox::new(24.0, 45.0, 26.0, 46.0);
    let zoomed = bbox.scaled(1.25);

    assert_eq!(zoomed.center(), bbox.center());
    assert!((zoomed.width() - 2.5).abs() < 1e-12);
    assert!((zoomed.height() - 1.25).abs() < 1e-12);
}

#[test]
fn test_union_and_contains() {
    let a = BoundingBox::new(20.0, 43.5, 25.0, 46.0);
    let b = BoundingBox::new(24.0, 45.0, 29.5, 48.5);
    let u = a.union(&b);

    assert_eq!(u, BoundingBox::new(20.0, 43.5, 29.5, 48.5));
    assert!(u.contains_point(20.0, 48.5));
    assert!(!u.contains_point(19.99, 45.0));
}

#[test]
fn test_degenerate_box_is_not_valid() {
    let single = BoundingBox::from_points([(25.0, 46.0)]).unwrap();
    assert!(!single.is_valid());
    assert!(!BoundingBox::empty().is_valid());
}

#[test]
fn test_display_format() {
    let bbox = BoundingBox::new(20.0, 43.5, 29.5, 48.5);
    assert_eq!(
        bbox.to_string(),
        "20.000000,43.500000,29.500000,48.500000"
    );
}
