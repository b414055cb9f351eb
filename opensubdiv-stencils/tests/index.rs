//! Tests for the Index newtype wrapper.

use opensubdiv_stencils::Index;

#[test]
fn test_index_conversions() {
    let idx = Index::from(42u32);
    assert_eq!(idx.0, 42);
    assert_eq!(u32::from(idx), 42);

    let idx = Index::from(100usize);
    let value: usize = idx.into();
    assert_eq!(value, 100);
}

#[test]
fn test_index_debug_and_display() {
    let idx = Index(42);
    assert_eq!(format!("{:?}", idx), "Index(42)");
    assert_eq!(idx.to_string(), "42");
}

#[test]
fn test_index_ordering() {
    let idx1 = Index(1);
    let idx2 = Index(2);
    let idx3 = Index(2);

    assert!(idx1 < idx2);
    assert!(idx2 <= idx3);
    assert_eq!(idx2, idx3);
    assert_eq!(Index::default(), Index(0));
}

#[test]
fn test_index_slice_cast() {
    let indices = [Index(3), Index(1), Index(4)];
    let raw: &[u32] = bytemuck::cast_slice(&indices);
    assert_eq!(raw, &[3, 1, 4]);
}
