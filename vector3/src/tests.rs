use super::*;

#[test]
fn test_vector3f64_zeros() {
    let v = Vector3f64::zeros();
    assert_eq!(v, Vector3f64::new(0.0, 0.0, 0.0));
}

#[test]
fn test_vector3f64_add_sub() {
    let a = Vector3f64::new(1.0, 2.0, 3.0);
    let b = Vector3f64::new(0.5, -1.0, 2.0);

    assert_eq!(a + b, Vector3f64::new(1.5, 1.0, 5.0));
    assert_eq!(a - b, Vector3f64::new(0.5, 3.0, 1.0));
    assert_eq!(-a, Vector3f64::new(-1.0, -2.0, -3.0));
}

#[test]
fn test_vector3f64_dot_and_norm() {
    let a = Vector3f64::new(3.0, 0.0, 4.0);
    let b = Vector3f64::new(1.0, 7.0, -1.0);

    assert_eq!(a * b, -1.0);
    assert_eq!(a.norm2(), 5.0);
    assert_eq!(a.norm_squared(), 25.0);
}

#[test]
fn test_vector3f64_scale() {
    let a = Vector3f64::new(1.0, -2.0, 0.5);

    assert_eq!(a * 2.0, Vector3f64::new(2.0, -4.0, 1.0));
    assert_eq!(2.0 * a, a * 2.0);
}
