//! Radial quadrature on non-uniform meshes.
//!
//! `rab[i] = dr/di` is the mesh derivative supplied with every pseudopotential
//! grid, so the integral over `r` becomes a uniform-index integral of
//! `y[i] * rab[i]`.

/// Composite Simpson rule over the whole mesh.
///
/// Odd point counts use Simpson 1/3 everywhere. Even counts use Simpson 1/3
/// up to the fourth-last point and Simpson 3/8 on the last four. Meshes too
/// short for either rule fall back to the trapezoid rule.
pub fn simpson_rab(y: &[f64], rab: &[f64]) -> f64 {
    debug_assert_eq!(y.len(), rab.len());

    let npts = y.len();

    match npts {
        0 | 1 => return 0.0,
        2 => return 0.5 * (y[0] * rab[0] + y[1] * rab[1]),
        _ => {}
    }

    let mut n = npts;

    if n % 2 == 0 {
        n -= 3;
    }

    let r12 = 1.0 / 3.0;

    let mut t1;

    let mut t2;

    let mut t3 = y[0] * rab[0] * r12;

    let mut s = 0.0;

    for i in (0..n - 1).step_by(2) {
        t1 = t3;

        t2 = y[i + 1] * rab[i + 1] * r12;

        t3 = y[i + 2] * rab[i + 2] * r12;

        s += t1 + 4.0 * t2 + t3;
    }

    if npts % 2 == 0 {
        let n = npts;

        let r38 = 3.0 / 8.0;

        s += y[n - 4] * rab[n - 4] * r38
            + 3.0 * y[n - 3] * rab[n - 3] * r38
            + 3.0 * y[n - 2] * rab[n - 2] * r38
            + y[n - 1] * rab[n - 1] * r38;
    }

    s
}
