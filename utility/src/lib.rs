pub const PARALLEL_MIN_LEN: usize = 8192;

pub fn get_quant_num_m(l: usize) -> Vec<i32> {
    (0..2 * l + 1).map(|im| im as i32 - l as i32).collect()
}

#[inline]
pub fn use_parallel_for_len(len: usize, min_len: usize) -> bool {
    len >= min_len && rayon::current_num_threads() > 1
}

// number of uniform grid points needed to interpolate up to qmax with
// four-point Lagrange stencils
pub fn n_grid_points(qmax: f64, dq: f64) -> usize {
    (qmax / dq).ceil() as usize + 4
}

// largest q a table of n points can interpolate without leaving the grid
pub fn q_covered(n: usize, dq: f64) -> f64 {
    n.saturating_sub(4) as f64 * dq
}

/// Lagrange weights of the four grid points i0..i0+3 at fractional offset
/// `px` from i0.
#[inline]
pub fn lagrange4_weights(px: f64) -> [f64; 4] {
    let ux = 1.0 - px;
    let vx = 2.0 - px;
    let wx = 3.0 - px;

    [
        ux * vx * wx / 6.0,
        px * vx * wx / 2.0,
        -px * ux * wx / 2.0,
        px * ux * vx / 6.0,
    ]
}

/// Four-point interpolation of a function tabulated at q_i = i * dq.
///
/// The stencil starts at the grid point just below `q`, so `tab` must hold
/// at least `floor(q/dq) + 4` points.
#[inline]
pub fn interpolate_uniform(tab: &[f64], q: f64, dq: f64) -> f64 {
    let qd = q / dq;

    let i0 = qd.floor() as usize;

    let px = qd - qd.floor();

    let w = lagrange4_weights(px);

    tab[i0] * w[0] + tab[i0 + 1] * w[1] + tab[i0 + 2] * w[2] + tab[i0 + 3] * w[3]
}
