use dwconsts::EPS16;
use std::f64::consts;
use types::c64;
use vector3::Vector3f64;

// below this argument the closed forms of j_n lose digits to cancellation
const XSERIES: f64 = 0.5;

pub const LMAX_YLM: usize = 3;

pub fn erf(x: f64) -> f64 {
    libm::erf(x)
}

pub fn erfc(x: f64) -> f64 {
    libm::erfc(x)
}

// https://en.wikipedia.org/wiki/Bessel_function#Spherical_Bessel_functions:_jn,_yn

pub fn spherical_bessel_jn(n: usize, x: f64) -> f64 {
    if x.abs() < XSERIES {
        let x2 = x * x;

        match n {
            0 => {
                let x4 = x2 * x2;
                let x6 = x2 * x4;
                let x8 = x2 * x6;
                let x10 = x2 * x8;
                let x12 = x2 * x10;

                1.0 - x2 / 6.0 + x4 / 120.0 - x6 / 5040.0 + x8 / 362880.0 - x10 / 39916800.0
                    + x12 / 6227020800.0
            }

            1 => {
                let x3 = x * x2;
                let x5 = x2 * x3;
                let x7 = x2 * x5;
                let x9 = x2 * x7;
                let x11 = x2 * x9;

                x / 3.0 - x3 / 30.0 + x5 / 840.0 - x7 / 45360.0 + x9 / 3991680.0 - x11 / 518918400.0
            }

            2 => {
                let x4 = x2 * x2;
                let x6 = x2 * x4;
                let x8 = x2 * x6;
                let x10 = x2 * x8;

                x2 / 15.0 - x4 / 210.0 + x6 / 7560.0 - x8 / 498960.0 + x10 / 51891840.0
            }

            3 => {
                let x3 = x * x2;
                let x5 = x2 * x3;
                let x7 = x2 * x5;
                let x9 = x2 * x7;
                let x11 = x2 * x9;

                x3 / 105.0 - x5 / 1890.0 + x7 / 83160.0 - x9 / 6486480.0 + x11 / 778377600.0
            }

            4 => {
                let x4 = x2 * x2;
                let x6 = x2 * x4;
                let x8 = x4 * x4;
                let x10 = x2 * x8;

                x4 / 945.0 - x6 / 20790.0 + x8 / 1081080.0 - x10 / 97297200.0
            }

            _ => panic!("spherical bessel function for n = {} is not implemented", n),
        }
    } else {
        let (sn, cs) = x.sin_cos();

        match n {
            0 => sn / x,

            1 => sn / x / x - cs / x,

            2 => (3.0 / x / x - 1.0) * sn / x - 3.0 * cs / x / x,

            3 => (15.0 / x.powi(4) - 6.0 / x.powi(2)) * sn - (15.0 / x.powi(3) - 1.0 / x) * cs,

            4 => {
                (105.0 / x.powi(5) - 45.0 / x.powi(3) + 1.0 / x) * sn
                    - (105.0 / x.powi(4) - 10.0 / x.powi(2)) * cs
            }

            _ => panic!("spherical bessel function for n = {} is not implemented", n),
        }
    }
}

/// Real spherical harmonics R_lm of the direction of `v`, l <= 3.
///
/// R_l0 = Y_l^0, R_lm = sqrt(2) Re Y_l^m and R_l(-m) = sqrt(2) Im Y_l^m for
/// m > 0, with the Condon-Shortley phase in Y_l^m. For a vanishing vector
/// only the l = 0 component survives.
pub fn real_spherical_harmonics(l: usize, lm: i32, v: Vector3f64) -> f64 {
    let rnorm = v.norm2();

    if l == 0 {
        return 0.5 / consts::PI.sqrt();
    }

    if rnorm < EPS16 {
        return 0.0;
    }

    let x = v.x / rnorm;
    let y = v.y / rnorm;
    let z = v.z / rnorm;

    match (l, lm) {
        (1, -1) => -(3.0 / 4.0 / consts::PI).sqrt() * y,

        (1, 0) => (3.0 / 4.0 / consts::PI).sqrt() * z,

        (1, 1) => -(3.0 / 4.0 / consts::PI).sqrt() * x,

        (2, -2) => 0.5 * (15.0 / consts::PI).sqrt() * x * y,

        (2, -1) => -0.5 * (15.0 / consts::PI).sqrt() * y * z,

        (2, 0) => 0.25 * (5.0 / consts::PI).sqrt() * (2.0 * z * z - x * x - y * y),

        (2, 1) => -0.5 * (15.0 / consts::PI).sqrt() * z * x,

        (2, 2) => 0.25 * (15.0 / consts::PI).sqrt() * (x * x - y * y),

        (3, -3) => -0.25 * (35.0 / 2.0 / consts::PI).sqrt() * (3.0 * x * x - y * y) * y,

        (3, -2) => 0.5 * (105.0 / consts::PI).sqrt() * x * y * z,

        (3, -1) => -0.25 * (21.0 / 2.0 / consts::PI).sqrt() * y * (4.0 * z * z - x * x - y * y),

        (3, 0) => 0.25 * (7.0 / consts::PI).sqrt() * z * (2.0 * z * z - 3.0 * x * x - 3.0 * y * y),

        (3, 1) => -0.25 * (21.0 / 2.0 / consts::PI).sqrt() * x * (4.0 * z * z - x * x - y * y),

        (3, 2) => 0.25 * (105.0 / consts::PI).sqrt() * (x * x - y * y) * z,

        (3, 3) => -0.25 * (35.0 / 2.0 / consts::PI).sqrt() * (x * x - 3.0 * y * y) * x,

        _ => panic!("real spherical harmonics for (l, m) = ({}, {}) is not implemented", l, lm),
    }
}

/// Complex Y_l^m rebuilt from the real pair (R_l|m|, R_l-|m|).
pub fn complex_from_real_spherical_harmonics(m: i32, r_pos: f64, r_neg: f64) -> c64 {
    if m == 0 {
        return c64::new(r_pos, 0.0);
    }

    let y = c64::new(r_pos, r_neg) / 2.0_f64.sqrt();

    if m > 0 {
        y
    } else if m % 2 == 0 {
        y.conj()
    } else {
        -y.conj()
    }
}

/// Complex Y_l^m of the direction of `v`.
pub fn complex_spherical_harmonics(l: usize, m: i32, v: Vector3f64) -> c64 {
    let am = m.abs();

    let r_pos = real_spherical_harmonics(l, am, v);
    let r_neg = if am == 0 {
        0.0
    } else {
        real_spherical_harmonics(l, -am, v)
    };

    complex_from_real_spherical_harmonics(m, r_pos, r_neg)
}
