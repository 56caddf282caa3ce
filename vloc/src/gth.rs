//! Analytic local part of Goedecker-Teter-Hutter pseudopotentials.
//!
//! Phys. Rev. B 54, 1703 (1996), Eq. (5):
//!
//! V(q) = -4 pi Z e^2 exp(-x^2/2) / (Omega q^2)
//!        + sqrt(8 pi^3) rloc^3 / Omega exp(-x^2/2) P(x^2),   x = q rloc
//!
//! P(t) = C1 + C2 (3 - t) + C3 (15 - 10 t + t^2) + C4 (105 - 105 t + 21 t^2 - t^3)

use atompsp::GthLocal;
use dwconsts::*;

fn poly(cc: &[f64; 4], t: f64) -> f64 {
    cc[0] + cc[1] * (3.0 - t)
        + cc[2] * (15.0 - 10.0 * t + t * t)
        + cc[3] * (105.0 - t * (105.0 - t * (21.0 - t)))
}

// dP/dt
fn poly_diff(cc: &[f64; 4], t: f64) -> f64 {
    -cc[1] + cc[2] * (-10.0 + 2.0 * t) + cc[3] * (-105.0 + t * (42.0 - 3.0 * t))
}

fn gaussian_term(gth: &GthLocal, q2: f64, omega: f64) -> f64 {
    let rl = gth.rloc;
    let t = q2 * rl * rl;

    (8.0 * PI * PI * PI).sqrt() * rl.powi(3) / omega * (-0.5 * t).exp() * poly(&gth.cc, t)
}

/// Full GTH local potential at squared wavevector `q2`.
///
/// At q2 = 0 the Coulomb divergence is dropped and only its finite part
/// 4 pi Z e^2 rloc^2 / (2 Omega) is kept.
pub fn vloc_gth(gth: &GthLocal, zion: f64, q2: f64, omega: f64) -> f64 {
    let rl2 = gth.rloc * gth.rloc;

    let coulomb = if q2 < EPS8 {
        FOURPI * zion * E2 * 0.5 * rl2 / omega
    } else {
        -FOURPI * zion * E2 * (-0.5 * q2 * rl2).exp() / (omega * q2)
    };

    coulomb + gaussian_term(gth, q2, omega)
}

/// GTH local potential minus the long-range part -Z e^2 erf(r)/r, whose
/// transform -4 pi Z e^2 exp(-q^2/4) / (Omega q^2) is added back separately.
pub fn vloc_gth_short_range(gth: &GthLocal, zion: f64, q2: f64, omega: f64) -> f64 {
    let rl2 = gth.rloc * gth.rloc;

    // (exp(-q^2/4) - exp(-q^2 rl^2/2)) / q^2, with its q -> 0 limit
    let diff = if q2 < EPS8 {
        0.5 * rl2 - 0.25
    } else {
        ((-0.25 * q2).exp() - (-0.5 * q2 * rl2).exp()) / q2
    };

    FOURPI * zion * E2 / omega * diff + gaussian_term(gth, q2, omega)
}

/// d V / d(q^2) of `vloc_gth`; zero at q2 = 0 by convention.
pub fn dvloc_gth(gth: &GthLocal, zion: f64, q2: f64, omega: f64) -> f64 {
    if q2 < EPS8 {
        return 0.0;
    }

    let rl = gth.rloc;
    let rl2 = rl * rl;

    let a = 0.5 * rl2;
    let e = (-a * q2).exp();

    let coulomb = FOURPI * zion * E2 / omega * e * (a * q2 + 1.0) / (q2 * q2);

    let t = q2 * rl2;
    let pref = (8.0 * PI * PI * PI).sqrt() * rl.powi(3) / omega;

    let gaussian = pref * e * (-a * poly(&gth.cc, t) + rl2 * poly_diff(&gth.cc, t));

    coulomb + gaussian
}
