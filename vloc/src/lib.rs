//! Local pseudopotential in reciprocal space.
//!
//! `VlocTable` caches the short-range part of V_loc(q) of every species on a
//! uniform q grid. `vloc_of_g` assembles the full form factor on a list of
//! G shells by adding the analytic long-range tail, `dvloc_of_g` gives its
//! derivative with respect to G^2 for the stress.
//!
//! G shells `gl` are squared magnitudes in units of tpiba2 = (2 pi / alat)^2.

mod error;
pub use error::*;

pub mod gth;

mod table;
pub use table::*;

use atompsp::{AtomPSP, LocalForm};
use dwconsts::*;
use dwmpi::Comm;
use itertools::multizip;
use pspot::PSPot;
use rayon::prelude::*;

impl VlocTable {
    /// V_loc of species `isp` on every shell of `gl`.
    ///
    /// The G = 0 shell carries the non-divergent part only: zero for a bare
    /// Coulomb species, the tabulated q = 0 integral otherwise.
    pub fn vloc_of_g(
        &self,
        isp: usize,
        pspot: &PSPot,
        gl: &[f64],
        tpiba2: f64,
        omega: f64,
        modified_coulomb: bool,
    ) -> Result<Vec<f64>> {
        let atpsp = get_species(pspot, isp)?;

        check_shells(gl);

        let zion = atpsp.get_zion();

        match atpsp.get_local_form() {
            LocalForm::Coulomb => {
                if modified_coulomb {
                    return Err(VlocError::ModifiedCoulombUnsupported { species: isp });
                }

                Ok(vloc_coul(zion, gl, tpiba2, omega))
            }

            LocalForm::Gth(gth) => {
                if modified_coulomb {
                    return Err(VlocError::ModifiedCoulombUnsupported { species: isp });
                }

                Ok(gl
                    .iter()
                    .map(|g2| gth::vloc_gth(gth, zion, g2 * tpiba2, omega))
                    .collect())
            }

            LocalForm::Numeric => {
                let mut vloc = self.try_interp(isp, gl, tpiba2)?;

                if !modified_coulomb {
                    // transform of the erf(r)/r tail removed from the table
                    let fac = -FOURPI * zion * E2 / (omega * tpiba2);

                    for (v, g2) in multizip((vloc.iter_mut(), gl.iter())) {
                        if *g2 >= EPS8 {
                            *v += fac * (-g2 * tpiba2 * 0.25).exp() / g2;
                        }
                    }
                }

                Ok(vloc)
            }
        }
    }

    /// `vloc_of_g` for all species, indexed by species.
    pub fn vloc_of_g_all(
        &self,
        pspot: &PSPot,
        gl: &[f64],
        tpiba2: f64,
        omega: f64,
        modified_coulomb: bool,
    ) -> Result<Vec<Vec<f64>>> {
        (0..pspot.n_species())
            .map(|isp| self.vloc_of_g(isp, pspot, gl, tpiba2, omega, modified_coulomb))
            .collect()
    }

    /// dV_loc/d(G^2) = 1/(2G) dV_loc/dG of species `isp` on every shell.
    ///
    /// G = 0 shells are zero. Shells are distributed over `comm` and the
    /// result is summed over it.
    #[allow(clippy::too_many_arguments)]
    pub fn dvloc_of_g(
        &self,
        isp: usize,
        pspot: &PSPot,
        gl: &[f64],
        tpiba2: f64,
        omega: f64,
        modified_coulomb: bool,
        comm: &dyn Comm,
    ) -> Result<Vec<f64>> {
        let atpsp = get_species(pspot, isp)?;

        check_shells(gl);

        let zion = atpsp.get_zion();

        match atpsp.get_local_form() {
            LocalForm::Coulomb => {
                if modified_coulomb {
                    return Err(VlocError::ModifiedCoulombUnsupported { species: isp });
                }

                Ok(dvloc_coul(zion, gl, tpiba2, omega))
            }

            LocalForm::Gth(gth) => {
                if modified_coulomb {
                    return Err(VlocError::ModifiedCoulombUnsupported { species: isp });
                }

                Ok(gl
                    .iter()
                    .map(|g2| gth::dvloc_gth(gth, zion, g2 * tpiba2, omega))
                    .collect())
            }

            LocalForm::Numeric => {
                let mut dvloc = vec![0.0; gl.len()];

                let range = comm.block_range(gl.len());
                let start = range.start;

                let mmax = atpsp.get_mmax();

                let one_shell = |ig: usize, work: &mut Vec<f64>| -> f64 {
                    let g2 = gl[ig];

                    if g2 < EPS8 {
                        return 0.0;
                    }

                    compute_dvloc_of_g(atpsp, g2 * tpiba2, omega, modified_coulomb, work)
                };

                let block = &mut dvloc[range];

                if utility::use_parallel_for_len(block.len() * mmax, self.get_parallel_min_len()) {
                    block.par_iter_mut().enumerate().for_each_init(
                        || vec![0.0; mmax],
                        |work, (i, v)| {
                            *v = one_shell(start + i, work);
                        },
                    );
                } else {
                    let mut work = vec![0.0; mmax];

                    for (i, v) in block.iter_mut().enumerate() {
                        *v = one_shell(start + i, &mut work);
                    }
                }

                comm.sum_f64(&mut dvloc);

                Ok(dvloc)
            }
        }
    }
}

// shells come sorted by length from the G-vector setup
fn check_shells(gl: &[f64]) {
    if let Some(i) = gl.windows(2).position(|w| w[1] < w[0]) {
        log::warn!(
            "G shells are not ascending at index {}: {} after {}",
            i + 1,
            gl[i + 1],
            gl[i]
        );
    }
}

fn get_species(pspot: &PSPot, isp: usize) -> Result<&dyn AtomPSP> {
    if isp >= pspot.n_species() {
        return Err(VlocError::SpeciesOutOfRange {
            isp,
            nsp: pspot.n_species(),
        });
    }

    Ok(pspot.get_psp(isp))
}

/// -4 pi Z e^2 / (Omega G^2), zero on the G = 0 shell.
pub fn vloc_coul(zion: f64, gl: &[f64], tpiba2: f64, omega: f64) -> Vec<f64> {
    gl.iter()
        .map(|g2| {
            if *g2 < EPS8 {
                0.0
            } else {
                -FOURPI * zion * E2 / (omega * tpiba2 * g2)
            }
        })
        .collect()
}

/// 4 pi Z e^2 / (Omega G^4), zero on the G = 0 shell.
pub fn dvloc_coul(zion: f64, gl: &[f64], tpiba2: f64, omega: f64) -> Vec<f64> {
    gl.iter()
        .map(|g2| {
            if *g2 < EPS8 {
                0.0
            } else {
                let gg = g2 * tpiba2;

                FOURPI * zion * E2 / (omega * gg * gg)
            }
        })
        .collect()
}

// q2 = G^2 in bohr^-2, q2 > 0
fn compute_dvloc_of_g(
    atpsp: &dyn AtomPSP,
    q2: f64,
    omega: f64,
    modified_coulomb: bool,
    work: &mut [f64],
) -> f64 {
    let zion = atpsp.get_zion();
    let vloc = atpsp.get_vloc();
    let rad = atpsp.get_rad();
    let rab = atpsp.get_rab();

    let q = q2.sqrt();

    // d/dq [ sin(qr)/q ] = r cos(qr)/q - sin(qr)/q^2
    for (i, w) in work.iter_mut().enumerate() {
        let r = rad[i];
        let (sn, cs) = (q * r).sin_cos();

        *w = (r * vloc[i] + zion * E2 * special::erf(r)) * (r * cs / q - sn / q2);
    }

    let mut dv = FOURPI / omega / (2.0 * q) * integral::simpson_rab(work, rab);

    if !modified_coulomb {
        let g2a = q2 / 4.0;

        dv += FOURPI / omega * zion * E2 * (-g2a).exp() * (g2a + 1.0) / (q2 * q2);
    }

    dv
}
