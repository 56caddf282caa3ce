use crate::gth;
use crate::{Result, VlocError};

use atompsp::{AtomPSP, LocalForm};
use control::Control;
use dwconsts::*;
use dwmpi::Comm;
use pspot::PSPot;
use rayon::prelude::*;

/// Short-range part of the local pseudopotential of every species,
/// tabulated on the uniform grid q_i = i * dq.
///
/// The long-range tail -Z e^2 erf(r)/r is removed before tabulation so the
/// radial integrals converge on a finite mesh; `vloc_of_g` adds its
/// analytic transform back. The q = 0 entry is the G = 0 value itself,
/// i.e. the finite part left after removing the bare Coulomb divergence
/// (or the erf tail when `modified_coulomb` is set).
#[derive(Debug, Clone)]
pub struct VlocTable {
    dq: f64,
    nqx: usize,
    qmax: f64,
    margin: f64,
    parallel_min_len: usize,
    verbose: bool,

    // tab[isp][iq]
    tab: Option<Vec<Vec<f64>>>,
}

impl Default for VlocTable {
    fn default() -> Self {
        VlocTable {
            dq: DQ,
            nqx: 0,
            qmax: 0.0,
            margin: 10.0,
            parallel_min_len: utility::PARALLEL_MIN_LEN,
            verbose: false,
            tab: None,
        }
    }
}

impl VlocTable {
    pub fn new() -> VlocTable {
        VlocTable::default()
    }

    pub fn from_control(ctrl: &Control) -> VlocTable {
        VlocTable {
            margin: ctrl.get_vloc_qmax_margin(),
            parallel_min_len: ctrl.get_parallel_min_len(),
            verbose: ctrl.is_verbose(),
            ..Default::default()
        }
    }

    pub fn get_dq(&self) -> f64 {
        self.dq
    }

    pub fn get_nqx(&self) -> usize {
        self.nqx
    }

    pub fn get_qmax(&self) -> f64 {
        self.qmax
    }

    pub fn get_parallel_min_len(&self) -> usize {
        self.parallel_min_len
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_allocated(&self) -> bool {
        self.tab.is_some()
    }

    pub fn get_tab(&self, isp: usize) -> Option<&[f64]> {
        self.tab.as_ref().and_then(|t| t.get(isp)).map(|v| v.as_slice())
    }

    /// Make sure the table covers q up to `qmax`.
    ///
    /// Returns `Ok(true)` when the table was (re)built and `Ok(false)` when
    /// the cached table already covered the request and nothing changed.
    pub fn init(
        &mut self,
        qmax: f64,
        pspot: &PSPot,
        modified_coulomb: bool,
        omega: f64,
        comm: &dyn Comm,
    ) -> Result<bool> {
        if !qmax.is_finite() || qmax < 0.0 {
            return Err(VlocError::InvalidQmax(qmax));
        }

        if !(omega > 0.0) {
            return Err(VlocError::InvalidVolume(omega));
        }

        if modified_coulomb {
            check_modified_coulomb(pspot)?;
        }

        let qmax_new = match self.tab {
            None => qmax,

            Some(_) if qmax > self.qmax => qmax + self.margin * (qmax - self.qmax),

            Some(_) => {
                log::debug!(
                    "vloc table covers q = {:.4} (qmax = {:.4}), nothing to do",
                    qmax,
                    self.qmax
                );

                return Ok(false);
            }
        };

        let nqx = utility::n_grid_points(qmax_new, self.dq);

        log::info!(
            "building vloc table: nqx = {} qmax = {:.4} nsp = {} ranks = {}",
            nqx,
            qmax_new,
            pspot.n_species(),
            comm.size()
        );

        let range = comm.block_range(nqx);
        let startq = range.start;

        log::debug!("rank {} tabulates q points {:?}", comm.rank(), range);

        let mut tab = vec![vec![0.0; nqx]; pspot.n_species()];

        for (isp, tab_sp) in tab.iter_mut().enumerate() {
            let atpsp = pspot.get_psp(isp);

            let block = &mut tab_sp[range.clone()];

            match atpsp.get_local_form() {
                // handled analytically in vloc_of_g
                LocalForm::Coulomb => continue,

                LocalForm::Gth(gth) => {
                    let zion = atpsp.get_zion();

                    for (i, v) in block.iter_mut().enumerate() {
                        let q = (startq + i) as f64 * self.dq;

                        // q = 0 keeps the finite part left by the bare Coulomb term,
                        // like the numeric q = 0 column
                        *v = if startq + i == 0 {
                            gth::vloc_gth(gth, zion, 0.0, omega)
                        } else {
                            gth::vloc_gth_short_range(gth, zion, q * q, omega)
                        };
                    }
                }

                LocalForm::Numeric => {
                    self.fill_numeric(atpsp, block, startq, modified_coulomb, omega);
                }
            }

            comm.sum_f64(tab_sp);
        }

        self.tab = Some(tab);
        self.nqx = nqx;
        self.qmax = qmax_new;

        if self.verbose {
            self.display(comm);
        }

        Ok(true)
    }

    fn fill_numeric(
        &self,
        atpsp: &dyn AtomPSP,
        block: &mut [f64],
        startq: usize,
        modified_coulomb: bool,
        omega: f64,
    ) {
        let zion = atpsp.get_zion();
        let vloc = atpsp.get_vloc();
        let rad = atpsp.get_rad();
        let rab = atpsp.get_rab();

        let mmax = rad.len();
        let dq = self.dq;

        let one_q = |iq: usize, work: &mut Vec<f64>| -> f64 {
            if iq == 0 {
                compute_tab_vloc_q0(zion, vloc, rad, rab, modified_coulomb, work)
            } else {
                compute_tab_vloc_q(zion, vloc, rad, rab, iq as f64 * dq, work)
            }
        };

        let fact = FOURPI / omega;

        if utility::use_parallel_for_len(block.len() * mmax, self.parallel_min_len) {
            block.par_iter_mut().enumerate().for_each_init(
                || vec![0.0; mmax],
                |work, (i, v)| {
                    *v = fact * one_q(startq + i, work);
                },
            );
        } else {
            let mut work = vec![0.0; mmax];

            for (i, v) in block.iter_mut().enumerate() {
                *v = fact * one_q(startq + i, &mut work);
            }
        }
    }

    /// Four-point interpolation of the table of species `isp` at
    /// q = sqrt(gl * tpiba2) for every shell.
    ///
    /// The caller guarantees that every q lies within `get_qmax()`; use
    /// `try_interp` when that is not known.
    pub fn interp(&self, isp: usize, gl: &[f64], tpiba2: f64) -> Vec<f64> {
        let tab = self
            .get_tab(isp)
            .unwrap_or_else(|| panic!("vloc table for species {} is not built", isp));

        let q_grid = utility::q_covered(self.nqx, self.dq);

        gl.iter()
            .map(|g2| {
                let q = (g2 * tpiba2).sqrt();

                debug_assert!(q <= q_grid, "q = {} beyond qmax = {}", q, self.qmax);

                utility::interpolate_uniform(tab, q, self.dq)
            })
            .collect()
    }

    /// Checked variant of `interp`.
    pub fn try_interp(&self, isp: usize, gl: &[f64], tpiba2: f64) -> Result<Vec<f64>> {
        let tab = self.tab.as_ref().ok_or(VlocError::TableNotAllocated)?;

        if isp >= tab.len() {
            return Err(VlocError::SpeciesOutOfRange {
                isp,
                nsp: tab.len(),
            });
        }

        // the stencil of the largest shell must stay inside the grid
        let q_grid = utility::q_covered(self.nqx, self.dq);

        if let Some(q) = gl
            .iter()
            .map(|g2| (g2 * tpiba2).sqrt())
            .find(|q| !(*q <= q_grid))
        {
            return Err(VlocError::QueryOutOfRange { q, qmax: self.qmax });
        }

        Ok(self.interp(isp, gl, tpiba2))
    }

    /// Multiply every entry by `factor`, e.g. the ratio of old to new cell
    /// volume when the cell changes and the table is not rebuilt.
    pub fn scale(&mut self, factor: f64) {
        match self.tab.as_mut() {
            Some(tab) => {
                for v in tab.iter_mut().flat_map(|t| t.iter_mut()) {
                    *v *= factor;
                }
            }

            None => log::debug!("scale called on an empty vloc table"),
        }
    }

    pub fn deallocate(&mut self) {
        self.tab = None;
        self.nqx = 0;
        self.qmax = 0.0;
    }

    pub fn display(&self, comm: &dyn Comm) {
        if !dwmpi::is_root(comm) {
            return;
        }

        const OUT_WIDTH1: usize = 28;

        println!(
            "   {:<width1$} = {:>8} points, dq = {:.4}, qmax = {:.4}",
            "vloc interpolation table",
            self.nqx,
            self.dq,
            self.qmax,
            width1 = OUT_WIDTH1
        );
    }
}

pub(crate) fn check_modified_coulomb(pspot: &PSPot) -> Result<()> {
    for isp in 0..pspot.n_species() {
        if !matches!(pspot.get_psp(isp).get_local_form(), LocalForm::Numeric) {
            return Err(VlocError::ModifiedCoulombUnsupported { species: isp });
        }
    }

    Ok(())
}

// q = 0: the divergent part cancels against the G = 0 Hartree term, so only
// r (r V + Z e^2) is integrated; with the modified Coulomb treatment the
// erf tail stays subtracted instead.
fn compute_tab_vloc_q0(
    zion: f64,
    vloc: &[f64],
    rad: &[f64],
    rab: &[f64],
    modified_coulomb: bool,
    work: &mut [f64],
) -> f64 {
    for (i, w) in work.iter_mut().enumerate() {
        let r = rad[i];

        let tail = if modified_coulomb {
            special::erf(r)
        } else {
            1.0
        };

        *w = r * (r * vloc[i] + zion * E2 * tail);
    }

    integral::simpson_rab(work, rab)
}

fn compute_tab_vloc_q(
    zion: f64,
    vloc: &[f64],
    rad: &[f64],
    rab: &[f64],
    q: f64,
    work: &mut [f64],
) -> f64 {
    for (i, w) in work.iter_mut().enumerate() {
        let r = rad[i];

        *w = (r * vloc[i] + zion * E2 * special::erf(r)) * (q * r).sin() / q;
    }

    integral::simpson_rab(work, rab)
}
