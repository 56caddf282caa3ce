use crate::{AtwfcError, Result};

use atompsp::AtomPSP;
use control::Control;
use dwconsts::*;
use dwmpi::Comm;
use pspot::PSPot;
use rayon::prelude::*;

/// Radial Fourier transforms of the atomic pseudo-wavefunctions,
///
/// chi_l(q) = 4 pi / sqrt(Omega) \int chi(r) r j_l(q r) dr,
///
/// tabulated on q_i = i * dq for every species and wavefunction. Entries of
/// wavefunctions with negative occupation stay zero.
#[derive(Debug, Clone)]
pub struct AtwfcTable {
    dq: f64,
    nqx: usize,
    qmax: f64,
    margin: f64,
    parallel_min_len: usize,
    verbose: bool,

    // tab[isp][iwfc][iq]
    tab: Option<Vec<Vec<Vec<f64>>>>,
}

impl Default for AtwfcTable {
    fn default() -> Self {
        AtwfcTable {
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

impl AtwfcTable {
    pub fn new() -> AtwfcTable {
        AtwfcTable::default()
    }

    pub fn from_control(ctrl: &Control) -> AtwfcTable {
        AtwfcTable {
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

    pub fn n_species(&self) -> usize {
        self.tab.as_ref().map_or(0, |t| t.len())
    }

    pub fn get_tab(&self, isp: usize, iwfc: usize) -> Option<&[f64]> {
        self.tab
            .as_ref()
            .and_then(|t| t.get(isp))
            .and_then(|t| t.get(iwfc))
            .map(|v| v.as_slice())
    }

    /// largest q the table interpolates without leaving the grid
    pub fn get_q_covered(&self) -> f64 {
        utility::q_covered(self.nqx, self.dq)
    }

    /// Same growth rules as the local potential table: build on first use,
    /// regrow with overshoot when `qmax` exceeds the covered range, and
    /// return `Ok(false)` without touching anything otherwise.
    pub fn init(&mut self, qmax: f64, pspot: &PSPot, omega: f64, comm: &dyn Comm) -> Result<bool> {
        if !qmax.is_finite() || qmax < 0.0 {
            return Err(AtwfcError::InvalidQmax(qmax));
        }

        if !(omega > 0.0) {
            return Err(AtwfcError::InvalidVolume(omega));
        }

        check_lmax(pspot)?;

        let qmax_new = match self.tab {
            Some(ref tab) if tab.len() != pspot.n_species() => {
                return Err(AtwfcError::TableMismatch {
                    ntab: tab.len(),
                    nsp: pspot.n_species(),
                })
            }

            None => qmax,

            Some(_) if qmax > self.qmax => qmax + self.margin * (qmax - self.qmax),

            Some(_) => {
                log::debug!(
                    "atomic wavefunction table covers q = {:.4} (qmax = {:.4})",
                    qmax,
                    self.qmax
                );

                return Ok(false);
            }
        };

        let nqx = utility::n_grid_points(qmax_new, self.dq);

        log::info!(
            "building atomic wavefunction table: nqx = {} qmax = {:.4} ranks = {}",
            nqx,
            qmax_new,
            comm.size()
        );

        let range = comm.block_range(nqx);
        let startq = range.start;

        let fact = FOURPI / omega.sqrt();

        let mut tab = Vec::with_capacity(pspot.n_species());

        for atpsp in pspot.iter() {
            let mut tab_sp = vec![vec![0.0; nqx]; atpsp.get_nwfc()];

            for (iwfc, tab_wfc) in tab_sp.iter_mut().enumerate() {
                if atpsp.get_wfc(iwfc).oc < 0.0 {
                    continue;
                }

                let block = &mut tab_wfc[range.clone()];

                self.fill_one(atpsp, iwfc, block, startq, fact);

                comm.sum_f64(tab_wfc);
            }

            tab.push(tab_sp);
        }

        self.tab = Some(tab);
        self.nqx = nqx;
        self.qmax = qmax_new;

        if self.verbose {
            self.display(comm);
        }

        Ok(true)
    }

    fn fill_one(&self, atpsp: &dyn AtomPSP, iwfc: usize, block: &mut [f64], startq: usize, fact: f64) {
        let wfc = atpsp.get_wfc(iwfc);
        let rad = atpsp.get_rad();
        let rab = atpsp.get_rab();

        let mmax = rad.len();
        let dq = self.dq;

        let one_q = |iq: usize, work: &mut Vec<f64>| -> f64 {
            let q = iq as f64 * dq;

            for (i, w) in work.iter_mut().enumerate() {
                let r = rad[i];

                *w = wfc.chi[i] * r * special::spherical_bessel_jn(wfc.l, q * r);
            }

            fact * integral::simpson_rab(work, rab)
        };

        if utility::use_parallel_for_len(block.len() * mmax, self.parallel_min_len) {
            block.par_iter_mut().enumerate().for_each_init(
                || vec![0.0; mmax],
                |work, (i, v)| {
                    *v = one_q(startq + i, work);
                },
            );
        } else {
            let mut work = vec![0.0; mmax];

            for (i, v) in block.iter_mut().enumerate() {
                *v = one_q(startq + i, &mut work);
            }
        }
    }

    /// chi_l(q) of wavefunction `iwfc` of species `isp` by four-point
    /// interpolation; `q` in bohr^-1 must lie within `get_q_covered()`.
    pub fn interp(&self, isp: usize, iwfc: usize, q: f64) -> f64 {
        let tab = self.get_tab(isp, iwfc).unwrap_or_else(|| {
            panic!(
                "atomic wavefunction table for species {} wfc {} is not built",
                isp, iwfc
            )
        });

        debug_assert!(q <= self.get_q_covered(), "q = {} beyond qmax = {}", q, self.qmax);

        utility::interpolate_uniform(tab, q, self.dq)
    }

    pub fn scale(&mut self, factor: f64) {
        if let Some(tab) = self.tab.as_mut() {
            for v in tab.iter_mut().flatten().flatten() {
                *v *= factor;
            }
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

        println!(
            "   {:<28} = {:>8} points, dq = {:.4}, qmax = {:.4}",
            "atomic wfc table", self.nqx, self.dq, self.qmax
        );
    }
}

fn check_lmax(pspot: &PSPot) -> Result<()> {
    for (isp, atpsp) in pspot.iter().enumerate() {
        if let Some(l) = atpsp.get_max_lchi() {
            if l > special::LMAX_YLM {
                return Err(AtwfcError::UnsupportedL {
                    species: isp,
                    l,
                    lmax: special::LMAX_YLM,
                });
            }
        }
    }

    Ok(())
}
