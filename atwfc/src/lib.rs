//! Starting wavefunctions from superposed atomic pseudo-orbitals.
//!
//! For one k point and its plane waves k+G every atomic orbital
//! chi_l(r) Y_lm of every atom is expanded as
//!
//! psi(k+G) = i^l exp(-i 2 pi (k+G).tau) Y_lm(k+G) chi_l(|k+G|),
//!
//! with the radial part taken from an `AtwfcTable`. Noncollinear runs build
//! two-component spinors, either rotated along the starting moment of each
//! species or as spin-orbit eigenstates.

mod error;
pub use error::*;

mod spin;
pub use spin::*;

mod table;
pub use table::*;

use dwconsts::*;
use dwmpi::Comm;
use pspot::PSPot;
use rayon::prelude::*;
use std::ops::Range;
use types::c64;
use vector3::Vector3f64;

/// Atom position in cartesian coordinates, alat units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    pub isp: usize,
    pub tau: Vector3f64,
}

impl Atom {
    pub fn new(isp: usize, tau: Vector3f64) -> Atom {
        Atom { isp, tau }
    }
}

/// Atomic wavefunctions of one k point, `npol` components each.
#[derive(Debug, Clone, PartialEq)]
pub struct WfcAtom {
    npw: usize,
    npol: usize,
    nwfc: usize,

    // data[(iwfc * npol + ipol) * npw + ig]
    data: Vec<c64>,
}

impl WfcAtom {
    pub fn new(npw: usize, npol: usize, nwfc: usize) -> WfcAtom {
        WfcAtom {
            npw,
            npol,
            nwfc,
            data: vec![c64::new(0.0, 0.0); npw * npol * nwfc],
        }
    }

    pub fn get_npw(&self) -> usize {
        self.npw
    }

    pub fn get_npol(&self) -> usize {
        self.npol
    }

    pub fn get_nwfc(&self) -> usize {
        self.nwfc
    }

    pub fn get_data(&self) -> &[c64] {
        &self.data
    }

    pub fn get_wfc(&self, iwfc: usize, ipol: usize) -> &[c64] {
        let start = (iwfc * self.npol + ipol) * self.npw;

        &self.data[start..start + self.npw]
    }

    pub fn get_wfc_mut(&mut self, iwfc: usize, ipol: usize) -> &mut [c64] {
        let start = (iwfc * self.npol + ipol) * self.npw;

        &mut self.data[start..start + self.npw]
    }

    /// <psi_a|psi_b> summed over plane waves and spin components
    pub fn overlap(&self, a: usize, b: usize) -> c64 {
        (0..self.npol)
            .map(|ipol| {
                self.get_wfc(a, ipol)
                    .iter()
                    .zip(self.get_wfc(b, ipol).iter())
                    .map(|(x, y)| x.conj() * y)
                    .sum::<c64>()
            })
            .sum()
    }
}

/// Number of starting wavefunctions produced by `atomic_wfc`.
///
/// Only orbitals with non-negative occupation count.
pub fn n_atom_wfc(atoms: &[Atom], pspot: &PSPot, noncolin: bool) -> usize {
    let mut n = 0;

    for atom in atoms.iter() {
        let atpsp = pspot.get_psp(atom.isp);

        for iwfc in 0..atpsp.get_nwfc() {
            let wfc = atpsp.get_wfc(iwfc);

            if wfc.oc < 0.0 {
                continue;
            }

            let l = wfc.l;

            n += match (noncolin, atpsp.has_so()) {
                (false, _) => 2 * l + 1,

                (true, false) => 2 * (2 * l + 1),

                (true, true) => 2 * l + if is_j_up(l, wfc.j) { 2 } else { 0 },
            };
        }
    }

    n
}

// Y_lm(k+G) for l <= lmax on the local plane waves, lm = l^2 + m + l
struct KgYlm {
    data: Vec<Vec<f64>>,
}

impl KgYlm {
    fn new(kg: &[Vector3f64], lmax: usize, min_len: usize) -> KgYlm {
        let mut data = Vec::with_capacity((lmax + 1) * (lmax + 1));

        for l in 0..=lmax {
            for m in utility::get_quant_num_m(l) {
                data.push(map_pw(kg, min_len, |v| {
                    special::real_spherical_harmonics(l, m, *v)
                }));
            }
        }

        KgYlm { data }
    }

    fn get(&self, l: usize, m: i32) -> &[f64] {
        &self.data[l * l + (m + l as i32) as usize]
    }

    fn complex(&self, l: usize, m: i32, ig: usize) -> c64 {
        let am = m.abs();

        let r_pos = self.get(l, am)[ig];
        let r_neg = if am == 0 { 0.0 } else { self.get(l, -am)[ig] };

        special::complex_from_real_spherical_harmonics(m, r_pos, r_neg)
    }
}

fn map_pw<T, F>(kg: &[Vector3f64], min_len: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&Vector3f64) -> T + Sync + Send,
{
    if utility::use_parallel_for_len(kg.len(), min_len) {
        kg.par_iter().map(&f).collect()
    } else {
        kg.iter().map(&f).collect()
    }
}

fn check_input(atoms: &[Atom], pspot: &PSPot, tab: &AtwfcTable, spin: &SpinConfig) -> Result<()> {
    if !tab.is_allocated() {
        return Err(AtwfcError::TableNotAllocated);
    }

    let nsp = pspot.n_species();

    if tab.n_species() != nsp {
        return Err(AtwfcError::TableMismatch {
            ntab: tab.n_species(),
            nsp,
        });
    }

    for atom in atoms.iter() {
        if atom.isp >= nsp {
            return Err(AtwfcError::SpeciesOutOfRange { isp: atom.isp, nsp });
        }
    }

    for (isp, atpsp) in pspot.iter().enumerate() {
        let variant = spin.variant(atpsp.has_so());

        let wfcs: Vec<&atompsp::AtomWfc> = (0..atpsp.get_nwfc())
            .map(|i| atpsp.get_wfc(i))
            .filter(|w| w.oc >= 0.0)
            .collect();

        for wfc in wfcs.iter() {
            if wfc.l > special::LMAX_YLM {
                return Err(AtwfcError::UnsupportedL {
                    species: isp,
                    l: wfc.l,
                    lmax: special::LMAX_YLM,
                });
            }

            if variant == WfcVariant::SpinOrbit || variant == WfcVariant::SpinOrbitMag {
                let (up, down) = (is_j_up(wfc.l, wfc.j), is_j_down(wfc.l, wfc.j));

                if !up && !down {
                    return Err(AtwfcError::InvalidJ {
                        species: isp,
                        l: wfc.l,
                        j: wfc.j,
                    });
                }

                // averaging pairs every j = l + 1/2 orbital with a j = l - 1/2 one
                if variant == WfcVariant::SpinOrbitMag && wfc.l > 0 {
                    let has_partner = wfcs
                        .iter()
                        .any(|w| w.l == wfc.l && (is_j_up(w.l, w.j) != up));

                    if !has_partner {
                        return Err(AtwfcError::MissingPartner {
                            species: isp,
                            l: wfc.l,
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

// index of the next `count` wavefunctions
fn take_slots(n: &mut usize, count: usize, natomwfc: usize) -> usize {
    if *n + count > natomwfc {
        panic!(
            "atomic wavefunctions: {} produced, {} expected",
            *n + count,
            natomwfc
        );
    }

    let first = *n;
    *n += count;

    first
}

fn i_pow(l: usize) -> c64 {
    match l % 4 {
        0 => c64::new(1.0, 0.0),
        1 => c64::new(0.0, 1.0),
        2 => c64::new(-1.0, 0.0),
        _ => c64::new(0.0, -1.0),
    }
}

/// Superposition of atomic orbitals at k point `xk` on the plane waves
/// `gk`, both cartesian in units of 2 pi / alat.
///
/// The plane waves are split across `comm` and the result is summed over
/// it, so every rank returns the complete array.
#[allow(clippy::too_many_arguments)]
pub fn atomic_wfc(
    xk: Vector3f64,
    gk: &[Vector3f64],
    atoms: &[Atom],
    pspot: &PSPot,
    tab: &AtwfcTable,
    spin: &SpinConfig,
    tpiba: f64,
    comm: &dyn Comm,
) -> Result<WfcAtom> {
    check_input(atoms, pspot, tab, spin)?;

    let npw = gk.len();
    let npol = spin.npol();

    let natomwfc = n_atom_wfc(atoms, pspot, spin.noncolin);

    if let Some(q) = gk
        .iter()
        .map(|g| (xk + *g).norm2() * tpiba)
        .find(|q| !(*q <= tab.get_q_covered()))
    {
        return Err(AtwfcError::QueryOutOfRange {
            q,
            qmax: tab.get_qmax(),
        });
    }

    let mut wfcatom = WfcAtom::new(npw, npol, natomwfc);

    let range = comm.block_range(npw);

    log::debug!(
        "atomic_wfc: {} wavefunctions, npw = {}, rank {} takes {:?}",
        natomwfc,
        npw,
        comm.rank(),
        range
    );

    let min_len = tab.get_parallel_min_len();

    let kg: Vec<Vector3f64> = gk[range.clone()].iter().map(|g| xk + *g).collect();
    let qg: Vec<f64> = kg.iter().map(|v| v.norm2() * tpiba).collect();

    let lmax = pspot.get_max_lchi().unwrap_or(0);
    let ylm = KgYlm::new(&kg, lmax, min_len);

    // chiq[isp][iwfc][ig]
    let chiq: Vec<Vec<Vec<f64>>> = pspot
        .iter()
        .enumerate()
        .map(|(isp, atpsp)| {
            (0..atpsp.get_nwfc())
                .map(|iwfc| {
                    if atpsp.get_wfc(iwfc).oc < 0.0 {
                        Vec::new()
                    } else {
                        qg.iter().map(|q| tab.interp(isp, iwfc, *q)).collect()
                    }
                })
                .collect()
        })
        .collect();

    let mut n = 0;

    for atom in atoms.iter() {
        let isp = atom.isp;
        let atpsp = pspot.get_psp(isp);

        let sk = map_pw(&kg, min_len, |v| {
            c64::from_polar(1.0, -TWOPI * v.dot_product(&atom.tau))
        });

        let variant = spin.variant(atpsp.has_so());

        for iwfc in 0..atpsp.get_nwfc() {
            let wfc = atpsp.get_wfc(iwfc);

            if wfc.oc < 0.0 {
                continue;
            }

            let l = wfc.l;
            let lphase = i_pow(l);

            let chi = &chiq[isp][iwfc];

            match variant {
                WfcVariant::Collinear => {
                    let first = take_slots(&mut n, 2 * l + 1, natomwfc);

                    for (im, m) in utility::get_quant_num_m(l).into_iter().enumerate() {
                        let out = &mut wfcatom.get_wfc_mut(first + im, 0)[range.clone()];

                        for (ig, v) in out.iter_mut().enumerate() {
                            *v = lphase * sk[ig] * ylm.get(l, m)[ig] * chi[ig];
                        }
                    }
                }

                WfcVariant::NoncolinUpDown => {
                    let first = take_slots(&mut n, 2 * (2 * l + 1), natomwfc);

                    write_updown(&mut wfcatom, first, l, lphase, &sk, &ylm, chi, spin, isp, &range);
                }

                WfcVariant::SpinOrbit => {
                    let count = 2 * l + if is_j_up(l, wfc.j) { 2 } else { 0 };

                    let first = take_slots(&mut n, count, natomwfc);

                    write_spin_orbit(&mut wfcatom, first, l, wfc.j, lphase, &sk, &ylm, chi, &range);
                }

                WfcVariant::SpinOrbitMag => {
                    // the j = l - 1/2 orbital only enters through the average
                    if is_j_down(l, wfc.j) {
                        continue;
                    }

                    let chi_avg = if l == 0 {
                        chi.clone()
                    } else {
                        // partner existence is checked up front
                        let partner = (0..atpsp.get_nwfc())
                            .find(|&i| {
                                let w = atpsp.get_wfc(i);
                                w.oc >= 0.0 && w.l == l && is_j_down(w.l, w.j)
                            })
                            .ok_or(AtwfcError::MissingPartner { species: isp, l })?;

                        let lf = l as f64;

                        chi.iter()
                            .zip(chiq[isp][partner].iter())
                            .map(|(up, down)| ((lf + 1.0) * up + lf * down) / (2.0 * lf + 1.0))
                            .collect()
                    };

                    let first = take_slots(&mut n, 2 * (2 * l + 1), natomwfc);

                    write_updown(&mut wfcatom, first, l, lphase, &sk, &ylm, &chi_avg, spin, isp, &range);
                }
            }
        }
    }

    if n != natomwfc {
        panic!("atomic wavefunctions: {} produced, {} expected", n, natomwfc);
    }

    comm.sum_c64(&mut wfcatom.data);

    Ok(wfcatom)
}

// Spinors pointing along (angle1, angle2) of the species for wavefunctions
// first..first+2l+1 and opposite to it for the next 2l+1.
#[allow(clippy::too_many_arguments)]
fn write_updown(
    wfcatom: &mut WfcAtom,
    first: usize,
    l: usize,
    lphase: c64,
    sk: &[c64],
    ylm: &KgYlm,
    chi: &[f64],
    spin: &SpinConfig,
    isp: usize,
    range: &Range<usize>,
) {
    let alpha = spin.get_angle1(isp);
    let gamman = -spin.get_angle2(isp) + 0.5 * PI;

    let eg = c64::from_polar(1.0, 0.5 * gamman);

    let nm = 2 * l + 1;

    for (im, m) in utility::get_quant_num_m(l).into_iter().enumerate() {
        let y = ylm.get(l, m);

        for (iblock, angle) in [alpha, alpha + PI].into_iter().enumerate() {
            let fup = eg * (0.5 * angle).cos();
            let fdown = eg.conj() * I_C64 * (0.5 * angle).sin();

            let iwfc = first + im + iblock * nm;

            for (ipol, f) in [fup, fdown].into_iter().enumerate() {
                let out = &mut wfcatom.get_wfc_mut(iwfc, ipol)[range.clone()];

                for (ig, v) in out.iter_mut().enumerate() {
                    *v = f * lphase * sk[ig] * y[ig] * chi[ig];
                }
            }
        }
    }
}

// |l j m_j> spinors, m running over -l-1..=l
#[allow(clippy::too_many_arguments)]
fn write_spin_orbit(
    wfcatom: &mut WfcAtom,
    first: usize,
    l: usize,
    j: f64,
    lphase: c64,
    sk: &[c64],
    ylm: &KgYlm,
    chi: &[f64],
    range: &Range<usize>,
) {
    let li = l as i32;

    let mut iwfc = first;

    for m in -li - 1..=li {
        let fact = [spinor(l, j, m, 0), spinor(l, j, m, 1)];

        if fact.iter().all(|f| f.abs() < 1.0e-8) {
            continue;
        }

        for (ipol, f) in fact.into_iter().enumerate() {
            if f.abs() < 1.0e-8 {
                continue;
            }

            let mm = match sph_ind(l, j, m, ipol) {
                Some(mm) => mm,
                None => continue,
            };

            let out = &mut wfcatom.get_wfc_mut(iwfc, ipol)[range.clone()];

            for (ig, v) in out.iter_mut().enumerate() {
                *v = lphase * f * sk[ig] * ylm.complex(l, mm, ig) * chi[ig];
            }
        }

        iwfc += 1;
    }
}
