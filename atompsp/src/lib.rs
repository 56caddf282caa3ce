mod error;
pub use error::*;

mod upf;
pub use upf::*;

mod radial;
pub use radial::*;

/// Goedecker-Teter-Hutter local part: `rloc` in bohr, `cc` in Hartree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GthLocal {
    pub rloc: f64,
    pub cc: [f64; 4],
}

/// How the local potential of a species is represented.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LocalForm {
    /// tabulated on the radial mesh
    #[default]
    Numeric,
    /// bare -Z e^2 / r, no tabulated data needed
    Coulomb,
    /// analytic GTH form
    Gth(GthLocal),
}

/// One atomic pseudo-wavefunction, chi(r) = r R(r) on the radial mesh.
#[derive(Debug, Clone, Default)]
pub struct AtomWfc {
    pub label: String,
    pub l: usize,
    /// total angular momentum, only meaningful with spin-orbit data
    pub j: f64,
    /// occupation; negative marks an orbital not used for starting wavefunctions
    pub oc: f64,
    pub chi: Vec<f64>,
}

pub trait AtomPSP: Send + Sync {
    fn get_element(&self) -> &str;

    /// valence charge
    fn get_zion(&self) -> f64;

    fn get_mmax(&self) -> usize {
        self.get_rad().len()
    }

    fn get_rad(&self) -> &[f64];

    fn get_rab(&self) -> &[f64];

    /// local potential on the radial mesh, Hartree
    fn get_vloc(&self) -> &[f64];

    fn get_local_form(&self) -> &LocalForm;

    fn is_coulomb(&self) -> bool {
        matches!(self.get_local_form(), LocalForm::Coulomb)
    }

    fn get_gth(&self) -> Option<&GthLocal> {
        match self.get_local_form() {
            LocalForm::Gth(gth) => Some(gth),
            _ => None,
        }
    }

    fn has_so(&self) -> bool;

    fn get_nwfc(&self) -> usize;

    fn get_wfc(&self, iwfc: usize) -> &AtomWfc;

    /// largest l among the wavefunctions used for starting wavefunctions
    fn get_max_lchi(&self) -> Option<usize> {
        (0..self.get_nwfc())
            .map(|i| self.get_wfc(i))
            .filter(|w| w.oc >= 0.0)
            .map(|w| w.l)
            .max()
    }
}

pub fn read_file(scheme: &str, pspfile: &str) -> Result<Box<dyn AtomPSP>> {
    match scheme {
        "upf" => Ok(Box::new(AtomPSPUPF::from_file(pspfile)?)),

        _ => Err(PspError::UnknownScheme(scheme.to_string())),
    }
}
