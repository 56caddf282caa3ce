use crate::{AtomPSP, AtomWfc, GthLocal, LocalForm};

/// Species assembled in memory, e.g. by a host code that already holds the
/// radial data or by model potentials in tests.
#[derive(Debug, Default, Clone)]
pub struct AtomPSPRadial {
    element: String,
    zion: f64,
    has_so: bool,
    local_form: LocalForm,
    rad: Vec<f64>,
    rab: Vec<f64>,
    vloc: Vec<f64>,
    wfc: Vec<AtomWfc>,
}

impl AtomPSPRadial {
    /// `rab` is the mesh derivative dr/di used by the radial quadrature.
    pub fn new(element: &str, zion: f64, rad: Vec<f64>, rab: Vec<f64>) -> AtomPSPRadial {
        assert_eq!(rad.len(), rab.len(), "rad and rab must share the mesh");

        let vloc = vec![0.0; rad.len()];

        AtomPSPRadial {
            element: element.to_string(),
            zion,
            rad,
            rab,
            vloc,
            ..Default::default()
        }
    }

    /// Logarithmic mesh r_i = exp(xmin + i dx) / zmesh, the usual atomic grid.
    pub fn log_mesh(xmin: f64, zmesh: f64, dx: f64, mmax: usize) -> (Vec<f64>, Vec<f64>) {
        let rad: Vec<f64> = (0..mmax)
            .map(|i| (xmin + i as f64 * dx).exp() / zmesh)
            .collect();

        let rab = rad.iter().map(|r| r * dx).collect();

        (rad, rab)
    }

    pub fn with_vloc(mut self, vloc: Vec<f64>) -> Self {
        assert_eq!(vloc.len(), self.rad.len(), "vloc must live on the radial mesh");

        self.vloc = vloc;
        self
    }

    pub fn with_vloc_fn<F: Fn(f64) -> f64>(mut self, f: F) -> Self {
        self.vloc = self.rad.iter().map(|r| f(*r)).collect();
        self
    }

    pub fn coulomb(mut self) -> Self {
        self.local_form = LocalForm::Coulomb;
        self
    }

    pub fn gth(mut self, rloc: f64, cc: [f64; 4]) -> Self {
        self.local_form = LocalForm::Gth(GthLocal { rloc, cc });
        self
    }

    pub fn spin_orbit(mut self, has_so: bool) -> Self {
        self.has_so = has_so;
        self
    }

    pub fn add_wfc(mut self, label: &str, l: usize, j: f64, oc: f64, chi: Vec<f64>) -> Self {
        assert_eq!(chi.len(), self.rad.len(), "chi must live on the radial mesh");

        self.wfc.push(AtomWfc {
            label: label.to_string(),
            l,
            j,
            oc,
            chi,
        });
        self
    }

    pub fn add_wfc_fn<F: Fn(f64) -> f64>(self, label: &str, l: usize, j: f64, oc: f64, f: F) -> Self {
        let chi = self.rad.iter().map(|r| f(*r)).collect();

        self.add_wfc(label, l, j, oc, chi)
    }
}

impl AtomPSP for AtomPSPRadial {
    fn get_element(&self) -> &str {
        &self.element
    }

    fn get_zion(&self) -> f64 {
        self.zion
    }

    fn get_rad(&self) -> &[f64] {
        &self.rad
    }

    fn get_rab(&self) -> &[f64] {
        &self.rab
    }

    fn get_vloc(&self) -> &[f64] {
        &self.vloc
    }

    fn get_local_form(&self) -> &LocalForm {
        &self.local_form
    }

    fn has_so(&self) -> bool {
        self.has_so
    }

    fn get_nwfc(&self) -> usize {
        self.wfc.len()
    }

    fn get_wfc(&self, iwfc: usize) -> &AtomWfc {
        &self.wfc[iwfc]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_log_mesh() {
        let (rad, rab) = AtomPSPRadial::log_mesh(-7.0, 1.0, 0.0125, 11);

        assert_relative_eq!(rad[0], (-7.0f64).exp());
        assert_relative_eq!(rad[10] / rad[9], 0.0125f64.exp(), max_relative = 1.0e-14);
        assert_relative_eq!(rab[3], rad[3] * 0.0125);
    }

    #[test]
    fn test_builder_flags() {
        let (rad, rab) = AtomPSPRadial::log_mesh(-7.0, 1.0, 0.0125, 11);

        let psp = AtomPSPRadial::new("X", 3.0, rad, rab)
            .gth(0.4, [-6.0, 1.0, 0.0, 0.0])
            .spin_orbit(true)
            .add_wfc_fn("2S", 0, 0.5, 2.0, |r| r * (-r).exp())
            .add_wfc_fn("2P", 1, 1.5, -1.0, |r| r * r * (-r).exp());

        assert!(psp.get_gth().is_some());
        assert!(!psp.is_coulomb());
        assert!(psp.has_so());
        assert_eq!(psp.get_nwfc(), 2);
        // the p orbital is unoccupied-by-convention and does not count
        assert_eq!(psp.get_max_lchi(), Some(0));
    }
}
