use control::Control;

/// How the starting wavefunctions of one species are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WfcVariant {
    /// one scalar function per m
    Collinear,
    /// spinors along and against the starting moment of the species
    NoncolinUpDown,
    /// spin-orbit eigenstates |l j m_j>
    SpinOrbit,
    /// j = l +- 1/2 radial parts averaged, then rotated like `NoncolinUpDown`
    SpinOrbitMag,
}

#[derive(Debug, Clone, Default)]
pub struct SpinConfig {
    pub noncolin: bool,
    pub lspinorb: bool,
    pub domag: bool,
    pub starting_spin_angle: bool,

    // per species, radians
    angle1: Vec<f64>,
    angle2: Vec<f64>,
}

impl SpinConfig {
    pub fn collinear() -> SpinConfig {
        SpinConfig::default()
    }

    pub fn noncollinear(angle1: Vec<f64>, angle2: Vec<f64>) -> SpinConfig {
        SpinConfig {
            noncolin: true,
            domag: true,
            angle1,
            angle2,
            ..Default::default()
        }
    }

    pub fn from_control(ctrl: &Control, nsp: usize) -> SpinConfig {
        SpinConfig {
            noncolin: ctrl.is_noncolin(),
            lspinorb: ctrl.is_lspinorb(),
            domag: ctrl.is_domag(),
            starting_spin_angle: ctrl.is_starting_spin_angle(),
            angle1: (0..nsp).map(|isp| ctrl.get_angle1(isp)).collect(),
            angle2: (0..nsp).map(|isp| ctrl.get_angle2(isp)).collect(),
        }
    }

    pub fn npol(&self) -> usize {
        if self.noncolin {
            2
        } else {
            1
        }
    }

    pub fn get_angle1(&self, isp: usize) -> f64 {
        self.angle1.get(isp).copied().unwrap_or(0.0)
    }

    pub fn get_angle2(&self, isp: usize) -> f64 {
        self.angle2.get(isp).copied().unwrap_or(0.0)
    }

    /// Construction used for a species with or without spin-orbit data.
    pub fn variant(&self, has_so: bool) -> WfcVariant {
        match (self.noncolin, has_so) {
            (false, _) => WfcVariant::Collinear,

            (true, false) => WfcVariant::NoncolinUpDown,

            (true, true) if self.starting_spin_angle || !self.domag => WfcVariant::SpinOrbit,

            (true, true) => WfcVariant::SpinOrbitMag,
        }
    }
}

pub(crate) fn is_j_up(l: usize, j: f64) -> bool {
    (j - l as f64 - 0.5).abs() < 1.0e-4
}

pub(crate) fn is_j_down(l: usize, j: f64) -> bool {
    l > 0 && (j - l as f64 + 0.5).abs() < 1.0e-4
}

/// Clebsch-Gordan coefficient of spin component `spin` (0 up, 1 down) in
/// the |l j m> spinor, with m running over -l-1..=l.
///
/// Panics when `j` is not l +- 1/2.
pub fn spinor(l: usize, j: f64, m: i32, spin: usize) -> f64 {
    let li = l as i32;
    let denom = 1.0 / (2 * l + 1) as f64;

    if is_j_up(l, j) {
        match spin {
            0 => ((li + m + 1) as f64 * denom).max(0.0).sqrt(),
            1 => ((li - m) as f64 * denom).max(0.0).sqrt(),
            _ => panic!("spin index {} is not 0 or 1", spin),
        }
    } else if is_j_down(l, j) {
        if m < -li + 1 {
            return 0.0;
        }

        match spin {
            0 => ((li - m + 1) as f64 * denom).max(0.0).sqrt(),
            1 => -((li + m) as f64 * denom).max(0.0).sqrt(),
            _ => panic!("spin index {} is not 0 or 1", spin),
        }
    } else {
        panic!("j = {} is not l +- 1/2 for l = {}", j, l)
    }
}

/// Magnetic quantum number of the Y_l^m multiplying spin component `spin`
/// in the |l j m> spinor, `None` if the component vanishes.
pub fn sph_ind(l: usize, j: f64, m: i32, spin: usize) -> Option<i32> {
    let li = l as i32;

    let mm = if is_j_up(l, j) {
        if spin == 0 {
            m
        } else {
            m + 1
        }
    } else if is_j_down(l, j) {
        if m < -li + 1 {
            return None;
        }

        if spin == 0 {
            m - 1
        } else {
            m
        }
    } else {
        panic!("j = {} is not l +- 1/2 for l = {}", j, l)
    };

    if mm < -li || mm > li {
        None
    } else {
        Some(mm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_variant_dispatch() {
        let mut spin = SpinConfig::collinear();
        assert_eq!(spin.variant(true), WfcVariant::Collinear);

        spin.noncolin = true;
        spin.domag = true;
        assert_eq!(spin.variant(false), WfcVariant::NoncolinUpDown);
        assert_eq!(spin.variant(true), WfcVariant::SpinOrbitMag);

        spin.starting_spin_angle = true;
        assert_eq!(spin.variant(true), WfcVariant::SpinOrbit);

        spin.starting_spin_angle = false;
        spin.domag = false;
        assert_eq!(spin.variant(true), WfcVariant::SpinOrbit);
    }

    #[test]
    fn test_spinor_is_normalized() {
        for l in 0..4usize {
            let li = l as i32;

            for j in [l as f64 + 0.5, l as f64 - 0.5] {
                if j < 0.0 {
                    continue;
                }

                let mut nstates = 0;

                for m in -li - 1..=li {
                    let (up, down) = (spinor(l, j, m, 0), spinor(l, j, m, 1));

                    if up.abs() < 1.0e-8 && down.abs() < 1.0e-8 {
                        continue;
                    }

                    nstates += 1;

                    assert_relative_eq!(up * up + down * down, 1.0, epsilon = 1.0e-14);

                    // every non-zero coefficient has a harmonic to multiply
                    assert_eq!(up.abs() > 1.0e-8, sph_ind(l, j, m, 0).is_some());
                    assert_eq!(down.abs() > 1.0e-8, sph_ind(l, j, m, 1).is_some());
                }

                assert_eq!(nstates as f64, 2.0 * j + 1.0);
            }
        }
    }

    #[test]
    fn test_p_one_half() {
        // |1 1/2 m_j=1/2> = sqrt(1/3) Y_1^0 up - sqrt(2/3) Y_1^1 down
        assert_relative_eq!(spinor(1, 0.5, 1, 0), (1.0f64 / 3.0).sqrt());
        assert_relative_eq!(spinor(1, 0.5, 1, 1), -(2.0f64 / 3.0).sqrt());
        assert_eq!(sph_ind(1, 0.5, 1, 0), Some(0));
        assert_eq!(sph_ind(1, 0.5, 1, 1), Some(1));
    }
}
