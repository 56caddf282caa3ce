use approx::{assert_abs_diff_eq, assert_relative_eq};
use atompsp::AtomPSPRadial;
use atwfc::*;
use dwconsts::*;
use dwmpi::{LocalGroup, SerialComm};
use pspot::PSPot;
use vector3::Vector3f64;

const ALAT: f64 = 10.0;
const QCUT: f64 = 6.0;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn tpiba() -> f64 {
    TWOPI / ALAT
}

fn omega() -> f64 {
    ALAT * ALAT * ALAT
}

// normalized r^(l+1) exp(-r^2/2)
fn gaussian_orbital(l: usize) -> impl Fn(f64) -> f64 {
    let norm2 = match l {
        0 => 4.0 / PI.sqrt(),
        1 => 8.0 / (3.0 * PI.sqrt()),
        2 => 16.0 / (15.0 * PI.sqrt()),
        _ => unreachable!(),
    };

    let norm = f64::sqrt(norm2);

    move |r: f64| norm * r.powi(l as i32 + 1) * (-0.5 * r * r).exp()
}

fn base_species(label: &str) -> AtomPSPRadial {
    let (rad, rab) = AtomPSPRadial::log_mesh(-8.0, 1.0, 0.0125, 961);

    AtomPSPRadial::new(label, 1.0, rad, rab)
}

// s and p orbitals, plus an unoccupied d
fn scalar_species() -> AtomPSPRadial {
    base_species("A")
        .add_wfc_fn("1S", 0, 0.5, 1.0, gaussian_orbital(0))
        .add_wfc_fn("2P", 1, 1.5, 1.0, gaussian_orbital(1))
        .add_wfc_fn("3D", 2, 2.5, -1.0, gaussian_orbital(2))
}

// s1/2, p1/2, p3/2 with identical radial parts
fn spin_orbit_species() -> AtomPSPRadial {
    base_species("B")
        .spin_orbit(true)
        .add_wfc_fn("1S", 0, 0.5, 1.0, gaussian_orbital(0))
        .add_wfc_fn("2P", 1, 0.5, 1.0, gaussian_orbital(1))
        .add_wfc_fn("2P", 1, 1.5, 1.0, gaussian_orbital(1))
}

fn pspot_of(psps: Vec<AtomPSPRadial>) -> PSPot {
    let mut pspot = PSPot::new();

    for psp in psps.into_iter() {
        let label = atompsp::AtomPSP::get_element(&psp).to_string();
        pspot.push(&label, Box::new(psp));
    }

    pspot
}

fn build_table(pspot: &PSPot) -> AtwfcTable {
    let mut tab = AtwfcTable::new();

    tab.init(QCUT + 0.5, pspot, omega(), &SerialComm::new())
        .unwrap();

    tab
}

// all k+G with |k+G| <= QCUT, G in units of 2 pi / alat
fn plane_waves(xk: Vector3f64) -> Vec<Vector3f64> {
    let nmax = (QCUT / tpiba()).ceil() as i32 + 1;

    let mut gk = Vec::new();

    for i in -nmax..=nmax {
        for j in -nmax..=nmax {
            for k in -nmax..=nmax {
                let g = Vector3f64::new(i as f64, j as f64, k as f64);

                if (xk + g).norm2() * tpiba() <= QCUT {
                    gk.push(g);
                }
            }
        }
    }

    gk
}

fn assert_orthonormal(wfc: &WfcAtom) {
    for a in 0..wfc.get_nwfc() {
        for b in 0..wfc.get_nwfc() {
            let s = wfc.overlap(a, b);
            let expected = if a == b { 1.0 } else { 0.0 };

            assert_abs_diff_eq!(s.re, expected, epsilon = 1.0e-6);
            assert_abs_diff_eq!(s.im, 0.0, epsilon = 1.0e-6);
        }
    }
}

#[test]
fn test_counts_for_all_variants() {
    init_logger();

    let pspot = pspot_of(vec![scalar_species(), spin_orbit_species()]);
    let tab = build_table(&pspot);

    let atoms = vec![
        Atom::new(0, Vector3f64::new(0.0, 0.0, 0.0)),
        Atom::new(0, Vector3f64::new(0.5, 0.5, 0.0)),
        Atom::new(1, Vector3f64::new(0.25, 0.25, 0.25)),
    ];

    assert_eq!(n_atom_wfc(&atoms, &pspot, false), 4 + 4 + 7);
    assert_eq!(n_atom_wfc(&atoms, &pspot, true), 8 + 8 + 8);

    let xk = Vector3f64::new(0.1, 0.0, 0.0);
    let gk = plane_waves(xk);
    let comm = SerialComm::new();

    let collinear = SpinConfig::collinear();

    let mut so = SpinConfig::noncollinear(vec![0.0; 2], vec![0.0; 2]);
    so.domag = false;

    let so_mag = SpinConfig::noncollinear(vec![0.3; 2], vec![0.1; 2]);

    assert_eq!(so.variant(true), WfcVariant::SpinOrbit);
    assert_eq!(so_mag.variant(true), WfcVariant::SpinOrbitMag);

    for (spin, npol, nwfc) in [(collinear, 1, 15), (so, 2, 24), (so_mag, 2, 24)] {
        let wfc = atomic_wfc(xk, &gk, &atoms, &pspot, &tab, &spin, tpiba(), &comm).unwrap();

        assert_eq!(wfc.get_npw(), gk.len());
        assert_eq!(wfc.get_npol(), npol);
        assert_eq!(wfc.get_nwfc(), nwfc);
        assert_eq!(wfc.get_data().len(), npol * nwfc * gk.len());
    }
}

#[test]
fn test_collinear_orbitals_are_orthonormal() {
    init_logger();

    let pspot = pspot_of(vec![scalar_species()]);
    let tab = build_table(&pspot);

    let atoms = vec![Atom::new(0, Vector3f64::new(0.1, 0.2, 0.3))];

    let xk = Vector3f64::new(0.1, 0.0, 0.05);
    let gk = plane_waves(xk);

    let wfc = atomic_wfc(
        xk,
        &gk,
        &atoms,
        &pspot,
        &tab,
        &SpinConfig::collinear(),
        tpiba(),
        &SerialComm::new(),
    )
    .unwrap();

    assert_eq!(wfc.get_nwfc(), 4);
    assert_orthonormal(&wfc);
}

#[test]
fn test_s_orbital_at_origin_is_real() {
    init_logger();

    let pspot = pspot_of(vec![scalar_species()]);
    let tab = build_table(&pspot);

    let atoms = vec![Atom::new(0, Vector3f64::zeros())];
    let gk = plane_waves(Vector3f64::zeros());

    let wfc = atomic_wfc(
        Vector3f64::zeros(),
        &gk,
        &atoms,
        &pspot,
        &tab,
        &SpinConfig::collinear(),
        tpiba(),
        &SerialComm::new(),
    )
    .unwrap();

    for (g, v) in gk.iter().zip(wfc.get_wfc(0, 0).iter()) {
        let q = g.norm2() * tpiba();

        let expected = tab.interp(0, 0, q) * 0.5 / PI.sqrt();

        assert_eq!(v.im, 0.0);
        assert_relative_eq!(v.re, expected, max_relative = 1.0e-12);
    }
}

#[test]
fn test_noncolin_updown_spinors() {
    init_logger();

    let pspot = pspot_of(vec![scalar_species()]);
    let tab = build_table(&pspot);

    let alpha = PI / 3.0;

    let spin = SpinConfig::noncollinear(vec![alpha], vec![PI / 4.0]);
    assert_eq!(spin.variant(false), WfcVariant::NoncolinUpDown);

    let atoms = vec![Atom::new(0, Vector3f64::new(0.0, 0.1, 0.0))];

    let xk = Vector3f64::new(0.0, 0.0, 0.2);
    let gk = plane_waves(xk);

    let wfc = atomic_wfc(xk, &gk, &atoms, &pspot, &tab, &spin, tpiba(), &SerialComm::new())
        .unwrap();

    assert_eq!(wfc.get_nwfc(), 8);
    assert_orthonormal(&wfc);

    // the first s spinor points along the starting moment
    let up: f64 = wfc.get_wfc(0, 0).iter().map(|v| v.norm_sqr()).sum();
    let down: f64 = wfc.get_wfc(0, 1).iter().map(|v| v.norm_sqr()).sum();

    assert_relative_eq!(up, (0.5 * alpha).cos().powi(2), max_relative = 1.0e-5);
    assert_relative_eq!(down, (0.5 * alpha).sin().powi(2), max_relative = 1.0e-5);
}

#[test]
fn test_spin_orbit_spinors_are_orthonormal() {
    init_logger();

    let pspot = pspot_of(vec![spin_orbit_species()]);
    let tab = build_table(&pspot);

    let mut spin = SpinConfig::noncollinear(vec![0.0], vec![0.0]);
    spin.domag = false;

    let atoms = vec![Atom::new(0, Vector3f64::new(0.3, 0.0, 0.1))];

    let xk = Vector3f64::new(0.05, 0.1, 0.0);
    let gk = plane_waves(xk);

    let wfc = atomic_wfc(xk, &gk, &atoms, &pspot, &tab, &spin, tpiba(), &SerialComm::new())
        .unwrap();

    // s1/2 + p1/2 + p3/2
    assert_eq!(wfc.get_nwfc(), 2 + 2 + 4);
    assert_orthonormal(&wfc);
}

#[test]
fn test_spin_orbit_mag_averages_to_updown() {
    init_logger();

    let scalar = base_species("A")
        .add_wfc_fn("1S", 0, 0.5, 1.0, gaussian_orbital(0))
        .add_wfc_fn("2P", 1, 1.5, 1.0, gaussian_orbital(1));

    let pspot = pspot_of(vec![scalar, spin_orbit_species()]);
    let tab = build_table(&pspot);

    let spin = SpinConfig::noncollinear(vec![0.7, 0.7], vec![1.1, 1.1]);

    let xk = Vector3f64::new(0.1, 0.1, 0.0);
    let gk = plane_waves(xk);
    let tau = Vector3f64::new(0.2, 0.0, 0.4);

    let comm = SerialComm::new();

    let a = atomic_wfc(xk, &gk, &[Atom::new(0, tau)], &pspot, &tab, &spin, tpiba(), &comm)
        .unwrap();
    let b = atomic_wfc(xk, &gk, &[Atom::new(1, tau)], &pspot, &tab, &spin, tpiba(), &comm)
        .unwrap();

    assert_eq!(a.get_nwfc(), b.get_nwfc());

    for (x, y) in a.get_data().iter().zip(b.get_data().iter()) {
        assert_abs_diff_eq!(x.re, y.re, epsilon = 1.0e-12);
        assert_abs_diff_eq!(x.im, y.im, epsilon = 1.0e-12);
    }
}

#[test]
fn test_partitioned_matches_serial() {
    init_logger();

    let pspot = pspot_of(vec![scalar_species(), spin_orbit_species()]);
    let tab = build_table(&pspot);

    let atoms = vec![
        Atom::new(0, Vector3f64::new(0.0, 0.0, 0.0)),
        Atom::new(1, Vector3f64::new(0.25, 0.25, 0.25)),
    ];

    let mut spin = SpinConfig::noncollinear(vec![0.4, 0.0], vec![0.2, 0.0]);
    spin.starting_spin_angle = true;

    let xk = Vector3f64::new(0.0, 0.125, 0.25);
    let gk = plane_waves(xk);

    let serial =
        atomic_wfc(xk, &gk, &atoms, &pspot, &tab, &spin, tpiba(), &SerialComm::new()).unwrap();

    let comms = LocalGroup::new(3);

    let results: Vec<WfcAtom> = std::thread::scope(|s| {
        let handles: Vec<_> = comms
            .iter()
            .map(|comm| {
                let (gk, atoms, pspot, tab, spin) = (&gk, &atoms, &pspot, &tab, &spin);

                s.spawn(move || {
                    atomic_wfc(xk, gk, atoms, pspot, tab, spin, tpiba(), comm).unwrap()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for wfc in results.iter() {
        assert_eq!(wfc, &serial);
    }
}

#[test]
fn test_errors() {
    init_logger();

    let pspot = pspot_of(vec![scalar_species()]);
    let comm = SerialComm::new();
    let spin = SpinConfig::collinear();

    let atoms = vec![Atom::new(0, Vector3f64::zeros())];
    let xk = Vector3f64::zeros();
    let gk = vec![Vector3f64::new(1.0, 0.0, 0.0)];

    let empty = AtwfcTable::new();

    assert_eq!(
        atomic_wfc(xk, &gk, &atoms, &pspot, &empty, &spin, tpiba(), &comm),
        Err(AtwfcError::TableNotAllocated)
    );

    let tab = build_table(&pspot);

    let far = vec![Vector3f64::new(20.0, 0.0, 0.0)];

    assert!(matches!(
        atomic_wfc(xk, &far, &atoms, &pspot, &tab, &spin, tpiba(), &comm),
        Err(AtwfcError::QueryOutOfRange { .. })
    ));

    let stray = vec![Atom::new(2, Vector3f64::zeros())];

    assert_eq!(
        atomic_wfc(xk, &gk, &stray, &pspot, &tab, &spin, tpiba(), &comm),
        Err(AtwfcError::SpeciesOutOfRange { isp: 2, nsp: 1 })
    );

    // j = l + 1/2 without its j = l - 1/2 partner
    let lonely = base_species("C")
        .spin_orbit(true)
        .add_wfc_fn("2P", 1, 1.5, 1.0, gaussian_orbital(1));

    let pspot = pspot_of(vec![lonely]);
    let tab = build_table(&pspot);

    let spin = SpinConfig::noncollinear(vec![0.0], vec![0.0]);

    assert_eq!(
        atomic_wfc(xk, &gk, &atoms, &pspot, &tab, &spin, tpiba(), &comm),
        Err(AtwfcError::MissingPartner { species: 0, l: 1 })
    );

    let bad_j = base_species("D")
        .spin_orbit(true)
        .add_wfc_fn("2P", 1, 1.0, 1.0, gaussian_orbital(1));

    let pspot = pspot_of(vec![bad_j]);
    let tab = build_table(&pspot);

    assert_eq!(
        atomic_wfc(xk, &gk, &atoms, &pspot, &tab, &spin, tpiba(), &comm),
        Err(AtwfcError::InvalidJ {
            species: 0,
            l: 1,
            j: 1.0
        })
    );
}
