use atompsp::{AtomPSP, PspError, Result};
use dwmpi::Comm;

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// The species of a calculation, addressed by species index.
#[derive(Default)]
pub struct PSPot {
    labels: Vec<String>,
    pots: Vec<Box<dyn AtomPSP>>,
    atpsp_file: Vec<Option<String>>,
}

impl PSPot {
    pub fn new() -> PSPot {
        PSPot::default()
    }

    /// Read every species listed in `inpfile` (lines of `label file`), with
    /// the pseudopotential files looked up in `potdir`.
    pub fn from_pot_file(scheme: &str, inpfile: &str, potdir: &str) -> Result<PSPot> {
        let pspfiles = get_psp_files(inpfile)?;

        let mut pspot = PSPot::new();

        for (sp, spfile) in pspfiles.iter() {
            let path = Path::new(potdir).join(spfile);
            let path = path.to_string_lossy();

            let psp_one = atompsp::read_file(scheme, &path)?;

            pspot.labels.push(sp.clone());
            pspot.pots.push(psp_one);
            pspot.atpsp_file.push(Some(path.to_string()));
        }

        log::info!("{} species read from {}", pspot.n_species(), inpfile);

        Ok(pspot)
    }

    pub fn push(&mut self, label: &str, psp: Box<dyn AtomPSP>) -> usize {
        self.labels.push(label.to_string());
        self.pots.push(psp);
        self.atpsp_file.push(None);

        self.pots.len() - 1
    }

    pub fn n_species(&self) -> usize {
        self.pots.len()
    }

    pub fn get_psp(&self, isp: usize) -> &dyn AtomPSP {
        self.pots[isp].as_ref()
    }

    pub fn get_label(&self, isp: usize) -> &str {
        &self.labels[isp]
    }

    pub fn get_species_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|s| s == label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn AtomPSP> {
        self.pots.iter().map(|p| p.as_ref())
    }

    /// largest l over all starting wavefunctions of all species
    pub fn get_max_lchi(&self) -> Option<usize> {
        self.iter().filter_map(|p| p.get_max_lchi()).max()
    }

    pub fn display(&self, comm: &dyn Comm) {
        if !dwmpi::is_root(comm) {
            return;
        }

        for (isp, sp) in self.labels.iter().enumerate() {
            let psp = self.get_psp(isp);

            println!(
                "   {:<4} : zion = {:>6.2}  mmax = {:>5}  nwfc = {:>2}  {}",
                sp,
                psp.get_zion(),
                psp.get_mmax(),
                psp.get_nwfc(),
                self.atpsp_file[isp].as_deref().unwrap_or("(in memory)")
            );
        }
    }
}

pub fn get_psp_files(inpfile: &str) -> Result<Vec<(String, String)>> {
    let file = File::open(inpfile).map_err(|source| PspError::Io {
        path: inpfile.to_string(),
        source,
    })?;

    let mut pspmap = Vec::new();

    for line in BufReader::new(file).lines() {
        let line = line.map_err(|source| PspError::Io {
            path: inpfile.to_string(),
            source,
        })?;

        let s: Vec<&str> = line.split_whitespace().collect();

        match s.as_slice() {
            [] => continue,
            [comment, ..] if comment.starts_with('#') => continue,
            [specie, psp, ..] => pspmap.push((specie.to_string(), psp.to_string())),
            [_] => {
                return Err(PspError::Parse {
                    what: format!("species line of {}", inpfile),
                    value: line.clone(),
                })
            }
        }
    }

    Ok(pspmap)
}
