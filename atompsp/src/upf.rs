use crate::{AtomPSP, AtomWfc, LocalForm, PspError, Result};

use dwconsts::*;

use std::{collections::BTreeMap, fmt, fs::File, io::BufReader};

use xml::attribute::OwnedAttribute;
use xml::reader::{EventReader, XmlEvent};

enum UPF {
    R,
    RAB,
    LOCAL,
    CHI(usize),
    NULL,
}

/// Pseudopotential read from a UPF v2 file. Energies are stored in Hartree.
#[derive(Debug, Default)]
pub struct AtomPSPUPF {
    element: String,
    zion: f64,
    has_so: bool,
    local_form: LocalForm,
    mmax: usize,
    rad: Vec<f64>,
    rab: Vec<f64>,
    vloc: Vec<f64>,
    wfc: Vec<AtomWfc>,
}

impl AtomPSP for AtomPSPUPF {
    fn get_element(&self) -> &str {
        &self.element
    }

    fn get_zion(&self) -> f64 {
        self.zion
    }

    fn get_mmax(&self) -> usize {
        self.mmax
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

impl AtomPSPUPF {
    pub fn from_file(pspfile: &str) -> Result<AtomPSPUPF> {
        let file = File::open(pspfile).map_err(|source| PspError::Io {
            path: pspfile.to_string(),
            source,
        })?;

        let mut psp = AtomPSPUPF::default();

        psp.parse_upf(pspfile, BufReader::new(file))?;
        psp.post_processing()?;

        log::debug!(
            "read {} : element = {} zion = {} mmax = {} nwfc = {}",
            pspfile,
            psp.element,
            psp.zion,
            psp.mmax,
            psp.wfc.len()
        );

        Ok(psp)
    }

    fn parse_upf<R: std::io::Read>(&mut self, pspfile: &str, reader: R) -> Result<()> {
        let parser = EventReader::new(reader);

        let mut data_type = UPF::NULL;

        // PP_CHI.n and PP_RELWFC.n are matched through their index
        let mut chi: BTreeMap<usize, AtomWfc> = BTreeMap::new();
        let mut jchi: BTreeMap<usize, f64> = BTreeMap::new();

        for event in parser {
            let event = event.map_err(|source| PspError::Xml {
                path: pspfile.to_string(),
                source,
            })?;

            match event {
                XmlEvent::StartElement {
                    name, attributes, ..
                } => {
                    let tag = name.local_name.as_str();

                    data_type = UPF::NULL;

                    if tag == "PP_HEADER" {
                        self.read_header(&attributes)?;
                    } else if tag == "PP_R" {
                        data_type = UPF::R;
                    } else if tag == "PP_RAB" {
                        data_type = UPF::RAB;
                    } else if tag == "PP_LOCAL" {
                        data_type = UPF::LOCAL;
                    } else if let Some(idx) = tag.strip_prefix("PP_CHI.") {
                        let idx = parse_value::<usize>(tag, idx)?;

                        let wfc = AtomWfc {
                            label: find_attr(&attributes, "label").unwrap_or_default(),
                            l: parse_attr(&attributes, "l")?
                                .ok_or_else(|| PspError::Missing(format!("l of {}", tag)))?,
                            j: 0.0,
                            oc: parse_attr(&attributes, "occupation")?.unwrap_or(0.0),
                            chi: Vec::new(),
                        };

                        chi.insert(idx, wfc);

                        data_type = UPF::CHI(idx);
                    } else if let Some(idx) = tag.strip_prefix("PP_RELWFC.") {
                        let idx = parse_value::<usize>(tag, idx)?;

                        if let Some(j) = parse_attr::<f64>(&attributes, "jchi")? {
                            jchi.insert(idx, j);
                        }
                    }
                }

                XmlEvent::Characters(text) => {
                    match data_type {
                        UPF::R => self.rad = parse_array("PP_R", &text)?,

                        UPF::RAB => self.rab = parse_array("PP_RAB", &text)?,

                        UPF::LOCAL => {
                            self.vloc = parse_array("PP_LOCAL", &text)?
                                .into_iter()
                                .map(|v: f64| v * RY_TO_HA)
                                .collect();
                        }

                        UPF::CHI(idx) => {
                            if let Some(wfc) = chi.get_mut(&idx) {
                                wfc.chi = parse_array("PP_CHI", &text)?;
                            }
                        }

                        UPF::NULL => {}
                    }

                    data_type = UPF::NULL;
                }

                XmlEvent::EndElement { name } => {
                    if name.local_name == "UPF" {
                        break;
                    }
                }

                _ => {}
            }
        }

        for (idx, mut wfc) in chi.into_iter() {
            if let Some(j) = jchi.get(&idx) {
                wfc.j = *j;
            }

            self.wfc.push(wfc);
        }

        Ok(())
    }

    fn read_header(&mut self, attributes: &[OwnedAttribute]) -> Result<()> {
        self.element = find_attr(attributes, "element")
            .map(|s| s.trim().to_string())
            .unwrap_or_default();

        self.zion = parse_attr(attributes, "z_valence")?
            .ok_or_else(|| PspError::Missing("z_valence".to_string()))?;

        self.mmax = parse_attr(attributes, "mesh_size")?.unwrap_or(0);

        self.has_so = match find_attr(attributes, "has_so") {
            Some(s) => parse_upf_bool("has_so", &s)?,
            None => false,
        };

        let is_coulomb = match find_attr(attributes, "is_coulomb") {
            Some(s) => parse_upf_bool("is_coulomb", &s)?,
            None => false,
        };

        if is_coulomb {
            self.local_form = LocalForm::Coulomb;
        }

        Ok(())
    }

    fn post_processing(&mut self) -> Result<()> {
        if self.rad.is_empty() {
            return Err(PspError::Missing("PP_R".to_string()));
        }

        // mesh_size may be absent in hand-written files
        if self.mmax == 0 {
            self.mmax = self.rad.len();
        }

        check_len("PP_R", self.rad.len(), self.mmax)?;
        check_len("PP_RAB", self.rab.len(), self.mmax)?;

        if !self.is_coulomb() {
            check_len("PP_LOCAL", self.vloc.len(), self.mmax)?;
        }

        for wfc in self.wfc.iter() {
            check_len(&format!("PP_CHI '{}'", wfc.label), wfc.chi.len(), self.mmax)?;
        }

        if self.has_so {
            for wfc in self.wfc.iter() {
                if ((wfc.j - wfc.l as f64).abs() - 0.5).abs() > EPS6 {
                    return Err(PspError::Parse {
                        what: format!("jchi of '{}'", wfc.label),
                        value: wfc.j.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

fn check_len(what: &str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(PspError::MeshMismatch {
            what: what.to_string(),
            got,
            expected,
        });
    }

    Ok(())
}

fn find_attr(attributes: &[OwnedAttribute], key: &str) -> Option<String> {
    attributes
        .iter()
        .find(|attr| attr.name.local_name == key)
        .map(|attr| attr.value.clone())
}

fn parse_value<T: std::str::FromStr>(what: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| PspError::Parse {
        what: what.to_string(),
        value: value.to_string(),
    })
}

fn parse_attr<T: std::str::FromStr>(attributes: &[OwnedAttribute], key: &str) -> Result<Option<T>> {
    find_attr(attributes, key)
        .map(|s| parse_value(key, &s))
        .transpose()
}

fn parse_array(what: &str, text: &str) -> Result<Vec<f64>> {
    text.split_whitespace()
        .map(|x| parse_value(what, x))
        .collect()
}

// UPF writes logicals as T/F or .true./.false. in any case
fn parse_upf_bool(what: &str, value: &str) -> Result<bool> {
    match value.trim().trim_matches('.').to_lowercase().as_str() {
        "t" | "true" => Ok(true),
        "f" | "false" => Ok(false),
        _ => Err(PspError::Parse {
            what: what.to_string(),
            value: value.to_string(),
        }),
    }
}

impl fmt::Display for AtomPSPUPF {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            " element = {:?} zion = {} has_so = {} local = {:?}",
            self.element, self.zion, self.has_so, self.local_form
        )?;
        write!(f, " mmax = {} nwfc = {}", self.mmax, self.wfc.len())
    }
}
