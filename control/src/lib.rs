use dwconsts::*;
use thiserror::Error;

use std::{
    fs::File,
    io::{BufRead, BufReader},
};

pub type Result<T> = std::result::Result<T, ControlError>;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("cannot read control file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: unknown parameter '{key}'")]
    UnknownKey { line: usize, key: String },

    #[error("line {line}: invalid value '{value}' for '{key}'")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
    },

    #[error("line {line}: expected 'key = value', found '{text}'")]
    Syntax { line: usize, text: String },
}

#[derive(Debug, Clone)]
pub struct Control {
    verbosity: String,

    // rayon kicks in for loops at least this long
    parallel_min_len: usize,

    // regrowth of radial tables overshoots by margin * (qnew - qold)
    vloc_qmax_margin: f64,

    noncolin: bool,
    lspinorb: bool,
    domag: bool,
    starting_spin_angle: bool,

    // per species, degrees in the file, radians here
    angle1: Vec<f64>,
    angle2: Vec<f64>,
}

impl Default for Control {
    fn default() -> Self {
        Control {
            verbosity: "low".to_string(),
            parallel_min_len: utility::PARALLEL_MIN_LEN,
            vloc_qmax_margin: 10.0,
            noncolin: false,
            lspinorb: false,
            domag: false,
            starting_spin_angle: false,
            angle1: Vec::new(),
            angle2: Vec::new(),
        }
    }
}

impl Control {
    pub fn new() -> Control {
        Control::default()
    }

    pub fn get_verbosity(&self) -> &str {
        &self.verbosity
    }

    pub fn is_verbose(&self) -> bool {
        self.verbosity == "high"
    }

    pub fn get_parallel_min_len(&self) -> usize {
        self.parallel_min_len
    }

    pub fn get_vloc_qmax_margin(&self) -> f64 {
        self.vloc_qmax_margin
    }

    pub fn is_noncolin(&self) -> bool {
        self.noncolin
    }

    pub fn is_lspinorb(&self) -> bool {
        self.lspinorb
    }

    pub fn is_domag(&self) -> bool {
        self.domag
    }

    pub fn is_starting_spin_angle(&self) -> bool {
        self.starting_spin_angle
    }

    /// polar angle of the starting magnetization of species `isp`, radians
    pub fn get_angle1(&self, isp: usize) -> f64 {
        self.angle1.get(isp).copied().unwrap_or(0.0)
    }

    /// azimuthal angle of the starting magnetization of species `isp`, radians
    pub fn get_angle2(&self, isp: usize) -> f64 {
        self.angle2.get(isp).copied().unwrap_or(0.0)
    }

    pub fn read_file(&mut self, inpfile: &str) -> Result<()> {
        let file = File::open(inpfile).map_err(|source| ControlError::Io {
            path: inpfile.to_string(),
            source,
        })?;

        let lines: Vec<String> = BufReader::new(file)
            .lines()
            .collect::<std::io::Result<_>>()
            .map_err(|source| ControlError::Io {
                path: inpfile.to_string(),
                source,
            })?;

        self.parse_lines(lines.iter().map(|s| s.as_str()))
    }

    pub fn parse_str(&mut self, text: &str) -> Result<()> {
        self.parse_lines(text.lines())
    }

    fn parse_lines<'a, I: Iterator<Item = &'a str>>(&mut self, lines: I) -> Result<()> {
        for (iline, raw) in lines.enumerate() {
            let line = iline + 1;

            let text = raw.split('#').next().unwrap_or("").trim();

            if text.is_empty() {
                continue;
            }

            let s: Vec<&str> = text.splitn(2, '=').map(|x| x.trim()).collect();

            if s.len() != 2 || s[0].is_empty() {
                return Err(ControlError::Syntax {
                    line,
                    text: text.to_string(),
                });
            }

            let (key, value) = (s[0], s[1]);

            let invalid = || ControlError::InvalidValue {
                line,
                key: key.to_string(),
                value: value.to_string(),
            };

            match key {
                "verbosity" => match value {
                    "low" | "high" => self.verbosity = value.to_string(),
                    _ => return Err(invalid()),
                },

                "parallel_min_len" => {
                    self.parallel_min_len = value.parse().map_err(|_| invalid())?;
                }

                "vloc_qmax_margin" => {
                    let margin: f64 = value.parse().map_err(|_| invalid())?;

                    if margin < 0.0 || !margin.is_finite() {
                        return Err(invalid());
                    }

                    self.vloc_qmax_margin = margin;
                }

                "noncolin" => self.noncolin = parse_bool(value).ok_or_else(invalid)?,

                "lspinorb" => self.lspinorb = parse_bool(value).ok_or_else(invalid)?,

                "domag" => self.domag = parse_bool(value).ok_or_else(invalid)?,

                "starting_spin_angle" => {
                    self.starting_spin_angle = parse_bool(value).ok_or_else(invalid)?;
                }

                "angle1" => self.angle1 = parse_angles(value).ok_or_else(invalid)?,

                "angle2" => self.angle2 = parse_angles(value).ok_or_else(invalid)?,

                _ => {
                    return Err(ControlError::UnknownKey {
                        line,
                        key: key.to_string(),
                    })
                }
            }
        }

        if self.lspinorb && !self.noncolin {
            log::warn!("lspinorb = true without noncolin = true; spin-orbit data are ignored");
        }

        Ok(())
    }

    pub fn display(&self) {
        const OUT_WIDTH1: usize = 28;
        const OUT_WIDTH2: usize = 18;

        println!("   {:-^80}", " control parameters ");
        println!();

        println!(
            "   {:<width1$} = {:>width2$}",
            "verbosity",
            self.verbosity,
            width1 = OUT_WIDTH1,
            width2 = OUT_WIDTH2
        );

        println!(
            "   {:<width1$} = {:>width2$}",
            "parallel_min_len",
            self.parallel_min_len,
            width1 = OUT_WIDTH1,
            width2 = OUT_WIDTH2
        );

        println!(
            "   {:<width1$} = {:>width2$.3}",
            "vloc_qmax_margin",
            self.vloc_qmax_margin,
            width1 = OUT_WIDTH1,
            width2 = OUT_WIDTH2
        );

        for (key, value) in [
            ("noncolin", self.noncolin),
            ("lspinorb", self.lspinorb),
            ("domag", self.domag),
            ("starting_spin_angle", self.starting_spin_angle),
        ] {
            println!(
                "   {:<width1$} = {:>width2$}",
                key,
                value,
                width1 = OUT_WIDTH1,
                width2 = OUT_WIDTH2
            );
        }

        if self.noncolin {
            for (isp, (a1, a2)) in self.angle1.iter().zip(self.angle2.iter()).enumerate() {
                println!(
                    "   {:<width1$} = {:>8.2} {:>8.2}",
                    format!("angle1/angle2 ({})", isp + 1),
                    a1 / PI * 180.0,
                    a2 / PI * 180.0,
                    width1 = OUT_WIDTH1
                );
            }
        }

        println!();
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().trim_matches('.') {
        "true" | "t" => Some(true),
        "false" | "f" => Some(false),
        _ => None,
    }
}

fn parse_angles(value: &str) -> Option<Vec<f64>> {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().ok().map(|deg| deg * PI / 180.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let ctrl = Control::new();

        assert_eq!(ctrl.get_verbosity(), "low");
        assert_eq!(ctrl.get_vloc_qmax_margin(), 10.0);
        assert!(!ctrl.is_noncolin());
        assert_eq!(ctrl.get_angle1(3), 0.0);
    }

    #[test]
    fn test_parse_str() {
        let mut ctrl = Control::new();

        ctrl.parse_str(
            "# spin setup\n\
             noncolin = .true.\n\
             lspinorb = T\n\
             domag    = false   # collinear start\n\
             angle1   = 90, 45\n\
             angle2   = 0 180\n\
             vloc_qmax_margin = 4\n\
             verbosity = high\n",
        )
        .unwrap();

        assert!(ctrl.is_noncolin());
        assert!(ctrl.is_lspinorb());
        assert!(!ctrl.is_domag());
        assert!(ctrl.is_verbose());
        assert_eq!(ctrl.get_vloc_qmax_margin(), 4.0);
        assert_relative_eq!(ctrl.get_angle1(0), PI / 2.0);
        assert_relative_eq!(ctrl.get_angle1(1), PI / 4.0);
        assert_relative_eq!(ctrl.get_angle2(1), PI);
    }

    #[test]
    fn test_parse_errors() {
        let mut ctrl = Control::new();

        assert!(matches!(
            ctrl.parse_str("ecut = 30"),
            Err(ControlError::UnknownKey { line: 1, .. })
        ));

        assert!(matches!(
            ctrl.parse_str("\nnoncolin = yes"),
            Err(ControlError::InvalidValue { line: 2, .. })
        ));

        assert!(matches!(
            ctrl.parse_str("vloc_qmax_margin = -1"),
            Err(ControlError::InvalidValue { .. })
        ));

        assert!(matches!(
            ctrl.parse_str("domag"),
            Err(ControlError::Syntax { line: 1, .. })
        ));
    }
}
