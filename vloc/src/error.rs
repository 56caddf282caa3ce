use thiserror::Error;

pub type Result<T> = std::result::Result<T, VlocError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VlocError {
    #[error("modified Coulomb correction is not implemented for the analytic local potential of species {species}")]
    ModifiedCoulombUnsupported { species: usize },

    #[error("species index {isp} out of range ({nsp} species)")]
    SpeciesOutOfRange { isp: usize, nsp: usize },

    #[error("local potential table has not been built")]
    TableNotAllocated,

    #[error("q = {q} is beyond the tabulated range qmax = {qmax}")]
    QueryOutOfRange { q: f64, qmax: f64 },

    #[error("invalid maximum q {0}")]
    InvalidQmax(f64),

    #[error("invalid cell volume {0}")]
    InvalidVolume(f64),
}
