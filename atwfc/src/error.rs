use thiserror::Error;

pub type Result<T> = std::result::Result<T, AtwfcError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AtwfcError {
    #[error("atomic wavefunction table has not been built")]
    TableNotAllocated,

    #[error("atomic wavefunction table holds {ntab} species, pseudopotentials define {nsp}")]
    TableMismatch { ntab: usize, nsp: usize },

    #[error("species index {isp} out of range ({nsp} species)")]
    SpeciesOutOfRange { isp: usize, nsp: usize },

    #[error("|k+G| = {q} is beyond the tabulated range qmax = {qmax}")]
    QueryOutOfRange { q: f64, qmax: f64 },

    #[error("species {species}: l = {l} exceeds the supported lmax = {lmax}")]
    UnsupportedL { species: usize, l: usize, lmax: usize },

    #[error("species {species}: j = {j} is not l +- 1/2 for l = {l}")]
    InvalidJ { species: usize, l: usize, j: f64 },

    #[error("species {species}: no j = l - 1/2 partner for the l = {l} wavefunction")]
    MissingPartner { species: usize, l: usize },

    #[error("invalid maximum q {0}")]
    InvalidQmax(f64),

    #[error("invalid cell volume {0}")]
    InvalidVolume(f64),
}
