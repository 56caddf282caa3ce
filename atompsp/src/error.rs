use thiserror::Error;

pub type Result<T> = std::result::Result<T, PspError>;

#[derive(Error, Debug)]
pub enum PspError {
    #[error("cannot open pseudopotential file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed XML in '{path}': {source}")]
    Xml {
        path: String,
        #[source]
        source: xml::reader::Error,
    },

    #[error("cannot parse {what} from '{value}'")]
    Parse { what: String, value: String },

    #[error("{what} has {got} points, the radial mesh has {expected}")]
    MeshMismatch {
        what: String,
        got: usize,
        expected: usize,
    },

    #[error("pseudopotential is missing {0}")]
    Missing(String),

    #[error("unknown pseudopotential scheme '{0}'")]
    UnknownScheme(String),
}
