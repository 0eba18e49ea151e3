#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Got an invalid parameter value in a function
    InvalidParameter(String),
    /// An atom in the system has an atomic type the potential does not know
    /// about
    UnknownElementType(i32),
    /// One of the internal buffers would need to grow past its allowed size
    CapacityExceeded {
        /// name of the buffer ("bonds" or "screening")
        buffer: &'static str,
        /// number of entries needed to store the data
        requested: usize,
        /// maximal allowed number of entries, or the capacity reached when
        /// running out of growth steps
        maximum: usize,
        /// `Some(steps)` if the buffer could not grow any further because
        /// all `steps` doublings allowed in a calculation were used, `None`
        /// if the hard limit on the number of entries was reached
        growth_steps: Option<usize>,
    },
    /// Error while serializing/deserializing data
    Json(serde_json::Error),
    /// Internal consistency error
    Internal(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameter(e) => write!(f, "invalid parameter: {}", e),
            Error::UnknownElementType(e) => write!(f, "unknown atomic type {} for this potential", e),
            Error::CapacityExceeded { buffer, requested, maximum, growth_steps: None } => write!(f,
                "capacity exceeded for {} buffer: {} entries requested, but at most {} are allowed",
                buffer, requested, maximum
            ),
            Error::CapacityExceeded { buffer, requested, maximum, growth_steps: Some(steps) } => write!(f,
                "capacity exceeded for {} buffer: {} entries requested, but the capacity is still {} after {} growth steps",
                buffer, requested, maximum, steps
            ),
            Error::Json(e) => write!(f, "json error: {}", e),
            Error::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidParameter(_) |
            Error::UnknownElementType(_) |
            Error::CapacityExceeded { .. } |
            Error::Internal(_) => None,
            Error::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}
