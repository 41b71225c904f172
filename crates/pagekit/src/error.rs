use pagekit_core::error::PageError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable class + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    #[must_use]
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
        }
    }
}

impl From<PageError> for Error {
    fn from(err: PageError) -> Self {
        let (class, origin) = match &err {
            PageError::Criteria(_) => (ErrorClass::Invalid, ErrorOrigin::Criteria),
            PageError::Path(_) => (ErrorClass::Invalid, ErrorOrigin::Paths),
            PageError::Projection(_) => (ErrorClass::Invalid, ErrorOrigin::Projection),
            PageError::Order(_) => (ErrorClass::Unsupported, ErrorOrigin::Order),
            PageError::Restriction(_) => (ErrorClass::Unsupported, ErrorOrigin::Restriction),
            PageError::Backend(_) => (ErrorClass::Backend, ErrorOrigin::Backend),
        };

        Self::new(class, origin, err.to_string())
    }
}

///
/// ErrorClass
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorClass {
    Invalid,
    Unsupported,
    Backend,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Invalid => "invalid",
            Self::Unsupported => "unsupported",
            Self::Backend => "backend",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Criteria,
    Paths,
    Projection,
    Order,
    Restriction,
    Backend,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Criteria => "criteria",
            Self::Paths => "paths",
            Self::Projection => "projection",
            Self::Order => "order",
            Self::Restriction => "restriction",
            Self::Backend => "backend",
        };
        write!(f, "{label}")
    }
}
