#[cfg(feature = "serde")]
#[macro_use]
extern crate serde;

use std::fmt;

/// Result type with custom Error
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error information
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// Type of error and additional information
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub error_type: ErrorType,

    /// Where this error occurred
    pub location: String,
}

/// Possible error types
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorType {
    // ? Dispatch errors
    /// The outbound call failed: connection, non-success status or undecodable body
    TransportError {
        status: Option<u16>,
        message: String,
    },
    /// A requested identifier was missing from the merged response
    KeyNotFound {
        id: String,
    },

    // ? Construction errors
    InvalidConfiguration {
        error: String,
    },

    // ? General errors
    InternalError,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorType::TransportError {
                status: Some(status),
                message,
            } => write!(f, "Transport error ({status}): {message}"),
            ErrorType::TransportError {
                status: None,
                message,
            } => write!(f, "Transport error: {message}"),
            ErrorType::KeyNotFound { id } => write!(f, "Key not found: {id}"),
            ErrorType::InvalidConfiguration { error } => {
                write!(f, "Invalid configuration: {error}")
            }
            ErrorType::InternalError => write!(f, "Internal error"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.error_type, self.location)
    }
}

impl std::error::Error for Error {}

#[macro_export]
macro_rules! create_error {
    ( $error: ident $( $tt:tt )? ) => {
        $crate::Error {
            error_type: $crate::ErrorType::$error $( $tt )?,
            location: format!("{}:{}:{}", file!(), line!(), column!()),
        }
    };
}

#[macro_export]
macro_rules! create_transport_error {
    ( $status: expr, $message: expr ) => {
        $crate::create_error!(TransportError {
            status: $status,
            message: $message.to_string()
        })
    };
}
