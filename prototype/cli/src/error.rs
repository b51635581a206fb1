use std::io;

use libra_format::UnknownTransition;

/// Everything that can go wrong on the pump link. None of these stop the
/// worker; they are reported through the log.
#[derive(thiserror::Error, Debug)]
pub enum LinkError {
    #[error("Failed to open port {port} with error {source}")]
    OpenFailed {
        port: String,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write all data to {port} ({written} of {expected} bytes) with error {reason}")]
    PartialWrite {
        port: String,
        written: usize,
        expected: usize,
        reason: String,
    },
    #[error("No serial devices were found!")]
    NoPorts,
    #[error("Failed to enumerate serial ports: {0}")]
    Enumerate(#[source] io::Error),
    #[error(transparent)]
    UnknownTransition(#[from] UnknownTransition),
}
