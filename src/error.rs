use std::path::PathBuf;

use thiserror::Error;

/// Exit status for a required input that does not exist (sysexits `EX_NOINPUT`).
pub const EXIT_NO_INPUT: u8 = 66;
/// Exit status for input that exists but cannot be parsed (sysexits `EX_DATAERR`).
pub const EXIT_DATA_ERR: u8 = 65;

/// Fatal input errors. Anything else bubbles up as a plain `anyhow::Error`.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("{what} not found: {}", path.display())]
    Missing { what: &'static str, path: PathBuf },
    #[error("malformed {what} in {}: {message}", path.display())]
    Malformed {
        what: &'static str,
        path: PathBuf,
        message: String,
    },
}

impl InputError {
    pub fn exit_code(&self) -> u8 {
        match self {
            InputError::Missing { .. } => EXIT_NO_INPUT,
            InputError::Malformed { .. } => EXIT_DATA_ERR,
        }
    }
}

/// Map an application error to the process exit status.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<InputError>())
        .map(InputError::exit_code)
        .unwrap_or(1)
}
