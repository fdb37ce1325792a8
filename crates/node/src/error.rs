//! A bunch of wrap errors.

/// A wrap `Result` contains custom errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors enum mapping global custom errors.
/// The error type can be expressed in decimal, where the high decs represent
/// the error category and the low decs represent the error type.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
#[repr(u32)]
pub enum Error {
    #[error("Decode error.")]
    DecodeError = 300,
    #[error("Encode error.")]
    EncodeError = 301,
    #[error("Invalid node id: {0}")]
    InvalidNodeId(String) = 500,
    #[error("Invalid address: {0}")]
    InvalidAddress(String) = 804,
    #[error("Invalid logging level: {0}")]
    InvalidLoggingLevel(String) = 809,
    #[error("Create File Error: {0}")]
    CreateFileError(String) = 900,
    #[error("Open File Error: {0}")]
    OpenFileError(String) = 901,
    #[error("Cannot find home directory")]
    HomeDirError = 903,
    #[error("Cannot find parent directory")]
    ParentDirError = 904,
    #[error("Serde json error: {0}")]
    SerdeJsonError(#[from] serde_json::Error) = 1000,
    #[error("Core error: {0}")]
    CoreError(#[from] chordring_core::error::Error) = 1102,
}

impl Error {
    fn discriminant(&self) -> u32 {
        // SAFETY: Because `Self` is marked `repr(u32)`, its layout is a `repr(C)` `union`
        // between `repr(C)` structs, each of which has the `u32` discriminant as its first
        // field, so we can read the discriminant without offsetting the pointer.
        // ref: https://doc.rust-lang.org/std/mem/fn.discriminant.html
        unsafe { *<*const _>::from(self).cast::<u32>() }
    }

    pub fn code(&self) -> u32 {
        self.discriminant()
    }
}

impl From<Error> for jsonrpc_core::Error {
    fn from(e: Error) -> Self {
        Self {
            code: jsonrpc_core::ErrorCode::ServerError(e.code().into()),
            message: e.to_string(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chordring_core::dht::Id;

    use super::*;

    #[test]
    fn test_error_code() {
        let err = Error::InvalidAddress("localhost".to_string());
        assert_eq!(err.code(), 804);
        let err = Error::DecodeError;
        assert_eq!(err.code(), 300);
        let err = Error::CoreError(chordring_core::error::Error::NotJoined);
        assert_eq!(err.code(), 1102);
    }

    #[test]
    fn test_unreachable_peer_to_rpc_error() {
        let err: jsonrpc_core::Error =
            Error::from(chordring_core::error::Error::PeerUnreachable(Id::new(12))).into();
        assert_eq!(err.code, jsonrpc_core::ErrorCode::ServerError(1102));
        assert_eq!(err.message, "Core error: Peer 12 is unreachable");
    }
}
