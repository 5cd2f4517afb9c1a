use crate::config::ChainType;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Rpc(sublink_rpc::Error),
    #[error(transparent)]
    Metadata(#[from] sublink_metadata::Error),
    #[error(transparent)]
    Types(#[from] sublink_types::Error),
    #[error(transparent)]
    Interface(#[from] sublink_interface::Error),
    #[error("metadata V{version} is not supported by the {chain} dialect")]
    UnsupportedMetadata { chain: ChainType, version: u8 },
    #[error("invalid hex data: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid {what}: {source}")]
    Decode {
        what: &'static str,
        source: parity_scale_codec::Error,
    },
    #[error("no value stored for {0}")]
    StorageNotFound(String),
    #[error("unexpected value of {entry}: {reason}")]
    UnexpectedValue { entry: String, reason: String },
    #[error("invalid {event} event: {reason}")]
    EventData { event: String, reason: String },
    #[error("block not found: {0}")]
    BlockNotFound(String),
    #[error("{0} arguments expected by {1}, got {2}")]
    CallArity(usize, String, usize),
    #[error("no signer configured")]
    MissingSigner,
    #[error("extrinsic retracted from block {0}")]
    Retracted(String),
    #[error("extrinsic dropped from the network")]
    Dropped,
    #[error("extrinsic invalid")]
    Invalid,
    #[error("extrinsic usurped by {0}")]
    Usurped(String),
    #[error("extrinsic not finalized in time, block {0}")]
    FinalityTimeout(String),
    #[error("terminated")]
    Terminated,
}

impl From<sublink_rpc::Error> for Error {
    fn from(err: sublink_rpc::Error) -> Self {
        match err {
            sublink_rpc::Error::Terminated => Error::Terminated,
            err => Error::Rpc(err),
        }
    }
}

impl Error {
    /// Only failures of the transport are worth another attempt. Decoding
    /// and submission failures would fail the same way again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Rpc(err) => err.is_transport(),
            _ => false,
        }
    }
}
