//! On-disk record encoding: one version byte followed by a postcard body.

pub use v1 as latest_record;

pub mod v1;

pub trait RecordVariant {
    const VERSION: u8;
}

#[derive(Debug, Clone)]
pub enum VersionedRecord {
    V1(v1::Record),
}

impl VersionedRecord {
    pub fn into_latest(self) -> latest_record::Record {
        match self {
            VersionedRecord::V1(record) => record,
        }
    }

    /// Encodes into `buf`, clearing it first.
    pub fn encode_into(&self, mut buf: Vec<u8>) -> Result<Vec<u8>, error::CodecError> {
        buf.clear();
        match self {
            VersionedRecord::V1(record) => {
                buf.push(v1::Record::VERSION);
                Ok(postcard::to_extend(record, buf)?)
            }
        }
    }

    pub fn decode(data: &[u8]) -> Result<Self, error::CodecError> {
        let (version, body) = data.split_first().ok_or(error::CodecError::Empty)?;
        match *version {
            v1::Record::VERSION => Ok(VersionedRecord::V1(postcard::from_bytes(body)?)),
            version => Err(error::CodecError::UnsupportedVersion(version)),
        }
    }
}

pub mod error {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum CodecError {
        #[error("empty record bytes")]
        Empty,
        #[error("unsupported record version: {0}")]
        UnsupportedVersion(u8),
        #[error("postcard error: {0}")]
        Postcard(#[from] postcard::Error),
    }
}
