//! Record encoding with a bounded pool of reusable buffers.

use crate::core::store::error::StoreError;
use crate::types::IndexName;
use crate::types::index_name::versioned_record::VersionedRecord;
use crate::types::index_name::versioned_record::error::CodecError;
use parking_lot::Mutex;
use std::ops::Deref;

/// Initial capacity of a fresh buffer; typical records are well below this.
const BUFFER_CAPACITY: usize = 256;

pub(crate) struct RecordCodec {
    pool: Mutex<Vec<Vec<u8>>>,
    capacity: usize,
}

impl RecordCodec {
    pub fn new(capacity: usize) -> Self {
        Self {
            pool: Mutex::new(Vec::with_capacity(capacity)),
            capacity: capacity.max(1),
        }
    }

    pub fn encode(&self, name: &IndexName) -> Result<PooledBuffer<'_>, StoreError> {
        let record = name.to_latest_record()?;
        let buf = self
            .pool
            .lock()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(BUFFER_CAPACITY));
        let bytes = VersionedRecord::V1(record).encode_into(buf)?;
        Ok(PooledBuffer {
            codec: self,
            bytes: Some(bytes),
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<IndexName, CodecError> {
        let record = VersionedRecord::decode(bytes)?.into_latest();
        Ok(IndexName::from_latest_record(record))
    }

    #[cfg(test)]
    pub fn pooled(&self) -> usize {
        self.pool.lock().len()
    }

    fn release(&self, buf: Vec<u8>) {
        let mut pool = self.pool.lock();
        if pool.len() < self.capacity {
            pool.push(buf);
        }
    }
}

/// Encoded record bytes, returned to the pool on drop.
pub(crate) struct PooledBuffer<'a> {
    codec: &'a RecordCodec,
    bytes: Option<Vec<u8>>,
}

impl Deref for PooledBuffer<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.bytes.as_deref().unwrap_or_default()
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buf) = self.bytes.take() {
            self.codec.release(buf);
        }
    }
}
