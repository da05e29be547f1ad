//! The interned name dictionary.

use std::io::Read;
use std::sync::Arc;

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{instrument, trace};

use crate::error::{Error, Result};

/// Hash-bucketed table of the node and attribute names used by a file
///
/// Names are addressed by the bucket they were hashed into and their offset in that bucket's
/// chain. Both are packed into the 32-bit name references of the node and attribute tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameDictionary {
    buckets: Vec<Vec<Arc<str>>>,
}

impl NameDictionary {
    /// Decode the dictionary
    ///
    /// | Field        | Size              |
    /// |--------------|-------------------|
    /// | bucket count | u32               |
    /// | per bucket: string count | u16   |
    /// | per string: length       | u16   |
    /// | per string: bytes        | length, no terminator |
    #[instrument(skip(reader), err)]
    pub fn read<R: Read>(reader: &mut R) -> Result<NameDictionary> {
        let bucket_count = reader.read_u32::<LittleEndian>()?;

        let mut buckets = Vec::with_capacity((bucket_count as usize).min(0x1_0000));
        for bucket in 0..bucket_count {
            let string_count = reader.read_u16::<LittleEndian>()?;

            let mut chain = Vec::with_capacity(string_count as usize);
            for _ in 0..string_count {
                let length = reader.read_u16::<LittleEndian>()? as usize;
                let mut raw = vec![0u8; length];
                reader.read_exact(&mut raw)?;

                let name: Arc<str> = String::from_utf8_lossy(&raw).into();
                trace!(bucket, offset = chain.len(), name = %name, "read name");
                chain.push(name);
            }
            buckets.push(chain);
        }

        Ok(NameDictionary { buckets })
    }

    /// Resolve a name by bucket and chain offset
    pub fn get(&self, bucket: usize, offset: usize) -> Result<Arc<str>> {
        self.buckets
            .get(bucket)
            .and_then(|chain| chain.get(offset))
            .cloned()
            .ok_or(Error::InvalidName { bucket, offset })
    }

    /// Resolve a packed name reference (16-bit bucket, 16-bit offset)
    pub fn resolve(&self, name: u32) -> Result<Arc<str>> {
        let (bucket, offset) = crate::types::split_name_ref(name);
        self.get(bucket, offset)
    }

    /// Number of buckets
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}
