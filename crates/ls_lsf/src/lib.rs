//! This library reads **LSF** resource files used by the games of *Larian Studios*.
//!
//! # LSF Format Documentation
//!
//! LSF is the binary form of a Larian resource: a forest of named nodes carrying typed
//! attributes. Names, the node table, the attribute table and the attribute values are stored
//! as four separate segments, so a reader needs every segment before it can rebuild a single
//! node. Decoded files become an [`ls_resource::Resource`].
//!
//! ## File Structure
//!
//! A file is a 52-byte header followed by the four segments, back to back, in this order:
//! names, nodes, attributes, values.
//!
//! | Offset (bytes) | Field                  | Description                                                |
//! |----------------|------------------------|------------------------------------------------------------|
//! | 0x0000         | Magic number           | 4 bytes: "LSOF" (or the legacy "LSFM")                     |
//! | 0x0004         | Version                | 4 bytes: 1 to 4, see [`FileVersion`]                       |
//! | 0x0008         | Engine version         | 4 bytes: packed major/minor/revision/build                 |
//! | 0x000C         | Names sizes            | 2 × 4 bytes: uncompressed size, size on disk               |
//! | 0x0014         | Nodes sizes            | 2 × 4 bytes: uncompressed size, size on disk               |
//! | 0x001C         | Attributes sizes       | 2 × 4 bytes: uncompressed size, size on disk               |
//! | 0x0024         | Values sizes           | 2 × 4 bytes: uncompressed size, size on disk               |
//! | 0x002C         | Compression flags      | 1 byte: method (low nibble), level (high nibble)           |
//! | 0x002D         | Reserved               | 1 byte + 2 bytes                                           |
//! | 0x0030         | Extended               | 4 bytes: 1 when the extended descriptors are used          |
//!
//! ### Compression
//!
//! Every segment is compressed with the same method: `0` none, `1` zlib, `2` LZ4. Version 1 files
//! store LZ4 segments as a single block, later versions as LZ4 frames. The names segment is
//! always a single block. When nothing is compressed the on-disk sizes are ignored.
//!
//! ### Names
//!
//! A hash table of strings. Nodes and attributes refer to a name with a 32-bit reference whose
//! high half is the bucket and whose low half is the position in the bucket's chain.
//!
//! ### Nodes and attributes
//!
//! Flat tables running to the end of their segment. Each node names its parent (-1 for a root
//! region) and the head of its attribute chain. Compact attribute descriptors name their node
//! and pack the data type (6 bits) with the value length (26 bits); the chain links and value
//! offsets are implied by table order. Extended descriptors (version 3 and later, when flagged)
//! store the next attribute and value offset explicitly.
//!
//! ### Values
//!
//! Attribute payloads, little-endian, in the order the attributes are visited.
//!
//! ## Example
//!
//! ```no_run
//! let file = std::fs::File::open("meta.lsf")?;
//! let resource = ls_lsf::read(std::io::BufReader::new(file))?;
//!
//! for region in resource.regions() {
//!     println!("{}", region.name);
//! }
//! # Ok::<(), ls_lsf::error::Error>(())
//! ```

pub(crate) mod binutils;
pub mod compression;
pub mod error;
pub mod names;
pub mod read;
pub mod tables;
pub mod types;
pub mod values;

pub use compression::{CompressionLevel, CompressionMethod};
pub use read::{read, LsfReader, ReadOptions};
pub use types::{is_supported_signature, FileVersion, LsfHeader, Segment};
