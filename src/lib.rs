//! Binary metadata encoding and blob compression for a content-addressed,
//! group-encrypted file system.
//!
//! Two layers share one envelope format. The codec layer frames four record
//! kinds (file nodes, directory nodes, access-control groups, and sparse
//! Merkle tree snapshots) behind a magic/version/tag header and a CRC-32
//! trailer, and still reads the legacy textual node form the previous system
//! produced. The compression layer trains a [`Dictionary`] (bounded string
//! substitution plus a canonical length-limited prefix code) and negotiates
//! per-blob between verbatim storage, the dictionary, an injected external
//! compressor, or both, always keeping the smallest result.
//!
//! Everything here is a pure transformation over owned byte buffers: no I/O,
//! no global state, no interpretation of hashes or ciphertexts.

mod crc;
mod legacy;
mod utils;

pub mod varint;

mod error;
pub use error::{Error, Result};

mod hash;
pub use hash::{Hash, Nonce, PublicKey};

mod timestamp;
pub use timestamp::{Timestamp, MAX_TIMESTAMP_MILLIS};

mod envelope;
pub use envelope::{
    has_magic, MAGIC, TAG_COMPRESSED, TAG_DIR_NODE, TAG_FILE_NODE, TAG_GROUP, TAG_SMT, VERSION,
};

mod file_node;
pub use file_node::{ChunkRef, FileNode};

mod dir_node;
pub use dir_node::DirNode;

mod group;
pub use group::{Group, GroupMember, Role};

mod smt;
pub use smt::{SmtData, SmtEntry};

mod node;
pub use node::{decode_node, encode_node, Node};

pub mod huffman;
pub use huffman::SymbolTree;

mod dict;
pub use dict::Dictionary;

mod blob;
pub use blob::{
    compress_blob, decompress_blob, sniff_content_type, BlobOptions, ContentType, Method,
};
