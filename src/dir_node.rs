//! Directory node records.

use crate::envelope::{write_envelope, Envelope, TAG_DIR_NODE};
use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::timestamp::Timestamp;
use crate::utils::{expect_consumed, read_u8};

/// A directory's metadata record.
///
/// The directory's children live in a sparse Merkle tree summarized by
/// `smt_root`. A directory either names its own access-control group or, when
/// `group_id` is `None`, inherits the nearest ancestor's group.
///
/// Payload layout:
///
/// ```text
/// smt_root(32) ‖ has_group(1) ‖ [group_id(32) if has_group = 1] ‖
/// created(6 BE) ‖ modified(6 BE)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirNode {
    /// Root of the sparse Merkle tree holding the directory's entries.
    pub smt_root: Hash,
    /// The directory's group, or `None` to inherit.
    pub group_id: Option<Hash>,
    /// Creation time.
    pub created: Timestamp,
    /// Last modification time.
    pub modified: Timestamp,
}

impl DirNode {
    /// Encode into a complete envelope.
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(2 * Hash::LEN + 2 * Timestamp::LEN + 1);
        self.smt_root.encode(&mut payload);
        match &self.group_id {
            Some(group_id) => {
                payload.push(0x01);
                group_id.encode(&mut payload);
            }
            None => payload.push(0x00),
        }
        self.created.encode(&mut payload);
        self.modified.encode(&mut payload);
        write_envelope(TAG_DIR_NODE, &payload)
    }

    /// Decode from a complete envelope, insisting on the directory-node tag.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let payload = Envelope::split_expecting(buf, TAG_DIR_NODE)?;
        let mut cursor = payload;
        let node = Self::decode_payload(&mut cursor)?;
        expect_consumed(cursor, payload.len())?;
        Ok(node)
    }

    pub(crate) fn decode_payload(buf: &mut &[u8]) -> Result<Self> {
        let smt_root = Hash::decode(buf)?;
        let group_id = match read_u8(buf, "read has-group flag")? {
            0x00 => None,
            0x01 => Some(Hash::decode(buf)?),
            value => {
                return Err(Error::Malformed {
                    what: "has-group flag",
                    value,
                })
            }
        };
        Ok(Self {
            smt_root,
            group_id,
            created: Timestamp::decode(buf)?,
            modified: Timestamp::decode(buf)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn at(millis: u64) -> Timestamp {
        Timestamp::from_millis(millis).unwrap()
    }

    #[test]
    fn roundtrip_inherit() {
        let node = DirNode {
            smt_root: Hash::from_bytes([0x77; 32]),
            group_id: None,
            created: at(1_700_000_000_000),
            modified: at(1_700_000_123_456),
        };
        let buf = node.encode();
        assert_eq!(DirNode::decode(&buf).unwrap(), node);
    }

    #[test]
    fn roundtrip_with_group() {
        let node = DirNode {
            smt_root: Hash::from_bytes([0x77; 32]),
            group_id: Some(Hash::from_bytes([0x99; 32])),
            created: at(1_700_000_000_000),
            modified: at(1_700_000_000_000),
        };
        let buf = node.encode();
        assert_eq!(DirNode::decode(&buf).unwrap(), node);
    }

    #[test]
    fn encoded_lengths() {
        // Envelope overhead is 8 bytes; the inherit payload is 45 bytes and
        // the group payload 77.
        let inherit = DirNode {
            smt_root: Hash::default(),
            group_id: None,
            created: at(1_700_000_000_000),
            modified: at(1_700_000_000_000),
        };
        assert_eq!(inherit.encode().len(), 53);

        let with_group = DirNode {
            group_id: Some(Hash::default()),
            ..inherit
        };
        assert_eq!(with_group.encode().len(), 85);
    }

    #[test]
    fn bad_flag_byte() {
        let node = DirNode {
            smt_root: Hash::default(),
            group_id: None,
            created: at(0),
            modified: at(0),
        };
        let buf = node.encode();
        let payload = Envelope::split_expecting(&buf, TAG_DIR_NODE).unwrap();
        let mut bad = payload.to_vec();
        bad[32] = 0x02;
        let reframed = write_envelope(TAG_DIR_NODE, &bad);
        assert_eq!(
            DirNode::decode(&reframed),
            Err(Error::Malformed {
                what: "has-group flag",
                value: 0x02
            })
        );
    }
}
