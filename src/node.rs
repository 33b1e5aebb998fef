//! The file-or-directory node sum type and its dispatching codec.

use crate::dir_node::DirNode;
use crate::envelope::{has_magic, Envelope, TAG_DIR_NODE, TAG_FILE_NODE};
use crate::error::{Error, Result};
use crate::file_node::FileNode;
use crate::legacy;
use crate::timestamp::Timestamp;
use crate::utils::expect_consumed;

/// A filesystem node: either a file or a directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// A file node.
    File(FileNode),
    /// A directory node.
    Dir(DirNode),
}

impl Node {
    /// Creation time of the underlying node.
    pub fn created(&self) -> Timestamp {
        match self {
            Node::File(file) => file.created,
            Node::Dir(dir) => dir.created,
        }
    }

    /// Last modification time of the underlying node.
    pub fn modified(&self) -> Timestamp {
        match self {
            Node::File(file) => file.modified,
            Node::Dir(dir) => dir.modified,
        }
    }
}

impl From<FileNode> for Node {
    fn from(node: FileNode) -> Self {
        Node::File(node)
    }
}

impl From<DirNode> for Node {
    fn from(node: DirNode) -> Self {
        Node::Dir(node)
    }
}

/// Encode a node into a binary envelope. The binary form is the only form
/// this crate ever writes; the legacy textual form is read-only.
pub fn encode_node(node: &Node) -> Vec<u8> {
    match node {
        Node::File(file) => file.encode(),
        Node::Dir(dir) => dir.encode(),
    }
}

/// Decode a node from either a binary envelope or the legacy textual form.
///
/// Buffers opening with the envelope magic are decoded as envelopes and
/// dispatched on the record tag; anything else is handed to the legacy
/// parser. An envelope holding a non-node record fails with
/// [`Error::BadTag`].
pub fn decode_node(buf: &[u8]) -> Result<Node> {
    if !has_magic(buf) {
        return legacy::parse_node(buf);
    }
    let envelope = Envelope::split(buf)?;
    let payload_len = envelope.payload.len();
    let mut cursor = envelope.payload;
    let node = match envelope.tag {
        TAG_FILE_NODE => Node::File(FileNode::decode_payload(&mut cursor)?),
        TAG_DIR_NODE => Node::Dir(DirNode::decode_payload(&mut cursor)?),
        actual => {
            return Err(Error::BadTag {
                expected: 0,
                actual,
            })
        }
    };
    expect_consumed(cursor, payload_len)?;
    Ok(node)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::group::Group;
    use crate::hash::Hash;

    fn at(millis: u64) -> Timestamp {
        Timestamp::from_millis(millis).unwrap()
    }

    #[test]
    fn roundtrip_both_kinds() {
        let file = Node::File(FileNode {
            content_hash: Hash::from_bytes([5; 32]),
            size: 42,
            created: at(10),
            modified: at(20),
            chunks: Vec::new(),
        });
        assert_eq!(decode_node(&encode_node(&file)).unwrap(), file);

        let dir = Node::Dir(DirNode {
            smt_root: Hash::from_bytes([6; 32]),
            group_id: Some(Hash::from_bytes([7; 32])),
            created: at(30),
            modified: at(40),
        });
        assert_eq!(decode_node(&encode_node(&dir)).unwrap(), dir);
    }

    #[test]
    fn legacy_input_dispatches() {
        // First byte is `{`, not the magic, so the textual parser runs.
        let nums: Vec<String> = (0..32).map(|_| "0".to_string()).collect();
        let json = format!(
            "{{\"type\":\"file\",\"content_hash\":{{\"__uint8array\":[{}]}},\
             \"size\":100,\"created\":1700000000000,\"modified\":1700000000000}}",
            nums.join(","),
        );
        let Node::File(file) = decode_node(json.as_bytes()).unwrap() else {
            panic!("expected a file node");
        };
        assert_eq!(file.size, 100);
        assert!(file.chunks.is_empty());
    }

    #[test]
    fn non_node_tag_rejected() {
        let group = Group {
            id: Hash::default(),
            members: Vec::new(),
        };
        let buf = group.encode();
        assert_eq!(
            decode_node(&buf),
            Err(Error::BadTag {
                expected: 0,
                actual: crate::envelope::TAG_GROUP
            })
        );
    }
}
