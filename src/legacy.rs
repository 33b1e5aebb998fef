//! Parsing of the legacy textual node representation.
//!
//! Before the binary format, nodes were stored as JSON produced by an
//! external system. That writer represents byte arrays as tagged objects of
//! the shape `{ "__uint8array": [..numbers..] }`. This module recognizes the
//! convention on input only; nothing in this crate ever emits it. The node
//! kind is carried by a `"type"` field, `"file"` or `"dir"`.

use serde_json::{Map, Value};

use crate::dir_node::DirNode;
use crate::error::{Error, Result};
use crate::file_node::{ChunkRef, FileNode};
use crate::hash::{Hash, Nonce};
use crate::node::Node;
use crate::timestamp::Timestamp;

/// Parse a legacy textual buffer into a node.
pub(crate) fn parse_node(buf: &[u8]) -> Result<Node> {
    let value: Value =
        serde_json::from_slice(buf).map_err(|err| Error::Legacy(err.to_string()))?;
    let map = as_object(&value, "node")?;
    match str_field(map, "type")? {
        "file" => Ok(Node::File(parse_file(map)?)),
        "dir" => Ok(Node::Dir(parse_dir(map)?)),
        other => Err(Error::Legacy(format!("unknown node type `{}`", other))),
    }
}

fn parse_file(map: &Map<String, Value>) -> Result<FileNode> {
    let chunks = match map.get("chunks") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(parse_chunk)
            .collect::<Result<Vec<ChunkRef>>>()?,
        Some(_) => return Err(Error::Legacy("`chunks` is not an array".into())),
    };
    Ok(FileNode {
        content_hash: hash_field(map, "content_hash")?,
        size: u64_field(map, "size")?,
        created: time_field(map, "created")?,
        modified: time_field(map, "modified")?,
        chunks,
    })
}

fn parse_chunk(value: &Value) -> Result<ChunkRef> {
    let map = as_object(value, "chunk")?;
    let nonce_bytes = bytes_field(map, "nonce")?;
    Ok(ChunkRef {
        index: u64_field(map, "index")?,
        hash: hash_field(map, "hash")?,
        blob_address: hash_field(map, "blob_address")?,
        nonce: Nonce::try_from(nonce_bytes.as_slice())
            .map_err(|_| Error::Legacy(format!("`nonce` holds {} bytes, expected 24", nonce_bytes.len())))?,
    })
}

fn parse_dir(map: &Map<String, Value>) -> Result<DirNode> {
    let group_id = match map.get("group_id") {
        None | Some(Value::Null) => None,
        Some(value) => Some(hash_value(value, "group_id")?),
    };
    Ok(DirNode {
        smt_root: hash_field(map, "smt_root")?,
        group_id,
        created: time_field(map, "created")?,
        modified: time_field(map, "modified")?,
    })
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::Legacy(format!("{} is not an object", what)))
}

fn get<'a>(map: &'a Map<String, Value>, name: &str) -> Result<&'a Value> {
    map.get(name)
        .ok_or_else(|| Error::Legacy(format!("missing field `{}`", name)))
}

fn str_field<'a>(map: &'a Map<String, Value>, name: &str) -> Result<&'a str> {
    get(map, name)?
        .as_str()
        .ok_or_else(|| Error::Legacy(format!("`{}` is not a string", name)))
}

fn u64_field(map: &Map<String, Value>, name: &str) -> Result<u64> {
    get(map, name)?
        .as_u64()
        .ok_or_else(|| Error::Legacy(format!("`{}` is not an unsigned integer", name)))
}

fn time_field(map: &Map<String, Value>, name: &str) -> Result<Timestamp> {
    Timestamp::from_millis(u64_field(map, name)?)
}

/// Extract raw bytes from either the tagged `{ "__uint8array": [..] }` shape
/// or a plain JSON array of numbers.
fn bytes_value(value: &Value, what: &str) -> Result<Vec<u8>> {
    let items = match value {
        Value::Object(map) => get(map, "__uint8array")?
            .as_array()
            .ok_or_else(|| Error::Legacy(format!("`{}` __uint8array is not an array", what)))?,
        Value::Array(items) => items,
        _ => {
            return Err(Error::Legacy(format!(
                "`{}` is neither a byte-array object nor an array",
                what
            )))
        }
    };
    items
        .iter()
        .map(|item| {
            item.as_u64()
                .filter(|&n| n <= 0xFF)
                .map(|n| n as u8)
                .ok_or_else(|| Error::Legacy(format!("`{}` holds a non-byte value", what)))
        })
        .collect()
}

fn bytes_field(map: &Map<String, Value>, name: &str) -> Result<Vec<u8>> {
    bytes_value(get(map, name)?, name)
}

fn hash_value(value: &Value, what: &str) -> Result<Hash> {
    let bytes = bytes_value(value, what)?;
    Hash::try_from(bytes.as_slice())
        .map_err(|_| Error::Legacy(format!("`{}` holds {} bytes, expected 32", what, bytes.len())))
}

fn hash_field(map: &Map<String, Value>, name: &str) -> Result<Hash> {
    hash_value(get(map, name)?, name)
}

#[cfg(test)]
mod test {
    use super::*;

    fn uint8array(len: usize, fill: u8) -> String {
        let nums: Vec<String> = std::iter::repeat(fill.to_string()).take(len).collect();
        format!("{{\"__uint8array\":[{}]}}", nums.join(","))
    }

    #[test]
    fn file_node() {
        let json = format!(
            "{{\"type\":\"file\",\"content_hash\":{},\"size\":100,\
             \"created\":1700000000000,\"modified\":1700000000000,\
             \"chunks\":[{{\"index\":0,\"hash\":{},\"blob_address\":{},\"nonce\":{}}}]}}",
            uint8array(32, 1),
            uint8array(32, 2),
            uint8array(32, 3),
            uint8array(24, 4),
        );
        let node = parse_node(json.as_bytes()).unwrap();
        let Node::File(file) = node else {
            panic!("expected a file node");
        };
        assert_eq!(file.size, 100);
        assert_eq!(file.content_hash, Hash::from_bytes([1; 32]));
        assert_eq!(file.chunks.len(), 1);
        assert_eq!(file.chunks[0].nonce, Nonce::from_bytes([4; 24]));
    }

    #[test]
    fn dir_node_inherit() {
        let json = format!(
            "{{\"type\":\"dir\",\"smt_root\":{},\"group_id\":null,\
             \"created\":1,\"modified\":2}}",
            uint8array(32, 9),
        );
        let node = parse_node(json.as_bytes()).unwrap();
        let Node::Dir(dir) = node else {
            panic!("expected a dir node");
        };
        assert_eq!(dir.group_id, None);
        assert_eq!(dir.smt_root, Hash::from_bytes([9; 32]));
    }

    #[test]
    fn plain_arrays_accepted() {
        let bytes: Vec<String> = (0..32).map(|_| "7".to_string()).collect();
        let json = format!(
            "{{\"type\":\"dir\",\"smt_root\":[{}],\"created\":1,\"modified\":2}}",
            bytes.join(","),
        );
        let Node::Dir(dir) = parse_node(json.as_bytes()).unwrap() else {
            panic!("expected a dir node");
        };
        assert_eq!(dir.smt_root, Hash::from_bytes([7; 32]));
    }

    #[test]
    fn bad_inputs() {
        assert!(matches!(parse_node(b"not json"), Err(Error::Legacy(_))));
        assert!(matches!(parse_node(b"{}"), Err(Error::Legacy(_))));
        assert!(matches!(
            parse_node(b"{\"type\":\"socket\"}"),
            Err(Error::Legacy(_))
        ));
        let json = "{\"type\":\"file\",\"content_hash\":{\"__uint8array\":[1,2]},\
                    \"size\":1,\"created\":1,\"modified\":1}";
        assert!(matches!(parse_node(json.as_bytes()), Err(Error::Legacy(_))));
    }
}
