//! Access-control group records.

use crate::envelope::{write_envelope, Envelope, TAG_GROUP};
use crate::error::{Error, Result};
use crate::hash::{Hash, PublicKey};
use crate::utils::{expect_consumed, read_u8, take};
use crate::varint::{read_varint, write_varint};

/// What a member may do within a group. Encoded as a single byte with a
/// closed set of values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Role {
    /// May decrypt and read content.
    Read,
    /// May also write new content.
    Write,
    /// May also manage membership.
    Admin,
}

impl From<Role> for u8 {
    fn from(role: Role) -> u8 {
        match role {
            Role::Read => 0x00,
            Role::Write => 0x01,
            Role::Admin => 0x02,
        }
    }
}

impl TryFrom<u8> for Role {
    type Error = Error;
    fn try_from(value: u8) -> Result<Role> {
        match value {
            0x00 => Ok(Role::Read),
            0x01 => Ok(Role::Write),
            0x02 => Ok(Role::Admin),
            value => Err(Error::Malformed {
                what: "role",
                value,
            }),
        }
    }
}

/// One group member: their public key, the group's data-encryption key
/// re-encrypted under that key, and their role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupMember {
    /// The member's public key.
    pub public_key: PublicKey,
    /// The group DEK, encrypted to this member. Opaque; its length depends on
    /// the encryption stage.
    pub encrypted_dek: Vec<u8>,
    /// What the member may do.
    pub role: Role,
}

impl GroupMember {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.public_key.encode(buf);
        write_varint(buf, self.encrypted_dek.len() as u64);
        buf.extend_from_slice(&self.encrypted_dek);
        buf.push(self.role.into());
    }

    fn decode(buf: &mut &[u8]) -> Result<Self> {
        let public_key = PublicKey::decode(buf)?;
        let dek_len = read_varint(buf)? as usize;
        let encrypted_dek = take(buf, dek_len, "read encrypted dek")?.to_vec();
        let role = Role::try_from(read_u8(buf, "read role")?)?;
        Ok(Self {
            public_key,
            encrypted_dek,
            role,
        })
    }
}

/// An access-control group: an identifier and its ordered member list.
///
/// Payload layout:
///
/// ```text
/// id(32) ‖ member_count(varint) ‖
///   [pubkey(32) ‖ dek_len(varint) ‖ encrypted_dek ‖ role(1)]×
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    /// The group's identifier.
    pub id: Hash,
    /// Members in insertion order; order survives a round-trip.
    pub members: Vec<GroupMember>,
}

impl Group {
    /// Encode into a complete envelope.
    pub fn encode(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(Hash::LEN + 1 + self.members.len() * 64);
        self.id.encode(&mut payload);
        write_varint(&mut payload, self.members.len() as u64);
        for member in &self.members {
            member.encode(&mut payload);
        }
        write_envelope(TAG_GROUP, &payload)
    }

    /// Decode from a complete envelope, insisting on the group tag.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let payload = Envelope::split_expecting(buf, TAG_GROUP)?;
        let mut cursor = payload;
        let id = Hash::decode(&mut cursor)?;
        let count = read_varint(&mut cursor)?;
        let mut members = Vec::with_capacity(count.min(1024) as usize);
        for _ in 0..count {
            members.push(GroupMember::decode(&mut cursor)?);
        }
        expect_consumed(cursor, payload.len())?;
        Ok(Self { id, members })
    }
}
