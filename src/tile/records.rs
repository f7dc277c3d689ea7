//! Auxiliary tile records: signs, access restrictions, admins, and
//! the edge-info side table entries.

use crate::geo::LatLon;

/// Exit sign content categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SignType {
    ExitNumber = 0,
    ExitBranch = 1,
    ExitToward = 2,
    ExitName = 3,
}

impl SignType {
    pub fn from_u8(v: u8) -> SignType {
        match v {
            0 => SignType::ExitNumber,
            1 => SignType::ExitBranch,
            2 => SignType::ExitToward,
            _ => SignType::ExitName,
        }
    }
}

/// On-disk sign record, keyed by the owning directed edge index. The
/// text lives in the tile's text list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sign {
    pub edge_index: u32,
    pub sign_type: SignType,
    pub text_offset: u32,
}

impl Sign {
    pub const ENCODED_SIZE: usize = 12;

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.edge_index.to_le_bytes());
        out.push(self.sign_type as u8);
        out.extend_from_slice(&[0u8; 3]);
        out.extend_from_slice(&self.text_offset.to_le_bytes());
    }

    pub fn decode(buf: &[u8]) -> Sign {
        Sign {
            edge_index: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            sign_type: SignType::from_u8(buf[4]),
            text_offset: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
        }
    }
}

/// A sign with its text resolved, as handed between tiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInfo {
    pub sign_type: SignType,
    pub text: String,
}

/// Access restriction categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AccessRestrictionKind {
    Hazmat = 0,
    MaxHeight = 1,
    MaxWidth = 2,
    MaxLength = 3,
    MaxWeight = 4,
    MaxAxleLoad = 5,
}

impl AccessRestrictionKind {
    pub fn from_u8(v: u8) -> AccessRestrictionKind {
        match v {
            0 => AccessRestrictionKind::Hazmat,
            1 => AccessRestrictionKind::MaxHeight,
            2 => AccessRestrictionKind::MaxWidth,
            3 => AccessRestrictionKind::MaxLength,
            4 => AccessRestrictionKind::MaxWeight,
            _ => AccessRestrictionKind::MaxAxleLoad,
        }
    }
}

/// Access restriction record, keyed by the owning directed edge index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRestriction {
    pub edge_index: u32,
    pub kind: AccessRestrictionKind,
    /// Travel modes the restriction applies to.
    pub modes: u8,
    /// Kind-dependent value (e.g. centimeters for MaxHeight).
    pub value: u64,
}

impl AccessRestriction {
    pub const ENCODED_SIZE: usize = 16;

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.edge_index.to_le_bytes());
        out.push(self.kind as u8);
        out.push(self.modes);
        out.extend_from_slice(&[0u8; 2]);
        out.extend_from_slice(&self.value.to_le_bytes());
    }

    pub fn decode(buf: &[u8]) -> AccessRestriction {
        AccessRestriction {
            edge_index: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            kind: AccessRestrictionKind::from_u8(buf[4]),
            modes: buf[5],
            value: u64::from_le_bytes(buf[8..16].try_into().unwrap()),
        }
    }
}

/// On-disk admin record; the country/state names live in the text
/// list, the ISO codes are stored inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminRecord {
    pub country_iso: [u8; 2],
    pub state_iso: [u8; 2],
    pub country_text_offset: u32,
    pub state_text_offset: u32,
}

impl AdminRecord {
    pub const ENCODED_SIZE: usize = 12;

    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.country_iso);
        out.extend_from_slice(&self.state_iso);
        out.extend_from_slice(&self.country_text_offset.to_le_bytes());
        out.extend_from_slice(&self.state_text_offset.to_le_bytes());
    }

    pub fn decode(buf: &[u8]) -> AdminRecord {
        AdminRecord {
            country_iso: [buf[0], buf[1]],
            state_iso: [buf[2], buf[3]],
            country_text_offset: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            state_text_offset: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
        }
    }
}

/// An admin record with its texts resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminInfo {
    pub country_text: String,
    pub state_text: String,
    pub country_iso: String,
    pub state_iso: String,
}

/// A decoded edge-info side table entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeInfo {
    pub wayid: i64,
    pub shape: Vec<LatLon>,
    pub names: Vec<String>,
}

/// Convert an ISO field to its string form (trailing NULs dropped).
pub fn iso_to_string(iso: &[u8; 2]) -> String {
    iso.iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect()
}

/// Convert a string to a fixed 2-byte ISO field.
pub fn iso_from_str(s: &str) -> [u8; 2] {
    let mut out = [0u8; 2];
    for (i, b) in s.bytes().take(2).enumerate() {
        out[i] = b;
    }
    out
}
