use bpfinspect_common::{format_entry, RenderConfig};
use serde::Serialize;

use crate::probe::schema::{MapDumpRecord, MapRecord};

/// One BPF map as reported by `map show`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapEntity {
    pub id: u32,
    pub kind: String,
    pub name: String,
    pub flags: u32,
    pub key_size: u32,
    pub value_size: u32,
    pub max_entries: u32,
    pub bytes_memlock: u64,
    pub btf_id: u32,
    pub frozen: bool,
    pub pinned: Vec<String>,
}

impl From<MapRecord> for MapEntity {
    fn from(r: MapRecord) -> Self {
        Self {
            id: r.id,
            kind: r.kind,
            name: r.name,
            flags: r.flags,
            key_size: r.key_size,
            value_size: r.value_size,
            max_entries: r.max_entries,
            bytes_memlock: r.bytes_memlock,
            btf_id: r.btf_id,
            frozen: r.frozen != 0,
            pinned: r.pinned,
        }
    }
}

impl MapEntity {
    /// Single-line label for map lists, e.g. `    3: hash counts (frozen)`.
    pub fn summary_line(&self) -> String {
        let mut line = format!("{:>7}: {}", self.id, self.kind);
        if !self.name.is_empty() {
            line.push(' ');
            line.push_str(&self.name);
        }
        if self.frozen {
            line.push_str(" (frozen)");
        }
        line
    }
}

/// A key/value pair from one map dump. Never cached: every inspection dumps
/// the map again.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapEntry {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl MapEntry {
    pub fn render(&self, config: &RenderConfig) -> (String, String) {
        format_entry(&self.key, &self.value, config)
    }
}

impl TryFrom<MapDumpRecord> for MapEntry {
    type Error = String;

    fn try_from(r: MapDumpRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            key: decode_hex_bytes(&r.key)?,
            value: decode_hex_bytes(&r.value)?,
        })
    }
}

/// Decode bpftool's `["0x41", "0x00"]` byte lists.
pub fn decode_hex_bytes(tokens: &[String]) -> Result<Vec<u8>, String> {
    tokens
        .iter()
        .map(|token| {
            let digits = token.strip_prefix("0x").unwrap_or(token);
            u8::from_str_radix(digits, 16).map_err(|_| format!("invalid byte string {token:?}"))
        })
        .collect()
}

/// Encode bytes as bpftool command-line arguments (`hex 41 00`).
pub fn hex_args(bytes: &[u8]) -> Vec<String> {
    std::iter::once("hex".to_string())
        .chain(bytes.iter().map(|b| format!("{b:02x}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn decodes_prefixed_and_bare_hex() {
        assert_eq!(decode_hex_bytes(&[]), Ok(vec![]));
        assert_eq!(decode_hex_bytes(&strings(&["0x00"])), Ok(vec![0]));
        assert_eq!(
            decode_hex_bytes(&strings(&["0x00", "0x01", "ff", "0x7f"])),
            Ok(vec![0, 1, 0xff, 0x7f])
        );
    }

    #[test]
    fn rejects_non_hex_tokens() {
        assert!(decode_hex_bytes(&strings(&["0xzz"])).is_err());
        assert!(decode_hex_bytes(&strings(&["0x100"])).is_err());
    }

    #[test]
    fn dump_record_to_entry() {
        let record = MapDumpRecord {
            key: strings(&["0x01", "0x00", "0x00", "0x00"]),
            value: strings(&["0x2a", "0x00", "0x00", "0x00", "0x00", "0x00", "0x00", "0x00"]),
        };
        let entry = MapEntry::try_from(record).unwrap();
        assert_eq!(entry.key, vec![1, 0, 0, 0]);
        assert_eq!(entry.value[0], 42);
    }

    #[test]
    fn summary_line_marks_frozen_maps() {
        let map = MapEntity {
            id: 3,
            kind: "array".to_string(),
            name: "cfg".to_string(),
            frozen: true,
            ..MapEntity::default()
        };
        assert_eq!(map.summary_line(), "      3: array cfg (frozen)");
    }

    #[test]
    fn hex_args_for_update() {
        assert_eq!(hex_args(&[0x41, 0]), ["hex", "41", "00"]);
    }
}
