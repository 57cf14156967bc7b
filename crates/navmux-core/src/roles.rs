//! Device-role table.
//!
//! Maps a receiver's SEC-UNIQID chip id to the job it does on the vessel.
//! The table is a JSON object keyed by the lowercase hex id:
//!
//! ```json
//! { "0a1b2c3d4e": "heading", "1122334455": "moving_base" }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocols::ubx::UniqueId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRole {
    #[serde(alias = "Moving Base")]
    MovingBase,
    #[serde(alias = "Heading")]
    Heading,
    #[serde(alias = "Roll")]
    Roll,
}

impl DeviceRole {
    pub const ALL: [Self; 3] = [Self::MovingBase, Self::Heading, Self::Roll];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MovingBase => "moving_base",
            Self::Heading => "heading",
            Self::Roll => "roll",
        }
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceRole {
    type Err = RoleTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| RoleTableError::UnknownRole(s.to_string()))
    }
}

#[derive(Debug, Error)]
pub enum RoleTableError {
    #[error("role table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid role table: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown device role `{0}` (expected moving_base, heading or roll)")]
    UnknownRole(String),
    #[error("invalid unique id `{0}`")]
    InvalidId(String),
    #[error("unique id `{0}` is listed more than once")]
    DuplicateId(String),
}

/// Unique id → role lookup. An empty table resolves nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleTable {
    roles: BTreeMap<UniqueId, DeviceRole>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self, RoleTableError> {
        let text = std::fs::read_to_string(path).map_err(|source| RoleTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        text.parse()
    }

    pub fn insert(&mut self, id: UniqueId, role: DeviceRole) -> Option<DeviceRole> {
        self.roles.insert(id, role)
    }

    pub fn role_of(&self, id: &UniqueId) -> Option<DeviceRole> {
        self.roles.get(id).copied()
    }

    /// Ids assigned to `role`, in id order.
    pub fn ids_for(&self, role: DeviceRole) -> impl Iterator<Item = &UniqueId> {
        self.roles
            .iter()
            .filter(move |(_, r)| **r == role)
            .map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl FromStr for RoleTable {
    type Err = RoleTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: BTreeMap<String, DeviceRole> = serde_json::from_str(s)?;
        let mut table = Self::new();
        for (key, role) in raw {
            let id = key
                .parse::<UniqueId>()
                .map_err(|_| RoleTableError::InvalidId(key.clone()))?;
            if table.insert(id, role).is_some() {
                return Err(RoleTableError::DuplicateId(id.to_hex()));
            }
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"{
        "0a1b2c3d4e": "heading",
        "1122334455": "moving_base",
        "AABBCCDDEE": "Roll"
    }"#;

    #[test]
    fn parses_snake_case_and_legacy_names() {
        let table: RoleTable = TABLE.parse().unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.role_of(&UniqueId([0x0a, 0x1b, 0x2c, 0x3d, 0x4e])),
            Some(DeviceRole::Heading)
        );
        assert_eq!(
            table.role_of(&UniqueId([0xaa, 0xbb, 0xcc, 0xdd, 0xee])),
            Some(DeviceRole::Roll)
        );
    }

    #[test]
    fn absent_id_has_no_role() {
        let table: RoleTable = TABLE.parse().unwrap();
        assert_eq!(table.role_of(&UniqueId([0; 5])), None);
        assert_eq!(RoleTable::new().role_of(&UniqueId([0; 5])), None);
    }

    #[test]
    fn ids_for_filters_by_role() {
        let table: RoleTable = TABLE.parse().unwrap();
        let ids: Vec<String> = table.ids_for(DeviceRole::MovingBase).map(|id| id.to_hex()).collect();
        assert_eq!(ids, vec!["1122334455"]);
    }

    #[test]
    fn rejects_bad_ids_and_roles() {
        assert!(matches!(
            r#"{"zz": "heading"}"#.parse::<RoleTable>(),
            Err(RoleTableError::InvalidId(_))
        ));
        assert!(matches!(
            r#"{"0a1b2c3d4e": "pitch"}"#.parse::<RoleTable>(),
            Err(RoleTableError::Parse(_))
        ));
    }

    #[test]
    fn rejects_signed_hex_keys() {
        let json = r#"{"+a+b+c+d+e": "heading", "0a0b0c0d0e": "roll"}"#;
        assert!(matches!(
            json.parse::<RoleTable>(),
            Err(RoleTableError::InvalidId(key)) if key == "+a+b+c+d+e"
        ));
    }

    #[test]
    fn rejects_keys_that_differ_only_in_case() {
        let json = r#"{"AABBCCDDEE": "heading", "aabbccddee": "roll"}"#;
        assert!(matches!(
            json.parse::<RoleTable>(),
            Err(RoleTableError::DuplicateId(id)) if id == "aabbccddee"
        ));
    }

    #[test]
    fn role_names_parse_leniently() {
        assert_eq!("moving-base".parse::<DeviceRole>().unwrap(), DeviceRole::MovingBase);
        assert_eq!("Heading".parse::<DeviceRole>().unwrap(), DeviceRole::Heading);
        assert!("pitch".parse::<DeviceRole>().is_err());
    }

    #[test]
    fn load_reads_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roles.json");
        std::fs::write(&path, TABLE).unwrap();
        assert_eq!(RoleTable::load(&path).unwrap().len(), 3);
        assert!(matches!(
            RoleTable::load(&dir.path().join("missing.json")),
            Err(RoleTableError::Io { .. })
        ));
    }
}
