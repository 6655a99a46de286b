//! ACL permission flags
//!
//! Permission names map onto the service's permission bits through a static
//! table. Combining flags is a plain bitwise OR, so flag order never matters.

use crate::error::{Result, ZkCtlError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// Named permission accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    All,
    Write,
    Read,
    Create,
    Delete,
    Admin,
}

/// Permission bitmask as understood by the coordination service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Permissions(u32);

impl Permissions {
    pub const NONE: Permissions = Permissions(0);
    pub const READ: Permissions = Permissions(1);
    pub const WRITE: Permissions = Permissions(1 << 1);
    pub const CREATE: Permissions = Permissions(1 << 2);
    pub const DELETE: Permissions = Permissions(1 << 3);
    pub const ADMIN: Permissions = Permissions(1 << 4);
    pub const ALL: Permissions = Permissions(0b1_1111);

    /// Build from raw bits, dropping anything outside [`Permissions::ALL`]
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Permissions(bits & Self::ALL.0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Permissions) -> bool {
        self.0 & other.0 == other.0
    }

    /// OR together every flag; no flags at all means [`Permissions::ALL`].
    pub fn from_flags<I>(flags: I) -> Self
    where
        I: IntoIterator<Item = Permission>,
    {
        let combined = flags
            .into_iter()
            .fold(Permissions::NONE, |acc, flag| acc | flag.bits());

        if combined.is_empty() {
            Permissions::ALL
        } else {
            combined
        }
    }
}

impl BitOr for Permissions {
    type Output = Permissions;

    fn bitor(self, rhs: Self) -> Self::Output {
        Permissions(self.0 | rhs.0)
    }
}

impl BitOrAssign for Permissions {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Name to bitmask lookup table
pub const PERMISSION_TABLE: [(&str, Permission, Permissions); 6] = [
    ("all", Permission::All, Permissions::ALL),
    ("write", Permission::Write, Permissions::WRITE),
    ("read", Permission::Read, Permissions::READ),
    ("create", Permission::Create, Permissions::CREATE),
    ("delete", Permission::Delete, Permissions::DELETE),
    ("admin", Permission::Admin, Permissions::ADMIN),
];

impl Permission {
    /// Bitmask for this permission
    pub fn bits(self) -> Permissions {
        PERMISSION_TABLE
            .iter()
            .find(|(_, flag, _)| *flag == self)
            .map(|(_, _, bits)| *bits)
            .unwrap_or(Permissions::NONE)
    }

    pub fn name(self) -> &'static str {
        PERMISSION_TABLE
            .iter()
            .find(|(_, flag, _)| *flag == self)
            .map(|(name, _, _)| *name)
            .unwrap_or_default()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Permission {
    type Err = ZkCtlError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        PERMISSION_TABLE
            .iter()
            .find(|(name, _, _)| *name == wanted)
            .map(|(_, flag, _)| *flag)
            .ok_or_else(|| {
                ZkCtlError::InvalidInput(format!(
                    "unknown permission '{}'. Must be one of all|create|write|read|delete|admin",
                    s
                ))
            })
    }
}

/// A single ACL entry attached to a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acl {
    pub permissions: Permissions,
    pub scheme: String,
    pub id: String,
}

impl Acl {
    /// `world:anyone` entry with the given permissions
    pub fn world(permissions: Permissions) -> Self {
        Self {
            permissions,
            scheme: "world".to_string(),
            id: "anyone".to_string(),
        }
    }
}
