//! Static metadata attached to every handler implementation.

use core::fmt;

use protocol::{ClientVersion, VersionRange};

/// Stable identity of a handler implementation, unique across the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub &'static str);

impl HandlerId {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Declarative description of a handler: which packet it serves, for which
/// client versions, and whether it must arrive encrypted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HandlerDescriptor {
    pub id: HandlerId,
    /// Opcode for top-level handlers, sub-opcode for members of a group.
    pub key: u8,
    /// Opcode of the group this handler belongs to, if any.
    pub group: Option<u8>,
    pub versions: VersionRange,
    pub encryption_expected: bool,
}

impl HandlerDescriptor {
    /// Top-level handler for `opcode`, supporting every client version.
    #[must_use]
    pub const fn new(id: &'static str, opcode: u8) -> Self {
        Self {
            id: HandlerId(id),
            key: opcode,
            group: None,
            versions: VersionRange::ANY,
            encryption_expected: false,
        }
    }

    /// Member of the group hosted under `group`, keyed by `sub_opcode`.
    #[must_use]
    pub const fn in_group(id: &'static str, group: u8, sub_opcode: u8) -> Self {
        Self {
            id: HandlerId(id),
            key: sub_opcode,
            group: Some(group),
            versions: VersionRange::ANY,
            encryption_expected: false,
        }
    }

    #[must_use]
    pub const fn minimum_client(mut self, version: ClientVersion) -> Self {
        self.versions.min = Some(version);
        self
    }

    #[must_use]
    pub const fn maximum_client(mut self, version: ClientVersion) -> Self {
        self.versions.max = Some(version);
        self
    }

    #[must_use]
    pub const fn encrypted(mut self) -> Self {
        self.encryption_expected = true;
        self
    }

    /// `true` if the handler understands packets of `version` clients.
    #[must_use]
    pub fn supports(&self, version: &ClientVersion) -> bool {
        self.versions.contains(version)
    }

    #[must_use]
    pub fn belongs_to(&self, group: Option<u8>) -> bool {
        self.group == group
    }
}

impl fmt::Display for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.group {
            Some(group) => write!(f, "{} [{:02X}/{:02X}", self.id, group, self.key)?,
            None => write!(f, "{} [{:02X}", self.id, self.key)?,
        }
        write!(f, ", {}]", self.versions)
    }
}
