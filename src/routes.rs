//! Route collections keyed by address family.

use std::fmt;

/// Ordered list of prefix strings from one source for one family.
///
/// Entries are opaque: no parsing, no deduplication.
pub type RouteSet = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    pub const ALL: [AddressFamily; 2] = [AddressFamily::V4, AddressFamily::V6];

    /// Family number as used in file names (`.v4.`, `.v6.`).
    pub fn number(self) -> u8 {
        match self {
            AddressFamily::V4 => 4,
            AddressFamily::V6 => 6,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

/// Routes collected for one source, split by family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRoutes {
    pub ipv4: RouteSet,
    pub ipv6: RouteSet,
}

impl SourceRoutes {
    pub fn get(&self, family: AddressFamily) -> &RouteSet {
        match family {
            AddressFamily::V4 => &self.ipv4,
            AddressFamily::V6 => &self.ipv6,
        }
    }

    pub fn get_mut(&mut self, family: AddressFamily) -> &mut RouteSet {
        match family {
            AddressFamily::V4 => &mut self.ipv4,
            AddressFamily::V6 => &mut self.ipv6,
        }
    }

    /// Append another collection family by family, keeping order.
    pub fn append(&mut self, other: SourceRoutes) {
        self.ipv4.extend(other.ipv4);
        self.ipv6.extend(other.ipv6);
    }

    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty()
    }
}
