//! Telephony regions and their signaling edges.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Region a credential is issued for.
///
/// Decided once at issuance and echoed back to the client unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// North America (Virginia). The platform default.
    #[default]
    Us1,
    /// North America (Oregon)
    Us2,
    /// Europe (Ireland)
    Ie1,
    /// Europe (Frankfurt)
    De1,
    /// Asia Pacific (Sydney)
    Au1,
    /// Asia Pacific (Tokyo)
    Jp1,
    /// Asia Pacific (Singapore)
    Sg1,
    /// South America (São Paulo)
    Br1,
}

/// Network edge a device may prefer for its signaling connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Edge {
    Ashburn,
    Umatilla,
    Dublin,
    Frankfurt,
    Sydney,
    Tokyo,
    Singapore,
    SaoPaulo,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown region code: {0}")]
pub struct UnknownRegion(pub String);

impl Region {
    pub const ALL: [Region; 8] = [
        Region::Us1,
        Region::Us2,
        Region::Ie1,
        Region::De1,
        Region::Au1,
        Region::Jp1,
        Region::Sg1,
        Region::Br1,
    ];

    /// Region code as used on the wire (e.g. `ie1`).
    pub fn code(&self) -> &'static str {
        match self {
            Region::Us1 => "us1",
            Region::Us2 => "us2",
            Region::Ie1 => "ie1",
            Region::De1 => "de1",
            Region::Au1 => "au1",
            Region::Jp1 => "jp1",
            Region::Sg1 => "sg1",
            Region::Br1 => "br1",
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Region::Us1
    }

    /// Edge closest to this region.
    pub fn primary_edge(&self) -> Edge {
        match self {
            Region::Us1 => Edge::Ashburn,
            Region::Us2 => Edge::Umatilla,
            Region::Ie1 => Edge::Dublin,
            Region::De1 => Edge::Frankfurt,
            Region::Au1 => Edge::Sydney,
            Region::Jp1 => Edge::Tokyo,
            Region::Sg1 => Edge::Singapore,
            Region::Br1 => Edge::SaoPaulo,
        }
    }

    /// Ordered edge preference for a device registering in this region.
    ///
    /// `None` for the default region: the provider picks the edge itself.
    pub fn edge_preference(&self) -> Option<[Edge; 2]> {
        if self.is_default() {
            None
        } else {
            Some([self.primary_edge(), Edge::FALLBACK])
        }
    }
}

impl Edge {
    pub const FALLBACK: Edge = Edge::Ashburn;

    pub fn name(&self) -> &'static str {
        match self {
            Edge::Ashburn => "ashburn",
            Edge::Umatilla => "umatilla",
            Edge::Dublin => "dublin",
            Edge::Frankfurt => "frankfurt",
            Edge::Sydney => "sydney",
            Edge::Tokyo => "tokyo",
            Edge::Singapore => "singapore",
            Edge::SaoPaulo => "sao-paulo",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_lowercase();
        Region::ALL
            .into_iter()
            .find(|r| r.code() == code)
            .ok_or_else(|| UnknownRegion(s.to_string()))
    }
}
