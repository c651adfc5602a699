//! Named frames and sender routing.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// One of the two frames sharing the inbox.
///
/// The satellite frame shows images from everyone except its owner. The earth
/// frame shows only what the satellite frame's owner sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Frame fed by everyone except the satellite owner.
    SatelliteFrame,
    /// Frame fed only by the satellite owner.
    EarthFrame,
}

impl Target {
    /// Both frames, in a fixed order.
    pub const ALL: [Self; 2] = [Self::SatelliteFrame, Self::EarthFrame];

    /// Convert to string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SatelliteFrame => "satellite_frame",
            Self::EarthFrame => "earth_frame",
        }
    }

    /// File name of the persisted queue for this frame.
    #[must_use]
    pub fn queue_file_name(&self) -> String {
        format!("{}_queue.json", self.as_str())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "satellite_frame" | "satellite" => Ok(Self::SatelliteFrame),
            "earth_frame" | "earth" => Ok(Self::EarthFrame),
            other => Err(Error::Config(format!("unknown frame: {other}"))),
        }
    }
}

/// Routes senders to frames using the satellite owner's addresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderFilter {
    satellite_addresses: Vec<String>,
}

impl SenderFilter {
    /// Creates a filter from the addresses used by the satellite frame's owner.
    ///
    /// Addresses are normalized to lowercase; blanks are dropped.
    #[must_use]
    pub fn new<I, S>(satellite_addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            satellite_addresses: satellite_addresses
                .into_iter()
                .map(|a| a.as_ref().trim().to_lowercase())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }

    /// The satellite owner's addresses.
    #[must_use]
    pub fn satellite_addresses(&self) -> &[String] {
        &self.satellite_addresses
    }

    /// Returns true if a message from `sender` belongs on `target`.
    ///
    /// `sender` may be a bare address or a `From` header such as `Ana <ana@example.com>`.
    #[must_use]
    pub fn classify(&self, sender: &str, target: Target) -> bool {
        let address = extract_address(sender);
        let from_satellite = self.satellite_addresses.iter().any(|a| *a == address);
        match target {
            Target::SatelliteFrame => !from_satellite,
            Target::EarthFrame => from_satellite,
        }
    }

    /// Builds the provider search query selecting candidate messages for `target`.
    ///
    /// Returns `None` when no message can match, i.e. the earth frame without
    /// any satellite address.
    #[must_use]
    pub fn search_query(&self, target: Target) -> Option<String> {
        if self.satellite_addresses.is_empty() {
            return match target {
                Target::SatelliteFrame => Some(String::new()),
                Target::EarthFrame => None,
            };
        }

        let addresses = self.satellite_addresses.join(" OR ");
        Some(match target {
            Target::SatelliteFrame => format!("-from:({addresses})"),
            Target::EarthFrame => format!("from:({addresses})"),
        })
    }
}

/// Extracts the lowercase address from a `From` header value.
fn extract_address(sender: &str) -> String {
    let sender = sender.trim();
    let address = match (sender.rfind('<'), sender.rfind('>')) {
        (Some(start), Some(end)) if start < end => &sender[start + 1..end],
        _ => sender,
    };
    address.trim().to_lowercase()
}
