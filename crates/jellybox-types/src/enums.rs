//! Enumeration types for the jellyfish box simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Rarity groups
// ---------------------------------------------------------------------------

/// Rarity tier of a jellyfish species.
///
/// Variants are declared from rarest to most common (with `Special` last),
/// so the derived ordering is the display priority used by statistics and
/// the catalogue, and [`Group::ALL`] is the draw order used by catches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Group {
    /// The rarest tier.
    Perfect,
    /// Rare tier.
    Great,
    /// Uncommon tier.
    Good,
    /// Common tier.
    Normal,
    /// Event-only tier, weighted zero outside the anniversary.
    Special,
}

impl Group {
    /// Every group in draw order.
    pub const ALL: [Self; 5] = [
        Self::Perfect,
        Self::Great,
        Self::Good,
        Self::Normal,
        Self::Special,
    ];

    /// The lowercase tag used in storage, catalogues and chat commands.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Perfect => "perfect",
            Self::Great => "great",
            Self::Good => "good",
            Self::Normal => "normal",
            Self::Special => "special",
        }
    }

    /// Parse a group tag, ignoring ASCII case.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|group| group.as_str().eq_ignore_ascii_case(tag))
    }
}

impl core::fmt::Display for Group {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// World events
// ---------------------------------------------------------------------------

/// Effect taxonomy of a world event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum EventKind {
    /// Removes an individual from the box.
    Reduce,
    /// Adds an individual to the box.
    Add,
    /// Turns one individual into another species.
    Change,
    /// Narrative only.
    Normal,
    /// Any tag this build does not know; behaves like [`EventKind::Normal`].
    #[serde(other)]
    Unknown,
}

impl EventKind {
    /// The lowercase tag used in storage and catalogues.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reduce => "reduce",
            Self::Add => "add",
            Self::Change => "change",
            Self::Normal => "normal",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a stored tag. Unrecognised tags map to [`EventKind::Unknown`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "reduce" => Self::Reduce,
            "add" => Self::Add,
            "change" => Self::Change,
            "normal" => Self::Normal,
            _ => Self::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence field selection
// ---------------------------------------------------------------------------

/// A mutable column of a box record, used to persist only what changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxField {
    /// The species-id to count map.
    Inventory,
    /// The decoration id set.
    Decorations,
    /// Timestamp of the last successful catch.
    LastCatchTime,
    /// Timestamp of the last settlement.
    LastRefreshTime,
    /// Salinity and temperature.
    Environment,
    /// Presentation style tag.
    Style,
}
