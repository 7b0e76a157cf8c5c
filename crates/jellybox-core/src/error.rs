//! Error types for the jellybox-core crate.
//!
//! Catch and release failures are expected outcomes surfaced to users and
//! carry the data a presentation layer needs to word them. Repository and
//! choice failures are infrastructure problems. [`BoxError`] wraps them all
//! for the service layer.

use jellybox_types::Group;
use serde::Serialize;

use crate::random::ChoiceError;

/// Errors from checked inventory arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InventoryError {
    /// Adding individuals would overflow the species count.
    #[error("count overflow adding {attempted} to {species_id}")]
    Overflow {
        /// Species being added to.
        species_id: String,
        /// Quantity the caller attempted to add.
        attempted: u32,
    },

    /// Removing more individuals than the box holds.
    #[error("cannot remove {requested} of {species_id}: only {held} held")]
    Insufficient {
        /// Species being removed from.
        species_id: String,
        /// Quantity the caller attempted to remove.
        requested: u32,
        /// Quantity actually held.
        held: u32,
    },
}

/// Reasons a catch attempt is refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatchError {
    /// The previous catch was too recent.
    #[error("catch cooldown active: {remaining_seconds}s remaining")]
    CooldownActive {
        /// Seconds until the next catch is allowed.
        remaining_seconds: i64,
    },

    /// The box holds as many individuals as it can.
    #[error("box is full: {population} of {capacity}")]
    BoxFull {
        /// Current population.
        population: u32,
        /// Configured capacity.
        capacity: u32,
    },

    /// No group with a positive weight has any species.
    #[error("no species available to catch")]
    EmptyCatalogue,

    /// The draw itself was given malformed input.
    #[error(transparent)]
    Choice(#[from] ChoiceError),
}

/// One problem with a release request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReleaseError {
    /// The name matches no species and no group.
    #[error("unknown jellyfish: {name}")]
    UnknownSpecies {
        /// Name as typed by the user.
        name: String,
    },

    /// The species exists but the box holds none.
    #[error("no {name} in the box")]
    NotInBox {
        /// Species display name.
        name: String,
    },

    /// More individuals requested than the box holds.
    #[error("asked to release {requested} {name} but only {held} held")]
    InsufficientQuantity {
        /// Species display name.
        name: String,
        /// Total requested across the command.
        requested: u32,
        /// Quantity held before the command.
        held: u32,
    },

    /// Groups can only be released in full.
    #[error("group {group} can only be released with \"all\"")]
    InvalidGroupQuantity {
        /// Group named in the request.
        group: Group,
    },

    /// The box holds no species of the group.
    #[error("no {group} jellyfish in the box")]
    GroupNotInBox {
        /// Group named in the request.
        group: Group,
    },

    /// The quantity token is neither a positive integer nor "all".
    #[error("invalid quantity {raw:?} for {name}")]
    InvalidQuantity {
        /// Name the quantity applies to.
        name: String,
        /// Token as typed.
        raw: String,
    },

    /// The command named nothing to release.
    #[error("nothing to release")]
    NothingRequested,
}

/// A rejected release command with every problem found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("release rejected with {} problem(s)", errors.len())]
pub struct ReleaseRejected {
    /// All problems, in request order.
    pub errors: Vec<ReleaseError>,
}

/// Errors from the box repository.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// The backing store could not be reached or refused the operation.
    #[error("repository unavailable: {message}")]
    Unavailable {
        /// Description from the backing store.
        message: String,
    },

    /// Stored data could not be decoded.
    #[error("repository data corrupt: {message}")]
    Corrupt {
        /// What failed to decode.
        message: String,
    },
}

/// Any failure of a box service operation.
#[derive(Debug, thiserror::Error)]
pub enum BoxError {
    /// Catch refused.
    #[error(transparent)]
    Catch(#[from] CatchError),

    /// Release refused.
    #[error(transparent)]
    Release(#[from] ReleaseRejected),

    /// The requested style is not offered.
    #[error("unknown style: {style}")]
    UnknownStyle {
        /// Style as requested.
        style: String,
    },

    /// Persistence failed; no state change is visible.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Settlement drew from malformed weights.
    #[error(transparent)]
    Choice(#[from] ChoiceError),

    /// Inventory arithmetic failed.
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}
