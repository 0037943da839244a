//! Common error infrastructure for battle-core.
//!
//! Runtime evaluation in this crate is total: applying actions and running
//! the maintenance pass never fail. The errors here cover the two places
//! callers can be turned away: building a world with an invalid shape, and
//! validating a cast before its effect is applied. Parse errors live in the
//! content crate and implement the same [`GameError`] trait.

use crate::state::UnitId;

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: Temporary conditions that may succeed later (cooldowns)
/// - **Validation**: Invalid input that should be rejected without retry
/// - **Internal**: Unexpected state inconsistencies that require investigation
/// - **Fatal**: Unrecoverable errors indicating corrupted setup
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    Recoverable,
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}

/// Common trait for all battle errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

// ============================================================================
// World construction
// ============================================================================

/// Errors raised while building a [`crate::WorldState`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// Grid dimensions must both be non-zero.
    #[error("grid must be non-empty, got {width}x{height}")]
    EmptyGrid { width: u32, height: u32 },

    /// A unit was placed outside the grid.
    #[error("unit {id} placed out of bounds at ({x}, {y})")]
    OutOfBounds { id: UnitId, x: i32, y: i32 },

    /// Two placements used the same unit id.
    #[error("duplicate unit id {0}")]
    DuplicateUnit(UnitId),
}

impl GameError for WorldError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyGrid { .. } => "WORLD_EMPTY_GRID",
            Self::OutOfBounds { .. } => "WORLD_OUT_OF_BOUNDS",
            Self::DuplicateUnit(_) => "WORLD_DUPLICATE_UNIT",
        }
    }
}

// ============================================================================
// Cast validation
// ============================================================================

/// Reasons a skill cannot be cast right now.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CastError {
    /// Caster is not in the world.
    #[error("caster {0} not found")]
    CasterNotFound(UnitId),

    /// Caster is stunned, silenced or otherwise unable to act.
    #[error("caster {0} cannot act")]
    CannotAct(UnitId),

    /// Skill is sealed until a later turn.
    #[error("skill sealed until turn {until}, current turn {turn}")]
    Sealed { until: u64, turn: u64 },

    /// Skill is cooling down.
    #[error("skill on cooldown until turn {until}, current turn {turn}")]
    OnCooldown { until: u64, turn: u64 },

    /// Target kind does not match the skill's targeting mode.
    #[error("invalid target: {0}")]
    InvalidTarget(&'static str),

    /// Target unit is not in the world or cannot be targeted.
    #[error("target {0} not found or untargetable")]
    TargetNotFound(UnitId),

    /// Target lies outside `[min_range, range]`.
    #[error("target at distance {distance} outside range {min}..={max}")]
    OutOfRange { distance: i64, min: i64, max: i64 },

    /// Caster cannot pay the MP cost.
    #[error("insufficient mp: need {need}, have {have}")]
    InsufficientMp { need: i64, have: i64 },
}

impl GameError for CastError {
    fn severity(&self) -> ErrorSeverity {
        use CastError::*;
        match self {
            CasterNotFound(_) | InvalidTarget(_) | TargetNotFound(_) => {
                ErrorSeverity::Validation
            }
            CannotAct(_) | Sealed { .. } | OnCooldown { .. } => ErrorSeverity::Recoverable,
            OutOfRange { .. } | InsufficientMp { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        use CastError::*;
        match self {
            CasterNotFound(_) => "CAST_CASTER_NOT_FOUND",
            CannotAct(_) => "CAST_CANNOT_ACT",
            Sealed { .. } => "CAST_SEALED",
            OnCooldown { .. } => "CAST_ON_COOLDOWN",
            InvalidTarget(_) => "CAST_INVALID_TARGET",
            TargetNotFound(_) => "CAST_TARGET_NOT_FOUND",
            OutOfRange { .. } => "CAST_OUT_OF_RANGE",
            InsufficientMp { .. } => "CAST_INSUFFICIENT_MP",
        }
    }
}
