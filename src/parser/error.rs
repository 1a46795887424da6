use thiserror::Error;

/// Errors raised while decoding a workout log page. All of these are fatal to
/// the enclosing parse call; recovery happens only at the batch layer, which
/// substitutes the bare URL for the failed page.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A set-component title tag outside {WEIGHT/REPS, REPS, TIME, WEIGHT}.
    #[error("unrecognized set type tag: {0:?}")]
    UnrecognizedSetType(String),

    /// A weight value without an lbs/kg suffix.
    #[error("unrecognized weight unit in {0:?}")]
    UnrecognizedUnit(String),

    /// None of the four energy tier markers present on the page.
    #[error("no energy level marker on page")]
    EnergyLevelNotFound,

    /// A "weight x reps" string split into more than two tokens.
    #[error("malformed weight/reps value: {0:?}")]
    MalformedWeightReps(String),

    #[error("malformed rest time: {0:?}")]
    MalformedRestTime(String),

    #[error("malformed duration: {0:?}")]
    MalformedDuration(String),

    #[error("malformed target value: {0:?}")]
    MalformedTarget(String),

    /// An expected HTML node is absent.
    #[error("missing element: {0}")]
    MissingElement(&'static str),
}
