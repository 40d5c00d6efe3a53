use thiserror::Error;

/// Failures that abort a merge.
///
/// Conflicting edits are deliberately *not* represented here: they are
/// resolved by the attribute conflict table, by emitting both sides, or by
/// honoring a deletion. An error from this enum means the merge as a whole
/// has no meaningful result.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// One of the three input files could not be parsed.
    #[error("failed to parse the {role} file: {message}")]
    Parse { role: &'static str, message: String },

    /// The base provider has no skeleton for this component at the revision
    /// recorded in the edited file.
    #[error("no base metadata for component {uuid} at revision {revision}")]
    MissingBaseMetadata { uuid: String, revision: u64 },

    /// The freshly generated file lacks the `plasmic-managed-start` /
    /// `plasmic-managed-end` markers, so the verbatim region cannot be
    /// carried over.
    #[error("managed region markers are missing from the new file")]
    MissingManagedRegion,

    /// An upstream guarantee does not hold (for instance a markup node that
    /// carries both managed attribute shapes). This indicates a bug in the
    /// generator and must not be papered over.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The base metadata provider itself failed.
    #[error("base metadata provider error: {0}")]
    Provider(String),
}
