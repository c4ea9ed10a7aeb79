//! Job descriptions: the merged job model, batch-file merging and the validation gate.

/// Batch-file decoding and the two field-level merge policies.
pub mod merge;
/// The [`spec::JobSpec`] model and its built-in defaults.
pub mod spec;
/// All-or-nothing structural checks run before any engine call.
pub mod validate;
