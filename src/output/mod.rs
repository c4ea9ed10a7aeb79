//! Output artifacts: collision-free image names and the completion record written beside each
//! image.

/// Sequential `{prefix}_{seed}[_{n}].png` naming.
pub mod naming;
/// Per-generation JSON completion records.
pub mod record;
