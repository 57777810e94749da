//! Cross-module behavioral tests for the scenarios and universal
//! properties of spec.md section 8, kept separate from the per-module
//! unit tests the way the teacher separates `db/src/tests/` from the
//! `#[cfg(test)] mod tests` blocks inside individual modules.

mod properties;
