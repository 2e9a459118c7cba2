//! Structural patch synthesis (RFC 6902).
//!
//! Computes the JSON Patch operation list that transforms the original
//! admission object into its mutated counterpart. The caller is expected
//! to omit the patch from the response entirely when the operation list
//! is empty.

use json_patch::Patch;
use serde_json::Value;

use crate::error::Result;

/// Diff two serialized JSON documents into a JSON Patch.
///
/// Deterministic for a given `(original, mutated)` pair; `diff(a, a)` is
/// the empty patch. Malformed input on either side fails with
/// [`crate::error::Error::Encoding`].
pub fn diff(original: &[u8], mutated: &[u8]) -> Result<Patch> {
    let original: Value = serde_json::from_slice(original)?;
    let mutated: Value = serde_json::from_slice(mutated)?;
    Ok(json_patch::diff(&original, &mutated))
}
