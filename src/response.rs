//! Admission response constructors.
//!
//! Four response shapes cover every terminal state of the mutation
//! orchestrator. Each constructor sets the response uid from its
//! argument unconditionally; the API server discards responses whose uid
//! does not echo the request.

use json_patch::Patch;

use crate::admission::{AdmissionResponse, PatchType, Status};
use crate::error::Result;

/// Reject the request with a status code and message
pub fn denied(uid: &str, code: i32, message: impl Into<String>) -> AdmissionResponse {
    AdmissionResponse {
        uid: uid.to_string(),
        allowed: false,
        status: Some(Status {
            code: Some(code),
            message: Some(message.into()),
        }),
        patch: None,
        patch_type: None,
        warnings: Vec::new(),
    }
}

/// Allow the request without mutation, with an informational message
pub fn allowed_unchanged(uid: &str, message: impl Into<String>) -> AdmissionResponse {
    AdmissionResponse {
        uid: uid.to_string(),
        allowed: true,
        status: Some(Status {
            code: None,
            message: Some(message.into()),
        }),
        patch: None,
        patch_type: None,
        warnings: Vec::new(),
    }
}

/// Allow the request with a JSON Patch.
///
/// An empty operation list degenerates to a plain allow: the patch and
/// patchType fields are left unset rather than sent empty-but-present.
pub fn allowed_with_patch(uid: &str, patch: &Patch) -> Result<AdmissionResponse> {
    if patch.0.is_empty() {
        return Ok(AdmissionResponse {
            uid: uid.to_string(),
            allowed: true,
            status: None,
            patch: None,
            patch_type: None,
            warnings: Vec::new(),
        });
    }

    Ok(AdmissionResponse {
        uid: uid.to_string(),
        allowed: true,
        status: None,
        patch: Some(serde_json::to_vec(patch)?),
        patch_type: Some(PatchType::JsonPatch),
        warnings: Vec::new(),
    })
}

/// Allow the request unmutated but surface a non-fatal failure to the
/// caller via warnings (fail-open discipline)
pub fn allowed_with_warnings(uid: &str, warnings: Vec<String>) -> AdmissionResponse {
    AdmissionResponse {
        uid: uid.to_string(),
        allowed: true,
        status: None,
        patch: None,
        patch_type: None,
        warnings,
    }
}
