use super::{RoleId, RotationKey, SubjectId};
use serde::Serialize;

/// Verified caller, handed to downstream handlers by the auth gate.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Identity {
    pub subject_id: SubjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_id: Option<RoleId>,
    /// Present only when a refresh credential was required.
    #[serde(skip)]
    pub rotation_key: Option<RotationKey>,
}
