use serde::{Deserialize, Serialize};

/// The backend's answer to a toggle: the item's membership after the call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToggleResponse {
    pub added: bool,
}
