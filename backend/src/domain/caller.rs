//! Identity of the user performing an operation.

use serde::Serialize;

use super::{DisplayName, User, UserId};

/// Caller context handed to every driving port.
///
/// Authentication is outside this service; the inbound adapter resolves a
/// fixed identity at start-up and attaches it to each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    pub user_id: UserId,
    pub display_name: DisplayName,
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            display_name: user.name.clone(),
        }
    }
}
