/// Fires once for every signed-out → signed-in transition.
///
/// Observations made before the auth check has finished are ignored, so a
/// still-loading session never looks like a fresh sign-in or sign-out.
#[derive(Debug, Default)]
pub struct AuthWatcher {
    was_authenticated: bool,
}

impl AuthWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when this observation is a new sign-in.
    pub fn observe(&mut self, is_authenticated: bool, auth_checked: bool) -> bool {
        if !auth_checked {
            return false;
        }
        let signed_in = is_authenticated && !self.was_authenticated;
        self.was_authenticated = is_authenticated;
        signed_in
    }
}
