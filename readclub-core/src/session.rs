use std::sync::{Arc, Mutex};

/// Request paths that exist to ask "am I logged in?". A 401 from these is an
/// answer for the caller, not a reason to leave the page.
pub const IDENTITY_CHECK_PATHS: &[&str] = &["/auth/me", "/users/me"];

/// Full-page navigation primitive.
pub trait Navigator: Send + Sync {
    fn current_path(&self) -> String;
    fn navigate(&self, to: &str);

    /// Navigate to `to` unless already there (query string ignored).
    /// Returns whether it navigated. Implementations with shared state
    /// should check and move atomically.
    fn navigate_unless_at(&self, to: &str) -> bool {
        if is_at(&self.current_path(), to) {
            return false;
        }
        self.navigate(to);
        true
    }
}

fn is_at(location: &str, target: &str) -> bool {
    location == target
        || location
            .strip_prefix(target)
            .is_some_and(|rest| rest.starts_with('?'))
}

/// In-process navigator: tracks the current location and counts navigations.
#[derive(Debug)]
pub struct MemoryNavigator {
    state: Mutex<NavState>,
}

#[derive(Debug)]
struct NavState {
    location: String,
    navigations: u32,
}

impl MemoryNavigator {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(NavState {
                location: location.into(),
                navigations: 0,
            }),
        }
    }

    pub fn navigations(&self) -> u32 {
        self.lock().navigations
    }

    fn move_to(state: &mut NavState, to: &str) {
        tracing::info!(from = %state.location, to, "navigating");
        state.location = to.to_string();
        state.navigations += 1;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, NavState> {
        // a poisoned lock still holds a usable location
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.lock().location.clone()
    }

    fn navigate(&self, to: &str) {
        Self::move_to(&mut self.lock(), to);
    }

    fn navigate_unless_at(&self, to: &str) -> bool {
        let mut state = self.lock();
        if is_at(&state.location, to) {
            return false;
        }
        Self::move_to(&mut state, to);
        true
    }
}

/// Sends the user to the login screen when a session has expired.
#[derive(Clone)]
pub struct SessionExpiryRouter {
    navigator: Arc<dyn Navigator>,
    login_path: String,
}

impl SessionExpiryRouter {
    pub fn new(navigator: Arc<dyn Navigator>, login_path: impl Into<String>) -> Self {
        Self {
            navigator,
            login_path: login_path.into(),
        }
    }

    pub fn is_identity_check(request_path: &str) -> bool {
        let path = request_path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.len() {
            0 | 1 => path,
            _ => path.trim_end_matches('/'),
        };
        IDENTITY_CHECK_PATHS
            .iter()
            .any(|known| path == *known || path.ends_with(known))
    }

    /// Handle a normalized failure's status; returns whether it navigated.
    pub fn observe(&self, status: u16, request_path: &str) -> bool {
        if status != 401 || Self::is_identity_check(request_path) {
            return false;
        }
        let navigated = self.navigator.navigate_unless_at(&self.login_path);
        if navigated {
            tracing::info!(path = request_path, "session expired");
        }
        navigated
    }
}
