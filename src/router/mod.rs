//! Routing and Access Control
//!
//! Maps paths to pages and decides, for the current authentication state,
//! whether a page may render. The decision itself is a pure function; the
//! [`Navigator`] re-confirms the role with the backend on every navigation and
//! feeds the result into it.

use std::fmt;

use crate::client::{BoxClient, ClientError, ClientResult, FailureKind};
use crate::models::{CurrentUser, Role};

/// Pages of the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Book,
    MyBookings,
    AdminDashboard,
    AdminUnits,
    NotFound,
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        match trimmed {
            "" => Route::Home,
            "/login" => Route::Login,
            "/book" => Route::Book,
            "/my-bookings" => Route::MyBookings,
            "/admin" => Route::AdminDashboard,
            "/admin/units" => Route::AdminUnits,
            _ => Route::NotFound,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Book => "/book",
            Route::MyBookings => "/my-bookings",
            Route::AdminDashboard => "/admin",
            Route::AdminUnits => "/admin/units",
            Route::NotFound => "/404",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(
            self,
            Route::Book | Route::MyBookings | Route::AdminDashboard | Route::AdminUnits
        )
    }

    pub fn requires_admin(&self) -> bool {
        matches!(self, Route::AdminDashboard | Route::AdminUnits)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// What the portal knows about the person at the keyboard
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    #[default]
    Anonymous,
    /// A credential is stored but the role has not been confirmed
    Unknown,
    Customer(CurrentUser),
    Admin(CurrentUser),
}

impl AuthState {
    pub fn from_user(user: CurrentUser) -> Self {
        match user.role() {
            Role::Admin => AuthState::Admin(user),
            Role::Customer => AuthState::Customer(user),
        }
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        match self {
            AuthState::Customer(user) | AuthState::Admin(user) => Some(user),
            AuthState::Anonymous | AuthState::Unknown => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, AuthState::Admin(_))
    }
}

/// Outcome of a navigation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
    /// Admin page requested while the role is still unconfirmed
    Pending(Route),
}

impl Navigation {
    /// The page that ends up on screen, if any
    pub fn target(&self) -> Option<Route> {
        match self {
            Navigation::Render(route) | Navigation::Redirect(route) => Some(*route),
            Navigation::Pending(_) => None,
        }
    }
}

/// Access decision for `route` in `state`
pub fn decide(route: Route, state: &AuthState) -> Navigation {
    if route == Route::Login {
        return if state.is_authenticated() {
            Navigation::Redirect(Route::Home)
        } else {
            Navigation::Render(route)
        };
    }

    if route.requires_auth() && *state == AuthState::Anonymous {
        return Navigation::Redirect(Route::Login);
    }

    if route.requires_admin() {
        return match state {
            AuthState::Admin(_) => Navigation::Render(route),
            AuthState::Customer(_) => Navigation::Redirect(Route::Home),
            AuthState::Unknown => Navigation::Pending(route),
            AuthState::Anonymous => Navigation::Redirect(Route::Login),
        };
    }

    Navigation::Render(route)
}

/// Tracks the authentication state across navigations
pub struct Navigator {
    client: BoxClient,
    state: AuthState,
}

impl Navigator {
    pub fn new(client: BoxClient) -> Self {
        let state = if client.session().is_logged_in() {
            AuthState::Unknown
        } else {
            AuthState::Anonymous
        };
        Self { client, state }
    }

    pub fn client(&self) -> &BoxClient {
        &self.client
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    /// Re-read the session, re-confirm the role and decide on `path`
    pub async fn navigate(&mut self, path: &str) -> Navigation {
        let route = Route::from_path(path);
        self.refresh_state().await;

        let navigation = decide(route, &self.state);
        tracing::debug!(path = %path, ?navigation, "Navigation decided");
        navigation
    }

    /// Log in and confirm the role
    pub async fn login(&mut self, email: &str, password: &str) -> ClientResult<&AuthState> {
        self.client.login(email, password).await?;
        self.state = AuthState::Unknown;

        match self.client.fetch_current_user().await {
            Ok(user) => self.state = AuthState::from_user(user),
            Err(e) => {
                self.handle_failure(&e);
                return Err(e);
            }
        }
        Ok(&self.state)
    }

    pub fn logout(&mut self) -> ClientResult<()> {
        self.state = AuthState::Anonymous;
        self.client.logout()
    }

    /// React to a failed call made on behalf of the current page.
    ///
    /// An unauthorized response ends the session and sends the user to the
    /// login page; a missing privilege sends them home.
    pub fn handle_failure(&mut self, error: &ClientError) -> Option<Navigation> {
        match error.kind() {
            FailureKind::Unauthorized => {
                if let Err(e) = self.logout() {
                    tracing::warn!(error = %e, "Failed to clear session after rejection");
                }
                Some(Navigation::Redirect(Route::Login))
            }
            FailureKind::Forbidden => Some(Navigation::Redirect(Route::Home)),
            FailureKind::NotFound | FailureKind::Other => None,
        }
    }

    async fn refresh_state(&mut self) {
        if !self.client.session().is_logged_in() {
            self.state = AuthState::Anonymous;
            return;
        }

        self.state = match self.client.fetch_current_user().await {
            Ok(user) => AuthState::from_user(user),
            Err(e) if e.is_auth_failure() => {
                if let Err(e) = self.client.logout() {
                    tracing::warn!(error = %e, "Failed to clear rejected session");
                }
                AuthState::Anonymous
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not confirm role");
                AuthState::Unknown
            }
        };
    }
}
