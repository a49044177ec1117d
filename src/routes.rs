//! Navigation intents and the protected-route guard

use std::fmt;

use crate::services::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Books,
    BookDetail(i64),
    AddBook,
    Login,
    Register,
}

impl Route {
    /// Resolve a path; anything unrecognized lands on the book list
    pub fn parse(path: &str) -> Self {
        let segments: Vec<&str> = path
            .trim()
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();

        match segments.as_slice() {
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["add-book"] => Route::AddBook,
            ["book", id] => id.parse().map(Route::BookDetail).unwrap_or(Route::Books),
            _ => Route::Books,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Books => "/".to_string(),
            Route::BookDetail(id) => format!("/book/{}", id),
            Route::AddBook => "/add-book".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::AddBook)
    }

    pub fn requires_admin(&self) -> bool {
        matches!(self, Route::AddBook)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of opening a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allow,
    /// Session still being determined; render a loading state
    Wait,
    /// Go to `to`; `from` is where to come back after logging in
    Redirect { to: Route, from: Option<Route> },
}

pub fn guard(route: &Route, session: &Session) -> Access {
    if !route.requires_auth() {
        return Access::Allow;
    }
    if session.is_pending() {
        return Access::Wait;
    }
    if !session.is_authenticated() {
        return Access::Redirect {
            to: Route::Login,
            from: Some(*route),
        };
    }
    if route.requires_admin() && !session.is_admin() {
        return Access::Redirect {
            to: Route::Books,
            from: None,
        };
    }
    Access::Allow
}
