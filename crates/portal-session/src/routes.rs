//! Role-gated route authorization.

use crate::{
    navigation::{LOGIN_ROUTE, UNAUTHORIZED_ROUTE},
    session::{Role, SessionContext},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RouteAccess {
    Public,
    Authenticated,
    Role(Role),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

/// Decides whether the current session may open a route. The session is read
/// on every call.
pub fn authorize(session: &SessionContext, access: RouteAccess) -> RouteDecision {
    match access {
        RouteAccess::Public => RouteDecision::Allow,
        RouteAccess::Authenticated => {
            if session.is_authenticated() {
                RouteDecision::Allow
            } else {
                RouteDecision::Redirect(LOGIN_ROUTE)
            }
        }
        RouteAccess::Role(_) if !session.is_authenticated() => {
            RouteDecision::Redirect(LOGIN_ROUTE)
        }
        RouteAccess::Role(required) => {
            if session.role() == Some(required) {
                RouteDecision::Allow
            } else {
                RouteDecision::Redirect(UNAUTHORIZED_ROUTE)
            }
        }
    }
}

pub fn dashboard_route(role: Role) -> &'static str {
    match role {
        Role::Admin => "/admin/dashboard",
        Role::Lecturer => "/lecturer/dashboard",
        Role::Student => "/student/dashboard",
    }
}
