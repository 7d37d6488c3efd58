//! Logout side effects, shared by the manual logout screen and the
//! inactivity guard.

use crate::{
    error::RemoteError,
    navigation::{LOGIN_ROUTE, Navigator},
    notice::{Notice, Notifier},
    session::{SessionContext, SessionStore},
};
use async_trait::async_trait;
use std::{
    fmt::{self, Display},
    sync::Arc,
};

pub const INACTIVITY_NOTICE: &str = "Logged out due to inactivity";
pub const MANUAL_NOTICE: &str = "Logged out successfully";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogoutTrigger {
    Manual,
    Auto,
}

impl Display for LogoutTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogoutTrigger::Manual => f.write_str("manual"),
            LogoutTrigger::Auto => f.write_str("auto"),
        }
    }
}

#[async_trait]
pub trait CsrfTokenProvider: Send + Sync {
    /// `None` when no token could be obtained; never an error.
    async fn fetch_token(&self) -> Option<String>;
}

#[async_trait]
pub trait SessionEndpoint: Send + Sync {
    async fn end_session(&self, csrf_token: Option<&str>) -> Result<(), RemoteError>;
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RemoteOutcome {
    Acknowledged,
    Failed(RemoteError),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogoutReport {
    pub trigger: LogoutTrigger,
    pub remote: RemoteOutcome,
    pub cleared_entries: usize,
}

pub struct LogoutInvoker {
    session: SessionContext,
    ui_cache: Option<Arc<dyn SessionStore>>,
    tokens: Arc<dyn CsrfTokenProvider>,
    endpoint: Arc<dyn SessionEndpoint>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
    inactivity_notice: String,
    manual_notice: String,
}

impl LogoutInvoker {
    pub fn new(
        session: SessionContext,
        tokens: Arc<dyn CsrfTokenProvider>,
        endpoint: Arc<dyn SessionEndpoint>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            session,
            ui_cache: None,
            tokens,
            endpoint,
            notifier,
            navigator,
            login_route: LOGIN_ROUTE.to_string(),
            inactivity_notice: INACTIVITY_NOTICE.to_string(),
            manual_notice: MANUAL_NOTICE.to_string(),
        }
    }

    /// Short-lived UI state cleared together with the session store.
    pub fn with_ui_cache(mut self, cache: Arc<dyn SessionStore>) -> Self {
        self.ui_cache = Some(cache);
        self
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn with_notices(
        mut self,
        inactivity: impl Into<String>,
        manual: impl Into<String>,
    ) -> Self {
        self.inactivity_notice = inactivity.into();
        self.manual_notice = manual.into();
        self
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Ends the session: remote notification, local cleanup, notice, then a
    /// history-replacing redirect to the login route.
    ///
    /// A failed remote call only changes the returned report. Calling this on
    /// an already-cleared session is fine and still redirects.
    pub async fn invoke(&self, trigger: LogoutTrigger) -> LogoutReport {
        let token = self.tokens.fetch_token().await;
        if token.is_none() {
            tracing::warn!(%trigger, "no anti-forgery token available, sending logout without it");
        }

        let remote = match self.endpoint.end_session(token.as_deref()).await {
            Ok(()) => RemoteOutcome::Acknowledged,
            Err(err) => {
                tracing::warn!(
                    %trigger,
                    error = %err,
                    "remote logout failed, clearing local session anyway"
                );
                RemoteOutcome::Failed(err)
            }
        };

        let mut cleared_entries = self.session.clear();
        if let Some(cache) = &self.ui_cache {
            cleared_entries += cache.clear();
        }

        let notice = match trigger {
            LogoutTrigger::Auto => Notice::info(self.inactivity_notice.clone()),
            LogoutTrigger::Manual => Notice::success(self.manual_notice.clone()),
        };
        self.notifier.notify(notice);
        self.navigator.replace(&self.login_route);

        tracing::debug!(%trigger, cleared_entries, route = %self.login_route, "logout complete");
        LogoutReport {
            trigger,
            remote,
            cleared_entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        navigation::Navigator,
        notice::NoticeLevel,
        session::student_profile,
        testing::Harness,
    };

    #[tokio::test]
    async fn test_manual_logout_happy_path() {
        let h = Harness::new();
        h.session.establish(&student_profile());
        h.ui_cache.set("draft", "essay".to_string());
        h.navigator.push("/student/dashboard");

        let report = h.invoker.invoke(LogoutTrigger::Manual).await;

        assert_eq!(report.remote, RemoteOutcome::Acknowledged);
        assert_eq!(report.cleared_entries, 5);
        assert!(h.session.store().is_empty());
        assert!(h.ui_cache.is_empty());
        assert_eq!(h.endpoint.calls(), vec![Some("token-1".to_string())]);
        assert_eq!(h.notifier.notices(), vec![Notice::success(MANUAL_NOTICE)]);
        assert_eq!(h.navigator.current().as_deref(), Some(LOGIN_ROUTE));
    }

    #[tokio::test]
    async fn test_auto_logout_uses_inactivity_notice() {
        let h = Harness::new();
        h.session.establish(&student_profile());

        let report = h.invoker.invoke(LogoutTrigger::Auto).await;

        assert_eq!(report.trigger, LogoutTrigger::Auto);
        let notices = h.notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Info);
        assert_eq!(notices[0].message, INACTIVITY_NOTICE);
    }

    #[tokio::test]
    async fn test_remote_failure_still_clears_and_redirects() {
        let h = Harness::new();
        h.endpoint.push_response(Err(RemoteError::Status(500)));
        h.session.establish(&student_profile());
        h.navigator.push("/admin/dashboard");

        let report = h.invoker.invoke(LogoutTrigger::Manual).await;

        assert_eq!(report.remote, RemoteOutcome::Failed(RemoteError::Status(500)));
        assert!(h.session.store().is_empty());
        assert_eq!(h.notifier.notices().len(), 1);
        assert_eq!(h.navigator.current().as_deref(), Some(LOGIN_ROUTE));
        assert_eq!(h.navigator.back().as_deref(), Some("/"));
    }

    #[tokio::test]
    async fn test_missing_token_still_attempts_remote_call() {
        let h = Harness::with_token(None);
        h.session.establish(&student_profile());

        let report = h.invoker.invoke(LogoutTrigger::Auto).await;

        assert_eq!(report.remote, RemoteOutcome::Acknowledged);
        assert_eq!(h.endpoint.calls(), vec![None]);
        assert!(h.session.store().is_empty());
    }

    #[tokio::test]
    async fn test_logout_on_empty_session_is_harmless() {
        let h = Harness::new();

        let report = h.invoker.invoke(LogoutTrigger::Manual).await;

        assert_eq!(report.cleared_entries, 0);
        assert_eq!(h.navigator.current().as_deref(), Some(LOGIN_ROUTE));
    }

    #[tokio::test]
    async fn test_double_manual_logout_second_remote_rejects() {
        let h = Harness::new();
        h.endpoint.push_response(Ok(()));
        h.endpoint.push_response(Err(RemoteError::Status(401)));
        h.session.establish(&student_profile());

        let first = h.invoker.invoke(LogoutTrigger::Manual).await;
        assert_eq!(first.remote, RemoteOutcome::Acknowledged);
        assert_eq!(first.cleared_entries, 4);
        assert!(h.session.store().is_empty());

        h.navigator.push("/student/dashboard");
        let second = h.invoker.invoke(LogoutTrigger::Manual).await;

        assert_eq!(second.remote, RemoteOutcome::Failed(RemoteError::Status(401)));
        assert_eq!(second.cleared_entries, 0);
        assert!(h.session.store().is_empty());
        assert_eq!(h.endpoint.calls().len(), 2);
        assert_eq!(
            h.notifier.notices(),
            vec![Notice::success(MANUAL_NOTICE), Notice::success(MANUAL_NOTICE)]
        );
        assert_eq!(h.navigator.current().as_deref(), Some(LOGIN_ROUTE));
    }

    #[tokio::test]
    async fn test_concurrent_manual_and_auto_both_complete() {
        let h = Harness::new();
        h.endpoint.push_response(Ok(()));
        h.endpoint.push_response(Err(RemoteError::Status(401)));
        h.session.establish(&student_profile());

        let (manual, auto) = tokio::join!(
            h.invoker.invoke(LogoutTrigger::Manual),
            h.invoker.invoke(LogoutTrigger::Auto)
        );

        assert_eq!(manual.cleared_entries + auto.cleared_entries, 4);
        assert!(h.session.store().is_empty());
        assert_eq!(h.notifier.notices().len(), 2);
        assert_eq!(h.navigator.current().as_deref(), Some(LOGIN_ROUTE));
    }

    #[tokio::test]
    async fn test_custom_route_and_notices() {
        let h = Harness::new();
        let invoker = h
            .build_invoker()
            .with_login_route("/passkey/login")
            .with_notices("Session expired", "Bye");

        invoker.invoke(LogoutTrigger::Auto).await;
        invoker.invoke(LogoutTrigger::Manual).await;

        assert_eq!(
            h.notifier.notices(),
            vec![Notice::info("Session expired"), Notice::success("Bye")]
        );
        assert_eq!(h.navigator.current().as_deref(), Some("/passkey/login"));
    }
}
