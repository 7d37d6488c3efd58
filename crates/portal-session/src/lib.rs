pub mod activity;
pub mod config;
pub mod error;
pub mod guard;
pub mod logout;
pub mod navigation;
pub mod notice;
pub mod routes;
pub mod session;
pub mod timer;

#[cfg(test)]
pub(crate) mod testing;

pub use activity::{ActivityHub, ActivityKind, ActivityMonitor};
pub use config::{ConfigError, GuardConfig, PortalConfig};
pub use error::{GuardError, RemoteError};
pub use guard::{GuardExit, SessionGuard, state::GuardState};
pub use logout::{
    CsrfTokenProvider, LogoutInvoker, LogoutReport, LogoutTrigger, RemoteOutcome, SessionEndpoint,
};
pub use navigation::{HistoryNavigator, Navigator};
pub use notice::{Notice, Notifier, TracingNotifier};
pub use session::{MemorySessionStore, Role, SessionContext, SessionProfile, SessionStore};
