//! Capabilities injected by the host application.
//!
//! DESIGN
//! ======
//! The transport performs two user-visible side effects it cannot own: it
//! reports messages and, on credential rejection, sends the user back to the
//! login entry point. Both are modeled as traits so the classification logic
//! is testable without a real UI, and so the host decides the mechanism
//! (toast vs. banner, full reload vs. soft navigation).

/// Reports a user-facing message. One call per classified failure.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Terminates the current session context and re-enters the application at
/// the login destination.
pub trait LoginReentry: Send + Sync {
    fn reenter_login(&self);
}

/// Notifier for headless hosts: forwards messages to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::warn!(message, "user notification");
    }
}
