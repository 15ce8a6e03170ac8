//! Outward side effects the core triggers but does not implement: moving the
//! user to the login view and showing ambient error notifications.

use crate::error::ApiError;

/// Drives the host application's navigation.
pub trait Navigator: Send + Sync {
    fn redirect_to_login(&self);
}

/// Ambient error surface (toasts and the like).
///
/// Only receives errors from operations that opted in, and never validation
/// errors.
pub trait Notifier: Send + Sync {
    fn notify_error(&self, error: &ApiError);
}

/// Navigator for hosts without views; records the redirect in the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect_to_login(&self) {
        tracing::info!("redirecting to login");
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_error(&self, error: &ApiError) {
        tracing::warn!(status = ?error.status(), "{error}");
    }
}
