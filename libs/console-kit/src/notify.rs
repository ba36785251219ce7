//! Injected side effects: user notifications and route changes.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// A toast-style message for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            title: title.into(),
            description: description.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<F> Notifier for F
where
    F: Fn(Notification) + Send + Sync,
{
    fn notify(&self, notification: Notification) {
        self(notification)
    }
}

/// Emits notifications as log events (headless hosts, CLI).
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.severity {
            Severity::Error => {
                tracing::warn!(title = %n.title, description = %n.description, "notification")
            }
            Severity::Success | Severity::Info => {
                tracing::info!(title = %n.title, description = %n.description, "notification")
            }
        }
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: &str);
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn navigate(&self, route: &str) {
        self(route)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNavigator;

impl Navigator for TracingNavigator {
    fn navigate(&self, route: &str) {
        tracing::info!(route, "navigate");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn tracing_notifier_logs_error_notifications() {
        TracingNotifier.notify(Notification::error("Erro", "Não foi possível carregar os Itens."));
        assert!(logs_contain("Não foi possível carregar os Itens."));
        assert!(logs_contain("WARN"));
    }

    #[test]
    fn closures_are_notifiers() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let seen = seen.clone();
            move |n: Notification| seen.lock().unwrap().push(n)
        };
        sink.notify(Notification::success("Ok", "Salvo"));
        assert_eq!(seen.lock().unwrap()[0].severity, Severity::Success);
    }

    #[test]
    fn closures_are_navigators() {
        let seen = Arc::new(Mutex::new(String::new()));
        let nav = {
            let seen = seen.clone();
            move |route: &str| *seen.lock().unwrap() = route.to_string()
        };
        nav.navigate("/alterar/cliente/1");
        assert_eq!(*seen.lock().unwrap(), "/alterar/cliente/1");
    }
}
