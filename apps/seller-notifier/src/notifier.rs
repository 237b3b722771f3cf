//! Desktop notification sink.

/// Whether the user allowed desktop notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

impl Permission {
    /// `denied` turns desktop notifications off; anything else, including an
    /// unset value, grants them.
    pub fn from_setting(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("denied") => Permission::Denied,
            _ => Permission::Granted,
        }
    }
}

pub trait DesktopNotifier: Send + Sync {
    fn permission(&self) -> Permission;
    fn notify(&self, title: &str, body: &str);
}

/// Renders desktop notifications as log lines.
pub struct LogNotifier {
    permission: Permission,
}

impl LogNotifier {
    pub fn new(permission: Permission) -> Self {
        Self { permission }
    }
}

impl DesktopNotifier for LogNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn notify(&self, title: &str, body: &str) {
        tracing::info!(target: "desktop", %title, %body, "desktop notification");
    }
}
