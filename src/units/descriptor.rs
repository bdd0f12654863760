//! Flat service descriptor extracted from a (possibly broken) unit file

use serde::Serialize;

/// Text fields a descriptor carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Description,
    Documentation,
    ExecStart,
    ExecStop,
    ExecReload,
    Restart,
    RuntimeDirectory,
    Requires,
    Wants,
    After,
    Before,
    User,
    Group,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Description => "Description",
            Self::Documentation => "Documentation",
            Self::ExecStart => "ExecStart",
            Self::ExecStop => "ExecStop",
            Self::ExecReload => "ExecReload",
            Self::Restart => "Restart",
            Self::RuntimeDirectory => "RuntimeDirectory",
            Self::Requires => "Requires",
            Self::Wants => "Wants",
            Self::After => "After",
            Self::Before => "Before",
            Self::User => "User",
            Self::Group => "Group",
        }
    }
}

/// Service description as recovered from a unit file
///
/// Every text field holds the raw text that followed `Key=` on its line.
/// Nothing is unquoted or escaped here; the init script template is in
/// charge of containing the values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Descriptor {
    pub name: String,
    pub description: String,
    pub documentation: String,

    // Execution
    pub exec_start: String,
    pub exec_stop: String,
    pub exec_reload: String,
    pub restart: String,
    pub runtime_directory: String,

    // Ordering hints, passed through untouched
    pub requires: String,
    pub wants: String,
    pub after: String,
    pub before: String,

    // Credentials
    pub user: String,
    pub group: String,

    /// Derived from `exec_reload` once parsing finishes
    pub has_reload: bool,
    pub remain_after_exit: bool, // reserved, never parsed
}

impl Descriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Description => &mut self.description,
            Field::Documentation => &mut self.documentation,
            Field::ExecStart => &mut self.exec_start,
            Field::ExecStop => &mut self.exec_stop,
            Field::ExecReload => &mut self.exec_reload,
            Field::Restart => &mut self.restart,
            Field::RuntimeDirectory => &mut self.runtime_directory,
            Field::Requires => &mut self.requires,
            Field::Wants => &mut self.wants,
            Field::After => &mut self.after,
            Field::Before => &mut self.before,
            Field::User => &mut self.user,
            Field::Group => &mut self.group,
        };
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let d = Descriptor::new();
        assert!(d.name.is_empty());
        assert!(d.exec_start.is_empty());
        assert!(!d.has_reload);
        assert!(!d.remain_after_exit);
    }

    #[test]
    fn test_set() {
        let mut d = Descriptor::new();
        d.set(Field::ExecStop, "/bin/kill $MAINPID".into());
        d.set(Field::RuntimeDirectory, "gitea".into());

        assert_eq!(d.exec_stop, "/bin/kill $MAINPID");
        assert_eq!(d.runtime_directory, "gitea");
        assert_eq!(d.exec_start, "");
    }

    #[test]
    fn test_field_names() {
        assert_eq!(Field::ExecStart.as_str(), "ExecStart");
        assert_eq!(Field::RuntimeDirectory.as_str(), "RuntimeDirectory");
    }
}
