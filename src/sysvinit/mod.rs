//! SysV init script rendering
//!
//! Fills the bundled `/etc/init.d` script template from a [`Descriptor`].
//! Field values are inserted exactly as parsed; the unit file is trusted.

use std::fmt;

use minijinja::{AutoEscape, Environment, UndefinedBehavior};

use crate::units::Descriptor;

/// Bundled init script template
pub const DEFAULT_TEMPLATE: &str = include_str!("init.sh.tmpl");

const TEMPLATE_NAME: &str = "init.sh";

/// Fields that must be set before a script can be rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    ExecStart,
    Name,
}

impl RequiredField {
    fn hint(&self) -> &'static str {
        match self {
            Self::ExecStart => "",
            Self::Name => ", try using the -n flag",
        }
    }
}

impl fmt::Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecStart => f.write_str("ExecStart"),
            Self::Name => f.write_str("Name"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("{0} is required{hint}", hint = .0.hint())]
    MissingRequiredField(RequiredField),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// Compiled init script template
///
/// Placeholders are the descriptor's unit-file field names (`{{ ExecStart }}`,
/// `{% if HasReload %}`). A block tag swallows the line break after it, the
/// output keeps its final newline, and nothing is HTML-escaped.
pub struct ScriptTemplate {
    env: Environment<'static>,
}

impl fmt::Debug for ScriptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptTemplate").finish_non_exhaustive()
    }
}

impl ScriptTemplate {
    /// Compile the bundled SysV template
    pub fn sysvinit() -> Result<Self, minijinja::Error> {
        Self::from_source(DEFAULT_TEMPLATE)
    }

    pub fn from_source(source: &str) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_template_owned(TEMPLATE_NAME, source.to_string())?;
        Ok(Self { env })
    }

    /// Render a script for `descriptor`
    ///
    /// Fails when `ExecStart` or `Name` is empty, checked in that order.
    pub fn render(&self, descriptor: &Descriptor) -> Result<Vec<u8>, RenderError> {
        if descriptor.exec_start.is_empty() {
            return Err(RenderError::MissingRequiredField(RequiredField::ExecStart));
        }
        if descriptor.name.is_empty() {
            return Err(RenderError::MissingRequiredField(RequiredField::Name));
        }

        let script = self.env.get_template(TEMPLATE_NAME)?.render(descriptor)?;
        Ok(script.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::ErrorKind;

    fn gitea() -> Descriptor {
        Descriptor {
            name: "gitea".into(),
            description: "Gitea (Git with a cup of tea)".into(),
            exec_start: "/usr/local/bin/gitea web --config /etc/gitea/app.ini".into(),
            user: "git".into(),
            ..Descriptor::default()
        }
    }

    fn render_str(d: &Descriptor) -> String {
        let t = ScriptTemplate::sysvinit().unwrap();
        String::from_utf8(t.render(d).unwrap()).unwrap()
    }

    #[test]
    fn test_bundled_template_compiles() {
        assert!(ScriptTemplate::sysvinit().is_ok());
    }

    #[test]
    fn test_render_basic() {
        let script = render_str(&gitea());

        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.ends_with("exit 0\n"));
        assert!(script.contains("# Provides:          gitea\n"));
        assert!(script.contains("PIDFILE=\"/var/run/gitea.pid\""));
        assert!(script.contains("LOGFILE=\"/var/log/gitea.log\""));
        assert!(script.contains("SCRIPT=\"/usr/local/bin/gitea web --config /etc/gitea/app.ini\""));
        assert!(script.contains("RUNAS=\"git\""));
        assert!(script.contains("# Description:       Gitea (Git with a cup of tea)\n"));
        assert!(script.contains("\tstart)\n"));
        assert!(script.contains("\tstop)\n"));
        assert!(script.contains("\tstatus)\n"));
        assert!(script.contains("\trestart)\n"));
        assert!(!script.contains("reload)"));
        assert!(script.contains("Usage: $0 {start|stop|status|restart}"));
        assert!(!script.contains("{{"));
        assert!(!script.contains("{%"));
    }

    #[test]
    fn test_block_tags_leave_no_blank_lines() {
        let script = render_str(&gitea());
        assert!(script.contains("\t\tstop\n\t\t;;\n\tstatus)\n"));
        assert!(script.contains("\t*)\n\t\techo \"Usage: $0 {start|stop|status|restart}\"\n\t\texit 1\n"));
    }

    #[test]
    fn test_render_with_reload() {
        let mut d = gitea();
        d.exec_reload = "/usr/local/bin/gitea reload".into();
        d.has_reload = true;

        let script = render_str(&d);
        assert!(script.contains("\t\t;;\n\treload)\n"));
        assert!(script.contains("\t\t/usr/local/bin/gitea reload\n"));
        assert!(script.contains("Usage: $0 {start|stop|reload|status|restart}"));
        assert!(!script.contains("Usage: $0 {start|stop|status|restart}"));
    }

    #[test]
    fn test_reload_block_follows_flag_not_command() {
        let mut d = gitea();
        d.exec_reload = "/usr/local/bin/gitea reload".into();

        let script = render_str(&d);
        assert!(!script.contains("reload)"));
    }

    #[test]
    fn test_missing_exec_start() {
        let t = ScriptTemplate::sysvinit().unwrap();
        let mut d = gitea();
        d.exec_start.clear();
        d.name.clear();

        let err = t.render(&d).unwrap_err();
        assert!(matches!(
            err,
            RenderError::MissingRequiredField(RequiredField::ExecStart)
        ));
        assert_eq!(err.to_string(), "ExecStart is required");
    }

    #[test]
    fn test_missing_name() {
        let t = ScriptTemplate::sysvinit().unwrap();
        let mut d = gitea();
        d.name.clear();

        let err = t.render(&d).unwrap_err();
        assert!(matches!(
            err,
            RenderError::MissingRequiredField(RequiredField::Name)
        ));
        assert_eq!(err.to_string(), "Name is required, try using the -n flag");
    }

    #[test]
    fn test_render_is_deterministic() {
        let t = ScriptTemplate::sysvinit().unwrap();
        let d = gitea();
        assert_eq!(t.render(&d).unwrap(), t.render(&d).unwrap());
    }

    #[test]
    fn test_values_inserted_verbatim() {
        let mut d = gitea();
        d.exec_start = r#"/bin/sh -c "echo $HOME" <&2 %n"#.into();

        let script = render_str(&d);
        assert!(script.contains(r#"SCRIPT="/bin/sh -c "echo $HOME" <&2 %n""#));
    }

    #[test]
    fn test_custom_template() {
        let t = ScriptTemplate::from_source("{{ Name }}:{{ ExecStart }}:{{ Group }}\n").unwrap();
        let mut d = gitea();
        d.group = "git".into();
        let out = t.render(&d).unwrap();
        assert_eq!(out, b"gitea:/usr/local/bin/gitea web --config /etc/gitea/app.ini:git\n");
    }

    #[test]
    fn test_custom_template_syntax_error() {
        let err = ScriptTemplate::from_source("{% if HasReload %}open").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SyntaxError);
    }

    #[test]
    fn test_custom_template_unknown_field() {
        let t = ScriptTemplate::from_source("{{ Nope }}").unwrap();
        let err = t.render(&gitea()).unwrap_err();
        assert!(matches!(
            err,
            RenderError::Template(ref e) if e.kind() == ErrorKind::UndefinedError
        ));
    }
}
