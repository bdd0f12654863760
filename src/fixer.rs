//! Streaming unit-to-init-script converter
//!
//! [`ServiceFixer`] is an intermediate stream stage: descriptor bytes go in
//! through [`Write`], the rendered init script comes out through [`Read`].
//! That lets a caller drive the whole conversion with plain `io::copy`
//! calls without knowing anything about parsing or templates.
//!
//! ```no_run
//! use std::io::{self, Write};
//! use rcfix::ServiceFixer;
//!
//! # fn main() -> io::Result<()> {
//! let unit = std::fs::read("gitea.service")?;
//! let mut fixer = ServiceFixer::new("gitea");
//! fixer.write_all(&unit)?;
//! io::copy(&mut fixer, &mut io::stdout())?;
//! # Ok(())
//! # }
//! ```
//!
//! Each `write` call is parsed on its own, as if it were the whole file.
//! Feed the descriptor in a single call (`write_all` on a complete buffer).

use std::io::{self, Read, Write};
use std::mem;
use std::sync::mpsc;
use std::thread;

use crate::pipe::{self, PipeReader, PipeWriter};
use crate::sysvinit::{RenderError, ScriptTemplate};
use crate::units::{parse_descriptor, Descriptor};

/// Where the fixer is in its ingest/render cycle
#[derive(Debug, Default)]
enum Stage {
    #[default]
    Empty,
    Parsed(Descriptor),
    Rendered {
        descriptor: Descriptor,
        script: Vec<u8>,
        pos: usize,
    },
}

/// Outcome of pushing one chunk through the pipe
type WriteOutcome = (usize, Option<io::Error>);

/// Converts unit file bytes written into it into init script bytes read out
#[derive(Debug)]
pub struct ServiceFixer {
    name: String,
    user: Option<String>,
    group: Option<String>,
    template: Option<ScriptTemplate>,
    stage: Stage,
}

impl ServiceFixer {
    /// Create a fixer that names the service `name`
    ///
    /// The name always replaces whatever the parser inferred.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user: None,
            group: None,
            template: None,
            stage: Stage::Empty,
        }
    }

    /// Run the service as `user` instead of the descriptor's own value
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Run the service with `group` instead of the descriptor's own value
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Use a custom template instead of the bundled SysV one
    pub fn with_template(mut self, template: ScriptTemplate) -> Self {
        self.template = Some(template);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Change the target name; any rendered output is discarded
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.stage = match mem::take(&mut self.stage) {
            Stage::Rendered { descriptor, .. } => Stage::Parsed(descriptor),
            other => other,
        };
    }

    /// The most recently parsed descriptor, if any
    pub fn descriptor(&self) -> Option<&Descriptor> {
        match &self.stage {
            Stage::Empty => None,
            Stage::Parsed(descriptor) | Stage::Rendered { descriptor, .. } => Some(descriptor),
        }
    }

    fn template(&mut self) -> Result<&ScriptTemplate, RenderError> {
        let template = match self.template.take() {
            Some(template) => template,
            None => ScriptTemplate::sysvinit()?,
        };
        Ok(self.template.insert(template))
    }

    /// Render the init script into the output buffer
    ///
    /// Applies the configured name (and user/group overrides), then renders.
    /// On failure the parsed descriptor is kept so the caller can fix the
    /// name and try again.
    pub fn fix(&mut self) -> Result<(), RenderError> {
        let mut descriptor = match mem::take(&mut self.stage) {
            Stage::Empty => Descriptor::new(),
            Stage::Parsed(descriptor) | Stage::Rendered { descriptor, .. } => descriptor,
        };

        descriptor.name = self.name.clone();
        if let Some(user) = &self.user {
            descriptor.user = user.clone();
        }
        if let Some(group) = &self.group {
            descriptor.group = group.clone();
        }

        let rendered = self
            .template()
            .and_then(|template| template.render(&descriptor));

        match rendered {
            Ok(script) => {
                log::debug!("Rendered {} byte init script for {}", script.len(), self.name);
                self.stage = Stage::Rendered {
                    descriptor,
                    script,
                    pos: 0,
                };
                Ok(())
            }
            Err(e) => {
                self.stage = Stage::Parsed(descriptor);
                Err(e)
            }
        }
    }
}

/// Push `buf` into the pipe, keeping count of what the reader took
fn pump(writer: &mut PipeWriter, buf: &[u8]) -> WriteOutcome {
    let mut written = 0;
    while written < buf.len() {
        match writer.write(&buf[written..]) {
            Ok(0) => return (written, Some(io::ErrorKind::WriteZero.into())),
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return (written, Some(e)),
        }
    }
    (written, None)
}

/// Feed `buf` to `parse` through a fresh pipe
///
/// A worker thread writes while `parse` reads on the calling thread. The
/// parse result comes back together with what the worker managed to write;
/// if `parse` fails or stops reading early, the worker's outcome records the
/// short write and the pipe error.
fn ingest<P>(buf: &[u8], parse: P) -> io::Result<(Descriptor, WriteOutcome)>
where
    P: FnOnce(PipeReader) -> io::Result<Descriptor>,
{
    let (mut writer, reader) = pipe::pipe();
    let (result_tx, result_rx) = mpsc::sync_channel::<WriteOutcome>(1);

    let parsed = thread::scope(|scope| {
        scope.spawn(move || {
            let outcome = pump(&mut writer, buf);
            // Close the write end before reporting so the parser sees EOF
            drop(writer);
            let _ = result_tx.send(outcome);
        });
        parse(reader)
    });
    let descriptor = parsed?;

    let outcome = result_rx
        .recv()
        .map_err(|_| io::Error::other("pipe writer exited without a result"))?;
    Ok((descriptor, outcome))
}

impl Write for ServiceFixer {
    /// Parse `buf` as a complete descriptor, replacing any earlier one
    ///
    /// A parse failure is returned instead of the write result.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let (descriptor, outcome) = ingest(buf, parse_descriptor)?;

        log::debug!(
            "Parsed descriptor from {} bytes (ExecStart={:?})",
            buf.len(),
            descriptor.exec_start
        );
        self.stage = Stage::Parsed(descriptor);
        self.template().map_err(io::Error::other)?;

        match outcome {
            (n, None) => Ok(n),
            (_, Some(e)) => Err(e),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for ServiceFixer {
    /// Hand out the rendered script, rendering it first if needed
    ///
    /// Render failures come back as `io::Error`s wrapping a [`RenderError`].
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !matches!(self.stage, Stage::Rendered { .. }) {
            self.fix().map_err(io::Error::other)?;
        }

        match &mut self.stage {
            Stage::Rendered { script, pos, .. } => {
                let remaining = &script[*pos..];
                let n = remaining.len().min(buf.len());
                buf[..n].copy_from_slice(&remaining[..n]);
                *pos += n;
                Ok(n)
            }
            _ => Ok(0),
        }
    }
}
