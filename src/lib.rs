//! rcfix - turn systemd service units into SysV init scripts
//!
//! Reads a .service file, even a broken or half-commented one, and writes
//! an `/etc/init.d` script that starts, stops, reloads and checks the same
//! command.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 ServiceFixer                 │
//! │        Write (unit in) / Read (script out)   │
//! ├──────────────────────┬───────────────────────┤
//! │  units (parser)      │  sysvinit (renderer)  │
//! ├──────────────────────┴───────────────────────┤
//! │         pipe (in-memory, unbuffered)         │
//! └──────────────────────────────────────────────┘
//! ```

pub mod fixer;
pub mod naming;
pub mod pipe;
pub mod sysvinit;
pub mod units;

pub use fixer::ServiceFixer;
pub use sysvinit::{RenderError, RequiredField, ScriptTemplate};
pub use units::{Descriptor, Field};
