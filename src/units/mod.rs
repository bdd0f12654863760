//! Unit file reading
//!
//! Recovers a flat [`Descriptor`] from systemd .service text, tolerating
//! anything it does not understand.

mod descriptor;
mod parser;

pub use descriptor::{Descriptor, Field};
pub use parser::{normalize, parse_descriptor, parse_line};

use std::fs::File;
use std::io;
use std::path::Path;

/// Parse a service file from disk
pub fn load_descriptor(path: &Path) -> io::Result<Descriptor> {
    let file = File::open(path)?;
    log::debug!("Loading descriptor from {}", path.display());
    parse_descriptor(file)
}
