//! Service name resolution
//!
//! Picks the name an init script is installed under when the caller did not
//! spell it out.

use std::path::Path;

use crate::units::Descriptor;

/// Resolve the service name, first non-empty candidate wins:
///
/// 1. `explicit` (the `-n` flag)
/// 2. the file stem of `source` (`gitea.service` -> `gitea`)
/// 3. the base name of `RuntimeDirectory`, when the description is empty or
///    has spaces in it
/// 4. the description itself
pub fn resolve_name(explicit: Option<&str>, source: Option<&Path>, descriptor: &Descriptor) -> String {
    if let Some(name) = explicit.filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    if let Some(stem) = source
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
    {
        return stem.to_string();
    }

    let description = descriptor.description.trim();
    if description.is_empty() || description.contains(' ') {
        if let Some(base) = base_name(&descriptor.runtime_directory) {
            log::debug!("Using RuntimeDirectory base name {:?} as service name", base);
            return base.to_string();
        }
    }

    description.to_string()
}

/// Last path component of `dir`, ignoring trailing slashes
fn base_name(dir: &str) -> Option<&str> {
    dir.trim()
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
}
