//! Forgiving directive scanner
//!
//! Pulls a fixed set of `Key=Value` directives out of unit-file text.
//! Section headers, comments, unknown keys and lines without `=` are all
//! skipped silently so that half-edited or truncated files still yield
//! whatever can be recovered from them.

use std::io::{self, BufRead, BufReader, Read};

use super::descriptor::{Descriptor, Field};

/// Recognized directive prefixes and the field each one fills
///
/// `#RuntimeDirectory=` is honoured because packaged units commonly ship the
/// directive commented out, and it is still the best hint for a service name.
const DIRECTIVES: &[(&str, Field)] = &[
    ("Description=", Field::Description),
    ("Documentation=", Field::Documentation),
    ("ExecStart=", Field::ExecStart),
    ("ExecStop=", Field::ExecStop),
    ("ExecReload=", Field::ExecReload),
    ("Restart=", Field::Restart),
    ("Requires=", Field::Requires),
    ("Wants=", Field::Wants),
    ("After=", Field::After),
    ("Before=", Field::Before),
    ("RuntimeDirectory=", Field::RuntimeDirectory),
    ("#RuntimeDirectory=", Field::RuntimeDirectory),
];

/// Parse a descriptor from a byte stream
///
/// Only I/O errors from `reader` are returned. Invalid UTF-8 is replaced
/// rather than rejected.
pub fn parse_descriptor<R: Read>(reader: R) -> io::Result<Descriptor> {
    let mut reader = BufReader::new(reader);
    let mut descriptor = Descriptor::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        if buf.last() == Some(&b'\n') {
            buf.pop();
        }
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        let line = String::from_utf8_lossy(&buf);
        parse_line(&mut descriptor, &line);
    }

    normalize(&mut descriptor);
    Ok(descriptor)
}

/// Apply a single line to `descriptor`, returning whether it was recognized
///
/// The key is matched on the trimmed line but the value is cut from the raw
/// line, so trailing whitespace survives.
pub fn parse_line(descriptor: &mut Descriptor, line: &str) -> bool {
    let trimmed = line.trim();

    for &(prefix, field) in DIRECTIVES {
        if !trimmed.starts_with(prefix) {
            continue;
        }
        // Only whitespace can precede the prefix, so the first hit is the key
        let value = match line.find(prefix) {
            Some(pos) => &line[pos + prefix.len()..],
            None => "",
        };
        log::debug!("{} = {:?}", field.as_str(), value);
        descriptor.set(field, value.to_string());
        return true;
    }

    log::trace!("Ignoring line: {:?}", line);
    false
}

/// Post-scan fixups: name inference and the reload flag
pub fn normalize(descriptor: &mut Descriptor) {
    if (descriptor.name.is_empty() || descriptor.name.contains(' '))
        && !descriptor.runtime_directory.is_empty()
    {
        log::debug!(
            "Inferring name {:?} from RuntimeDirectory",
            descriptor.runtime_directory
        );
        descriptor.name = descriptor.runtime_directory.clone();
    }

    descriptor.has_reload = !descriptor.exec_reload.is_empty();
}
