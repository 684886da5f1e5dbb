//! Line-oriented program output.
//!
//! Every line goes out as a single write followed by a flush, so lines from
//! different ranks sharing one terminal never tear and a debugger sees output
//! as soon as the line is printed.
//!
//! Output is best-effort: a failed write is logged and dropped. The caller
//! always goes on to its next collective call, so one rank losing its stdout
//! never leaves the others waiting in a barrier.

use std::io::Write;

/// Write `line` plus a newline in one call and flush. Returns whether the
/// line was written.
pub fn emit<W: Write + ?Sized>(out: &mut W, line: &str) -> bool {
    let mut buf = String::with_capacity(line.len() + 1);
    buf.push_str(line);
    buf.push('\n');
    match out.write_all(buf.as_bytes()).and_then(|()| out.flush()) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, line, "dropped output line");
            false
        }
    }
}
