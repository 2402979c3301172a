//! File-based rewriting: read a JSON file, transform it, optionally write
//! the result.

use crate::diag::{Diagnostics, ErrorCode};
use crate::options::{Outcome, Rewrite};
use crate::path::NodeKey;
use std::fs;
use std::io;
use std::path::Path;

/// Read `src`, run the rewrite over its contents, and write the serialized
/// result to `dest`.
///
/// With `src` set, the file's text replaces the rewrite's source (a read
/// failure returns a fatal [`ErrorCode::ReadError`] outcome whose diagnostic
/// path is the offending file path). With `src` unset the rewrite's own
/// source is used, exactly as in [`Rewrite::run`].
///
/// With `dest` set and the run not fatal, the serialized result is written
/// there, creating parent directories as needed; a failure records a fatal
/// [`ErrorCode::WriteError`]. The outcome is returned either way.
///
/// # Examples
///
/// ```no_run
/// use json_sift::{rewrite_file, Rewrite, SampleOp};
/// use std::path::Path;
///
/// let outcome = rewrite_file(
///     Rewrite::from_json("{}")
///         .mode("over")
///         .exclude("scripts")
///         .sample("version", SampleOp::literal("0.2.0")),
///     Some(Path::new("package.json")),
///     Some(Path::new("dist/package.json")),
/// );
/// assert!(!outcome.diagnostics().is_fatal());
/// ```
pub fn rewrite_file(rewrite: Rewrite, src: Option<&Path>, dest: Option<&Path>) -> Outcome {
    let rewrite = match src {
        Some(path) => match fs::read_to_string(path) {
            Ok(text) => rewrite.with_json_source(text),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "source read failed");
                let mode = rewrite.mode;
                let mut diag = Diagnostics::new(mode.is_error());
                diag.add_error(
                    ErrorCode::ReadError,
                    vec![NodeKey::key(path.display().to_string())],
                );
                diag.set_fatal();
                return Outcome::failed(mode, diag, rewrite.indent);
            }
        },
        None => rewrite,
    };

    let mut outcome = rewrite.run();
    let Some(dest) = dest else {
        return outcome;
    };
    if outcome.diagnostics().is_fatal() {
        return outcome;
    }

    if let Err(err) = write_result(dest, &outcome.to_json()) {
        tracing::debug!(path = %dest.display(), error = %err, "destination write failed");
        let diag = outcome.diagnostics_mut();
        diag.add_error(
            ErrorCode::WriteError,
            vec![NodeKey::key(dest.display().to_string())],
        );
        diag.set_fatal();
    }
    outcome
}

fn write_result(dest: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(dest, text)
}
