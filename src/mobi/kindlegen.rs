//! External Kindle converter invocation.
//!
//! The converter's exit status is not a reliable success signal, so it is only
//! logged. Callers decide success by checking that the expected output exists.

use crate::generator::GenerationError;
use log::{debug, info};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Run `program <input>` inside `workdir` and wait for it to exit.
///
/// With `verbose`, the command line, every stdout line and the exit status are
/// logged and stderr is passed through; otherwise output is drained silently.
pub fn run_converter(
    program: &Path,
    input: &str,
    workdir: &Path,
    verbose: bool,
) -> Result<(), GenerationError> {
    let program = resolve_program(program);
    let program_name = program.display().to_string();
    if verbose {
        info!("Running command: {} {}", program_name, input);
    }

    let converter_error = |e: std::io::Error| GenerationError::Converter {
        program: program_name.clone(),
        source: e,
    };

    let mut child = Command::new(&program)
        .arg(input)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(if verbose {
            Stdio::inherit()
        } else {
            Stdio::null()
        })
        .spawn()
        .map_err(converter_error)?;

    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).split(b'\n') {
            let Ok(line) = line else { break };
            if verbose {
                info!("{}", String::from_utf8_lossy(&line).trim_end());
            }
        }
    }

    let status = child.wait().map_err(converter_error)?;
    if verbose {
        info!("Status code is {}", status);
    } else {
        debug!("{} exited with {}", program_name, status);
    }
    Ok(())
}

/// Relative paths with a directory part are taken from the caller's working
/// directory, not from `workdir`. Bare names are left for PATH lookup.
fn resolve_program(program: &Path) -> PathBuf {
    if program.is_relative() && program.components().count() > 1 {
        if let Ok(cwd) = std::env::current_dir() {
            return cwd.join(program);
        }
    }
    program.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_program_name_is_kept_for_path_lookup() {
        assert_eq!(resolve_program(Path::new("kindlegen")), PathBuf::from("kindlegen"));
    }

    #[test]
    fn relative_program_path_is_anchored_to_cwd() {
        let resolved = resolve_program(Path::new("tools/kindlegen"));
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("tools/kindlegen"));
    }

    #[test]
    fn missing_program_is_a_converter_error() {
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("no-such-kindlegen");
        let result = run_converter(&program, "ebook.opf", dir.path(), false);
        assert!(matches!(result, Err(GenerationError::Converter { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn failing_status_is_not_an_error() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("fake-kindlegen");
        std::fs::write(&program, "#!/bin/sh\necho \"warning W14001\"\nexit 1\n").unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(run_converter(&program, "ebook.opf", dir.path(), true).is_ok());
    }
}
