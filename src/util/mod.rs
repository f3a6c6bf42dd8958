//! Miscellaneous utilities.

use std::{fs, io::Read, path::Path};

/// Returns whether a file exists at a given path.
///
/// Also allows the special value `-` for referring to standard input, so callers can treat a
/// script argument and piped stdin uniformly.
pub(crate) fn file_exists(file_name: &str) -> bool {
    file_name == "-" || Path::new(file_name).exists()
}

/// Reads the full contents of a script file, or of standard input if `file_name` is `-`.
pub(crate) fn read_file(file_name: &str) -> String {
    if file_name == "-" {
        let mut contents = String::new();
        std::io::stdin()
            .read_to_string(&mut contents)
            .expect("failed to read standard input");
        contents
    } else {
        fs::read_to_string(file_name)
            .unwrap_or_else(|e| panic!("failed to read {file_name}: {e}"))
    }
}
