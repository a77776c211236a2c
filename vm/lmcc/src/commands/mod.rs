//! Command handlers for the `lmc` binary.
//!
//! Each submodule implements one command. Shared helpers like `read_file`
//! live in the module root.

mod check;
mod dis;
mod exec;
mod run;

pub use check::check_files;
pub use dis::dis_file;
pub use exec::{exec_file, ExecOptions};
pub use run::{run_game, RunOptions, DEFAULT_GHOST};

/// Read a file from disk, exiting with a user-friendly message on failure.
pub(crate) fn read_file(path: &str) -> String {
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            let msg = match e.kind() {
                std::io::ErrorKind::NotFound => format!("cannot find file '{path}'"),
                std::io::ErrorKind::PermissionDenied => {
                    format!("permission denied reading '{path}'")
                }
                _ => format!("error reading '{path}': {e}"),
            };
            eprintln!("{msg}");
            std::process::exit(1);
        }
    }
}
