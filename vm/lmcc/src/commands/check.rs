//! The `check` command: load programs without running them.

use lmc_asm::load;

use super::read_file;

/// Load each listing and report the first error per file. Exits with 1 if
/// any file failed; clean files print an `OK` line with their length.
pub fn check_files(paths: &[String]) {
    let mut failed = false;
    for path in paths {
        let source = read_file(path);
        match load(&source) {
            Ok(program) => println!("OK: {path} ({} instructions)", program.len()),
            Err(err) => {
                eprintln!("error: {path}: {err}");
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
}
