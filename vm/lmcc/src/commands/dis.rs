//! The `dis` command: print a loaded program back as a numbered listing.

use lmc_asm::{disassemble, load};

use super::read_file;

pub fn dis_file(path: &str) {
    let source = read_file(path);
    match load(&source) {
        Ok(program) => print!("{}", disassemble(&program)),
        Err(err) => {
            eprintln!("error: {path}: {err}");
            std::process::exit(1);
        }
    }
}
