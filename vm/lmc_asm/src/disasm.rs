//! Numbered listing output.

use lmc_ir::Program;

/// Render a program as a loadable listing, one instruction per line with its
/// address in a trailing comment:
///
/// ```text
/// LDC 0        ; 0
/// LDF 4        ; 1
/// ```
///
/// Feeding the output back through [`crate::load`] yields an equal program.
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();
    for (addr, insn) in program.as_slice().iter().enumerate() {
        let text = insn.to_string();
        out.push_str(&format!("{text:<12} ; {addr}\n"));
    }
    out
}
