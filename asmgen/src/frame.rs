use minc_ast::{Block, FunctionDeclaration, Statement};

use crate::abi::{ARG_REGISTERS, SLOT_SIZE};

/// Bytes of stack a function needs for its locals and for spilling its register arguments.
/// Arguments past the sixth already live in the caller's frame and take no space here.
pub fn frame_size(func: &FunctionDeclaration) -> u64 {
    let register_args = func.params.len().min(ARG_REGISTERS.len());
    let locals = count_declarations(&func.body);

    SLOT_SIZE * (register_args + locals) as u64
}

fn count_declarations(block: &Block) -> usize {
    block
        .0
        .iter()
        .map(|stmt| match stmt {
            Statement::VarDecl(_) => 1,
            Statement::Compound(block) => count_declarations(block),
            Statement::Assignment { .. } | Statement::Expression(_) | Statement::Return(_) => 0,
        })
        .sum()
}
