//! System V x86-64 conventions used by the lowering.

use minc_asm::{Operand, Register, Width};

/// Integer argument registers in parameter order.
pub const ARG_REGISTERS: [Register; 6] = [
    Register::DI,
    Register::SI,
    Register::DX,
    Register::CX,
    Register::R8,
    Register::R9,
];

/// Holds every intermediate result and the return value.
pub const ACCUMULATOR: Register = Register::AX;
/// Keeps the left operand of a binary operation alive while the right one is computed.
pub const SCRATCH: Register = Register::R10;

/// Width of `int`, the only value type.
pub const VALUE_WIDTH: Width = Width::Long;
pub const SLOT_SIZE: u64 = 4;

/// Distance from rbp to the first stack passed argument, past the saved rbp and the return
/// address.
pub const STACK_ARGS_OFFSET: i64 = 16;
pub const STACK_ARG_SIZE: i64 = 8;

pub fn accumulator() -> Operand {
    Operand::Register(ACCUMULATOR, VALUE_WIDTH)
}

pub fn scratch() -> Operand {
    Operand::Register(SCRATCH, VALUE_WIDTH)
}

pub fn base_pointer() -> Operand {
    Operand::Register(Register::BP, Width::Quad)
}

pub fn stack_pointer() -> Operand {
    Operand::Register(Register::SP, Width::Quad)
}

pub fn arg_register(index: usize) -> Option<Operand> {
    ARG_REGISTERS
        .get(index)
        .map(|reg| Operand::Register(*reg, VALUE_WIDTH))
}
