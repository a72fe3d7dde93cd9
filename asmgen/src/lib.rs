pub mod abi;
pub mod error;
pub mod frame;
pub mod lower;

pub use error::CodegenError;
pub use frame::frame_size;

use minc_asm::TargetContext;

pub fn code_generation(
    program: &minc_ast::Program,
    ctx: &TargetContext,
) -> Result<minc_asm::Program, CodegenError> {
    lower::lower_program(program, ctx)
}
