use std::collections::{hash_map::Entry, HashMap, HashSet};

use log::{debug, trace};
use minc_asm::{Instruction, Label, Operand, Program, Register, Section, TargetContext, Width};
use minc_ast::{self as ast, BinaryOperator, Expression, Statement};

use crate::{
    abi::{
        accumulator, arg_register, base_pointer, scratch, stack_pointer, ACCUMULATOR,
        ARG_REGISTERS, SLOT_SIZE, STACK_ARGS_OFFSET, STACK_ARG_SIZE, VALUE_WIDTH,
    },
    frame, CodegenError,
};

const ENTRY_FUNCTION: &str = "main";

/// Symbol table and stack cursor of the function currently being lowered.
struct FunctionContext<'a> {
    name: &'a str,
    functions: &'a HashSet<&'a str>,
    symbols: HashMap<String, Operand>,
    stack_offset: i64,
}

impl<'a> FunctionContext<'a> {
    fn new(name: &'a str, functions: &'a HashSet<&'a str>) -> Self {
        Self {
            name,
            functions,
            symbols: HashMap::new(),
            stack_offset: 0,
        }
    }

    /// Reserves the next stack slot and binds `name` to it. The cursor only moves once the
    /// binding succeeded.
    fn declare(&mut self, name: &str) -> Result<Operand, CodegenError> {
        let offset = self.stack_offset - SLOT_SIZE as i64;
        let slot = Operand::RegisterOffset(Register::BP, VALUE_WIDTH, offset);
        self.bind(name, slot.clone())?;
        self.stack_offset = offset;
        Ok(slot)
    }

    fn bind(&mut self, name: &str, operand: Operand) -> Result<(), CodegenError> {
        match self.symbols.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(self.already_declared(name)),
            Entry::Vacant(entry) => {
                entry.insert(operand);
                Ok(())
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<Operand, CodegenError> {
        self.symbols
            .get(name)
            .cloned()
            .ok_or_else(|| CodegenError::VariableNotFound {
                name: name.to_owned(),
                function: self.name.to_owned(),
            })
    }

    fn callee(&self, name: &str) -> Result<Label, CodegenError> {
        resolve_function(self.functions, name)
    }

    fn already_declared(&self, name: &str) -> CodegenError {
        CodegenError::VariableAlreadyDeclared {
            name: name.to_owned(),
            function: self.name.to_owned(),
        }
    }

    fn epilogue(&self) -> Label {
        Label::Epilogue(self.name.to_owned())
    }
}

pub fn lower_program(
    program: &ast::Program,
    ctx: &TargetContext,
) -> Result<Program, CodegenError> {
    let mut out = Program::default();
    let functions: HashSet<&str> = program
        .declarations
        .iter()
        .map(|func| func.name.as_str())
        .collect();

    out.push(Instruction::section(Section::Text));
    cg_start(&mut out, &functions, ctx)?;

    for func in &program.declarations {
        cg_function(&mut out, &functions, func)?;
    }

    out.push(Instruction::section(Section::GnuStack));

    trace!("lowered program into {} instructions", out.0.len());
    Ok(out)
}

fn resolve_function(functions: &HashSet<&str>, name: &str) -> Result<Label, CodegenError> {
    if functions.contains(name) {
        Ok(Label::Function(name.to_owned()))
    } else {
        Err(CodegenError::FunctionNotFound(name.to_owned()))
    }
}

/// Calls `main` and hands its result to the exit system call.
fn cg_start(
    out: &mut Program,
    functions: &HashSet<&str>,
    ctx: &TargetContext,
) -> Result<(), CodegenError> {
    let main = resolve_function(functions, ENTRY_FUNCTION)?;

    out.push(Instruction::global(Label::Start));
    out.push(Instruction::call(main).labeled(Label::Start));
    out.push(Instruction::mov(
        Operand::Register(ARG_REGISTERS[0], VALUE_WIDTH),
        accumulator(),
    ));
    out.push(Instruction::mov(
        Operand::Register(Register::AX, Width::Quad),
        Operand::constant(ctx.exit_syscall()),
    ));
    out.push(Instruction::syscall());

    Ok(())
}

fn cg_function(
    out: &mut Program,
    functions: &HashSet<&str>,
    func: &ast::FunctionDeclaration,
) -> Result<(), CodegenError> {
    let frame_size = frame::frame_size(func);
    debug!(
        "lowering function {} with a frame of {} bytes",
        func.name, frame_size
    );

    let mut fc = FunctionContext::new(&func.name, functions);
    let frame = Operand::constant(frame_size);

    out.push(Instruction::global(Label::Function(func.name.clone())));
    out.push(Instruction::push(base_pointer()).labeled(Label::Function(func.name.clone())));
    out.push(Instruction::mov(base_pointer(), stack_pointer()));
    out.push(Instruction::sub(stack_pointer(), frame.clone()));

    for (i, param) in func.params.iter().enumerate() {
        match arg_register(i) {
            Some(register) => {
                let slot = fc.declare(&param.name)?;
                out.push(Instruction::mov(slot, register));
            }
            None => {
                let index = (i - ARG_REGISTERS.len()) as i64;
                fc.bind(
                    &param.name,
                    Operand::RegisterOffset(
                        Register::BP,
                        VALUE_WIDTH,
                        STACK_ARGS_OFFSET + STACK_ARG_SIZE * index,
                    ),
                )?;
            }
        }
    }

    cg_block(out, &mut fc, &func.body)?;

    if fc.stack_offset.unsigned_abs() != frame_size {
        return Err(CodegenError::FrameSizeMismatch {
            function: func.name.clone(),
            frame_size,
            cursor: fc.stack_offset,
        });
    }

    out.push(Instruction::add(stack_pointer(), frame).labeled(fc.epilogue()));
    out.push(Instruction::pop(base_pointer()));
    out.push(Instruction::ret());

    Ok(())
}

fn cg_block(
    out: &mut Program,
    fc: &mut FunctionContext,
    block: &ast::Block,
) -> Result<(), CodegenError> {
    for stmt in &block.0 {
        cg_statement(out, fc, stmt)?;
    }
    Ok(())
}

fn cg_statement(
    out: &mut Program,
    fc: &mut FunctionContext,
    stmt: &Statement,
) -> Result<(), CodegenError> {
    match stmt {
        Statement::VarDecl(decl) => {
            fc.declare(&decl.name)?;
        }
        Statement::Assignment { name, value } => {
            let dst = fc.lookup(name)?;
            let src = cg_expression(out, fc, value)?;
            cg_move(out, dst, src);
        }
        Statement::Expression(expr) => {
            cg_expression(out, fc, expr)?;
        }
        Statement::Return(value) => {
            if let Some(value) = value {
                let value = cg_expression(out, fc, value)?;
                into_accumulator(out, value);
            }
            out.push(Instruction::jmp(fc.epilogue()));
        }
        Statement::Compound(block) => cg_block(out, fc, block)?,
    }

    Ok(())
}

fn cg_expression(
    out: &mut Program,
    fc: &mut FunctionContext,
    expr: &Expression,
) -> Result<Operand, CodegenError> {
    match expr {
        Expression::Constant(val) => Ok(Operand::constant(val)),
        Expression::Var(name) => fc.lookup(name),
        Expression::Binary { op, lhs, rhs } => cg_binary(out, fc, *op, lhs, rhs),
        Expression::FunctionCall(name, args) => cg_call(out, fc, name, args),
    }
}

/// The result always ends up in the accumulator.
///
/// The left value is parked in the scratch register while the right side is computed. A
/// nested binary operation on the right side reuses that register, so `a * (b + (c + d))`
/// style expressions lose the left value.
fn cg_binary(
    out: &mut Program,
    fc: &mut FunctionContext,
    op: BinaryOperator,
    lhs: &Expression,
    rhs: &Expression,
) -> Result<Operand, CodegenError> {
    if let BinaryOperator::Divide | BinaryOperator::Remainder = op {
        return Err(CodegenError::UnsupportedOperator(op.symbol()));
    }

    let mut lhs = cg_expression(out, fc, lhs)?;
    if lhs.is_register(ACCUMULATOR) {
        out.push(Instruction::mov(scratch(), lhs));
        lhs = scratch();
    }

    let rhs = cg_expression(out, fc, rhs)?;
    let acc = into_accumulator(out, rhs);

    match op {
        BinaryOperator::Add => out.push(Instruction::add(acc.clone(), lhs)),
        BinaryOperator::Multiply => out.push(Instruction::imul(acc.clone(), lhs)),
        BinaryOperator::Subtract => {
            // lhs - rhs == -rhs + lhs, keeps the result in the accumulator
            out.push(Instruction::imul(acc.clone(), Operand::constant(-1)));
            out.push(Instruction::add(acc.clone(), lhs));
        }
        BinaryOperator::Divide | BinaryOperator::Remainder => {
            unreachable!("rejected before lowering the operands")
        }
    }

    Ok(acc)
}

fn cg_call(
    out: &mut Program,
    fc: &mut FunctionContext,
    name: &str,
    args: &[Expression],
) -> Result<Operand, CodegenError> {
    let callee = fc.callee(name)?;
    let (register_args, stack_args) = args
        .split_at_checked(ARG_REGISTERS.len())
        .unwrap_or((args, &[]));

    for (i, arg) in register_args.iter().enumerate() {
        let value = cg_expression(out, fc, arg)?;
        out.push(Instruction::mov(
            Operand::Register(ARG_REGISTERS[i], VALUE_WIDTH),
            value,
        ));
    }

    // The callee reads the seventh argument at 16(%rbp), so it has to be pushed last.
    for arg in stack_args.iter().rev() {
        let value = cg_expression(out, fc, arg)?;
        out.push(Instruction::push(value.with_width(Width::Quad)));
    }

    out.push(Instruction::call(callee));

    if !stack_args.is_empty() {
        out.push(Instruction::add(
            stack_pointer(),
            Operand::constant(STACK_ARG_SIZE * stack_args.len() as i64),
        ));
    }

    Ok(accumulator())
}

fn into_accumulator(out: &mut Program, value: Operand) -> Operand {
    if !value.is_register(ACCUMULATOR) {
        out.push(Instruction::mov(accumulator(), value));
    }
    accumulator()
}

/// x86 has no memory to memory move, those go through the accumulator.
fn cg_move(out: &mut Program, dst: Operand, src: Operand) {
    let src = if dst.is_memory() && src.is_memory() {
        into_accumulator(out, src)
    } else {
        src
    };
    out.push(Instruction::mov(dst, src));
}
