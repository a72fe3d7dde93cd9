use std::{fs, path::PathBuf};

use clap::Parser;
use minc::driver::{self, DriverError, Options};
use minc_asm::{OperatingSystem, TargetContext};
use minc_ast::{
    BinaryOperator, Block, Expression, FunctionDeclaration, Parameter, Program, Statement, Type,
    VariableDeclaration,
};
use pretty_assertions::assert_eq;

fn compile(program: &Program, os: OperatingSystem) -> String {
    let ctx = TargetContext::new(os);
    let program =
        minc_asmgen::code_generation(program, &ctx).expect("program should lower successfully");
    minc_emit::emit_program(&program, &ctx)
}

fn function(name: &str, params: usize, body: Vec<Statement>) -> FunctionDeclaration {
    FunctionDeclaration {
        name: name.to_owned(),
        params: (0..params)
            .map(|i| Parameter {
                name: format!("p{i}"),
                ty: Type::Int,
            })
            .collect(),
        return_type: Some(Type::Int),
        body: Block(body),
    }
}

/// `sum7` adds its seven arguments, `main` calls it and keeps a local.
fn seven_args_program() -> Program {
    let sum = (1..7).fold(Expression::var("p0"), |acc, i| {
        Expression::binary(BinaryOperator::Add, acc, Expression::var(&format!("p{i}")))
    });

    Program {
        declarations: vec![
            function("sum7", 7, vec![Statement::Return(Some(sum))]),
            function(
                "main",
                0,
                vec![
                    Statement::VarDecl(VariableDeclaration {
                        name: "r".to_owned(),
                        ty: Type::Int,
                    }),
                    Statement::Assignment {
                        name: "r".to_owned(),
                        value: Expression::call(
                            "sum7",
                            (1..=7).map(Expression::Constant).collect(),
                        ),
                    },
                    Statement::Return(Some(Expression::binary(
                        BinaryOperator::Subtract,
                        Expression::var("r"),
                        Expression::Constant(28),
                    ))),
                ],
            ),
        ],
    }
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("minc-{}-{}", std::process::id(), name))
}

#[test]
fn test_seven_argument_call() {
    let text = compile(&seven_args_program(), OperatingSystem::Linux);

    let main = text
        .split(".globl main\n")
        .nth(1)
        .expect("main should be emitted");
    let lines: Vec<_> = main.lines().collect();
    let call = lines
        .iter()
        .position(|line| *line == "\tcall sum7")
        .expect("main should call sum7");

    assert_eq!(
        lines[call - 7..=call + 1].to_vec(),
        vec![
            "\tmovl $1, %edi",
            "\tmovl $2, %esi",
            "\tmovl $3, %edx",
            "\tmovl $4, %ecx",
            "\tmovl $5, %r8d",
            "\tmovl $6, %r9d",
            "\tpushq $7",
            "\tcall sum7",
            "\taddq $8, %rsp",
        ]
    );
}

#[test]
fn test_callee_reads_stack_argument() {
    let text = compile(&seven_args_program(), OperatingSystem::Linux);

    assert!(text.contains("sum7:\n\tpushq %rbp\n\tmovq %rsp, %rbp\n\tsubq $24, %rsp\n"));
    assert!(text.contains("\tmovl %r9d, -24(%rbp)\n"));
    assert!(text.contains("\tmovl 16(%rbp), %eax\n"));
    assert!(text.contains(".Lsum7_epilogue:\n\taddq $24, %rsp\n\tpopq %rbp\n\tret\n"));
}

#[test]
fn test_targets_differ_only_in_symbols_and_directives() {
    let linux = compile(&seven_args_program(), OperatingSystem::Linux);
    let macos = compile(&seven_args_program(), OperatingSystem::MacOs);

    let normalize = |text: &str| -> Vec<String> {
        text.lines()
            .filter(|line| !line.starts_with(".section"))
            .map(|line| {
                line.replace("$60", "$EXIT")
                    .replace("$33554433", "$EXIT")
                    .split(' ')
                    .map(|token| token.strip_prefix('_').unwrap_or(token))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    };

    assert_ne!(linux, macos);
    assert_eq!(normalize(&linux), normalize(&macos));
}

#[test]
fn test_output_is_deterministic() {
    for os in [OperatingSystem::Linux, OperatingSystem::MacOs] {
        assert_eq!(
            compile(&seven_args_program(), os),
            compile(&seven_args_program(), os)
        );
    }
}

#[test]
fn test_driver_writes_assembly() {
    let input = temp_path("driver.json");
    let output = temp_path("driver.s");
    fs::write(
        &input,
        serde_json::to_string(&seven_args_program()).expect("the AST should serialize"),
    )
    .expect("the input should be written");

    let opts = Options::try_parse_from([
        "minc",
        input.to_str().expect("temp paths are utf-8"),
        "-o",
        output.to_str().expect("temp paths are utf-8"),
        "--target-os",
        "linux",
    ])
    .expect("the arguments should be accepted");

    driver::run(&opts).expect("the driver should succeed");

    let written = fs::read_to_string(&output).expect("the assembly should be written");
    fs::remove_file(&input).expect("the input should be removable");
    fs::remove_file(&output).expect("the output should be removable");

    assert_eq!(written, compile(&seven_args_program(), OperatingSystem::Linux));
}

#[test]
fn test_driver_reports_internal_errors() {
    let input = temp_path("internal.json");
    let output = temp_path("internal.s");
    let program = Program {
        declarations: vec![function(
            "main",
            0,
            vec![Statement::Return(Some(Expression::var("missing")))],
        )],
    };
    fs::write(
        &input,
        serde_json::to_string(&program).expect("the AST should serialize"),
    )
    .expect("the input should be written");

    let opts = Options::try_parse_from([
        "minc",
        input.to_str().expect("temp paths are utf-8"),
        "-o",
        output.to_str().expect("temp paths are utf-8"),
    ])
    .expect("the arguments should be accepted");

    let err = driver::run(&opts).expect_err("the variable is not declared");
    fs::remove_file(&input).expect("the input should be removable");

    assert!(err.is_internal());
    assert!(!output.exists());
}

#[test]
fn test_driver_reports_output_errors() {
    let input = temp_path("output.json");
    fs::write(
        &input,
        serde_json::to_string(&seven_args_program()).expect("the AST should serialize"),
    )
    .expect("the input should be written");
    let output = temp_path("missing-dir").join("out.s");

    let opts = Options::try_parse_from([
        "minc",
        input.to_str().expect("temp paths are utf-8"),
        "-o",
        output.to_str().expect("temp paths are utf-8"),
    ])
    .expect("the arguments should be accepted");

    let err = driver::run(&opts).expect_err("the output directory does not exist");
    fs::remove_file(&input).expect("the input should be removable");

    assert!(!err.is_internal());
    assert!(matches!(err, DriverError::Emit(_)));
    assert!(err.to_string().contains("out.s"));
}
