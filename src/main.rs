use std::{
    fs::{read_to_string, write},
    path::PathBuf,
    process::ExitCode,
    time::Instant,
};

use baasha::{
    ast::printer::print_program,
    compiler::{
        compiler::{compile, MODULE_INIT},
        ir::{Interpreter, IrBackend},
    },
    errors::errors::ErrorImpl,
    lexer::lexer::tokenize,
    parser::parser::parse,
    render_diagnostic, CompilerContext, CompilerOptions, Span,
};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "baasha")]
#[command(about = "Compiles a baasha source file", long_about = None)]
#[command(version)]
struct Args {
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Columns a tab advances the reported position by
    #[arg(long, default_value_t = 4)]
    tab_width: u32,

    /// Print the token stream
    #[arg(long)]
    dump_tokens: bool,

    /// Print the syntax tree
    #[arg(long)]
    dump_ast: bool,

    /// Write the generated IR to OUTPUT
    #[arg(long, value_name = "OUTPUT")]
    emit_ir: Option<PathBuf>,

    /// Execute the module initialiser and print every global
    #[arg(long)]
    run: bool,

    /// Write LLVM IR to OUTPUT
    #[cfg(feature = "llvm")]
    #[arg(long, value_name = "OUTPUT")]
    emit_llvm: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let file = args.input.display().to_string();
    let module_name = args
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| String::from("main"));
    let options = CompilerOptions {
        tab_width: args.tab_width,
        module_name,
    };

    let source = match read_to_string(&args.input) {
        Ok(source) => source,
        Err(err) => {
            let mut context = CompilerContext::with_options("", Some(file), options);
            context.diagnostics.crash(
                ErrorImpl::FileUnreadable {
                    path: args.input.display().to_string(),
                    reason: err.to_string(),
                },
                Span::default(),
            );
            report(&context);
            return ExitCode::FAILURE;
        }
    };

    let mut context = CompilerContext::with_options(source, Some(file), options);
    let start = Instant::now();

    let tokens = tokenize(&mut context);
    debug!(tokens = tokens.len(), elapsed = ?start.elapsed(), "tokenized");
    if args.dump_tokens {
        for token in tokens.iter() {
            println!("{}", token.debug());
        }
    }

    let parse_start = Instant::now();
    let program = parse(tokens, &mut context);
    debug!(statements = program.len(), elapsed = ?parse_start.elapsed(), "parsed");
    if args.dump_ast {
        println!("{}", print_program(&program));
    }

    let compile_start = Instant::now();
    let backend = IrBackend::new(&context.options.module_name);
    let backend = compile(&program, &mut context, backend);
    debug!(elapsed = ?compile_start.elapsed(), "generated IR");
    info!(
        errors = context.diagnostics.error_count(),
        warnings = context.diagnostics.warning_count(),
        elapsed = ?start.elapsed(),
        "compiled {}",
        context.file
    );

    report(&context);
    if context.diagnostics.has_errors() {
        return ExitCode::FAILURE;
    }

    let module = backend.into_module();

    if let Some(path) = &args.emit_ir {
        if let Err(err) = write(path, module.to_string()) {
            eprintln!("couldn't write {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    }

    #[cfg(feature = "llvm")]
    if let Some(path) = &args.emit_llvm {
        if let Err(err) = emit_llvm(&program, &context, path) {
            eprintln!("couldn't write {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    }

    if args.run {
        let mut interpreter = Interpreter::new(&module);
        if let Err(err) = interpreter.call(MODULE_INIT, vec![]) {
            eprintln!("runtime error: {}", err);
            return ExitCode::FAILURE;
        }
        debug!(steps = interpreter.steps(), "module initialiser finished");

        for (name, value) in interpreter.globals() {
            println!("{} = {}", name, value);
        }
    }

    if !wrote_anything(&args) {
        print!("{}", module);
    }

    ExitCode::SUCCESS
}

fn wrote_anything(args: &Args) -> bool {
    #[cfg(feature = "llvm")]
    let llvm = args.emit_llvm.is_some();
    #[cfg(not(feature = "llvm"))]
    let llvm = false;

    args.dump_tokens || args.dump_ast || args.emit_ir.is_some() || args.run || llvm
}

fn report(context: &CompilerContext) {
    for error in context.diagnostics.iter() {
        eprint!("{}", render_diagnostic(error, &context.source, &context.file));
    }
}

/// Runs code generation a second time into LLVM. Diagnostics were already
/// reported by the IR pass, so this pass gets a context of its own.
#[cfg(feature = "llvm")]
fn emit_llvm(
    program: &[baasha::ast::ast::Stmt],
    context: &CompilerContext,
    path: &std::path::Path,
) -> Result<(), String> {
    use baasha::compiler::llvm::LlvmBackend;
    use inkwell::context::Context;

    let llvm = Context::create();
    let mut shadow = CompilerContext::with_options(
        context.source.as_str(),
        Some(context.file.to_string()),
        context.options.clone(),
    );
    let backend = compile(
        program,
        &mut shadow,
        LlvmBackend::new(&llvm, &context.options.module_name),
    );
    backend.save_module_to_file(path)
}
