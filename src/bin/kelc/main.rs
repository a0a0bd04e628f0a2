use std::{
    fmt::Display,
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use kel::{
    codegen, interpreter::Interpreter, lexer, parser, token::Positioned, util::fmt::tree,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod target;

/// Compiles kel source into LLVM assembly.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Source file. Starts a REPL when omitted.
    file: Option<PathBuf>,

    /// Where to write the artifact. Defaults to stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Emit::Ir)]
    emit: Emit,

    #[arg(long, value_enum, default_value_t = target::Target::from(codegen::DEFAULT_TARGET))]
    target: target::Target,

    /// Defaults to the source file stem.
    #[arg(long)]
    module_name: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
enum Emit {
    Tokens,
    Ast,
    Ir,
    Run,
}

#[derive(Debug, thiserror::Error)]
enum Failure {
    /// Front end diagnostics, already reported.
    #[error("front end had errors")]
    Diagnostics,

    #[error("code generation failed: {0}")]
    Fault(#[from] codegen::Fault),

    #[error("runtime error: {0}")]
    Runtime(#[from] kel::interpreter::Error),

    #[error("failed to run: {0}")]
    Io(#[from] io::Error),
}

impl Failure {
    fn report(&self) {
        if !matches!(self, Failure::Diagnostics) {
            eprintln!("{self}");
        }
    }

    fn exit_code(&self) -> ExitCode {
        match self {
            Failure::Diagnostics | Failure::Io(_) => ExitCode::from(1),
            Failure::Fault(_) | Failure::Runtime(_) => ExitCode::from(2),
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let result = match &args.file {
        Some(path) => compile_file(&args, path),
        None => repl(&args),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            failure.report();
            failure.exit_code()
        }
    }
}

fn compile_file(args: &Args, path: &Path) -> Result<(), Failure> {
    let src = fs::read_to_string(path)?;
    let module_name = args.module_name.clone().unwrap_or_else(|| {
        path.file_stem()
            .map_or_else(|| "main".to_owned(), |s| s.to_string_lossy().into_owned())
    });
    debug!(?path, %module_name, "compiling");

    let mut out: Box<dyn Write> = match &args.output {
        Some(output) => Box::new(io::BufWriter::new(fs::File::create(output)?)),
        None => Box::new(io::stdout().lock()),
    };
    process(args, &src, module_name, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Processes one line at a time. Errors are reported and the session goes on.
fn repl(args: &Args) -> Result<(), Failure> {
    let mut input = String::new();
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        input.clear();
        let n = stdin.lock().read_line(&mut input)?;
        if n == 0 {
            println!("^D");
            return Ok(());
        }

        let module_name = args.module_name.clone().unwrap_or_else(|| "repl".to_owned());
        let mut out = io::stdout().lock();
        match process(args, &input, module_name, &mut out) {
            Ok(()) | Err(Failure::Diagnostics) => {}
            Err(Failure::Io(error)) => return Err(Failure::Io(error)),
            Err(failure) => failure.report(),
        }
    }
}

fn process(
    args: &Args,
    src: &str,
    module_name: String,
    out: &mut impl Write,
) -> Result<(), Failure> {
    let lexed = lexer::lex(src);
    if args.emit == Emit::Tokens {
        for token in &lexed.tokens {
            writeln!(out, "{token:?}")?;
        }
    }
    if lexed.had_error {
        report("scanner had errors:", &lexed.errors);
        return Err(Failure::Diagnostics);
    }
    if args.emit == Emit::Tokens {
        return Ok(());
    }

    let parsed = parser::parse(&lexed.tokens);
    if parsed.had_error {
        report("parser had errors:", &parsed.errors);
        return Err(Failure::Diagnostics);
    }

    match args.emit {
        Emit::Tokens => {}
        Emit::Ast => out.write_all(tree::print_program_string(&parsed.stmts).as_bytes())?,
        Emit::Ir => {
            let options = codegen::Options {
                module_name,
                target: args.target.into(),
            };
            let module = codegen::generate(&parsed.stmts, &options)?;
            out.write_all(module.as_bytes())?;
        }
        Emit::Run => {
            let mut interpreter = Interpreter::new(out);
            interpreter.run(&parsed.stmts)?;
        }
    }
    Ok(())
}

fn report<E: Display>(header: &str, errors: &[Positioned<E>]) {
    eprintln!("{header}");
    for error in errors {
        eprintln!("{error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages_and_exit_codes() {
        let io: Failure = io::Error::new(io::ErrorKind::NotFound, "no such file").into();
        assert_eq!(io.to_string(), "failed to run: no such file");
        assert_eq!(io.exit_code(), ExitCode::from(1));

        let fault: Failure = codegen::Fault::Undefined("y".to_owned()).into();
        assert!(fault.to_string().starts_with("code generation failed: "));
        assert_eq!(fault.exit_code(), ExitCode::from(2));

        assert_eq!(Failure::Diagnostics.exit_code(), ExitCode::from(1));
    }
}
