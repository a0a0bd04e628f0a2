use tracing::{debug, instrument};

/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The code generator lowers an AST into an LLVM module.
pub mod codegen;

/// The interpreter runs an AST directly.
pub mod interpreter;

pub mod ast;
pub mod environment;
pub mod token;

pub mod util {
    pub mod fmt {
        pub mod tree;
    }
    #[cfg(test)]
    pub(crate) mod test_utils;
}

use token::Positioned;

/// Errors of each pipeline phase. Front end phases report every diagnostic
/// they found.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("scanner had errors")]
    Lex(Vec<Positioned<lexer::Error>>),

    #[error("parser had errors")]
    Parse(Vec<Positioned<parser::Error>>),

    #[error("code generation failed: {0}")]
    CodeGen(#[from] codegen::Fault),
}

/// Runs the whole pipeline over `src`, returning the rendered module.
#[instrument(level = "debug", skip_all, fields(len = src.len()))]
pub fn compile(src: &str, options: &codegen::Options) -> Result<String, CompileError> {
    let lexed = lexer::lex(src);
    if lexed.had_error {
        return Err(CompileError::Lex(lexed.errors));
    }
    let parsed = parser::parse(&lexed.tokens);
    if parsed.had_error {
        return Err(CompileError::Parse(parsed.errors));
    }
    let module = codegen::generate(&parsed.stmts, options)?;
    debug!(bytes = module.len(), "compiled");
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_reports_each_phase() {
        let options = codegen::Options::default();

        let text = compile("fn main() { let x = 1; }", &options).unwrap();
        assert!(text.contains("define void @main()"));

        let Err(CompileError::Lex(errors)) = compile("let s = \"open;", &options) else {
            panic!("expected lexer errors");
        };
        assert_eq!(errors.len(), 1);

        let Err(CompileError::Parse(errors)) = compile("let ;", &options) else {
            panic!("expected parser errors");
        };
        assert_eq!(
            errors[0].to_string(),
            "error: near line [1]. cause: expected identifier, but got semi_colon"
        );

        let Err(CompileError::CodeGen(fault)) = compile("let x = y;", &options) else {
            panic!("expected a fault");
        };
        assert_eq!(fault, codegen::Fault::Undefined("y".to_owned()));
    }

    #[test]
    fn test_compile_bench_input() {
        let src = include_str!("../bench/data/big.kel");
        let text = compile(src, &codegen::Options::default()).unwrap();
        assert_eq!(text.matches("\ndefine double @poly_").count(), 60);
        assert!(text.contains("@initial = global i8 107"));
    }
}
