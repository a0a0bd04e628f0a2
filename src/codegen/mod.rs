//! Lowering of the AST to an LLVM module.

use inkwell::{builder::BuilderError, context::Context, module::Module};
use tracing::instrument;

use crate::ast::Stmt;

mod generator;
pub mod target;
pub mod types;

pub use generator::Generator;
pub use target::{Target, DEFAULT_TARGET};

pub type DarwinGenerator<'ctx> = Generator<'ctx, target::Darwin>;
pub type LinuxGenerator<'ctx> = Generator<'ctx, target::Linux>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Options {
    /// Written as the `ModuleID` and `source_filename`.
    pub module_name: String,
    pub target: Target,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            module_name: "main".to_owned(),
            target: DEFAULT_TARGET,
        }
    }
}

/// Lowers `stmts` into a module for `options.target`, owned by `context`.
#[instrument(level = "debug", skip_all, fields(module = %options.module_name, target = %options.target))]
pub fn lower<'ctx>(
    context: &'ctx Context,
    stmts: &[Stmt<'_>],
    options: &Options,
) -> Result<Module<'ctx>, Fault> {
    match options.target {
        Target::x86_64_darwin => DarwinGenerator::new(context, &options.module_name).lower(stmts),
        Target::x86_64_linux => LinuxGenerator::new(context, &options.module_name).lower(stmts),
    }
}

/// Lowers `stmts`, verifies the module and renders it as LLVM assembly.
pub fn generate(stmts: &[Stmt<'_>], options: &Options) -> Result<String, Fault> {
    let context = Context::create();
    let module = lower(&context, stmts, options)?;
    module
        .verify()
        .map_err(|message| Fault::Invalid(message.to_string()))?;
    Ok(module.print_to_string().to_string())
}

/// A fatal code generation error.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum Fault {
    #[error("undefined name '{0}'")]
    Undefined(String),

    #[error("unhandled operator '{0}'")]
    UnhandledOperator(String),

    #[error("unresolved type '{0}'")]
    UnresolvedType(String),

    #[error("'{0}' is not callable")]
    NotCallable(String),

    #[error("initializer of global '{0}' is not a constant")]
    NonConstantGlobal(String),

    #[error("cannot take the address of '{0}'")]
    NotAddressable(String),

    #[error("cannot dereference a value of type {0}")]
    NotAPointer(types::Type),

    #[error("'{0}' belongs to another function")]
    CapturedLocal(String),

    #[error("mismatched types: expected {expected}, found {found}")]
    TypeMismatch { expected: types::Type, found: types::Type },

    #[error("'{callee}' takes {expected} argument(s), but {found} were supplied")]
    Arity {
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("cannot print a value of type {0}")]
    Unprintable(types::Type),

    #[error("variable '{0}' cannot hold void")]
    VoidVariable(String),

    #[error("a void value cannot be used as an operand")]
    VoidValue,

    #[error("argument {position} of '{callee}' is void")]
    VoidArgument { callee: String, position: usize },

    #[error("code outside of a function")]
    NoInsertionPoint,

    #[error("block '{0}' is already terminated")]
    AlreadyTerminated(String),

    #[error("invalid module: {0}")]
    Invalid(String),

    #[error(transparent)]
    Build(#[from] BuilderError),
}
