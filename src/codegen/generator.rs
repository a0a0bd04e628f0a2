use std::{collections::HashMap, marker::PhantomData};

use inkwell::{
    basic_block::BasicBlock,
    builder::Builder,
    context::Context,
    module::{Linkage, Module},
    targets::{TargetData, TargetTriple},
    values::{
        BasicMetadataValueEnum, BasicValue, BasicValueEnum, FloatValue, FunctionValue, IntValue,
        PointerValue,
    },
    AddressSpace,
};
use tracing::{debug, instrument, trace};

use crate::{
    ast::{ElifArm, Expr, ExprVisitor, FnDecl, Primitive, Stmt, StmtVisitor, TypeDescriptor},
    codegen::{
        target,
        types::{FBinOp, FCmpPred, FnType, Type},
        Fault,
    },
    environment::Environment,
    token::{Token, TokenKind},
};

type Result<T, E = Fault> = std::result::Result<T, E>;

/// An LLVM value along with its kel type. `llvm` is `None` only for `void`.
#[derive(Clone, Debug)]
pub struct Value<'ctx> {
    ty: Type,
    llvm: Option<BasicValueEnum<'ctx>>,
}

impl<'ctx> Value<'ctx> {
    fn new(ty: Type, llvm: impl BasicValue<'ctx>) -> Value<'ctx> {
        Value {
            ty,
            llvm: Some(llvm.as_basic_value_enum()),
        }
    }

    fn void() -> Value<'ctx> {
        Value {
            ty: Type::Void,
            llvm: None,
        }
    }

    fn basic(&self) -> Result<BasicValueEnum<'ctx>> {
        self.llvm.ok_or(Fault::VoidValue)
    }

    fn float(&self) -> Result<FloatValue<'ctx>> {
        Ok(self.basic()?.into_float_value())
    }

    fn int(&self) -> Result<IntValue<'ctx>> {
        Ok(self.basic()?.into_int_value())
    }

    fn pointer(&self) -> Result<PointerValue<'ctx>> {
        Ok(self.basic()?.into_pointer_value())
    }

    fn is_constant(&self) -> bool {
        match self.llvm {
            Some(BasicValueEnum::FloatValue(v)) => v.is_const(),
            Some(BasicValueEnum::IntValue(v)) => v.is_const(),
            Some(BasicValueEnum::PointerValue(v)) => v.is_const(),
            Some(BasicValueEnum::ArrayValue(v)) => v.is_const(),
            _ => false,
        }
    }
}

/// What a name resolves to while lowering.
#[derive(Clone, Debug)]
enum Binding<'ctx> {
    /// Address of a module level variable.
    Global(Value<'ctx>),
    /// Address of a stack slot.
    Local {
        ptr: Value<'ctx>,
        owner: FunctionValue<'ctx>,
    },
    /// A parameter, already in value form.
    Argument {
        value: Value<'ctx>,
        owner: FunctionValue<'ctx>,
    },
    Function(Value<'ctx>),
}

/// Lowers a parsed program to an LLVM [`Module`] for the target `E`.
pub struct Generator<'ctx, E> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: Builder<'ctx>,
    env: Environment<Binding<'ctx>>,
    /// Zero at the top level.
    depth: usize,
    /// Set while lowering the operand of `&`.
    address_of: bool,
    /// Return types of the functions being lowered, innermost last.
    returns: Vec<Type>,
    printf: Value<'ctx>,
    formats: HashMap<&'static str, PointerValue<'ctx>>,
    _env: PhantomData<E>,
}

impl<'ctx, E> Generator<'ctx, E>
where
    E: target::Env,
{
    pub fn new(context: &'ctx Context, module_name: &str) -> Generator<'ctx, E> {
        let module = context.create_module(module_name);
        module.set_triple(&TargetTriple::create(E::TRIPLE));
        module.set_data_layout(&TargetData::create(E::DATA_LAYOUT).get_data_layout());

        let ptr = context.i8_type().ptr_type(AddressSpace::default());
        let printf_fn = module.add_function(
            "printf",
            context.i32_type().fn_type(&[ptr.into()], true),
            Some(Linkage::External),
        );
        let printf = Value::new(
            Type::ptr_to(Type::Function(Box::new(FnType {
                ret: Type::I32,
                params: vec![Type::ptr_to(Type::I8)],
                variadic: true,
            }))),
            printf_fn.as_global_value().as_pointer_value(),
        );
        let mut env = Environment::new();
        env.bind("printf", Binding::Function(printf.clone()));

        Generator {
            context,
            module,
            builder: context.create_builder(),
            env,
            depth: 0,
            address_of: false,
            returns: Vec::new(),
            printf,
            formats: HashMap::new(),
            _env: PhantomData,
        }
    }

    /// Lowers every top-level statement in order. The first fault aborts the
    /// whole run.
    #[instrument(level = "debug", skip_all, fields(stmts = stmts.len()))]
    pub fn lower(mut self, stmts: &[Stmt<'_>]) -> Result<Module<'ctx>> {
        for stmt in stmts {
            trace!(?stmt, "lowering");
            stmt.accept(&mut self)?;
        }
        debug!(
            globals = self.module.get_globals().count(),
            functions = self.module.get_functions().count(),
            "lowered"
        );
        Ok(self.module)
    }
}

impl<'src, 'ctx, E> StmtVisitor<'src> for Generator<'ctx, E>
where
    E: target::Env,
{
    type Output = Result<()>;

    fn visit_block(&mut self, body: &[Stmt<'src>]) -> Result<()> {
        self.env.push();
        self.depth += 1;
        let result = self.lower_stmts(body);
        self.depth -= 1;
        self.env.pop();
        result
    }

    fn visit_var(
        &mut self,
        name: &Token<'src>,
        ty: &TypeDescriptor<'src>,
        initializer: Option<&Expr<'src>>,
    ) -> Result<()> {
        let value = initializer
            .map(|init| self.lower_initializer(name, init))
            .transpose()?;
        let ty = match &value {
            Some(value) if ty.is_auto() => value.ty.clone(),
            _ => resolve_type(ty)?,
        };
        let Some(llvm_ty) = ty.basic(self.context) else {
            return Err(Fault::VoidVariable(name.lexeme.to_owned()));
        };
        if let Some(value) = &value {
            expect_type(&ty, value)?;
        }

        if self.depth == 0 {
            let init = match &value {
                Some(value) if !value.is_constant() => {
                    return Err(Fault::NonConstantGlobal(name.lexeme.to_owned()));
                }
                Some(value) => value.basic()?,
                None => ty
                    .zero(self.context)
                    .ok_or_else(|| Fault::VoidVariable(name.lexeme.to_owned()))?,
            };
            let global = self.module.add_global(llvm_ty, None, name.lexeme);
            global.set_initializer(&init);
            let ptr = Value::new(Type::ptr_to(ty), global.as_pointer_value());
            self.env.bind(name.lexeme, Binding::Global(ptr));
        } else {
            let owner = self.current_function()?;
            let slot = self.at()?.build_alloca(llvm_ty, name.lexeme)?;
            if let Some(value) = value {
                self.at()?.build_store(slot, value.basic()?)?;
            }
            let ptr = Value::new(Type::ptr_to(ty), slot);
            self.env.bind(name.lexeme, Binding::Local { ptr, owner });
        }
        Ok(())
    }

    fn visit_fn(&mut self, decl: &FnDecl<'src>) -> Result<()> {
        let ret = resolve_type(&decl.return_ty)?;
        let params = decl
            .params
            .iter()
            .map(|param| resolve_type(&param.ty))
            .collect::<Result<Vec<_>>>()?;
        if let Some((param, _)) = decl
            .params
            .iter()
            .zip(&params)
            .find(|(_, ty)| **ty == Type::Void)
        {
            return Err(Fault::VoidVariable(param.name.lexeme.to_owned()));
        }
        let sig = FnType {
            ret: ret.clone(),
            params: params.clone(),
            variadic: false,
        };
        let fn_ty = sig
            .llvm(self.context)
            .ok_or_else(|| Fault::UnresolvedType(decl.name.lexeme.to_owned()))?;

        let func = self.module.add_function(decl.name.lexeme, fn_ty, None);
        for (param, value) in decl.params.iter().zip(func.get_param_iter()) {
            value.set_name(param.name.lexeme);
        }
        let value = Value::new(
            Type::ptr_to(Type::Function(Box::new(sig))),
            func.as_global_value().as_pointer_value(),
        );
        self.env.bind(decl.name.lexeme, Binding::Function(value));

        // Declarations nested in a function are hoisted to the module, so the
        // enclosing insertion point must survive.
        let saved = self.builder.get_insert_block();
        let entry = self.context.append_basic_block(func, "entry");
        self.builder.position_at_end(entry);
        self.returns.push(ret);

        self.env.push();
        for ((param, ty), value) in decl.params.iter().zip(params).zip(func.get_param_iter()) {
            let value = Value::new(ty, value);
            self.env
                .bind(param.name.lexeme, Binding::Argument { value, owner: func });
        }
        let result = decl
            .body
            .accept(self)
            .and_then(|()| self.finish_function());
        self.env.pop();

        self.returns.pop();
        match saved {
            Some(block) => self.builder.position_at_end(block),
            None => self.builder.clear_insertion_position(),
        }
        result
    }

    fn visit_print(&mut self, expr: &Expr<'src>) -> Result<()> {
        let value = expr.accept(self)?;
        let (format, arg) = match &value.ty {
            Type::Double => ("%f\n", value.basic()?),
            Type::Ptr(pointee) if **pointee == Type::I8 => ("%s\n", value.basic()?),
            Type::I8 => ("%c\n", self.widen(&value)?),
            Type::I1 => ("%d\n", self.widen(&value)?),
            other => return Err(Fault::Unprintable(other.clone())),
        };
        let format = self.format_string(format);
        let printf = self.printf.clone();
        let ty = printf
            .ty
            .fn_type()
            .cloned()
            .ok_or_else(|| Fault::NotCallable("printf".to_owned()))?;
        self.build_call(&printf, &ty, &[format, arg], "print")?;
        Ok(())
    }

    fn visit_expression(&mut self, expr: &Expr<'src>) -> Result<()> {
        expr.accept(self)?;
        Ok(())
    }

    fn visit_return(&mut self, expr: Option<&Expr<'src>>) -> Result<()> {
        self.current_function()?;
        let expected = self.returns.last().cloned().ok_or(Fault::NoInsertionPoint)?;
        let value = expr.map(|expr| expr.accept(self)).transpose()?;
        let found = value.as_ref().map_or(Type::Void, |v| v.ty.clone());
        if found != expected {
            return Err(Fault::TypeMismatch { expected, found });
        }
        let value = value.and_then(|v| v.llvm);
        self.terminator()?
            .build_return(value.as_ref().map(|v| v as &dyn BasicValue<'ctx>))?;
        Ok(())
    }

    fn visit_if(
        &mut self,
        condition: &Expr<'src>,
        then_block: &Stmt<'src>,
        elifs: &[ElifArm<'src>],
        else_block: Option<&Stmt<'src>>,
    ) -> Result<()> {
        let cond = self.lower_condition(condition)?;
        let func = self.current_function()?;

        let then_bb = self.context.append_basic_block(func, "then");
        let elif_bbs: Vec<_> = elifs
            .iter()
            .map(|_| {
                let test = self.context.append_basic_block(func, "elif.cond");
                let body = self.context.append_basic_block(func, "elif.then");
                (test, body)
            })
            .collect();
        let else_bb = else_block.map(|_| self.context.append_basic_block(func, "else"));
        let merge_bb = self.context.append_basic_block(func, "merge");

        // Where control goes when the arm at index `i` doesn't match.
        let next_after = |i: usize| {
            elif_bbs
                .get(i)
                .map(|(test, _)| *test)
                .or(else_bb)
                .unwrap_or(merge_bb)
        };

        self.terminator()?
            .build_conditional_branch(cond, then_bb, next_after(0))?;
        self.lower_arm(then_bb, then_block, merge_bb)?;

        for (i, (arm, &(test_bb, body_bb))) in elifs.iter().zip(&elif_bbs).enumerate() {
            self.builder.position_at_end(test_bb);
            let cond = self.lower_condition(&arm.condition)?;
            self.terminator()?
                .build_conditional_branch(cond, body_bb, next_after(i + 1))?;
            self.lower_arm(body_bb, &arm.block, merge_bb)?;
        }

        if let (Some(else_bb), Some(else_block)) = (else_bb, else_block) {
            self.lower_arm(else_bb, else_block, merge_bb)?;
        }

        self.builder.position_at_end(merge_bb);
        Ok(())
    }
}

impl<'src, 'ctx, E> ExprVisitor<'src> for Generator<'ctx, E>
where
    E: target::Env,
{
    type Output = Result<Value<'ctx>>;

    fn visit_number(&mut self, value: f64) -> Result<Value<'ctx>> {
        Ok(self.double(value))
    }

    fn visit_string(&mut self, value: &str) -> Result<Value<'ctx>> {
        let string = Type::ptr_to(Type::I8);
        if self.depth == 0 {
            return Ok(Value::new(string, self.add_c_string(value.as_bytes())));
        }
        let bytes = self.context.const_string(value.as_bytes(), true);
        let slot = self.at()?.build_alloca(bytes.get_type(), "str")?;
        self.at()?.build_store(slot, bytes)?;
        Ok(Value::new(string, slot))
    }

    fn visit_char(&mut self, value: u8) -> Result<Value<'ctx>> {
        let value = self.context.i8_type().const_int(u64::from(value), false);
        Ok(Value::new(Type::I8, value))
    }

    fn visit_bool(&mut self, value: bool) -> Result<Value<'ctx>> {
        Ok(self.bool(value))
    }

    fn visit_identifier(&mut self, name: &Token<'src>) -> Result<Value<'ctx>> {
        let binding = self
            .env
            .get(name.lexeme)
            .cloned()
            .ok_or_else(|| Fault::Undefined(name.lexeme.to_owned()))?;
        match binding {
            Binding::Function(value) => Ok(value),
            Binding::Argument { value, owner } => {
                self.check_owner(name, owner)?;
                if self.address_of {
                    return Err(Fault::NotAddressable(name.lexeme.to_owned()));
                }
                Ok(value)
            }
            Binding::Global(ptr) => self.read(name, ptr),
            Binding::Local { ptr, owner } => {
                self.check_owner(name, owner)?;
                self.read(name, ptr)
            }
        }
    }

    fn visit_binary(
        &mut self,
        lhs: &Expr<'src>,
        op: &Token<'src>,
        rhs: &Expr<'src>,
    ) -> Result<Value<'ctx>> {
        let lhs = lhs.accept(self)?;
        let rhs = rhs.accept(self)?;
        expect_type(&Type::Double, &lhs)?;
        expect_type(&Type::Double, &rhs)?;
        let (lhs, rhs) = (lhs.float()?, rhs.float()?);

        match op.kind {
            TokenKind::Plus => self.arith(FBinOp::Add, lhs, rhs),
            TokenKind::Minus => self.arith(FBinOp::Sub, lhs, rhs),
            TokenKind::Star => self.arith(FBinOp::Mul, lhs, rhs),
            TokenKind::Slash => self.arith(FBinOp::Div, lhs, rhs),
            TokenKind::Less => self.compare(FCmpPred::Olt, lhs, rhs),
            TokenKind::LessEq => self.compare(FCmpPred::Ole, lhs, rhs),
            TokenKind::Greater => self.compare(FCmpPred::Ogt, lhs, rhs),
            TokenKind::GreaterEq => self.compare(FCmpPred::Oge, lhs, rhs),
            TokenKind::EqualEqual => self.compare(FCmpPred::Ueq, lhs, rhs),
            TokenKind::BangEqual => self.compare(FCmpPred::Une, lhs, rhs),
            _ => Err(Fault::UnhandledOperator(op.lexeme.to_owned())),
        }
    }

    fn visit_unary(&mut self, op: &Token<'src>, rhs: &Expr<'src>) -> Result<Value<'ctx>> {
        match op.kind {
            TokenKind::Minus => {
                let value = rhs.accept(self)?;
                expect_type(&Type::Double, &value)?;
                let value = value.float()?;
                if let Some((v, _)) = value.get_constant() {
                    return Ok(self.double(-v));
                }
                let neg = self.at()?.build_float_neg(value, "neg")?;
                Ok(Value::new(Type::Double, neg))
            }
            TokenKind::Bang => {
                let value = rhs.accept(self)?;
                expect_type(&Type::I1, &value)?;
                let value = value.int()?;
                if let Some(v) = value.get_zero_extended_constant() {
                    return Ok(self.bool(v == 0));
                }
                let not = self.at()?.build_not(value, "not")?;
                Ok(Value::new(Type::I1, not))
            }
            TokenKind::Ampersand => {
                if !matches!(rhs, Expr::Identifier(_)) {
                    return Err(Fault::NotAddressable(describe(rhs)));
                }
                self.address_of = true;
                let ptr = rhs.accept(self);
                self.address_of = false;
                ptr
            }
            TokenKind::Star => {
                let ptr = rhs.accept(self)?;
                let pointee = ptr
                    .ty
                    .pointee()
                    .filter(|ty| !matches!(ty, Type::Function(_)))
                    .cloned();
                let Some(pointee) = pointee else {
                    return Err(Fault::NotAPointer(ptr.ty));
                };
                self.load(pointee, &ptr, "deref")
            }
            _ => Err(Fault::UnhandledOperator(op.lexeme.to_owned())),
        }
    }

    fn visit_grouping(&mut self, inner: &Expr<'src>) -> Result<Value<'ctx>> {
        inner.accept(self)
    }

    fn visit_call(&mut self, callee: &Expr<'src>, args: &[Expr<'src>]) -> Result<Value<'ctx>> {
        let callee_value = callee.accept(self)?;
        let Some(ty) = callee_value.ty.fn_type().cloned() else {
            return Err(Fault::NotCallable(describe(callee)));
        };
        let values = args
            .iter()
            .map(|arg| arg.accept(self))
            .collect::<Result<Vec<_>>>()?;

        let arity_ok = if ty.variadic {
            values.len() >= ty.params.len()
        } else {
            values.len() == ty.params.len()
        };
        if !arity_ok {
            return Err(Fault::Arity {
                callee: describe(callee),
                expected: ty.params.len(),
                found: values.len(),
            });
        }
        for (param, value) in ty.params.iter().zip(&values) {
            expect_type(param, value)?;
        }
        if let Some(position) = values.iter().position(|v| v.ty == Type::Void) {
            return Err(Fault::VoidArgument {
                callee: describe(callee),
                position,
            });
        }

        let mut llvm_args = Vec::with_capacity(values.len());
        for (i, value) in values.iter().enumerate() {
            // Default argument promotions for the variadic tail.
            let arg = if i >= ty.params.len() && matches!(value.ty, Type::I1 | Type::I8) {
                self.widen(value)?
            } else {
                value.basic()?
            };
            llvm_args.push(arg);
        }
        self.build_call(&callee_value, &ty, &llvm_args, "call")
    }
}

impl<'ctx, E> Generator<'ctx, E>
where
    E: target::Env,
{
    fn lower_stmts(&mut self, stmts: &[Stmt<'_>]) -> Result<()> {
        for stmt in stmts {
            if self.is_terminated() {
                trace!("skipping unreachable statements");
                break;
            }
            stmt.accept(self)?;
        }
        Ok(())
    }

    /// At the top level, anything that would need an instruction is not a
    /// constant.
    fn lower_initializer(&mut self, name: &Token<'_>, init: &Expr<'_>) -> Result<Value<'ctx>> {
        match init.accept(self) {
            Err(Fault::NoInsertionPoint) if self.depth == 0 => {
                Err(Fault::NonConstantGlobal(name.lexeme.to_owned()))
            }
            other => other,
        }
    }

    fn lower_condition(&mut self, condition: &Expr<'_>) -> Result<IntValue<'ctx>> {
        let cond = condition.accept(self)?;
        expect_type(&Type::I1, &cond)?;
        cond.int()
    }

    /// Lowers one arm of an `if` into `block`, falling through to `merge`
    /// unless the arm already left the block.
    fn lower_arm(
        &mut self,
        block: BasicBlock<'ctx>,
        body: &Stmt<'_>,
        merge: BasicBlock<'ctx>,
    ) -> Result<()> {
        self.builder.position_at_end(block);
        body.accept(self)?;
        if !self.is_terminated() {
            self.terminator()?.build_unconditional_branch(merge)?;
        }
        Ok(())
    }

    /// Terminates the last block of a function whose body can fall off its
    /// end.
    fn finish_function(&mut self) -> Result<()> {
        if self.is_terminated() {
            return Ok(());
        }
        if self.returns.last() == Some(&Type::Void) {
            self.terminator()?.build_return(None)?;
        } else {
            self.terminator()?.build_unreachable()?;
        }
        Ok(())
    }

    /// The builder, as long as it points into a function.
    fn at(&self) -> Result<&Builder<'ctx>> {
        match self.builder.get_insert_block() {
            Some(_) => Ok(&self.builder),
            None => Err(Fault::NoInsertionPoint),
        }
    }

    /// The builder, as long as its block has no terminator yet.
    fn terminator(&self) -> Result<&Builder<'ctx>> {
        let block = self
            .builder
            .get_insert_block()
            .ok_or(Fault::NoInsertionPoint)?;
        if block.get_terminator().is_some() {
            let label = block.get_name().to_string_lossy().into_owned();
            return Err(Fault::AlreadyTerminated(label));
        }
        Ok(&self.builder)
    }

    fn is_terminated(&self) -> bool {
        self.builder
            .get_insert_block()
            .is_some_and(|block| block.get_terminator().is_some())
    }

    fn current_function(&self) -> Result<FunctionValue<'ctx>> {
        self.builder
            .get_insert_block()
            .and_then(|block| block.get_parent())
            .ok_or(Fault::NoInsertionPoint)
    }

    fn check_owner(&self, name: &Token<'_>, owner: FunctionValue<'ctx>) -> Result<()> {
        if self.current_function()? == owner {
            Ok(())
        } else {
            Err(Fault::CapturedLocal(name.lexeme.to_owned()))
        }
    }

    fn read(&self, name: &Token<'_>, ptr: Value<'ctx>) -> Result<Value<'ctx>> {
        if self.address_of {
            return Ok(ptr);
        }
        let Some(ty) = ptr.ty.pointee().cloned() else {
            return Err(Fault::NotAPointer(ptr.ty));
        };
        self.load(ty, &ptr, name.lexeme)
    }

    fn load(&self, ty: Type, ptr: &Value<'ctx>, name: &str) -> Result<Value<'ctx>> {
        let Some(llvm_ty) = ty.basic(self.context) else {
            return Err(Fault::NotAPointer(ptr.ty.clone()));
        };
        let value = self.at()?.build_load(llvm_ty, ptr.pointer()?, name)?;
        Ok(Value::new(ty, value))
    }

    fn arith(&self, op: FBinOp, lhs: FloatValue<'ctx>, rhs: FloatValue<'ctx>) -> Result<Value<'ctx>> {
        if let (Some((l, _)), Some((r, _))) = (lhs.get_constant(), rhs.get_constant()) {
            return Ok(self.double(op.fold(l, r)));
        }
        let b = self.at()?;
        let value = match op {
            FBinOp::Add => b.build_float_add(lhs, rhs, op.name())?,
            FBinOp::Sub => b.build_float_sub(lhs, rhs, op.name())?,
            FBinOp::Mul => b.build_float_mul(lhs, rhs, op.name())?,
            FBinOp::Div => b.build_float_div(lhs, rhs, op.name())?,
        };
        Ok(Value::new(Type::Double, value))
    }

    fn compare(
        &self,
        pred: FCmpPred,
        lhs: FloatValue<'ctx>,
        rhs: FloatValue<'ctx>,
    ) -> Result<Value<'ctx>> {
        if let (Some((l, _)), Some((r, _))) = (lhs.get_constant(), rhs.get_constant()) {
            return Ok(self.bool(pred.fold(l, r)));
        }
        let value = self
            .at()?
            .build_float_compare(pred.predicate(), lhs, rhs, pred.name())?;
        Ok(Value::new(Type::I1, value))
    }

    /// Zero extends an `i1` or `i8` to the `i32` that `printf` reads.
    fn widen(&self, value: &Value<'ctx>) -> Result<BasicValueEnum<'ctx>> {
        let wide = self
            .at()?
            .build_int_z_extend(value.int()?, self.context.i32_type(), "ext")?;
        Ok(wide.into())
    }

    fn build_call(
        &self,
        callee: &Value<'ctx>,
        ty: &FnType,
        args: &[BasicValueEnum<'ctx>],
        name: &str,
    ) -> Result<Value<'ctx>> {
        let fn_ty = ty.llvm(self.context).ok_or(Fault::VoidValue)?;
        let args: Vec<BasicMetadataValueEnum<'ctx>> = args.iter().map(|&arg| arg.into()).collect();
        // Void results cannot be named.
        let name = if ty.ret == Type::Void { "" } else { name };
        let site = self
            .at()?
            .build_indirect_call(fn_ty, callee.pointer()?, &args, name)?;
        Ok(match site.try_as_basic_value().left() {
            Some(value) => Value::new(ty.ret.clone(), value),
            None => Value::void(),
        })
    }

    fn double(&self, value: f64) -> Value<'ctx> {
        Value::new(Type::Double, self.context.f64_type().const_float(value))
    }

    fn bool(&self, value: bool) -> Value<'ctx> {
        let value = self.context.bool_type().const_int(u64::from(value), false);
        Value::new(Type::I1, value)
    }

    /// A private, null terminated byte array at module level.
    fn add_c_string(&self, bytes: &[u8]) -> PointerValue<'ctx> {
        let init = self.context.const_string(bytes, true);
        let global = self.module.add_global(init.get_type(), None, ".str");
        global.set_linkage(Linkage::Private);
        global.set_unnamed_addr(true);
        global.set_constant(true);
        global.set_initializer(&init);
        global.as_pointer_value()
    }

    fn format_string(&mut self, format: &'static str) -> BasicValueEnum<'ctx> {
        if let Some(ptr) = self.formats.get(format) {
            return (*ptr).into();
        }
        let ptr = self.add_c_string(format.as_bytes());
        self.formats.insert(format, ptr);
        ptr.into()
    }
}

fn resolve_type(ty: &TypeDescriptor<'_>) -> Result<Type> {
    let base = match ty.primitive() {
        Some(Primitive::Number) => Type::Double,
        Some(Primitive::String) => Type::ptr_to(Type::I8),
        Some(Primitive::Bool) => Type::I1,
        Some(Primitive::Char) => Type::I8,
        Some(Primitive::Void) => Type::Void,
        None => return Err(Fault::UnresolvedType(ty.name.lexeme.to_owned())),
    };
    Ok(if ty.is_pointer {
        Type::ptr_to(base)
    } else {
        base
    })
}

fn expect_type(expected: &Type, value: &Value<'_>) -> Result<()> {
    if *expected == value.ty {
        Ok(())
    } else {
        Err(Fault::TypeMismatch {
            expected: expected.clone(),
            found: value.ty.clone(),
        })
    }
}

fn describe(expr: &Expr<'_>) -> String {
    match expr {
        Expr::Identifier(name) => name.lexeme.to_owned(),
        Expr::Grouping(inner) => describe(inner),
        _ => "expression".to_owned(),
    }
}
