//! kel's view of LLVM types.
//!
//! LLVM pointers are opaque, so `Ptr` keeps its pointee here for loads and
//! calls. Values print with the LLVM type names.

use std::fmt;

use inkwell::{
    context::Context,
    types::{BasicMetadataTypeEnum, BasicType, BasicTypeEnum, FunctionType},
    values::BasicValueEnum,
    AddressSpace, FloatPredicate,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Void,
    I1,
    I8,
    I32,
    Double,
    Ptr(Box<Type>),
    Function(Box<FnType>),
}

impl Type {
    pub fn ptr_to(pointee: Type) -> Type {
        Type::Ptr(Box::new(pointee))
    }

    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Ptr(pointee) => Some(pointee),
            _ => None,
        }
    }

    /// The signature of the function this value points to, if any.
    pub fn fn_type(&self) -> Option<&FnType> {
        match self.pointee()? {
            Type::Function(ty) => Some(ty),
            _ => None,
        }
    }

    /// `None` for `void` and bare function types, which have no first class
    /// LLVM representation.
    pub fn basic<'ctx>(&self, context: &'ctx Context) -> Option<BasicTypeEnum<'ctx>> {
        let ty = match self {
            Type::Void | Type::Function(_) => return None,
            Type::I1 => context.bool_type().into(),
            Type::I8 => context.i8_type().into(),
            Type::I32 => context.i32_type().into(),
            Type::Double => context.f64_type().into(),
            Type::Ptr(_) => context.i8_type().ptr_type(AddressSpace::default()).into(),
        };
        Some(ty)
    }

    pub fn zero<'ctx>(&self, context: &'ctx Context) -> Option<BasicValueEnum<'ctx>> {
        let zero = match self.basic(context)? {
            BasicTypeEnum::FloatType(ty) => ty.const_float(0.0).into(),
            BasicTypeEnum::IntType(ty) => ty.const_zero().into(),
            BasicTypeEnum::PointerType(ty) => ty.const_null().into(),
            _ => return None,
        };
        Some(zero)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Void => f.write_str("void"),
            Type::I1 => f.write_str("i1"),
            Type::I8 => f.write_str("i8"),
            Type::I32 => f.write_str("i32"),
            Type::Double => f.write_str("double"),
            Type::Ptr(_) => f.write_str("ptr"),
            Type::Function(ty) => {
                write!(f, "{} (", ty.ret)?;
                for (i, param) in ty.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{param}")?;
                }
                if ty.variadic {
                    f.write_str(if ty.params.is_empty() { "..." } else { ", ..." })?;
                }
                f.write_str(")")
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FnType {
    pub ret: Type,
    pub params: Vec<Type>,
    pub variadic: bool,
}

impl FnType {
    /// `None` when a parameter has no first class representation.
    pub fn llvm<'ctx>(&self, context: &'ctx Context) -> Option<FunctionType<'ctx>> {
        let params = self
            .params
            .iter()
            .map(|param| param.basic(context).map(BasicMetadataTypeEnum::from))
            .collect::<Option<Vec<_>>>()?;
        let ty = match self.ret.basic(context) {
            Some(ret) => ret.fn_type(&params, self.variadic),
            None => context.void_type().fn_type(&params, self.variadic),
        };
        Some(ty)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FBinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl FBinOp {
    pub fn fold(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            FBinOp::Add => lhs + rhs,
            FBinOp::Sub => lhs - rhs,
            FBinOp::Mul => lhs * rhs,
            FBinOp::Div => lhs / rhs,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FBinOp::Add => "add",
            FBinOp::Sub => "sub",
            FBinOp::Mul => "mul",
            FBinOp::Div => "div",
        }
    }
}

/// Float comparison predicates. `O*` are false when either operand is NaN,
/// `U*` are true.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FCmpPred {
    Olt,
    Ole,
    Ogt,
    Oge,
    Ueq,
    Une,
}

impl FCmpPred {
    pub fn fold(self, lhs: f64, rhs: f64) -> bool {
        let unordered = lhs.is_nan() || rhs.is_nan();
        match self {
            FCmpPred::Olt => lhs < rhs,
            FCmpPred::Ole => lhs <= rhs,
            FCmpPred::Ogt => lhs > rhs,
            FCmpPred::Oge => lhs >= rhs,
            FCmpPred::Ueq => unordered || lhs == rhs,
            FCmpPred::Une => unordered || lhs != rhs,
        }
    }

    pub fn predicate(self) -> FloatPredicate {
        match self {
            FCmpPred::Olt => FloatPredicate::OLT,
            FCmpPred::Ole => FloatPredicate::OLE,
            FCmpPred::Ogt => FloatPredicate::OGT,
            FCmpPred::Oge => FloatPredicate::OGE,
            FCmpPred::Ueq => FloatPredicate::UEQ,
            FCmpPred::Une => FloatPredicate::UNE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FCmpPred::Olt => "lt",
            FCmpPred::Ole => "le",
            FCmpPred::Ogt => "gt",
            FCmpPred::Oge => "ge",
            FCmpPred::Ueq => "eq",
            FCmpPred::Une => "ne",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_nan_comparisons() {
        let nan = f64::NAN;
        assert!(FCmpPred::Ueq.fold(nan, 1.0));
        assert!(FCmpPred::Une.fold(nan, nan));
        assert!(!FCmpPred::Olt.fold(nan, 1.0));
        assert!(!FCmpPred::Oge.fold(1.0, nan));
        assert!(FCmpPred::Ole.fold(1.0, 1.0));
        assert_eq!(FBinOp::Div.fold(1.0, 4.0), 0.25);
    }

    #[test]
    fn test_type_display() {
        let printf = Type::Function(Box::new(FnType {
            ret: Type::I32,
            params: vec![Type::ptr_to(Type::I8)],
            variadic: true,
        }));
        assert_eq!(printf.to_string(), "i32 (ptr, ...)");
        assert_eq!(Type::ptr_to(printf).fn_type().map(|ty| ty.params.len()), Some(1));
        assert_eq!(Type::Double.pointee(), None);
    }

    #[test]
    fn test_llvm_mapping() {
        let context = Context::create();
        assert_eq!(Type::Void.basic(&context), None);
        assert_eq!(
            Type::Double.basic(&context),
            Some(context.f64_type().as_basic_type_enum())
        );
        let zero = Type::I1.zero(&context).map(BasicValueEnum::into_int_value);
        assert_eq!(zero.and_then(|z| z.get_zero_extended_constant()), Some(0));

        let sig = FnType {
            ret: Type::Void,
            params: vec![Type::Double],
            variadic: false,
        };
        let llvm = sig.llvm(&context).map(|ty| ty.count_param_types());
        assert_eq!(llvm, Some(1));
    }
}
