//! The evaluation/compile-time error taxonomy (spec §7). These are plain data — `EvalError`
//! carries no position; callers attach one (file/line/column) when lifting it into a
//! `Value::Error` or a `CompileError`, since the same taxonomy is shared by both back ends.

use crate::ast::Type;

/// A recoverable evaluator or compiler error. Rendered via `Display` into the exact message
/// families spec §7 names, so diagnostics read identically regardless of which back end raised
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
	NameUndefined { name: String },
	NameAlreadyBound { name: String },
	TypeMismatch { lhs: String, op: String, rhs: String },
	ReturnTypeMismatch { found: String, expected: String },
	UnknownOperator { lhs: String, op: String, rhs: String },
	ArityMismatch { got: usize, want: usize },
	NotCallable { type_name: String },
	PackageMissing { name: String },
	DivisionByZero,
}

impl EvalError {
	#[must_use]
	pub fn type_mismatch(lhs: Type, op: &str, rhs: Type) -> Self {
		Self::TypeMismatch {
			lhs: lhs.runtime_type_name().to_owned(),
			op: op.to_owned(),
			rhs: rhs.runtime_type_name().to_owned(),
		}
	}

	#[must_use]
	pub fn unknown_operator(lhs: Type, op: &str, rhs: Type) -> Self {
		Self::UnknownOperator {
			lhs: lhs.runtime_type_name().to_owned(),
			op: op.to_owned(),
			rhs: rhs.runtime_type_name().to_owned(),
		}
	}
}

impl std::fmt::Display for EvalError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::NameUndefined { name } => write!(f, "identifier not found: {name}"),
			Self::NameAlreadyBound { name } => write!(f, "identifier already taken: {name}"),
			Self::TypeMismatch { lhs, op, rhs } => write!(f, "type mismatch: {lhs} {op} {rhs}"),
			Self::ReturnTypeMismatch { found, expected } => write!(f, "cannot use {found} as {expected} in return statement"),
			Self::UnknownOperator { lhs, op, rhs } => write!(f, "unknown operator: {lhs} {op} {rhs}"),
			Self::ArityMismatch { got, want } => write!(f, "wrong number of arguments. got={got}, want={want}"),
			Self::NotCallable { type_name } => write!(f, "not a function: {type_name}"),
			Self::PackageMissing { name } => write!(f, "couldn't find package named '{name}'"),
			Self::DivisionByZero => write!(f, "division by zero"),
		}
	}
}

impl std::error::Error for EvalError {}
