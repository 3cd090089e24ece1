//! The byte-code compiler (spec §4.H): mirrors the parser's Pratt skeleton, but each handler
//! emits instructions into a `Chunk` and returns the value type it produced, so the caller can
//! select the right typed opcode. Compiles the documented subset only — `DeclareAssign`, infix
//! and unary-minus expressions, identifier lookups, literals, and `print(x)` — everything else in
//! a program is recorded as an unsupported-construct diagnostic and skipped; see spec §9 on why
//! control flow and user functions are scaffolded in the byte-code but not yet compiled.

pub mod scope;

use crate::ast::{Expression, Program, Statement, Type};
use crate::bytecode::{Chunk, Opcode};
use crate::token::TokenKind;
use scope::CompileScope;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
	TypeMismatch { lhs: String, op: String, rhs: String },
	NameUndefined { name: String },
	UnsupportedConstruct { what: String },
	UnsupportedCall { name: String },
	ConstantPoolFull,
}

impl std::fmt::Display for CompileError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::TypeMismatch { lhs, op, rhs } => write!(f, "type mismatch: {lhs} {op} {rhs}"),
			Self::NameUndefined { name } => write!(f, "identifier not found: {name}"),
			Self::UnsupportedConstruct { what } => write!(f, "{what} is not supported by the byte-code compiler"),
			Self::UnsupportedCall { name } => write!(f, "only print(x) is compiled; '{name}' is not"),
			Self::ConstantPoolFull => write!(f, "constant pool partition is full (limit 256 entries)"),
		}
	}
}

impl std::error::Error for CompileError {}

impl From<crate::bytecode::ConstantPoolFull> for CompileError {
	fn from(_: crate::bytecode::ConstantPoolFull) -> Self {
		Self::ConstantPoolFull
	}
}

pub struct Compiler {
	chunk: Chunk,
	scope: CompileScope,
	pub errors: Vec<CompileError>,
}

impl Compiler {
	#[must_use]
	pub fn new() -> Self {
		Self {
			chunk: Chunk::new(),
			scope: CompileScope::new(),
			errors: Vec::new(),
		}
	}

	/// Compiles every statement in `program`, collecting a diagnostic (and skipping just that
	/// statement) for anything outside the supported subset, then emits a trailing `HALT`.
	pub fn compile_program(mut self, program: &Program) -> (Chunk, Vec<CompileError>) {
		for statement in program {
			if let Err(error) = self.compile_statement(statement) {
				self.errors.push(error);
			}
		}
		self.chunk.write_op(Opcode::Halt);
		(self.chunk, self.errors)
	}

	fn compile_statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
		match statement {
			Statement::DeclareAssign { identifier, value, .. } => {
				let value_type = self.compile_expression(value)?;
				let name_address = self.chunk.constants.insert_string(identifier.name.clone())?;
				let opcode = Opcode::var_bind_for(value_type).ok_or_else(|| CompileError::UnsupportedConstruct {
					what: format!("binding a {value_type} value"),
				})?;
				self.chunk.write_op_with_operand(opcode, name_address);
				self.scope.bind(identifier.name.clone(), name_address, value_type);
				identifier.type_slot.set(Some(value_type));
				Ok(())
			}
			Statement::Expression(Expression::FunctionCall { callee, arguments, .. }) if callee.name == "print" => {
				let [argument] = arguments.as_slice() else {
					return Err(CompileError::UnsupportedConstruct {
						what: "print with a number of arguments other than one".to_owned(),
					});
				};
				let value_type = self.compile_expression(argument)?;
				let opcode = Opcode::print_for(value_type).ok_or_else(|| CompileError::UnsupportedConstruct {
					what: format!("printing a {value_type} value"),
				})?;
				self.chunk.write_op(opcode);
				Ok(())
			}
			Statement::Expression(Expression::FunctionCall { callee, .. }) => Err(CompileError::UnsupportedCall { name: callee.name.clone() }),
			other => Err(CompileError::UnsupportedConstruct { what: statement_kind_name(other).to_owned() }),
		}
	}

	fn compile_expression(&mut self, expression: &Expression) -> Result<Type, CompileError> {
		match expression {
			Expression::IntegerLiteral { value, .. } => {
				let address = self.chunk.constants.insert_int(*value)?;
				self.chunk.write_op_with_operand(Opcode::PushInt, address);
				Ok(Type::Int)
			}
			Expression::FloatLiteral { value, .. } => {
				let address = self.chunk.constants.insert_float(*value)?;
				self.chunk.write_op_with_operand(Opcode::PushFloat, address);
				Ok(Type::Float)
			}
			Expression::BooleanLiteral { value, .. } => {
				let address = self.chunk.constants.insert_bool(*value)?;
				self.chunk.write_op_with_operand(Opcode::PushBool, address);
				Ok(Type::Bool)
			}
			Expression::CharacterLiteral { value, .. } => {
				let address = self.chunk.constants.insert_char(*value)?;
				self.chunk.write_op_with_operand(Opcode::PushChar, address);
				Ok(Type::Char)
			}
			Expression::StringLiteral { value, .. } => {
				let address = self.chunk.constants.insert_string(value.clone())?;
				self.chunk.write_op_with_operand(Opcode::PushString, address);
				Ok(Type::String)
			}
			Expression::Identifier(identifier) => {
				let (address, found_type) = self.scope.lookup(&identifier.name).ok_or_else(|| CompileError::NameUndefined { name: identifier.name.clone() })?;
				let opcode = Opcode::var_lookup_for(found_type).ok_or_else(|| CompileError::UnsupportedConstruct {
					what: format!("looking up a {found_type} value"),
				})?;
				self.chunk.write_op_with_operand(opcode, address);
				Ok(found_type)
			}
			Expression::Prefix {
				operator: TokenKind::Minus,
				operand,
				..
			} => {
				let operand_type = self.compile_expression(operand)?;
				match operand_type {
					Type::Int => {
						self.chunk.write_op(Opcode::NegInt);
						Ok(Type::Int)
					}
					Type::Float => {
						self.chunk.write_op(Opcode::NegFloat);
						Ok(Type::Float)
					}
					other => Err(CompileError::UnsupportedConstruct { what: format!("negating a {other} value") }),
				}
			}
			Expression::Infix { operator, left, right, .. } => {
				let left_type = self.compile_expression(left)?;
				let right_type = self.compile_expression(right)?;
				if left_type != right_type {
					return Err(CompileError::TypeMismatch {
						lhs: left_type.runtime_type_name().to_owned(),
						op: crate::ast::operator_text(*operator).to_owned(),
						rhs: right_type.runtime_type_name().to_owned(),
					});
				}
				let opcode = opcode_for_infix(*operator, left_type).ok_or_else(|| CompileError::UnsupportedConstruct {
					what: format!("{} on {left_type}", crate::ast::operator_text(*operator)),
				})?;
				self.chunk.write_op(opcode);
				Ok(result_type_for_infix(*operator, left_type))
			}
			other => Err(CompileError::UnsupportedConstruct { what: expression_kind_name(other).to_owned() }),
		}
	}
}

impl Default for Compiler {
	fn default() -> Self {
		Self::new()
	}
}

fn opcode_for_infix(operator: TokenKind, operand_type: Type) -> Option<Opcode> {
	use TokenKind::{Asterisk, Eq, Gt, GtEq, Lt, LtEq, Minus, NotEq, Percent, Plus, Slash};
	match (operand_type, operator) {
		(Type::Int, Plus) => Some(Opcode::AddInt),
		(Type::Int, Minus) => Some(Opcode::SubInt),
		(Type::Int, Asterisk) => Some(Opcode::MulInt),
		(Type::Int, Slash) => Some(Opcode::DivInt),
		(Type::Int, Percent) => Some(Opcode::ModInt),
		(Type::Int, Eq) => Some(Opcode::EqInt),
		(Type::Int, NotEq) => Some(Opcode::NeqInt),
		(Type::Int, Lt) => Some(Opcode::LtInt),
		(Type::Int, LtEq) => Some(Opcode::LteInt),
		(Type::Int, Gt) => Some(Opcode::GtInt),
		(Type::Int, GtEq) => Some(Opcode::GteInt),
		(Type::Float, Plus) => Some(Opcode::AddFloat),
		(Type::Float, Minus) => Some(Opcode::SubFloat),
		(Type::Float, Asterisk) => Some(Opcode::MulFloat),
		(Type::Float, Slash) => Some(Opcode::DivFloat),
		(Type::Float, Eq) => Some(Opcode::EqFloat),
		(Type::Float, NotEq) => Some(Opcode::NeqFloat),
		(Type::Float, Lt) => Some(Opcode::LtFloat),
		(Type::Float, LtEq) => Some(Opcode::LteFloat),
		(Type::Float, Gt) => Some(Opcode::GtFloat),
		(Type::Float, GtEq) => Some(Opcode::GteFloat),
		(Type::Bool, Eq) => Some(Opcode::EqBool),
		(Type::Bool, NotEq) => Some(Opcode::NeqBool),
		(Type::Char, Eq) => Some(Opcode::EqChar),
		(Type::Char, NotEq) => Some(Opcode::NeqChar),
		(Type::String, Plus) => Some(Opcode::ConcatString),
		(Type::String, Eq) => Some(Opcode::EqString),
		(Type::String, NotEq) => Some(Opcode::NeqString),
		_ => None,
	}
}

fn result_type_for_infix(operator: TokenKind, operand_type: Type) -> Type {
	use TokenKind::{Eq, Gt, GtEq, Lt, LtEq, NotEq};
	if matches!(operator, Eq | NotEq | Lt | LtEq | Gt | GtEq) {
		Type::Bool
	} else {
		operand_type
	}
}

fn statement_kind_name(statement: &Statement) -> &'static str {
	match statement {
		Statement::Expression(_) => "this expression statement",
		Statement::Declare { .. } => "declare",
		Statement::DeclareAssign { .. } => "declare-assign",
		Statement::Assign { .. } => "assign",
		Statement::If { .. } => "if",
		Statement::ForLoop { .. } => "for",
		Statement::FunctionDefinition { .. } => "func",
		Statement::Return { .. } => "return",
		Statement::Block(_) => "block",
		Statement::Import { .. } => "import",
	}
}

fn expression_kind_name(expression: &Expression) -> &'static str {
	match expression {
		Expression::Type { .. } => "a type expression",
		Expression::Property { .. } => "property access",
		Expression::FunctionCall { .. } => "this function call",
		Expression::Prefix { .. } => "this prefix expression",
		_ => "this expression",
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::parser::parse;

	fn compile(source: &str) -> (Chunk, Vec<CompileError>) {
		let (program, parse_errors) = parse(source);
		assert!(parse_errors.is_empty(), "{parse_errors:?}");
		Compiler::new().compile_program(&program)
	}

	#[test]
	fn declare_assign_emits_push_and_var_bind() {
		let (chunk, errors) = compile("x := 2 + 3");
		assert!(errors.is_empty(), "{errors:?}");
		let disassembly = chunk.disassemble();
		assert!(disassembly.contains("PUSH_INT"));
		assert!(disassembly.contains("ADD_INT"));
		assert!(disassembly.contains("VAR_BIND_INT"));
		assert!(disassembly.contains("HALT"));
	}

	#[test]
	fn identifier_lookup_after_bind_emits_var_lookup() {
		let (chunk, errors) = compile("x := 2\nprint(x)");
		assert!(errors.is_empty(), "{errors:?}");
		let disassembly = chunk.disassemble();
		assert!(disassembly.contains("VAR_LOOKUP_INT"));
		assert!(disassembly.contains("PRINT_INT"));
	}

	#[test]
	fn mismatched_infix_types_are_a_compile_error() {
		let (_chunk, errors) = compile("x := 1 + 2.0");
		assert!(errors.iter().any(|error| matches!(error, CompileError::TypeMismatch { .. })));
	}

	#[test]
	fn calling_anything_other_than_print_is_unsupported() {
		let (_chunk, errors) = compile("add(1, 2)");
		assert!(errors.iter().any(|error| matches!(error, CompileError::UnsupportedCall { name } if name == "add")));
	}

	#[test]
	fn undefined_identifier_is_reported() {
		let (_chunk, errors) = compile("print(missing)");
		assert!(errors.iter().any(|error| matches!(error, CompileError::NameUndefined { name } if name == "missing")));
	}

	#[test]
	fn unary_minus_emits_neg() {
		let (chunk, errors) = compile("x := -5");
		assert!(errors.is_empty(), "{errors:?}");
		assert!(chunk.disassemble().contains("NEG_INT"));
	}
}
