//! The abstract syntax tree: a tagged sum per spec §3/§4.C, replacing the open/virtual-dispatch
//! shape a hand-rolled parser might reach for with two closed enums (`Expression`, `Statement`)
//! matched exhaustively everywhere they're consumed. See `crate::parser` for the producer,
//! `crate::evaluator` and `crate::compiler` for the two consumers.

use crate::token::{Token, TokenKind};

/// A 1-based line/column position paired with the absolute byte offset it came from. Carried by
/// every AST node for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
	pub offset: usize,
	pub line: usize,
	pub column: usize,
}

impl Position {
	#[must_use]
	pub const fn from_token(token: &Token) -> Self {
		Self {
			offset: token.position,
			line: token.line,
			column: token.column,
		}
	}
}

/// One of the reserved type-names, plus `Func` doing double duty as the function type. This is
/// the language's static type tag, not a `TokenKind` — the scanner/parser boundary is where the
/// lexeme "int" becomes `Type::Int`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
	Int,
	Float,
	Bool,
	Char,
	String,
	Void,
	Func,
}

impl Type {
	#[must_use]
	pub const fn name(self) -> &'static str {
		match self {
			Self::Int => "int",
			Self::Float => "float",
			Self::Bool => "bool",
			Self::Char => "char",
			Self::String => "string",
			Self::Void => "void",
			Self::Func => "func",
		}
	}

	/// The uppercase runtime-type tag used in diagnostics (spec.md §8 scenario S6), distinct from
	/// the lowercase type-annotation keyword `name()` returns. Mirrors the Go original's
	/// `ObjectType` vocabulary (`symbol/object.go`): `INTEGER`, `FLOAT`, `BOOLEAN`, `CHARACTER`,
	/// `STRING`, `NULL`, `FUNCTION`.
	#[must_use]
	pub const fn runtime_type_name(self) -> &'static str {
		match self {
			Self::Int => "INTEGER",
			Self::Float => "FLOAT",
			Self::Bool => "BOOLEAN",
			Self::Char => "CHARACTER",
			Self::String => "STRING",
			Self::Void => "NULL",
			Self::Func => "FUNCTION",
		}
	}

	/// Resolves a reserved-type-name lexeme to its `Type`. Returns `None` for anything else,
	/// including ordinary identifiers.
	#[must_use]
	pub fn from_lexeme(lexeme: &str) -> Option<Self> {
		Some(match lexeme {
			"int" => Self::Int,
			"float" => Self::Float,
			"bool" => Self::Bool,
			"char" => Self::Char,
			"string" => Self::String,
			"void" => Self::Void,
			"func" => Self::Func,
			_ => return None,
		})
	}
}

impl std::fmt::Display for Type {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name())
	}
}

/// An identifier expression. `type_slot` is the "mutable type slot" spec §3 describes: the
/// parser sets it for explicit declarations, the evaluator/compiler set it when a `DeclareAssign`
/// infers a type from its right-hand side. Once set it is never widened (invariant 1).
#[derive(Debug, Clone)]
pub struct Identifier {
	pub name: String,
	pub type_slot: std::cell::Cell<Option<Type>>,
	pub position: Position,
}

impl Identifier {
	#[must_use]
	pub fn new(name: impl Into<String>, position: Position) -> Self {
		Self {
			name: name.into(),
			type_slot: std::cell::Cell::new(None),
			position,
		}
	}
}

impl std::fmt::Display for Identifier {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.name)
	}
}

/// A declared parameter (function signature entry): `ident : type`.
#[derive(Debug, Clone)]
pub struct Parameter {
	pub identifier: Identifier,
	pub declared_type: Type,
}

impl std::fmt::Display for Parameter {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} : {}", self.identifier, self.declared_type)
	}
}

pub type Block = Vec<Statement>;
pub type Program = Vec<Statement>;

#[must_use]
pub fn operator_text(kind: TokenKind) -> &'static str {
	match kind {
		TokenKind::Plus => "+",
		TokenKind::Minus => "-",
		TokenKind::Asterisk => "*",
		TokenKind::Slash => "/",
		TokenKind::Percent => "%",
		TokenKind::Eq => "==",
		TokenKind::NotEq => "!=",
		TokenKind::Lt => "<",
		TokenKind::LtEq => "<=",
		TokenKind::Gt => ">",
		TokenKind::GtEq => ">=",
		TokenKind::Range => "..",
		TokenKind::RangeIncl => "..=",
		TokenKind::Bang => "!",
		TokenKind::And => "and",
		TokenKind::Or => "or",
		TokenKind::Xor => "xor",
		TokenKind::Not => "not",
		other => unreachable!("{other} is not an operator token"),
	}
}

fn render_block(block: &Block) -> String {
	block.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}

/// Expression nodes, per spec §3. Each carries its primary token's `Position` for diagnostics.
#[derive(Debug, Clone)]
pub enum Expression {
	IntegerLiteral { value: i64, position: Position },
	FloatLiteral { value: f64, position: Position },
	BooleanLiteral { value: bool, position: Position },
	CharacterLiteral { value: char, position: Position },
	StringLiteral { value: String, position: Position },
	Identifier(Identifier),
	Type { type_name: Type, position: Position },
	Prefix { operator: TokenKind, operand: Box<Expression>, position: Position },
	Infix { operator: TokenKind, left: Box<Expression>, right: Box<Expression>, position: Position },
	Property { parent: Box<Expression>, property: Box<Expression>, position: Position },
	FunctionCall { callee: Identifier, arguments: Vec<Expression>, position: Position },
}

impl Expression {
	#[must_use]
	pub const fn position(&self) -> Position {
		match self {
			Self::IntegerLiteral { position, .. }
			| Self::FloatLiteral { position, .. }
			| Self::BooleanLiteral { position, .. }
			| Self::CharacterLiteral { position, .. }
			| Self::StringLiteral { position, .. }
			| Self::Type { position, .. }
			| Self::Prefix { position, .. }
			| Self::Infix { position, .. }
			| Self::Property { position, .. }
			| Self::FunctionCall { position, .. } => *position,
			Self::Identifier(identifier) => identifier.position,
		}
	}

	/// Direct child expressions, left to right. Used by tree-walking consumers that want to
	/// recurse generically (diagnostics, the pretty-printer's structural tests).
	#[must_use]
	pub fn children(&self) -> Vec<&Self> {
		match self {
			Self::IntegerLiteral { .. }
			| Self::FloatLiteral { .. }
			| Self::BooleanLiteral { .. }
			| Self::CharacterLiteral { .. }
			| Self::StringLiteral { .. }
			| Self::Identifier(_)
			| Self::Type { .. } => Vec::new(),
			Self::Prefix { operand, .. } => vec![operand],
			Self::Infix { left, right, .. } => vec![left, right],
			Self::Property { parent, property, .. } => vec![parent, property],
			Self::FunctionCall { arguments, .. } => arguments.iter().collect(),
		}
	}
}

impl std::fmt::Display for Expression {
	/// Canonical rendering per spec §4.C: `(left OP right)` for `Infix`, `(OP operand)` for
	/// `Prefix`; everything else renders its literal/structural form directly.
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::IntegerLiteral { value, .. } => write!(f, "{value}"),
			Self::FloatLiteral { value, .. } => write!(f, "{value}"),
			Self::BooleanLiteral { value, .. } => write!(f, "{value}"),
			Self::CharacterLiteral { value, .. } => write!(f, "'{value}'"),
			Self::StringLiteral { value, .. } => write!(f, "\"{value}\""),
			Self::Identifier(identifier) => write!(f, "{identifier}"),
			Self::Type { type_name, .. } => write!(f, "{type_name}"),
			Self::Prefix { operator, operand, .. } => write!(f, "({} {operand})", operator_text(*operator)),
			Self::Infix { operator, left, right, .. } => write!(f, "({left} {} {right})", operator_text(*operator)),
			Self::Property { parent, property, .. } => write!(f, "{parent}.{property}"),
			Self::FunctionCall { callee, arguments, .. } => {
				write!(f, "{callee}(")?;
				for (i, argument) in arguments.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{argument}")?;
				}
				write!(f, ")")
			}
		}
	}
}

/// Statement nodes, per spec §3.
#[derive(Debug, Clone)]
pub enum Statement {
	Expression(Expression),
	Declare {
		identifier: Identifier,
		declared_type: Type,
		value: Option<Expression>,
		position: Position,
	},
	DeclareAssign {
		identifier: Identifier,
		value: Expression,
		position: Position,
	},
	Assign {
		identifier: Identifier,
		value: Expression,
		position: Position,
	},
	If {
		condition: Expression,
		then_block: Block,
		else_block: Option<Block>,
		position: Position,
	},
	ForLoop {
		condition: Expression,
		body: Block,
		position: Position,
	},
	FunctionDefinition {
		identifier: Identifier,
		parameters: Vec<Parameter>,
		return_type: Option<Type>,
		body: Block,
		position: Position,
	},
	Return {
		value: Option<Expression>,
		position: Position,
	},
	Block(Block),
	Import {
		identifier: Identifier,
		position: Position,
	},
}

impl Statement {
	#[must_use]
	pub fn position(&self) -> Position {
		match self {
			Self::Expression(expression) => expression.position(),
			Self::Declare { position, .. }
			| Self::DeclareAssign { position, .. }
			| Self::Assign { position, .. }
			| Self::If { position, .. }
			| Self::ForLoop { position, .. }
			| Self::FunctionDefinition { position, .. }
			| Self::Return { position, .. }
			| Self::Import { position, .. } => *position,
			Self::Block(statements) => statements.first().map_or(
				Position {
					offset: 0,
					line: 1,
					column: 0,
				},
				Self::position,
			),
		}
	}
}

impl std::fmt::Display for Statement {
	/// Canonical rendering per spec §4.C: a declared name renders `name : type [= expr]`, a
	/// function definition `{func name(params) body}`, a `Block`'s statements are concatenated
	/// with separating spaces.
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Expression(expression) => write!(f, "{expression}"),
			Self::Declare {
				identifier,
				declared_type,
				value,
				..
			} => {
				write!(f, "{identifier} : {declared_type}")?;
				if let Some(value) = value {
					write!(f, " = {value}")?;
				}
				Ok(())
			}
			Self::DeclareAssign { identifier, value, .. } => write!(f, "{identifier} := {value}"),
			Self::Assign { identifier, value, .. } => write!(f, "{identifier} = {value}"),
			Self::If {
				condition,
				then_block,
				else_block,
				..
			} => {
				write!(f, "if {condition} {} end", render_block(then_block))?;
				if let Some(else_block) = else_block {
					write!(f, " else {} end", render_block(else_block))?;
				}
				Ok(())
			}
			Self::ForLoop { condition, body, .. } => write!(f, "for {condition} {} end", render_block(body)),
			Self::FunctionDefinition {
				identifier,
				parameters,
				return_type,
				body,
				..
			} => {
				write!(f, "{{func {identifier}(")?;
				for (i, parameter) in parameters.iter().enumerate() {
					if i > 0 {
						write!(f, ", ")?;
					}
					write!(f, "{parameter}")?;
				}
				write!(f, ")")?;
				if let Some(return_type) = return_type {
					write!(f, " -> {return_type}")?;
				}
				write!(f, " {}}}", render_block(body))
			}
			Self::Return { value, .. } => match value {
				Some(value) => write!(f, "return {value}"),
				None => write!(f, "return"),
			},
			Self::Block(statements) => write!(f, "{}", render_block(statements)),
			Self::Import { identifier, .. } => write!(f, "import {identifier}"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pos() -> Position {
		Position { offset: 0, line: 1, column: 0 }
	}

	#[test]
	fn infix_renders_parenthesised() {
		let expression = Expression::Infix {
			operator: TokenKind::Plus,
			left: Box::new(Expression::IntegerLiteral { value: 1, position: pos() }),
			right: Box::new(Expression::IntegerLiteral { value: 2, position: pos() }),
			position: pos(),
		};
		assert_eq!(expression.to_string(), "(1 + 2)");
	}

	#[test]
	fn prefix_renders_parenthesised() {
		let expression = Expression::Prefix {
			operator: TokenKind::Minus,
			operand: Box::new(Expression::IntegerLiteral { value: 5, position: pos() }),
			position: pos(),
		};
		assert_eq!(expression.to_string(), "(- 5)");
	}

	#[test]
	fn declare_with_value_renders_name_colon_type_eq_expr() {
		let statement = Statement::Declare {
			identifier: Identifier::new("x", pos()),
			declared_type: Type::Int,
			value: Some(Expression::IntegerLiteral { value: 3, position: pos() }),
			position: pos(),
		};
		assert_eq!(statement.to_string(), "x : int = 3");
	}

	#[test]
	fn function_definition_renders_braces() {
		let statement = Statement::FunctionDefinition {
			identifier: Identifier::new("add", pos()),
			parameters: vec![Parameter {
				identifier: Identifier::new("a", pos()),
				declared_type: Type::Int,
			}],
			return_type: Some(Type::Int),
			body: vec![Statement::Return {
				value: Some(Expression::Identifier(Identifier::new("a", pos()))),
				position: pos(),
			}],
			position: pos(),
		};
		assert_eq!(statement.to_string(), "{func add(a : int) -> int return a}");
	}

	#[test]
	fn type_slot_starts_unset_and_is_settable_once() {
		let identifier = Identifier::new("x", pos());
		assert_eq!(identifier.type_slot.get(), None);
		identifier.type_slot.set(Some(Type::Int));
		assert_eq!(identifier.type_slot.get(), Some(Type::Int));
	}

	#[test]
	fn type_name_lookup_round_trips() {
		for type_name in [Type::Int, Type::Float, Type::Bool, Type::Char, Type::String, Type::Void, Type::Func] {
			assert_eq!(Type::from_lexeme(type_name.name()), Some(type_name));
		}
		assert_eq!(Type::from_lexeme("nope"), None);
	}

	#[test]
	fn runtime_type_name_is_uppercase_and_distinct_from_name() {
		assert_eq!(Type::Int.runtime_type_name(), "INTEGER");
		assert_eq!(Type::String.runtime_type_name(), "STRING");
		for type_name in [Type::Int, Type::Float, Type::Bool, Type::Char, Type::String, Type::Void, Type::Func] {
			assert_ne!(type_name.name(), type_name.runtime_type_name());
		}
	}
}
