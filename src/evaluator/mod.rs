//! The tree-walking evaluator (spec §4.F): `eval(program, scope) -> Value`, recursing over the
//! AST built by `crate::parser`. Errors are values (`Value::Error`) that short-circuit every
//! enclosing statement/expression evaluation up to the program boundary — there is no panic or
//! exception path through this module for a recoverable language error.

pub mod builtins;
pub mod errors;
pub mod value;

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::{operator_text, Block, Expression, Identifier, Parameter, Position, Program, Statement, Type};
use crate::scope::{Scope, ScopeRef};
use crate::token::TokenKind;
use builtins::BUILTINS;
use errors::EvalError;
use value::{ErrorValue, FunctionValue, Value};

/// Owns the call-memoization map for one evaluator run. Scoped to the `Evaluator` instance
/// rather than a process-wide global, so two interpreter instances (e.g. concurrent test runs)
/// never share memoized results — the rewrite's resolution of the open question in spec §9.
pub struct Evaluator {
	file: String,
	memo: HashMap<String, Value>,
}

impl Evaluator {
	#[must_use]
	pub fn new(file: impl Into<String>) -> Self {
		Self {
			file: file.into(),
			memo: HashMap::new(),
		}
	}

	fn error(&self, position: Position, err: EvalError) -> Value {
		Value::Error(ErrorValue {
			file: self.file.clone(),
			line: position.line,
			column: position.column,
			message: err.to_string(),
		})
	}

	#[must_use]
	pub fn eval_program(&mut self, program: &Program, scope: &ScopeRef) -> Value {
		let result = self.eval_block(program, scope);
		match result {
			Value::ReturnValue(inner) => *inner,
			other => other,
		}
	}

	fn eval_block(&mut self, block: &Block, scope: &ScopeRef) -> Value {
		let mut last = Value::Null;
		for statement in block {
			last = self.eval_statement(statement, scope);
			if last.is_error() || last.is_return() {
				return last;
			}
		}
		last
	}

	fn eval_statement(&mut self, statement: &Statement, scope: &ScopeRef) -> Value {
		match statement {
			Statement::Expression(expression) => self.eval_expression(expression, scope),
			Statement::Declare {
				identifier,
				declared_type,
				value,
				position,
			} => self.eval_declare(identifier, *declared_type, value.as_ref(), *position, scope),
			Statement::DeclareAssign { identifier, value, position } => self.eval_declare_assign(identifier, value, *position, scope),
			Statement::Assign { identifier, value, position } => self.eval_assign(identifier, value, *position, scope),
			Statement::If {
				condition,
				then_block,
				else_block,
				..
			} => self.eval_if(condition, then_block, else_block.as_ref(), scope),
			Statement::ForLoop { condition, body, .. } => self.eval_for(condition, body, scope),
			Statement::FunctionDefinition {
				identifier,
				parameters,
				return_type,
				body,
				position,
			} => self.eval_function_definition(identifier, parameters, *return_type, body, *position, scope),
			Statement::Return { value, .. } => self.eval_return(value.as_ref(), scope),
			Statement::Block(statements) => self.eval_block(statements, scope),
			Statement::Import { identifier, position } => self.eval_import(identifier, *position, scope),
		}
	}

	fn eval_declare(&mut self, identifier: &Identifier, declared_type: Type, value: Option<&Expression>, position: Position, scope: &ScopeRef) -> Value {
		if Scope::lookup_local(scope, &identifier.name).is_some() {
			return self.error(position, EvalError::NameAlreadyBound { name: identifier.name.clone() });
		}
		let bound = match value {
			Some(expression) => {
				let evaluated = self.eval_expression(expression, scope);
				if evaluated.is_error() {
					return evaluated;
				}
				if evaluated.runtime_type() != declared_type {
					return self.error(position, EvalError::type_mismatch(declared_type, "=", evaluated.runtime_type()));
				}
				evaluated
			}
			None => default_value(declared_type),
		};
		identifier.type_slot.set(Some(declared_type));
		Scope::insert(scope, identifier.name.clone(), bound.clone(), declared_type);
		bound
	}

	fn eval_declare_assign(&mut self, identifier: &Identifier, value: &Expression, position: Position, scope: &ScopeRef) -> Value {
		if Scope::lookup_local(scope, &identifier.name).is_some() {
			return self.error(position, EvalError::NameAlreadyBound { name: identifier.name.clone() });
		}
		let evaluated = self.eval_expression(value, scope);
		if evaluated.is_error() {
			return evaluated;
		}
		let inferred_type = evaluated.runtime_type();
		identifier.type_slot.set(Some(inferred_type));
		Scope::insert(scope, identifier.name.clone(), evaluated.clone(), inferred_type);
		evaluated
	}

	fn eval_assign(&mut self, identifier: &Identifier, value: &Expression, position: Position, scope: &ScopeRef) -> Value {
		let Some(symbol) = Scope::lookup(scope, &identifier.name) else {
			return self.error(position, EvalError::NameUndefined { name: identifier.name.clone() });
		};
		let evaluated = self.eval_expression(value, scope);
		if evaluated.is_error() {
			return evaluated;
		}
		if evaluated.runtime_type() != symbol.declared_type {
			return self.error(position, EvalError::type_mismatch(symbol.declared_type, "=", evaluated.runtime_type()));
		}
		Scope::try_assign(scope, &identifier.name, evaluated.clone());
		evaluated
	}

	fn eval_if(&mut self, condition: &Expression, then_block: &Block, else_block: Option<&Block>, scope: &ScopeRef) -> Value {
		let condition_value = self.eval_expression(condition, scope);
		if condition_value.is_error() {
			return condition_value;
		}
		if condition_value.is_truthy() {
			self.eval_block(then_block, &Scope::new_inner(scope))
		} else if let Some(else_block) = else_block {
			self.eval_block(else_block, &Scope::new_inner(scope))
		} else {
			Value::Null
		}
	}

	/// Each iteration gets its own fresh inner scope (invariant 6: a binding from one iteration
	/// must not persist into the next), re-evaluating the condition in the loop's own scope.
	fn eval_for(&mut self, condition: &Expression, body: &Block, scope: &ScopeRef) -> Value {
		loop {
			let condition_value = self.eval_expression(condition, scope);
			if condition_value.is_error() {
				return condition_value;
			}
			if !condition_value.is_truthy() {
				return Value::Null;
			}
			let iteration_scope = Scope::new_inner(scope);
			let result = self.eval_block(body, &iteration_scope);
			if result.is_error() || result.is_return() {
				return result;
			}
		}
	}

	fn eval_function_definition(
		&mut self,
		identifier: &Identifier,
		parameters: &[Parameter],
		return_type: Option<Type>,
		body: &Block,
		position: Position,
		scope: &ScopeRef,
	) -> Value {
		if Scope::lookup_local(scope, &identifier.name).is_some() {
			return self.error(position, EvalError::NameAlreadyBound { name: identifier.name.clone() });
		}
		let function = Value::Function(Rc::new(FunctionValue {
			name: identifier.name.clone(),
			parameters: parameters.to_vec(),
			body: body.clone(),
			capturing_scope: Rc::clone(scope),
			return_type,
		}));
		identifier.type_slot.set(Some(Type::Func));
		Scope::insert(scope, identifier.name.clone(), function.clone(), Type::Func);
		function
	}

	fn eval_return(&mut self, value: Option<&Expression>, scope: &ScopeRef) -> Value {
		let evaluated = match value {
			Some(expression) => self.eval_expression(expression, scope),
			None => Value::Null,
		};
		if evaluated.is_error() {
			return evaluated;
		}
		Value::ReturnValue(Box::new(evaluated))
	}

	fn eval_import(&mut self, identifier: &Identifier, position: Position, scope: &ScopeRef) -> Value {
		match Scope::named_scope_if_exists(scope, &identifier.name) {
			Some(_) => Value::Null,
			None => self.error(position, EvalError::PackageMissing { name: identifier.name.clone() }),
		}
	}

	fn eval_expression(&mut self, expression: &Expression, scope: &ScopeRef) -> Value {
		match expression {
			Expression::IntegerLiteral { value, .. } => Value::Integer(*value),
			Expression::FloatLiteral { value, .. } => Value::Float(*value),
			Expression::BooleanLiteral { value, .. } => Value::Boolean(*value),
			Expression::CharacterLiteral { value, .. } => Value::Character(*value),
			Expression::StringLiteral { value, .. } => Value::String(value.clone()),
			Expression::Type { type_name, .. } => Value::Type(*type_name),
			Expression::Identifier(identifier) => match Scope::lookup(scope, &identifier.name) {
				Some(symbol) => symbol.value,
				None => self.error(identifier.position, EvalError::NameUndefined { name: identifier.name.clone() }),
			},
			Expression::Prefix { operator, operand, position } => self.eval_prefix(*operator, operand, *position, scope),
			Expression::Infix {
				operator,
				left,
				right,
				position,
			} => self.eval_infix(*operator, left, right, *position, scope),
			Expression::Property { parent, property, position } => self.eval_property(parent, property, *position, scope),
			Expression::FunctionCall { callee, arguments, position } => self.eval_call(callee, arguments, *position, scope),
		}
	}

	fn eval_prefix(&mut self, operator: TokenKind, operand_expr: &Expression, position: Position, scope: &ScopeRef) -> Value {
		let operand = self.eval_expression(operand_expr, scope);
		if operand.is_error() {
			return operand;
		}
		match operator {
			TokenKind::Minus => match operand {
				Value::Integer(value) => Value::Integer(-value),
				Value::Float(value) => Value::Float(-value),
				other => self.error(position, EvalError::unknown_operator(other.runtime_type(), "-", other.runtime_type())),
			},
			TokenKind::Bang | TokenKind::Not => Value::Boolean(!operand.is_truthy()),
			_ => unreachable!("{operator} is not a prefix operator"),
		}
	}

	fn eval_infix(&mut self, operator: TokenKind, left_expr: &Expression, right_expr: &Expression, position: Position, scope: &ScopeRef) -> Value {
		let left = self.eval_expression(left_expr, scope);
		if left.is_error() {
			return left;
		}
		let right = self.eval_expression(right_expr, scope);
		if right.is_error() {
			return right;
		}
		match apply_infix(operator, left, right) {
			Ok(value) => value,
			Err(err) => self.error(position, err),
		}
	}

	/// `Property` only resolves `package.name` — the left side must itself be an identifier
	/// naming an existing named scope (there are no user-defined struct/record values to chase a
	/// property chain through).
	fn eval_property(&mut self, parent: &Expression, property: &Expression, position: Position, scope: &ScopeRef) -> Value {
		let Expression::Identifier(parent_identifier) = parent else {
			return self.error(position, EvalError::PackageMissing { name: parent.to_string() });
		};
		match Scope::named_scope_if_exists(scope, &parent_identifier.name) {
			Some(package_scope) => self.eval_expression(property, &package_scope),
			None => self.error(position, EvalError::PackageMissing { name: parent_identifier.name.clone() }),
		}
	}

	fn eval_call(&mut self, callee: &Identifier, arguments: &[Expression], position: Position, scope: &ScopeRef) -> Value {
		let resolved = Scope::lookup(scope, &callee.name);

		let mut evaluated_args = Vec::with_capacity(arguments.len());
		for argument in arguments {
			let value = self.eval_expression(argument, scope);
			if value.is_error() {
				return value;
			}
			evaluated_args.push(value);
		}

		match resolved {
			Some(symbol) => match symbol.value {
				Value::Function(function) => self.call_function(&function, &evaluated_args, position),
				other => self.error(position, EvalError::NotCallable { type_name: other.runtime_type().name().to_owned() }),
			},
			None => match BUILTINS.get(callee.name.as_str()) {
				Some(builtin) => match (builtin.call)(&evaluated_args) {
					Ok(value) => value,
					Err(err) => self.error(position, err),
				},
				None => self.error(position, EvalError::NameUndefined { name: callee.name.clone() }),
			},
		}
	}

	fn call_function(&mut self, function: &Rc<FunctionValue>, arguments: &[Value], position: Position) -> Value {
		if arguments.len() != function.parameters.len() {
			return self.error(
				position,
				EvalError::ArityMismatch {
					got: arguments.len(),
					want: function.parameters.len(),
				},
			);
		}
		for (argument, parameter) in arguments.iter().zip(&function.parameters) {
			if argument.runtime_type() != parameter.declared_type {
				return self.error(position, EvalError::type_mismatch(argument.runtime_type(), "as", parameter.declared_type));
			}
		}

		let memo_key = memo_key(&function.name, arguments);
		if let Some(cached) = self.memo.get(&memo_key) {
			return cached.clone();
		}

		let call_scope = Scope::new_inner(&function.capturing_scope);
		for (parameter, argument) in function.parameters.iter().zip(arguments) {
			Scope::insert(&call_scope, parameter.identifier.name.clone(), argument.clone(), parameter.declared_type);
		}

		let result = match self.eval_block(&function.body, &call_scope) {
			Value::ReturnValue(inner) => *inner,
			other @ Value::Error(_) => return other,
			other => other,
		};

		if let Some(expected) = function.return_type {
			if result.runtime_type() != expected {
				return self.error(
					position,
					EvalError::ReturnTypeMismatch {
						found: result.runtime_type().name().to_owned(),
						expected: expected.name().to_owned(),
					},
				);
			}
		}

		self.memo.insert(memo_key, result.clone());
		result
	}
}

/// The memoization key: qualified call name plus each argument's inspected text, per spec §4.F.
fn memo_key(name: &str, arguments: &[Value]) -> String {
	let inspected = arguments.iter().map(Value::inspect).collect::<Vec<_>>().join(", ");
	format!("{name}({inspected})")
}

#[must_use]
fn default_value(type_name: Type) -> Value {
	match type_name {
		Type::Int => Value::Integer(0),
		Type::Float => Value::Float(0.0),
		Type::Bool => Value::Boolean(false),
		Type::Char => Value::Character('\0'),
		Type::String => Value::String(String::new()),
		Type::Void | Type::Func => Value::Null,
	}
}

/// The infix operator-type dispatch table (spec §4.F). Operands of differing type are always a
/// `TypeMismatch`; same-typed operands with no rule for the operator are an `UnknownOperator`.
fn apply_infix(operator: TokenKind, left: Value, right: Value) -> Result<Value, EvalError> {
	use TokenKind::{And, Asterisk, Eq, Gt, GtEq, Lt, LtEq, Minus, NotEq, Or, Percent, Plus, Slash, Xor};

	match (&left, &right) {
		(&Value::Integer(l), &Value::Integer(r)) => Ok(match operator {
			Plus => Value::Integer(l.wrapping_add(r)),
			Minus => Value::Integer(l.wrapping_sub(r)),
			Asterisk => Value::Integer(l.wrapping_mul(r)),
			Slash => {
				if r == 0 {
					return Err(EvalError::DivisionByZero);
				}
				Value::Integer(l.wrapping_div(r))
			}
			Percent => {
				if r == 0 {
					return Err(EvalError::DivisionByZero);
				}
				Value::Integer(l.wrapping_rem(r))
			}
			Lt => Value::Boolean(l < r),
			LtEq => Value::Boolean(l <= r),
			Gt => Value::Boolean(l > r),
			GtEq => Value::Boolean(l >= r),
			Eq => Value::Boolean(l == r),
			NotEq => Value::Boolean(l != r),
			other => return Err(EvalError::unknown_operator(Type::Int, operator_text(other), Type::Int)),
		}),
		(&Value::Float(l), &Value::Float(r)) => Ok(match operator {
			Plus => Value::Float(l + r),
			Minus => Value::Float(l - r),
			Asterisk => Value::Float(l * r),
			Slash => Value::Float(l / r),
			Lt => Value::Boolean(l < r),
			LtEq => Value::Boolean(l <= r),
			Gt => Value::Boolean(l > r),
			GtEq => Value::Boolean(l >= r),
			Eq => Value::Boolean(l == r),
			NotEq => Value::Boolean(l != r),
			other => return Err(EvalError::unknown_operator(Type::Float, operator_text(other), Type::Float)),
		}),
		(&Value::Boolean(l), &Value::Boolean(r)) => Ok(match operator {
			Eq => Value::Boolean(l == r),
			NotEq => Value::Boolean(l != r),
			And => Value::Boolean(l && r),
			Or => Value::Boolean(l || r),
			Xor => Value::Boolean(l ^ r),
			other => return Err(EvalError::unknown_operator(Type::Bool, operator_text(other), Type::Bool)),
		}),
		(&Value::Character(l), &Value::Character(r)) => Ok(match operator {
			Eq => Value::Boolean(l == r),
			NotEq => Value::Boolean(l != r),
			other => return Err(EvalError::unknown_operator(Type::Char, operator_text(other), Type::Char)),
		}),
		(Value::String(l), Value::String(r)) => Ok(match operator {
			Plus => Value::String(format!("{l}{r}")),
			Eq => Value::Boolean(l == r),
			NotEq => Value::Boolean(l != r),
			other => return Err(EvalError::unknown_operator(Type::String, operator_text(other), Type::String)),
		}),
		(&Value::Type(l), &Value::Type(r)) => Ok(match operator {
			Eq => Value::Boolean(l.name() == r.name()),
			NotEq => Value::Boolean(l.name() != r.name()),
			other => return Err(EvalError::unknown_operator(Type::Void, operator_text(other), Type::Void)),
		}),
		_ => Err(EvalError::type_mismatch(left.runtime_type(), operator_text(operator), right.runtime_type())),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn pos() -> Position {
		Position { offset: 0, line: 1, column: 0 }
	}

	fn ident(name: &str) -> Identifier {
		Identifier::new(name, pos())
	}

	#[test]
	fn declare_assign_infers_type_and_binds() {
		let mut evaluator = Evaluator::new("<test>");
		let scope = Scope::new_root();
		let program = vec![Statement::DeclareAssign {
			identifier: ident("x"),
			value: Expression::IntegerLiteral { value: 14, position: pos() },
			position: pos(),
		}];
		let result = evaluator.eval_program(&program, &scope);
		assert!(matches!(result, Value::Integer(14)));
		assert!(matches!(Scope::lookup(&scope, "x"), Some(crate::scope::Symbol { value: Value::Integer(14), declared_type: Type::Int })));
	}

	#[test]
	fn redeclaring_in_the_same_scope_is_an_error() {
		let mut evaluator = Evaluator::new("<test>");
		let scope = Scope::new_root();
		Scope::insert(&scope, "x", Value::Integer(1), Type::Int);
		let program = vec![Statement::DeclareAssign {
			identifier: ident("x"),
			value: Expression::IntegerLiteral { value: 2, position: pos() },
			position: pos(),
		}];
		assert!(evaluator.eval_program(&program, &scope).is_error());
	}

	#[test]
	fn assign_requires_matching_declared_type() {
		let mut evaluator = Evaluator::new("<test>");
		let scope = Scope::new_root();
		Scope::insert(&scope, "x", Value::Integer(1), Type::Int);
		let program = vec![Statement::Assign {
			identifier: ident("x"),
			value: Expression::StringLiteral {
				value: "oops".to_owned(),
				position: pos(),
			},
			position: pos(),
		}];
		assert!(evaluator.eval_program(&program, &scope).is_error());
	}

	#[test]
	fn for_loop_scope_does_not_persist_bindings_across_iterations() {
		let mut evaluator = Evaluator::new("<test>");
		let scope = Scope::new_root();
		Scope::insert(&scope, "i", Value::Integer(0), Type::Int);
		let program = vec![Statement::ForLoop {
			condition: Expression::Infix {
				operator: TokenKind::Lt,
				left: Box::new(Expression::Identifier(ident("i"))),
				right: Box::new(Expression::IntegerLiteral { value: 3, position: pos() }),
				position: pos(),
			},
			body: vec![
				Statement::DeclareAssign {
					identifier: ident("tmp"),
					value: Expression::IntegerLiteral { value: 1, position: pos() },
					position: pos(),
				},
				Statement::Assign {
					identifier: ident("i"),
					value: Expression::Infix {
						operator: TokenKind::Plus,
						left: Box::new(Expression::Identifier(ident("i"))),
						right: Box::new(Expression::IntegerLiteral { value: 1, position: pos() }),
						position: pos(),
					},
					position: pos(),
				},
			],
			position: pos(),
		}];
		evaluator.eval_program(&program, &scope);
		assert!(matches!(Scope::lookup(&scope, "i"), Some(crate::scope::Symbol { value: Value::Integer(3), .. })));
		assert!(Scope::lookup(&scope, "tmp").is_none());
	}

	#[test]
	fn mismatched_infix_types_are_a_type_mismatch_error() {
		let mut evaluator = Evaluator::new("<test>");
		let scope = Scope::new_root();
		let expression = Expression::Infix {
			operator: TokenKind::Plus,
			left: Box::new(Expression::IntegerLiteral { value: 1, position: pos() }),
			right: Box::new(Expression::StringLiteral {
				value: "x".to_owned(),
				position: pos(),
			}),
			position: pos(),
		};
		let result = evaluator.eval_expression(&expression, &scope);
		assert!(matches!(result, Value::Error(ErrorValue { .. })));
	}

	#[test]
	fn function_call_memoizes_identical_invocations() {
		let mut evaluator = Evaluator::new("<test>");
		let scope = Scope::new_root();
		let function = Rc::new(FunctionValue {
			name: "add".to_owned(),
			parameters: vec![
				Parameter {
					identifier: ident("a"),
					declared_type: Type::Int,
				},
				Parameter {
					identifier: ident("b"),
					declared_type: Type::Int,
				},
			],
			body: vec![Statement::Return {
				value: Some(Expression::Infix {
					operator: TokenKind::Plus,
					left: Box::new(Expression::Identifier(ident("a"))),
					right: Box::new(Expression::Identifier(ident("b"))),
					position: pos(),
				}),
				position: pos(),
			}],
			capturing_scope: Rc::clone(&scope),
			return_type: Some(Type::Int),
		});
		let first = evaluator.call_function(&function, &[Value::Integer(2), Value::Integer(3)], pos());
		let second = evaluator.call_function(&function, &[Value::Integer(2), Value::Integer(3)], pos());
		assert!(matches!(first, Value::Integer(5)));
		assert!(matches!(second, Value::Integer(5)));
		assert_eq!(evaluator.memo.len(), 1);
	}

	#[test]
	fn division_by_zero_is_an_error_not_a_panic() {
		let mut evaluator = Evaluator::new("<test>");
		let scope = Scope::new_root();
		let expression = Expression::Infix {
			operator: TokenKind::Slash,
			left: Box::new(Expression::IntegerLiteral { value: 1, position: pos() }),
			right: Box::new(Expression::IntegerLiteral { value: 0, position: pos() }),
			position: pos(),
		};
		assert!(evaluator.eval_expression(&expression, &scope).is_error());
	}
}
