//! The built-in function registry: a constant hashmap from name to implementation, the same
//! `phf::phf_map!` idiom used for the builtin table elsewhere in this toolchain's lineage. Looked
//! up by both the tree-walking evaluator (`FunctionCall` on a name with no user binding) and the
//! compiler/VM (which only special-cases `print`, per spec §4.H).

use crate::ast::Type;
use crate::evaluator::errors::EvalError;
use crate::evaluator::value::Value;

pub struct Builtin {
	pub name: &'static str,
	pub call: fn(&[Value]) -> Result<Value, EvalError>,
}

fn call_print(args: &[Value]) -> Result<Value, EvalError> {
	let rendered = args.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
	println!("{rendered}");
	Ok(Value::Null)
}

fn call_typeof(args: &[Value]) -> Result<Value, EvalError> {
	let [value] = args else {
		return Err(EvalError::ArityMismatch { got: args.len(), want: 1 });
	};
	Ok(Value::Type(value.runtime_type()))
}

fn call_int(args: &[Value]) -> Result<Value, EvalError> {
	let [value] = args else {
		return Err(EvalError::ArityMismatch { got: args.len(), want: 1 });
	};
	match value {
		Value::Float(value) => Ok(Value::Integer(*value as i64)),
		other => Err(EvalError::type_mismatch(other.runtime_type(), "as", Type::Int)),
	}
}

fn call_float(args: &[Value]) -> Result<Value, EvalError> {
	let [value] = args else {
		return Err(EvalError::ArityMismatch { got: args.len(), want: 1 });
	};
	match value {
		#[allow(clippy::cast_precision_loss)]
		Value::Integer(value) => Ok(Value::Float(*value as f64)),
		other => Err(EvalError::type_mismatch(other.runtime_type(), "as", Type::Float)),
	}
}

pub static BUILTINS: phf::Map<&'static str, Builtin> = phf::phf_map! {
	"print" => Builtin { name: "print", call: call_print },
	"typeof" => Builtin { name: "typeof", call: call_typeof },
	"int" => Builtin { name: "int", call: call_int },
	"float" => Builtin { name: "float", call: call_float },
};

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn typeof_reports_runtime_type() {
		let builtin = BUILTINS.get("typeof").expect("typeof is registered");
		let result = (builtin.call)(&[Value::Integer(1)]).expect("typeof(1) succeeds");
		assert!(matches!(result, Value::Type(Type::Int)));
	}

	#[test]
	fn int_requires_a_float() {
		let builtin = BUILTINS.get("int").expect("int is registered");
		assert!((builtin.call)(&[Value::Float(3.9)]).is_ok());
		assert!((builtin.call)(&[Value::Integer(3)]).is_err());
	}

	#[test]
	fn float_requires_an_integer() {
		let builtin = BUILTINS.get("float").expect("float is registered");
		assert!((builtin.call)(&[Value::Integer(3)]).is_ok());
		assert!((builtin.call)(&[Value::Float(3.0)]).is_err());
	}
}
