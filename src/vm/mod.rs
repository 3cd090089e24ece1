//! The stack-based virtual machine (spec §4.I): five typed operand stacks, a runtime symbol
//! table mapping a bound name to where its value lives in a typed backing array, and a fetch
//!/advance/dispatch execution loop. Control-flow and function opcodes are fully implemented here
//! even though the current compiler (`crate::compiler`) never emits them — the byte-code format
//! scaffolds them (spec §9) and a VM that can't execute its own instruction set isn't much of one.

use std::collections::HashMap;

use crate::ast::Type;
use crate::bytecode::{Chunk, Opcode};

#[derive(Debug, Clone, PartialEq)]
pub enum VmError {
	StackUnderflow { stack: &'static str },
	UnknownOpcode { byte: u8 },
	ConstantMissing { partition: &'static str, address: u8 },
	NameUndefined { name: String },
	TypeMismatch { name: String, expected: Type, found: Type },
	DivisionByZero,
	CallStackUnderflow,
	FunctionUndefined { name: String },
}

impl std::fmt::Display for VmError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::StackUnderflow { stack } => write!(f, "{stack} stack underflow"),
			Self::UnknownOpcode { byte } => write!(f, "unknown opcode byte {byte}"),
			Self::ConstantMissing { partition, address } => write!(f, "no {partition} constant at address {address}"),
			Self::NameUndefined { name } => write!(f, "identifier not found: {name}"),
			Self::TypeMismatch { name, expected, found } => write!(f, "{name} is bound as {expected}, not {found}"),
			Self::DivisionByZero => write!(f, "division by zero"),
			Self::CallStackUnderflow => write!(f, "return with no matching call"),
			Self::FunctionUndefined { name } => write!(f, "couldn't find function named '{name}'"),
		}
	}
}

impl std::error::Error for VmError {}

#[derive(Default)]
struct Stacks {
	ints: Vec<i64>,
	floats: Vec<f64>,
	bools: Vec<bool>,
	chars: Vec<char>,
	strings: Vec<String>,
}

macro_rules! stack_ops {
	($push:ident, $pop:ident, $field:ident, $t:ty, $label:literal) => {
		fn $push(&mut self, value: $t) {
			self.$field.push(value);
		}

		fn $pop(&mut self) -> Result<$t, VmError> {
			self.$field.pop().ok_or(VmError::StackUnderflow { stack: $label })
		}
	};
}

impl Stacks {
	stack_ops!(push_int, pop_int, ints, i64, "int");
	stack_ops!(push_float, pop_float, floats, f64, "float");
	stack_ops!(push_bool, pop_bool, bools, bool, "bool");
	stack_ops!(push_char, pop_char, chars, char, "char");
	stack_ops!(push_string, pop_string, strings, String, "string");
}

/// Where one bound name's value actually lives: which typed backing array, and its index there.
#[derive(Debug, Clone, Copy)]
struct Binding {
	value_type: Type,
	index: usize,
}

#[derive(Default)]
struct Backing {
	ints: Vec<i64>,
	floats: Vec<f64>,
	bools: Vec<bool>,
	chars: Vec<char>,
	strings: Vec<String>,
}

pub struct Vm {
	stacks: Stacks,
	backing: Backing,
	symbols: HashMap<String, Binding>,
	functions: HashMap<String, usize>,
	call_stack: Vec<usize>,
	ip: usize,
}

impl Vm {
	#[must_use]
	pub fn new() -> Self {
		Self {
			stacks: Stacks::default(),
			backing: Backing::default(),
			symbols: HashMap::new(),
			functions: HashMap::new(),
			call_stack: Vec::new(),
			ip: 0,
		}
	}

	/// Runs `chunk` to completion (a `HALT` opcode, or falling off the end of the instruction
	/// vector, which is treated the same way).
	pub fn run(&mut self, chunk: &Chunk) -> Result<(), VmError> {
		self.ip = 0;
		while self.ip < chunk.len() {
			let byte = chunk.byte(self.ip).expect("ip is in bounds");
			let opcode = Opcode::from_byte(byte).ok_or(VmError::UnknownOpcode { byte })?;
			self.ip += 1;
			if opcode == Opcode::Halt {
				return Ok(());
			}
			self.execute(opcode, chunk)?;
		}
		Ok(())
	}

	fn read_operand(&mut self, chunk: &Chunk) -> u8 {
		let operand = chunk.byte(self.ip).unwrap_or(0);
		self.ip += 1;
		operand
	}

	fn string_at(&self, chunk: &Chunk, address: u8) -> Result<String, VmError> {
		chunk
			.constants
			.string(address)
			.cloned()
			.ok_or(VmError::ConstantMissing { partition: "string", address })
	}

	fn bind(&mut self, name: String, value_type: Type, index: usize) {
		self.symbols.insert(name, Binding { value_type, index });
	}

	fn binding_for(&self, name: &str, expected: Type) -> Result<Binding, VmError> {
		let binding = self.symbols.get(name).ok_or_else(|| VmError::NameUndefined { name: name.to_owned() })?;
		if binding.value_type != expected {
			return Err(VmError::TypeMismatch {
				name: name.to_owned(),
				expected: binding.value_type,
				found: expected,
			});
		}
		Ok(*binding)
	}

	#[allow(clippy::too_many_lines)]
	fn execute(&mut self, opcode: Opcode, chunk: &Chunk) -> Result<(), VmError> {
		match opcode {
			Opcode::PushInt => {
				let address = self.read_operand(chunk);
				let value = *chunk.constants.int(address).ok_or(VmError::ConstantMissing { partition: "int", address })?;
				self.stacks.push_int(value);
			}
			Opcode::PushFloat => {
				let address = self.read_operand(chunk);
				let value = *chunk.constants.float(address).ok_or(VmError::ConstantMissing { partition: "float", address })?;
				self.stacks.push_float(value);
			}
			Opcode::PushBool => {
				let address = self.read_operand(chunk);
				let value = *chunk.constants.bool(address).ok_or(VmError::ConstantMissing { partition: "bool", address })?;
				self.stacks.push_bool(value);
			}
			Opcode::PushChar => {
				let address = self.read_operand(chunk);
				let value = *chunk.constants.char(address).ok_or(VmError::ConstantMissing { partition: "char", address })?;
				self.stacks.push_char(value);
			}
			Opcode::PushString => {
				let address = self.read_operand(chunk);
				let value = self.string_at(chunk, address)?;
				self.stacks.push_string(value);
			}

			Opcode::AddInt => self.binary_int(i64::wrapping_add)?,
			Opcode::SubInt => self.binary_int(i64::wrapping_sub)?,
			Opcode::MulInt => self.binary_int(i64::wrapping_mul)?,
			Opcode::DivInt => {
				let rhs = self.stacks.pop_int()?;
				let lhs = self.stacks.pop_int()?;
				if rhs == 0 {
					return Err(VmError::DivisionByZero);
				}
				self.stacks.push_int(lhs.wrapping_div(rhs));
			}
			Opcode::ModInt => {
				let rhs = self.stacks.pop_int()?;
				let lhs = self.stacks.pop_int()?;
				if rhs == 0 {
					return Err(VmError::DivisionByZero);
				}
				self.stacks.push_int(lhs.wrapping_rem(rhs));
			}
			Opcode::NegInt => {
				let value = self.stacks.pop_int()?;
				self.stacks.push_int(value.wrapping_neg());
			}

			Opcode::AddFloat => self.binary_float(|a, b| a + b)?,
			Opcode::SubFloat => self.binary_float(|a, b| a - b)?,
			Opcode::MulFloat => self.binary_float(|a, b| a * b)?,
			Opcode::DivFloat => self.binary_float(|a, b| a / b)?,
			Opcode::ModFloat => self.binary_float(|a, b| a % b)?,
			Opcode::NegFloat => {
				let value = self.stacks.pop_float()?;
				self.stacks.push_float(-value);
			}

			Opcode::ConcatString => {
				let rhs = self.stacks.pop_string()?;
				let lhs = self.stacks.pop_string()?;
				self.stacks.push_string(lhs + &rhs);
			}

			Opcode::EqInt => self.compare_int(|a, b| a == b)?,
			Opcode::NeqInt => self.compare_int(|a, b| a != b)?,
			Opcode::LtInt => self.compare_int(|a, b| a < b)?,
			Opcode::LteInt => self.compare_int(|a, b| a <= b)?,
			Opcode::GtInt => self.compare_int(|a, b| a > b)?,
			Opcode::GteInt => self.compare_int(|a, b| a >= b)?,

			Opcode::EqFloat => self.compare_float(|a, b| a == b)?,
			Opcode::NeqFloat => self.compare_float(|a, b| a != b)?,
			Opcode::LtFloat => self.compare_float(|a, b| a < b)?,
			Opcode::LteFloat => self.compare_float(|a, b| a <= b)?,
			Opcode::GtFloat => self.compare_float(|a, b| a > b)?,
			Opcode::GteFloat => self.compare_float(|a, b| a >= b)?,

			Opcode::EqBool => {
				let rhs = self.stacks.pop_bool()?;
				let lhs = self.stacks.pop_bool()?;
				self.stacks.push_bool(lhs == rhs);
			}
			Opcode::NeqBool => {
				let rhs = self.stacks.pop_bool()?;
				let lhs = self.stacks.pop_bool()?;
				self.stacks.push_bool(lhs != rhs);
			}
			Opcode::EqChar => {
				let rhs = self.stacks.pop_char()?;
				let lhs = self.stacks.pop_char()?;
				self.stacks.push_bool(lhs == rhs);
			}
			Opcode::NeqChar => {
				let rhs = self.stacks.pop_char()?;
				let lhs = self.stacks.pop_char()?;
				self.stacks.push_bool(lhs != rhs);
			}
			Opcode::EqString => {
				let rhs = self.stacks.pop_string()?;
				let lhs = self.stacks.pop_string()?;
				self.stacks.push_bool(lhs == rhs);
			}
			Opcode::NeqString => {
				let rhs = self.stacks.pop_string()?;
				let lhs = self.stacks.pop_string()?;
				self.stacks.push_bool(lhs != rhs);
			}

			Opcode::VarBindInt => {
				let address = self.read_operand(chunk);
				let name = self.string_at(chunk, address)?;
				let value = self.stacks.pop_int()?;
				let index = self.backing.ints.len();
				self.backing.ints.push(value);
				self.bind(name, Type::Int, index);
			}
			Opcode::VarBindFloat => {
				let address = self.read_operand(chunk);
				let name = self.string_at(chunk, address)?;
				let value = self.stacks.pop_float()?;
				let index = self.backing.floats.len();
				self.backing.floats.push(value);
				self.bind(name, Type::Float, index);
			}
			Opcode::VarBindBool => {
				let address = self.read_operand(chunk);
				let name = self.string_at(chunk, address)?;
				let value = self.stacks.pop_bool()?;
				let index = self.backing.bools.len();
				self.backing.bools.push(value);
				self.bind(name, Type::Bool, index);
			}
			Opcode::VarBindChar => {
				let address = self.read_operand(chunk);
				let name = self.string_at(chunk, address)?;
				let value = self.stacks.pop_char()?;
				let index = self.backing.chars.len();
				self.backing.chars.push(value);
				self.bind(name, Type::Char, index);
			}
			Opcode::VarBindString => {
				let address = self.read_operand(chunk);
				let name = self.string_at(chunk, address)?;
				let value = self.stacks.pop_string()?;
				let index = self.backing.strings.len();
				self.backing.strings.push(value);
				self.bind(name, Type::String, index);
			}

			Opcode::VarLookupInt => {
				let address = self.read_operand(chunk);
				let name = self.string_at(chunk, address)?;
				let binding = self.binding_for(&name, Type::Int)?;
				self.stacks.push_int(*self.backing.ints.get(binding.index).expect("bound index is in range"));
			}
			Opcode::VarLookupFloat => {
				let address = self.read_operand(chunk);
				let name = self.string_at(chunk, address)?;
				let binding = self.binding_for(&name, Type::Float)?;
				self.stacks.push_float(*self.backing.floats.get(binding.index).expect("bound index is in range"));
			}
			Opcode::VarLookupBool => {
				let address = self.read_operand(chunk);
				let name = self.string_at(chunk, address)?;
				let binding = self.binding_for(&name, Type::Bool)?;
				self.stacks.push_bool(*self.backing.bools.get(binding.index).expect("bound index is in range"));
			}
			Opcode::VarLookupChar => {
				let address = self.read_operand(chunk);
				let name = self.string_at(chunk, address)?;
				let binding = self.binding_for(&name, Type::Char)?;
				self.stacks.push_char(*self.backing.chars.get(binding.index).expect("bound index is in range"));
			}
			Opcode::VarLookupString => {
				let address = self.read_operand(chunk);
				let name = self.string_at(chunk, address)?;
				let binding = self.binding_for(&name, Type::String)?;
				self.stacks.push_string(self.backing.strings.get(binding.index).cloned().expect("bound index is in range"));
			}

			Opcode::PrintInt => println!("{}", self.stacks.pop_int()?),
			Opcode::PrintFloat => println!("{}", self.stacks.pop_float()?),
			Opcode::PrintBool => println!("{}", self.stacks.pop_bool()?),
			Opcode::PrintChar => println!("{}", self.stacks.pop_char()?),
			Opcode::PrintString => println!("{}", self.stacks.pop_string()?),

			// Structural markers: a real lowering compiles `if`/`for`/`break` down to the
			// JMP/BT/BF instructions below. Left as no-ops since nothing currently emits them.
			Opcode::If | Opcode::Else | Opcode::EndIf | Opcode::For | Opcode::Next | Opcode::Break => {}

			Opcode::Jmp => {
				let offset = self.read_operand(chunk);
				self.ip = self.ip.wrapping_add(relative(offset));
			}
			Opcode::Bt => {
				let offset = self.read_operand(chunk);
				if self.stacks.pop_bool()? {
					self.ip = self.ip.wrapping_add(relative(offset));
				}
			}
			Opcode::Bf => {
				let offset = self.read_operand(chunk);
				if !self.stacks.pop_bool()? {
					self.ip = self.ip.wrapping_add(relative(offset));
				}
			}

			Opcode::CreateFunc => {
				let address = self.read_operand(chunk);
				let body_length = self.read_operand(chunk);
				let name = self.string_at(chunk, address)?;
				self.functions.insert(name, self.ip);
				self.ip += body_length as usize;
			}
			Opcode::CallInt | Opcode::CallFloat | Opcode::CallBool | Opcode::CallChar | Opcode::CallString | Opcode::CallVoid => {
				let address = self.read_operand(chunk);
				let name = self.string_at(chunk, address)?;
				let target = *self.functions.get(&name).ok_or(VmError::FunctionUndefined { name })?;
				self.call_stack.push(self.ip);
				self.ip = target;
			}
			Opcode::ReturnInt => {
				let value = self.stacks.pop_int()?;
				self.ip = self.call_stack.pop().ok_or(VmError::CallStackUnderflow)?;
				self.stacks.push_int(value);
			}
			Opcode::ReturnFloat => {
				let value = self.stacks.pop_float()?;
				self.ip = self.call_stack.pop().ok_or(VmError::CallStackUnderflow)?;
				self.stacks.push_float(value);
			}
			Opcode::ReturnBool => {
				let value = self.stacks.pop_bool()?;
				self.ip = self.call_stack.pop().ok_or(VmError::CallStackUnderflow)?;
				self.stacks.push_bool(value);
			}
			Opcode::ReturnChar => {
				let value = self.stacks.pop_char()?;
				self.ip = self.call_stack.pop().ok_or(VmError::CallStackUnderflow)?;
				self.stacks.push_char(value);
			}
			Opcode::ReturnString => {
				let value = self.stacks.pop_string()?;
				self.ip = self.call_stack.pop().ok_or(VmError::CallStackUnderflow)?;
				self.stacks.push_string(value);
			}
			Opcode::ReturnVoid => {
				self.ip = self.call_stack.pop().ok_or(VmError::CallStackUnderflow)?;
			}

			Opcode::Halt => unreachable!("HALT is handled by the run loop before dispatch"),
		}
		Ok(())
	}

	fn binary_int(&mut self, op: fn(i64, i64) -> i64) -> Result<(), VmError> {
		let rhs = self.stacks.pop_int()?;
		let lhs = self.stacks.pop_int()?;
		self.stacks.push_int(op(lhs, rhs));
		Ok(())
	}

	fn binary_float(&mut self, op: fn(f64, f64) -> f64) -> Result<(), VmError> {
		let rhs = self.stacks.pop_float()?;
		let lhs = self.stacks.pop_float()?;
		self.stacks.push_float(op(lhs, rhs));
		Ok(())
	}

	fn compare_int(&mut self, op: fn(i64, i64) -> bool) -> Result<(), VmError> {
		let rhs = self.stacks.pop_int()?;
		let lhs = self.stacks.pop_int()?;
		self.stacks.push_bool(op(lhs, rhs));
		Ok(())
	}

	fn compare_float(&mut self, op: fn(f64, f64) -> bool) -> Result<(), VmError> {
		let rhs = self.stacks.pop_float()?;
		let lhs = self.stacks.pop_float()?;
		self.stacks.push_bool(op(lhs, rhs));
		Ok(())
	}
}

impl Default for Vm {
	fn default() -> Self {
		Self::new()
	}
}

/// Interprets a jump operand byte as a signed relative offset, per spec §4.I.
fn relative(offset: u8) -> usize {
	offset as i8 as isize as usize
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::compiler::Compiler;
	use crate::parser::parse;

	fn run_source(source: &str) -> Result<(), VmError> {
		let (program, parse_errors) = parse(source);
		assert!(parse_errors.is_empty(), "{parse_errors:?}");
		let (chunk, compile_errors) = Compiler::new().compile_program(&program);
		assert!(compile_errors.is_empty(), "{compile_errors:?}");
		Vm::new().run(&chunk)
	}

	#[test]
	fn runs_a_declare_assign_and_print() {
		assert!(run_source("x := 2 + 3\nprint(x)").is_ok());
	}

	#[test]
	fn division_by_zero_is_a_runtime_error_not_a_panic() {
		assert_eq!(run_source("x := 1\ny := 0\nz := x / y"), Err(VmError::DivisionByZero));
	}

	#[test]
	fn jmp_skips_the_instruction_it_jumps_over() {
		let mut chunk = Chunk::new();
		let skip_target = chunk.write_op_with_operand(Opcode::Jmp, 0);
		let address = chunk.constants.insert_int(99).unwrap();
		chunk.write_op_with_operand(Opcode::PushInt, address); // should be skipped
		let landing = chunk.len();
		chunk.patch_operand(skip_target, (landing - (skip_target + 2)) as u8);
		let other_address = chunk.constants.insert_int(1).unwrap();
		chunk.write_op_with_operand(Opcode::PushInt, other_address);
		chunk.write_op(Opcode::Halt);

		let mut vm = Vm::new();
		vm.run(&chunk).expect("run succeeds");
		assert_eq!(vm.stacks.ints, vec![1]);
	}

	#[test]
	fn call_and_return_round_trip_through_the_call_stack() {
		let mut chunk = Chunk::new();
		let name_address = chunk.constants.insert_string("double".to_owned()).unwrap();
		let two_address = chunk.constants.insert_int(2).unwrap();

		// CreateFunc's second operand (the body length) is patched in once the body is written.
		let create = chunk.write_op_with_operands(Opcode::CreateFunc, &[name_address, 0]);
		let body_start = chunk.len();
		chunk.write_op_with_operand(Opcode::PushInt, two_address);
		chunk.write_op(Opcode::MulInt);
		chunk.write_op(Opcode::ReturnInt);
		let body_length = (chunk.len() - body_start) as u8;
		chunk.patch_byte(create + 2, body_length);

		chunk.write_op_with_operand(Opcode::CallInt, name_address);
		chunk.write_op(Opcode::PrintInt);
		chunk.write_op(Opcode::Halt);

		let mut vm = Vm::new();
		vm.stacks.push_int(21);
		vm.run(&chunk).expect("run succeeds");
		assert!(vm.stacks.ints.is_empty(), "print should have consumed the result");
	}
}
