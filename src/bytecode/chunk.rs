//! A compiled unit: the flat instruction vector plus the five constant-pool partitions it
//! indexes into (spec §6.4). In-memory only — nothing here is ever serialized to disk.

use super::constant_pool::ConstantPool;
use super::opcodes::Opcode;

#[derive(Debug, Clone, Default)]
pub struct Chunk {
	code: Vec<u8>,
	pub constants: ConstantPool,
}

impl Chunk {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.code.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.code.is_empty()
	}

	#[must_use]
	pub fn byte(&self, offset: usize) -> Option<u8> {
		self.code.get(offset).copied()
	}

	/// Appends `opcode` with no operand, returning the offset it was written at.
	pub fn write_op(&mut self, opcode: Opcode) -> usize {
		let offset = self.code.len();
		self.code.push(opcode.to_byte());
		offset
	}

	/// Appends `opcode` followed by its single operand byte, returning the opcode's offset.
	pub fn write_op_with_operand(&mut self, opcode: Opcode, operand: u8) -> usize {
		self.write_op_with_operands(opcode, &[operand])
	}

	/// Appends `opcode` followed by `operands` verbatim, returning the opcode's offset. Only
	/// `CreateFunc` currently needs more than one operand byte.
	pub fn write_op_with_operands(&mut self, opcode: Opcode, operands: &[u8]) -> usize {
		let offset = self.code.len();
		self.code.push(opcode.to_byte());
		self.code.extend_from_slice(operands);
		offset
	}

	/// Rewrites a previously-written jump's operand byte, used to patch a forward jump once its
	/// target offset is known.
	pub fn patch_operand(&mut self, opcode_offset: usize, operand: u8) {
		self.patch_byte(opcode_offset + 1, operand);
	}

	/// Rewrites an arbitrary byte already written to the chunk, by absolute offset.
	///
	/// # Panics
	/// Panics if `offset` is outside the chunk, which would mean the caller patched an offset it
	/// never wrote itself.
	pub fn patch_byte(&mut self, offset: usize, value: u8) {
		*self.code.get_mut(offset).expect("patched offset was written by this chunk") = value;
	}

	/// Renders the chunk as `" IP  │  OPCODE_NUM  OPCODE_NAME  PARAM"` rows (spec §6.4), one per
	/// instruction, for debugging and the `-p`/disassembly paths.
	#[must_use]
	pub fn disassemble(&self) -> String {
		let mut rows = Vec::new();
		let mut ip = 0;
		while ip < self.code.len() {
			let byte = self.code.get(ip).copied().unwrap_or(0);
			let Some(opcode) = Opcode::from_byte(byte) else {
				rows.push(format!(" {ip:>4}  │  {byte:>3}  UNKNOWN"));
				ip += 1;
				continue;
			};
			let operand_len = opcode.operand_len();
			if operand_len > 0 {
				let operands = (0..operand_len).map(|offset| self.code.get(ip + 1 + offset).copied().unwrap_or(0).to_string()).collect::<Vec<_>>().join(" ");
				rows.push(format!(" {ip:>4}  │  {byte:>3}  {}  {operands}", opcode.name()));
				ip += 1 + operand_len;
			} else {
				rows.push(format!(" {ip:>4}  │  {byte:>3}  {}", opcode.name()));
				ip += 1;
			}
		}
		rows.join("\n")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn disassemble_renders_one_row_per_instruction() {
		let mut chunk = Chunk::new();
		let address = chunk.constants.insert_int(42).unwrap();
		chunk.write_op_with_operand(Opcode::PushInt, address);
		chunk.write_op(Opcode::PrintInt);
		chunk.write_op(Opcode::Halt);
		let rendered = chunk.disassemble();
		assert_eq!(rendered.lines().count(), 3);
		assert!(rendered.contains("PUSH_INT"));
		assert!(rendered.contains("PRINT_INT"));
		assert!(rendered.contains("HALT"));
	}

	#[test]
	fn patch_operand_rewrites_a_jump_target() {
		let mut chunk = Chunk::new();
		let jump = chunk.write_op_with_operand(Opcode::Jmp, 0);
		chunk.write_op(Opcode::Halt);
		chunk.patch_operand(jump, 5);
		assert_eq!(chunk.byte(jump + 1), Some(5));
	}
}
