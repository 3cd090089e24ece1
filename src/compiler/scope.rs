//! The compiler's symbol table: unlike the evaluator's runtime `Scope` tree, this tracks no
//! values — only where a name's text lives in the constant pool's string partition, and what type
//! it was last bound at, so `VAR_LOOKUP[T]` can be emitted without re-deriving the type.

use std::collections::HashMap;

use crate::ast::Type;

#[derive(Debug, Default)]
pub struct CompileScope {
	bindings: HashMap<String, (u8, Type)>,
}

impl CompileScope {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	pub fn bind(&mut self, name: impl Into<String>, name_address: u8, declared_type: Type) {
		self.bindings.insert(name.into(), (name_address, declared_type));
	}

	#[must_use]
	pub fn lookup(&self, name: &str) -> Option<(u8, Type)> {
		self.bindings.get(name).copied()
	}
}
