//! The scope tree: a nested, optionally-named symbol table per spec §3/§4.E. Scopes form a tree
//! with a ref-counted shared outer handle rather than raw back-pointers (no cycles: a child only
//! ever points up, never the reverse), so dropping the last owning `ScopeRef` to an inner scope
//! tears the whole subtree down. See `crate::evaluator` for the consumer.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::Type;
use crate::evaluator::value::Value;

/// A binding: its current value and the declared type it was introduced with. The declared type
/// never changes after insertion; `try_assign` only ever replaces `value`.
#[derive(Debug, Clone)]
pub struct Symbol {
	pub value: Value,
	pub declared_type: Type,
}

/// A scope: local bindings, lazily-created named children (packages), and a handle to the outer
/// scope it falls back to on lookup. The root scope has no outer.
pub struct Scope {
	name: Option<String>,
	outer: Option<ScopeRef>,
	bindings: HashMap<String, Symbol>,
	named_children: HashMap<String, ScopeRef>,
}

/// Shared ownership handle to a `Scope`. Cloning a `ScopeRef` shares the same underlying table;
/// it does not copy bindings.
pub type ScopeRef = Rc<RefCell<Scope>>;

impl Scope {
	#[must_use]
	pub fn new_root() -> ScopeRef {
		Rc::new(RefCell::new(Self {
			name: None,
			outer: None,
			bindings: HashMap::new(),
			named_children: HashMap::new(),
		}))
	}

	#[must_use]
	pub fn new_inner(outer: &ScopeRef) -> ScopeRef {
		Rc::new(RefCell::new(Self {
			name: None,
			outer: Some(Rc::clone(outer)),
			bindings: HashMap::new(),
			named_children: HashMap::new(),
		}))
	}

	#[must_use]
	pub fn named(outer: &ScopeRef, name: impl Into<String>) -> ScopeRef {
		Rc::new(RefCell::new(Self {
			name: Some(name.into()),
			outer: Some(Rc::clone(outer)),
			bindings: HashMap::new(),
			named_children: HashMap::new(),
		}))
	}

	#[must_use]
	pub fn display_name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	/// Overwrite-or-create a binding in this frame. Callers that must reject redeclaration
	/// (`Declare`/`DeclareAssign`) check `lookup_local` first; `insert` itself never fails.
	pub fn insert(scope: &ScopeRef, name: impl Into<String>, value: Value, declared_type: Type) {
		scope.borrow_mut().bindings.insert(name.into(), Symbol { value, declared_type });
	}

	/// Reassigns the innermost visible binding of `name`. Never creates a binding — it is a
	/// logic error for a caller to invoke this without having already confirmed `lookup` found
	/// something, and that invariant is enforced by returning `false` rather than inserting.
	#[must_use]
	pub fn try_assign(scope: &ScopeRef, name: &str, value: Value) -> bool {
		if scope.borrow().bindings.contains_key(name) {
			scope.borrow_mut().bindings.get_mut(name).expect("checked above").value = value;
			return true;
		}
		let outer = scope.borrow().outer.clone();
		match outer {
			Some(outer) => Self::try_assign(&outer, name, value),
			None => false,
		}
	}

	#[must_use]
	pub fn lookup(scope: &ScopeRef, name: &str) -> Option<Symbol> {
		if let Some(symbol) = scope.borrow().bindings.get(name) {
			return Some(symbol.clone());
		}
		let outer = scope.borrow().outer.clone();
		outer.and_then(|outer| Self::lookup(&outer, name))
	}

	#[must_use]
	pub fn lookup_local(scope: &ScopeRef, name: &str) -> Option<Symbol> {
		scope.borrow().bindings.get(name).cloned()
	}

	/// Returns the child named scope, lazily creating it (with `scope` as its outer) on first
	/// request.
	#[must_use]
	pub fn named_scope(scope: &ScopeRef, name: &str) -> ScopeRef {
		if let Some(child) = scope.borrow().named_children.get(name) {
			return Rc::clone(child);
		}
		let child = Self::named(scope, name);
		scope.borrow_mut().named_children.insert(name.to_owned(), Rc::clone(&child));
		child
	}

	/// Returns the child named scope only if it already exists, without creating one. Used by
	/// `import`, which requires the package to already be present.
	#[must_use]
	pub fn named_scope_if_exists(scope: &ScopeRef, name: &str) -> Option<ScopeRef> {
		scope.borrow().named_children.get(name).map(Rc::clone)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lookup_walks_outer_chain() {
		let root = Scope::new_root();
		Scope::insert(&root, "x", Value::Integer(1), Type::Int);
		let inner = Scope::new_inner(&root);
		assert!(matches!(Scope::lookup(&inner, "x"), Some(Symbol { value: Value::Integer(1), .. })));
		assert!(Scope::lookup_local(&inner, "x").is_none());
	}

	#[test]
	fn try_assign_only_mutates_existing_binding() {
		let root = Scope::new_root();
		assert!(!Scope::try_assign(&root, "missing", Value::Integer(1)));
		Scope::insert(&root, "x", Value::Integer(1), Type::Int);
		let inner = Scope::new_inner(&root);
		assert!(Scope::try_assign(&inner, "x", Value::Integer(2)));
		assert!(matches!(Scope::lookup(&root, "x"), Some(Symbol { value: Value::Integer(2), .. })));
		assert!(Scope::lookup_local(&inner, "x").is_none(), "try_assign must not create a local binding");
	}

	#[test]
	fn named_scope_is_created_lazily_and_reused() {
		let root = Scope::new_root();
		assert!(Scope::named_scope_if_exists(&root, "pkg").is_none());
		let first = Scope::named_scope(&root, "pkg");
		let second = Scope::named_scope(&root, "pkg");
		assert!(Rc::ptr_eq(&first, &second));
		assert_eq!(first.borrow().display_name(), Some("pkg"));
	}

	#[test]
	fn inner_scope_is_fresh_each_call() {
		let root = Scope::new_root();
		let a = Scope::new_inner(&root);
		Scope::insert(&a, "tmp", Value::Integer(1), Type::Int);
		let b = Scope::new_inner(&root);
		assert!(Scope::lookup_local(&b, "tmp").is_none());
	}
}
