//! The constant pool (spec §4.G): five append-only arrays, one per primitive type. Insertion
//! never deduplicates — inserting the same literal twice returns two distinct addresses. One-byte
//! operands cap each partition at 256 entries; see `ConstantPoolError` for what happens past that.

#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
	ints: Vec<i64>,
	floats: Vec<f64>,
	bools: Vec<bool>,
	chars: Vec<char>,
	strings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPoolFull;

impl std::fmt::Display for ConstantPoolFull {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "constant pool partition is full (limit 256 entries)")
	}
}

impl std::error::Error for ConstantPoolFull {}

macro_rules! partition {
	($insert:ident, $get:ident, $field:ident, $t:ty) => {
		/// Appends `value`, returning its one-byte address. Errors once the partition holds 256
		/// entries, the known limit a one-byte operand can address (spec §9).
		pub fn $insert(&mut self, value: $t) -> Result<u8, ConstantPoolFull> {
			if self.$field.len() >= u8::MAX as usize + 1 {
				return Err(ConstantPoolFull);
			}
			let address = self.$field.len() as u8;
			self.$field.push(value);
			Ok(address)
		}

		#[must_use]
		pub fn $get(&self, address: u8) -> Option<&$t> {
			self.$field.get(address as usize)
		}
	};
}

impl ConstantPool {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	partition!(insert_int, int, ints, i64);
	partition!(insert_float, float, floats, f64);
	partition!(insert_bool, bool, bools, bool);
	partition!(insert_char, char, chars, char);
	partition!(insert_string, string, strings, String);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn insertion_never_deduplicates() {
		let mut pool = ConstantPool::new();
		let first = pool.insert_int(7).unwrap();
		let second = pool.insert_int(7).unwrap();
		assert_ne!(first, second);
		assert_eq!(pool.int(first), Some(&7));
		assert_eq!(pool.int(second), Some(&7));
	}

	#[test]
	fn partition_rejects_a_257th_entry() {
		let mut pool = ConstantPool::new();
		for value in 0..256 {
			pool.insert_int(value).expect("first 256 inserts succeed");
		}
		assert!(pool.insert_int(256).is_err());
	}

	#[test]
	fn partitions_are_independent() {
		let mut pool = ConstantPool::new();
		let address = pool.insert_string("hi".to_owned()).unwrap();
		assert_eq!(pool.string(address).map(String::as_str), Some("hi"));
		assert_eq!(pool.int(address), None);
	}
}
