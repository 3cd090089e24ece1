//! The byte-code back end's shared data model (spec §4.G, §6.4): opcodes, the constant pool, and
//! the chunk that bundles them. See `crate::compiler` for the producer and `crate::vm` for the
//! consumer.

pub mod chunk;
pub mod constant_pool;
pub mod opcodes;

pub use chunk::Chunk;
pub use constant_pool::{ConstantPool, ConstantPoolFull};
pub use opcodes::Opcode;
