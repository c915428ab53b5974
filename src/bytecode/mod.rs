//! Class file parsing
//!
//! [`ConstantPoolScanner`] reads only the constant pool and reports every
//! string that might name a class. [`ClassStructureVisitor`] walks the whole
//! class structure, including method bodies, and by default runs the pool
//! scan afterwards over the same parsed pool.

pub mod constant_pool;
pub mod descriptor;
pub mod opcodes;
pub mod reader;
mod visitor;

pub use constant_pool::{ConstantPool, ConstantPoolScanner, CLASS_FILE_MAGIC};
pub use reader::ByteReader;
pub use visitor::{ClassStructureVisitor, VisitedClass};
