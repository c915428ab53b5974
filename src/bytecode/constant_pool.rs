//! Constant pool parsing and the raw constant-pool class scanner
//!
//! The scanner reads only the header and the pool of a class file. Some
//! class-to-class references live nowhere else: class literals, types only used
//! through `invokedynamic` bootstrap arguments, names passed to reflection as
//! string constants.

use super::reader::ByteReader;
use crate::error::ClassFileError;
use crate::graph::{ReferenceCollector, ReferenceKind};

pub const CLASS_FILE_MAGIC: u32 = 0xCAFE_BABE;

const TAG_UTF8: u8 = 1;
const TAG_INTEGER: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_LONG: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_CLASS: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_FIELDREF: u8 = 9;
const TAG_METHODREF: u8 = 10;
const TAG_INTERFACE_METHODREF: u8 = 11;
const TAG_NAME_AND_TYPE: u8 = 12;
const TAG_METHOD_HANDLE: u8 = 15;
const TAG_METHOD_TYPE: u8 = 16;
const TAG_DYNAMIC: u8 = 17;
const TAG_INVOKE_DYNAMIC: u8 = 18;
const TAG_MODULE: u8 = 19;
const TAG_PACKAGE: u8 = 20;

/// One constant pool slot
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Slot 0 and the second slot of a Long/Double
    Unusable,
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(u64),
    Double(u64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
}

/// Parsed constant pool, indexed the way the class file indexes it (from 1)
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    /// Parse the pool; the reader must be positioned at `constant_pool_count`
    pub fn parse(reader: &mut ByteReader<'_>) -> Result<Self, ClassFileError> {
        let count = reader.read_u16()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(Constant::Unusable);

        let mut index = 1usize;
        while index < count {
            let tag = reader.read_u8()?;
            let entry = match tag {
                TAG_UTF8 => {
                    let len = reader.read_u16()? as usize;
                    let bytes = reader.read_bytes(len)?;
                    // Modified UTF-8 only differs for NUL and supplementary
                    // characters, neither of which occurs in class names.
                    Constant::Utf8(String::from_utf8_lossy(bytes).into_owned())
                }
                TAG_INTEGER => Constant::Integer(reader.read_i32()?),
                TAG_FLOAT => Constant::Float(reader.read_u32()?),
                TAG_LONG | TAG_DOUBLE => {
                    let high = reader.read_u32()? as u64;
                    let low = reader.read_u32()? as u64;
                    let bits = (high << 32) | low;
                    if tag == TAG_LONG {
                        Constant::Long(bits)
                    } else {
                        Constant::Double(bits)
                    }
                }
                TAG_CLASS => Constant::Class {
                    name_index: reader.read_u16()?,
                },
                TAG_STRING => Constant::String {
                    string_index: reader.read_u16()?,
                },
                TAG_FIELDREF | TAG_METHODREF | TAG_INTERFACE_METHODREF => {
                    let class_index = reader.read_u16()?;
                    let name_and_type_index = reader.read_u16()?;
                    match tag {
                        TAG_FIELDREF => Constant::FieldRef { class_index, name_and_type_index },
                        TAG_METHODREF => Constant::MethodRef { class_index, name_and_type_index },
                        _ => Constant::InterfaceMethodRef { class_index, name_and_type_index },
                    }
                }
                TAG_NAME_AND_TYPE => Constant::NameAndType {
                    name_index: reader.read_u16()?,
                    descriptor_index: reader.read_u16()?,
                },
                TAG_METHOD_HANDLE => Constant::MethodHandle {
                    reference_kind: reader.read_u8()?,
                    reference_index: reader.read_u16()?,
                },
                TAG_METHOD_TYPE => Constant::MethodType {
                    descriptor_index: reader.read_u16()?,
                },
                TAG_DYNAMIC | TAG_INVOKE_DYNAMIC => {
                    let bootstrap_method_attr_index = reader.read_u16()?;
                    let name_and_type_index = reader.read_u16()?;
                    if tag == TAG_DYNAMIC {
                        Constant::Dynamic { bootstrap_method_attr_index, name_and_type_index }
                    } else {
                        Constant::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index }
                    }
                }
                TAG_MODULE => Constant::Module {
                    name_index: reader.read_u16()?,
                },
                TAG_PACKAGE => Constant::Package {
                    name_index: reader.read_u16()?,
                },
                _ => {
                    return Err(ClassFileError::UnknownConstantTag {
                        tag,
                        index: index as u16,
                    })
                }
            };

            let wide = matches!(entry, Constant::Long(_) | Constant::Double(_));
            if wide && index + 1 >= count {
                return Err(ClassFileError::BadConstantIndex {
                    index: index as u16,
                    expected: "two-slot Long or Double",
                });
            }
            entries.push(entry);
            if wide {
                entries.push(Constant::Unusable);
                index += 1;
            }
            index += 1;
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }

    pub fn get(&self, index: u16) -> Option<&Constant> {
        self.entries.get(index as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constant> {
        self.entries.iter()
    }

    pub fn utf8(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index) {
            Some(Constant::Utf8(value)) => Ok(value),
            _ => Err(ClassFileError::BadConstantIndex { index, expected: "Utf8" }),
        }
    }

    /// Internal name (or array descriptor) held by a `Class` entry
    pub fn class_name(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index) {
            Some(Constant::Class { name_index }) => self.utf8(*name_index),
            _ => Err(ClassFileError::BadConstantIndex { index, expected: "Class" }),
        }
    }

    /// Owner class of a field or method reference
    pub fn member_owner(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index) {
            Some(
                Constant::FieldRef { class_index, .. }
                | Constant::MethodRef { class_index, .. }
                | Constant::InterfaceMethodRef { class_index, .. },
            ) => self.class_name(*class_index),
            _ => Err(ClassFileError::BadConstantIndex { index, expected: "member reference" }),
        }
    }

    /// Descriptor of a `NameAndType` entry
    pub fn name_and_type_descriptor(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index) {
            Some(Constant::NameAndType { descriptor_index, .. }) => self.utf8(*descriptor_index),
            _ => Err(ClassFileError::BadConstantIndex { index, expected: "NameAndType" }),
        }
    }

    /// Utf8 values of every Class, String and MethodType entry
    ///
    /// Permissive by intent: string constants that are not class names are
    /// returned as well and fall out later because no artifact owns them.
    pub fn class_candidates(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().filter_map(move |entry| {
            let index = match entry {
                Constant::Class { name_index } => *name_index,
                Constant::String { string_index } => *string_index,
                Constant::MethodType { descriptor_index } => *descriptor_index,
                _ => return None,
            };
            self.utf8(index).ok()
        })
    }
}

/// Read magic and version, leaving the reader at the constant pool
pub fn read_header(reader: &mut ByteReader<'_>) -> Result<(u16, u16), ClassFileError> {
    let magic = reader.read_u32()?;
    if magic != CLASS_FILE_MAGIC {
        return Err(ClassFileError::BadMagic(magic));
    }
    let minor = reader.read_u16()?;
    let major = reader.read_u16()?;
    Ok((minor, major))
}

/// Scanner that recovers class references straight from the constant pool
pub struct ConstantPoolScanner;

impl ConstantPoolScanner {
    /// Feed every class candidate of `bytes` into `collector`
    pub fn scan(bytes: &[u8], collector: &mut ReferenceCollector) -> Result<(), ClassFileError> {
        let mut reader = ByteReader::new(bytes);
        read_header(&mut reader)?;
        let pool = ConstantPool::parse(&mut reader)?;
        Self::collect(&pool, collector);
        Ok(())
    }

    /// Feed the candidates of an already parsed pool into `collector`
    ///
    /// Besides the plain candidates this resolves the call-site descriptor of
    /// every `InvokeDynamic` and `Dynamic` entry and the owner of every
    /// `MethodHandle` target. Entries that do not resolve are ignored.
    pub fn collect(pool: &ConstantPool, collector: &mut ReferenceCollector) {
        let kind = ReferenceKind::ConstantPool;
        for candidate in pool.class_candidates() {
            collector.add_candidate(candidate, kind);
        }

        for entry in pool.iter() {
            match entry {
                Constant::InvokeDynamic { name_and_type_index, .. }
                | Constant::Dynamic { name_and_type_index, .. } => {
                    let Ok(desc) = pool.name_and_type_descriptor(*name_and_type_index) else {
                        continue;
                    };
                    // a malformed descriptor keeps whatever was read before the error
                    let _ = if desc.starts_with('(') {
                        collector.add_method_type(desc, kind)
                    } else {
                        collector.add_field_type(desc, kind)
                    };
                }
                Constant::MethodHandle { reference_index, .. } => {
                    if let Ok(owner) = pool.member_owner(*reference_index) {
                        collector.add_internal_name(owner, kind);
                    }
                }
                _ => {}
            }
        }
    }
}
