//! Structural walk of one class file
//!
//! Declaration, fields, methods, their attributes and the bytecode of every
//! method body are visited in a single pass. Nested structures (annotations
//! inside annotations, element value arrays, signatures) are handled by plain
//! recursion; every class found lands in one [`ReferenceCollector`] tagged
//! with the [`ReferenceKind`] of the place it was seen.

use super::constant_pool::{read_header, Constant, ConstantPool, ConstantPoolScanner};
use super::opcodes::{self, instruction_length, read_u16_at};
use super::reader::ByteReader;
use crate::error::ClassFileError;
use crate::graph::{ClassName, ClassReferences, ReferenceCollector, ReferenceKind};
use tracing::trace;

/// Outcome of visiting one class file
#[derive(Debug, Clone)]
pub struct VisitedClass {
    pub name: ClassName,
    pub references: ClassReferences,
    pub field_count: usize,
    pub method_count: usize,
}

/// Extracts every class a class file refers to
#[derive(Debug, Clone, Copy)]
pub struct ClassStructureVisitor {
    scan_constant_pool: bool,
}

impl Default for ClassStructureVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassStructureVisitor {
    /// Structural walk followed by the raw constant-pool scan
    pub fn new() -> Self {
        Self {
            scan_constant_pool: true,
        }
    }

    /// Structural walk only
    pub fn structural_only() -> Self {
        Self {
            scan_constant_pool: false,
        }
    }

    pub fn visit(&self, bytes: &[u8]) -> Result<VisitedClass, ClassFileError> {
        let mut reader = ByteReader::new(bytes);
        read_header(&mut reader)?;
        let pool = ConstantPool::parse(&mut reader)?;

        let _access_flags = reader.read_u16()?;
        let this_class = reader.read_u16()?;
        let name = ClassName::from_internal(pool.class_name(this_class)?)
            .ok_or(ClassFileError::MalformedAttribute("this_class"))?;

        let super_class = match reader.read_u16()? {
            0 => None,
            index => Some(pool.class_name(index)?),
        };
        let interface_count = reader.read_u16()?;
        let mut interfaces = Vec::with_capacity(interface_count as usize);
        for _ in 0..interface_count {
            interfaces.push(pool.class_name(reader.read_u16()?)?);
        }

        let mut walker = Walker {
            pool: &pool,
            collector: ReferenceCollector::new(),
        };

        let field_count = reader.read_u16()? as usize;
        for _ in 0..field_count {
            walker.member(&mut reader, MemberKind::Field)?;
        }
        let method_count = reader.read_u16()? as usize;
        for _ in 0..method_count {
            walker.member(&mut reader, MemberKind::Method)?;
        }

        let signature = walker.class_attributes(&mut reader)?;
        let from_signature = signature.is_some_and(|sig| {
            match walker.collector.add_class_signature(sig, ReferenceKind::Supertype) {
                Ok(()) => true,
                Err(err) => {
                    trace!("{}: falling back to raw supertypes: {}", name, err);
                    false
                }
            }
        });
        if !from_signature {
            for raw in super_class.iter().chain(interfaces.iter()) {
                walker.collector.add_internal_name(raw, ReferenceKind::Supertype);
            }
        }

        // structural kinds are already in place and win over this pass
        if self.scan_constant_pool {
            ConstantPoolScanner::collect(&pool, &mut walker.collector);
        }

        Ok(VisitedClass {
            references: walker.collector.into_references(Some(&name)),
            name,
            field_count,
            method_count,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberKind {
    Field,
    Method,
    RecordComponent,
}

impl MemberKind {
    fn reference_kind(self) -> ReferenceKind {
        match self {
            MemberKind::Field | MemberKind::RecordComponent => ReferenceKind::Field,
            MemberKind::Method => ReferenceKind::Method,
        }
    }
}

struct Walker<'p> {
    pool: &'p ConstantPool,
    collector: ReferenceCollector,
}

impl<'p> Walker<'p> {
    /// Call `visit` with the name and body of every attribute in a table
    fn attributes<F>(&mut self, reader: &mut ByteReader<'_>, mut visit: F) -> Result<(), ClassFileError>
    where
        F: FnMut(&mut Self, &'p str, &mut ByteReader<'_>) -> Result<(), ClassFileError>,
    {
        let count = reader.read_u16()?;
        for _ in 0..count {
            let name = self.pool.utf8(reader.read_u16()?)?;
            let length = reader.read_u32()? as usize;
            let mut body = reader.sub_reader(length)?;
            visit(self, name, &mut body)?;
        }
        Ok(())
    }

    /// Returns the class signature, if any
    fn class_attributes(&mut self, reader: &mut ByteReader<'_>) -> Result<Option<&'p str>, ClassFileError> {
        let mut signature = None;
        self.attributes(reader, |walker, name, body| {
            match name {
                "Signature" => signature = Some(walker.pool.utf8(body.read_u16()?)?),
                "NestHost" => walker.class_ref(body.read_u16()?, ReferenceKind::NestMate)?,
                "NestMembers" | "PermittedSubclasses" => {
                    let count = body.read_u16()?;
                    for _ in 0..count {
                        walker.class_ref(body.read_u16()?, ReferenceKind::NestMate)?;
                    }
                }
                "Record" => {
                    let count = body.read_u16()?;
                    for _ in 0..count {
                        walker.member(body, MemberKind::RecordComponent)?;
                    }
                }
                _ => walker.annotation_attribute(name, body)?,
            }
            Ok(())
        })?;
        Ok(signature)
    }

    /// Field, method or record component: descriptor plus attributes
    fn member(&mut self, reader: &mut ByteReader<'_>, kind: MemberKind) -> Result<(), ClassFileError> {
        if kind != MemberKind::RecordComponent {
            let _access_flags = reader.read_u16()?;
        }
        let _name = reader.read_u16()?;
        let descriptor = self.pool.utf8(reader.read_u16()?)?;

        let mut signature = None;
        self.attributes(reader, |walker, name, body| {
            match name {
                "Signature" => signature = Some(walker.pool.utf8(body.read_u16()?)?),
                "ConstantValue" => {
                    if let Some(Constant::String { .. }) = walker.pool.get(body.read_u16()?) {
                        walker
                            .collector
                            .add_internal_name("java/lang/String", ReferenceKind::Field);
                    }
                }
                "Exceptions" => {
                    let count = body.read_u16()?;
                    for _ in 0..count {
                        walker.class_ref(body.read_u16()?, ReferenceKind::Method)?;
                    }
                }
                "Code" => walker.code(body)?,
                "AnnotationDefault" => walker.element_value(body, ReferenceKind::Annotation)?,
                _ => walker.annotation_attribute(name, body)?,
            }
            Ok(())
        })?;

        let reference_kind = kind.reference_kind();
        if let Some(sig) = signature {
            let walked = match kind {
                MemberKind::Method => self.collector.add_method_type(sig, reference_kind),
                _ => self.collector.add_field_type(sig, reference_kind),
            };
            match walked {
                Ok(()) => return Ok(()),
                Err(err) => trace!("falling back to descriptor: {}", err),
            }
        }
        match kind {
            MemberKind::Method => self.collector.add_method_type(descriptor, reference_kind),
            _ => self.collector.add_field_type(descriptor, reference_kind),
        }
    }

    /// The annotation attributes shared by classes, members and record components
    fn annotation_attribute(&mut self, name: &str, body: &mut ByteReader<'_>) -> Result<(), ClassFileError> {
        match name {
            "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => self.annotations(body),
            "RuntimeVisibleParameterAnnotations" | "RuntimeInvisibleParameterAnnotations" => {
                let parameters = body.read_u8()?;
                for _ in 0..parameters {
                    self.annotations(body)?;
                }
                Ok(())
            }
            "RuntimeVisibleTypeAnnotations" | "RuntimeInvisibleTypeAnnotations" => {
                self.type_annotations(body)
            }
            _ => Ok(()),
        }
    }

    fn annotations(&mut self, body: &mut ByteReader<'_>) -> Result<(), ClassFileError> {
        let count = body.read_u16()?;
        for _ in 0..count {
            self.annotation(body, ReferenceKind::Annotation)?;
        }
        Ok(())
    }

    fn annotation(&mut self, body: &mut ByteReader<'_>, kind: ReferenceKind) -> Result<(), ClassFileError> {
        let type_descriptor = self.pool.utf8(body.read_u16()?)?;
        self.collector.add_field_type(type_descriptor, kind)?;
        let pairs = body.read_u16()?;
        for _ in 0..pairs {
            let _element_name = body.read_u16()?;
            self.element_value(body, kind)?;
        }
        Ok(())
    }

    fn element_value(&mut self, body: &mut ByteReader<'_>, kind: ReferenceKind) -> Result<(), ClassFileError> {
        match body.read_u8()? {
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => body.skip(2),
            b'e' => {
                let enum_type = self.pool.utf8(body.read_u16()?)?;
                self.collector.add_field_type(enum_type, kind)?;
                body.skip(2)
            }
            b'c' => {
                let class_info = self.pool.utf8(body.read_u16()?)?;
                // `void.class`
                if class_info == "V" {
                    return Ok(());
                }
                self.collector.add_field_type(class_info, kind)
            }
            b'@' => self.annotation(body, kind),
            b'[' => {
                let count = body.read_u16()?;
                for _ in 0..count {
                    self.element_value(body, kind)?;
                }
                Ok(())
            }
            _ => Err(ClassFileError::MalformedAttribute("element_value")),
        }
    }

    fn type_annotations(&mut self, body: &mut ByteReader<'_>) -> Result<(), ClassFileError> {
        let count = body.read_u16()?;
        for _ in 0..count {
            let target_type = body.read_u8()?;
            let kind = match target_type {
                // local variable and resource variable declarations
                0x40 | 0x41 => ReferenceKind::LocalVariable,
                _ => ReferenceKind::Annotation,
            };
            match target_type {
                0x00 | 0x01 | 0x16 => body.skip(1)?,
                0x10..=0x12 | 0x17 | 0x42..=0x46 => body.skip(2)?,
                0x13..=0x15 => {}
                0x40 | 0x41 => {
                    let table_length = body.read_u16()? as usize;
                    body.skip(table_length * 6)?;
                }
                0x47..=0x4b => body.skip(3)?,
                _ => return Err(ClassFileError::MalformedAttribute("type_annotation target")),
            }
            let path_length = body.read_u8()? as usize;
            body.skip(path_length * 2)?;
            self.annotation(body, kind)?;
        }
        Ok(())
    }

    fn code(&mut self, body: &mut ByteReader<'_>) -> Result<(), ClassFileError> {
        let _max_stack = body.read_u16()?;
        let _max_locals = body.read_u16()?;
        let code_length = body.read_u32()? as usize;
        let code = body.read_bytes(code_length)?;
        self.instructions(code)?;

        let handlers = body.read_u16()?;
        for _ in 0..handlers {
            body.skip(6)?;
            // 0 is a `finally` block
            match body.read_u16()? {
                0 => {}
                catch_type => self.class_ref(catch_type, ReferenceKind::ExceptionHandler)?,
            }
        }

        self.attributes(body, |walker, name, attribute| {
            match name {
                "LocalVariableTable" | "LocalVariableTypeTable" => {
                    let count = attribute.read_u16()?;
                    for _ in 0..count {
                        attribute.skip(6)?;
                        let descriptor = walker.pool.utf8(attribute.read_u16()?)?;
                        attribute.skip(2)?;
                        walker
                            .collector
                            .add_field_type(descriptor, ReferenceKind::LocalVariable)?;
                    }
                }
                "RuntimeVisibleTypeAnnotations" | "RuntimeInvisibleTypeAnnotations" => {
                    walker.type_annotations(attribute)?
                }
                _ => {}
            }
            Ok(())
        })
    }

    fn instructions(&mut self, code: &[u8]) -> Result<(), ClassFileError> {
        let mut offset = 0;
        while offset < code.len() {
            let opcode = code[offset];
            let length = instruction_length(code, offset)?;
            if offset + length > code.len() {
                return Err(ClassFileError::UnexpectedEof {
                    offset,
                    wanted: length,
                });
            }
            match opcode {
                opcodes::NEW
                | opcodes::ANEWARRAY
                | opcodes::CHECKCAST
                | opcodes::INSTANCEOF
                | opcodes::MULTIANEWARRAY => {
                    self.class_ref(read_u16_at(code, offset + 1)?, ReferenceKind::Instruction)?;
                }
                opcodes::GETSTATIC..=opcodes::PUTFIELD
                | opcodes::INVOKEVIRTUAL..=opcodes::INVOKEINTERFACE => {
                    let owner = self.pool.member_owner(read_u16_at(code, offset + 1)?)?;
                    self.collector.add_internal_name(owner, ReferenceKind::Instruction);
                }
                opcodes::LDC => self.loaded_constant(code[offset + 1] as u16)?,
                opcodes::LDC_W => self.loaded_constant(read_u16_at(code, offset + 1)?)?,
                _ => {}
            }
            offset += length;
        }
        Ok(())
    }

    /// `ldc` of a class literal or a method type
    fn loaded_constant(&mut self, index: u16) -> Result<(), ClassFileError> {
        match self.pool.get(index) {
            Some(Constant::Class { name_index }) => {
                let name = self.pool.utf8(*name_index)?;
                self.collector.add_internal_name(name, ReferenceKind::Instruction);
            }
            Some(Constant::MethodType { descriptor_index }) => {
                let descriptor = self.pool.utf8(*descriptor_index)?;
                self.collector
                    .add_method_type(descriptor, ReferenceKind::Instruction)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn class_ref(&mut self, index: u16, kind: ReferenceKind) -> Result<(), ClassFileError> {
        let name = self.pool.class_name(index)?;
        self.collector.add_internal_name(name, kind);
        Ok(())
    }
}
