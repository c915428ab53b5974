use crate::bytecode::descriptor;
use crate::error::ClassFileError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;

/// Canonical dotted fully-qualified class name (`java.lang.String`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassName(String);

impl ClassName {
    /// Build from a dotted or internal (`/`-separated) name
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().replace('/', "."))
    }

    /// Decode a JVM internal name or array descriptor
    ///
    /// `java/lang/String` and `[[Ljava/lang/String;` both give
    /// `java.lang.String`; primitive arrays and empty names give `None`.
    pub fn from_internal(raw: &str) -> Option<Self> {
        let mut name = raw;
        if name.starts_with('[') {
            name = name
                .trim_start_matches('[')
                .strip_prefix('L')?
                .strip_suffix(';')?;
        }
        if name.is_empty() {
            return None;
        }
        Some(Self::new(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Package part, empty for the default package
    pub fn package(&self) -> &str {
        self.0.rsplit_once('.').map(|(pkg, _)| pkg).unwrap_or("")
    }

    pub fn simple_name(&self) -> &str {
        self.0.rsplit_once('.').map(|(_, name)| name).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for ClassName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ClassName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClassName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// How a class came to be referenced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// Superclass, interface or type in the class signature
    Supertype,

    /// Nest host, nest member or permitted subclass
    NestMate,

    /// Annotation type or a type named inside an annotation value
    Annotation,

    /// Field type, or a record component type
    Field,

    /// Method parameter, return or declared exception type
    Method,

    /// Operand of a bytecode instruction
    Instruction,

    /// Catch type of an exception handler
    ExceptionHandler,

    /// Local variable type
    LocalVariable,

    /// Only found in the raw constant pool
    ConstantPool,
}

impl ReferenceKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ReferenceKind::Supertype => "supertype",
            ReferenceKind::NestMate => "nest mate",
            ReferenceKind::Annotation => "annotation",
            ReferenceKind::Field => "field",
            ReferenceKind::Method => "method signature",
            ReferenceKind::Instruction => "instruction",
            ReferenceKind::ExceptionHandler => "exception handler",
            ReferenceKind::LocalVariable => "local variable",
            ReferenceKind::ConstantPool => "constant pool",
        }
    }
}

/// Accumulates the classes one class file refers to
///
/// Every name is normalized to [`ClassName`] on the way in. The first kind
/// recorded for a class is kept.
#[derive(Debug, Default)]
pub struct ReferenceCollector {
    references: BTreeMap<ClassName, ReferenceKind>,
}

impl ReferenceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class_name(&mut self, name: ClassName, kind: ReferenceKind) {
        self.references.entry(name).or_insert(kind);
    }

    /// Add an internal name or array descriptor
    pub fn add_internal_name(&mut self, raw: &str, kind: ReferenceKind) {
        if let Some(name) = ClassName::from_internal(raw) {
            self.add_class_name(name, kind);
        }
    }

    /// Add every class in a field descriptor or field signature
    pub fn add_field_type(&mut self, desc: &str, kind: ReferenceKind) -> Result<(), ClassFileError> {
        descriptor::visit_field_type(desc, |name| self.add_internal_name(name, kind))
    }

    /// Add every class in a method descriptor or method signature
    pub fn add_method_type(&mut self, desc: &str, kind: ReferenceKind) -> Result<(), ClassFileError> {
        descriptor::visit_method_type(desc, |name| self.add_internal_name(name, kind))
    }

    /// Add every class in a generic class signature
    pub fn add_class_signature(
        &mut self,
        sig: &str,
        kind: ReferenceKind,
    ) -> Result<(), ClassFileError> {
        descriptor::visit_class_signature(sig, |name| self.add_internal_name(name, kind))
    }

    /// Add a raw constant-pool string that may or may not name a class
    ///
    /// Method descriptors are walked, everything else is taken as a name.
    /// Nothing is rejected here that merely looks odd.
    pub fn add_candidate(&mut self, raw: &str, kind: ReferenceKind) {
        if raw.starts_with('(') && self.add_method_type(raw, kind).is_ok() {
            return;
        }
        // not a descriptor: keep the string itself as a name
        self.add_internal_name(raw, kind);
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Finish collecting, dropping the class's reference to itself
    pub fn into_references(mut self, own_name: Option<&ClassName>) -> ClassReferences {
        if let Some(own) = own_name {
            self.references.remove(own);
        }
        ClassReferences {
            references: self.references,
        }
    }
}

/// Deduplicated reference set of one class
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassReferences {
    references: BTreeMap<ClassName, ReferenceKind>,
}

impl ClassReferences {
    pub fn names(&self) -> impl Iterator<Item = &ClassName> {
        self.references.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClassName, ReferenceKind)> {
        self.references.iter().map(|(name, kind)| (name, *kind))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.references.contains_key(name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ReferenceKind> {
        self.references.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }
}

impl FromIterator<(ClassName, ReferenceKind)> for ClassReferences {
    fn from_iter<I: IntoIterator<Item = (ClassName, ReferenceKind)>>(iter: I) -> Self {
        let mut references = BTreeMap::new();
        for (name, kind) in iter {
            references.entry(name).or_insert(kind);
        }
        Self { references }
    }
}
