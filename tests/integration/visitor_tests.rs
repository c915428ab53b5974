//! Integration tests for the class file visitor
//!
//! Each fixture exercises one bytecode construct and checks that the class it
//! names is reachable from the fixture in the reference graph.

mod common;

use common::{operand, ClassFileBuilder};
use depclean::bytecode::ClassStructureVisitor;
use depclean::graph::{ClassName, ReferenceGraph, ReferenceKind};
use depclean::ClassFileError;
use std::collections::BTreeSet;

const MAIN: &str = "app/Main";

/// Structural references of `bytes`, without the constant-pool pass
fn visit(bytes: &[u8]) -> depclean::graph::ClassReferences {
    ClassStructureVisitor::structural_only()
        .visit(bytes)
        .expect("fixture should parse")
        .references
}

/// Classes reachable from the fixture once merged into a graph
fn reached(bytes: &[u8]) -> BTreeSet<ClassName> {
    let visited = ClassStructureVisitor::structural_only().visit(bytes).unwrap();
    let mut graph = ReferenceGraph::new();
    graph.record_references(&visited.name, &visited.references);
    graph.reachable_from([&visited.name])
}

/// A class with a single method running `code`
fn with_code(build: impl FnOnce(&mut ClassFileBuilder) -> Vec<u8>) -> Vec<u8> {
    let mut builder = ClassFileBuilder::new(MAIN);
    let code = build(&mut builder);
    let attribute = builder.code(code, &[], Vec::new());
    builder.method("run", "()V", vec![attribute]);
    builder.build()
}

// ============================================================================
// Declaration
// ============================================================================

#[test]
fn test_superclass_and_interfaces() {
    let mut builder = ClassFileBuilder::new(MAIN);
    builder
        .super_class("lib/Base")
        .interface("lib/Service")
        .interface("lib/Closeable");
    let refs = visit(&builder.build());

    assert_eq!(refs.kind_of("lib.Base"), Some(ReferenceKind::Supertype));
    assert_eq!(refs.kind_of("lib.Service"), Some(ReferenceKind::Supertype));
    assert_eq!(refs.kind_of("lib.Closeable"), Some(ReferenceKind::Supertype));
    assert!(!refs.contains("app.Main"), "self reference must be dropped");
}

#[test]
fn test_class_signature_replaces_raw_supertypes() {
    let mut builder = ClassFileBuilder::new(MAIN);
    builder.super_class("lib/Raw");
    let signature = builder.signature("<T:Llib/Bound;>Llib/Base<Llib/Arg;>;Llib/Service<TT;>;");
    builder.class_attribute(signature);
    let refs = visit(&builder.build());

    for name in ["lib.Bound", "lib.Base", "lib.Arg", "lib.Service"] {
        assert_eq!(
            refs.kind_of(name),
            Some(ReferenceKind::Supertype),
            "{} should come from the signature",
            name
        );
    }
    assert!(!refs.contains("lib.Raw"), "raw supertypes are not walked when a signature exists");
}

#[test]
fn test_malformed_class_signature_falls_back() {
    let mut builder = ClassFileBuilder::new(MAIN);
    builder.super_class("lib/Raw");
    let signature = builder.signature("Llib/Broken");
    builder.class_attribute(signature);
    let refs = visit(&builder.build());

    assert_eq!(refs.kind_of("lib.Raw"), Some(ReferenceKind::Supertype));
}

#[test]
fn test_inner_class_in_signature() {
    let mut builder = ClassFileBuilder::new(MAIN);
    let signature = builder.signature("Llib/Outer<Llib/Arg;>.Inner;");
    builder.class_attribute(signature);
    let refs = visit(&builder.build());

    assert!(refs.contains("lib.Outer$Inner"));
    assert!(refs.contains("lib.Arg"));
}

#[test]
fn test_nest_and_permitted_subclasses() {
    let mut builder = ClassFileBuilder::new(MAIN);
    let host = builder.nest_host("app/Host");
    let members = builder.class_list("NestMembers", &["app/Main$Inner"]);
    let permitted = builder.class_list("PermittedSubclasses", &["app/Circle", "app/Square"]);
    builder.class_attribute(host).class_attribute(members).class_attribute(permitted);
    let refs = visit(&builder.build());

    for name in ["app.Host", "app.Main$Inner", "app.Circle", "app.Square"] {
        assert_eq!(refs.kind_of(name), Some(ReferenceKind::NestMate), "{}", name);
    }
}

#[test]
fn test_record_components() {
    let mut builder = ClassFileBuilder::new(MAIN);
    builder.super_class("java/lang/Record");
    let signature = builder.signature("Ljava/util/List<Llib/Item;>;");
    let record = builder.record(vec![
        ("id", "Llib/Id;", Vec::new()),
        ("items", "Ljava/util/List;", vec![signature]),
    ]);
    builder.class_attribute(record);
    let refs = visit(&builder.build());

    assert_eq!(refs.kind_of("lib.Id"), Some(ReferenceKind::Field));
    assert_eq!(refs.kind_of("lib.Item"), Some(ReferenceKind::Field));
}

// ============================================================================
// Annotations
// ============================================================================

#[test]
fn test_annotation_values() {
    let mut builder = ClassFileBuilder::new(MAIN);

    let nested = builder.annotation("Llib/Nested;", Vec::new());
    let enum_value = builder.value_enum("Llib/Mode;", "FAST");
    let class_value = builder.value_class("Llib/Target;");
    let void_value = builder.value_class("V");
    let array_class = builder.value_class("[Llib/InArray;");
    let text = builder.value_string("hello");
    let array = ClassFileBuilder::value_array(vec![array_class, text]);
    let annotation = builder.annotation(
        "Llib/Marker;",
        vec![
            ("mode", enum_value),
            ("target", class_value),
            ("nothing", void_value),
            ("values", array),
            ("nested", ClassFileBuilder::value_annotation(nested)),
        ],
    );
    let attribute = builder.annotations(vec![annotation]);
    builder.class_attribute(attribute);
    let refs = visit(&builder.build());

    for name in ["lib.Marker", "lib.Mode", "lib.Target", "lib.InArray", "lib.Nested"] {
        assert_eq!(refs.kind_of(name), Some(ReferenceKind::Annotation), "{}", name);
    }
    assert!(!refs.contains("V"), "void.class names no class");
}

#[test]
fn test_parameter_annotations_and_default() {
    let mut builder = ClassFileBuilder::new(MAIN);
    let param = builder.annotation("Llib/NotNull;", Vec::new());
    let parameters = builder.parameter_annotations(vec![vec![], vec![param]]);
    builder.method("call", "(II)V", vec![parameters]);

    let default = builder.value_class("Llib/DefaultImpl;");
    let default = builder.annotation_default(default);
    builder.method("impl", "()Ljava/lang/Class;", vec![default]);
    let refs = visit(&builder.build());

    assert_eq!(refs.kind_of("lib.NotNull"), Some(ReferenceKind::Annotation));
    assert_eq!(refs.kind_of("lib.DefaultImpl"), Some(ReferenceKind::Annotation));
}

#[test]
fn test_member_type_annotation() {
    let mut builder = ClassFileBuilder::new(MAIN);
    let annotation = builder.member_type_annotation("Llib/Nullable;");
    builder.field("names", "Ljava/util/List;", vec![annotation]);
    let refs = visit(&builder.build());

    assert_eq!(refs.kind_of("lib.Nullable"), Some(ReferenceKind::Annotation));
}

// ============================================================================
// Fields and methods
// ============================================================================

#[test]
fn test_field_descriptor_and_signature() {
    let mut builder = ClassFileBuilder::new(MAIN);
    builder.field("widget", "[[Llib/Widget;", Vec::new());
    let signature = builder.signature("Ljava/util/Map<Llib/Key;Ljava/util/List<Llib/Value;>;>;");
    builder.field("index", "Ljava/util/Map;", vec![signature]);
    builder.field("count", "I", Vec::new());
    let refs = visit(&builder.build());

    assert_eq!(refs.kind_of("lib.Widget"), Some(ReferenceKind::Field));
    assert_eq!(refs.kind_of("lib.Key"), Some(ReferenceKind::Field));
    assert_eq!(refs.kind_of("lib.Value"), Some(ReferenceKind::Field));
    assert_eq!(refs.kind_of("java.util.Map"), Some(ReferenceKind::Field));
}

#[test]
fn test_string_constant_value() {
    let mut builder = ClassFileBuilder::new(MAIN);
    let constant = builder.constant_string("com.lib.NotAReference");
    builder.field("NAME", "Ljava/lang/Object;", vec![constant]);
    let refs = visit(&builder.build());

    assert_eq!(refs.kind_of("java.lang.String"), Some(ReferenceKind::Field));
    assert!(
        !refs.contains("com.lib.NotAReference"),
        "string contents are only picked up by the constant-pool pass"
    );
}

#[test]
fn test_method_descriptor_and_exceptions() {
    let mut builder = ClassFileBuilder::new(MAIN);
    let exceptions = builder.exceptions(&["lib/Failure"]);
    builder.method("convert", "(Llib/In;[I)Llib/Out;", vec![exceptions]);
    let refs = visit(&builder.build());

    assert_eq!(refs.kind_of("lib.In"), Some(ReferenceKind::Method));
    assert_eq!(refs.kind_of("lib.Out"), Some(ReferenceKind::Method));
    assert_eq!(refs.kind_of("lib.Failure"), Some(ReferenceKind::Method));
}

#[test]
fn test_method_signature_wins_over_descriptor() {
    let mut builder = ClassFileBuilder::new(MAIN);
    let signature = builder.signature("<T:Llib/Bound;>(Ljava/util/List<TT;>;)Llib/Result<TT;>;");
    builder.method("collect", "(Ljava/util/List;)Llib/Result;", vec![signature]);
    let refs = visit(&builder.build());

    assert!(refs.contains("lib.Bound"));
    assert!(refs.contains("lib.Result"));
    assert!(refs.contains("java.util.List"));
}

// ============================================================================
// Method bodies
// ============================================================================

#[test]
fn test_type_instructions() {
    let bytes = with_code(|b| {
        let mut code = vec![0xbb];
        code.extend_from_slice(&operand(b.class("lib/Created")));
        code.push(0x57); // pop
        code.push(0x03); // iconst_0
        code.push(0xbd); // anewarray
        code.extend_from_slice(&operand(b.class("[Llib/Element;")));
        code.push(0xc0); // checkcast
        code.extend_from_slice(&operand(b.class("lib/Casted")));
        code.push(0xc1); // instanceof
        code.extend_from_slice(&operand(b.class("lib/Checked")));
        code.extend_from_slice(&[0x03, 0x03, 0xc5]); // multianewarray
        code.extend_from_slice(&operand(b.class("[[Llib/Matrix;")));
        code.push(2);
        code.push(0xb1);
        code
    });
    let refs = visit(&bytes);

    for name in ["lib.Created", "lib.Element", "lib.Casted", "lib.Checked", "lib.Matrix"] {
        assert_eq!(refs.kind_of(name), Some(ReferenceKind::Instruction), "{}", name);
    }
}

#[test]
fn test_member_access_owners_only() {
    let bytes = with_code(|b| {
        let mut code = vec![0xb2]; // getstatic
        code.extend_from_slice(&operand(b.field_ref("lib/Holder", "VALUE", "Llib/FieldType;")));
        code.push(0xb6); // invokevirtual
        code.extend_from_slice(&operand(b.method_ref("lib/Service", "call", "(Llib/Param;)Llib/Ret;")));
        code.push(0xb9); // invokeinterface
        code.extend_from_slice(&operand(b.interface_method_ref("lib/Api", "run", "()V")));
        code.extend_from_slice(&[1, 0]);
        code.push(0xba); // invokedynamic
        code.extend_from_slice(&operand(b.invoke_dynamic("apply", "()Llib/Lambda;")));
        code.extend_from_slice(&[0, 0]);
        code.push(0xb1);
        code
    });
    let refs = visit(&bytes);

    assert_eq!(refs.kind_of("lib.Holder"), Some(ReferenceKind::Instruction));
    assert_eq!(refs.kind_of("lib.Service"), Some(ReferenceKind::Instruction));
    assert_eq!(refs.kind_of("lib.Api"), Some(ReferenceKind::Instruction));
    // member descriptors are not walked
    assert!(!refs.contains("lib.FieldType"));
    assert!(!refs.contains("lib.Param"));
    assert!(!refs.contains("lib.Ret"));
    assert!(!refs.contains("lib.Lambda"));
}

#[test]
fn test_loaded_constants() {
    let bytes = with_code(|b| {
        let mut code = vec![0x12]; // ldc class literal
        code.push(b.class("lib/Literal") as u8);
        code.push(0x57);
        code.push(0x13); // ldc_w method type
        code.extend_from_slice(&operand(b.method_type("(Llib/Arg;)Llib/Ret;")));
        code.push(0x57);
        code.push(0x12); // ldc string
        code.push(b.string("lib.JustText") as u8);
        code.push(0x57);
        code.push(0x14); // ldc2_w
        code.extend_from_slice(&operand(b.long(42)));
        code.push(0x58); // pop2
        code.push(0xb1);
        code
    });
    let refs = visit(&bytes);

    assert_eq!(refs.kind_of("lib.Literal"), Some(ReferenceKind::Instruction));
    assert_eq!(refs.kind_of("lib.Arg"), Some(ReferenceKind::Instruction));
    assert_eq!(refs.kind_of("lib.Ret"), Some(ReferenceKind::Instruction));
    assert!(!refs.contains("lib.JustText"));
}

#[test]
fn test_variable_length_instructions_keep_alignment() {
    let bytes = with_code(|b| {
        // iconst_0 then tableswitch at offset 1: two padding bytes
        let mut code = vec![0x03, 0xaa, 0, 0];
        code.extend_from_slice(&0i32.to_be_bytes()); // default
        code.extend_from_slice(&0i32.to_be_bytes()); // low
        code.extend_from_slice(&1i32.to_be_bytes()); // high
        code.extend_from_slice(&[0; 8]);
        // lookupswitch at offset 25: two padding bytes
        code.extend_from_slice(&[0x03, 0xab, 0, 0]);
        code.extend_from_slice(&0i32.to_be_bytes()); // default
        code.extend_from_slice(&1i32.to_be_bytes()); // npairs
        code.extend_from_slice(&[0; 8]);
        // wide iinc
        code.extend_from_slice(&[0xc4, 0x84, 0, 1, 0, 1]);
        code.push(0xbb);
        code.extend_from_slice(&operand(b.class("lib/AfterSwitch")));
        code.push(0x57);
        code.push(0xb1);
        code
    });
    let refs = visit(&bytes);

    assert_eq!(refs.kind_of("lib.AfterSwitch"), Some(ReferenceKind::Instruction));
}

#[test]
fn test_unknown_opcode_is_an_error() {
    let bytes = with_code(|_| vec![0xcb]);
    let err = ClassStructureVisitor::new().visit(&bytes).unwrap_err();
    assert!(matches!(err, ClassFileError::UnsupportedOpcode { opcode: 0xcb, .. }));
}

#[test]
fn test_exception_handlers() {
    let mut builder = ClassFileBuilder::new(MAIN);
    let code = builder.code(vec![0xb1], &[Some("lib/Boom"), None], Vec::new());
    builder.method("run", "()V", vec![code]);
    let refs = visit(&builder.build());

    assert_eq!(refs.kind_of("lib.Boom"), Some(ReferenceKind::ExceptionHandler));
    // the finally handler adds nothing
    assert_eq!(refs.len(), 2, "{:?}", refs);
}

#[test]
fn test_local_variables() {
    let mut builder = ClassFileBuilder::new(MAIN);
    let table = builder.local_variables("LocalVariableTable", "Llib/Local;");
    let types = builder.local_variables("LocalVariableTypeTable", "Ljava/util/List<Llib/Generic;>;");
    let annotated = builder.local_variable_type_annotation("Llib/LocalMarker;");
    let code = builder.code(vec![0xb1], &[], vec![table, types, annotated]);
    builder.method("run", "()V", vec![code]);
    let refs = visit(&builder.build());

    assert_eq!(refs.kind_of("lib.Local"), Some(ReferenceKind::LocalVariable));
    assert_eq!(refs.kind_of("lib.Generic"), Some(ReferenceKind::LocalVariable));
    assert_eq!(refs.kind_of("lib.LocalMarker"), Some(ReferenceKind::LocalVariable));
}

// ============================================================================
// Constant pool pass and failures
// ============================================================================

#[test]
fn test_constant_pool_pass_is_permissive() {
    let mut builder = ClassFileBuilder::new(MAIN);
    builder.string("com.lib.Reflective");
    let bytes = builder.build();

    let structural = visit(&bytes);
    assert!(!structural.contains("com.lib.Reflective"));

    let full = ClassStructureVisitor::new().visit(&bytes).unwrap().references;
    assert_eq!(full.kind_of("com.lib.Reflective"), Some(ReferenceKind::ConstantPool));
    // structural kinds win over the pool pass
    assert_eq!(full.kind_of("java.lang.Object"), Some(ReferenceKind::Supertype));
}

#[test]
fn test_invoke_dynamic_call_site_reaches_pool_pass() {
    let bytes = with_code(|b| {
        let mut code = vec![0xba]; // invokedynamic
        code.extend_from_slice(&operand(b.invoke_dynamic("make", "(Llib/Source;)Llib/Callback;")));
        code.extend_from_slice(&[0, 0]);
        code.extend_from_slice(&[0x57, 0xb1]); // pop, return
        code
    });

    let structural = visit(&bytes);
    assert!(!structural.contains("lib.Callback"));

    let full = ClassStructureVisitor::new().visit(&bytes).unwrap().references;
    assert_eq!(full.kind_of("lib.Callback"), Some(ReferenceKind::ConstantPool));
    assert_eq!(full.kind_of("lib.Source"), Some(ReferenceKind::ConstantPool));
}

#[test]
fn test_method_handle_owner_reaches_pool_pass() {
    let mut builder = ClassFileBuilder::new(MAIN);
    builder.method_handle("lib/Factories", "create", "()Ljava/lang/Object;");
    let bytes = builder.build();

    let full = ClassStructureVisitor::new().visit(&bytes).unwrap().references;
    assert_eq!(full.kind_of("lib.Factories"), Some(ReferenceKind::ConstantPool));
}

#[test]
fn test_counts_members() {
    let mut builder = ClassFileBuilder::new(MAIN);
    builder.field("a", "I", Vec::new());
    builder.field("b", "J", Vec::new());
    builder.method("m", "()V", Vec::new());
    let visited = ClassStructureVisitor::new().visit(&builder.build()).unwrap();

    assert_eq!(visited.name.as_str(), "app.Main");
    assert_eq!(visited.field_count, 2);
    assert_eq!(visited.method_count, 1);
}

#[test]
fn test_bad_magic() {
    let mut bytes = common::simple_class(MAIN, "lib/Base");
    bytes[0] = 0xCA;
    bytes[1] = 0xFE;
    bytes[2] = 0xD0;
    bytes[3] = 0x0D;
    let err = ClassStructureVisitor::new().visit(&bytes).unwrap_err();
    assert_eq!(err, ClassFileError::BadMagic(0xCAFE_D00D));
}

#[test]
fn test_truncated_class() {
    let bytes = common::simple_class(MAIN, "lib/Base");
    let truncated = &bytes[..bytes.len() - 4];
    let err = ClassStructureVisitor::new().visit(truncated).unwrap_err();
    assert!(matches!(err, ClassFileError::UnexpectedEof { .. }));
}

#[test]
fn test_graph_reachability_of_every_construct() {
    let mut builder = ClassFileBuilder::new(MAIN);
    builder.super_class("lib/Base");
    builder.field("f", "Llib/FieldType;", Vec::new());
    let code = builder.code(vec![0xb1], &[Some("lib/Boom")], Vec::new());
    builder.method("m", "(Llib/Param;)V", vec![code]);

    let reached = reached(&builder.build());
    let expected: BTreeSet<ClassName> = ["lib.Base", "lib.FieldType", "lib.Boom", "lib.Param"]
        .into_iter()
        .map(ClassName::new)
        .collect();
    assert_eq!(reached, expected);
}
