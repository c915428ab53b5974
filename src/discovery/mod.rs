// Discovery of compiled classes in JARs and output directories

mod class_source;

pub use class_source::{class_name_for_entry, ClassEntry, ClassFileSource, SourceError};
