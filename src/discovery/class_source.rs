// Class file enumeration for JARs and exploded output directories

use crate::graph::ClassName;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;
use walkdir::WalkDir;
use zip::ZipArchive;

const CLASS_SUFFIX: &str = ".class";
const VERSIONED_PREFIX: &str = "META-INF/versions/";

/// Failure to enumerate or read a class file source
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

/// Raw bytes of one `.class` entry
#[derive(Debug, Clone)]
pub struct ClassEntry {
    /// Class name derived from the entry path
    pub name: ClassName,

    /// Entry path relative to its source, `/`-separated
    pub entry: String,

    pub bytes: Vec<u8>,
}

/// A JAR or an exploded directory of compiled classes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassFileSource {
    Jar(PathBuf),
    Directory(PathBuf),
}

impl ClassFileSource {
    /// Directories are exploded outputs, anything else is read as a JAR
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            ClassFileSource::Directory(path)
        } else {
            ClassFileSource::Jar(path)
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ClassFileSource::Jar(path) | ClassFileSource::Directory(path) => path,
        }
    }

    /// Names of every class in the source, without reading class bodies
    ///
    /// For a JAR only the zip central directory is read.
    pub fn class_names(&self) -> Result<BTreeSet<ClassName>, SourceError> {
        match self {
            ClassFileSource::Jar(path) => {
                let mut archive = ZipArchive::new(File::open(path)?)?;
                let mut names = BTreeSet::new();
                for i in 0..archive.len() {
                    let entry = archive.by_index_raw(i)?;
                    if let Some(name) = class_name_for_entry(entry.name()) {
                        names.insert(name);
                    }
                }
                Ok(names)
            }
            ClassFileSource::Directory(root) => Ok(directory_entries(root)?
                .into_iter()
                .filter_map(|(entry, _)| class_name_for_entry(&entry))
                .collect()),
        }
    }

    /// Every class entry with its bytes, in entry-name order
    pub fn read_classes(&self) -> Result<Vec<ClassEntry>, SourceError> {
        let mut classes = Vec::new();
        match self {
            ClassFileSource::Jar(path) => {
                let mut archive = ZipArchive::new(File::open(path)?)?;
                for i in 0..archive.len() {
                    let mut file = archive.by_index(i)?;
                    let Some(name) = class_name_for_entry(file.name()) else {
                        continue;
                    };
                    let mut bytes = Vec::with_capacity(file.size() as usize);
                    file.read_to_end(&mut bytes)?;
                    classes.push(ClassEntry {
                        name,
                        entry: file.name().to_string(),
                        bytes,
                    });
                }
                classes.sort_by(|a, b| a.entry.cmp(&b.entry));
            }
            ClassFileSource::Directory(root) => {
                for (entry, path) in directory_entries(root)? {
                    let Some(name) = class_name_for_entry(&entry) else {
                        continue;
                    };
                    classes.push(ClassEntry {
                        name,
                        entry,
                        bytes: std::fs::read(&path)?,
                    });
                }
            }
        }
        trace!("{}: {} class entries", self.path().display(), classes.len());
        Ok(classes)
    }
}

/// `(relative entry path, absolute path)` of every file under `root`, sorted
fn directory_entries(root: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut entries = Vec::new();
    for dir_entry in WalkDir::new(root).sort_by_file_name() {
        let dir_entry = dir_entry?;
        if !dir_entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = dir_entry.path().strip_prefix(root) else {
            continue;
        };
        let entry = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        entries.push((entry, dir_entry.path().to_path_buf()));
    }
    Ok(entries)
}

/// Class name for an archive or directory entry path
///
/// Returns `None` for non-class entries and for `module-info` /
/// `package-info`. Multi-release entries under `META-INF/versions/<n>/` map to
/// the same name as their base entry.
pub fn class_name_for_entry(entry: &str) -> Option<ClassName> {
    let path = entry.strip_suffix(CLASS_SUFFIX)?;
    let path = match path.strip_prefix(VERSIONED_PREFIX) {
        Some(versioned) => versioned.split_once('/')?.1,
        None => path,
    };
    let file_name = path.rsplit('/').next().unwrap_or(path);
    if path.is_empty() || file_name == "module-info" || file_name == "package-info" {
        return None;
    }
    Some(ClassName::new(path))
}
