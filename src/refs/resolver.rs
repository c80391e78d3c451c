//! Git reference resolution.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::infra::write_file_locked;
use crate::objects::Oid;

/// Default limit on symbolic indirections before a ref is treated as a loop.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// The content of a single reference file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefValue {
    /// A direct reference to an object ID.
    Direct(Oid),
    /// A symbolic reference to another ref (e.g., HEAD -> refs/heads/main).
    Symbolic(String),
}

/// A resolved reference with its name and target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    /// The name of the reference (e.g., "refs/heads/main").
    pub name: String,
    /// The object ID this reference points to.
    pub oid: Oid,
}

/// A store for reading and writing loose Git references.
///
/// References are plain files under the control directory, either holding
/// a hex object ID or `ref: <other ref>`. Writes go through a `.lock`
/// file so two writers never interleave.
#[derive(Debug)]
pub struct RefStore {
    /// Path to the `.git` directory.
    git_dir: PathBuf,
    /// Maximum symbolic indirections followed by [`RefStore::resolve`].
    max_depth: usize,
}

impl RefStore {
    /// Creates a new RefStore for the given `.git` directory.
    pub fn new<P: AsRef<Path>>(git_dir: P) -> Self {
        RefStore {
            git_dir: git_dir.as_ref().to_path_buf(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets how many symbolic indirections are followed before giving up.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Reads and parses a single reference file.
    ///
    /// # Errors
    ///
    /// - `Error::RefNotFound` if there is no regular file for the name (a
    ///   directory such as `refs/heads/feature` next to `feature/x` included)
    /// - `Error::InvalidOid` if the file holds neither `ref: ` nor a hex id
    pub fn read_ref_file(&self, name: &str) -> Result<RefValue> {
        let ref_path = self.ref_path(name)?;
        if !ref_path.is_file() {
            return Err(Error::RefNotFound(name.to_string()));
        }

        let content = fs::read_to_string(&ref_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::RefNotFound(name.to_string())
            } else {
                Error::Io(e)
            }
        })?;

        let content = content.trim();

        if let Some(target) = content.strip_prefix("ref: ") {
            Ok(RefValue::Symbolic(target.to_string()))
        } else {
            Ok(RefValue::Direct(Oid::from_hex(content)?))
        }
    }

    /// Returns true if a reference file exists for `name`.
    pub fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.ref_path(name)?.is_file())
    }

    /// Follows a reference through symbolic indirections.
    ///
    /// Returns `Ok(None)` when any file along the chain is missing, e.g.
    /// `HEAD` on a fresh repository.
    ///
    /// # Errors
    ///
    /// `Error::InvalidRefName` if more than `max_depth` indirections are
    /// needed (usually a loop).
    pub fn resolve_ref(&self, name: &str) -> Result<Option<ResolvedRef>> {
        let mut current = name.to_string();

        for _ in 0..=self.max_depth {
            match self.read_ref_file(&current) {
                Ok(RefValue::Direct(oid)) => {
                    trace!(name, target = %current, %oid, "resolved ref");
                    return Ok(Some(ResolvedRef { name: current, oid }));
                }
                Ok(RefValue::Symbolic(target)) => current = target,
                Err(Error::RefNotFound(_)) => return Ok(None),
                Err(e) => return Err(e),
            }
        }

        Err(Error::InvalidRefName(format!(
            "reference loop or too many levels: {}",
            name
        )))
    }

    /// Resolves a reference to the object ID it finally points to.
    pub fn resolve(&self, name: &str) -> Result<Option<Oid>> {
        Ok(self.resolve_ref(name)?.map(|r| r.oid))
    }

    /// Returns the commit `HEAD` points to, if any.
    pub fn head(&self) -> Result<Option<Oid>> {
        self.resolve("HEAD")
    }

    /// Returns the name of the current branch, if HEAD points to a branch.
    ///
    /// Returns `None` if HEAD is detached or missing.
    pub fn current_branch(&self) -> Result<Option<String>> {
        match self.read_ref_file("HEAD") {
            Ok(RefValue::Symbolic(target)) => Ok(target
                .strip_prefix("refs/heads/")
                .map(|branch| branch.to_string())),
            Ok(RefValue::Direct(_)) | Err(Error::RefNotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Points `name` at `oid`, creating or replacing the ref file.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidRefName` for names that escape the control directory
    /// - `Error::Locked` if another writer holds the ref's lock file
    pub fn create(&self, name: &str, oid: &Oid) -> Result<()> {
        let path = self.ref_path(name)?;
        write_file_locked(&path, format!("{}\n", oid).as_bytes())?;
        debug!(name, %oid, "updated ref");
        Ok(())
    }

    /// Points `name` at another ref.
    pub fn create_symbolic(&self, name: &str, target: &str) -> Result<()> {
        validate_ref_name(target)?;
        let path = self.ref_path(name)?;
        write_file_locked(&path, format!("ref: {}\n", target).as_bytes())?;
        debug!(name, target, "updated symbolic ref");
        Ok(())
    }

    /// Moves the current position to `oid`.
    ///
    /// When `HEAD` names a branch the branch ref is updated; otherwise
    /// (detached or missing) `HEAD` itself is written.
    pub fn update_head(&self, oid: &Oid) -> Result<()> {
        match self.read_ref_file("HEAD") {
            Ok(RefValue::Symbolic(target)) => self.create(&target, oid),
            Ok(RefValue::Direct(_)) | Err(Error::RefNotFound(_)) => self.create("HEAD", oid),
            Err(e) => Err(e),
        }
    }

    /// Lists every ref under `refs/`, sorted by name.
    ///
    /// Refs whose chain ends at a missing file are left out.
    pub fn list(&self) -> Result<Vec<ResolvedRef>> {
        let refs_dir = self.git_dir.join("refs");
        if !refs_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        Self::collect_refs_recursive(&refs_dir, "refs", &mut names)?;
        names.sort();

        let mut refs = Vec::with_capacity(names.len());
        for name in names {
            if let Some(oid) = self.resolve(&name)? {
                refs.push(ResolvedRef { name, oid });
            }
        }
        Ok(refs)
    }

    /// Recursively collects reference names from a directory.
    fn collect_refs_recursive(dir: &Path, prefix: &str, refs: &mut Vec<String>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            let full_name = format!("{}/{}", prefix, name);

            let file_type = entry.file_type()?;
            if file_type.is_file() {
                if !name.ends_with(".lock") {
                    refs.push(full_name);
                }
            } else if file_type.is_dir() {
                Self::collect_refs_recursive(&entry.path(), &full_name, refs)?;
            }
        }

        Ok(())
    }

    fn ref_path(&self, name: &str) -> Result<PathBuf> {
        validate_ref_name(name)?;
        Ok(self.git_dir.join(name))
    }
}

/// Rejects names that would escape the control directory or collide
/// with lock files.
pub(crate) fn validate_ref_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('/')
        && !name.ends_with(".lock")
        && !name.contains('\0')
        && !name.contains('\\')
        && name.split('/').all(|part| !part.is_empty() && part != "." && part != "..");

    if valid {
        Ok(())
    } else {
        Err(Error::InvalidRefName(name.to_string()))
    }
}
