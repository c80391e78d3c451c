//! Git repository operations.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::index::{self, Index};
use crate::infra::compression::DEFAULT_LEVEL;
use crate::infra::{read_file, write_file_locked};
use crate::objects::{
    Commit, LooseObjectStore, Mode, Object, ObjectType, Oid, Signature, Tag, Tree,
};
use crate::refs::resolver::{validate_ref_name, DEFAULT_MAX_DEPTH};
use crate::refs::{RefStore, ResolvedRef};
use crate::tree_builder;

/// Run-time settings for a [`Repository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryOptions {
    /// Zlib level (0-10) used when writing objects.
    pub compression_level: u8,
    /// Symbolic-ref indirections followed before reporting a loop.
    pub max_ref_depth: usize,
}

impl Default for RepositoryOptions {
    fn default() -> Self {
        RepositoryOptions {
            compression_level: DEFAULT_LEVEL,
            max_ref_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// One row of [`Repository::ls_tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LsTreeEntry {
    /// Entry mode as stored in the tree.
    pub mode: Mode,
    /// Type of the object the entry points to.
    pub kind: ObjectType,
    /// Object the entry points to.
    pub oid: Oid,
    /// Path relative to the listed tree.
    pub path: String,
}

/// A Git repository.
///
/// An explicit handle over one control directory: every path the store
/// touches is derived from it, and nothing is cached between calls.
#[derive(Debug)]
pub struct Repository {
    /// The root directory of the working tree.
    work_dir: PathBuf,
    /// The path to the `.git` directory.
    git_dir: PathBuf,
    options: RepositoryOptions,
    objects: LooseObjectStore,
    refs: RefStore,
}

impl Repository {
    /// Validates that a directory is a valid Git directory.
    ///
    /// A valid `.git` directory must contain at least:
    /// - `HEAD` file
    /// - `objects/` directory
    /// - `refs/` directory
    fn validate_git_dir(git_dir: &Path) -> Result<()> {
        let valid = git_dir.is_dir()
            && git_dir.join("HEAD").is_file()
            && git_dir.join("objects").is_dir()
            && git_dir.join("refs").is_dir();

        if valid {
            Ok(())
        } else {
            Err(Error::NotARepository(git_dir.to_path_buf()))
        }
    }

    /// Opens an existing Git repository with default options.
    ///
    /// The path can point to either:
    /// - The repository root (containing `.git/`)
    /// - The `.git` directory itself
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gitcore::Repository;
    ///
    /// let repo = Repository::open("path/to/repo").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_options(path, RepositoryOptions::default())
    }

    /// Opens an existing Git repository with explicit options.
    pub fn with_options<P: AsRef<Path>>(path: P, options: RepositoryOptions) -> Result<Self> {
        let path = path.as_ref();

        let abs_path = path
            .canonicalize()
            .map_err(|_| Error::NotARepository(path.to_path_buf()))?;

        let (work_dir, git_dir) = if abs_path.ends_with(".git") {
            let work_dir = abs_path
                .parent()
                .ok_or_else(|| Error::NotARepository(path.to_path_buf()))?
                .to_path_buf();
            (work_dir, abs_path)
        } else {
            let git_dir = abs_path.join(".git");
            (abs_path, git_dir)
        };

        Self::validate_git_dir(&git_dir)?;

        let objects = LooseObjectStore::new(git_dir.join("objects"))
            .with_compression_level(options.compression_level);
        let refs = RefStore::new(&git_dir).with_max_depth(options.max_ref_depth);

        Ok(Repository {
            work_dir,
            git_dir,
            options,
            objects,
            refs,
        })
    }

    /// Returns the root directory of the working tree.
    pub fn path(&self) -> &Path {
        &self.work_dir
    }

    /// Returns the path to the `.git` directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Returns the options this handle was opened with.
    pub fn options(&self) -> &RepositoryOptions {
        &self.options
    }

    /// Returns the loose object store.
    pub fn objects(&self) -> &LooseObjectStore {
        &self.objects
    }

    /// Returns the reference store.
    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    /// Reads and decodes an object.
    pub fn object_read(&self, oid: &Oid) -> Result<Object> {
        self.objects.read(oid)
    }

    /// Encodes and stores an object, returning its id.
    pub fn object_write(&self, object: &Object) -> Result<Oid> {
        self.objects.write(object)
    }

    /// Hashes `content` as an object of type `kind`, storing it if `write`.
    ///
    /// The payload is decoded first, so a malformed tree or commit is
    /// rejected rather than stored.
    pub fn hash_object(&self, kind: ObjectType, content: &[u8], write: bool) -> Result<Oid> {
        Object::from_payload(kind, content)?;
        if write {
            self.objects.write_raw(kind, content)
        } else {
            Ok(LooseObjectStore::hash_only(kind, content))
        }
    }

    /// Resolves a name to exactly one object id.
    ///
    /// `HEAD` is resolved through refs only. Any other name is tried as a
    /// hex prefix (4 to 40 digits), as `refs/tags/<name>` and as
    /// `refs/heads/<name>`; all matches are pooled.
    ///
    /// # Errors
    ///
    /// - `Error::NameNotFound` if nothing matches
    /// - `Error::Ambiguous` if more than one distinct object matches
    pub fn resolve(&self, name: &str) -> Result<Oid> {
        if name.is_empty() {
            return Err(Error::NameNotFound(name.to_string()));
        }

        if name == "HEAD" {
            return self
                .refs
                .head()?
                .ok_or_else(|| Error::NameNotFound(name.to_string()));
        }

        let mut candidates = Vec::new();

        if Oid::is_hex_prefix(name) {
            candidates.extend(self.objects.find_objects_by_prefix(name)?);
        }

        for namespace in ["refs/tags/", "refs/heads/"] {
            let ref_name = format!("{}{}", namespace, name);
            // A name no ref could carry simply matches nothing here.
            if validate_ref_name(&ref_name).is_err() {
                continue;
            }
            if let Some(oid) = self.refs.resolve(&ref_name)? {
                candidates.push(oid);
            }
        }

        candidates.sort();
        candidates.dedup();
        trace!(name, candidates = candidates.len(), "resolved name");

        match candidates.len() {
            0 => Err(Error::NameNotFound(name.to_string())),
            1 => Ok(candidates[0]),
            _ => Err(Error::Ambiguous {
                name: name.to_string(),
                candidates,
            }),
        }
    }

    /// Resolves a name and, if `kind` is given, walks to an object of that
    /// type.
    ///
    /// With `follow`, a tag leads to its target and a commit leads to its
    /// tree when a tree is wanted. Any other mismatch is `NameNotFound`.
    pub fn find(&self, name: &str, kind: Option<ObjectType>, follow: bool) -> Result<Oid> {
        let mut oid = self.resolve(name)?;
        let Some(kind) = kind else {
            return Ok(oid);
        };

        loop {
            let object = self.object_read(&oid)?;
            if object.kind() == kind {
                return Ok(oid);
            }
            if !follow {
                return Err(Error::NameNotFound(name.to_string()));
            }

            oid = match object {
                Object::Tag(tag) => tag.object()?,
                Object::Commit(commit) if kind == ObjectType::Tree => commit.tree()?,
                _ => return Err(Error::NameNotFound(name.to_string())),
            };
        }
    }

    /// Reads the index, or returns an empty one if there is no index file.
    pub fn index_read(&self) -> Result<Index> {
        match read_file(self.index_path())? {
            Some(data) => index::parse(&data),
            None => Ok(Index::new()),
        }
    }

    /// Writes the index under `index.lock`.
    pub fn index_write(&self, idx: &Index) -> Result<()> {
        write_file_locked(self.index_path(), &index::write(idx))?;
        debug!(entries = idx.len(), "wrote index");
        Ok(())
    }

    /// Writes the trees for `idx` and returns the root tree id.
    pub fn tree_from_index(&self, idx: &Index) -> Result<Oid> {
        tree_builder::tree_from_index(&self.objects, idx.entries())
    }

    /// Writes a commit object and returns its id. Refs are not touched.
    pub fn commit_create(
        &self,
        tree: &Oid,
        parents: &[Oid],
        author: &Signature,
        committer: &Signature,
        message: &str,
    ) -> Result<Oid> {
        let commit = Commit::new(tree, parents, author, committer, message);
        self.object_write(&Object::Commit(commit))
    }

    /// Commits the current index.
    ///
    /// The tree is built from the index, `HEAD` (if it resolves) becomes
    /// the parent, and the active branch, or a detached `HEAD`, is moved
    /// to the new commit.
    pub fn commit_index(&self, message: &str, signature: &Signature) -> Result<Oid> {
        let idx = self.index_read()?;
        let tree = self.tree_from_index(&idx)?;
        let parents: Vec<Oid> = self.refs.head()?.into_iter().collect();

        let oid = self.commit_create(&tree, &parents, signature, signature, message)?;
        self.refs.update_head(&oid)?;
        debug!(%oid, %tree, parents = parents.len(), "committed index");

        Ok(oid)
    }

    /// Returns the commit `HEAD` points to, if any.
    pub fn head(&self) -> Result<Option<Oid>> {
        self.refs.head()
    }

    /// Returns the active branch name, or `None` when detached.
    pub fn current_branch(&self) -> Result<Option<String>> {
        self.refs.current_branch()
    }

    /// Creates or replaces a ref such as `refs/heads/main`.
    pub fn ref_create(&self, name: &str, oid: &Oid) -> Result<()> {
        self.refs.create(name, oid)
    }

    /// Lists every ref under `refs/`, sorted by name.
    pub fn ref_list(&self) -> Result<Vec<ResolvedRef>> {
        self.refs.list()
    }

    /// Creates `refs/tags/<name>` pointing at `target`.
    ///
    /// Without an annotation the tag is lightweight. With one, a tag object
    /// is written (recording the target's real type) and the ref points at
    /// it. Returns the id the ref now holds.
    ///
    /// # Errors
    ///
    /// `Error::RefAlreadyExists` if the tag exists.
    pub fn tag_create(
        &self,
        name: &str,
        target: &str,
        annotation: Option<(&Signature, &str)>,
    ) -> Result<Oid> {
        let ref_name = format!("refs/tags/{}", name);
        if self.refs.exists(&ref_name)? {
            return Err(Error::RefAlreadyExists(ref_name));
        }

        let target_oid = self.resolve(target)?;
        let oid = match annotation {
            None => target_oid,
            Some((tagger, message)) => {
                let kind = self.object_read(&target_oid)?.kind();
                let tag = Tag::new(&target_oid, kind, name, tagger, message);
                self.object_write(&Object::Tag(tag))?
            }
        };

        self.refs.create(&ref_name, &oid)?;
        Ok(oid)
    }

    /// Lists the entries of a tree-ish.
    ///
    /// In recursive mode subtrees are descended into and only their
    /// contents are listed.
    pub fn ls_tree(&self, name: &str, recursive: bool) -> Result<Vec<LsTreeEntry>> {
        let root = self.find(name, Some(ObjectType::Tree), true)?;

        let mut out = Vec::new();
        let mut pending = vec![(root, String::new())];
        while let Some((oid, prefix)) = pending.pop() {
            let tree = self.read_tree(&oid)?;
            let mut subtrees = Vec::new();

            for entry in tree.iter() {
                let path = join_path(&prefix, entry.path());
                let kind = entry.mode().file_mode()?.object_type();

                if recursive && kind == ObjectType::Tree {
                    subtrees.push((*entry.oid(), path));
                } else {
                    out.push(LsTreeEntry {
                        mode: entry.mode(),
                        kind,
                        oid: *entry.oid(),
                        path,
                    });
                }
            }
            pending.extend(subtrees.into_iter().rev());
        }

        if recursive {
            out.sort_by(|a, b| a.path.cmp(&b.path));
        }
        Ok(out)
    }

    /// Flattens a tree-ish into `path -> id` for every non-tree entry.
    pub fn tree_to_map(&self, name: &str) -> Result<BTreeMap<String, Oid>> {
        Ok(self
            .ls_tree(name, true)?
            .into_iter()
            .map(|entry| (entry.path, entry.oid))
            .collect())
    }

    fn read_tree(&self, oid: &Oid) -> Result<Tree> {
        self.object_read(oid)?.into_tree()
    }

    fn index_path(&self) -> PathBuf {
        self.git_dir.join("index")
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}
