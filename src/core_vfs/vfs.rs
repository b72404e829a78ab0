use std::collections::{BTreeMap, BTreeSet, HashMap};

use thiserror::Error;

/// Errors returned by the virtual filesystem. All of them map to an FTP
/// 550 reply; none of them ever terminates a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VfsError {
    #[error("directory not found: {0}")]
    NotFound(String),

    #[error("directory already exists: {0}")]
    AlreadyExists(String),

    #[error("directory not empty: {0}")]
    NotEmpty(String),
}

/// One directory in the synthetic tree. B-tree containers keep the entries
/// sorted, which is the order LIST must emit them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryNode {
    pub subdirs: BTreeSet<String>,
    pub files: BTreeMap<String, u64>,
}

/// Purely in-memory filesystem the honeypot presents to clients. Nothing in
/// here ever touches a real disk.
///
/// The tree is a flat map from normalized absolute path (`/`-separated, no
/// trailing slash except root) to its node. Parent relationships are derived
/// from the path string itself; there are no back-links. Invariant: every
/// name in a node's `subdirs` composes with that node's path to a tracked
/// key, and root (`/`) always exists.
#[derive(Debug, Clone)]
pub struct VirtualFs {
    nodes: HashMap<String, DirectoryNode>,
}

impl VirtualFs {
    /// An empty tree containing only root.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert("/".to_string(), DirectoryNode::default());
        Self { nodes }
    }

    /// The bait tree every session starts with: a single decoy directory
    /// holding two plausible-looking files.
    pub fn seeded() -> Self {
        let mut fs = Self::new();
        fs.make_directory("/", "fake_dir")
            .expect("seeding a fresh tree cannot collide");
        fs.put_file("/fake_dir", "file1.txt", 123);
        fs.put_file("/fake_dir", "file2.txt", 456);
        fs
    }

    /// Collapses duplicate separators and trailing slashes into a normalized
    /// absolute path.
    fn normalize(path: &str) -> String {
        let joined: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if joined.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", joined.join("/"))
        }
    }

    /// Parent of a normalized path, computed by string manipulation. Root is
    /// its own parent.
    pub fn parent(path: &str) -> String {
        match path.trim_end_matches('/').rsplit_once('/') {
            Some(("", _)) | None => "/".to_string(),
            Some((prefix, _)) => prefix.to_string(),
        }
    }

    /// Resolves a client-supplied CWD/LIST argument against the current
    /// directory.
    ///
    /// A bare `..` moves to the parent (a no-op at root). Everything else is
    /// plain concatenation with separators collapsed -- including arguments
    /// that look absolute, which the emulated server joins just the same.
    pub fn resolve(current_dir: &str, arg: &str) -> String {
        if arg == ".." {
            Self::parent(current_dir)
        } else {
            Self::normalize(&format!("{}/{}", current_dir.trim_end_matches('/'), arg))
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.contains_key(path)
    }

    pub fn node(&self, path: &str) -> Option<&DirectoryNode> {
        self.nodes.get(path)
    }

    /// Sorted subdirectories and sorted `(name, size)` files of `path`.
    pub fn list_entries(&self, path: &str) -> Result<(Vec<String>, Vec<(String, u64)>), VfsError> {
        let node = self
            .nodes
            .get(path)
            .ok_or_else(|| VfsError::NotFound(path.to_string()))?;
        let dirs = node.subdirs.iter().cloned().collect();
        let files = node.files.iter().map(|(n, s)| (n.clone(), *s)).collect();
        Ok((dirs, files))
    }

    pub fn make_directory(&mut self, parent: &str, name: &str) -> Result<(), VfsError> {
        let composed = Self::resolve(parent, name);
        let node = self
            .nodes
            .get(parent)
            .ok_or_else(|| VfsError::NotFound(parent.to_string()))?;
        if node.subdirs.contains(name) || self.nodes.contains_key(&composed) {
            return Err(VfsError::AlreadyExists(composed));
        }
        self.nodes
            .get_mut(parent)
            .expect("parent checked above")
            .subdirs
            .insert(name.to_string());
        self.nodes.insert(composed, DirectoryNode::default());
        Ok(())
    }

    pub fn remove_directory(&mut self, parent: &str, name: &str) -> Result<(), VfsError> {
        let composed = Self::resolve(parent, name);
        let known = self
            .nodes
            .get(parent)
            .map(|n| n.subdirs.contains(name))
            .unwrap_or(false);
        if !known {
            return Err(VfsError::NotFound(composed));
        }
        if let Some(target) = self.nodes.get(&composed) {
            if !target.subdirs.is_empty() || !target.files.is_empty() {
                return Err(VfsError::NotEmpty(composed));
            }
        }
        self.nodes
            .get_mut(parent)
            .expect("parent checked above")
            .subdirs
            .remove(name);
        self.nodes.remove(&composed);
        Ok(())
    }

    /// Records a file unconditionally, creating or overwriting the listing
    /// entry. STOR on the bait tree always succeeds.
    pub fn put_file(&mut self, path: &str, name: &str, size: u64) {
        self.nodes
            .entry(path.to_string())
            .or_default()
            .files
            .insert(name.to_string(), size);
    }

    pub fn delete_file(&mut self, path: &str, name: &str) -> Result<(), VfsError> {
        let node = self
            .nodes
            .get_mut(path)
            .ok_or_else(|| VfsError::NotFound(path.to_string()))?;
        if node.files.remove(name).is_none() {
            return Err(VfsError::NotFound(format!("{}/{}", path, name)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_tree() {
        let fs = VirtualFs::seeded();
        assert!(fs.exists("/"));
        assert!(fs.exists("/fake_dir"));
        let (dirs, files) = fs.list_entries("/").unwrap();
        assert_eq!(dirs, vec!["fake_dir".to_string()]);
        assert!(files.is_empty());
        let (_, files) = fs.list_entries("/fake_dir").unwrap();
        assert_eq!(
            files,
            vec![("file1.txt".to_string(), 123), ("file2.txt".to_string(), 456)]
        );
    }

    #[test]
    fn test_resolve_concatenates_and_collapses() {
        assert_eq!(VirtualFs::resolve("/", "fake_dir"), "/fake_dir");
        assert_eq!(VirtualFs::resolve("/fake_dir", "sub"), "/fake_dir/sub");
        assert_eq!(VirtualFs::resolve("/", "/fake_dir"), "/fake_dir");
        assert_eq!(VirtualFs::resolve("/a", "b//c/"), "/a/b/c");
        assert_eq!(VirtualFs::resolve("/", ""), "/");
    }

    #[test]
    fn test_dotdot_clamps_at_root() {
        assert_eq!(VirtualFs::resolve("/", ".."), "/");
        assert_eq!(VirtualFs::resolve("/a", ".."), "/");
        assert_eq!(VirtualFs::resolve("/a/b/c", ".."), "/a/b");
    }

    #[test]
    fn test_mkd_rmd_round_trip() {
        let mut fs = VirtualFs::seeded();
        let before = fs.list_entries("/").unwrap();
        fs.make_directory("/", "incoming").unwrap();
        assert!(fs.exists("/incoming"));
        fs.remove_directory("/", "incoming").unwrap();
        assert!(!fs.exists("/incoming"));
        assert_eq!(fs.list_entries("/").unwrap(), before);
    }

    #[test]
    fn test_mkd_existing_fails() {
        let mut fs = VirtualFs::seeded();
        assert_eq!(
            fs.make_directory("/", "fake_dir"),
            Err(VfsError::AlreadyExists("/fake_dir".to_string()))
        );
    }

    #[test]
    fn test_rmd_non_empty_mutates_nothing() {
        let mut fs = VirtualFs::seeded();
        let snapshot = fs.clone();
        assert_eq!(
            fs.remove_directory("/", "fake_dir"),
            Err(VfsError::NotEmpty("/fake_dir".to_string()))
        );
        assert!(fs.exists("/fake_dir"));
        assert_eq!(
            fs.list_entries("/").unwrap(),
            snapshot.list_entries("/").unwrap()
        );
        assert_eq!(
            fs.list_entries("/fake_dir").unwrap(),
            snapshot.list_entries("/fake_dir").unwrap()
        );
    }

    #[test]
    fn test_rmd_unknown_fails() {
        let mut fs = VirtualFs::seeded();
        assert!(matches!(
            fs.remove_directory("/", "nope"),
            Err(VfsError::NotFound(_))
        ));
    }

    #[test]
    fn test_put_file_overwrites() {
        let mut fs = VirtualFs::seeded();
        fs.put_file("/fake_dir", "file1.txt", 0);
        let (_, files) = fs.list_entries("/fake_dir").unwrap();
        assert_eq!(files[0], ("file1.txt".to_string(), 0));
    }

    #[test]
    fn test_delete_file() {
        let mut fs = VirtualFs::seeded();
        fs.delete_file("/fake_dir", "file1.txt").unwrap();
        assert!(matches!(
            fs.delete_file("/fake_dir", "file1.txt"),
            Err(VfsError::NotFound(_))
        ));
    }
}
