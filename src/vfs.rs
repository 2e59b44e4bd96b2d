//! In-memory folder/file tree shared by the terminal and the file manager.
//!
//! Paths are `/`-separated and absolute. Names are unique inside a folder
//! because children live in a map keyed by name; listings therefore come out
//! in lexicographic order.

use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use thiserror::Error;

pub const ROOT: &str = "/";
pub const HOME_DIR: &str = "/home/user";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VfsError {
    #[error("{0}: no such directory")]
    NotFound(String),
    #[error("{0}: not a directory")]
    NotADirectory(String),
    #[error("{0}: already exists")]
    AlreadyExists(String),
    #[error("invalid name: {0:?}")]
    InvalidName(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileNode {
    pub content: String,
    pub size: u64,
    pub modified: DateTime<Local>,
}

impl FileNode {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            size: content.len() as u64,
            content,
            modified: Local::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Folder {
    pub children: BTreeMap<String, Node>,
}

impl Folder {
    fn with(children: impl IntoIterator<Item = (&'static str, Node)>) -> Self {
        Self {
            children: children
                .into_iter()
                .map(|(name, node)| (name.to_string(), node))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Folder(Folder),
    File(FileNode),
}

impl Node {
    pub fn is_folder(&self) -> bool {
        matches!(self, Node::Folder(_))
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Node::Folder(folder) => Some(folder),
            Node::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileNode> {
        match self {
            Node::File(file) => Some(file),
            Node::Folder(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File,
}

/// One row of a folder listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Local>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VirtualFileTree {
    root: Folder,
}

impl Default for VirtualFileTree {
    fn default() -> Self {
        Self::seeded()
    }
}

impl VirtualFileTree {
    /// The stock tree every session starts from.
    pub fn seeded() -> Self {
        let now = Local::now();
        let welcome = FileNode {
            content: "Benvenuto in FutureOS!\n\nQuesto è un file di esempio nel tuo sistema operativo futuristico.".to_string(),
            size: 124,
            modified: now,
        };
        let notes = FileNode {
            content: "Le mie note:\n\n- FutureOS è fantastico\n- Il terminale funziona perfettamente\n- Il file manager è molto intuitivo".to_string(),
            size: 156,
            modified: now,
        };
        let documents = Folder::with([
            ("welcome.txt", Node::File(welcome)),
            ("notes.txt", Node::File(notes)),
        ]);
        let user = Folder::with([
            ("Documents", Node::Folder(documents)),
            ("Downloads", Node::Folder(Folder::default())),
            ("Pictures", Node::Folder(Folder::default())),
        ]);
        let home = Folder::with([("user", Node::Folder(user))]);
        Self {
            root: Folder::with([
                ("home", Node::Folder(home)),
                ("bin", Node::Folder(Folder::default())),
                ("etc", Node::Folder(Folder::default())),
            ]),
        }
    }

    pub fn node(&self, path: &str) -> Option<&Node> {
        let mut segments = segments(path).peekable();
        if segments.peek().is_none() {
            return None;
        }
        let mut current = &self.root;
        while let Some(segment) = segments.next() {
            let child = current.children.get(segment)?;
            if segments.peek().is_none() {
                return Some(child);
            }
            current = child.as_folder()?;
        }
        None
    }

    pub fn folder(&self, path: &str) -> Option<&Folder> {
        if segments(path).next().is_none() {
            return Some(&self.root);
        }
        self.node(path).and_then(Node::as_folder)
    }

    fn folder_mut(&mut self, path: &str) -> Result<&mut Folder, VfsError> {
        let mut current = &mut self.root;
        for segment in segments(path) {
            current = match current.children.get_mut(segment) {
                Some(Node::Folder(folder)) => folder,
                Some(Node::File(_)) => return Err(VfsError::NotADirectory(path.to_string())),
                None => return Err(VfsError::NotFound(path.to_string())),
            };
        }
        Ok(current)
    }

    pub fn is_folder(&self, path: &str) -> bool {
        self.folder(path).is_some()
    }

    pub fn read_file(&self, path: &str) -> Option<&FileNode> {
        self.node(path).and_then(Node::as_file)
    }

    /// Child names of the folder at `path`, `None` when it is not a folder.
    pub fn child_names(&self, path: &str) -> Option<Vec<String>> {
        self.folder(path)
            .map(|folder| folder.children.keys().cloned().collect())
    }

    pub fn list(&self, path: &str) -> Option<Vec<Entry>> {
        let folder = self.folder(path)?;
        Some(
            folder
                .children
                .iter()
                .map(|(name, node)| match node {
                    Node::Folder(_) => Entry {
                        name: name.clone(),
                        kind: EntryKind::Folder,
                        size: None,
                        modified: None,
                    },
                    Node::File(file) => Entry {
                        name: name.clone(),
                        kind: EntryKind::File,
                        size: Some(file.size),
                        modified: Some(file.modified),
                    },
                })
                .collect(),
        )
    }

    pub fn create_folder(&mut self, parent: &str, name: &str) -> Result<(), VfsError> {
        self.insert(parent, name, Node::Folder(Folder::default()))
    }

    pub fn create_file(&mut self, parent: &str, name: &str, content: &str) -> Result<(), VfsError> {
        self.insert(parent, name, Node::File(FileNode::new(content)))
    }

    fn insert(&mut self, parent: &str, name: &str, node: Node) -> Result<(), VfsError> {
        validate_name(name)?;
        let folder = self.folder_mut(parent)?;
        if folder.children.contains_key(name) {
            return Err(VfsError::AlreadyExists(join(parent, name)));
        }
        folder.children.insert(name.to_string(), node);
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), VfsError> {
    if name.trim().is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(VfsError::InvalidName(name.to_string()));
    }
    Ok(())
}

// ── Path helpers ──────────────────────────────────────────────────────────────

pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

pub fn join(dir: &str, name: &str) -> String {
    if segments(dir).next().is_none() {
        format!("/{name}")
    } else {
        format!("{}/{name}", dir.trim_end_matches('/'))
    }
}

/// Parent of `path`; the root is its own parent.
pub fn parent(path: &str) -> String {
    let mut parts: Vec<&str> = segments(path).collect();
    parts.pop();
    from_segments(&parts)
}

/// Resolve `target` against `cwd` lexically, honouring `.` and `..`.
/// `..` at the root stays at the root.
pub fn normalize(cwd: &str, target: &str) -> String {
    let mut parts: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        segments(cwd).collect()
    };
    for segment in segments(target) {
        match segment {
            "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    from_segments(&parts)
}

fn from_segments(parts: &[&str]) -> String {
    if parts.is_empty() {
        ROOT.to_string()
    } else {
        format!("/{}", parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_home_lists_user_folders() {
        let tree = VirtualFileTree::seeded();
        assert_eq!(
            tree.child_names(HOME_DIR),
            Some(vec![
                "Documents".to_string(),
                "Downloads".to_string(),
                "Pictures".to_string()
            ])
        );
        assert_eq!(
            tree.child_names(ROOT),
            Some(vec!["bin".to_string(), "etc".to_string(), "home".to_string()])
        );
    }

    #[test]
    fn lookups_distinguish_files_and_folders() {
        let tree = VirtualFileTree::seeded();
        assert!(tree.is_folder("/home/user/Documents"));
        assert!(!tree.is_folder("/home/user/Documents/welcome.txt"));
        assert!(tree.read_file("/home/user/Documents/welcome.txt").is_some());
        assert!(tree.read_file("/home/user/Documents").is_none());
        assert!(tree.node("/home/user/Documents/welcome.txt/inner").is_none());
        assert!(tree.node("/nope").is_none());
        assert!(tree.is_folder("/"));
    }

    #[test]
    fn creating_duplicate_sibling_is_rejected_without_change() {
        let mut tree = VirtualFileTree::seeded();
        let before = tree.clone();
        assert_eq!(
            tree.create_folder(HOME_DIR, "Documents"),
            Err(VfsError::AlreadyExists("/home/user/Documents".to_string()))
        );
        assert_eq!(tree, before);
    }

    #[test]
    fn created_nodes_appear_in_listing() {
        let mut tree = VirtualFileTree::seeded();
        tree.create_folder(HOME_DIR, "Music").unwrap();
        tree.create_file("/home/user/Music", "song.txt", "la la").unwrap();
        let entries = tree.list("/home/user/Music").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "song.txt");
        assert_eq!(entries[0].kind, EntryKind::File);
        assert_eq!(entries[0].size, Some(5));
    }

    #[test]
    fn create_rejects_bad_names_and_missing_parents() {
        let mut tree = VirtualFileTree::seeded();
        assert!(matches!(
            tree.create_folder(HOME_DIR, "  "),
            Err(VfsError::InvalidName(_))
        ));
        assert!(matches!(
            tree.create_folder(HOME_DIR, "a/b"),
            Err(VfsError::InvalidName(_))
        ));
        assert!(matches!(
            tree.create_folder("/missing", "x"),
            Err(VfsError::NotFound(_))
        ));
        assert!(matches!(
            tree.create_folder("/home/user/Documents/notes.txt", "x"),
            Err(VfsError::NotADirectory(_))
        ));
    }

    #[test]
    fn path_helpers() {
        assert_eq!(join("/", "home"), "/home");
        assert_eq!(join("/home/user", "Documents"), "/home/user/Documents");
        assert_eq!(parent("/home/user"), "/home");
        assert_eq!(parent("/"), "/");
        assert_eq!(normalize("/home/user", ".."), "/home");
        assert_eq!(normalize("/", ".."), "/");
        assert_eq!(normalize("/home/user", "/etc"), "/etc");
        assert_eq!(normalize("/home/user", "./Documents/../Pictures"), "/home/user/Pictures");
    }
}
