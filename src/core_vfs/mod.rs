pub mod vfs;

pub use vfs::{DirectoryNode, VfsError, VirtualFs};
