pub mod entry;
pub mod listing;
pub mod walker;

pub use entry::{EntryKind, FsEntry};
pub use listing::list_archivable_dirs;
pub use walker::{Entries, Walker};
