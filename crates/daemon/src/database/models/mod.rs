mod comment;
mod file;
mod share;

pub use comment::Comment;
pub use file::File;
pub use share::{DeletedShare, Share, ShareWithStats};
