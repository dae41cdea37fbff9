pub mod client;
pub mod status;

pub use client::GitClient;
pub use status::{parse_porcelain, FileStatus};
