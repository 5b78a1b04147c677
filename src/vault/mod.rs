//! Note vault metadata.
//!
//! Supplies what the graph engine reads from the host: link adjacency,
//! structural caches, tags and raw note text.
//!
//! - [`parser`] turns markdown into a [`NoteCache`]
//! - [`resolver`] maps link text to vault paths
//! - [`MetadataStore`] is the engine-facing trait, implemented by
//!   [`MemoryVault`] and [`FsVault`]

pub mod fs;
pub mod memory;
pub mod models;
pub mod parser;
pub mod resolver;
pub mod store;

pub use fs::FsVault;
pub use memory::MemoryVault;
pub use models::*;
pub use parser::{parse_note, split_lines};
pub use resolver::{link_path, LinkResolver};
pub use store::{MetadataStore, VaultSnapshot};
