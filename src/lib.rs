//! # quali-core
//!
//! A reference-consistency engine for qualitative data analysis (QDA) over
//! a markdown vault.
//!
//! Researchers "code" paragraphs of data files by linking them to code
//! files, and "extract" paragraphs into typed records. Every such link is a
//! **Reference**: a matched pair of a forward wikilink in the data-file
//! paragraph (followed on the same line by the paragraph's stable block
//! anchor) and a backlink embed `![[data#^anchor]]` in the code or
//! extraction file. quali-core keeps those pairs consistent while the user
//! assigns, unassigns, renames, merges, splits, and deletes files.
//!
//! ## Architecture
//!
//! - [`anchor`]: stable per-paragraph block anchors (`^id-123456`)
//! - [`editor`]: line buffer abstraction and paragraph scope finding
//! - [`link`]: the one canonical wikilink/embed/anchor/frontmatter grammar
//! - [`reference`]: creating, removing, and redirecting matched pairs
//! - [`watcher`]: pre-delete interception with cascade cleanup
//! - [`merge`]: merging code/extraction files and splitting backlinks
//! - [`coding`] / [`extraction`]: the user-facing commands
//! - [`store`] / [`index`] / [`ui`]: the environment seams (text storage,
//!   link resolution, interactive pickers)
//!
//! There is no database: persisted state is the documents themselves, and
//! every operation batches its edits per file into one in-memory rewrite
//! before a single write call.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use quali_core::{
//!     coding, config::Settings, context::EngineContext, editor::LineBuffer,
//!     index::VaultIndex, store::{FsStore, TextStore}, ui::FixedPicker,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::default();
//!     let store = FsStore::new("./vault");
//!     let index = VaultIndex::scan(&store).await?;
//!     let ctx = EngineContext::new(&settings, &store, &index);
//!
//!     let buffer = LineBuffer::from_text(&store.read("Interview.md").await?);
//!     let picker = FixedPicker::choose("Theme/Joy");
//!     let (code, anchor) = coding::assign_code(&ctx, "Interview.md", &buffer, &picker).await?;
//!     println!("assigned {code} at {anchor}");
//!     Ok(())
//! }
//! ```
//!
//! Host applications adapt their own storage, editor, and dialog layers
//! onto the [`store::TextStore`], [`editor::LineBuffer`], and [`ui::Picker`]
//! seams; deletion runs through [`watcher::DeleteInterceptor`] so backlink
//! cleanup always completes before a file disappears.

pub mod anchor;
pub mod coding;
pub mod config;
pub mod context;
pub mod editor;
pub mod error;
pub mod extraction;
pub mod frontmatter;
pub mod index;
pub mod link;
pub mod merge;
pub mod reference;
pub mod report;
pub mod store;
pub mod ui;
pub mod watcher;

pub use error::*;
