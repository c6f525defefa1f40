//! # Folio
//!
//! Resolves a directory of authored content (markdown documents, slide decks,
//! script pages, images) into a navigable tree, and keeps that tree current
//! while authors edit.
//!
//! # Architecture: Resolve, Don't Render
//!
//! Folio owns everything between "a path on disk" and "the file a URL should
//! show". Rendering is someone else's job; Folio hands it a tree, a located
//! file, and the file's frontmatter.
//!
//! ```text
//!  content/  ──scan──►  addresses ──► tree (+ frontmatter) ──► navigate / locate
//!     ▲                                                             │
//!     └──── watch ──► debounce ──► rebuild ──► GenerationChanged ───┘
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`path`] | Canonicalizes raw addresses into content-relative paths |
//! | [`tree`] | Builds the hierarchical [`types::DirectoryEntry`] from flat addresses |
//! | [`navigate`] | Walks the tree for a logical path, landing on a directory or file |
//! | [`locate`] | Finds the file a folder request stands for (`index`, `README`, `SLIDES`) |
//! | [`frontmatter`] | Pulls declared metadata out of YAML/TOML headers and script exports |
//! | [`engine`] | Owns the current generation; rebuilds, broadcasts, and serves loads |
//! | [`watch`] | Turns file events into debounced rebuilds |
//! | [`listing`] | Post listings with the one sort order |
//! | [`config`] | `config.toml` loading, validation, and merging over stock defaults |
//! | [`naming`] | `NN-name` filename convention and display titles |
//! | [`types`] | The serializable content model |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Immutable Generations
//!
//! Every rebuild produces a brand new [`engine::Generation`] and swaps an
//! `Arc`. Nothing is patched in place, so a reader can never observe a tree
//! that disagrees with its own address map. A failed rebuild simply leaves
//! the previous generation current.
//!
//! ## Conventions Over Configuration
//!
//! A folder request resolves by trying a fixed, ordered list of names:
//! `index.*` before `README.*` before the sibling `folder.*`. The order of
//! candidates always outranks the order of extensions, so `index.md` beats
//! `README.mdx`. There is no routing table to keep in sync.
//!
//! ## Frontmatter Without Evaluation
//!
//! Script pages declare `export const frontmatter = { ... }`. Folio reads that
//! literal with a small tokenizer and keeps only what is statically known:
//! strings, numbers, booleans, arrays and nested objects. Nothing is executed.
//!
//! ## One Notification, No Payload
//!
//! Subscribers receive [`engine::GenerationChanged`] and nothing else. The only
//! correct reaction is to resolve again against the new generation, which keeps
//! consumers from trusting partial diffs.

pub mod config;
pub mod engine;
pub mod frontmatter;
pub mod listing;
pub mod locate;
pub mod naming;
pub mod navigate;
pub mod output;
pub mod path;
pub mod tree;
pub mod types;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
