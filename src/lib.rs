//! catmap: fold data-catalog records into mind map trees, lay them out and
//! keep a graph surface in sync through incremental reconciliation.
//!
//! Layers, leaf first: [`domain`] (tree, collapse, layout, reconcile),
//! [`application`] (catalog paging, view lifecycle), [`infrastructure`]
//! (record sources, caches, surfaces, wiring) and [`cli`].

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
