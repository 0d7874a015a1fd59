//! tree-context: render a project's directory tree and an LLM-ready context
//! document
//!
//! The library walks a directory under gitignore-style exclusion rules,
//! classifies files as text or binary, and either inlines their content or,
//! for large files, splits them into token-bounded chunks that can be
//! summarized by a pluggable [`summarize::Summarizer`].

pub mod chunk;
pub mod cli;
pub mod config;
pub mod domain;
pub mod filter;
pub mod render;
pub mod scan;
pub mod summarize;
pub mod utils;
