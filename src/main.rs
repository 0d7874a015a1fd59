//! tree-context: directory trees and LLM context documents

use anyhow::Result;

fn main() -> Result<()> {
    tree_context::cli::run()
}
