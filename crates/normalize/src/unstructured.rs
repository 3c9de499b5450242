//! Rewrite for markup with no recognizable structure.
//!
//! The metadata header is stripped and every text block lands as `p.text` in
//! a flat body; tables and lists survive as-is. Chapter anchors are ignored.

use ingest::DocumentHeader;
use markup::Tree;

use crate::anchor::rewrite_items;

pub(crate) fn rewrite(tree: &Tree, header: &DocumentHeader) -> String {
    rewrite_items(tree, header, false)
}
