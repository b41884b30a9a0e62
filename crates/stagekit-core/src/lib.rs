//! Stagekit Core - Component tree model, wire document, and tree operations

pub mod document;
pub mod error;
pub mod tree;
pub mod types;

pub use document::{
    canonicalize, document_from_value, parse_component, parse_document, quaternion_norm,
    to_document_string, to_document_string_pretty, validate_document, validate_subtree,
};
pub use error::{Error, Result};
pub use tree::{
    add_child, build_name_index, count, depth_of, find_by_name, find_by_name_mut, get_parent,
    names, remove_by_name, render_tree, take_by_name,
};
pub use types::*;
