//! Tree operations: lookup, insertion, removal and name indexing
//!
//! All searches are pre-order (self, then children left to right) and stop at
//! the first match.

use crate::document::validate_subtree;
use crate::error::{Error, Result};
use crate::types::Component;
use std::collections::{HashMap, HashSet};

/// Map every name in the tree to its node.
///
/// The index borrows the tree, so it cannot outlive a structural mutation.
/// Rebuild it after every `add_child` / `remove_by_name`.
pub fn build_name_index(root: &Component) -> HashMap<&str, &Component> {
    let mut index = HashMap::new();
    index_into(root, &mut index);
    index
}

fn index_into<'a>(node: &'a Component, index: &mut HashMap<&'a str, &'a Component>) {
    index.insert(node.name.as_str(), node);
    for child in &node.children {
        index_into(child, index);
    }
}

pub fn find_by_name<'a>(name: &str, root: &'a Component) -> Option<&'a Component> {
    if root.name == name {
        return Some(root);
    }
    for child in &root.children {
        if let Some(found) = find_by_name(name, child) {
            return Some(found);
        }
    }
    None
}

pub fn find_by_name_mut<'a>(name: &str, root: &'a mut Component) -> Option<&'a mut Component> {
    if root.name == name {
        return Some(root);
    }
    for child in root.children.iter_mut() {
        if let Some(found) = find_by_name_mut(name, child) {
            return Some(found);
        }
    }
    None
}

/// The node whose direct children include `target_name`.
pub fn get_parent<'a>(target_name: &str, root: &'a Component) -> Option<&'a Component> {
    if root.children.iter().any(|c| c.name == target_name) {
        return Some(root);
    }
    for child in &root.children {
        if let Some(parent) = get_parent(target_name, child) {
            return Some(parent);
        }
    }
    None
}

/// Append `new_component` (with its subtree) under `parent_name`.
///
/// Every name in the incoming subtree is checked against the tree, and every
/// node against the per-node schema rules, before anything is touched. On
/// error the tree is unchanged.
pub fn add_child(
    root: &mut Component,
    parent_name: &str,
    new_component: Component,
) -> Result<()> {
    {
        let index = build_name_index(root);
        let mut incoming = HashSet::new();
        for name in names(&new_component) {
            if index.contains_key(name) || !incoming.insert(name) {
                return Err(Error::duplicate_name(name));
            }
        }
    }
    validate_subtree(&new_component)?;
    let parent = find_by_name_mut(parent_name, root)
        .ok_or_else(|| Error::parent_not_found(parent_name))?;
    parent.children.push(new_component);
    Ok(())
}

/// Detach the first node named `name` along with its subtree.
///
/// The root is never removed. Returns false when nothing matched.
pub fn remove_by_name(name: &str, root: &mut Component) -> bool {
    take_by_name(name, root).is_some()
}

/// Like [`remove_by_name`], handing back the detached subtree.
pub fn take_by_name(name: &str, root: &mut Component) -> Option<Component> {
    for i in 0..root.children.len() {
        if root.children[i].name == name {
            return Some(root.children.remove(i));
        }
        if let Some(taken) = take_by_name(name, &mut root.children[i]) {
            return Some(taken);
        }
    }
    None
}

/// All names in pre-order.
pub fn names(root: &Component) -> Vec<&str> {
    let mut out = Vec::new();
    collect_names(root, &mut out);
    out
}

fn collect_names<'a>(node: &'a Component, out: &mut Vec<&'a str>) {
    out.push(node.name.as_str());
    for child in &node.children {
        collect_names(child, out);
    }
}

pub fn count(root: &Component) -> usize {
    1 + root.children.iter().map(count).sum::<usize>()
}

/// Number of edges between the root and `name`.
pub fn depth_of(name: &str, root: &Component) -> Option<usize> {
    if root.name == name {
        return Some(0);
    }
    for child in &root.children {
        if let Some(d) = depth_of(name, child) {
            return Some(d + 1);
        }
    }
    None
}

/// Indented outline, one node per line.
pub fn render_tree(root: &Component) -> String {
    let mut out = String::new();
    render_into(root, 0, &mut out);
    out
}

fn render_into(node: &Component, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let [x, y, z] = node.attachment_point;
    match node.axis_identifier() {
        Some(id) => out.push_str(&format!(
            "{}{} [{}] axis={} at ({}, {}, {})\n",
            indent,
            node.name,
            node.kind_tag(),
            id,
            x,
            y,
            z
        )),
        None => out.push_str(&format!(
            "{}{} [{}] at ({}, {}, {})\n",
            indent,
            node.name,
            node.kind_tag(),
            x,
            y,
            z
        )),
    }
    for child in &node.children {
        render_into(child, depth + 1, out);
    }
}
