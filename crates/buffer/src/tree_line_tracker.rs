// Chunk: docs/chunks/line_tracker_tree - Differential AVL line tracker

//! Line tracker backed by a differential AVL tree.
//!
//! Every line is one node, and an in-order walk visits the lines in document
//! order. Nodes do not store absolute positions. Instead each node records the
//! number of lines (`line`) and chars (`offset`) in its *left* subtree, so an
//! edit only touches the ancestors that have the edited node on their left.
//! Lookups by offset or by line descend from the root accumulating those
//! differentials, which keeps both queries and edits at O(log n).
//!
//! Nodes live in an arena and refer to each other through [`NodeId`]s.
//! Released slots are reused through a free list.
//!
//! The tree is never empty: the last line always exists, possibly with
//! length 0, and is the only node without a delimiter.

use std::cmp::Ordering;

use crate::delimiter::{DefaultDelimiterScanner, Delimiter, DelimiterMatch, DelimiterScanner};
use crate::error::{BufferError, Result};
use crate::line_tracker::{bad_location, shift, LineTracker};
use crate::types::Region;

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node {
    /// Number of lines in the left subtree.
    line: usize,
    /// Number of chars in the left subtree.
    offset: usize,
    /// Length of this line including its delimiter.
    length: usize,
    delimiter: Option<Delimiter>,
    /// Height of the right subtree minus height of the left subtree.
    balance: i8,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl Node {
    fn new(length: usize, delimiter: Option<Delimiter>) -> Self {
        Self {
            line: 0,
            offset: 0,
            length,
            delimiter,
            balance: 0,
            parent: None,
            left: None,
            right: None,
        }
    }

    /// Length without the delimiter.
    fn pure_length(&self) -> usize {
        self.length - self.delimiter.as_ref().map_or(0, Delimiter::char_len)
    }
}

/// Aggregates recomputed by [`TreeLineTracker::validate`].
struct Summary {
    lines: usize,
    chars: usize,
    height: usize,
}

/// Differential AVL tree of lines.
#[derive(Debug)]
pub struct TreeLineTracker {
    nodes: Vec<Node>,
    free: Vec<NodeId>,
    root: NodeId,
    scanner: Box<dyn DelimiterScanner>,
}

impl TreeLineTracker {
    /// Creates a tracker for the empty text using `\r`, `\n` and `\r\n`.
    pub fn new() -> Self {
        Self::with_scanner(Box::new(DefaultDelimiterScanner::new()))
    }

    /// Creates a tracker for the empty text using `scanner` to find
    /// delimiters in inserted text.
    pub fn with_scanner(scanner: Box<dyn DelimiterScanner>) -> Self {
        Self {
            nodes: vec![Node::new(0, None)],
            free: Vec::new(),
            root: NodeId(0),
            scanner,
        }
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, length: usize, delimiter: Option<Delimiter>) -> NodeId {
        let node = Node::new(length, delimiter);
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.delimiter = None;
        node.parent = None;
        node.left = None;
        node.right = None;
        self.free.push(id);
    }

    /// Finds the line containing `offset`; returns the node, its line number
    /// and the offset of its first char.
    fn node_by_offset(&self, offset: usize) -> Option<(NodeId, usize, usize)> {
        let mut remaining = offset;
        let mut line = 0;
        let mut current = Some(self.root);
        while let Some(id) = current {
            let node = self.node(id);
            if remaining < node.offset {
                current = node.left;
                continue;
            }
            remaining -= node.offset;
            line += node.line;
            // The end of the text belongs to the last line.
            if remaining < node.length || (remaining == node.length && node.right.is_none()) {
                return Some((id, line, offset - remaining));
            }
            remaining -= node.length;
            line += 1;
            current = node.right;
        }
        None
    }

    /// Finds `line`; returns the node and the offset of its first char.
    fn node_by_line(&self, line: usize) -> Option<(NodeId, usize)> {
        let mut remaining = line;
        let mut offset = 0;
        let mut current = Some(self.root);
        while let Some(id) = current {
            let node = self.node(id);
            match remaining.cmp(&node.line) {
                Ordering::Equal => return Some((id, offset + node.offset)),
                Ordering::Less => current = node.left,
                Ordering::Greater => {
                    remaining -= node.line + 1;
                    offset += node.offset + node.length;
                    current = node.right;
                }
            }
        }
        None
    }

    fn line_node(&self, line: usize) -> Result<(NodeId, usize)> {
        self.node_by_line(line).ok_or_else(|| BufferError::BadLine {
            line,
            lines: self.number_of_lines(),
        })
    }

    fn offset_node(&self, offset: usize) -> Result<(NodeId, usize, usize)> {
        self.node_by_offset(offset)
            .ok_or_else(|| bad_location(offset, 0, self.len()))
    }

    fn delimiters_in(&self, text: &[char]) -> Vec<DelimiterMatch> {
        let mut found = Vec::new();
        let mut from = 0;
        while let Some(delimiter) = self.scanner.next_delimiter(text, from) {
            from = delimiter.end();
            found.push(delimiter);
        }
        found
    }

    /// Replacement confined to one line: `first_line_delta` is the number of
    /// chars from the edit offset to the end of `node`.
    fn replace_internal(
        &mut self,
        node: NodeId,
        text_len: usize,
        delimiters: &[DelimiterMatch],
        length: usize,
        first_line_delta: usize,
    ) {
        let Some((first, rest)) = delimiters.split_first() else {
            self.update_length(node, text_len as isize - length as isize);
            return;
        };

        // What follows the replaced range moves to the last inserted line.
        let remainder = first_line_delta - length;
        let remainder_delimiter = self.node(node).delimiter.clone();

        let mut consumed = first.end();
        self.update_length(node, consumed as isize - first_line_delta as isize);
        self.node_mut(node).delimiter = Some(first.delimiter.clone());

        let mut node = node;
        for found in rest {
            node = self.insert_after(node, found.end() - consumed, Some(found.delimiter.clone()));
            consumed = found.end();
        }
        self.insert_after(node, remainder + text_len - consumed, remainder_delimiter);
    }

    /// Replacement spanning `node` through `last`.
    fn replace_from_to(
        &mut self,
        node: NodeId,
        last: NodeId,
        text_len: usize,
        delimiters: &[DelimiterMatch],
        length: usize,
        first_line_remainder: usize,
    ) {
        let mut length = length;

        // Lines strictly between the two ends disappear.
        let mut current = self.successor(node);
        while let Some(id) = current.filter(|&id| id != last) {
            let line_length = self.node(id).length;
            length -= line_length;
            current = self.successor(id);
            self.update_length(id, -(line_length as isize));
        }

        let Some((first, rest)) = delimiters.split_first() else {
            self.join(node, last, text_len as isize - length as isize);
            return;
        };

        let mut consumed = first.end();
        self.update_length(node, consumed as isize - first_line_remainder as isize);
        self.node_mut(node).delimiter = Some(first.delimiter.clone());
        length -= first_line_remainder;

        let mut node = node;
        for found in rest {
            node = self.insert_after(node, found.end() - consumed, Some(found.delimiter.clone()));
            consumed = found.end();
        }
        self.update_length(last, text_len as isize - consumed as isize - length as isize);
    }

    /// Merges `one` into its successor `two`, adding `delta` chars.
    fn join(&mut self, one: NodeId, two: NodeId, delta: isize) {
        let one_length = self.node(one).length as isize;
        self.update_length(one, -one_length);
        self.update_length(two, one_length + delta);
    }

    /// Changes the length of `id` by `delta`. A delimited line that drops to
    /// length 0 is removed from the tree.
    fn update_length(&mut self, id: NodeId, delta: isize) {
        let node = self.node_mut(id);
        node.length = shift(node.length, delta);
        let delete = node.length == 0 && node.delimiter.is_some();
        let line_delta = if delete { -1 } else { 0 };
        if delta != 0 || line_delta != 0 {
            self.update_parent_chain(id, None, delta, line_delta);
        }
        if delete {
            self.delete(id);
        }
    }

    /// Adds the deltas to every ancestor of `from` below `to` that has the
    /// changed node in its left subtree.
    fn update_parent_chain(
        &mut self,
        from: NodeId,
        to: Option<NodeId>,
        delta_length: isize,
        delta_lines: isize,
    ) {
        let mut from = from;
        let mut parent = self.node(from).parent;
        while parent != to {
            let Some(id) = parent else { break };
            let node = self.node_mut(id);
            if node.left == Some(from) {
                node.offset = shift(node.offset, delta_length);
                node.line = shift(node.line, delta_lines);
            }
            from = id;
            parent = node.parent;
        }
    }

    fn delete(&mut self, id: NodeId) {
        tracing::trace!(node = id.0, "deleting line node");
        let (parent, left, right, line, offset, balance) = {
            let node = self.node(id);
            (node.parent, node.left, node.right, node.line, node.offset, node.balance)
        };
        let is_left = parent.map_or(true, |p| self.node(p).left == Some(id));

        // The node that lost a child, and on which side.
        let (to_update, lost_left) = match (left, right) {
            (None, only) | (only, None) => {
                self.set_child(parent, only, is_left);
                (parent, is_left)
            }
            (Some(left), Some(right)) if self.node(right).left.is_none() => {
                // The right child takes over the left subtree.
                self.set_child(parent, Some(right), is_left);
                self.set_child(Some(right), Some(left), true);
                let replacement = self.node_mut(right);
                replacement.line = line;
                replacement.offset = offset;
                replacement.balance = balance;
                (Some(right), false)
            }
            (Some(left), Some(right)) => {
                // The in-order successor is a left child deeper in the right
                // subtree, and has no left child of its own.
                let successor = self.successor_down(right);
                let successor_parent = self.node(successor).parent;
                let successor_length = self.node(successor).length as isize;
                self.update_parent_chain(successor, Some(id), -successor_length, -1);

                let successor_right = self.node(successor).right;
                self.set_child(successor_parent, successor_right, true);
                self.set_child(Some(successor), Some(right), false);
                self.set_child(Some(successor), Some(left), true);
                self.set_child(parent, Some(successor), is_left);

                let replacement = self.node_mut(successor);
                replacement.line = line;
                replacement.offset = offset;
                replacement.balance = balance;
                (successor_parent, true)
            }
        };

        self.release(id);
        self.update_parent_balance_after_deletion(to_update, lost_left);
    }

    /// Links `child` under `parent`. A `None` parent makes `child` the root;
    /// if both are `None` the tree restarts from an empty last line.
    fn set_child(&mut self, parent: Option<NodeId>, child: Option<NodeId>, is_left: bool) {
        match (parent, child) {
            (None, None) => self.root = self.alloc(0, None),
            (None, Some(child)) => self.root = child,
            (Some(parent), child) => {
                let node = self.node_mut(parent);
                if is_left {
                    node.left = child;
                } else {
                    node.right = child;
                }
            }
        }
        if let Some(child) = child {
            self.node_mut(child).parent = parent;
        }
    }

    /// Inserts a new line right after `id` and returns it.
    fn insert_after(&mut self, id: NodeId, length: usize, delimiter: Option<Delimiter>) -> NodeId {
        // The new node sits between `id` and its successor: either as the
        // right child of `id` or as the left child of the successor.
        let added = self.alloc(length, delimiter);
        match self.node(id).right {
            None => self.set_child(Some(id), Some(added), false),
            Some(right) => {
                let successor = self.successor_down(right);
                self.set_child(Some(successor), Some(added), true);
            }
        }
        self.update_parent_chain(added, None, length as isize, 1);
        self.update_parent_balance_after_insertion(added);
        added
    }

    fn successor(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id).right {
            Some(right) => Some(self.successor_down(right)),
            None => self.successor_up(id),
        }
    }

    fn successor_up(&self, id: NodeId) -> Option<NodeId> {
        let mut child = id;
        let mut parent = self.node(child).parent;
        while let Some(id) = parent {
            if self.node(id).left == Some(child) {
                return Some(id);
            }
            child = id;
            parent = self.node(id).parent;
        }
        None
    }

    /// Leftmost node of the subtree rooted at `id`.
    fn successor_down(&self, id: NodeId) -> NodeId {
        let mut id = id;
        while let Some(left) = self.node(id).left {
            id = left;
        }
        id
    }

    fn update_parent_balance_after_insertion(&mut self, id: NodeId) {
        let mut node = id;
        let mut parent = self.node(node).parent;
        while let Some(p) = parent {
            let balance = {
                let parent_node = self.node_mut(p);
                if parent_node.left == Some(node) {
                    parent_node.balance -= 1;
                } else {
                    parent_node.balance += 1;
                }
                parent_node.balance
            };
            match balance {
                1 | -1 => {
                    node = p;
                    parent = self.node(p).parent;
                }
                -2 => {
                    self.rebalance_after_insertion_left(node);
                    return;
                }
                2 => {
                    self.rebalance_after_insertion_right(node);
                    return;
                }
                _ => return,
            }
        }
    }

    fn rebalance_after_insertion_right(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).parent else { return };
        match self.node(node).balance {
            1 => self.single_left_rotation(node, parent),
            -1 => self.right_left_rotation(node, parent),
            _ => debug_assert!(false, "unbalanced insertion"),
        }
    }

    fn rebalance_after_insertion_left(&mut self, node: NodeId) {
        let Some(parent) = self.node(node).parent else { return };
        match self.node(node).balance {
            -1 => self.single_right_rotation(node, parent),
            1 => self.left_right_rotation(node, parent),
            _ => debug_assert!(false, "unbalanced insertion"),
        }
    }

    fn update_parent_balance_after_deletion(&mut self, node: Option<NodeId>, was_left: bool) {
        let mut current = node;
        let mut was_left = was_left;
        while let Some(id) = current {
            let (balance, parent) = {
                let node = self.node_mut(id);
                if was_left {
                    node.balance += 1;
                } else {
                    node.balance -= 1;
                }
                (node.balance, node.parent)
            };
            if let Some(p) = parent {
                was_left = self.node(p).left == Some(id);
            }

            match balance {
                // Height unchanged.
                1 | -1 => return,
                -2 => {
                    if let Some(left) = self.node(id).left {
                        if self.rebalance_left_heavy(left) {
                            return;
                        }
                    }
                }
                2 => {
                    if let Some(right) = self.node(id).right {
                        if self.rebalance_right_heavy(right) {
                            return;
                        }
                    }
                }
                _ => {}
            }
            current = parent;
        }
    }

    /// Rotates the right-heavy parent of `node` after a deletion. Returns true
    /// if the subtree kept its height.
    fn rebalance_right_heavy(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.node(node).parent else { return true };
        match self.node(node).balance {
            1 => {
                self.single_left_rotation(node, parent);
                false
            }
            -1 => {
                self.right_left_rotation(node, parent);
                false
            }
            _ => {
                self.rotate_left(parent);
                self.node_mut(node).balance = -1;
                self.node_mut(parent).balance = 1;
                true
            }
        }
    }

    /// Mirror of [`Self::rebalance_right_heavy`].
    fn rebalance_left_heavy(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.node(node).parent else { return true };
        match self.node(node).balance {
            -1 => {
                self.single_right_rotation(node, parent);
                false
            }
            1 => {
                self.left_right_rotation(node, parent);
                false
            }
            _ => {
                self.rotate_right(parent);
                self.node_mut(node).balance = 1;
                self.node_mut(parent).balance = -1;
                true
            }
        }
    }

    fn single_left_rotation(&mut self, node: NodeId, parent: NodeId) {
        self.rotate_left(parent);
        self.node_mut(node).balance = 0;
        self.node_mut(parent).balance = 0;
    }

    fn single_right_rotation(&mut self, node: NodeId, parent: NodeId) {
        self.rotate_right(parent);
        self.node_mut(node).balance = 0;
        self.node_mut(parent).balance = 0;
    }

    fn right_left_rotation(&mut self, node: NodeId, parent: NodeId) {
        let Some(child) = self.node(node).left else { return };
        self.rotate_right(node);
        self.rotate_left(parent);
        let (node_balance, parent_balance) = match self.node(child).balance {
            1 => (0, -1),
            -1 => (1, 0),
            _ => (0, 0),
        };
        self.node_mut(node).balance = node_balance;
        self.node_mut(parent).balance = parent_balance;
        self.node_mut(child).balance = 0;
    }

    fn left_right_rotation(&mut self, node: NodeId, parent: NodeId) {
        let Some(child) = self.node(node).right else { return };
        self.rotate_left(node);
        self.rotate_right(parent);
        let (node_balance, parent_balance) = match self.node(child).balance {
            -1 => (0, 1),
            1 => (-1, 0),
            _ => (0, 0),
        };
        self.node_mut(node).balance = node_balance;
        self.node_mut(parent).balance = parent_balance;
        self.node_mut(child).balance = 0;
    }

    fn rotate_left(&mut self, id: NodeId) {
        let Some(child) = self.node(id).right else { return };
        let parent = self.node(id).parent;
        let is_left = parent.map_or(true, |p| self.node(p).left == Some(id));

        self.set_child(parent, Some(child), is_left);
        let child_left = self.node(child).left;
        self.set_child(Some(id), child_left, false);
        self.set_child(Some(child), Some(id), true);

        // `id` and its left subtree now hang off the left of `child`.
        let (line, offset, length) = {
            let node = self.node(id);
            (node.line, node.offset, node.length)
        };
        let child = self.node_mut(child);
        child.line += line + 1;
        child.offset += offset + length;
    }

    fn rotate_right(&mut self, id: NodeId) {
        let Some(child) = self.node(id).left else { return };
        let parent = self.node(id).parent;
        let is_left = parent.map_or(true, |p| self.node(p).left == Some(id));

        self.set_child(parent, Some(child), is_left);
        let child_right = self.node(child).right;
        self.set_child(Some(id), child_right, true);
        self.set_child(Some(child), Some(id), false);

        // `id` keeps only what was right of `child`.
        let (line, offset, length) = {
            let node = self.node(child);
            (node.line, node.offset, node.length)
        };
        let node = self.node_mut(id);
        node.line -= line + 1;
        node.offset -= offset + length;
    }

    /// Checks every structural invariant of the tree: parent links, the
    /// left-subtree differentials, AVL balance factors, that only the last
    /// line lacks a delimiter, and that no arena slot leaked.
    pub fn validate(&self) -> Result<()> {
        if self.node(self.root).parent.is_some() {
            return Err(BufferError::InvariantViolation(
                "root has a parent".to_string(),
            ));
        }
        self.validate_subtree(self.root, None)?;

        let mut visited = 0;
        let mut current = Some(self.successor_down(self.root));
        while let Some(id) = current {
            visited += 1;
            let node = self.node(id);
            let next = self.successor(id);
            match (&node.delimiter, next) {
                (None, Some(_)) => {
                    return Err(BufferError::InvariantViolation(format!(
                        "line {} has no delimiter but is not the last line",
                        visited - 1
                    )));
                }
                (Some(delimiter), None) => {
                    return Err(BufferError::InvariantViolation(format!(
                        "last line ends with delimiter {delimiter:?}"
                    )));
                }
                (Some(delimiter), Some(_)) if node.length < delimiter.char_len() => {
                    return Err(BufferError::InvariantViolation(format!(
                        "line {} is shorter than its delimiter",
                        visited - 1
                    )));
                }
                _ => {}
            }
            current = next;
        }

        let live = self.nodes.len() - self.free.len();
        if visited != live {
            return Err(BufferError::InvariantViolation(format!(
                "{live} live nodes but {visited} reachable"
            )));
        }
        Ok(())
    }

    fn validate_subtree(&self, id: NodeId, parent: Option<NodeId>) -> Result<Summary> {
        let node = self.node(id);
        if node.parent != parent {
            return Err(BufferError::InvariantViolation(format!(
                "node {} has a stale parent link",
                id.0
            )));
        }
        let left = match node.left {
            Some(left) => self.validate_subtree(left, Some(id))?,
            None => Summary {
                lines: 0,
                chars: 0,
                height: 0,
            },
        };
        let right = match node.right {
            Some(right) => self.validate_subtree(right, Some(id))?,
            None => Summary {
                lines: 0,
                chars: 0,
                height: 0,
            },
        };

        if node.line != left.lines || node.offset != left.chars {
            return Err(BufferError::InvariantViolation(format!(
                "node {} records {} lines and {} chars on its left, found {} and {}",
                id.0, node.line, node.offset, left.lines, left.chars
            )));
        }
        let balance = right.height as isize - left.height as isize;
        if balance != isize::from(node.balance) || balance.abs() > 1 {
            return Err(BufferError::InvariantViolation(format!(
                "node {} has balance {} but subtree heights differ by {balance}",
                id.0, node.balance
            )));
        }

        Ok(Summary {
            lines: left.lines + right.lines + 1,
            chars: left.chars + right.chars + node.length,
            height: left.height.max(right.height) + 1,
        })
    }

    #[cfg(test)]
    fn height(&self) -> usize {
        self.validate_subtree(self.root, None)
            .map_or(0, |summary| summary.height)
    }
}

impl Default for TreeLineTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LineTracker for TreeLineTracker {
    fn scanner(&self) -> &dyn DelimiterScanner {
        self.scanner.as_ref()
    }

    fn len(&self) -> usize {
        let mut len = 0;
        let mut current = Some(self.root);
        while let Some(id) = current {
            let node = self.node(id);
            len += node.offset + node.length;
            current = node.right;
        }
        len
    }

    fn number_of_lines(&self) -> usize {
        let mut lines = 0;
        let mut current = Some(self.root);
        while let Some(id) = current {
            let node = self.node(id);
            lines += node.line + 1;
            current = node.right;
        }
        lines
    }

    fn line_number_of_offset(&self, offset: usize) -> Result<usize> {
        self.offset_node(offset).map(|(_, line, _)| line)
    }

    fn line_information_of_offset(&self, offset: usize) -> Result<Region> {
        let (id, _, start) = self.offset_node(offset)?;
        Ok(Region::new(start, self.node(id).pure_length()))
    }

    fn line_offset(&self, line: usize) -> Result<usize> {
        self.line_node(line).map(|(_, offset)| offset)
    }

    fn line_length(&self, line: usize) -> Result<usize> {
        let (id, _) = self.line_node(line)?;
        Ok(self.node(id).length)
    }

    fn line_delimiter(&self, line: usize) -> Result<Option<Delimiter>> {
        let (id, _) = self.line_node(line)?;
        Ok(self.node(id).delimiter.clone())
    }

    fn line_information(&self, line: usize) -> Result<Region> {
        let (id, offset) = self.line_node(line)?;
        Ok(Region::new(offset, self.node(id).pure_length()))
    }

    fn replace(&mut self, offset: usize, length: usize, text: &str) -> Result<()> {
        let len = self.len();
        if offset.checked_add(length).map_or(true, |end| end > len) {
            return Err(bad_location(offset, length, len));
        }
        let (first, _, first_start) = self.offset_node(offset)?;
        let first_length = self.node(first).length;
        let last = if offset + length < first_start + first_length {
            first
        } else {
            self.offset_node(offset + length)?.0
        };

        let text: Vec<char> = text.chars().collect();
        let delimiters = self.delimiters_in(&text);
        let first_line_delta = first_start + first_length - offset;
        if first == last {
            self.replace_internal(first, text.len(), &delimiters, length, first_line_delta);
        } else {
            self.replace_from_to(first, last, text.len(), &delimiters, length, first_line_delta);
        }
        Ok(())
    }

    fn set(&mut self, text: &str) {
        self.nodes.clear();
        self.free.clear();
        self.nodes.push(Node::new(0, None));
        self.root = NodeId(0);

        let text: Vec<char> = text.chars().collect();
        let delimiters = self.delimiters_in(&text);
        self.replace_internal(self.root, text.len(), &delimiters, 0, 0);
    }
}
