//! Persistent scope stack used by validation and lowering.
//!
//! Nested sub-requests (predicates, mapping functions, sort and group keys)
//! are evaluated with their enclosing rows in scope. Pushing returns a new
//! stack sharing every existing frame, so sibling sub-requests never observe
//! each other's extensions.

use std::fmt;
use std::rc::Rc;

use crate::query::Select;
use crate::types::Type;

struct Frame<T> {
    value: T,
    parent: Option<Rc<Frame<T>>>,
}

/// Append-only stack of scope entries; index 0 is the outermost entry.
pub struct ScopeStack<T> {
    top: Option<Rc<Frame<T>>>,
    len: usize,
}

impl<T> ScopeStack<T> {
    /// Empty stack.
    pub fn new() -> Self {
        Self { top: None, len: 0 }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when no scope is open.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// New stack with `value` as its innermost entry; `self` is unchanged.
    #[must_use]
    pub fn push(&self, value: T) -> Self {
        Self {
            top: Some(Rc::new(Frame {
                value,
                parent: self.top.clone(),
            })),
            len: self.len + 1,
        }
    }

    /// Entry at `index`, counted from the outermost entry.
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.iter().nth(self.len - 1 - index)
    }

    /// Innermost entry.
    pub fn innermost(&self) -> Option<&T> {
        self.top.as_deref().map(|frame| &frame.value)
    }

    /// Entry selected by a context depth; see [`resolve_index`].
    pub fn resolve(&self, depth: i32) -> Option<&T> {
        resolve_index(self.len, depth).and_then(|index| self.get(index))
    }

    /// Entries from innermost to outermost.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let mut cursor = self.top.as_deref();
        std::iter::from_fn(move || {
            let frame = cursor?;
            cursor = frame.parent.as_deref();
            Some(&frame.value)
        })
    }
}

/// Maps a context depth onto a stack index counted from the outermost entry.
///
/// The index is `depth - 1`; non-positive results wrap around from the
/// innermost end, so `0` selects the innermost entry and `-1` its parent.
/// Returns `None` when the selected entry does not exist.
pub fn resolve_index(len: usize, depth: i32) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let mut index = i64::from(depth) - 1;
    if index < 0 {
        index += len;
    }
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

impl<T> Default for ScopeStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for ScopeStack<T> {
    fn clone(&self) -> Self {
        Self {
            top: self.top.clone(),
            len: self.len,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ScopeStack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<&T> = self.iter().collect();
        entries.reverse();
        f.debug_list().entries(entries).finish()
    }
}

/// A scope opened by the lowerer: the relational query producing the
/// enclosing rows and the static type of one such row.
#[derive(Clone, Debug)]
pub struct Context {
    /// Query whose columns the nested request may reference.
    pub query: Select,
    /// Type of the value in scope.
    pub ty: Type,
}
