//! Table-dependency extraction.
//!
//! Every stored-items occurrence in a request gets its own alias, even when
//! the same relation appears twice (self-joins). The mapping from node to
//! alias is a side table keyed by node identity; request nodes are never
//! annotated.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::ptr;

use tracing::trace;

use crate::catalog::Catalog;
use crate::query::{NameGenerator, TableAlias};
use crate::request::Request;

use super::errors::{InvalidRequest, Reason};

/// Identity of a node within a borrowed request tree.
#[derive(Clone, Copy, Debug)]
struct NodeKey<'r>(&'r Request);

impl PartialEq for NodeKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.0, other.0)
    }
}

impl Eq for NodeKey<'_> {}

impl Hash for NodeKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ptr::hash(self.0, state);
    }
}

/// Aliases allocated for one compile, in extraction order.
#[derive(Clone, Debug)]
pub struct TableSet<'r> {
    aliases: Vec<TableAlias>,
    by_node: HashMap<NodeKey<'r>, usize>,
    names: NameGenerator,
}

impl<'r> TableSet<'r> {
    /// Aliases in extraction order.
    pub fn aliases(&self) -> &[TableAlias] {
        &self.aliases
    }

    /// Alias allocated for a stored-items node of the extracted tree.
    pub fn alias_for(&self, node: &'r Request) -> Option<&TableAlias> {
        self.by_node
            .get(&NodeKey(node))
            .and_then(|&index| self.aliases.get(index))
    }

    /// Number of aliases.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Returns `true` when the request touches no relation.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Name generator positioned after the allocated aliases, so later names
    /// never collide with them.
    pub fn names(&self) -> &NameGenerator {
        &self.names
    }
}

/// Collects the base relations `request` touches, allocating one fresh alias
/// per stored-items occurrence. Children are visited subject first, then the
/// remaining operands in order; dict fields in sorted key order.
pub fn extract_tables<'r>(
    request: &'r Request,
    catalog: &dyn Catalog,
    names: NameGenerator,
) -> Result<TableSet<'r>, InvalidRequest> {
    let mut set = TableSet {
        aliases: Vec::new(),
        by_node: HashMap::new(),
        names,
    };
    collect(request, catalog, &mut set)?;
    Ok(set)
}

fn collect<'r>(
    node: &'r Request,
    catalog: &dyn Catalog,
    set: &mut TableSet<'r>,
) -> Result<(), InvalidRequest> {
    if let Request::StoredItems { table } = node {
        let def = catalog.table(table).ok_or_else(|| {
            InvalidRequest::new(
                node,
                Reason::UnknownTable {
                    table: table.clone(),
                },
            )
        })?;
        let alias = TableAlias::new(def, set.names.fresh(table));
        trace!(table = %table, alias = alias.name(), "compile.tables.alias");
        set.by_node.insert(NodeKey(node), set.aliases.len());
        set.aliases.push(alias);
        return Ok(());
    }
    for child in node.children() {
        collect(child, catalog, set)?;
    }
    Ok(())
}
