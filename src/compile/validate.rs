//! Type-directed validation of requests.
//!
//! The validator walks the request once, fail-fast, carrying a stack of the
//! element types in scope. Anything it accepts can be lowered without
//! resolving a scope or alias that does not exist.

use crate::catalog::Catalog;
use crate::config::CompileOptions;
use crate::request::{return_type, Request, Value};
use crate::types::Type;

use super::errors::{InvalidRequest, Reason};
use super::regex::translate;
use super::scope::ScopeStack;

/// Validates `request` evaluated at the top level.
pub fn validate(
    request: &Request,
    catalog: &dyn Catalog,
    options: &CompileOptions,
) -> Result<(), InvalidRequest> {
    let mut validator = Validator {
        catalog,
        options,
        nodes: 0,
    };
    validator.visit(request, &ScopeStack::new(), 1)
}

struct Validator<'a> {
    catalog: &'a dyn Catalog,
    options: &'a CompileOptions,
    nodes: usize,
}

impl Validator<'_> {
    fn visit(
        &mut self,
        node: &Request,
        scopes: &ScopeStack<Type>,
        depth: usize,
    ) -> Result<(), InvalidRequest> {
        self.nodes += 1;
        if self.nodes > self.options.max_nodes {
            return Err(InvalidRequest::new(
                node,
                Reason::TooLarge {
                    nodes: self.nodes,
                    max: self.options.max_nodes,
                },
            ));
        }
        if depth > self.options.max_depth {
            return Err(InvalidRequest::new(
                node,
                Reason::TooDeep {
                    max: self.options.max_depth,
                },
            ));
        }
        let next = depth + 1;

        match node {
            Request::StoredItems { table } => {
                if self.catalog.table(table).is_none() {
                    return Err(InvalidRequest::new(
                        node,
                        Reason::UnknownTable {
                            table: table.clone(),
                        },
                    ));
                }
            }
            Request::Context { depth: selector } => {
                let too_shallow = usize::try_from(*selector)
                    .map(|wanted| scopes.len() <= wanted)
                    .unwrap_or(false);
                if too_shallow || scopes.resolve(*selector).is_none() {
                    return Err(InvalidRequest::new(
                        node,
                        Reason::InvalidScope {
                            depth: *selector,
                            available: scopes.len(),
                        },
                    ));
                }
            }
            Request::Filter {
                subject,
                predicate: inner,
            }
            | Request::Map {
                subject,
                new_value: inner,
            } => {
                self.visit(subject, scopes, next)?;
                let element = self.list_element(node, subject, scopes)?;
                self.visit(inner, &scopes.push(element), next)?;
            }
            Request::GroupBy {
                subject,
                key,
                aggregates,
            } => {
                self.visit(subject, scopes, next)?;
                let element = self.list_element(node, subject, scopes)?;
                let list = Type::list(element.clone());
                self.visit(key, &scopes.push(element), next)?;
                self.visit(aggregates, &scopes.push(list), next)?;
            }
            Request::Sort { subject, keys } => {
                self.visit(subject, scopes, next)?;
                let element = self.list_element(node, subject, scopes)?;
                let inner = scopes.push(element);
                for key in keys {
                    self.visit(&key.key, &inner, next)?;
                }
            }
            Request::Dict { fields } => {
                for (name, field) in fields {
                    self.visit(field, scopes, next)?;
                    if self.infer(field, scopes).is_list() {
                        return Err(InvalidRequest::new(
                            node,
                            Reason::ListInRecord {
                                field: name.clone(),
                            },
                        ));
                    }
                }
            }
            Request::Slice { subject, range } => {
                self.visit(subject, scopes, next)?;
                self.list_element(node, subject, scopes)?;
                if let Some(step) = range.step {
                    return Err(InvalidRequest::new(node, Reason::SliceStep { step }));
                }
                for index in [range.start, range.stop].into_iter().flatten() {
                    if index < 0 {
                        return Err(InvalidRequest::new(node, Reason::NegativeSlice { index }));
                    }
                }
            }
            Request::One { subject } => {
                if !scopes.is_empty() {
                    return Err(InvalidRequest::new(node, Reason::NestedOne));
                }
                self.visit(subject, scopes, next)?;
            }
            Request::Aggregate { subject, .. } => {
                self.visit(subject, scopes, next)?;
                self.list_element(node, subject, scopes)?;
            }
            Request::Binary { subject, other, .. } => {
                self.visit(subject, scopes, next)?;
                self.visit(other, scopes, next)?;
            }
            Request::Unary { subject, .. } => self.visit(subject, scopes, next)?,
            Request::Regex { subject, pattern } => {
                self.visit(subject, scopes, next)?;
                self.visit(pattern, scopes, next)?;
                let Some(text) = pattern.as_literal().and_then(Value::as_str) else {
                    return Err(InvalidRequest::new(node, Reason::NonLiteralRegex));
                };
                translate(text).map_err(|err| InvalidRequest::new(node, err))?;
            }
            // Literals carry no type constraint of their own.
            Request::Literal { .. } => {}
            Request::Attribute { subject, name } => {
                self.visit(subject, scopes, next)?;
                let found = self.infer(subject, scopes);
                let Some(fields) = found.fields() else {
                    return Err(InvalidRequest::new(
                        node,
                        Reason::ExpectedRecord {
                            name: name.clone(),
                            found: found.clone(),
                        },
                    ));
                };
                if !fields.contains_key(name) {
                    let available = fields.keys().cloned().collect::<Vec<_>>().join(", ");
                    return Err(InvalidRequest::new(
                        node,
                        Reason::UnknownAttribute {
                            name: name.clone(),
                            available,
                        },
                    ));
                }
            }
        }
        Ok(())
    }

    fn infer(&self, node: &Request, scopes: &ScopeStack<Type>) -> Type {
        return_type(node, scopes, self.catalog)
    }

    /// Element type of `subject`, which must be a list for `node` to apply.
    fn list_element(
        &self,
        node: &Request,
        subject: &Request,
        scopes: &ScopeStack<Type>,
    ) -> Result<Type, InvalidRequest> {
        match self.infer(subject, scopes) {
            Type::List(inner) => Ok(*inner),
            found => Err(InvalidRequest::new(
                node,
                Reason::ExpectedList {
                    operation: node.kind(),
                    found,
                },
            )),
        }
    }
}
