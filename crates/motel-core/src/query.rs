//! # Query Module
//!
//! Typed motif queries and the join executor that runs them.
//!
//! A motif compiles into a [`MotifQuery`]: one [`Selection`] per motif vertex
//! and per motif edge, plus the column to project. Columns are motif-local
//! vertex identifiers. The result is the natural join of every selection,
//! projected onto the selector column and deduplicated.
//!
//! Execution is decoupled from compilation through [`QueryExecutor`]; the
//! provided [`JoinExecutor`] evaluates a query against any [`GraphStore`].

use crate::graph::GraphStore;
use crate::motif::Predicate;
use crate::{MotelError, VertexId};
use std::collections::{BTreeMap, BTreeSet};

/// A motif-local vertex identifier naming a relation column.
pub type Column = u64;

// =============================================================================
// QUERY TYPES
// =============================================================================

/// One sub-selection of a motif query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Store vertices satisfying every predicate, bound to `column`.
    ///
    /// An empty predicate list is an unrestricted scan.
    Vertices {
        column: Column,
        predicates: Vec<Predicate>,
    },

    /// Store edges with exactly `label`, projecting their endpoints onto the
    /// `source` and `destination` columns.
    Edges {
        label: String,
        source: Column,
        destination: Column,
    },
}

impl Selection {
    /// Columns this selection binds, in order, without repetition.
    #[must_use]
    pub fn columns(&self) -> Vec<Column> {
        match self {
            Self::Vertices { column, .. } => vec![*column],
            Self::Edges {
                source,
                destination,
                ..
            } if source == destination => vec![*source],
            Self::Edges {
                source,
                destination,
                ..
            } => vec![*source, *destination],
        }
    }
}

/// A compiled motif: selections joined on shared columns, projected onto one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotifQuery {
    /// Sub-selections to join.
    pub selections: Vec<Selection>,
    /// Column returned by the query.
    pub projection: Column,
}

impl MotifQuery {
    /// Create a new query.
    #[must_use]
    pub fn new(selections: Vec<Selection>, projection: Column) -> Self {
        Self {
            selections,
            projection,
        }
    }

    /// Check that the projection is bound by some selection.
    pub fn validate(&self) -> Result<(), MotelError> {
        let bound = self
            .selections
            .iter()
            .any(|selection| selection.columns().contains(&self.projection));
        if bound {
            Ok(())
        } else {
            Err(MotelError::InvalidMotif(format!(
                "projected column {} is not bound by any selection",
                self.projection
            )))
        }
    }
}

// =============================================================================
// RELATIONS
// =============================================================================

/// A set of rows over named columns.
///
/// Rows are kept as a set: duplicates never change a projected result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    columns: Vec<Column>,
    rows: BTreeSet<Vec<VertexId>>,
}

impl Relation {
    fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: BTreeSet::new(),
        }
    }

    /// Column names in row order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of distinct rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the relation has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn position(&self, column: Column) -> Option<usize> {
        self.columns.iter().position(|&c| c == column)
    }

    /// Natural join: rows agreeing on every shared column are combined.
    ///
    /// Without shared columns this is the cartesian product.
    #[must_use]
    pub fn natural_join(&self, other: &Relation) -> Relation {
        let shared: Vec<(usize, usize)> = self
            .columns
            .iter()
            .enumerate()
            .filter_map(|(i, &c)| other.position(c).map(|j| (i, j)))
            .collect();
        let extra: Vec<usize> = (0..other.columns.len())
            .filter(|j| !shared.iter().any(|(_, s)| s == j))
            .collect();

        let mut columns = self.columns.clone();
        columns.extend(extra.iter().map(|&j| other.columns[j]));
        let mut joined = Relation::new(columns);

        // Hash the right side on the shared key.
        let mut index: BTreeMap<Vec<VertexId>, Vec<&Vec<VertexId>>> = BTreeMap::new();
        for row in &other.rows {
            let key = shared.iter().map(|&(_, j)| row[j]).collect();
            index.entry(key).or_default().push(row);
        }

        for left in &self.rows {
            let key: Vec<VertexId> = shared.iter().map(|&(i, _)| left[i]).collect();
            let Some(matches) = index.get(&key) else {
                continue;
            };
            for right in matches {
                let mut row = left.clone();
                row.extend(extra.iter().map(|&j| right[j]));
                joined.rows.insert(row);
            }
        }

        joined
    }

    /// Distinct values of one column.
    #[must_use]
    pub fn project(&self, column: Column) -> BTreeSet<VertexId> {
        match self.position(column) {
            Some(i) => self.rows.iter().map(|row| row[i]).collect(),
            None => BTreeSet::new(),
        }
    }
}

// =============================================================================
// EXECUTION
// =============================================================================

/// Backend capable of answering a motif query.
pub trait QueryExecutor {
    /// Run the query, returning the distinct store ids bound to the
    /// projected column.
    fn execute(&self, query: &MotifQuery) -> Result<BTreeSet<VertexId>, MotelError>;
}

/// Evaluates queries by materializing each selection and hash-joining.
///
/// Join order is greedy: start from the smallest relation, then repeatedly
/// take the smallest remaining relation that shares a column with the
/// accumulated result.
#[derive(Debug)]
pub struct JoinExecutor<'s, S: GraphStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: GraphStore + ?Sized> JoinExecutor<'s, S> {
    /// Bind an executor to a store.
    #[must_use]
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Materialize a single selection.
    pub fn materialize(&self, selection: &Selection) -> Result<Relation, MotelError> {
        let mut relation = Relation::new(selection.columns());
        match selection {
            Selection::Vertices { predicates, .. } => {
                let mut candidates: Option<BTreeSet<VertexId>> = None;
                for predicate in predicates {
                    let selected = self
                        .store
                        .select_vertices(&predicate.kind, &predicate.value)?;
                    candidates = Some(match candidates {
                        Some(current) => current.intersection(&selected).copied().collect(),
                        None => selected,
                    });
                }
                let ids: Vec<VertexId> = match candidates {
                    Some(ids) => ids.into_iter().collect(),
                    None => self.store.vertex_ids()?,
                };
                relation.rows.extend(ids.into_iter().map(|id| vec![id]));
            }
            Selection::Edges {
                label,
                source,
                destination,
            } => {
                let self_loop = source == destination;
                for edge in self.store.select_edges(label)? {
                    if self_loop {
                        if edge.source == edge.destination {
                            relation.rows.insert(vec![edge.source]);
                        }
                    } else {
                        relation.rows.insert(vec![edge.source, edge.destination]);
                    }
                }
            }
        }
        Ok(relation)
    }
}

impl<S: GraphStore + ?Sized> QueryExecutor for JoinExecutor<'_, S> {
    fn execute(&self, query: &MotifQuery) -> Result<BTreeSet<VertexId>, MotelError> {
        query.validate()?;

        let mut pending = query
            .selections
            .iter()
            .map(|selection| self.materialize(selection))
            .collect::<Result<Vec<_>, _>>()?;

        let Some(first) = pending
            .iter()
            .enumerate()
            .min_by_key(|(_, relation)| relation.len())
            .map(|(i, _)| i)
        else {
            return Ok(BTreeSet::new());
        };
        let mut result = pending.swap_remove(first);

        while !pending.is_empty() {
            if result.is_empty() {
                return Ok(BTreeSet::new());
            }

            let connected = |relation: &Relation| {
                relation
                    .columns()
                    .iter()
                    .any(|c| result.position(*c).is_some())
            };
            let next = pending
                .iter()
                .enumerate()
                .min_by_key(|(_, relation)| (!connected(relation), relation.len()))
                .map(|(i, _)| i)
                .unwrap_or(0);

            let relation = pending.swap_remove(next);
            result = result.natural_join(&relation);
        }

        Ok(result.project(query.projection))
    }
}

// =============================================================================
// TESTS
// =============================================================================
