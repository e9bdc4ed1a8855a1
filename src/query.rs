//! Query facade: the entry points callers use.
//!
//! A [`ResultQuery`] borrows a [`ResultDatabase`] and answers the five query
//! shapes for a named set in one frame. Each query
//! 1. normalizes the field and set names,
//! 2. checks that the requested shape fits the field's native location,
//! 3. resolves the set to its single instance,
//! 4. builds the field table (deriving `MISES`/`PRESS`/`INV3` when asked),
//! 5. reduces every member and assembles rows in set order.
//!
//! Per-entity failures are collected next to the rows or abort the query,
//! depending on [`FailureMode`]. Everything else aborts.

use crate::algs::invariants::{FieldSelector, derive_invariant};
use crate::algs::reduction::{
    self, ArithmeticMean, PerIpValues, ReducedValue, ReductionPolicy, sum_over_set,
};
use crate::config::{FailureMode, QueryOptions};
use crate::data::field::{FieldLocation, FrameRef};
use crate::data::field_table::FieldTable;
use crate::io::ResultDatabase;
use crate::result_error::ResultSieveError;
use crate::topology::cache::AdjacencyCache;
use crate::topology::entity::{EntityId, EntityKind};
use crate::topology::instance::Instance;
use crate::topology::sets::{ResolvedSet, resolve_set};
use std::fmt;

/// The result layouts a query can produce.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum QueryShape {
    /// Nodal field, one recorded value per node.
    NodalUnique,
    /// IP field averaged to nodes over incident elements.
    NodalAveraged,
    /// IP field, every IP value of each element.
    ElementalPerIp,
    /// IP field averaged over each element's IPs.
    ElementalAveraged,
    /// Centroid field, one value per element.
    ElementalUnique,
}

impl QueryShape {
    /// Native field location the shape reads from.
    pub const fn source_location(self) -> FieldLocation {
        match self {
            QueryShape::NodalUnique => FieldLocation::Nodal,
            QueryShape::NodalAveraged
            | QueryShape::ElementalPerIp
            | QueryShape::ElementalAveraged => FieldLocation::IntegrationPoint,
            QueryShape::ElementalUnique => FieldLocation::Centroid,
        }
    }

    /// Kind of set the shape is evaluated over.
    pub const fn set_kind(self) -> EntityKind {
        match self {
            QueryShape::NodalUnique | QueryShape::NodalAveraged => EntityKind::Node,
            QueryShape::ElementalPerIp
            | QueryShape::ElementalAveraged
            | QueryShape::ElementalUnique => EntityKind::Element,
        }
    }
}

impl fmt::Display for QueryShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QueryShape::NodalUnique => "nodal-unique",
            QueryShape::NodalAveraged => "nodal-averaged",
            QueryShape::ElementalPerIp => "elemental-per-ip",
            QueryShape::ElementalAveraged => "elemental-averaged",
            QueryShape::ElementalUnique => "elemental-unique",
        })
    }
}

/// An entity that produced no row, and why.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityFailure {
    pub id: EntityId,
    pub error: ResultSieveError,
}

/// Rows of one query, in resolved set order, plus collected failures.
#[derive(Clone, Debug, PartialEq)]
pub struct QueryOutcome<T> {
    pub field: String,
    pub frame: FrameRef,
    pub set: String,
    pub instance: String,
    pub rows: Vec<T>,
    pub failures: Vec<EntityFailure>,
}

impl<T> QueryOutcome<T> {
    /// True when every set member produced a row.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl QueryOutcome<ReducedValue> {
    /// Component-wise sum of all rows; `None` if there are none.
    pub fn sum(&self) -> Option<Vec<f64>> {
        sum_over_set(&self.rows)
    }
}

/// Outcome of a query dispatched by [`QueryShape`].
#[derive(Clone, Debug, PartialEq)]
pub enum ShapedOutcome {
    Reduced(QueryOutcome<ReducedValue>),
    PerIp(QueryOutcome<PerIpValues>),
}

impl ShapedOutcome {
    pub fn failures(&self) -> &[EntityFailure] {
        match self {
            ShapedOutcome::Reduced(o) => &o.failures,
            ShapedOutcome::PerIp(o) => &o.failures,
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            ShapedOutcome::Reduced(o) => o.rows.len(),
            ShapedOutcome::PerIp(o) => o.rows.len(),
        }
    }
}

/// One frame of a history query.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryFrame {
    pub frame: FrameRef,
    /// Step index plus frame value.
    pub run_completion: f64,
    pub outcome: ShapedOutcome,
}

/// Everything a reducer needs, after validation.
struct Prepared<'db> {
    field: String,
    instance: &'db Instance,
    set: ResolvedSet,
    table: FieldTable,
}

/// Query facade over one result database.
///
/// # Example
/// ```rust
/// # fn main() -> Result<(), result_sieve::result_error::ResultSieveError> {
/// use result_sieve::prelude::*;
/// let id = |raw| EntityId::new(raw);
/// let mut db = InMemoryDatabase::new();
/// db.add_instance(Instance::from_connectivity(
///     "PART-1-1",
///     [(id(1)?, ElementType::new("CPS3"), vec![id(1)?, id(2)?, id(3)?])],
/// )?);
/// db.add_set(EntitySet::scoped("TIP", EntityKind::Node, "PART-1-1", [id(2)?]));
/// db.add_step("Step-1", vec![1.0]);
/// let frame = FrameRef::new(0, 0);
/// db.declare_field(
///     frame,
///     FieldDescriptor::new("PEEQ", FieldType::Scalar, FieldLocation::IntegrationPoint),
/// )?
/// .add_records(frame, "PEEQ", "PART-1-1", [FieldRecord::integration_point(id(1)?, 1, [0.02])])?;
///
/// let query = ResultQuery::new(&db);
/// let out = query.query_nodal_averaged("peeq", frame, "tip")?;
/// assert_eq!(out.rows[0].values, vec![0.02]);
/// # Ok(())
/// # }
/// ```
pub struct ResultQuery<'db, D: ResultDatabase + ?Sized> {
    db: &'db D,
    options: QueryOptions,
    policy: Box<dyn ReductionPolicy>,
    adjacency: AdjacencyCache,
}

impl<'db, D: ResultDatabase + ?Sized> ResultQuery<'db, D> {
    /// Facade with default options and arithmetic-mean averaging.
    pub fn new(db: &'db D) -> Self {
        Self {
            db,
            options: QueryOptions::default(),
            policy: Box::new(ArithmeticMean),
            adjacency: AdjacencyCache::new(),
        }
    }

    pub fn with_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the averaging policy used by the averaged shapes.
    pub fn with_policy(mut self, policy: impl ReductionPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Adjacency indices built so far.
    pub fn adjacency_cache(&self) -> &AdjacencyCache {
        &self.adjacency
    }

    pub fn database(&self) -> &'db D {
        self.db
    }

    /// Nodal field values of every node of `set`, unchanged.
    pub fn query_nodal_unique(
        &self,
        field: &str,
        frame: FrameRef,
        set: &str,
    ) -> Result<QueryOutcome<ReducedValue>, ResultSieveError> {
        let prep = self.prepare(QueryShape::NodalUnique, field, frame, set)?;
        let results = reduction::nodal_unique(&prep.table, &prep.set.ids);
        self.assemble(prep, results)
    }

    /// IP field averaged to every node of `set`.
    pub fn query_nodal_averaged(
        &self,
        field: &str,
        frame: FrameRef,
        set: &str,
    ) -> Result<QueryOutcome<ReducedValue>, ResultSieveError> {
        let prep = self.prepare(QueryShape::NodalAveraged, field, frame, set)?;
        let adjacency = self.adjacency.get_or_build(prep.instance);
        let results = reduction::nodal_average_from_ip(
            &prep.table,
            prep.instance,
            &adjacency,
            &prep.set.ids,
            self.policy.as_ref(),
        );
        self.assemble(prep, results)
    }

    /// Unreduced IP values of every element of `set`.
    pub fn query_elemental_per_ip(
        &self,
        field: &str,
        frame: FrameRef,
        set: &str,
    ) -> Result<QueryOutcome<PerIpValues>, ResultSieveError> {
        let prep = self.prepare(QueryShape::ElementalPerIp, field, frame, set)?;
        let results = reduction::element_per_ip(&prep.table, prep.instance, &prep.set.ids);
        self.assemble(prep, results)
    }

    /// IP field averaged over each element of `set`.
    pub fn query_elemental_averaged(
        &self,
        field: &str,
        frame: FrameRef,
        set: &str,
    ) -> Result<QueryOutcome<ReducedValue>, ResultSieveError> {
        let prep = self.prepare(QueryShape::ElementalAveraged, field, frame, set)?;
        let results = reduction::element_average(
            &prep.table,
            prep.instance,
            &prep.set.ids,
            self.policy.as_ref(),
        );
        self.assemble(prep, results)
    }

    /// Centroid field value of every element of `set`.
    pub fn query_elemental_unique(
        &self,
        field: &str,
        frame: FrameRef,
        set: &str,
    ) -> Result<QueryOutcome<ReducedValue>, ResultSieveError> {
        let prep = self.prepare(QueryShape::ElementalUnique, field, frame, set)?;
        let results = reduction::element_unique(&prep.table, &prep.set.ids);
        self.assemble(prep, results)
    }

    /// Runs the query for `shape`.
    pub fn query(
        &self,
        shape: QueryShape,
        field: &str,
        frame: FrameRef,
        set: &str,
    ) -> Result<ShapedOutcome, ResultSieveError> {
        Ok(match shape {
            QueryShape::NodalUnique => {
                ShapedOutcome::Reduced(self.query_nodal_unique(field, frame, set)?)
            }
            QueryShape::NodalAveraged => {
                ShapedOutcome::Reduced(self.query_nodal_averaged(field, frame, set)?)
            }
            QueryShape::ElementalPerIp => {
                ShapedOutcome::PerIp(self.query_elemental_per_ip(field, frame, set)?)
            }
            QueryShape::ElementalAveraged => {
                ShapedOutcome::Reduced(self.query_elemental_averaged(field, frame, set)?)
            }
            QueryShape::ElementalUnique => {
                ShapedOutcome::Reduced(self.query_elemental_unique(field, frame, set)?)
            }
        })
    }

    /// Runs the query for every frame of every step, in analysis order.
    ///
    /// Frames in which the field was not written are skipped; any other
    /// query-level error aborts.
    pub fn query_history(
        &self,
        shape: QueryShape,
        field: &str,
        set: &str,
    ) -> Result<Vec<HistoryFrame>, ResultSieveError> {
        let mut history = Vec::new();
        for frame in self.db.frames() {
            let run_completion = self.db.run_completion(frame)?;
            match self.query(shape, field, frame, set) {
                Ok(outcome) => history.push(HistoryFrame {
                    frame,
                    run_completion,
                    outcome,
                }),
                Err(ResultSieveError::UnknownField { .. }) => {
                    log::debug!("{frame}: `{field}` not written, skipped");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(history)
    }

    fn prepare(
        &self,
        shape: QueryShape,
        field: &str,
        frame: FrameRef,
        set: &str,
    ) -> Result<Prepared<'db>, ResultSieveError> {
        let field = self.options.normalize(field);
        let set = self.options.normalize(set);
        let selector = FieldSelector::parse(&field);
        let descriptor = self.db.field_descriptor(&selector.key, frame)?;
        let native = descriptor.location;
        if shape.source_location() != native {
            return Err(ResultSieveError::ShapeMismatch {
                field,
                native,
                requested: shape,
            });
        }

        let entity_set = self.db.set(&set, shape.set_kind())?;
        let instance = self.db.instance(entity_set.owning_instance()?)?;
        let resolved = resolve_set(entity_set, instance, self.options.label_order)?;

        let records = self
            .db
            .field_records(instance.name(), &selector.key, frame, native)?;
        let mut table = FieldTable::from_records(descriptor, frame, records)?;
        if let Some(invariant) = selector.invariant {
            table = derive_invariant(&table, invariant)?;
        }
        log::debug!(
            "{shape} query of `{field}` in {frame} over `{set}` ({} members of `{}`)",
            resolved.ids.len(),
            instance.name()
        );
        Ok(Prepared {
            field: selector.display_name().to_string(),
            instance,
            set: resolved,
            table,
        })
    }

    fn assemble<T>(
        &self,
        prep: Prepared<'db>,
        results: Vec<Result<T, ResultSieveError>>,
    ) -> Result<QueryOutcome<T>, ResultSieveError> {
        let mut rows = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        let foreign = prep
            .set
            .unknown
            .iter()
            .map(|&id| (id, Err(prep.instance.unknown(prep.set.kind, id))));
        let reduced = prep.set.ids.iter().copied().zip(results);
        for (id, result) in foreign.chain(reduced) {
            match result {
                Ok(row) => rows.push(row),
                Err(error) if error.is_per_entity() => match self.options.failure_mode {
                    FailureMode::Abort => return Err(error),
                    FailureMode::Collect => {
                        log::warn!("{} {id} of set `{}`: {error}", prep.set.kind, prep.set.name);
                        failures.push(EntityFailure { id, error });
                    }
                },
                Err(error) => return Err(error),
            }
        }
        Ok(QueryOutcome {
            field: prep.field,
            frame: prep.table.frame(),
            set: prep.set.name,
            instance: prep.set.instance,
            rows,
            failures,
        })
    }
}
