//! Aggregation pipeline builder
//!
//! Stages accumulate in call order. A GROUPBY and its current reducer stay
//! pending until the next stage-adding call, a new group, or a terminal call
//! flushes them. Usage errors are recorded and returned by the terminal call.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::context::{DispatchKind, SearchContext};
use crate::error::SearchResult;
use crate::mapper::{
    to_entities, to_maps, to_projections, to_tuples, ContentType, Projection, ReturnFieldSet,
    RowMap, Tuple,
};
use crate::observability::{log_event, Event, Severity};
use crate::pagination::{AggregationPage, PageRequest};
use crate::schema::IndexSchema;
use crate::transport::{Command, RawResponse, SearchTransport};

use super::errors::{AggregationError, AggregationResult};
use super::reducer::{ReducerFunction, ReducerParam, ReducerSpec};
use super::stage::{AggregationFilter, CursorSpec, SortField, Stage};

#[derive(Debug, Clone, Default)]
struct PendingGroup {
    fields: Vec<String>,
    reducers: Vec<ReducerSpec>,
}

#[derive(Debug, Clone, Default)]
struct PipelineState {
    stages: Vec<Stage>,
    group: Option<PendingGroup>,
    reducer: Option<ReducerSpec>,
    return_fields: ReturnFieldSet,
    limit_set: bool,
    cursor: Option<CursorSpec>,
    verbatim: bool,
    timeout: Option<Duration>,
    error: Option<AggregationError>,
}

impl PipelineState {
    /// Move the pending reducer into the open group, assigning its alias
    fn flush_pending_reducer(&mut self, schema: &IndexSchema) {
        let Some(mut reducer) = self.reducer.take() else {
            return;
        };
        let alias = reducer.effective_alias();
        reducer.alias = Some(alias.clone());

        let source_hint = reducer.field.as_deref().and_then(|f| schema.hint_for(f));
        self.return_fields
            .insert(&alias, Some(reducer.function.result_hint(source_hint)));

        self.group.get_or_insert_with(PendingGroup::default).reducers.push(reducer);
    }

    /// Emit the pending group (with its reducers) as a GROUPBY stage
    fn flush_pending_group(&mut self, schema: &IndexSchema) {
        self.flush_pending_reducer(schema);
        if let Some(group) = self.group.take() {
            self.stages.push(Stage::GroupBy {
                fields: group.fields,
                reducers: group.reducers,
            });
        }
    }

    fn open_group(&mut self, fields: &[&str], schema: &IndexSchema) {
        let mut group = PendingGroup::default();
        for field in fields {
            let alias = crate::mapper::strip_at(field);
            self.return_fields.insert(alias, schema.hint_for(alias));
            group.fields.push(alias.to_string());
        }
        self.group = Some(group);
    }

    fn record(&mut self, error: AggregationError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

/// Builder for one `FT.AGGREGATE` command
pub struct AggregationPipeline<'a, T: SearchTransport> {
    ctx: &'a SearchContext<T>,
    schema: &'a IndexSchema,
    query: String,
    state: PipelineState,
}

impl<'a, T: SearchTransport> AggregationPipeline<'a, T> {
    pub(crate) fn new(ctx: &'a SearchContext<T>, schema: &'a IndexSchema, query: impl Into<String>) -> Self {
        Self {
            ctx,
            schema,
            query: query.into(),
            state: PipelineState::default(),
        }
    }

    // ==================== Stages ====================

    /// `LOAD n @f...`; the fields join the return set
    pub fn load(mut self, fields: &[&str]) -> Self {
        self.state.flush_pending_group(self.schema);
        if !fields.is_empty() {
            let mut aliases = Vec::with_capacity(fields.len());
            for field in fields {
                let alias = crate::mapper::strip_at(field);
                self.state.return_fields.insert(alias, self.schema.hint_for(alias));
                aliases.push(alias.to_string());
            }
            self.state.stages.push(Stage::Load(aliases));
        }
        self
    }

    /// `LOAD *`
    pub fn load_all(mut self) -> Self {
        self.state.flush_pending_group(self.schema);
        self.state.stages.push(Stage::LoadAll);
        self
    }

    /// Flush, then open a new group; no fields groups everything
    pub fn group_by(mut self, fields: &[&str]) -> Self {
        self.state.flush_pending_group(self.schema);
        self.state.open_group(fields, self.schema);
        self
    }

    /// `APPLY expr AS alias`
    pub fn apply(mut self, expression: &str, alias: &str) -> Self {
        self.state.flush_pending_group(self.schema);
        self.state.return_fields.insert(alias, None);
        self.state.stages.push(Stage::Apply {
            expression: expression.to_string(),
            alias: alias.to_string(),
        });
        self
    }

    /// `SORTBY`; sort keys join the return set
    pub fn sorted(self, fields: &[SortField]) -> Self {
        self.sort_stage(fields, None)
    }

    /// `SORTBY ... MAX max`
    pub fn sorted_max(self, max: usize, fields: &[SortField]) -> Self {
        self.sort_stage(fields, Some(max))
    }

    fn sort_stage(mut self, fields: &[SortField], max: Option<usize>) -> Self {
        self.state.flush_pending_group(self.schema);
        for field in fields {
            let hint = self.schema.hint_for(&field.field);
            self.state.return_fields.insert(&field.field, hint);
        }
        self.state.stages.push(Stage::SortBy {
            fields: fields.to_vec(),
            max,
        });
        self
    }

    /// `LIMIT 0 count`
    pub fn limit(self, count: usize) -> Self {
        self.limit_offset(0, count)
    }

    /// `LIMIT offset count`
    pub fn limit_offset(mut self, offset: usize, count: usize) -> Self {
        self.state.flush_pending_group(self.schema);
        self.state.stages.push(Stage::Limit { offset, count });
        self.state.limit_set = true;
        self
    }

    /// `FILTER expr`
    pub fn filter(mut self, expression: &str) -> Self {
        self.state.flush_pending_group(self.schema);
        self.state.stages.push(Stage::Filter(expression.to_string()));
        self
    }

    /// Field-presence FILTER; the field leaves the return set
    pub fn filter_on(mut self, filter: AggregationFilter) -> Self {
        self.state.flush_pending_group(self.schema);
        self.state.return_fields.remove(filter.field());
        self.state.stages.push(Stage::Filter(filter.expression()));
        self
    }

    // ==================== Reducers ====================

    /// Reducer with no source field, e.g. COUNT
    pub fn reduce(self, function: ReducerFunction) -> Self {
        self.push_reducer(ReducerSpec::new(function, None, Vec::new()))
    }

    /// Reducer over an indexed field
    pub fn reduce_on(self, function: ReducerFunction, field: &str, params: &[ReducerParam]) -> Self {
        self.push_reducer(ReducerSpec::new(function, Some(field), params.to_vec()))
    }

    /// Reducer over an alias produced by an earlier stage
    pub fn reduce_alias(self, function: ReducerFunction, alias: &str, params: &[ReducerParam]) -> Self {
        self.push_reducer(ReducerSpec::new(function, Some(alias), params.to_vec()))
    }

    /// Reducer by wire name; unknown names are skipped
    pub fn reduce_named(self, name: &str, field: Option<&str>, params: &[ReducerParam]) -> Self {
        match ReducerFunction::from_name(name) {
            Some(function) => self.push_reducer(ReducerSpec::new(function, field, params.to_vec())),
            None => {
                log_event(
                    Severity::Warn,
                    Event::ReducerSkipped,
                    &[("index", self.schema.index_name()), ("reducer", name)],
                );
                self
            }
        }
    }

    fn push_reducer(mut self, reducer: ReducerSpec) -> Self {
        if let Some(field) = &reducer.field {
            self.state.return_fields.remove(field);
        }
        if self.state.group.is_none() {
            self.state.group = Some(PendingGroup::default());
        }
        self.state.flush_pending_reducer(self.schema);
        self.state.reducer = Some(reducer);
        self
    }

    /// Alias the pending reducer
    pub fn as_alias(mut self, alias: &str) -> Self {
        match self.state.reducer.as_mut() {
            Some(reducer) => reducer.alias = Some(alias.to_string()),
            None => self.state.record(AggregationError::alias_without_reducer(alias)),
        }
        self
    }

    // ==================== Options ====================

    /// Read results through a cursor of `batch_size` rows
    pub fn cursor(mut self, batch_size: usize, max_idle: Duration) -> Self {
        self.state.flush_pending_group(self.schema);
        self.state.cursor = Some(CursorSpec {
            batch_size,
            max_idle,
        });
        self
    }

    /// Disable stemming of the base query
    pub fn verbatim(mut self) -> Self {
        self.state.verbatim = true;
        self
    }

    /// Engine-side timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.state.timeout = Some(timeout);
        self
    }

    // ==================== Inspection ====================

    /// Base filter the pipeline runs over
    pub fn backing_query(&self) -> &str {
        &self.query
    }

    /// Index the pipeline targets
    pub fn index_name(&self) -> &str {
        self.schema.index_name()
    }

    /// Return set as it will be after flushing
    pub fn return_fields(&self) -> ReturnFieldSet {
        self.sealed().return_fields
    }

    /// Compile without dispatching
    pub fn compile(&self) -> AggregationResult<Command> {
        self.build(&self.sealed())
    }

    /// One line per step, in execution order
    pub fn explain(&self) -> Vec<String> {
        let state = self.sealed();
        let mut steps = vec![format!("query {} on {}", self.query, self.schema.index_name())];
        steps.extend(state.stages.iter().map(|stage| stage.to_string()));
        if !state.limit_set {
            steps.push(format!("limit {} from 0 (default)", self.ctx.config().max_limit));
        }
        if let Some(cursor) = &state.cursor {
            steps.push(format!(
                "read through cursor, {} rows per batch, idle {} ms",
                cursor.batch_size,
                cursor.max_idle.as_millis()
            ));
        }
        if let Some(error) = &state.error {
            steps.push(format!("error: {}", error));
        }
        steps
    }

    fn sealed(&self) -> PipelineState {
        let mut state = self.state.clone();
        state.flush_pending_group(self.schema);
        state
    }

    fn build(&self, state: &PipelineState) -> AggregationResult<Command> {
        if let Some(error) = &state.error {
            return Err(error.clone());
        }

        let mut command = Command::new("FT.AGGREGATE")
            .arg(self.schema.index_name())
            .arg(self.query.as_str());
        if state.verbatim {
            command.push("VERBATIM");
        }
        if let Some(timeout) = state.timeout {
            command.push("TIMEOUT");
            command.push(timeout.as_millis().to_string());
        }
        for stage in &state.stages {
            command.extend(stage.to_args()?);
        }
        if !state.limit_set {
            command.extend(
                Stage::Limit {
                    offset: 0,
                    count: self.ctx.config().max_limit,
                }
                .to_args()?,
            );
        }
        if let Some(cursor) = &state.cursor {
            command.extend(cursor.to_args());
        }
        command.push("DIALECT");
        command.push(self.ctx.config().default_dialect.to_string());
        Ok(command)
    }

    // ==================== Terminals ====================

    fn execute(self) -> SearchResult<(RawResponse, ReturnFieldSet)> {
        let state = self.sealed();
        let command = self.build(&state)?;
        let response = self.ctx.dispatch(&command, DispatchKind::Aggregate)?;
        Ok((response, state.return_fields))
    }

    /// Run and return the raw rows
    pub fn aggregate(self) -> SearchResult<RawResponse> {
        self.execute().map(|(response, _)| response)
    }

    /// Run with an engine-side timeout
    pub fn aggregate_with_timeout(self, timeout: Duration) -> SearchResult<RawResponse> {
        self.timeout(timeout).aggregate()
    }

    /// Run with VERBATIM
    pub fn aggregate_verbatim(self) -> SearchResult<RawResponse> {
        self.verbatim().aggregate()
    }

    /// Run with VERBATIM and an engine-side timeout
    pub fn aggregate_verbatim_with_timeout(self, timeout: Duration) -> SearchResult<RawResponse> {
        self.verbatim().timeout(timeout).aggregate()
    }

    /// Labeled tuples over the return set, column `i` decoded as `content_types[i]`
    pub fn to_list(self, content_types: &[ContentType]) -> SearchResult<Vec<Tuple>> {
        let (response, fields) = self.execute()?;
        Ok(to_tuples(&response.rows, &fields, content_types)?)
    }

    /// Rows decoded into entities
    pub fn to_entities<E: DeserializeOwned>(self) -> SearchResult<Vec<E>> {
        let (response, _) = self.execute()?;
        Ok(to_entities(&response.rows)?)
    }

    /// Rows wrapped as projections
    pub fn to_projection<P: Projection>(self) -> SearchResult<Vec<P>> {
        let (response, _) = self.execute()?;
        Ok(to_projections(&response.rows))
    }

    /// One map per row, without ids
    pub fn to_maps(self) -> SearchResult<Vec<RowMap>> {
        let (response, fields) = self.execute()?;
        Ok(to_maps(&response.rows, &fields, false))
    }

    /// One map per row, with the document id under `id`
    pub fn to_maps_with_id(self) -> SearchResult<Vec<RowMap>> {
        let (response, fields) = self.execute()?;
        Ok(to_maps(&response.rows, &fields, true))
    }

    /// Lazy page read through a cursor sized to the page
    pub fn to_page(self, request: PageRequest) -> AggregationPage<'a, T> {
        let idle = Duration::from_millis(self.ctx.config().cursor_idle_timeout_ms);
        self.to_page_with_timeout(request, idle)
    }

    /// Lazy page with an explicit cursor idle timeout
    pub fn to_page_with_timeout(self, request: PageRequest, max_idle: Duration) -> AggregationPage<'a, T> {
        let pipeline = self.cursor(request.size(), max_idle);
        let state = pipeline.sealed();
        let command = pipeline.build(&state);
        AggregationPage::from_pipeline(
            pipeline.ctx,
            pipeline.schema.index_name(),
            pipeline.query,
            command,
            state.return_fields,
            request,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::ResultRow;
    use crate::schema::{IndexedField, TypeHint};
    use crate::transport::{OfflineTransport, ScriptedTransport};

    fn products() -> IndexSchema {
        IndexSchema::new("products")
            .with_field(IndexedField::tag("$.brand"))
            .with_field(IndexedField::text("$.name"))
            .with_field(IndexedField::numeric("$.price", TypeHint::Double))
            .with_field(IndexedField::numeric("$.stock", TypeHint::Integer))
    }

    fn compiled(pipeline: AggregationPipeline<'_, OfflineTransport>) -> String {
        pipeline.compile().unwrap().to_string()
    }

    #[test]
    fn test_default_limit_injected() {
        let ctx = SearchContext::new(OfflineTransport);
        let schema = products();
        assert_eq!(
            compiled(ctx.aggregate(&schema).load(&["name"])),
            "FT.AGGREGATE products * LOAD 1 @name LIMIT 0 10000 DIALECT 2"
        );
    }

    #[test]
    fn test_group_count_sort_limit() {
        let ctx = SearchContext::new(OfflineTransport);
        let schema = products();
        let pipeline = ctx
            .aggregate(&schema)
            .group_by(&["brand"])
            .reduce(ReducerFunction::Count)
            .as_alias("count")
            .sorted(&[SortField::desc("@count")])
            .limit(5);
        assert_eq!(
            compiled(pipeline),
            "FT.AGGREGATE products * GROUPBY 1 @brand REDUCE COUNT 0 AS count \
             SORTBY 2 @count DESC LIMIT 0 5 DIALECT 2"
        );
    }

    #[test]
    fn test_second_reduce_auto_aliases_first() {
        let ctx = SearchContext::new(OfflineTransport);
        let schema = products();
        let pipeline = ctx
            .aggregate(&schema)
            .group_by(&["brand"])
            .reduce(ReducerFunction::Count)
            .reduce_on(ReducerFunction::Avg, "price", &[])
            .as_alias("avg_price");

        let command = pipeline.compile().unwrap();
        let args = command.args().join(" ");
        assert!(args.contains("REDUCE COUNT 0 AS count REDUCE AVG 1 @price AS avg_price"));

        let fields = pipeline.return_fields();
        assert_eq!(fields.aliases(), &["brand", "count", "avg_price"]);
        assert_eq!(fields.hint("count"), Some(TypeHint::Long));
        assert_eq!(fields.hint("avg_price"), Some(TypeHint::Double));
    }

    #[test]
    fn test_reduce_without_group_groups_everything() {
        let ctx = SearchContext::new(OfflineTransport);
        let schema = products();
        let pipeline = ctx
            .aggregate(&schema)
            .reduce_on(ReducerFunction::Sum, "stock", &[]);
        assert_eq!(
            compiled(pipeline),
            "FT.AGGREGATE products * GROUPBY 0 REDUCE SUM 1 @stock AS sum LIMIT 0 10000 DIALECT 2"
        );
    }

    #[test]
    fn test_reducer_source_leaves_return_set() {
        let ctx = SearchContext::new(OfflineTransport);
        let schema = products();
        let fields = ctx
            .aggregate(&schema)
            .load(&["price"])
            .group_by(&["brand"])
            .reduce_on(ReducerFunction::Max, "price", &[])
            .return_fields();
        assert_eq!(fields.aliases(), &["brand", "max"]);
        assert_eq!(fields.hint("max"), Some(TypeHint::Double));
    }

    #[test]
    fn test_apply_filter_and_exists() {
        let ctx = SearchContext::new(OfflineTransport);
        let schema = products();
        let pipeline = ctx
            .aggregate(&schema)
            .load(&["price", "stock"])
            .apply("@price * @stock", "value")
            .filter("@value > 100")
            .filter_on(AggregationFilter::Exists("stock".into()));

        assert_eq!(
            compiled(pipeline),
            "FT.AGGREGATE products * LOAD 2 @price @stock APPLY \"@price * @stock\" AS value \
             FILTER \"@value > 100\" FILTER exists(@stock) LIMIT 0 10000 DIALECT 2"
        );
    }

    #[test]
    fn test_cursor_verbatim_and_timeout() {
        let ctx = SearchContext::new(OfflineTransport);
        let schema = products();
        let pipeline = ctx
            .aggregate(&schema)
            .load_all()
            .limit_offset(10, 5)
            .cursor(5, Duration::from_secs(60))
            .verbatim()
            .timeout(Duration::from_millis(250));
        assert_eq!(
            compiled(pipeline),
            "FT.AGGREGATE products * VERBATIM TIMEOUT 250 LOAD * LIMIT 10 5 \
             WITHCURSOR COUNT 5 MAXIDLE 60000 DIALECT 2"
        );
    }

    #[test]
    fn test_unknown_reducer_name_is_skipped() {
        let ctx = SearchContext::new(OfflineTransport);
        let schema = products();
        let pipeline = ctx
            .aggregate(&schema)
            .group_by(&["brand"])
            .reduce_named("median", Some("price"), &[])
            .reduce_named("count", None, &[]);
        assert_eq!(
            compiled(pipeline),
            "FT.AGGREGATE products * GROUPBY 1 @brand REDUCE COUNT 0 AS count LIMIT 0 10000 DIALECT 2"
        );
    }

    #[test]
    fn test_usage_errors_surface_at_terminal() {
        let ctx = SearchContext::new(ScriptedTransport::new());
        let schema = products();
        let err = ctx
            .aggregate(&schema)
            .group_by(&["brand"])
            .reduce_on(ReducerFunction::Quantile, "price", &[])
            .to_maps()
            .unwrap_err();
        assert_eq!(err.code(), "SEARCH_REDUCER_PARAM_REQUIRED");
        assert!(ctx.transport().sent().is_empty());

        let err = ctx.aggregate(&schema).as_alias("orphan").aggregate().unwrap_err();
        assert_eq!(err.code(), "SEARCH_ALIAS_WITHOUT_REDUCER");
    }

    #[test]
    fn test_to_list_decodes_by_content_type() {
        let transport = ScriptedTransport::new().reply(RawResponse::with_rows(vec![
            ResultRow::new().with_field("brand", "Nike").with_field("count", "12"),
            ResultRow::new().with_field("brand", "Adidas").with_field("count", "7"),
        ]));
        let ctx = SearchContext::new(transport);
        let schema = products();

        let tuples = ctx
            .aggregate(&schema)
            .group_by(&["brand"])
            .reduce(ReducerFunction::Count)
            .to_list(&[ContentType::String, ContentType::Long])
            .unwrap();

        assert_eq!(tuples.len(), 2);
        let (brand, count): (String, i64) = tuples[0].clone().into_typed().unwrap();
        assert_eq!(brand, "Nike");
        assert_eq!(count, 12);
        assert_eq!(tuples[1].labels(), &["brand", "count"]);
    }

    #[test]
    fn test_explain_lists_steps() {
        let ctx = SearchContext::new(OfflineTransport);
        let schema = products();
        let steps = ctx
            .aggregate(&schema)
            .group_by(&["brand"])
            .reduce(ReducerFunction::Count)
            .explain();
        assert_eq!(
            steps,
            vec![
                "query * on products".to_string(),
                "group by brand; COUNT as count".to_string(),
                "limit 10000 from 0 (default)".to_string(),
            ]
        );
    }
}
