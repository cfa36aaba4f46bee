//! Plain search builder
//!
//! Filters compose onto one predicate tree. Terminal calls compile a single
//! `FT.SEARCH`; pages add a zero-content count query. Transitions hand the
//! current query to an aggregation pipeline.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::aggregation::{AggregationPipeline, SortField};
use crate::context::{DispatchKind, SearchContext};
use crate::error::SearchResult;
use crate::mapper::{decode_entity, strip_at, to_entities, to_maps, ResultRow, ReturnFieldSet, RowMap};
use crate::pagination::{Page, PageRequest};
use crate::qbe::{Example, ExampleTranslator};
use crate::query::{serialize, Predicate, QueryNode};
use crate::schema::{IndexSchema, SchemaError};
use crate::transport::{Command, SearchTransport};

use super::command::{SearchCommand, SummarizeParams};

/// Builder for one `FT.SEARCH`
pub struct SearchStream<'a, T: SearchTransport> {
    ctx: &'a SearchContext<T>,
    schema: &'a IndexSchema,
    root: QueryNode,
    sort: Option<SortField>,
    limit: Option<usize>,
    skip: Option<usize>,
    dialect: Option<u32>,
    return_fields: Vec<String>,
    summarize: Option<(Vec<String>, SummarizeParams)>,
    highlight: Option<(Vec<String>, String, String)>,
    verbatim: bool,
    timeout: Option<Duration>,
    error: Option<SchemaError>,
}

impl<'a, T: SearchTransport> SearchStream<'a, T> {
    pub(crate) fn new(ctx: &'a SearchContext<T>, schema: &'a IndexSchema) -> Self {
        Self {
            ctx,
            schema,
            root: QueryNode::empty(),
            sort: None,
            limit: None,
            skip: None,
            dialect: None,
            return_fields: Vec::new(),
            summarize: None,
            highlight: None,
            verbatim: false,
            timeout: None,
            error: None,
        }
    }

    // ==================== Filters ====================

    /// Compose a field predicate onto the query
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.root = predicate.apply(self.root);
        self
    }

    /// Intersect a prebuilt node with the query
    pub fn filter_node(mut self, node: QueryNode) -> Self {
        self.root = self.root.and(node);
        self
    }

    /// Compose a free-text clause onto the query
    pub fn filter_text(mut self, text: &str) -> Self {
        self.root = self.root.with_free_text(text);
        self
    }

    /// Compose a query-by-example probe onto the query
    pub fn filter_example(mut self, example: &Example) -> Self {
        let translator = ExampleTranslator::new(self.schema, self.ctx.config());
        self.root = translator.translate_onto(self.root, example);
        self
    }

    // ==================== Options ====================

    pub fn sorted(mut self, sort: SortField) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn dialect(mut self, dialect: u32) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Return only these fields; each must be declared by the index
    pub fn return_fields(mut self, fields: &[&str]) -> Self {
        for field in fields {
            let alias = strip_at(field);
            if let Err(err) = self.schema.require(alias) {
                self.error.get_or_insert(err);
                continue;
            }
            if !self.return_fields.iter().any(|f| f == alias) {
                self.return_fields.push(alias.to_string());
            }
        }
        self
    }

    /// Summarize with the configured defaults
    pub fn summarize(self, fields: &[&str]) -> Self {
        let params = SummarizeParams::from_defaults(&self.ctx.config().summarize);
        self.summarize_with(fields, params)
    }

    pub fn summarize_with(mut self, fields: &[&str], params: SummarizeParams) -> Self {
        let fields = fields.iter().map(|f| f.to_string()).collect();
        self.summarize = Some((fields, params));
        self
    }

    /// Highlight with the configured tags
    pub fn highlight(self, fields: &[&str]) -> Self {
        let (open, close) = self.ctx.config().highlight_tags.clone();
        self.highlight_with_tags(fields, &open, &close)
    }

    pub fn highlight_with_tags(mut self, fields: &[&str], open: &str, close: &str) -> Self {
        let fields = fields.iter().map(|f| f.to_string()).collect();
        self.highlight = Some((fields, open.to_string(), close.to_string()));
        self
    }

    pub fn verbatim(mut self) -> Self {
        self.verbatim = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    // ==================== Inspection ====================

    /// Current query string; `*` when nothing was filtered
    pub fn query_string(&self) -> String {
        serialize(&self.root)
    }

    pub fn root(&self) -> &QueryNode {
        &self.root
    }

    /// Compile without dispatching
    pub fn compile(&self) -> Command {
        self.search_command().to_command()
    }

    /// Compile, failing on the first recorded usage error
    pub fn try_compile(&self) -> SearchResult<Command> {
        self.check()?;
        Ok(self.compile())
    }

    /// One line per part of the compiled search
    pub fn explain(&self) -> Vec<String> {
        let mut steps = vec![format!(
            "query {} on {}",
            self.query_string(),
            self.schema.index_name()
        )];
        if !self.return_fields.is_empty() {
            steps.push(format!("return {}", self.return_fields.join(", ")));
        }
        if let Some(sort) = &self.sort {
            steps.push(format!("sort by {} {}", sort.field, sort.direction.as_str()));
        }
        match self.limit {
            Some(limit) => steps.push(format!("limit {} from {}", limit, self.skip.unwrap_or(0))),
            None => steps.push(format!(
                "limit {} from {} (default)",
                self.ctx.config().max_limit,
                self.skip.unwrap_or(0)
            )),
        }
        if let Some(err) = &self.error {
            steps.push(format!("error: {}", err));
        }
        steps
    }

    fn base_command(&self) -> SearchCommand {
        let dialect = self.dialect.unwrap_or(self.ctx.config().default_dialect);
        SearchCommand::new(self.schema.index_name(), &self.query_string(), dialect)
    }

    fn search_command(&self) -> SearchCommand {
        let mut command = self.base_command();
        command.verbatim = self.verbatim;
        command.return_fields = self.return_fields.clone();
        if let Some((fields, params)) = &self.summarize {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            command.set_summarize(&fields, params.clone());
        }
        if let Some((fields, open, close)) = &self.highlight {
            let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
            command.set_highlight(&fields, open, close);
        }
        command.sort = self.sort.clone();
        command.limit = Some((
            self.skip.unwrap_or(0),
            self.limit.unwrap_or(self.ctx.config().max_limit),
        ));
        command.timeout = self.timeout;
        command
    }

    fn return_field_set(&self) -> ReturnFieldSet {
        let mut fields = ReturnFieldSet::new();
        for alias in &self.return_fields {
            fields.insert(alias, self.schema.hint_for(alias));
        }
        fields
    }

    fn check(&self) -> SearchResult<()> {
        match &self.error {
            Some(err) => Err(err.clone().into()),
            None => Ok(()),
        }
    }

    // ==================== Terminals ====================

    /// Raw rows of the search
    pub fn to_rows(self) -> SearchResult<Vec<ResultRow>> {
        self.check()?;
        let command = self.compile();
        Ok(self.ctx.dispatch(&command, DispatchKind::Search)?.rows)
    }

    /// Number of matching documents
    pub fn count(self) -> SearchResult<u64> {
        let mut command = self.base_command();
        command.verbatim = self.verbatim;
        command.limit = Some((0, 0));
        let response = self.ctx.dispatch(&command.to_command(), DispatchKind::Count)?;
        Ok(response.total)
    }

    /// Matching documents decoded into entities
    pub fn to_list<E: DeserializeOwned>(self) -> SearchResult<Vec<E>> {
        let rows = self.to_rows()?;
        Ok(to_entities(&rows)?)
    }

    /// Matching documents as maps
    pub fn to_maps(self, include_id: bool) -> SearchResult<Vec<RowMap>> {
        let fields = self.return_field_set();
        let rows = self.to_rows()?;
        Ok(to_maps(&rows, &fields, include_id))
    }

    /// First matching document
    pub fn find_first<E: DeserializeOwned>(self) -> SearchResult<Option<E>> {
        let rows = self.limit(1).to_rows()?;
        match rows.first() {
            Some(row) => Ok(Some(decode_entity(row)?)),
            None => Ok(None),
        }
    }

    fn fetch_page(self, request: &PageRequest) -> SearchResult<(Vec<ResultRow>, u64, ReturnFieldSet)> {
        self.check()?;
        let mut stream = self.skip(request.offset()).limit(request.size());
        if let Some(sort) = request.sort().first() {
            stream = stream.sorted(sort.clone());
        }

        let content = stream.compile();
        let rows = stream.ctx.dispatch(&content, DispatchKind::Search)?.rows;

        let mut count = stream.base_command();
        count.verbatim = stream.verbatim;
        count.no_content = true;
        count.limit = Some((0, request.offset() + request.size()));
        let total = stream
            .ctx
            .dispatch(&count.to_command(), DispatchKind::Count)?
            .total;

        Ok((rows, total, stream.return_field_set()))
    }

    /// One page of entities plus the total match count
    pub fn page<E: DeserializeOwned>(self, request: PageRequest) -> SearchResult<Page<E>> {
        let (rows, total, _) = self.fetch_page(&request)?;
        Ok(Page::new(to_entities(&rows)?, request, total))
    }

    /// One page of maps plus the total match count
    pub fn page_maps(self, request: PageRequest, include_id: bool) -> SearchResult<Page<RowMap>> {
        let (rows, total, fields) = self.fetch_page(&request)?;
        Ok(Page::new(to_maps(&rows, &fields, include_id), request, total))
    }

    // ==================== Transitions ====================

    /// Aggregate the current matches without stages
    pub fn aggregate(self) -> AggregationPipeline<'a, T> {
        AggregationPipeline::new(self.ctx, self.schema, self.query_string())
    }

    /// Aggregate the current matches, grouped by `fields`
    pub fn group_by(self, fields: &[&str]) -> AggregationPipeline<'a, T> {
        self.aggregate().group_by(fields)
    }

    /// Aggregate the current matches, loading `fields`
    pub fn load(self, fields: &[&str]) -> AggregationPipeline<'a, T> {
        self.aggregate().load(fields)
    }

    /// Aggregate the current matches, loading every field
    pub fn load_all(self) -> AggregationPipeline<'a, T> {
        self.aggregate().load_all()
    }

    /// Aggregate the current matches, starting with an APPLY
    pub fn apply(self, expression: &str, alias: &str) -> AggregationPipeline<'a, T> {
        self.aggregate().apply(expression, alias)
    }
}
