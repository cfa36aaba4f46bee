//! Lazy pages over aggregation cursors
//!
//! A page built from a pipeline runs nothing until its content, cursor id or
//! total is first asked for. A page built from a cursor read is already
//! resolved. Navigation is forward-only.

use serde::de::DeserializeOwned;

use crate::aggregation::AggregationResult;
use crate::context::{DispatchKind, SearchContext};
use crate::error::SearchResult;
use crate::mapper::{to_entities, to_maps, to_projections, Projection, ResultRow, ReturnFieldSet, RowMap};
use crate::search::SearchCommand;
use crate::transport::{Command, RawResponse, SearchTransport};

use super::request::{total_pages, PageRequest, Pageable};

const UNRESOLVED_CURSOR: i64 = -1;

/// One page of aggregation results
pub struct AggregationPage<'a, T: SearchTransport> {
    ctx: &'a SearchContext<T>,
    index: String,
    backing_query: String,
    request: PageRequest,
    return_fields: ReturnFieldSet,
    pipeline: Option<AggregationResult<Command>>,
    rows: Option<Vec<ResultRow>>,
    cursor_id: i64,
    engine_total: u64,
    total: Option<u64>,
}

impl<'a, T: SearchTransport> AggregationPage<'a, T> {
    pub(crate) fn from_pipeline(
        ctx: &'a SearchContext<T>,
        index: &str,
        backing_query: String,
        command: AggregationResult<Command>,
        return_fields: ReturnFieldSet,
        request: PageRequest,
    ) -> Self {
        Self {
            ctx,
            index: index.to_string(),
            backing_query,
            request,
            return_fields,
            pipeline: Some(command),
            rows: None,
            cursor_id: UNRESOLVED_CURSOR,
            engine_total: 0,
            total: None,
        }
    }

    fn from_response(
        ctx: &'a SearchContext<T>,
        index: &str,
        backing_query: String,
        return_fields: ReturnFieldSet,
        request: PageRequest,
        response: RawResponse,
    ) -> Self {
        Self {
            ctx,
            index: index.to_string(),
            backing_query,
            request,
            return_fields,
            pipeline: None,
            rows: Some(response.rows),
            cursor_id: response.cursor_id,
            engine_total: response.total,
            total: None,
        }
    }

    /// Read the batch behind a cursor pageable handed out by `next_pageable`
    pub fn resume(
        ctx: &'a SearchContext<T>,
        index: &str,
        request: PageRequest,
        cursor_id: i64,
    ) -> SearchResult<Self> {
        let response = ctx.read_cursor(index, cursor_id, request.size())?;
        Ok(Self::from_response(
            ctx,
            index,
            "*".to_string(),
            ReturnFieldSet::new(),
            request,
            response,
        ))
    }

    fn resolve(&mut self) -> SearchResult<()> {
        if self.rows.is_some() {
            return Ok(());
        }
        let rows = match self.pipeline.clone() {
            Some(command) => {
                let response = self.ctx.dispatch(&command?, DispatchKind::Aggregate)?;
                self.cursor_id = response.cursor_id;
                self.engine_total = response.total;
                response.rows
            }
            None => Vec::new(),
        };
        self.rows = Some(rows);
        Ok(())
    }

    /// Zero-based page number
    pub fn number(&self) -> usize {
        self.request.page()
    }

    pub fn request(&self) -> &PageRequest {
        &self.request
    }

    /// Rows of this page
    pub fn content(&mut self) -> SearchResult<&[ResultRow]> {
        self.resolve()?;
        Ok(self.rows.as_deref().unwrap_or(&[]))
    }

    /// Number of rows on this page
    pub fn size(&mut self) -> SearchResult<usize> {
        Ok(self.content()?.len())
    }

    pub fn has_content(&mut self) -> SearchResult<bool> {
        Ok(!self.content()?.is_empty())
    }

    /// Cursor id after this page; 0 once the cursor is exhausted
    pub fn cursor_id(&mut self) -> SearchResult<i64> {
        self.resolve()?;
        Ok(self.cursor_id)
    }

    pub fn is_first(&self) -> bool {
        self.number() == 0
    }

    pub fn is_last(&mut self) -> SearchResult<bool> {
        Ok(self.cursor_id()? == 0)
    }

    /// Total matching documents, resolved once
    ///
    /// Pipeline pages ask the engine with a zero-content count query over the
    /// backing query; cursor pages use the engine-reported total.
    pub fn total_elements(&mut self) -> SearchResult<u64> {
        if let Some(total) = self.total {
            return Ok(total);
        }

        let total = if self.pipeline.is_some() {
            let mut count = SearchCommand::new(
                &self.index,
                &self.backing_query,
                self.ctx.config().default_dialect,
            );
            count.no_content = true;
            count.limit = Some((0, 0));
            count.sort = self.request.sort().first().cloned();
            self.ctx
                .dispatch(&count.to_command(), DispatchKind::Count)?
                .total
        } else {
            self.engine_total
        };

        self.total = Some(total);
        Ok(total)
    }

    pub fn total_pages(&mut self) -> SearchResult<usize> {
        let total = self.total_elements()?;
        Ok(total_pages(total, self.request.size()))
    }

    /// Pipeline pages compare against the total page count; cursor pages
    /// check for an open cursor
    pub fn has_next(&mut self) -> SearchResult<bool> {
        if self.pipeline.is_some() {
            Ok(self.number() + 1 < self.total_pages()?)
        } else {
            Ok(self.cursor_id()? != 0)
        }
    }

    /// Cursor pageable for the next batch, or `Unpaged`
    pub fn next_pageable(&mut self) -> SearchResult<Pageable> {
        if !self.has_next()? {
            return Ok(Pageable::Unpaged);
        }
        Ok(Pageable::Cursor {
            request: self.request.next(),
            cursor_id: self.cursor_id()?,
        })
    }

    pub fn has_previous(&self) -> bool {
        false
    }

    pub fn previous_pageable(&self) -> Pageable {
        Pageable::Unpaged
    }

    /// Read the next batch from the cursor; `None` once exhausted
    pub fn read_next(&mut self) -> SearchResult<Option<AggregationPage<'a, T>>> {
        let cursor_id = self.cursor_id()?;
        if cursor_id == 0 {
            return Ok(None);
        }
        let response = self
            .ctx
            .read_cursor(&self.index, cursor_id, self.request.size())?;
        Ok(Some(Self::from_response(
            self.ctx,
            &self.index,
            self.backing_query.clone(),
            self.return_fields.clone(),
            self.request.next(),
            response,
        )))
    }

    /// Rows as maps
    pub fn maps(&mut self, include_id: bool) -> SearchResult<Vec<RowMap>> {
        self.resolve()?;
        let rows = self.rows.as_deref().unwrap_or(&[]);
        Ok(to_maps(rows, &self.return_fields, include_id))
    }

    /// Rows decoded into entities
    pub fn entities<E: DeserializeOwned>(&mut self) -> SearchResult<Vec<E>> {
        Ok(to_entities(self.content()?)?)
    }

    /// Rows wrapped as projections
    pub fn projections<P: Projection>(&mut self) -> SearchResult<Vec<P>> {
        Ok(to_projections(self.content()?))
    }

    /// Apply `f` to every row
    pub fn map<U, F: FnMut(&ResultRow) -> U>(&mut self, f: F) -> SearchResult<Vec<U>> {
        Ok(self.content()?.iter().map(f).collect())
    }
}
