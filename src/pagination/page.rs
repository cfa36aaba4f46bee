//! Eager pages over plain searches

use serde::Serialize;

use super::request::{total_pages, PageRequest, Pageable};

/// One page of search results with the total match count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<E> {
    content: Vec<E>,
    request: PageRequest,
    total: u64,
}

impl<E> Page<E> {
    pub fn new(content: Vec<E>, request: PageRequest, total: u64) -> Self {
        Self {
            content,
            request,
            total,
        }
    }

    pub fn content(&self) -> &[E] {
        &self.content
    }

    pub fn into_content(self) -> Vec<E> {
        self.content
    }

    pub fn request(&self) -> &PageRequest {
        &self.request
    }

    /// Zero-based page number
    pub fn number(&self) -> usize {
        self.request.page()
    }

    /// Requested page size
    pub fn size(&self) -> usize {
        self.request.size()
    }

    /// Rows actually on this page
    pub fn number_of_elements(&self) -> usize {
        self.content.len()
    }

    pub fn total_elements(&self) -> u64 {
        self.total
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.total, self.request.size())
    }

    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }

    pub fn is_first(&self) -> bool {
        self.number() == 0
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    pub fn has_next(&self) -> bool {
        self.number() + 1 < self.total_pages()
    }

    /// Pages are forward-only
    pub fn has_previous(&self) -> bool {
        false
    }

    pub fn next_pageable(&self) -> Pageable {
        if self.has_next() {
            Pageable::Paged(self.request.next())
        } else {
            Pageable::Unpaged
        }
    }

    pub fn previous_pageable(&self) -> Pageable {
        Pageable::Unpaged
    }

    /// Convert the content, keeping paging metadata
    pub fn map<U, F: FnMut(E) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            request: self.request,
            total: self.total,
        }
    }
}
