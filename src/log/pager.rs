//! Back/forward pagination over a forward-only log.
//!
//! The backend cannot iterate in reverse, so the pager keeps the cursors of
//! the pages already visited: `next` pushes the cursor of the page being left,
//! `prev` pops it.

use serde::Serialize;

use super::cursor::Cursor;
use super::reader::EventReader;
use crate::event::Event;

/// One rendered page of events
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// 1-based page number
    pub number: usize,
    /// Cursor the page was fetched from
    pub start: Cursor,
    /// Cursor after the last event on the page
    pub next: Cursor,
    pub events: Vec<Event>,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Caller-held pagination state
#[derive(Debug, Clone)]
pub struct Pager {
    page_size: usize,
    current: Cursor,
    back: Vec<Cursor>,
}

impl Pager {
    pub fn new(start: Cursor, page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current: start,
            back: Vec::new(),
        }
    }

    /// Pager positioned on the first page of the log
    pub fn from_origin(reader: &EventReader, page_size: usize) -> Self {
        Self::new(reader.origin(), page_size)
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Cursor of the page currently shown
    pub fn cursor(&self) -> Cursor {
        self.current
    }

    /// Re-read the current page
    pub fn current(&self, reader: &EventReader) -> Page {
        let (events, next) = reader.fetch(self.current, self.page_size);
        // One-event look-ahead; the event itself is not consumed
        let has_next = !events.is_empty() && !reader.fetch(next, 1).0.is_empty();
        Page {
            number: self.back.len() + 1,
            start: self.current,
            next,
            events,
            has_next,
            has_prev: !self.back.is_empty(),
        }
    }

    /// Advance one page if there is one; otherwise stay put
    pub fn next(&mut self, reader: &EventReader) -> Page {
        let page = self.current(reader);
        if !page.has_next {
            return page;
        }
        self.back.push(self.current);
        self.current = page.next;
        self.current(reader)
    }

    /// Go back one page; no-op on the first page
    pub fn prev(&mut self, reader: &EventReader) -> Page {
        if let Some(cursor) = self.back.pop() {
            self.current = cursor;
        }
        self.current(reader)
    }
}
