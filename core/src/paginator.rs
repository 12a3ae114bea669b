//! Offset/limit pagination over any list-shaped call.
//!
//! # Design
//! `Paginator` wraps a `fetch(limit, offset)` closure and knows nothing about
//! the resource behind it. Enumeration is lazy: a page is requested only when
//! the previous one has been fully yielded. The sequence ends at the first
//! empty page or the first page shorter than `limit`, which means a final page
//! of exactly `limit` records costs one extra (empty) request. The remote
//! service relies on this contract, so it is kept as is.
//!
//! There is intentionally no `count`: the service reports no total, and the
//! only way to learn the size is to enumerate everything (`all`).

use crate::error::ApiError;

pub const DEFAULT_LIMIT: u32 = 10;

/// Records returned by one fetch, with the limit they were requested with.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub requested_limit: u32,
}

impl<T> Page<T> {
    /// `true` when no further page should be requested.
    pub fn is_last(&self) -> bool {
        self.records.is_empty() || self.records.len() < self.requested_limit as usize
    }
}

pub struct Paginator<F> {
    fetch: F,
    limit: u32,
    offset: u32,
}

impl<T, F> Paginator<F>
where
    F: FnMut(u32, u32) -> Result<Vec<T>, ApiError>,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    /// Page size. Values below 1 are raised to 1.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Offset the enumeration starts from.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Lazy sequence of records, starting again from the configured offset on
    /// every call. A fetch error is yielded once and ends the sequence.
    pub fn iter(&mut self) -> Records<'_, T, F> {
        Records {
            fetch: &mut self.fetch,
            limit: self.limit,
            offset: self.offset,
            current: Vec::new().into_iter(),
            done: false,
        }
    }

    /// The first `n` records, fetching no page past the one holding record `n`.
    pub fn first(&mut self, n: usize) -> Result<Vec<T>, ApiError> {
        self.iter().take(n).collect()
    }

    /// A single record fetched with `limit = 1`.
    pub fn first_one(&mut self) -> Result<Option<T>, ApiError> {
        let records = (self.fetch)(1, self.offset)?;
        Ok(records.into_iter().next())
    }

    /// One direct fetch of page `number` (1-based), independent of `iter`.
    pub fn page(&mut self, number: u32, per_page: u32) -> Result<Vec<T>, ApiError> {
        let offset = number.saturating_sub(1).saturating_mul(per_page);
        (self.fetch)(per_page, offset)
    }

    /// Enumerate everything.
    pub fn all(&mut self) -> Result<Vec<T>, ApiError> {
        self.iter().collect()
    }
}

/// Iterator returned by `Paginator::iter`.
pub struct Records<'a, T, F> {
    fetch: &'a mut F,
    limit: u32,
    offset: u32,
    current: std::vec::IntoIter<T>,
    done: bool,
}

impl<T, F> Iterator for Records<'_, T, F>
where
    F: FnMut(u32, u32) -> Result<Vec<T>, ApiError>,
{
    type Item = Result<T, ApiError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.current.next() {
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }
            let page = match (self.fetch)(self.limit, self.offset) {
                Ok(records) => Page {
                    records,
                    requested_limit: self.limit,
                },
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            };
            match self.offset.checked_add(self.limit) {
                Some(next) if !page.is_last() => self.offset = next,
                // Short page, or no offset left to ask for.
                _ => self.done = true,
            }
            self.current = page.records.into_iter();
        }
    }
}
