//! Continuation-token paging.
//!
//! Listings are exposed as a [`Pager`] that fetches one page per call and can
//! be rewound to the first page, plus [`collect_all`] for callers that want
//! the whole sequence at once.

use async_trait::async_trait;

use crate::transport::BoxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    async fn fetch_page(&self, token: Option<String>) -> Result<Page<Self::Item>, BoxError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Start,
    Next(String),
    Exhausted,
}

pub struct Pager<'a, S: PageSource + ?Sized> {
    source: &'a S,
    cursor: Cursor,
}

impl<'a, S: PageSource + ?Sized> Pager<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            cursor: Cursor::Start,
        }
    }

    /// Fetches the next page, or `None` once the last page has been returned.
    pub async fn next_page(&mut self) -> Result<Option<Vec<S::Item>>, BoxError> {
        let token = match &self.cursor {
            Cursor::Start => None,
            Cursor::Next(token) => Some(token.clone()),
            Cursor::Exhausted => return Ok(None),
        };

        let page = self.source.fetch_page(token).await?;
        self.cursor = match page.next_token {
            Some(token) if !token.is_empty() => Cursor::Next(token),
            _ => Cursor::Exhausted,
        };
        Ok(Some(page.items))
    }

    pub fn restart(&mut self) {
        self.cursor = Cursor::Start;
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor == Cursor::Exhausted
    }
}

pub async fn collect_all<S: PageSource + ?Sized>(source: &S) -> Result<Vec<S::Item>, BoxError> {
    let mut pager = Pager::new(source);
    let mut items = Vec::new();
    while let Some(page) = pager.next_page().await? {
        items.extend(page);
    }
    Ok(items)
}
