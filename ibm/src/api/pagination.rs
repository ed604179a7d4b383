//! Paginated listing and name to identifier resolution
//!
//! VPC collections are paged with an opaque `start` cursor carried in the
//! `next.href` link. Pages are fetched one after another, in server order,
//! until a page comes back without a cursor. A failed page aborts the walk:
//! no partial result is returned and nothing is retried here (the client
//! already retried the transport).

use super::common::Link;
use super::error::ApiError;
use std::future::Future;

/// Page size hint sent as `limit`
pub const DEFAULT_PAGE_LIMIT: u32 = 50;

/// Largest page the API accepts
pub const MAX_PAGE_LIMIT: u32 = 100;

/// One page of a collection
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Cursor for the following page; absent or empty on the last one
    pub next: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next: Option<&Link>) -> Self {
        Self {
            items,
            next: next.and_then(Link::start),
        }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Items that can be looked up by name
pub trait Named {
    /// Noun used in "no <kind> found" errors
    const KIND: &'static str;

    fn name(&self) -> Option<&str>;

    fn id(&self) -> Option<&str>;
}

/// Fetches every page, passing each page's cursor to the next call
pub async fn collect_all<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, ApiError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch(cursor.take()).await?;
        pages += 1;
        items.extend(page.items);

        match page.next.filter(|next| !next.is_empty()) {
            Some(next) => {
                tracing::debug!("following page cursor {} (page {})", next, pages + 1);
                cursor = Some(next);
            }
            None => break,
        }
    }

    tracing::debug!("collected {} items over {} pages", items.len(), pages);
    Ok(items)
}

/// Returns the first item, in server order, whose name equals `name` exactly
pub async fn find_by_name<T, F, Fut>(name: &str, fetch: F) -> Result<T, ApiError>
where
    T: Named,
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    collect_all(fetch)
        .await?
        .into_iter()
        .find(|item| item.name() == Some(name))
        .ok_or_else(|| ApiError::NotFound {
            kind: T::KIND.to_string(),
            name: name.to_string(),
        })
}

/// Resolves a name to the identifier of the first matching item
pub async fn resolve_by_name<T, F, Fut>(name: &str, fetch: F) -> Result<String, ApiError>
where
    T: Named,
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, ApiError>>,
{
    let item = find_by_name(name, fetch).await?;
    item.id().map(str::to_string).ok_or_else(|| {
        ApiError::Parse(format!("{} {} has no id", T::KIND, name))
    })
}
