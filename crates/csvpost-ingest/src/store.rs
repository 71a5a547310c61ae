//! Content store interface
//!
//! The importer never persists anything itself. Posts, categories and
//! metadata go through [`ContentStore`], which also owns the text, HTML and
//! URL cleaning rules of the system of record.

use crate::model::{CategoryId, PostId, PostRequest};
use crate::sanitize::{sanitize_url, HtmlSanitizer};
use csvpost_common::{CsvPostError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// System of record for imported posts
pub trait ContentStore: Send + Sync {
    /// Create a scheduled post and return its id
    fn create_post(&self, request: &PostRequest) -> Result<PostId>;

    /// Find a category by exact slug, creating it when absent
    fn resolve_or_create_category(&self, slug: &str) -> Result<CategoryId>;

    /// Attach a metadata value to a post
    fn set_meta(&self, post_id: PostId, key: &str, value: &str) -> Result<()>;

    fn sanitize_plain_text(&self, value: &str) -> String;

    /// Clean post body HTML
    fn sanitize_rich_html(&self, value: &str) -> String;

    /// Clean a URL; an empty string means the URL was rejected
    fn validate_url(&self, value: &str) -> String;
}

impl<S: ContentStore + ?Sized> ContentStore for Arc<S> {
    fn create_post(&self, request: &PostRequest) -> Result<PostId> {
        (**self).create_post(request)
    }

    fn resolve_or_create_category(&self, slug: &str) -> Result<CategoryId> {
        (**self).resolve_or_create_category(slug)
    }

    fn set_meta(&self, post_id: PostId, key: &str, value: &str) -> Result<()> {
        (**self).set_meta(post_id, key, value)
    }

    fn sanitize_plain_text(&self, value: &str) -> String {
        (**self).sanitize_plain_text(value)
    }

    fn sanitize_rich_html(&self, value: &str) -> String {
        (**self).sanitize_rich_html(value)
    }

    fn validate_url(&self, value: &str) -> String {
        (**self).validate_url(value)
    }
}

/// A post held by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredPost {
    pub id: PostId,
    #[serde(flatten)]
    pub request: PostRequest,
    pub meta: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct MemoryState {
    posts: BTreeMap<PostId, StoredPost>,
    categories: BTreeMap<String, CategoryId>,
    next_post_id: PostId,
    next_category_id: CategoryId,
}

/// Thread-safe in-memory store
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    html: HtmlSanitizer,
}

impl MemoryStore {
    pub fn new() -> Result<Self> {
        Ok(Self {
            state: Mutex::new(MemoryState::default()),
            html: HtmlSanitizer::new()?,
        })
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All posts in creation order
    pub fn posts(&self) -> Vec<StoredPost> {
        self.state().posts.values().cloned().collect()
    }

    pub fn post(&self, id: PostId) -> Option<StoredPost> {
        self.state().posts.get(&id).cloned()
    }

    /// Categories by slug
    pub fn categories(&self) -> BTreeMap<String, CategoryId> {
        self.state().categories.clone()
    }

    pub fn post_count(&self) -> usize {
        self.state().posts.len()
    }
}

impl ContentStore for MemoryStore {
    fn create_post(&self, request: &PostRequest) -> Result<PostId> {
        if request.title.trim().is_empty() && request.content.trim().is_empty() {
            return Err(CsvPostError::store(
                "create_post",
                "Content and title are empty",
            ));
        }

        let mut state = self.state();
        state.next_post_id += 1;
        let id = state.next_post_id;
        state.posts.insert(
            id,
            StoredPost {
                id,
                request: request.clone(),
                meta: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    fn resolve_or_create_category(&self, slug: &str) -> Result<CategoryId> {
        if slug.trim().is_empty() {
            return Err(CsvPostError::store(
                "resolve_or_create_category",
                "Category slug is empty",
            ));
        }

        let mut state = self.state();
        if let Some(&id) = state.categories.get(slug) {
            return Ok(id);
        }
        state.next_category_id += 1;
        let id = state.next_category_id;
        state.categories.insert(slug.to_string(), id);
        Ok(id)
    }

    fn set_meta(&self, post_id: PostId, key: &str, value: &str) -> Result<()> {
        let mut state = self.state();
        let post = state.posts.get_mut(&post_id).ok_or_else(|| {
            CsvPostError::store("set_meta", format!("Post {} does not exist", post_id))
        })?;
        post.meta.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn sanitize_plain_text(&self, value: &str) -> String {
        self.html.plain_text(value)
    }

    fn sanitize_rich_html(&self, value: &str) -> String {
        self.html.rich_html(value)
    }

    fn validate_url(&self, value: &str) -> String {
        sanitize_url(value)
    }
}
