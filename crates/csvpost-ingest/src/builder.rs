//! Turns mapped records into sanitized post requests

use crate::model::{CategoryId, PostRequest, PostStatus, Record};
use crate::sanitize::FieldSanitizer;
use crate::schedule::schedule_utc;
use crate::store::ContentStore;
use csvpost_common::config::{
    ImportConfig, FIELD_CATEGORY, FIELD_CONTENT, FIELD_POST_DATE, FIELD_TAGS, FIELD_TITLE,
};
use csvpost_common::logging::ImportLogger;
use csvpost_common::Result;
use std::collections::BTreeMap;

/// Builds one [`PostRequest`] per record.
///
/// Category resolution talks to the store before the post exists, so a
/// category may be created even when the post insert later fails.
pub struct PostRequestBuilder<'a> {
    config: &'a ImportConfig,
    sanitizer: &'a FieldSanitizer,
    store: &'a dyn ContentStore,
    logger: &'a ImportLogger,
}

impl<'a> PostRequestBuilder<'a> {
    pub fn new(
        config: &'a ImportConfig,
        sanitizer: &'a FieldSanitizer,
        store: &'a dyn ContentStore,
        logger: &'a ImportLogger,
    ) -> Self {
        Self {
            config,
            sanitizer,
            store,
            logger,
        }
    }

    pub fn build(&self, record: &Record) -> Result<PostRequest> {
        let raw_date = record.get(FIELD_POST_DATE).unwrap_or_default();
        let (parsed, scheduled_utc) = schedule_utc(raw_date, &self.config.time_zone)?;
        self.logger.debug(format!(
            "Line {}: post date '{}' read as {}, scheduled at {}",
            record.line,
            raw_date,
            parsed.format.label(),
            scheduled_utc.to_rfc3339()
        ));

        let title = self
            .store
            .sanitize_plain_text(record.get(FIELD_TITLE).unwrap_or_default());
        let content = self
            .store
            .sanitize_rich_html(record.get(FIELD_CONTENT).unwrap_or_default());

        let category_slug = record.non_empty(FIELD_CATEGORY).map(str::to_string);
        let category_id = category_slug
            .as_deref()
            .and_then(|slug| self.resolve_category(slug));

        let tags = record
            .non_empty(FIELD_TAGS)
            .map(split_tags)
            .unwrap_or_default();

        Ok(PostRequest {
            title,
            content,
            status: PostStatus::Future,
            author_id: self.config.author_id,
            scheduled_local: parsed.local,
            scheduled_utc,
            category_slug,
            category_id,
            tags,
            custom_field_values: self.custom_field_values(record),
        })
    }

    fn resolve_category(&self, slug: &str) -> Option<CategoryId> {
        match self.store.resolve_or_create_category(slug) {
            Ok(id) => Some(id),
            Err(e) => {
                self.logger
                    .error(format!("Error creating category '{}': {}", slug, e));
                None
            },
        }
    }

    fn custom_field_values(&self, record: &Record) -> BTreeMap<String, String> {
        let mut values = BTreeMap::new();

        for name in self.config.schema.custom() {
            if let Some(value) = record.non_empty(name) {
                values.insert(name.clone(), self.sanitizer.dispatch(value, self.store));
            }
        }

        for (name, value) in &record.custom_fields {
            values.insert(name.clone(), self.store.sanitize_plain_text(value));
        }

        values
    }
}

/// Split a comma separated tag list, dropping blank entries
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
