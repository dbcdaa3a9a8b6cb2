//! Stimulus catalog: category name → stimulus items.
//!
//! Items are either plain words or image file names; images resolve to a
//! static URL for the page to load. The catalog is read-only for the
//! scheduler.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const IMAGE_SUFFIXES: [&str; 3] = [".png", ".jpg", ".jpeg"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StimulusCatalog {
    categories: BTreeMap<String, Vec<String>>,
}

impl StimulusCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(categories: BTreeMap<String, Vec<String>>) -> Self {
        Self { categories }
    }

    pub fn insert(&mut self, category: impl Into<String>, items: Vec<String>) {
        self.categories.insert(category.into(), items);
    }

    pub fn items(&self, category: &str) -> &[String] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First item of a category, resolved. Page-facing surface: the task
    /// page shows it as the corner thumbnail next to the category label;
    /// nothing inside the engine consumes it.
    pub fn thumbnail(&self, category: &str) -> Option<String> {
        self.items(category).first().map(|item| resolve(item))
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

pub fn is_image(item: &str) -> bool {
    IMAGE_SUFFIXES.iter().any(|s| item.ends_with(s))
}

/// Resolve a catalog item to what the client displays: a static URL for
/// images, the literal text otherwise.
pub fn resolve(item: &str) -> String {
    if is_image(item) {
        format!("/static/images/{item}")
    } else {
        item.to_string()
    }
}
