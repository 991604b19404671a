// Content payload: editorial pages (instructions, contact details) keyed by slug.

use serde::{Deserialize, Serialize};

use crate::error::NotLoaded;
use crate::loader::{Payload, RemoteDataLoader};
use crate::validate::{FieldKind, Shape};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentData {
    pub pages: Vec<ContentPage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentPage {
    pub slug: String,
    pub title: String,
    /// Page body as HTML.
    pub content: String,
    /// Last modification, unix seconds.
    pub modified: i64,
}

impl ContentPage {
    fn shape() -> Shape {
        Shape::new("ContentPage")
            .field("slug", FieldKind::String)
            .field("title", FieldKind::String)
            .field("content", FieldKind::String)
            .field("modified", FieldKind::Number)
    }
}

impl Payload for ContentData {
    const TYPE_NAME: &'static str = "ContentData";

    fn shape() -> Shape {
        Shape::new(Self::TYPE_NAME).array_of("pages", ContentPage::shape)
    }
}

pub type ContentLoader = RemoteDataLoader<ContentData>;

impl RemoteDataLoader<ContentData> {
    pub fn pages(&self) -> Result<Vec<ContentPage>, NotLoaded> {
        self.read(|d| d.pages.clone())
    }

    pub fn page(&self, slug: &str) -> Result<Option<ContentPage>, NotLoaded> {
        self.read(|d| d.pages.iter().find(|p| p.slug == slug).cloned())
    }

    /// The HTML body of the page with the given slug.
    pub fn content(&self, slug: &str) -> Result<Option<String>, NotLoaded> {
        Ok(self.page(slug)?.map(|p| p.content))
    }
}
