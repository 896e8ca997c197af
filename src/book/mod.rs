//! Book and page model consumed by the page builder.
//!
//! A page's `content` string is the single source of truth between
//! sessions. The live canvas is a disposable materialization of it.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A book: ordered pages plus layout settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub title: String,
    pub pages: Vec<Page>,
    #[serde(default)]
    pub settings: BookSettings,
}

/// One page of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub number: u32,
    pub content: String,
    #[serde(default)]
    pub word_count: usize,
    /// Version stamped by the builder session that last wrote `content`.
    /// `None` means the content came from somewhere else.
    #[serde(skip)]
    pub revision: Option<u64>,
}

impl Page {
    pub fn new(id: impl Into<String>, number: u32, content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            id: id.into(),
            number,
            word_count: 0,
            content,
            revision: None,
        }
    }

    /// Replace content from outside the builder (import, raw edit, sync).
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.revision = None;
    }
}

impl Book {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Append a page with the next page number and return its index.
    pub fn add_page(&mut self, content: impl Into<String>) -> usize {
        let number = self.pages.len() as u32 + 1;
        self.pages
            .push(Page::new(format!("page-{number}"), number, content));
        self.pages.len() - 1
    }

    pub fn page(&self, index: usize) -> Result<&Page> {
        self.pages.get(index).ok_or(Error::PageOutOfRange(index))
    }

    pub fn page_mut(&mut self, index: usize) -> Result<&mut Page> {
        self.pages.get_mut(index).ok_or(Error::PageOutOfRange(index))
    }

    pub fn total_words(&self) -> usize {
        self.pages.iter().map(|p| p.word_count).sum()
    }

    /// Load a book from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Book-level layout settings. Pure configuration; the builder only reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookSettings {
    pub margins: Margins,
    pub page_numbering: PageNumbering,
    pub typography: Typography,
}

/// Page margins in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 20.0,
            bottom: 20.0,
            left: 20.0,
        }
    }
}

impl Margins {
    /// Millimetres to CSS pixels at 96 dpi.
    pub fn mm_to_px(mm: f64) -> f64 {
        mm * 96.0 / 25.4
    }

    pub fn top_px(&self) -> f64 {
        Self::mm_to_px(self.top)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NumberPosition {
    #[default]
    BottomCenter,
    BottomOutside,
    TopOutside,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberFormat {
    #[default]
    Arabic,
    Roman,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageNumbering {
    pub enabled: bool,
    pub position: NumberPosition,
    pub format: NumberFormat,
    pub start_at: u32,
}

impl Default for PageNumbering {
    fn default() -> Self {
        Self {
            enabled: true,
            position: NumberPosition::default(),
            format: NumberFormat::default(),
            start_at: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Typography {
    pub font_family: String,
    pub font_size: f64,
    pub line_height: f64,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            font_family: "Georgia, serif".to_string(),
            font_size: 12.0,
            line_height: 1.5,
        }
    }
}
