use serde::{Deserialize, Serialize};

use crate::tools::search::SearchHit;

/// A retrieved web page as handed to the ranking and prompting stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "pageContent")]
    pub page_content: String,
    pub metadata: DocumentMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_src: Option<String>,
}

impl Document {
    pub fn new(
        page_content: impl Into<String>,
        title: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: DocumentMetadata {
                title: title.into(),
                url: url.into(),
                img_src: None,
            },
        }
    }

    pub fn has_content(&self) -> bool {
        !self.page_content.is_empty()
    }
}

impl From<SearchHit> for Document {
    fn from(hit: SearchHit) -> Self {
        Self {
            page_content: hit.content.unwrap_or_default(),
            metadata: DocumentMetadata {
                title: hit.title,
                url: hit.url,
                img_src: hit.img_src.filter(|src| !src.is_empty()),
            },
        }
    }
}
