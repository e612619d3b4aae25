//! Page loading and HTML region extraction.

use std::borrow::Cow;
use std::time::Duration;

use reqwest::blocking::Client;
use scraper::{node::Node, ElementRef, Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::document::{SourceDocument, SourceMetadata};
use crate::error::{RagError, Result};

/// User agent sent with every page fetch.
pub const USER_AGENT: &str = concat!("pyfaq-rag/", env!("CARGO_PKG_VERSION"));

/// Pulls the text of a named structural region out of an HTML document.
#[derive(Clone)]
pub struct RegionExtractor {
    region: Selector,
    title: Selector,
}

impl RegionExtractor {
    /// Builds an extractor keeping only content matched by the CSS `region` selector.
    pub fn new(region: &str) -> Result<Self> {
        let parsed = Selector::parse(region)
            .map_err(|err| RagError::config(format!("invalid region selector {region:?}: {err}")))?;
        let title = Selector::parse("title")
            .map_err(|err| RagError::config(format!("invalid title selector: {err}")))?;
        Ok(Self {
            region: parsed,
            title,
        })
    }

    /// Extracts the region text of `html` into a document attributed to `source_url`.
    ///
    /// Text of every outermost matching element is concatenated in document order. A page
    /// without a matching element produces an empty document.
    pub fn extract(&self, source_url: &str, html: &str) -> SourceDocument {
        let document = Html::parse_document(html);

        let mut raw = String::new();
        for region in document.select(&self.region) {
            if self.has_matching_ancestor(region) {
                continue;
            }
            append_text(region, &mut raw);
        }

        let title = document
            .select(&self.title)
            .next()
            .map(|el| collapse_whitespace(&el.text().collect::<String>()))
            .filter(|title| !title.is_empty());
        let language = document
            .root_element()
            .value()
            .attr("lang")
            .map(|lang| lang.trim().to_string())
            .filter(|lang| !lang.is_empty());

        SourceDocument {
            text: collapse_blank_lines(&raw),
            metadata: SourceMetadata {
                source_url: source_url.to_string(),
                title,
                language,
            },
        }
    }

    fn has_matching_ancestor(&self, element: ElementRef<'_>) -> bool {
        element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| self.region.matches(&ancestor))
    }
}

/// Fetches pages over HTTP and extracts their configured region.
pub struct WebLoader {
    client: Client,
    extractor: RegionExtractor,
}

impl WebLoader {
    /// Builds a loader that keeps the `region` selector and gives up on a page after `timeout`.
    pub fn new(region: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|err| RagError::config(format!("failed to build page HTTP client: {err}")))?;
        Ok(Self {
            client,
            extractor: RegionExtractor::new(region)?,
        })
    }

    /// Loads every URL in order. The first failure aborts the whole load.
    pub fn load(&self, urls: &[Url]) -> Result<Vec<SourceDocument>> {
        let mut documents = Vec::with_capacity(urls.len());
        for url in urls {
            documents.push(self.load_one(url)?);
        }
        info!(pages = documents.len(), "loaded source pages");
        Ok(documents)
    }

    fn load_one(&self, url: &Url) -> Result<SourceDocument> {
        debug!(%url, "fetching page");
        let response = self
            .client
            .get(url.as_str())
            .send()
            .map_err(|err| RagError::fetch(url.as_str(), err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RagError::fetch(url.as_str(), format!("server returned {status}")));
        }
        let body = response
            .bytes()
            .map_err(|err| RagError::fetch(url.as_str(), err))?;

        let (decoded, lossy) = decode_body(&body);
        if lossy {
            warn!(%url, "page body was not valid UTF-8; decoded lossily");
        }
        let document = self.extractor.extract(url.as_str(), &decoded);
        if document.text.is_empty() {
            warn!(%url, "no text found inside the configured region");
        }
        debug!(%url, chars = document.char_len(), "extracted page text");
        Ok(document)
    }
}

fn decode_body(bytes: &[u8]) -> (Cow<'_, str>, bool) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (Cow::Borrowed(text), false),
        Err(_) => (Cow::Owned(String::from_utf8_lossy(bytes).into_owned()), true),
    }
}

fn append_text(region: ElementRef<'_>, out: &mut String) {
    for node in region.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| matches!(el.name(), "script" | "style" | "template" | "noscript"))
        });
        if !hidden {
            out.push_str(text);
        }
    }
}

fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trims every line and folds runs of blank lines into one.
fn collapse_blank_lines(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_blank = false;
    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if pending_blank {
                out.push('\n');
            }
        }
        out.push_str(line);
        pending_blank = false;
    }
    out
}
