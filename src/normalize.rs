//! Response shape normalization.
//!
//! The service answers in several JSON shapes depending on endpoint and mode.
//! A [`Normalizer`] runs an ordered chain of [`ShapeRule`]s over the parsed
//! body; the first rule that recognizes the shape decides which URLs are
//! ready and which still need polling. New shapes are supported by adding a
//! rule, without touching call sites.

use crate::error::{Result, StudioError};
use crate::operations::OperationRequest;
use serde::Serialize;
use serde_json::Value;

/// What the caller asked for, as far as normalization is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NormalizeContext {
    /// Whether the submission was synchronous.
    pub sync: bool,
    /// Requested result count, if the operation takes one.
    pub requested: Option<usize>,
}

impl NormalizeContext {
    /// Builds the context for a submitted request.
    pub fn for_request(request: &OperationRequest) -> Self {
        Self {
            sync: request.is_sync(),
            requested: request.requested_results(),
        }
    }

    /// Synchronous context with no count limit.
    pub fn sync() -> Self {
        Self {
            sync: true,
            requested: None,
        }
    }

    /// Asynchronous context with no count limit.
    pub fn pending() -> Self {
        Self {
            sync: false,
            requested: None,
        }
    }

    /// Limits the number of URLs collected.
    pub fn with_requested(mut self, n: usize) -> Self {
        self.requested = Some(n);
        self
    }

    fn split(&self, urls: Vec<String>) -> (Vec<String>, Vec<String>) {
        if self.sync {
            (urls, Vec::new())
        } else {
            (Vec::new(), urls)
        }
    }
}

/// URLs extracted by a matching rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    /// URLs whose content is available now.
    pub ready: Vec<String>,
    /// URLs that must be polled.
    pub pending: Vec<String>,
}

/// One recognizable response shape.
pub trait ShapeRule: Send + Sync {
    /// Name recorded on the result when this rule matches.
    fn name(&self) -> &'static str;

    /// Returns `Some` if the response has this rule's shape.
    fn extract(&self, raw: &Value, ctx: &NormalizeContext) -> Option<Extracted>;
}

fn string_items(items: &[Value]) -> impl Iterator<Item = String> + '_ {
    items.iter().filter_map(Value::as_str).map(str::to_string)
}

/// `{"result_url": "..."}`: a single final URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultUrl;

impl ShapeRule for ResultUrl {
    fn name(&self) -> &'static str {
        "result_url"
    }

    fn extract(&self, raw: &Value, _ctx: &NormalizeContext) -> Option<Extracted> {
        let url = raw.get("result_url")?.as_str()?;
        Some(Extracted {
            ready: vec![url.to_string()],
            pending: Vec::new(),
        })
    }
}

/// `{"result_urls": [...]}`: final URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultUrls;

impl ShapeRule for ResultUrls {
    fn name(&self) -> &'static str {
        "result_urls"
    }

    fn extract(&self, raw: &Value, _ctx: &NormalizeContext) -> Option<Extracted> {
        let items = raw.get("result_urls")?.as_array()?;
        Some(Extracted {
            ready: string_items(items).collect(),
            pending: Vec::new(),
        })
    }
}

/// `{"urls": [...]}`: final when synchronous, placeholders otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct Urls;

impl ShapeRule for Urls {
    fn name(&self) -> &'static str {
        "urls"
    }

    fn extract(&self, raw: &Value, ctx: &NormalizeContext) -> Option<Extracted> {
        let items = raw.get("urls")?.as_array()?;
        let limit = ctx.requested.unwrap_or(usize::MAX);
        let urls = string_items(items).take(limit).collect();
        let (ready, pending) = ctx.split(urls);
        Some(Extracted { ready, pending })
    }
}

/// `{"result": [{"urls": [...]}, [...], ...]}`: grouped URLs, truncated to
/// the requested count.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultGroups;

impl ShapeRule for ResultGroups {
    fn name(&self) -> &'static str {
        "result"
    }

    fn extract(&self, raw: &Value, ctx: &NormalizeContext) -> Option<Extracted> {
        let groups = raw.get("result")?.as_array()?;
        let limit = ctx.requested.unwrap_or(usize::MAX);

        let mut urls = Vec::new();
        for group in groups {
            if urls.len() >= limit {
                break;
            }
            match group {
                Value::Object(obj) => {
                    if let Some(items) = obj.get("urls").and_then(Value::as_array) {
                        urls.extend(string_items(items));
                    }
                }
                Value::Array(items) => urls.extend(string_items(items)),
                _ => {}
            }
        }
        urls.truncate(limit);

        let (ready, pending) = ctx.split(urls);
        Some(Extracted { ready, pending })
    }
}

/// Normalized outcome of any operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalResult {
    /// URLs whose content is available now, in response order.
    pub ready_urls: Vec<String>,
    /// URLs that must be polled, in response order.
    pub pending_urls: Vec<String>,
    /// The unmodified response body.
    pub raw: Value,
    /// Name of the rule that recognized the response.
    pub shape: Option<&'static str>,
}

impl CanonicalResult {
    /// Wraps a response no rule recognized.
    pub fn unrecognized(raw: Value) -> Self {
        Self {
            ready_urls: Vec::new(),
            pending_urls: Vec::new(),
            raw,
            shape: None,
        }
    }

    /// Returns true if some rule recognized the response.
    pub fn is_recognized(&self) -> bool {
        self.shape.is_some()
    }

    /// Returns true if there are URLs still to poll.
    pub fn has_pending(&self) -> bool {
        !self.pending_urls.is_empty()
    }

    /// First ready URL, for single-image displays.
    pub fn first_ready(&self) -> Option<&str> {
        self.ready_urls.first().map(String::as_str)
    }

    /// Converts an unrecognized response into [`StudioError::Normalization`].
    pub fn into_recognized(self) -> Result<Self> {
        if self.is_recognized() {
            Ok(self)
        } else {
            Err(StudioError::Normalization { raw: self.raw })
        }
    }
}

/// Ordered chain of shape rules; first match wins.
pub struct Normalizer {
    rules: Vec<Box<dyn ShapeRule>>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            rules: vec![
                Box::new(ResultUrl),
                Box::new(ResultUrls),
                Box::new(Urls),
                Box::new(ResultGroups),
            ],
        }
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| r.name()))
            .finish()
    }
}

impl Normalizer {
    /// Creates the default chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a chain with no rules.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Appends a rule with the lowest precedence.
    pub fn with_rule(mut self, rule: impl ShapeRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Inserts a rule at `index` (0 is highest precedence).
    pub fn insert_rule(&mut self, index: usize, rule: impl ShapeRule + 'static) {
        let index = index.min(self.rules.len());
        self.rules.insert(index, Box::new(rule));
    }

    /// Rule names in precedence order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Normalizes a response. Never fails; see [`CanonicalResult::into_recognized`].
    pub fn normalize(&self, raw: Value, ctx: &NormalizeContext) -> CanonicalResult {
        for rule in &self.rules {
            if let Some(extracted) = rule.extract(&raw, ctx) {
                tracing::debug!(
                    shape = rule.name(),
                    ready = extracted.ready.len(),
                    pending = extracted.pending.len(),
                    "normalized response"
                );
                return CanonicalResult {
                    ready_urls: extracted.ready,
                    pending_urls: extracted.pending,
                    raw,
                    shape: Some(rule.name()),
                };
            }
        }

        tracing::warn!("response matched no known shape");
        CanonicalResult::unrecognized(raw)
    }
}
