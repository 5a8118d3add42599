use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{Embedder, FunctionSpec, Selection, Selector, UpstreamError, Vision};

/// A scripted selector for tests. Returns pre-defined outcomes in order.
///
/// `Err` entries hold the message of an [`UpstreamError::Other`].
pub struct MockSelector {
    outcomes: Vec<Result<Selection, String>>,
    index: AtomicUsize,
    seen: Mutex<Vec<(String, Vec<String>)>>,
}

impl MockSelector {
    pub fn new(outcomes: Vec<Result<Selection, String>>) -> Self {
        Self {
            outcomes,
            index: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Convenience: a selector that always picks `name` with `arguments` once.
    pub fn selecting(name: &str, arguments: &str) -> Self {
        Self::new(vec![Ok(Selection {
            name: name.to_string(),
            arguments: arguments.to_string(),
        })])
    }

    /// Convenience: a selector whose only call fails.
    pub fn failing(message: &str) -> Self {
        Self::new(vec![Err(message.to_string())])
    }

    /// Tasks received so far, each with the function names it was offered.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Selector for MockSelector {
    async fn select(
        &self,
        task: &str,
        manifest: &[FunctionSpec],
    ) -> Result<Selection, UpstreamError> {
        self.seen.lock().unwrap().push((
            task.to_string(),
            manifest.iter().map(|f| f.name.clone()).collect(),
        ));

        let i = self.index.fetch_add(1, Ordering::SeqCst);
        match self.outcomes.get(i) {
            Some(Ok(selection)) => Ok(selection.clone()),
            Some(Err(message)) => Err(UpstreamError::Other(message.clone())),
            None => Err(UpstreamError::Other(format!(
                "MockSelector: no more outcomes (called {} times)",
                i + 1
            ))),
        }
    }
}

/// Returns a fixed reply for every image.
pub struct MockVision {
    reply: Result<String, String>,
}

impl MockVision {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
        }
    }
}

#[async_trait]
impl Vision for MockVision {
    async fn read_image(
        &self,
        _prompt: &str,
        _image: &[u8],
        _mime: &str,
    ) -> Result<String, UpstreamError> {
        self.reply.clone().map_err(UpstreamError::Other)
    }
}

/// Looks embeddings up by exact text. Unknown texts get a zero vector.
pub struct MockEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dims: usize,
}

impl MockEmbedder {
    pub fn new(vectors: Vec<(&str, Vec<f32>)>) -> Self {
        let dims = vectors.first().map(|(_, v)| v.len()).unwrap_or(0);
        Self {
            vectors: vectors
                .into_iter()
                .map(|(text, v)| (text.to_string(), v))
                .collect(),
            dims,
        }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, UpstreamError> {
        Ok(inputs
            .iter()
            .map(|text| {
                self.vectors
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| vec![0.0; self.dims])
            })
            .collect())
    }
}
