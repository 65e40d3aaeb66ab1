//! IR producer interface and adapters.

use std::collections::HashMap;

use serde_json::json;

use codejudge_ast::Language;

use crate::error::EngineError;

/// Produces SSA-form textual IR for one source program.
///
/// A failing production may either return `Err` or a diagnostic text whose
/// lines start with the IR comment marker; the normalizer tolerates the
/// latter as an empty program.
#[allow(async_fn_in_trait)]
pub trait IrProducer {
    async fn produce_ir(&self, language: Language, source: &str) -> Result<String, EngineError>;
}

/// Client for a hosted compile endpoint that returns LLVM-style IR text.
///
/// The endpoint contract is `POST {base}/ir` with a JSON body
/// `{"language": "...", "source": "..."}`; a 2xx response body is the IR
/// text verbatim.
pub struct RemoteCompiler {
    base_url: String,
    client: reqwest::Client,
}

impl RemoteCompiler {
    pub fn new(base_url: impl Into<String>) -> Self {
        RemoteCompiler {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

impl IrProducer for RemoteCompiler {
    async fn produce_ir(&self, language: Language, source: &str) -> Result<String, EngineError> {
        let endpoint = format!("{}/ir", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(endpoint)
            .json(&json!({ "language": language.tag(), "source": source }))
            .send()
            .await
            .map_err(|err| EngineError::IrUnavailable(format!("compile request failed: {}", err)))?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            EngineError::IrUnavailable(format!("compile response read failed: {}", err))
        })?;

        if !status.is_success() {
            return Err(EngineError::IrUnavailable(format!(
                "compile request failed ({}): {}",
                status, body
            )));
        }
        Ok(body)
    }
}

/// Preset IR keyed by exact source text, for offline runs and tests.
#[derive(Debug, Default)]
pub struct FixedIrProducer {
    by_source: HashMap<String, String>,
}

impl FixedIrProducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, ir: impl Into<String>) {
        self.by_source.insert(source.into(), ir.into());
    }

    pub fn with(mut self, source: impl Into<String>, ir: impl Into<String>) -> Self {
        self.insert(source, ir);
        self
    }
}

impl IrProducer for FixedIrProducer {
    async fn produce_ir(&self, _language: Language, source: &str) -> Result<String, EngineError> {
        self.by_source
            .get(source)
            .cloned()
            .ok_or_else(|| EngineError::IrUnavailable("no preset IR for source".to_string()))
    }
}
