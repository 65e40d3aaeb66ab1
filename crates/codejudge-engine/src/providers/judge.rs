//! Secondary-judge interface and the chat-provider adapter.
//!
//! The judge gets everything the pipeline derived -- both sources, both
//! three-address listings, both histograms, and the logic report -- and
//! answers with a structured legitimacy judgment. [`ChatJudge`] speaks the
//! OpenAI-compatible chat-completions shape in JSON mode; any provider
//! exposing that surface works through the same adapter.

use serde::{Deserialize, Serialize};
use serde_json::json;

use codejudge_tac::{NormalizedProgram, OpHistogram};

use crate::error::EngineError;
use crate::logic::LogicReport;

/// Everything the judge sees.
pub struct JudgeContext<'a> {
    pub language: &'a str,
    pub reference_source: &'a str,
    pub candidate_source: &'a str,
    pub reference_tac: &'a NormalizedProgram,
    pub candidate_tac: &'a NormalizedProgram,
    pub reference_ops: &'a OpHistogram,
    pub candidate_ops: &'a OpHistogram,
    pub logic: &'a LogicReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Pass,
    Fail,
}

/// A structured second opinion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Judgment {
    pub is_legitimate: bool,
    /// 0..=100; clamped on parse.
    pub confidence: u32,
    pub reason: String,
    #[serde(default)]
    pub detailed_analysis: String,
    #[serde(default)]
    pub cheating_indicators: Vec<String>,
    pub recommendation: Recommendation,
}

#[allow(async_fn_in_trait)]
pub trait SecondaryJudge {
    async fn judge(&self, context: &JudgeContext<'_>) -> Result<Judgment, EngineError>;
}

/// Provider selection for [`ChatJudge`].
#[derive(Debug, Clone)]
pub enum JudgeProvider {
    OpenRouter { api_base_url: Option<String> },
    OpenAiCompatible { api_base_url: String },
}

impl JudgeProvider {
    fn base_url(&self) -> String {
        match self {
            JudgeProvider::OpenRouter { api_base_url } => api_base_url
                .clone()
                .unwrap_or_else(|| "https://openrouter.ai/api/v1".to_string()),
            JudgeProvider::OpenAiCompatible { api_base_url } => api_base_url.clone(),
        }
    }
}

const SYSTEM_PROMPT: &str = "You are a strict programming-assignment reviewer. You receive a \
reference solution and a student submission with their compiler-derived \
three-address code. Decide whether the submission legitimately implements \
the algorithm or games the expected output (hardcoded constants, \
input-pattern matching). Answer with a single JSON object with keys: \
is_legitimate (bool), confidence (0-100), reason (string), \
detailed_analysis (string), cheating_indicators (array of strings), \
recommendation (\"PASS\" or \"FAIL\").";

/// OpenAI-compatible chat-completions judge.
pub struct ChatJudge {
    provider: JudgeProvider,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl ChatJudge {
    pub fn new(provider: JudgeProvider, api_key: impl Into<String>, model: impl Into<String>) -> Self {
        ChatJudge {
            provider,
            api_key: api_key.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    fn build_prompt(context: &JudgeContext<'_>) -> String {
        format!(
            "Language: {language}\n\n\
             Reference solution:\n```\n{reference}\n```\n\n\
             Student submission:\n```\n{candidate}\n```\n\n\
             Reference TAC:\n{reference_tac}\n\n\
             Submission TAC:\n{candidate_tac}\n\n\
             Reference operation counts: {reference_ops}\n\
             Submission operation counts: {candidate_ops}\n\n\
             Logic check: {logic}\n",
            language = context.language,
            reference = context.reference_source,
            candidate = context.candidate_source,
            reference_tac = context.reference_tac.listing(),
            candidate_tac = context.candidate_tac.listing(),
            reference_ops = serde_json::to_string(context.reference_ops).unwrap_or_default(),
            candidate_ops = serde_json::to_string(context.candidate_ops).unwrap_or_default(),
            logic = serde_json::to_string(context.logic).unwrap_or_default(),
        )
    }
}

impl SecondaryJudge for ChatJudge {
    async fn judge(&self, context: &JudgeContext<'_>) -> Result<Judgment, EngineError> {
        let endpoint = format!(
            "{}/chat/completions",
            self.provider.base_url().trim_end_matches('/')
        );
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": Self::build_prompt(context) },
            ],
            "response_format": { "type": "json_object" },
        });

        let response = self
            .client
            .post(endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|err| EngineError::JudgeUnavailable(format!("judge request failed: {}", err)))?;

        let status = response.status();
        let body_text = response.text().await.map_err(|err| {
            EngineError::JudgeUnavailable(format!("judge response read failed: {}", err))
        })?;

        if !status.is_success() {
            return Err(EngineError::JudgeUnavailable(format!(
                "judge request failed ({}): {}",
                status, body_text
            )));
        }

        let parsed: ChatResponse = serde_json::from_str(&body_text).map_err(|err| {
            EngineError::JudgeUnavailable(format!("judge envelope parse failed: {}", err))
        })?;
        let content = parsed
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                EngineError::JudgeUnavailable("judge response missing assistant content".to_string())
            })?;

        parse_judgment(&content)
    }
}

/// Parses the judge's raw text into a [`Judgment`].
///
/// The assistant content is expected to be a JSON object, possibly wrapped
/// in a Markdown code fence. Anything else is `JudgeMalformed`, with the
/// raw text preserved for the token-scan fallback.
pub fn parse_judgment(raw: &str) -> Result<Judgment, EngineError> {
    let unfenced = strip_code_fence(raw.trim());
    match serde_json::from_str::<Judgment>(unfenced) {
        Ok(mut judgment) => {
            judgment.confidence = judgment.confidence.min(100);
            Ok(judgment)
        }
        Err(_) => Err(EngineError::JudgeMalformed {
            raw: raw.to_string(),
        }),
    }
}

/// Low-confidence judgment recovered from unstructured judge text: a
/// mention of "legitimate" or "correct" reads as a pass, anything else as
/// a fail, both at confidence 50.
pub fn fallback_judgment(raw: &str) -> Judgment {
    let lower = raw.to_lowercase();
    let legitimate = lower.contains("legitimate") || lower.contains("correct");
    Judgment {
        is_legitimate: legitimate,
        confidence: 50,
        reason: "judge response was not valid JSON; decided by token scan".to_string(),
        detailed_analysis: String::new(),
        cheating_indicators: Vec::new(),
        recommendation: if legitimate {
            Recommendation::Pass
        } else {
            Recommendation::Fail
        },
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .map(str::trim_end)
        .unwrap_or(text)
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}
