use std::env;
use std::time::Duration;

use practice_core::SetId;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;

/// Connection settings for the remote practice backend.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `PRACTICE_API_URL`, with `PRACTICE_API_TIMEOUT_SECS`
    /// optionally overriding the request timeout. An unset or blank URL
    /// means the backend is simply not configured, which is not an error.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("PRACTICE_API_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let mut config = Self::new(base_url);
        if let Some(secs) = env::var("PRACTICE_API_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        Some(config)
    }
}

/// Result of judging submitted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeVerdict {
    pub correct: bool,
    pub verdict: String,
    pub log: Option<String>,
    pub suggestions: Option<String>,
}

/// Client for the remote judge/hint/answer/translate endpoints.
///
/// Every call carries an explicit timeout; judging user code in
/// particular can hang far longer than a request should be allowed to.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    config: Option<ApiConfig>,
}

impl ApiClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ApiConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<ApiConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Submit `code` for the given problem and return the verdict.
    ///
    /// A wrong answer is a successful call; only transport problems,
    /// backend rejections, and a disabled backend are errors.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the backend is not configured or the
    /// request fails.
    pub async fn judge(
        &self,
        set_id: &SetId,
        practice_idx: usize,
        code: &str,
        user_output: Option<&str>,
    ) -> Result<JudgeVerdict, ApiError> {
        let payload = JudgeRequest {
            data_id: set_id.as_str(),
            practice_idx,
            code,
            user_output,
        };
        let body: JudgeResponse = self.post("judge", &payload).await?;
        let fallback = if body.ok { "correct" } else { "wrong" };
        Ok(JudgeVerdict {
            correct: body.ok,
            verdict: body.verdict.unwrap_or_else(|| fallback.to_owned()),
            log: body.log,
            suggestions: body.suggestions,
        })
    }

    /// Ask for a hint on a problem, given the user's current code.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the backend is not configured, the request
    /// fails, or no hint comes back.
    pub async fn hint(&self, problem_id: &str, user_code: &str) -> Result<String, ApiError> {
        let body: HintResponse = self
            .post(
                "hint",
                &HintRequest {
                    problem_id,
                    user_code,
                },
            )
            .await?;
        if !body.ok {
            return Err(ApiError::Rejected("hint request was declined".into()));
        }
        non_empty(body.hint)
    }

    /// Fetch the reference solution for a problem.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the backend is not configured, the request
    /// fails, or no solution comes back.
    pub async fn answer(&self, problem_id: &str) -> Result<String, ApiError> {
        let body: AnswerResponse = self.post("answer", &AnswerRequest { problem_id }).await?;
        if !body.ok {
            return Err(ApiError::Rejected("answer request was declined".into()));
        }
        non_empty(body.answer)
    }

    /// Translate `text` between languages.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the backend is not configured, the request
    /// fails, or the translation is empty.
    pub async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, ApiError> {
        let body: TranslateResponse = self
            .post(
                "translate",
                &TranslateRequest {
                    text,
                    source_lang,
                    target_lang,
                    temperature: 0.2,
                },
            )
            .await?;
        if !body.ok {
            return Err(ApiError::Rejected("translation was declined".into()));
        }
        non_empty(body.translation)
    }

    async fn post<Req, Resp>(&self, path: &str, payload: &Req) -> Result<Resp, ApiError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let config = self.config.as_ref().ok_or(ApiError::Disabled)?;
        let url = format!("{}/{path}", config.base_url.trim_end_matches('/'));
        debug!(target: "api", %url, "Calling practice backend");

        let response = self
            .client
            .post(url)
            .timeout(config.timeout)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Backend errors carry {"detail": ...} or {"error": ...}.
            if let Ok(body) = response.json::<ErrorBody>().await {
                if let Some(message) = body.into_message() {
                    return Err(ApiError::Rejected(message));
                }
            }
            return Err(ApiError::HttpStatus(status));
        }

        Ok(response.json().await?)
    }
}

fn non_empty(value: Option<String>) -> Result<String, ApiError> {
    value
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
        .ok_or(ApiError::EmptyResponse)
}

#[derive(Debug, Serialize)]
struct JudgeRequest<'a> {
    data_id: &'a str,
    practice_idx: usize,
    code: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_output: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct HintRequest<'a> {
    problem_id: &'a str,
    user_code: &'a str,
}

#[derive(Debug, Serialize)]
struct AnswerRequest<'a> {
    problem_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateRequest<'a> {
    text: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct JudgeResponse {
    ok: bool,
    #[serde(default)]
    verdict: Option<String>,
    #[serde(default)]
    log: Option<String>,
    #[serde(default)]
    suggestions: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HintResponse {
    ok: bool,
    #[serde(default)]
    hint: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnswerResponse {
    ok: bool,
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    ok: bool,
    #[serde(default)]
    translation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> Option<String> {
        self.detail.or(self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn judge_request_omits_missing_user_output() {
        let payload = JudgeRequest {
            data_id: "algo1",
            practice_idx: 2,
            code: "print(1)",
            user_output: None,
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"data_id": "algo1", "practice_idx": 2, "code": "print(1)"})
        );
    }

    #[test]
    fn translate_request_uses_camel_case_lang_fields() {
        let payload = TranslateRequest {
            text: "hello",
            source_lang: "en",
            target_lang: "zh-TW",
            temperature: 0.2,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["sourceLang"], "en");
        assert_eq!(value["targetLang"], "zh-TW");
        assert_eq!(value["text"], "hello");
    }

    #[test]
    fn error_body_prefers_detail() {
        let both: ErrorBody =
            serde_json::from_value(json!({"detail": "d", "error": "e"})).unwrap();
        assert_eq!(both.into_message().as_deref(), Some("d"));

        let error_only: ErrorBody = serde_json::from_value(json!({"error": "e"})).unwrap();
        assert_eq!(error_only.into_message().as_deref(), Some("e"));
    }

    #[test]
    fn config_defaults_are_applied() {
        let config = ApiConfig::new("http://localhost:8000/");
        assert_eq!(config.timeout, ApiConfig::DEFAULT_TIMEOUT);

        let config = config.with_timeout(Duration::from_secs(5));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }
}
