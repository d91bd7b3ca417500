use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::config::JudgeConfig;
use crate::products::ProductFacts;
use crate::users::repo::UserProfile;

use super::{
    prompt, Judge, JudgeError, Ranking, RecommendationCandidate, Verdict, MAX_RECOMMENDATIONS,
};

/// Scoring is deterministic; ranking keeps a little freedom for phrasing.
const SCORE_TEMPERATURE: f32 = 0.0;
const RANK_TEMPERATURE: f32 = 0.2;

/// OpenAI chat-completions backed judge with structured (JSON schema)
/// output, so responses parse into [`Verdict`] and [`Ranking`] directly.
pub struct OpenAiJudge {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    temperature: f32,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
    json_schema: JsonSchemaSpec,
}

#[derive(Debug, Serialize)]
struct JsonSchemaSpec {
    name: &'static str,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

fn verdict_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "score": { "type": "integer", "minimum": 0, "maximum": 100 },
            "reasoning": { "type": "string" }
        },
        "required": ["score", "reasoning"],
        "additionalProperties": false
    })
}

fn ranking_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "recommendations": {
                "type": "array",
                "maxItems": MAX_RECOMMENDATIONS,
                "items": {
                    "type": "object",
                    "properties": {
                        "score": { "type": "integer", "minimum": 0, "maximum": 100 },
                        "reasoning": { "type": "string" },
                        "product_name": { "type": "string" },
                        "image_url": { "type": "string" },
                        "upc": { "type": "string" }
                    },
                    "required": ["score", "reasoning", "product_name", "image_url", "upc"],
                    "additionalProperties": false
                }
            },
            "summary": { "type": "string" }
        },
        "required": ["recommendations", "summary"],
        "additionalProperties": false
    })
}

impl OpenAiJudge {
    pub fn new(config: &JudgeConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("build judge http client")?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn request(
        &self,
        content: String,
        temperature: f32,
        schema_name: &'static str,
        schema: serde_json::Value,
    ) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            temperature,
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            response_format: ResponseFormat {
                kind: "json_schema",
                json_schema: JsonSchemaSpec {
                    name: schema_name,
                    strict: true,
                    schema,
                },
            },
        }
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, JudgeError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| JudgeError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "judge API returned an error");
            return Err(JudgeError::Request(format!(
                "judge API returned {status}: {body}"
            )));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| JudgeError::Malformed(format!("invalid completion envelope: {e}")))?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| JudgeError::Malformed("completion had no choices".into()))
    }
}

fn parse_verdict(content: &str) -> Result<Verdict, JudgeError> {
    let verdict: Verdict = serde_json::from_str(content)
        .map_err(|e| JudgeError::Malformed(format!("invalid verdict payload: {e}")))?;
    if !(0..=100).contains(&verdict.score) {
        return Err(JudgeError::Malformed(format!(
            "score {} outside 0-100",
            verdict.score
        )));
    }
    Ok(verdict)
}

fn parse_ranking(content: &str) -> Result<Ranking, JudgeError> {
    let ranking: Ranking = serde_json::from_str(content)
        .map_err(|e| JudgeError::Malformed(format!("invalid ranking payload: {e}")))?;
    if ranking.recommendations.len() > MAX_RECOMMENDATIONS {
        return Err(JudgeError::Malformed(format!(
            "{} recommendations, expected at most {MAX_RECOMMENDATIONS}",
            ranking.recommendations.len()
        )));
    }
    for rec in &ranking.recommendations {
        if !(0..=100).contains(&rec.score) {
            return Err(JudgeError::Malformed(format!(
                "recommendation score {} outside 0-100",
                rec.score
            )));
        }
    }
    Ok(ranking)
}

#[async_trait]
impl Judge for OpenAiJudge {
    async fn score(
        &self,
        profile: &UserProfile,
        facts: &ProductFacts,
    ) -> Result<Verdict, JudgeError> {
        let request = self.request(
            prompt::score_prompt(profile, facts),
            SCORE_TEMPERATURE,
            "health_verdict",
            verdict_schema(),
        );
        let content = self.complete(request).await?;
        let verdict = parse_verdict(&content)?;
        debug!(upc = %facts.upc, score = verdict.score, "product scored");
        Ok(verdict)
    }

    async fn rank(
        &self,
        profile: &UserProfile,
        candidates: &[RecommendationCandidate],
    ) -> Result<Ranking, JudgeError> {
        let request = self.request(
            prompt::ranking_prompt(profile, candidates),
            RANK_TEMPERATURE,
            "food_ranking",
            ranking_schema(),
        );
        let content = self.complete(request).await?;
        let ranking = parse_ranking(&content)?;
        debug!(
            candidates = candidates.len(),
            picks = ranking.recommendations.len(),
            "history ranked"
        );
        Ok(ranking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn judge_for(server: &MockServer) -> OpenAiJudge {
        OpenAiJudge::new(&JudgeConfig {
            api_key: "test-key".into(),
            model: "gpt-4o".into(),
            base_url: server.uri(),
            timeout_secs: 5,
        })
        .expect("build judge")
    }

    fn profile() -> UserProfile {
        UserProfile::default_for("scan@example.com")
    }

    fn facts() -> ProductFacts {
        ProductFacts {
            upc: "0123456789012".into(),
            product_name: Some("Crunchy Oat Granola".into()),
            ingredients_text: Some("oats, honey".into()),
            nutriscore_score: Some(1),
            nutriscore_grade: Some("b".into()),
            nova_group: Some(2),
            allergens: None,
        }
    }

    fn completion_with(content: &str) -> serde_json::Value {
        json!({
            "choices": [
                { "message": { "role": "assistant", "content": content } }
            ]
        })
    }

    #[test]
    fn verdict_parse_accepts_well_formed_content() {
        let verdict =
            parse_verdict(r#"{"score": 84, "reasoning": "Low sugar, whole grains."}"#)
                .expect("parse verdict");
        assert_eq!(verdict.score, 84);
        assert_eq!(verdict.reasoning, "Low sugar, whole grains.");
    }

    #[test]
    fn verdict_parse_rejects_out_of_range_score() {
        let err = parse_verdict(r#"{"score": 148, "reasoning": "??"}"#).unwrap_err();
        assert!(matches!(err, JudgeError::Malformed(_)));
        assert!(err.to_string().contains("148"));
    }

    #[test]
    fn verdict_parse_rejects_non_json_content() {
        let err = parse_verdict("the product is quite healthy").unwrap_err();
        assert!(matches!(err, JudgeError::Malformed(_)));
    }

    #[test]
    fn ranking_parse_rejects_more_than_three_picks() {
        let rec = r#"{"score": 80, "reasoning": "ok", "product_name": "X", "image_url": "u", "upc": "1"}"#;
        let content = format!(
            r#"{{"recommendations": [{rec}, {rec}, {rec}, {rec}], "summary": "too many"}}"#
        );
        let err = parse_ranking(&content).unwrap_err();
        assert!(matches!(err, JudgeError::Malformed(_)));
    }

    #[test]
    fn ranking_parse_rejects_bad_recommendation_score() {
        let content = r#"{"recommendations": [{"score": -5, "reasoning": "r", "product_name": "X", "image_url": "u", "upc": "1"}]}"#;
        let err = parse_ranking(content).unwrap_err();
        assert!(matches!(err, JudgeError::Malformed(_)));
    }

    #[test]
    fn ranking_parse_tolerates_missing_summary() {
        let content = r#"{"recommendations": []}"#;
        let ranking = parse_ranking(content).expect("parse ranking");
        assert!(ranking.summary.is_none());
        assert!(ranking.recommendations.is_empty());
    }

    #[tokio::test]
    async fn score_posts_structured_request_and_parses_verdict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "temperature": 0.0,
                "response_format": { "type": "json_schema" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_with(
                r#"{"score": 71, "reasoning": "Moderately processed but low in sugar."}"#,
            )))
            .mount(&server)
            .await;

        let judge = judge_for(&server);
        let verdict = judge.score(&profile(), &facts()).await.expect("score");
        assert_eq!(verdict.score, 71);
    }

    #[tokio::test]
    async fn rank_parses_structured_ranking() {
        let server = MockServer::start().await;
        let content = r#"{
            "recommendations": [
                {"score": 90, "reasoning": "Best fit.", "product_name": "Greek Yogurt",
                 "image_url": "https://img.example/yogurt.jpg", "upc": "111"}
            ],
            "summary": "Dairy-forward options suit this profile."
        }"#;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_with(content)))
            .mount(&server)
            .await;

        let judge = judge_for(&server);
        let candidates = vec![RecommendationCandidate {
            product_name: "Greek Yogurt".into(),
            upc: "111".into(),
            score: 82,
            image_url: "https://img.example/yogurt.jpg".into(),
            reasoning: "High protein.".into(),
        }];
        let ranking = judge.rank(&profile(), &candidates).await.expect("rank");
        assert_eq!(ranking.recommendations.len(), 1);
        assert_eq!(ranking.recommendations[0].upc, "111");
        assert_eq!(
            ranking.summary.as_deref(),
            Some("Dairy-forward options suit this profile.")
        );
    }

    #[tokio::test]
    async fn api_failure_is_a_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let judge = judge_for(&server);
        let err = judge.score(&profile(), &facts()).await.unwrap_err();
        assert!(matches!(err, JudgeError::Request(_)));
        assert!(err.to_string().contains("429"));
    }
}
