//! OpenAI-compatible classifier adapter.

use std::fs;
use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{Classification, ClassifyError, Classifier, ConstructionPhase};

pub const DEFAULT_CLASSIFIER_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_CLASSIFIER_MODEL: &str = "gpt-4o";

const SYSTEM_PROMPT: &str = "You classify the construction phase of the building at the centre \
of a satellite image. Ignore neighbouring structures.\n\
GROUNDWORKS: cleared or excavated ground, earth-moving machinery, no visible foundation or frame.\n\
CONSTRUCTION: structural frame, partial walls or roof, cranes or scaffolding, the footprint of the \
building is recognisable but unfinished.\n\
COMPLETE: finished roof and walls, landscaping, paved or marked parking, no construction equipment \
or stockpiled material.\n\
Describe the ground, structure and activity you observe, check the phase against all of them, then \
answer with the phase, a confidence from 0 to 100 and your reasoning.";

const USER_PROMPT: &str =
    "Classify the construction phase of the site in this satellite image and explain why.";

/// Settings for [`HttpClassifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_CLASSIFIER_ENDPOINT.to_string(),
            model: DEFAULT_CLASSIFIER_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Classifier backed by a chat completions endpoint.
///
/// The image is sent inline as a base64 data URL and the answer is requested
/// through a strict JSON schema, so the reply can be parsed without any
/// free-text scraping.
pub struct HttpClassifier {
    client: reqwest::blocking::Client,
    config: ClassifierConfig,
}

impl HttpClassifier {
    pub fn new(config: ClassifierConfig) -> Result<Self, ClassifyError> {
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(ClassifyError::MissingApiKey);
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClassifyError::Http(format!("failed to create client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }
}

impl Classifier for HttpClassifier {
    fn classify(&self, image_path: &Path) -> Result<Classification, ClassifyError> {
        let jpeg = fs::read(image_path).map_err(|source| ClassifyError::Io {
            path: image_path.to_path_buf(),
            source,
        })?;
        let body = completion_request(&self.config.model, &jpeg);

        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        let response = request
            .send()
            .map_err(|e| ClassifyError::Http(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| ClassifyError::Http(format!("failed to read response: {}", e)))?;
        if !status.is_success() {
            return Err(ClassifyError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let classification = parse_completion(&text)?;
        debug!(
            image = %image_path.display(),
            phase = %classification.phase,
            confidence = classification.confidence,
            "classified composite"
        );
        Ok(classification)
    }
}

/// Builds the chat completions request body for one JPEG.
pub(crate) fn completion_request(model: &str, jpeg: &[u8]) -> Value {
    let data_url = format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg));
    json!({
        "model": model,
        "temperature": 0,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            {
                "role": "user",
                "content": [
                    { "type": "text", "text": USER_PROMPT },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }
        ],
        "response_format": {
            "type": "json_schema",
            "json_schema": {
                "name": "construction_phase",
                "strict": true,
                "schema": {
                    "type": "object",
                    "properties": {
                        "building_construction_phase": {
                            "type": "string",
                            "enum": ["GROUNDWORKS", "CONSTRUCTION", "COMPLETE"]
                        },
                        "confidence_level": { "type": "integer" },
                        "reasoning": { "type": "string" }
                    },
                    "required": ["building_construction_phase", "confidence_level", "reasoning"],
                    "additionalProperties": false
                }
            }
        }
    })
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Deserialize)]
struct PhaseAnswer {
    building_construction_phase: ConstructionPhase,
    confidence_level: i64,
    reasoning: String,
}

/// Extracts the classification from a chat completions response body.
pub(crate) fn parse_completion(body: &str) -> Result<Classification, ClassifyError> {
    let completion: Completion =
        serde_json::from_str(body).map_err(|e| ClassifyError::Response(e.to_string()))?;
    let message = completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| ClassifyError::Response("no choices in response".to_string()))?;

    if let Some(refusal) = message.refusal {
        return Err(ClassifyError::Response(format!("model refused: {}", refusal)));
    }
    let content = message
        .content
        .ok_or_else(|| ClassifyError::Response("empty message content".to_string()))?;
    let answer: PhaseAnswer =
        serde_json::from_str(&content).map_err(|e| ClassifyError::Response(e.to_string()))?;

    Ok(Classification::new(
        answer.building_construction_phase,
        answer.confidence_level,
        answer.reasoning,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(content: &str) -> String {
        json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
            .to_string()
    }

    #[test]
    fn test_request_embeds_image_as_data_url() {
        let body = completion_request("gpt-4o", &[0xFF, 0xD8, 0xFF]);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["temperature"], 0);
        let url = body["messages"][1]["content"][1]["image_url"]["url"]
            .as_str()
            .unwrap();
        assert_eq!(url, "data:image/jpeg;base64,/9j/");
        assert_eq!(body["response_format"]["type"], "json_schema");
    }

    #[test]
    fn test_parse_completion() {
        let body = completion(
            r#"{"building_construction_phase":"CONSTRUCTION","confidence_level":85,"reasoning":"crane on site"}"#,
        );
        let classification = parse_completion(&body).unwrap();
        assert_eq!(classification.phase, ConstructionPhase::Construction);
        assert_eq!(classification.confidence, 85);
        assert_eq!(classification.reasoning, "crane on site");
    }

    #[test]
    fn test_parse_completion_rejects_unknown_phase() {
        let body = completion(
            r#"{"building_construction_phase":"DEMOLISHED","confidence_level":50,"reasoning":""}"#,
        );
        assert!(matches!(
            parse_completion(&body),
            Err(ClassifyError::Response(_))
        ));
    }

    #[test]
    fn test_parse_completion_refusal() {
        let body = json!({
            "choices": [{ "message": { "content": null, "refusal": "cannot help" } }]
        })
        .to_string();
        assert!(parse_completion(&body).is_err());
    }

    #[test]
    fn test_parse_completion_without_choices() {
        assert!(parse_completion(r#"{"choices":[]}"#).is_err());
        assert!(parse_completion("not json").is_err());
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(
            HttpClassifier::new(ClassifierConfig::default()),
            Err(ClassifyError::MissingApiKey)
        ));
    }

    #[test]
    fn test_missing_image_file() {
        let classifier = HttpClassifier::new(ClassifierConfig {
            api_key: Some("key".to_string()),
            ..ClassifierConfig::default()
        })
        .unwrap();
        let result = classifier.classify(Path::new("/nonexistent/composite.jpg"));
        assert!(matches!(result, Err(ClassifyError::Io { .. })));
    }
}
