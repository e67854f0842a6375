//! Language model backed by an OpenAI Responses-compatible API.

use std::time::Duration;

use glean_core::collab::{LanguageModel, ObjectRequest, TextRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
  pub base_url: String,
  pub api_key:  String,
  pub timeout:  Duration,
}

/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenAiClient {
  client: Client,
  config: OpenAiConfig,
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
  model:        &'a str,
  instructions: &'a str,
  input:        &'a str,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  tools:        Vec<Tool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  text:         Option<TextConfig<'a>>,
}

#[derive(Debug, Serialize)]
struct Tool {
  #[serde(rename = "type")]
  kind: &'static str,
}

#[derive(Debug, Serialize)]
struct TextConfig<'a> {
  format: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
  #[serde(rename = "type")]
  kind:   &'static str,
  name:   &'a str,
  schema: &'a Value,
  strict: bool,
}

#[derive(Debug, Deserialize)]
struct ResponsesResponse {
  #[serde(default)]
  output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
  #[serde(default)]
  content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
  #[serde(rename = "type")]
  kind: String,
  text: Option<String>,
}

/// Concatenate every `output_text` part. Tool calls (web search) appear as
/// output items without such parts and are skipped.
fn output_text(resp: ResponsesResponse) -> Result<String> {
  let text: String = resp
    .output
    .into_iter()
    .flat_map(|item| item.content)
    .filter(|part| part.kind == "output_text")
    .filter_map(|part| part.text)
    .collect();

  if text.trim().is_empty() {
    return Err(Error::EmptyOutput);
  }
  Ok(text)
}

// ─── Client ──────────────────────────────────────────────────────────────────

impl OpenAiClient {
  pub fn new(config: OpenAiConfig) -> Result<Self> {
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  fn url(&self) -> String {
    format!("{}/v1/responses", self.config.base_url.trim_end_matches('/'))
  }

  async fn respond(&self, request: &ResponsesRequest<'_>) -> Result<String> {
    let resp = self
      .client
      .post(self.url())
      .bearer_auth(&self.config.api_key)
      .json(request)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status {
        service: "openai",
        status:  status.as_u16(),
        body:    resp.text().await.unwrap_or_default(),
      });
    }

    let body: ResponsesResponse = resp.json().await?;
    output_text(body)
  }
}

impl LanguageModel for OpenAiClient {
  type Error = Error;

  async fn generate_text(&self, request: TextRequest) -> Result<String> {
    let tools = if request.web_search {
      vec![Tool { kind: "web_search" }]
    } else {
      Vec::new()
    };
    self
      .respond(&ResponsesRequest {
        model: &request.model,
        instructions: &request.system,
        input: &request.prompt,
        tools,
        text: None,
      })
      .await
  }

  async fn generate_object(&self, request: ObjectRequest) -> Result<Value> {
    let text = self
      .respond(&ResponsesRequest {
        model:        &request.model,
        instructions: &request.system,
        input:        &request.prompt,
        tools:        Vec::new(),
        text:         Some(TextConfig {
          format: JsonSchemaFormat {
            kind:   "json_schema",
            name:   &request.schema_name,
            schema: &request.schema,
            strict: true,
          },
        }),
      })
      .await?;
    Ok(serde_json::from_str(&text)?)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn output_text_skips_tool_calls() {
    let resp: ResponsesResponse = serde_json::from_value(json!({
      "id": "resp_1",
      "output": [
        { "type": "web_search_call", "id": "ws_1", "status": "completed" },
        {
          "type": "message",
          "role": "assistant",
          "content": [
            { "type": "output_text", "text": "## Summary\n", "annotations": [] },
            { "type": "output_text", "text": "Prices fell." }
          ]
        }
      ]
    }))
    .unwrap();
    assert_eq!(output_text(resp).unwrap(), "## Summary\nPrices fell.");
  }

  #[test]
  fn refusal_only_is_empty_output() {
    let resp: ResponsesResponse = serde_json::from_value(json!({
      "output": [{
        "type": "message",
        "content": [{ "type": "refusal", "refusal": "no" }]
      }]
    }))
    .unwrap();
    assert!(matches!(output_text(resp), Err(Error::EmptyOutput)));
  }

  #[test]
  fn structured_request_carries_strict_schema() {
    let schema = json!({ "type": "object" });
    let req = ResponsesRequest {
      model:        "gpt-4o-mini",
      instructions: "sys",
      input:        "prompt",
      tools:        Vec::new(),
      text:         Some(TextConfig {
        format: JsonSchemaFormat {
          kind:   "json_schema",
          name:   "structured_insights",
          schema: &schema,
          strict: true,
        },
      }),
    };
    let v = serde_json::to_value(&req).unwrap();
    assert!(v.get("tools").is_none());
    assert_eq!(v["text"]["format"]["type"], "json_schema");
    assert_eq!(v["text"]["format"]["name"], "structured_insights");
    assert_eq!(v["text"]["format"]["strict"], true);
  }

  #[test]
  fn web_search_tool_serializes_by_type() {
    let req = ResponsesRequest {
      model:        "gpt-4o-mini",
      instructions: "sys",
      input:        "prompt",
      tools:        vec![Tool { kind: "web_search" }],
      text:         None,
    };
    let v = serde_json::to_value(&req).unwrap();
    assert_eq!(v["tools"], json!([{ "type": "web_search" }]));
    assert!(v.get("text").is_none());
  }
}
