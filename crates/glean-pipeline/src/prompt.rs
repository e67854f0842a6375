//! Prompt assembly for the summarize and competitor-scan calls.

use chrono::{DateTime, Utc};
use glean_core::account::UserSettings;
use serde_json::{Value, json};

/// Separator placed between the markdown of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n---\n\n";

/// Characters of crawled content repeated in the extraction prompt.
pub const GROUNDING_CHARS: usize = 5000;

pub const INSIGHTS_SCHEMA_NAME: &str = "structured_insights";

/// System prompt used when the user has not set their own.
pub const DEFAULT_PERSONA: &str = "You work on a competitive intelligence team. \
You review current market trends from the articles and posts provided and lay \
out concrete suggestions for staying competitive. You are strictly honest: you \
never invent facts to produce the answer someone seems to want. Report the \
facts, then the suggestions that follow from them.";

const EXTRACTION_SYSTEM: &str = "You extract structured data from business \
summaries. Use only what the summary and source excerpt support.";

/// The user's custom prompt if set and non-blank, otherwise the default
/// persona.
pub fn system_prompt(settings: Option<&UserSettings>) -> String {
  settings
    .and_then(UserSettings::custom_prompt)
    .unwrap_or(DEFAULT_PERSONA)
    .to_owned()
}

/// Stage 1: free-text summary of the crawled content.
pub fn summary_prompt(content: &str, instructions: Option<&str>) -> String {
  let mut prompt = String::from(
    "Summarize the following material and lay out what it means for staying \
     competitive. Format the answer as markdown. Do not ask follow-up \
     questions. You may search the web for more context; cite a source for \
     every claim.\n\nCONTENT:\n",
  );
  prompt.push_str(content);

  if let Some(extra) = instructions.map(str::trim).filter(|s| !s.is_empty()) {
    prompt.push_str(
      "\n\n=== USER INSTRUCTIONS ===\n\
       Apply the following only to the focus and format of the summary.\n",
    );
    prompt.push_str(extra);
    prompt.push_str("\n=== END USER INSTRUCTIONS ===");
  }
  prompt
}

/// Stage 2: structured extraction grounded on the summary and a bounded
/// prefix of the source.
pub fn insights_prompt(summary: &str, content: &str) -> String {
  format!(
    "Extract structured insights from this summary.\n\nSUMMARY:\n{summary}\n\n\
     SOURCE EXCERPT:\n{}",
    char_prefix(content, GROUNDING_CHARS)
  )
}

/// Prompt for one competitor in a scheduled scan.
pub fn competitor_prompt(name: &str, last_scanned_on: Option<DateTime<Utc>>) -> String {
  let mut prompt = format!(
    "Lay out suggestions and ideas for staying competitive against the \
     company below. Format the answer as markdown. Do not ask follow-up \
     questions. You may search the web for more information; cite a source \
     for every claim.\n\nCompany name: {name}."
  );
  if let Some(since) = last_scanned_on {
    prompt.push_str(&format!(
      " The information must be newer than {}.",
      since.format("%Y-%m-%d %H:%M UTC")
    ));
  }
  prompt
}

/// JSON Schema the stage-2 output must satisfy.
pub fn insights_schema() -> Value {
  let strings = |description: &str| json!({
    "type": "array",
    "items": { "type": "string" },
    "description": description,
  });
  let bounded = |description: &str| json!({
    "type": "array",
    "items": { "type": "string" },
    "minItems": 3,
    "maxItems": 5,
    "description": description,
  });

  json!({
    "type": "object",
    "additionalProperties": false,
    "required": [
      "key_findings",
      "companies_mentioned",
      "action_items",
      "sentiment",
      "topics_identified"
    ],
    "properties": {
      "key_findings":        bounded("The most important findings"),
      "companies_mentioned": strings("Companies named in the material"),
      "action_items":        bounded("Concrete next steps"),
      "sentiment": {
        "type": "string",
        "enum": ["positive", "negative", "neutral", "mixed"],
        "description": "Overall tone of the material",
      },
      "topics_identified":   strings("Main topics covered"),
    }
  })
}

/// The first `max` characters of `s`, never splitting a code point.
pub fn char_prefix(s: &str, max: usize) -> &str {
  match s.char_indices().nth(max) {
    Some((idx, _)) => &s[..idx],
    None => s,
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use glean_core::account::UserId;

  use super::*;

  fn settings(prompt: Option<&str>) -> UserSettings {
    UserSettings {
      user_id:       UserId::from("u1"),
      system_prompt: prompt.map(str::to_owned),
      updated_at:    Utc::now(),
    }
  }

  #[test]
  fn blank_custom_prompt_falls_back_to_persona() {
    assert_eq!(system_prompt(None), DEFAULT_PERSONA);
    assert_eq!(system_prompt(Some(&settings(Some("   ")))), DEFAULT_PERSONA);
    assert_eq!(system_prompt(Some(&settings(Some("Be brief.")))), "Be brief.");
  }

  #[test]
  fn instructions_are_delimited() {
    let p = summary_prompt("page text", Some("focus on pricing"));
    let start = p.find("=== USER INSTRUCTIONS ===").unwrap();
    let end = p.find("=== END USER INSTRUCTIONS ===").unwrap();
    assert!(p[start..end].contains("focus on pricing"));
    assert!(p.find("page text").unwrap() < start);

    let bare = summary_prompt("page text", Some("  "));
    assert!(!bare.contains("USER INSTRUCTIONS"));
  }

  #[test]
  fn char_prefix_respects_code_points() {
    assert_eq!(char_prefix("héllo", 2), "hé");
    assert_eq!(char_prefix("abc", 10), "abc");
    let long = "ü".repeat(6000);
    assert_eq!(char_prefix(&long, GROUNDING_CHARS).chars().count(), GROUNDING_CHARS);
  }

  #[test]
  fn competitor_prompt_mentions_cutoff_only_when_scanned() {
    assert!(!competitor_prompt("Acme", None).contains("newer than"));
    let at = Utc.with_ymd_and_hms(2026, 9, 1, 16, 0, 0).unwrap();
    let p = competitor_prompt("Acme", Some(at));
    assert!(p.contains("Company name: Acme."));
    assert!(p.contains("newer than 2026-09-01 16:00 UTC"));
  }

  #[test]
  fn schema_enumerates_four_sentiments() {
    let schema = insights_schema();
    let values = schema["properties"]["sentiment"]["enum"].as_array().unwrap();
    assert_eq!(values.len(), 4);
    assert_eq!(schema["properties"]["key_findings"]["minItems"], 3);
  }
}
