//! Reusable inputs: saved URL bundles and the document library.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::UserId;

// ─── URL bundles ─────────────────────────────────────────────────────────────

/// A named, reusable set of URLs owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceBundle {
  pub bundle_id:   Uuid,
  pub created_at:  DateTime<Utc>,
  pub user_id:     UserId,
  pub name:        String,
  pub description: Option<String>,
  pub urls:        Vec<String>,
}

/// Editable fields of a [`SourceBundle`]; used for both create and update.
#[derive(Debug, Clone, Deserialize)]
pub struct BundleFields {
  pub name:        String,
  pub description: Option<String>,
  #[serde(default)]
  pub urls:        Vec<String>,
}

// ─── Documents ───────────────────────────────────────────────────────────────

/// Payload of a library document: a stored file reference or pasted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DocumentBody {
  File {
    /// Opaque id issued by the blob storage that holds the bytes.
    storage_id: String,
    file_name:  String,
    file_size:  u64,
  },
  Text {
    content: String,
  },
}

impl DocumentBody {
  pub fn file_name(&self) -> Option<&str> {
    match self {
      Self::File { file_name, .. } => Some(file_name),
      Self::Text { .. } => None,
    }
  }

  pub fn text(&self) -> Option<&str> {
    match self {
      Self::File { .. } => None,
      Self::Text { content } => Some(content),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
  pub document_id: Uuid,
  pub created_at:  DateTime<Utc>,
  pub user_id:     UserId,
  pub body:        DocumentBody,
}
