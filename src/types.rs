use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A study material as returned by the API, with the owner's username attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub file_url: String,
    pub file_type: String,
    pub uploaded_by: i64,
    pub uploaded_by_username: Option<String>,
    pub tags: Vec<String>,
    pub created_at: String,
}

/// Raw row shape; `tags` is stored as a JSON array in a TEXT column.
#[derive(Debug, sqlx::FromRow)]
pub struct MaterialRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub subject: String,
    pub file_url: String,
    pub file_type: String,
    pub uploaded_by: i64,
    pub uploaded_by_username: Option<String>,
    pub tags: String,
    pub created_at: String,
}

impl MaterialRow {
    pub fn into_material(self) -> Material {
        let tags: Vec<String> = serde_json::from_str(&self.tags).unwrap_or_default();
        Material {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            title: self.title,
            description: self.description,
            subject: self.subject,
            file_url: self.file_url,
            file_type: self.file_type,
            uploaded_by: self.uploaded_by,
            uploaded_by_username: self.uploaded_by_username,
            tags,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Splits a CSV tag string into trimmed, non-empty tags.
/// `"a, b ,c"` becomes `["a", "b", "c"]`.
pub fn normalize_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(|tag| tag.to_string())
        .collect()
}
