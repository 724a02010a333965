use uuid::Uuid;

pub type Id = String;

/// Sequential identifier of a content record within its category
pub type Identifier = i64;

/// Identifier of one in-progress editing session
pub type SessionId = String;

pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}

/// Normalize a category name the way it is keyed in storage
pub fn normalize_category(category: &str) -> Option<String> {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_lowercase())
}

/// Object storage folder for assets uploaded while drafting `category/id`
pub fn draft_folder(category: &str, id: Option<Identifier>) -> String {
    match id {
        Some(id) => format!("{}/{}", category, id),
        None => format!("{}/unassigned", category),
    }
}
