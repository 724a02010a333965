use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
};
use crate::model::EditorContext;

/// Axum extractor for EditorContext from request headers
///
/// - X-Editor-Id: editor identifier
/// - X-Editor-Email: optional editor email
/// - X-Editor-Name: optional display name, used as record author
///
/// Authentication is handled upstream; without headers a development editor is used.
#[async_trait]
impl<S> FromRequestParts<S> for EditorContext
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let headers = &parts.headers;

        if let Some(editor_id) = extract_header_value(headers, "x-editor-id") {
            let editor_email = extract_header_value(headers, "x-editor-email");
            let editor_name = extract_header_value(headers, "x-editor-name");

            Ok(EditorContext::with_details(editor_id, editor_email, editor_name))
        } else {
            Ok(EditorContext::default_editor())
        }
    }
}

/// Extract header value as string
fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
