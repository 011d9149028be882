use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, TeacherUser},
    state::AppState,
    types::{normalize_tags, Material, MaterialRow, MessageResponse},
};

const MATERIAL_COLUMNS: &str = r#"m.id, m.title, m.description, m.subject, m.file_url,
       m.file_type, m.uploaded_by, u.username AS uploaded_by_username, m.tags, m.created_at"#;

/// POST /api/materials/upload
///
/// Teachers upload a single file plus metadata as multipart form data:
/// `file` (required), `title` (required), `subject` (required), `description`
/// and `tags` (CSV, optional). Responds 201 with the persisted material.
pub async fn upload_material(
    State(state): State<AppState>,
    TeacherUser(claims): TeacherUser,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let mut title: Option<String> = None;
    let mut description = String::new();
    let mut subject: Option<String> = None;
    let mut tags: Vec<String> = Vec::new();
    let mut file_name: Option<String> = None;
    let mut file_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        match field.name().unwrap_or("") {
            "title" => title = Some(read_text(field).await?),
            "description" => description = read_text(field).await?,
            "subject" => subject = Some(read_text(field).await?),
            "tags" => tags = normalize_tags(&read_text(field).await?),
            "file" => {
                if file_bytes.is_some() {
                    return Err(AppError::BadRequest(
                        "Only one file may be uploaded per request".into(),
                    ));
                }
                file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;
                file_bytes = Some(bytes.to_vec());
            }
            _ => continue,
        }
    }

    let title = require_field(title, "title")?;
    let subject = require_field(subject, "subject")?;
    let file_name = file_name.ok_or_else(|| AppError::BadRequest("Missing file upload".into()))?;
    let file_bytes =
        file_bytes.ok_or_else(|| AppError::BadRequest("Missing file upload".into()))?;

    let stored = state.uploads.save(&file_name, &file_bytes).await?;

    // Mirror the verified caller into the users table so listings can attach
    // the uploader's username.
    sqlx::query(
        r#"INSERT INTO users (id, username, role) VALUES (?1, ?2, ?3)
           ON CONFLICT(id) DO UPDATE SET username = excluded.username, role = excluded.role"#,
    )
    .bind(claims.sub)
    .bind(&claims.username)
    .bind(claims.role.as_str())
    .execute(&state.db)
    .await?;

    let id = Uuid::new_v4();
    let created_at = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    let tags_json = serde_json::to_string(&tags).unwrap_or_else(|_| "[]".into());

    sqlx::query(
        r#"INSERT INTO materials
           (id, title, description, subject, file_url, file_type, uploaded_by, tags, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
    )
    .bind(id.to_string())
    .bind(&title)
    .bind(&description)
    .bind(&subject)
    .bind(&stored.url)
    .bind(&stored.file_type)
    .bind(claims.sub)
    .bind(&tags_json)
    .bind(&created_at)
    .execute(&state.db)
    .await?;

    tracing::info!("Material {} uploaded by user {} ({})", id, claims.sub, claims.username);

    let material = Material {
        id,
        title,
        description,
        subject,
        file_url: stored.url,
        file_type: stored.file_type,
        uploaded_by: claims.sub,
        uploaded_by_username: Some(claims.username),
        tags,
        created_at,
    };
    Ok((StatusCode::CREATED, Json(material)).into_response())
}

/// GET /api/materials
///
/// All materials, newest first, with the owner's username attached.
pub async fn list_materials(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
) -> AppResult<Json<Vec<Material>>> {
    let rows: Vec<MaterialRow> = sqlx::query_as(&format!(
        r#"SELECT {MATERIAL_COLUMNS}
           FROM materials m LEFT JOIN users u ON u.id = m.uploaded_by
           ORDER BY m.created_at DESC"#
    ))
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(MaterialRow::into_material).collect()))
}

/// GET /api/materials/subject/{subject}
///
/// Materials whose subject matches the path parameter exactly, newest first.
pub async fn list_materials_by_subject(
    State(state): State<AppState>,
    AuthUser(_claims): AuthUser,
    Path(subject): Path<String>,
) -> AppResult<Json<Vec<Material>>> {
    let rows: Vec<MaterialRow> = sqlx::query_as(&format!(
        r#"SELECT {MATERIAL_COLUMNS}
           FROM materials m LEFT JOIN users u ON u.id = m.uploaded_by
           WHERE m.subject = ?1
           ORDER BY m.created_at DESC"#
    ))
    .bind(&subject)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(rows.into_iter().map(MaterialRow::into_material).collect()))
}

/// DELETE /api/materials/{id}
///
/// Deletes a material owned by the calling teacher. The delete is scoped to the
/// caller's own uploads, so an existing record owned by someone else reads as
/// 404 rather than leaking its existence.
pub async fn delete_material(
    State(state): State<AppState>,
    TeacherUser(claims): TeacherUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let result = sqlx::query("DELETE FROM materials WHERE id = ?1 AND uploaded_by = ?2")
        .bind(id.to_string())
        .bind(claims.sub)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Material not found".into()));
    }

    tracing::info!("Material {} deleted by user {}", id, claims.sub);
    Ok(Json(MessageResponse { message: "Material deleted successfully".into() }))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart field: {}", e)))
}

fn require_field(value: Option<String>, name: &str) -> AppResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::ValidationError {
            field: name.to_string(),
            message: "is required".to_string(),
        }),
    }
}
