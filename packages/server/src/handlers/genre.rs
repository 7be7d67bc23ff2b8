use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{genre, title_genre};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Caller;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::catalog::*;
use crate::policy::{Action, Capabilities};
use crate::state::AppState;
use crate::utils::catalog::{ensure_slug_free, find_by_slug, list_entries, slug_write_error};

#[utoipa::path(
    get,
    path = "/",
    tag = "Genres",
    operation_id = "listGenres",
    summary = "List genres",
    description = "Returns all genres ordered by ID. `search` filters by a case-insensitive name substring.",
    params(CatalogListQuery),
    responses(
        (status = 200, description = "List of genres", body = Vec<CatalogEntryResponse>),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_genres(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CatalogListQuery>,
) -> Result<Json<Vec<CatalogEntryResponse>>, AppError> {
    let rows = list_entries::<genre::Entity, _>(
        &state.db,
        genre::Column::Name,
        genre::Column::Id,
        query.search.as_deref(),
    )
    .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Genres",
    operation_id = "createGenre",
    summary = "Create a genre",
    description = "Admin only. Slugs are unique.",
    request_body = CreateCatalogEntryRequest,
    responses(
        (status = 201, description = "Genre created", body = CatalogEntryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(slug = %payload.slug))]
pub async fn create_genre(
    caller: Caller,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCatalogEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Action::ManageCatalog)?;
    validate_catalog_entry(&payload)?;

    ensure_slug_free::<genre::Entity, _>(&state.db, genre::Column::Slug, "Genre", &payload.slug)
        .await?;

    let new_genre = genre::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        slug: Set(payload.slug.clone()),
        ..Default::default()
    };
    let model = new_genre
        .insert(&state.db)
        .await
        .map_err(|e| slug_write_error(e, "Genre", &payload.slug))?;

    Ok((StatusCode::CREATED, Json(CatalogEntryResponse::from(model))))
}

#[utoipa::path(
    delete,
    path = "/{slug}",
    tag = "Genres",
    operation_id = "deleteGenre",
    summary = "Delete a genre",
    description = "Admin only. The genre is removed from every title that carried it.",
    params(("slug" = String, Path, description = "Genre slug")),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Genre not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(slug))]
pub async fn delete_genre(
    caller: Caller,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Action::ManageCatalog)?;

    let txn = state.db.begin().await?;

    let existing =
        find_by_slug::<genre::Entity, _>(&txn, genre::Column::Slug, "Genre", &slug).await?;

    title_genre::Entity::delete_many()
        .filter(title_genre::Column::GenreId.eq(existing.id))
        .exec(&txn)
        .await?;

    genre::Entity::delete_by_id(existing.id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
