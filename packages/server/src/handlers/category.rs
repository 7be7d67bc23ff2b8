use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, title};
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
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List categories",
    description = "Returns all categories ordered by ID. `search` filters by a case-insensitive name substring.",
    params(CatalogListQuery),
    responses(
        (status = 200, description = "List of categories", body = Vec<CatalogEntryResponse>),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_categories(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CatalogListQuery>,
) -> Result<Json<Vec<CatalogEntryResponse>>, AppError> {
    let rows = list_entries::<category::Entity, _>(
        &state.db,
        category::Column::Name,
        category::Column::Id,
        query.search.as_deref(),
    )
    .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    description = "Admin only. Slugs are unique.",
    request_body = CreateCatalogEntryRequest,
    responses(
        (status = 201, description = "Category created", body = CatalogEntryResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(slug = %payload.slug))]
pub async fn create_category(
    caller: Caller,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCatalogEntryRequest>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Action::ManageCatalog)?;
    validate_catalog_entry(&payload)?;

    ensure_slug_free::<category::Entity, _>(
        &state.db,
        category::Column::Slug,
        "Category",
        &payload.slug,
    )
    .await?;

    let new_category = category::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        slug: Set(payload.slug.clone()),
        ..Default::default()
    };
    let model = new_category
        .insert(&state.db)
        .await
        .map_err(|e| slug_write_error(e, "Category", &payload.slug))?;

    Ok((StatusCode::CREATED, Json(CatalogEntryResponse::from(model))))
}

#[utoipa::path(
    delete,
    path = "/{slug}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    description = "Admin only. Titles in the category are kept with no category.",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Category not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(slug))]
pub async fn delete_category(
    caller: Caller,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Action::ManageCatalog)?;

    let txn = state.db.begin().await?;

    let existing =
        find_by_slug::<category::Entity, _>(&txn, category::Column::Slug, "Category", &slug)
            .await?;

    title::Entity::update_many()
        .col_expr(title::Column::CategoryId, Expr::value(Option::<i32>::None))
        .filter(title::Column::CategoryId.eq(existing.id))
        .exec(&txn)
        .await?;

    category::Entity::delete_by_id(existing.id).exec(&txn).await?;
    txn.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
