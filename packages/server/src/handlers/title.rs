use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::sea_query::Query as SeaQuery;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{category, genre, review, title, title_genre};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::Caller;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::title::*;
use crate::policy::{Action, Capabilities};
use crate::state::AppState;
use crate::utils::catalog::name_contains;
use crate::utils::content::{delete_reviews_cascade, find_title};
use crate::utils::title::{
    resolve_category, resolve_genres, set_title_genres, title_response, title_responses,
};

#[utoipa::path(
    get,
    path = "/",
    tag = "Titles",
    operation_id = "listTitles",
    summary = "List titles",
    description = "Returns titles ordered by ID with their computed rating. Filters combine: `category` and `genre` match a slug exactly, `name` is a case-insensitive substring, `year` matches exactly. An unknown slug yields an empty list.",
    params(TitleListQuery),
    responses(
        (status = 200, description = "List of titles", body = Vec<TitleResponse>),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_titles(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TitleListQuery>,
) -> Result<Json<Vec<TitleResponse>>, AppError> {
    let mut select = title::Entity::find();

    if let Some(ref slug) = query.category {
        let Some(cat) = category::Entity::find()
            .filter(category::Column::Slug.eq(slug.trim()))
            .one(&state.db)
            .await?
        else {
            return Ok(Json(Vec::new()));
        };
        select = select.filter(title::Column::CategoryId.eq(cat.id));
    }

    if let Some(ref slug) = query.genre {
        let Some(g) = genre::Entity::find()
            .filter(genre::Column::Slug.eq(slug.trim()))
            .one(&state.db)
            .await?
        else {
            return Ok(Json(Vec::new()));
        };
        select = select.filter(
            title::Column::Id.in_subquery(
                SeaQuery::select()
                    .column(title_genre::Column::TitleId)
                    .from(title_genre::Entity)
                    .and_where(title_genre::Column::GenreId.eq(g.id))
                    .to_owned(),
            ),
        );
    }

    if let Some(cond) = query
        .name
        .as_deref()
        .and_then(|n| name_contains(title::Column::Name, n))
    {
        select = select.filter(cond);
    }

    if let Some(year) = query.year {
        select = select.filter(title::Column::Year.eq(year));
    }

    let titles = select.order_by_asc(title::Column::Id).all(&state.db).await?;

    Ok(Json(title_responses(&state.db, titles).await?))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Titles",
    operation_id = "createTitle",
    summary = "Create a title",
    description = "Admin only. `category` is a category slug and `genre` a non-empty list of genre slugs; all must already exist.",
    request_body = CreateTitleRequest,
    responses(
        (status = 201, description = "Title created", body = TitleResponse),
        (status = 400, description = "Validation error or unknown slug (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(name = %payload.name))]
pub async fn create_title(
    caller: Caller,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTitleRequest>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Action::ManageCatalog)?;
    validate_create_title(&payload)?;

    let txn = state.db.begin().await?;

    let cat = resolve_category(&txn, &payload.category).await?;
    let genre_ids = resolve_genres(&txn, &payload.genre).await?;

    let new_title = title::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        year: Set(payload.year),
        description: Set(payload.description),
        category_id: Set(Some(cat.id)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    let model = new_title.insert(&txn).await?;
    set_title_genres(&txn, model.id, &genre_ids).await?;

    let response = title_response(&txn, model).await?;
    txn.commit().await?;

    tracing::info!(title_id = response.id, "Title created");

    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/{title_id}",
    tag = "Titles",
    operation_id = "getTitle",
    summary = "Get a title",
    params(("title_id" = i32, Path, description = "Title ID")),
    responses(
        (status = 200, description = "Title", body = TitleResponse),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(title_id))]
pub async fn get_title(
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
) -> Result<Json<TitleResponse>, AppError> {
    let model = find_title(&state.db, title_id).await?;
    Ok(Json(title_response(&state.db, model).await?))
}

#[utoipa::path(
    patch,
    path = "/{title_id}",
    tag = "Titles",
    operation_id = "updateTitle",
    summary = "Update a title",
    description = "Admin only. Partial update; `category: null` clears the category and `genre` replaces the whole genre list.",
    params(("title_id" = i32, Path, description = "Title ID")),
    request_body = UpdateTitleRequest,
    responses(
        (status = 200, description = "Title updated", body = TitleResponse),
        (status = 400, description = "Validation error or unknown slug (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller, payload), fields(title_id))]
pub async fn update_title(
    caller: Caller,
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
    AppJson(payload): AppJson<UpdateTitleRequest>,
) -> Result<Json<TitleResponse>, AppError> {
    caller.require(Action::ManageCatalog)?;

    let txn = state.db.begin().await?;
    let existing = find_title(&txn, title_id).await?;

    if payload == UpdateTitleRequest::default() {
        let response = title_response(&txn, existing).await?;
        txn.commit().await?;
        return Ok(Json(response));
    }

    validate_update_title(&payload)?;

    let mut active: title::ActiveModel = existing.clone().into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(year) = payload.year {
        active.year = Set(year);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    match payload.category {
        Some(Some(ref slug)) => {
            let cat = resolve_category(&txn, slug).await?;
            active.category_id = Set(Some(cat.id));
        }
        Some(None) => active.category_id = Set(None),
        None => {}
    }
    if let Some(ref slugs) = payload.genre {
        let genre_ids = resolve_genres(&txn, slugs).await?;
        set_title_genres(&txn, title_id, &genre_ids).await?;
    }

    let model = if active.is_changed() {
        active.update(&txn).await?
    } else {
        existing
    };

    let response = title_response(&txn, model).await?;
    txn.commit().await?;

    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/{title_id}",
    tag = "Titles",
    operation_id = "deleteTitle",
    summary = "Delete a title",
    description = "Admin only. Deletes the title together with its reviews and their comments.",
    params(("title_id" = i32, Path, description = "Title ID")),
    responses(
        (status = 204, description = "Title deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Title not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, caller), fields(title_id))]
pub async fn delete_title(
    caller: Caller,
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    caller.require(Action::ManageCatalog)?;

    let txn = state.db.begin().await?;
    find_title(&txn, title_id).await?;

    let review_ids: Vec<i32> = review::Entity::find()
        .filter(review::Column::TitleId.eq(title_id))
        .select_only()
        .column(review::Column::Id)
        .into_tuple()
        .all(&txn)
        .await?;
    delete_reviews_cascade(&txn, review_ids).await?;

    title_genre::Entity::delete_many()
        .filter(title_genre::Column::TitleId.eq(title_id))
        .exec(&txn)
        .await?;
    title::Entity::delete_by_id(title_id).exec(&txn).await?;

    txn.commit().await?;

    tracing::info!(title_id, "Title deleted");

    Ok(StatusCode::NO_CONTENT)
}
