use std::collections::HashMap;

use sea_orm::*;

use crate::entity::{category, genre, review, title, title_genre};
use crate::error::AppError;
use crate::models::catalog::CatalogEntryResponse;
use crate::models::title::TitleResponse;
use crate::utils::rating::average_rating;

/// Ratings for the given titles, recomputed from the review table.
///
/// Titles without reviews are absent from the map.
pub async fn ratings_for<C: ConnectionTrait>(
    db: &C,
    title_ids: &[i32],
) -> Result<HashMap<i32, i32>, AppError> {
    if title_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, i64, i64)> = review::Entity::find()
        .filter(review::Column::TitleId.is_in(title_ids.iter().copied()))
        .select_only()
        .column(review::Column::TitleId)
        .column_as(review::Column::Score.sum(), "score_sum")
        .column_as(review::Column::Id.count(), "review_count")
        .group_by(review::Column::TitleId)
        .into_tuple()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(title_id, sum, count)| average_rating(sum, count).map(|r| (title_id, r)))
        .collect())
}

/// Build API representations for a batch of titles, preserving input order.
///
/// Issues a fixed number of queries regardless of batch size: categories,
/// genre links, genres and ratings.
pub async fn title_responses<C: ConnectionTrait>(
    db: &C,
    titles: Vec<title::Model>,
) -> Result<Vec<TitleResponse>, AppError> {
    if titles.is_empty() {
        return Ok(Vec::new());
    }

    let title_ids: Vec<i32> = titles.iter().map(|t| t.id).collect();

    let category_ids: Vec<i32> = titles.iter().filter_map(|t| t.category_id).collect();
    let categories: HashMap<i32, category::Model> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        category::Entity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect()
    };

    let links = title_genre::Entity::find()
        .filter(title_genre::Column::TitleId.is_in(title_ids.clone()))
        .order_by_asc(title_genre::Column::GenreId)
        .all(db)
        .await?;

    let genre_ids: Vec<i32> = links.iter().map(|l| l.genre_id).collect();
    let genres: HashMap<i32, genre::Model> = if genre_ids.is_empty() {
        HashMap::new()
    } else {
        genre::Entity::find()
            .filter(genre::Column::Id.is_in(genre_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|g| (g.id, g))
            .collect()
    };

    let mut genres_by_title: HashMap<i32, Vec<CatalogEntryResponse>> = HashMap::new();
    for link in links {
        if let Some(g) = genres.get(&link.genre_id) {
            genres_by_title
                .entry(link.title_id)
                .or_default()
                .push(g.clone().into());
        }
    }

    let ratings = ratings_for(db, &title_ids).await?;

    Ok(titles
        .into_iter()
        .map(|t| TitleResponse {
            id: t.id,
            rating: ratings.get(&t.id).copied(),
            genre: genres_by_title.remove(&t.id).unwrap_or_default(),
            category: t
                .category_id
                .and_then(|id| categories.get(&id))
                .cloned()
                .map(CatalogEntryResponse::from),
            name: t.name,
            year: t.year,
            description: t.description,
        })
        .collect())
}

/// Build the API representation of a single title.
pub async fn title_response<C: ConnectionTrait>(
    db: &C,
    model: title::Model,
) -> Result<TitleResponse, AppError> {
    title_responses(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("title representation missing".into()))
}

/// Resolve a category slug to its row, 400 if unknown.
pub async fn resolve_category<C: ConnectionTrait>(
    db: &C,
    slug: &str,
) -> Result<category::Model, AppError> {
    category::Entity::find()
        .filter(category::Column::Slug.eq(slug))
        .one(db)
        .await?
        .ok_or_else(|| AppError::Validation(format!("Category '{slug}' does not exist")))
}

/// Resolve genre slugs to IDs, 400 naming the first unknown slug.
pub async fn resolve_genres<C: ConnectionTrait>(
    db: &C,
    slugs: &[String],
) -> Result<Vec<i32>, AppError> {
    let found: HashMap<String, i32> = genre::Entity::find()
        .filter(genre::Column::Slug.is_in(slugs.iter().cloned()))
        .all(db)
        .await?
        .into_iter()
        .map(|g| (g.slug, g.id))
        .collect();

    let mut ids = Vec::with_capacity(slugs.len());
    for slug in slugs {
        let id = found
            .get(slug)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("Genre '{slug}' does not exist")))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Replace the genre links of a title.
pub async fn set_title_genres<C: ConnectionTrait>(
    db: &C,
    title_id: i32,
    genre_ids: &[i32],
) -> Result<(), AppError> {
    title_genre::Entity::delete_many()
        .filter(title_genre::Column::TitleId.eq(title_id))
        .exec(db)
        .await?;

    if genre_ids.is_empty() {
        return Ok(());
    }

    let links = genre_ids.iter().map(|&genre_id| title_genre::ActiveModel {
        title_id: Set(title_id),
        genre_id: Set(genre_id),
    });
    title_genre::Entity::insert_many(links)
        .exec_without_returning(db)
        .await?;

    Ok(())
}
