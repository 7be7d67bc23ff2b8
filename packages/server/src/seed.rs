use anyhow::{Context, bail};
use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::config::SuperuserConfig;
use crate::entity::{comment, review, user};
use crate::models::shared::{normalize_email, validate_email, validate_username};
use crate::policy::Role;

/// Name of the unique index backing the one-review-per-author-per-title rule.
pub const REVIEW_AUTHOR_TITLE_INDEX: &str = "uq_review_author_title";

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite indexes, so we create them
/// manually on startup. The unique review index is required; lookup indexes
/// only log on failure.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let stmt = Index::create()
        .if_not_exists()
        .unique()
        .name(REVIEW_AUTHOR_TITLE_INDEX)
        .table(review::Entity)
        .col(review::Column::AuthorId)
        .col(review::Column::TitleId)
        .to_string(PostgresQueryBuilder);

    db.execute_unprepared(&stmt).await?;
    info!("Ensured index {} exists", REVIEW_AUTHOR_TITLE_INDEX);

    // Review listing: WHERE title_id = ? ORDER BY pub_date DESC
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_review_title_pub_date")
        .table(review::Entity)
        .col(review::Column::TitleId)
        .col(review::Column::PubDate)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_review_title_pub_date exists"),
        Err(e) => tracing::warn!("Failed to create index idx_review_title_pub_date: {}", e),
    }

    // Comment listing: WHERE review_id = ? ORDER BY pub_date DESC
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_comment_review_pub_date")
        .table(comment::Entity)
        .col(comment::Column::ReviewId)
        .col(comment::Column::PubDate)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => info!("Ensured index idx_comment_review_pub_date exists"),
        Err(e) => tracing::warn!("Failed to create index idx_comment_review_pub_date: {}", e),
    }

    Ok(())
}

/// Create the configured superuser, or grant superuser rights to the
/// existing account with that username.
pub async fn ensure_superuser(
    db: &DatabaseConnection,
    cfg: Option<&SuperuserConfig>,
) -> anyhow::Result<()> {
    let Some(cfg) = cfg else {
        return Ok(());
    };

    if validate_username(&cfg.username).is_err() || validate_email(&cfg.email).is_err() {
        bail!("Configured superuser has an invalid username or email");
    }

    let username = cfg.username.trim();
    let existing = user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .context("Failed to look up superuser")?;

    match existing {
        Some(account) if account.is_superuser => {}
        Some(account) => {
            let id = account.id;
            let mut active: user::ActiveModel = account.into();
            active.is_superuser = Set(true);
            active
                .update(db)
                .await
                .context("Failed to promote superuser")?;
            info!(user_id = id, "Granted superuser rights to {}", username);
        }
        None => {
            let model = user::ActiveModel {
                username: Set(username.to_string()),
                email: Set(normalize_email(&cfg.email)),
                first_name: Set(String::new()),
                last_name: Set(String::new()),
                bio: Set(String::new()),
                role: Set(Role::Admin),
                is_superuser: Set(true),
                is_confirmed: Set(false),
                created_at: Set(chrono::Utc::now()),
                ..Default::default()
            }
            .insert(db)
            .await
            .context("Failed to create superuser")?;
            info!(user_id = model.id, "Created superuser {}", username);
        }
    }

    Ok(())
}
