use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{auth, category, comment, genre, review, title, user};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/users", user_routes())
        .nest("/categories", category_routes())
        .nest("/genres", genre_routes())
        .nest("/titles", title_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::signup))
        .routes(routes!(auth::token))
}

fn user_routes() -> OpenApiRouter<AppState> {
    // `/me` is a static segment and wins over `/{username}`.
    OpenApiRouter::new()
        .routes(routes!(user::list_users, user::create_user))
        .routes(routes!(user::get_me, user::update_me))
        .routes(routes!(user::get_user, user::update_user, user::delete_user))
}

fn category_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(category::list_categories, category::create_category))
        .routes(routes!(category::delete_category))
}

fn genre_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(genre::list_genres, genre::create_genre))
        .routes(routes!(genre::delete_genre))
}

fn title_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(title::list_titles, title::create_title))
        .routes(routes!(
            title::get_title,
            title::update_title,
            title::delete_title
        ))
        .nest("/{title_id}/reviews", review_routes())
}

fn review_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(review::list_reviews, review::create_review))
        .routes(routes!(
            review::get_review,
            review::update_review,
            review::delete_review
        ))
        .nest("/{review_id}/comments", comment_routes())
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(comment::list_comments, comment::create_comment))
        .routes(routes!(
            comment::get_comment,
            comment::update_comment,
            comment::delete_comment
        ))
}
