use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

use critic_server::entity::{comment, review, title_genre};
use critic_server::policy::Role;

use crate::common::{TestApp, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn admin_creates_a_title_with_no_rating() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        let title_id = app.create_default_title(&admin).await;

        let res = app.get_without_token(&routes::title(title_id)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Solaris");
        assert!(res.body["rating"].is_null());
        assert_eq!(res.body["category"]["slug"], "book");
        assert_eq!(res.body["genre"][0]["slug"], "sci-fi");
    }

    #[tokio::test]
    async fn future_year_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        app.create_category(&admin, "book").await;
        app.create_genre(&admin, "sci-fi").await;

        let res = app
            .post_with_token(
                routes::TITLES,
                &json!({
                    "name": "Tomorrow",
                    "year": 9999,
                    "category": "book",
                    "genre": ["sci-fi"],
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_genre_slug_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        app.create_category(&admin, "book").await;

        let res = app
            .post_with_token(
                routes::TITLES,
                &json!({
                    "name": "Solaris",
                    "year": 1961,
                    "category": "book",
                    "genre": ["nonexistent"],
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert!(res.body["message"].as_str().unwrap().contains("nonexistent"));
    }

    #[tokio::test]
    async fn regular_user_cannot_create_titles() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        let plain = app.create_authenticated_user("alice").await;
        app.create_category(&admin, "book").await;
        app.create_genre(&admin, "sci-fi").await;

        let body = json!({
            "name": "Solaris",
            "year": 1961,
            "category": "book",
            "genre": ["sci-fi"],
        });

        let res = app.post_with_token(routes::TITLES, &body, &plain).await;
        assert_eq!(res.status, 403);

        let res = app.post_without_token(routes::TITLES, &body).await;
        assert_eq!(res.status, 401);
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn filters_combine() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        app.create_category(&admin, "book").await;
        app.create_category(&admin, "film").await;
        app.create_genre(&admin, "sci-fi").await;
        app.create_genre(&admin, "drama").await;
        app.create_title(&admin, "Solaris", "book", &["sci-fi"])
            .await;
        app.create_title(&admin, "Solaris", "film", &["sci-fi", "drama"])
            .await;
        app.create_title(&admin, "Hamlet", "book", &["drama"])
            .await;

        let by_genre = app
            .get_without_token(&format!("{}?genre=drama", routes::TITLES))
            .await;
        assert_eq!(by_genre.body.as_array().unwrap().len(), 2);

        let by_name_and_category = app
            .get_without_token(&format!("{}?name=sOLAR&category=film", routes::TITLES))
            .await;
        let found = by_name_and_category.body.as_array().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["category"]["slug"], "film");

        let unknown = app
            .get_without_token(&format!("{}?category=music", routes::TITLES))
            .await;
        assert_eq!(unknown.status, 200);
        assert!(unknown.body.as_array().unwrap().is_empty());

        let by_year = app
            .get_without_token(&format!("{}?year=1961", routes::TITLES))
            .await;
        assert_eq!(by_year.body.as_array().unwrap().len(), 3);
    }
}

mod update_and_delete {
    use super::*;

    #[tokio::test]
    async fn patch_replaces_genres_and_clears_category() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        let title_id = app.create_default_title(&admin).await;
        app.create_genre(&admin, "drama").await;

        let res = app
            .patch_with_token(
                &routes::title(title_id),
                &json!({"genre": ["drama"], "category": null, "year": 1962}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["year"], 1962);
        assert!(res.body["category"].is_null());
        let genres = res.body["genre"].as_array().unwrap();
        assert_eq!(genres.len(), 1);
        assert_eq!(genres[0]["slug"], "drama");
    }

    #[tokio::test]
    async fn deleting_a_title_removes_reviews_and_comments() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        let alice = app.create_authenticated_user("alice").await;
        let title_id = app.create_default_title(&admin).await;
        let review_id = app.create_review(&alice, title_id, 8).await;
        app.create_comment(&alice, title_id, review_id).await;

        let res = app.delete_with_token(&routes::title(title_id), &admin).await;
        assert_eq!(res.status, 204, "{}", res.text);

        assert_eq!(review::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(comment::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(title_genre::Entity::find().count(&app.db).await.unwrap(), 0);

        let gone = app.get_without_token(&routes::title(title_id)).await;
        assert_eq!(gone.status, 404);
        let reviews = app.get_without_token(&routes::reviews(title_id)).await;
        assert_eq!(reviews.status, 404);
    }
}
