use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use critic_server::entity::{comment, review, user};
use critic_server::policy::Role;

use crate::common::{TestApp, routes};

mod administration {
    use super::*;

    #[tokio::test]
    async fn admin_lists_users_with_search() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        app.create_authenticated_user("alice").await;
        app.create_authenticated_user("bob").await;

        let all = app.get_with_token(routes::USERS, &admin).await;
        assert_eq!(all.status, 200, "{}", all.text);
        assert_eq!(all.body.as_array().unwrap().len(), 3);

        let found = app
            .get_with_token(&format!("{}?search=ALI", routes::USERS), &admin)
            .await;
        let names: Vec<&str> = found
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["username"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["alice"]);
    }

    #[tokio::test]
    async fn regular_users_and_moderators_cannot_manage_users() {
        let app = TestApp::spawn().await;
        let plain = app.create_authenticated_user("alice").await;
        let moderator = app.create_user_with_role("mod", Role::Moderator).await;

        for token in [&plain, &moderator] {
            let res = app.get_with_token(routes::USERS, token).await;
            assert_eq!(res.status, 403);
            assert_eq!(res.body["code"], "PERMISSION_DENIED");
        }

        let anon = app.get_without_token(routes::USERS).await;
        assert_eq!(anon.status, 401);
        assert_eq!(anon.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn admin_creates_a_user_with_a_role() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({
                    "username": "carol",
                    "email": "carol@example.com",
                    "bio": "Reads a lot.",
                    "role": "moderator",
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["role"], "moderator");
        assert_eq!(res.body["bio"], "Reads a lot.");

        let duplicate = app
            .post_with_token(
                routes::USERS,
                &json!({"username": "carol", "email": "carol2@example.com"}),
                &admin,
            )
            .await;
        assert_eq!(duplicate.status, 409);
        assert_eq!(duplicate.body["code"], "USERNAME_TAKEN");
    }

    #[tokio::test]
    async fn admin_changes_a_role_by_username() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        app.create_authenticated_user("alice").await;

        let res = app
            .patch_with_token(&routes::user("alice"), &json!({"role": "moderator"}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["role"], "moderator");

        let fetched = app.get_with_token(&routes::user("alice"), &admin).await;
        assert_eq!(fetched.body["role"], "moderator");
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;

        let res = app.get_with_token(&routes::user("ghost"), &admin).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn deleting_a_user_removes_their_content() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("root", Role::Admin).await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let title_id = app.create_default_title(&admin).await;

        let alice_review = app.create_review(&alice, title_id, 7).await;
        app.create_comment(&bob, title_id, alice_review).await;
        let bob_review = app.create_review(&bob, title_id, 9).await;
        app.create_comment(&alice, title_id, bob_review).await;

        let res = app.delete_with_token(&routes::user("alice"), &admin).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let remaining_reviews = review::Entity::find().all(&app.db).await.unwrap();
        assert_eq!(remaining_reviews.len(), 1);
        assert_eq!(remaining_reviews[0].id, bob_review);
        assert_eq!(comment::Entity::find().count(&app.db).await.unwrap(), 0);
        assert!(
            user::Entity::find()
                .filter(user::Column::Username.eq("alice"))
                .one(&app.db)
                .await
                .unwrap()
                .is_none()
        );

        let title = app.get_without_token(&routes::title(title_id)).await;
        assert_eq!(title.body["rating"], 9);
    }
}

mod own_profile {
    use super::*;

    #[tokio::test]
    async fn user_edits_own_profile() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .patch_with_token(
                routes::ME,
                &json!({"first_name": "Alice", "bio": "Sci-fi fan"}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["first_name"], "Alice");
        assert_eq!(res.body["bio"], "Sci-fi fan");
    }

    #[tokio::test]
    async fn role_cannot_be_changed_through_own_profile() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app
            .patch_with_token(routes::ME, &json!({"role": "admin"}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["role"], "user");

        let listing = app.get_with_token(routes::USERS, &token).await;
        assert_eq!(listing.status, 403);
    }

    #[tokio::test]
    async fn cannot_take_another_users_email() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;
        app.create_authenticated_user("bob").await;

        let res = app
            .patch_with_token(routes::ME, &json!({"email": "bob@example.com"}), &token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn empty_patch_returns_the_current_profile() {
        let app = TestApp::spawn().await;
        let token = app.create_authenticated_user("alice").await;

        let res = app.patch_with_token(routes::ME, &json!({}), &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["username"], "alice");
    }
}
