use catalog_server::entity::review;
use catalog_server::error::unique_violation;
use catalog_server::seed::ensure_indexes;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DbErr, Set};

use crate::common::TestApp;

async fn reviewed_product(app: &TestApp) -> (i32, i32) {
    let category = app.create_category("Kitchen").await;
    let (owner, _) = app.create_vendor("potter", "Clay & Co").await;
    let created = app.create_product(owner, category, "Mug", "5.00").await;
    let product_id = created.body["product"]["id"].as_i64().unwrap() as i32;
    let buyer = app.create_user("buyer").await;
    (buyer, product_id)
}

async fn insert_review(app: &TestApp, user_id: i32, product_id: i32) -> Result<review::Model, DbErr> {
    let now = chrono::Utc::now();
    review::ActiveModel {
        user_id: Set(user_id),
        product_id: Set(product_id),
        rating: Set(5),
        title: Set("Great".into()),
        comment: Set("Lovely glaze".into()),
        is_verified: Set(false),
        is_approved: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&app.db)
    .await
}

mod unique_constraints {
    use super::*;

    #[tokio::test]
    async fn ensuring_indexes_twice_is_harmless() {
        let app = TestApp::spawn().await;
        ensure_indexes(&app.db).await.unwrap();
        ensure_indexes(&app.db).await.unwrap();
    }

    #[tokio::test]
    async fn database_rejects_a_second_review_by_the_same_user() {
        let app = TestApp::spawn().await;
        let (buyer, product_id) = reviewed_product(&app).await;

        insert_review(&app, buyer, product_id).await.unwrap();
        let err = insert_review(&app, buyer, product_id).await.unwrap_err();
        let detail = unique_violation(&err).expect("unique violation");
        assert!(detail.contains("uq_review_user_product"), "{detail}");
    }

    #[tokio::test]
    async fn unbuildable_unique_index_is_an_error() {
        let app = TestApp::spawn().await;
        let (buyer, product_id) = reviewed_product(&app).await;

        app.db
            .execute_unprepared("DROP INDEX uq_review_user_product")
            .await
            .unwrap();
        insert_review(&app, buyer, product_id).await.unwrap();
        insert_review(&app, buyer, product_id).await.unwrap();

        assert!(ensure_indexes(&app.db).await.is_err());
    }
}
