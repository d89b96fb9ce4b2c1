use catalog_common::OrderStatus;
use serde_json::json;

use crate::common::{TestApp, routes};

/// A store with one product; returns `(product_id, slug)`.
async fn listed_product(app: &TestApp) -> (i32, String) {
    let category = app.create_category("Kitchen").await;
    let (owner, _) = app.create_vendor("potter", "Clay & Co").await;
    let res = app.create_product(owner, category, "Blue Mug", "12.50").await;
    let product = &res.body["product"];
    (
        product["id"].as_i64().unwrap() as i32,
        product["slug"].as_str().unwrap().to_string(),
    )
}

async fn post_review(app: &TestApp, slug: &str, user_id: i32, rating: i32) -> i32 {
    let res = app
        .post_as(
            &routes::product_reviews(slug),
            &json!({ "rating": rating, "title": "Thoughts", "comment": "It holds coffee." }),
            user_id,
        )
        .await;
    assert_eq!(res.status, 201, "post_review failed: {}", res.text);
    res.id()
}

mod review_creation {
    use super::*;

    #[tokio::test]
    async fn delivered_order_marks_review_verified() {
        let app = TestApp::spawn().await;
        let (product_id, slug) = listed_product(&app).await;
        let buyer = app.create_user("buyer").await;
        app.insert_order(buyer, OrderStatus::Delivered, &[(product_id, 1, "12.50")])
            .await;

        let res = app
            .post_as(
                &routes::product_reviews(&slug),
                &json!({ "rating": 5, "title": "Great", "comment": "Love it" }),
                buyer,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["is_verified"], true);
        assert_eq!(res.body["is_approved"], true);
        assert_eq!(res.body["product_id"], product_id);
    }

    #[tokio::test]
    async fn completed_order_also_counts_as_purchase() {
        let app = TestApp::spawn().await;
        let (product_id, slug) = listed_product(&app).await;
        let buyer = app.create_user("buyer").await;
        app.insert_order(buyer, OrderStatus::Completed, &[(product_id, 2, "25.00")])
            .await;

        let id = post_review(&app, &slug, buyer, 4).await;
        let res = app.get(&routes::product_reviews(&slug)).await;
        let review = &res.body["data"][0];
        assert_eq!(review["id"], id);
        assert_eq!(review["is_verified"], true);
    }

    #[tokio::test]
    async fn pending_or_missing_order_is_unverified() {
        let app = TestApp::spawn().await;
        let (product_id, slug) = listed_product(&app).await;
        let pending = app.create_user("pending").await;
        let stranger = app.create_user("stranger").await;
        app.insert_order(pending, OrderStatus::Pending, &[(product_id, 1, "12.50")])
            .await;
        app.insert_order(pending, OrderStatus::Shipped, &[(product_id, 1, "12.50")])
            .await;

        post_review(&app, &slug, pending, 3).await;
        post_review(&app, &slug, stranger, 2).await;

        let res = app.get(&routes::product_reviews(&slug)).await;
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert!(data.iter().all(|r| r["is_verified"] == false));
    }

    #[tokio::test]
    async fn second_review_by_same_user_is_a_conflict() {
        let app = TestApp::spawn().await;
        let (_, slug) = listed_product(&app).await;
        let buyer = app.create_user("buyer").await;
        post_review(&app, &slug, buyer, 5).await;

        let res = app
            .post_as(
                &routes::product_reviews(&slug),
                &json!({ "rating": 1, "title": "Changed my mind", "comment": "Meh" }),
                buyer,
            )
            .await;
        assert_eq!(res.status, 409, "{}", res.text);
        assert_eq!(res.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn rating_outside_one_to_five_is_rejected() {
        let app = TestApp::spawn().await;
        let (_, slug) = listed_product(&app).await;
        let buyer = app.create_user("buyer").await;

        for rating in [0, 6] {
            let res = app
                .post_as(
                    &routes::product_reviews(&slug),
                    &json!({ "rating": rating, "title": "Hmm", "comment": "Odd" }),
                    buyer,
                )
                .await;
            assert_eq!(res.status, 400, "rating {rating}: {}", res.text);
            assert_eq!(res.code(), "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn anonymous_caller_cannot_review() {
        let app = TestApp::spawn().await;
        let (_, slug) = listed_product(&app).await;

        let res = app
            .post(
                &routes::product_reviews(&slug),
                &json!({ "rating": 4, "title": "Hi", "comment": "There" }),
            )
            .await;
        assert_eq!(res.status, 401);
    }
}

mod review_summary {
    use super::*;

    #[tokio::test]
    async fn summary_rounds_average_and_fills_distribution() {
        let app = TestApp::spawn().await;
        let (product_id, slug) = listed_product(&app).await;

        for (i, rating) in [5, 5, 4, 3].into_iter().enumerate() {
            let user = app.create_user(&format!("reviewer{i}")).await;
            if i == 0 {
                app.insert_order(user, OrderStatus::Delivered, &[(product_id, 1, "12.50")])
                    .await;
            }
            post_review(&app, &slug, user, rating).await;
        }

        let res = app.get(&routes::review_summary(&slug)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["average_rating"], 4.3);
        assert_eq!(res.body["total_reviews"], 4);
        assert_eq!(res.body["verified_reviews_count"], 1);
        assert_eq!(
            res.body["rating_distribution"],
            json!({ "1": 0, "2": 0, "3": 1, "4": 1, "5": 2 })
        );
    }

    #[tokio::test]
    async fn product_without_reviews_has_empty_summary() {
        let app = TestApp::spawn().await;
        let (_, slug) = listed_product(&app).await;

        let res = app.get(&routes::review_summary(&slug)).await;
        assert_eq!(res.body["average_rating"], 0.0);
        assert_eq!(res.body["total_reviews"], 0);
        assert_eq!(
            res.body["rating_distribution"],
            json!({ "1": 0, "2": 0, "3": 0, "4": 0, "5": 0 })
        );
    }

    #[tokio::test]
    async fn hidden_reviews_are_excluded_everywhere() {
        let app = TestApp::spawn().await;
        let (_, slug) = listed_product(&app).await;
        let staff = app.create_staff("moderator").await;
        let fan = app.create_user("fan").await;
        let troll = app.create_user("troll").await;

        post_review(&app, &slug, fan, 5).await;
        let spam = post_review(&app, &slug, troll, 1).await;

        let res = app
            .put_as(&routes::review_approval(spam), &json!({ "is_approved": false }), staff)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["is_approved"], false);

        let summary = app.get(&routes::review_summary(&slug)).await;
        assert_eq!(summary.body["average_rating"], 5.0);
        assert_eq!(summary.body["total_reviews"], 1);
        assert_eq!(summary.body["rating_distribution"]["1"], 0);

        let list = app.get(&routes::product_reviews(&slug)).await;
        assert_eq!(list.body["pagination"]["total"], 1);

        let detail = app.get(&routes::product(&slug)).await;
        assert_eq!(detail.body["reviews"]["total_reviews"], 1);
    }

    #[tokio::test]
    async fn only_staff_can_moderate() {
        let app = TestApp::spawn().await;
        let (_, slug) = listed_product(&app).await;
        let buyer = app.create_user("buyer").await;
        let id = post_review(&app, &slug, buyer, 2).await;

        let res = app
            .put_as(&routes::review_approval(id), &json!({ "is_approved": false }), buyer)
            .await;
        assert_eq!(res.status, 403);
    }
}

mod review_listing {
    use super::*;

    #[tokio::test]
    async fn rating_filter_returns_only_matching_reviews() {
        let app = TestApp::spawn().await;
        let (_, slug) = listed_product(&app).await;
        for (i, rating) in [5, 3, 5, 1].into_iter().enumerate() {
            let user = app.create_user(&format!("reviewer{i}")).await;
            post_review(&app, &slug, user, rating).await;
        }

        let res = app
            .get(&format!("{}?rating=5", routes::product_reviews(&slug)))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
        assert!(data.iter().all(|r| r["rating"] == 5));

        let res = app
            .get(&format!("{}?rating=4", routes::product_reviews(&slug)))
            .await;
        assert_eq!(res.body["data"].as_array().unwrap().len(), 0);

        let res = app
            .get(&format!("{}?rating=9", routes::product_reviews(&slug)))
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn newest_review_comes_first() {
        let app = TestApp::spawn().await;
        let (_, slug) = listed_product(&app).await;
        let early = app.create_user("early").await;
        let late = app.create_user("late").await;
        post_review(&app, &slug, early, 4).await;
        let newest = post_review(&app, &slug, late, 2).await;

        let res = app.get(&routes::product_reviews(&slug)).await;
        assert_eq!(res.body["data"][0]["id"], newest);
    }
}

mod review_changes {
    use super::*;

    #[tokio::test]
    async fn editing_keeps_verified_flag() {
        let app = TestApp::spawn().await;
        let (product_id, slug) = listed_product(&app).await;
        let buyer = app.create_user("buyer").await;
        let id = post_review(&app, &slug, buyer, 2).await;

        // A purchase made after posting does not upgrade the review.
        app.insert_order(buyer, OrderStatus::Delivered, &[(product_id, 1, "12.50")])
            .await;

        let res = app
            .patch_as(
                &routes::review(id),
                &json!({ "rating": 4, "is_verified": true }),
                buyer,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["rating"], 4);
        assert_eq!(res.body["title"], "Thoughts");
        assert_eq!(res.body["is_verified"], false);

        let summary = app.get(&routes::review_summary(&slug)).await;
        assert_eq!(summary.body["average_rating"], 4.0);
    }

    #[tokio::test]
    async fn edit_with_bad_rating_is_rejected() {
        let app = TestApp::spawn().await;
        let (_, slug) = listed_product(&app).await;
        let buyer = app.create_user("buyer").await;
        let id = post_review(&app, &slug, buyer, 2).await;

        let res = app
            .patch_as(&routes::review(id), &json!({ "rating": 7 }), buyer)
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn only_the_author_can_edit_or_delete() {
        let app = TestApp::spawn().await;
        let (_, slug) = listed_product(&app).await;
        let author = app.create_user("author").await;
        let other = app.create_user("other").await;
        let id = post_review(&app, &slug, author, 3).await;

        let res = app
            .patch_as(&routes::review(id), &json!({ "title": "Hijacked" }), other)
            .await;
        assert_eq!(res.status, 403);

        let res = app.delete_as(&routes::review(id), other).await;
        assert_eq!(res.status, 403);

        let res = app.delete_as(&routes::review(id), author).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let res = app.delete_as(&routes::review(id), author).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn deleted_review_frees_the_slot() {
        let app = TestApp::spawn().await;
        let (_, slug) = listed_product(&app).await;
        let buyer = app.create_user("buyer").await;
        let id = post_review(&app, &slug, buyer, 1).await;

        app.delete_as(&routes::review(id), buyer).await;
        post_review(&app, &slug, buyer, 5).await;

        let summary = app.get(&routes::review_summary(&slug)).await;
        assert_eq!(summary.body["average_rating"], 5.0);
    }
}

mod review_aggregates {
    use catalog_common::Rating;
    use catalog_server::catalog::reviews::ReviewService;

    use super::*;

    #[tokio::test]
    async fn single_aggregates_agree_with_summary() {
        let app = TestApp::spawn().await;
        let (product_id, slug) = listed_product(&app).await;
        let staff = app.create_staff("moderator").await;

        let mut ids = Vec::new();
        for (i, rating) in [5, 5, 4, 3, 1].into_iter().enumerate() {
            let user = app.create_user(&format!("reviewer{i}")).await;
            if i < 2 {
                app.insert_order(user, OrderStatus::Completed, &[(product_id, 1, "12.50")])
                    .await;
            }
            ids.push(post_review(&app, &slug, user, rating).await);
        }
        app.put_as(
            &routes::review_approval(ids[4]),
            &json!({ "is_approved": false }),
            staff,
        )
        .await;

        let reviews = ReviewService::new(&app.db);
        let summary = reviews.summary(product_id).await.unwrap();
        assert_eq!(reviews.average_rating(product_id).await.unwrap(), 4.3);
        assert_eq!(reviews.total_reviews(product_id).await.unwrap(), 4);
        assert_eq!(reviews.verified_reviews_count(product_id).await.unwrap(), 2);
        assert_eq!(
            reviews.rating_distribution(product_id).await.unwrap(),
            summary.rating_distribution
        );
        assert_eq!(summary.rating_distribution[&1], 0);

        let fives = reviews
            .reviews_by_rating(product_id, Rating::new(5).unwrap())
            .await
            .unwrap();
        assert_eq!(fives.len(), 2);
        assert_eq!(fives[0].id, ids[1]);
        assert!(
            reviews
                .reviews_by_rating(product_id, Rating::new(1).unwrap())
                .await
                .unwrap()
                .is_empty()
        );
    }
}
