use catalog_common::OrderStatus;
use catalog_server::entity::{user, user_group};
use rust_decimal::Decimal;
use sea_orm::prelude::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

use crate::common::{TestApp, routes};

async fn user_type(app: &TestApp, user_id: i32) -> String {
    user::Entity::find_by_id(user_id)
        .one(&app.db)
        .await
        .unwrap()
        .expect("user exists")
        .user_type
}

async fn groups(app: &TestApp, user_id: i32) -> Vec<String> {
    let mut names: Vec<String> = user_group::Entity::find()
        .filter(user_group::Column::UserId.eq(user_id))
        .all(&app.db)
        .await
        .unwrap()
        .into_iter()
        .map(|g| g.group_name)
        .collect();
    names.sort();
    names
}

fn decimal(value: &serde_json::Value) -> Decimal {
    value
        .as_str()
        .unwrap_or_else(|| panic!("expected decimal string, got {value}"))
        .parse()
        .unwrap()
}

mod vendor_registration {
    use super::*;

    #[tokio::test]
    async fn registering_switches_buyer_to_vendor() {
        let app = TestApp::spawn().await;
        let owner = app.create_user("potter").await;
        assert_eq!(groups(&app, owner).await, vec!["Buyers"]);

        let res = app
            .post_as(
                routes::VENDORS,
                &json!({
                    "store_name": "Clay & Co",
                    "store_description": "Stoneware",
                    "phone": "555-0100",
                    "address": "1 Kiln Lane",
                    "twitter_handle": "@clayco",
                }),
                owner,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["user_id"], owner);
        assert_eq!(res.body["twitter_handle"], "clayco");
        assert_eq!(res.body["is_verified"], false);
        assert_eq!(res.body["response_time"], "Usually responds within 24 hours");
        assert_eq!(res.body["shipping_policy"], "Standard shipping rates apply");
        assert_eq!(res.body["return_policy"], "30-day return policy");

        assert_eq!(user_type(&app, owner).await, "vendor");
        assert_eq!(groups(&app, owner).await, vec!["Vendors"]);
    }

    #[tokio::test]
    async fn vendor_typed_user_without_store_can_register() {
        let app = TestApp::spawn().await;
        let owner = app.create_user("potter").await;
        user::Entity::update_many()
            .col_expr(user::Column::UserType, Expr::value("vendor"))
            .filter(user::Column::Id.eq(owner))
            .exec(&app.db)
            .await
            .unwrap();

        let vendor_id = app.register_vendor(owner, "Clay & Co").await;
        assert!(vendor_id > 0);
        assert_eq!(user_type(&app, owner).await, "vendor");
        assert_eq!(groups(&app, owner).await, vec!["Vendors"]);
    }

    #[tokio::test]
    async fn second_store_is_a_conflict() {
        let app = TestApp::spawn().await;
        let (owner, _) = app.create_vendor("potter", "Clay & Co").await;

        let res = app
            .post_as(
                routes::VENDORS,
                &json!({
                    "store_name": "Clay Two",
                    "store_description": "More",
                    "phone": "555-0101",
                    "address": "2 Kiln Lane",
                }),
                owner,
            )
            .await;
        assert_eq!(res.status, 409, "{}", res.text);
        assert_eq!(groups(&app, owner).await, vec!["Vendors"]);
    }

    #[tokio::test]
    async fn missing_store_name_is_rejected() {
        let app = TestApp::spawn().await;
        let owner = app.create_user("potter").await;

        let res = app
            .post_as(
                routes::VENDORS,
                &json!({
                    "store_name": "  ",
                    "store_description": "Stoneware",
                    "phone": "555-0100",
                    "address": "1 Kiln Lane",
                }),
                owner,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(user_type(&app, owner).await, "buyer");
    }

    #[tokio::test]
    async fn own_store_lookup() {
        let app = TestApp::spawn().await;
        let owner = app.create_user("potter").await;

        let res = app.get_as(routes::MY_VENDOR, owner).await;
        assert_eq!(res.status, 404);

        let vendor_id = app.register_vendor(owner, "Clay & Co").await;
        let res = app.get_as(routes::MY_VENDOR, owner).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["vendor"]["id"], vendor_id);
        assert_eq!(res.body["profile"]["website"], "");
    }

    #[tokio::test]
    async fn welcome_message_is_published() {
        let app = TestApp::spawn().await;
        let owner = app.create_user("potter").await;
        app.post_as(
            routes::VENDORS,
            &json!({
                "store_name": "Clay & Co",
                "store_description": "Stoneware",
                "phone": "555-0100",
                "address": "1 Kiln Lane",
                "twitter_handle": "clayco",
            }),
            owner,
        )
        .await;

        let messages = app.notifications_settled(1).await;
        assert_eq!(
            messages,
            vec!["Welcome Clay & Co (@clayco) to the marketplace!".to_string()]
        );
    }
}

mod vendor_dashboard {
    use super::*;

    #[tokio::test]
    async fn revenue_counts_only_fulfilled_orders() {
        let app = TestApp::spawn().await;
        let category = app.create_category("Kitchen").await;
        let (owner, _) = app.create_vendor("potter", "Clay & Co").await;
        let (rival, _) = app.create_vendor("rival", "Mugs R Us").await;
        let buyer = app.create_user("buyer").await;

        let mug = app.create_product(owner, category, "Mug", "25.00").await;
        let bowl = app.create_product(owner, category, "Bowl", "50.00").await;
        let other = app.create_product(rival, category, "Cup", "10.00").await;
        let mug_id = mug.body["product"]["id"].as_i64().unwrap() as i32;
        let bowl_id = bowl.body["product"]["id"].as_i64().unwrap() as i32;
        let other_id = other.body["product"]["id"].as_i64().unwrap() as i32;

        app.insert_order(
            buyer,
            OrderStatus::Delivered,
            &[(mug_id, 4, "100.00"), (other_id, 1, "10.00")],
        )
        .await;
        app.insert_order(buyer, OrderStatus::Completed, &[(bowl_id, 1, "50.00")])
            .await;
        app.insert_order(buyer, OrderStatus::Pending, &[(bowl_id, 1, "50.00")])
            .await;
        app.insert_order(buyer, OrderStatus::Cancelled, &[(mug_id, 1, "25.00")])
            .await;

        let res = app.get_as(routes::MY_DASHBOARD, owner).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(decimal(&res.body["total_revenue"]), Decimal::new(15000, 2));
        assert_eq!(res.body["total_products"], 2);
        assert_eq!(res.body["active_products"], 2);

        let recent = res.body["recent_orders"].as_array().unwrap();
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0]["order_status"], "cancelled");
        assert_eq!(recent[0]["product_name"], "Mug");
        assert!(recent.iter().all(|l| l["product_id"] != other_id));
    }

    #[tokio::test]
    async fn empty_store_has_zero_revenue_and_rating() {
        let app = TestApp::spawn().await;
        let (owner, _) = app.create_vendor("potter", "Clay & Co").await;

        let res = app.get_as(routes::MY_DASHBOARD, owner).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(decimal(&res.body["total_revenue"]), Decimal::ZERO);
        assert_eq!(res.body["average_rating"], 0.0);
        assert_eq!(res.body["recent_orders"], json!([]));
    }

    #[tokio::test]
    async fn average_rating_spans_all_products() {
        let app = TestApp::spawn().await;
        let category = app.create_category("Kitchen").await;
        let (owner, _) = app.create_vendor("potter", "Clay & Co").await;
        let mug = app.create_product(owner, category, "Mug", "25.00").await;
        let bowl = app.create_product(owner, category, "Bowl", "50.00").await;

        for (i, (res, rating)) in [(&mug, 5), (&mug, 4), (&bowl, 4)].into_iter().enumerate() {
            let user = app.create_user(&format!("reviewer{i}")).await;
            let slug = res.body["product"]["slug"].as_str().unwrap();
            let created = app
                .post_as(
                    &routes::product_reviews(slug),
                    &json!({ "rating": rating, "title": "Ok", "comment": "Fine" }),
                    user,
                )
                .await;
            assert_eq!(created.status, 201, "{}", created.text);
        }

        let res = app.get_as(routes::MY_DASHBOARD, owner).await;
        let average = res.body["average_rating"].as_f64().unwrap();
        assert!((average - 13.0 / 3.0).abs() < 1e-9, "got {average}");
    }

    #[tokio::test]
    async fn buyer_has_no_dashboard() {
        let app = TestApp::spawn().await;
        let buyer = app.create_user("buyer").await;

        let res = app.get_as(routes::MY_DASHBOARD, buyer).await;
        assert_eq!(res.status, 403);
    }
}

mod vendor_detail {
    use super::*;

    #[tokio::test]
    async fn detail_counts_active_products_per_category() {
        let app = TestApp::spawn().await;
        let kitchen = app.create_category("Kitchen").await;
        let garden = app.create_category("Garden").await;
        let (owner, vendor_id) = app.create_vendor("potter", "Clay & Co").await;

        app.create_product(owner, kitchen, "Mug", "5.00").await;
        app.create_product(owner, kitchen, "Bowl", "7.00").await;
        let planter = app.create_product(owner, garden, "Planter", "20.00").await;
        let hidden = app.create_product(owner, garden, "Old Pot", "3.00").await;
        let hidden_slug = hidden.body["product"]["slug"].as_str().unwrap();
        app.patch_as(&routes::product(hidden_slug), &json!({ "is_active": false }), owner)
            .await;

        let buyer = app.create_user("buyer").await;
        app.post_as(
            &routes::product_reviews(planter.body["product"]["slug"].as_str().unwrap()),
            &json!({ "rating": 3, "title": "Ok", "comment": "Small" }),
            buyer,
        )
        .await;

        let res = app.get(&routes::vendor(vendor_id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["vendor"]["store_name"], "Clay & Co");
        assert_eq!(res.body["active_products"], 3);
        assert_eq!(res.body["reviews_count"], 1);
        assert_eq!(res.body["average_rating"], 3.0);
        assert_eq!(
            res.body["categories"],
            json!([
                { "category_id": kitchen, "name": "Kitchen", "slug": "kitchen", "product_count": 2 },
                { "category_id": garden, "name": "Garden", "slug": "garden", "product_count": 1 },
            ])
        );

        let names: Vec<&str> = res.body["products"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Planter", "Bowl", "Mug"]);
    }

    #[tokio::test]
    async fn store_page_shows_twelve_newest_products() {
        let app = TestApp::spawn().await;
        let kitchen = app.create_category("Kitchen").await;
        let (owner, vendor_id) = app.create_vendor("potter", "Clay & Co").await;
        for i in 0..13 {
            app.create_product(owner, kitchen, &format!("Cup {i}"), "4.00").await;
        }

        let res = app.get(&routes::vendor(vendor_id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["active_products"], 13);
        let products = res.body["products"].as_array().unwrap();
        assert_eq!(products.len(), 12);
        assert_eq!(products[0]["name"], "Cup 12");
        assert_eq!(products[11]["name"], "Cup 1");
    }

    #[tokio::test]
    async fn unknown_vendor_is_not_found() {
        let app = TestApp::spawn().await;
        let res = app.get(&routes::vendor(9999)).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let app = TestApp::spawn().await;
        app.create_vendor("first", "First Store").await;
        app.create_vendor("second", "Second Store").await;

        let res = app.get(routes::VENDORS).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 2);
        assert_eq!(res.body["data"][0]["store_name"], "Second Store");
    }
}

mod own_products {
    use super::*;

    #[tokio::test]
    async fn listing_includes_deactivated_products() {
        let app = TestApp::spawn().await;
        let kitchen = app.create_category("Kitchen").await;
        let (owner, _) = app.create_vendor("potter", "Clay & Co").await;
        let (other, _) = app.create_vendor("smith", "Iron Works").await;

        let mug = app.create_product(owner, kitchen, "Mug", "5.00").await;
        app.create_product(owner, kitchen, "Bowl", "7.00").await;
        app.create_product(other, kitchen, "Pan", "30.00").await;
        let mug_slug = mug.body["product"]["slug"].as_str().unwrap();
        app.patch_as(&routes::product(mug_slug), &json!({ "is_active": false }), owner)
            .await;

        let res = app.get_as(routes::MY_PRODUCTS, owner).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 2);
        assert_eq!(res.body["pagination"]["per_page"], 20);
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data[0]["name"], "Bowl");
        assert_eq!(data[1]["name"], "Mug");
        assert_eq!(data[1]["is_active"], false);
        assert_eq!(data[1]["slug"], mug_slug);

        // Public views no longer show it.
        assert_eq!(app.get(&routes::product(mug_slug)).await.status, 404);
    }

    #[tokio::test]
    async fn listing_pages_newest_first() {
        let app = TestApp::spawn().await;
        let kitchen = app.create_category("Kitchen").await;
        let (owner, _) = app.create_vendor("potter", "Clay & Co").await;
        for i in 0..3 {
            app.create_product(owner, kitchen, &format!("Cup {i}"), "4.00").await;
        }

        let res = app
            .get_as(&format!("{}?page=2&per_page=2", routes::MY_PRODUCTS), owner)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total_pages"], 2);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["data"][0]["name"], "Cup 0");
    }

    #[tokio::test]
    async fn buyer_has_no_product_listing() {
        let app = TestApp::spawn().await;
        let buyer = app.create_user("buyer").await;

        let res = app.get_as(routes::MY_PRODUCTS, buyer).await;
        assert_eq!(res.status, 403);
        assert_eq!(app.get(routes::MY_PRODUCTS).await.status, 401);
    }
}

mod vendor_verification {
    use super::*;

    #[tokio::test]
    async fn staff_grants_and_revokes_the_badge() {
        let app = TestApp::spawn().await;
        let kitchen = app.create_category("Kitchen").await;
        let (owner, vendor_id) = app.create_vendor("potter", "Clay & Co").await;
        let product = app.create_product(owner, kitchen, "Mug", "5.00").await;
        let slug = product.body["product"]["slug"].as_str().unwrap();
        let staff = app.create_staff("moderator").await;

        let res = app
            .put_as(&routes::vendor_verification(vendor_id), &json!({ "is_verified": true }), staff)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["is_verified"], true);

        let store = app.get(&routes::vendor(vendor_id)).await;
        assert_eq!(store.body["vendor"]["is_verified"], true);
        let page = app.get(&routes::product(slug)).await;
        assert_eq!(page.body["vendor"]["is_verified"], true);

        let res = app
            .put_as(&routes::vendor_verification(vendor_id), &json!({ "is_verified": false }), staff)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["is_verified"], false);
    }

    #[tokio::test]
    async fn only_staff_can_verify() {
        let app = TestApp::spawn().await;
        let (owner, vendor_id) = app.create_vendor("potter", "Clay & Co").await;

        let res = app
            .put_as(&routes::vendor_verification(vendor_id), &json!({ "is_verified": true }), owner)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.code(), "PERMISSION_DENIED");

        let staff = app.create_staff("moderator").await;
        let res = app
            .put_as(&routes::vendor_verification(9999), &json!({ "is_verified": true }), staff)
            .await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn owner_cannot_set_the_badge_through_patch() {
        let app = TestApp::spawn().await;
        let (owner, vendor_id) = app.create_vendor("potter", "Clay & Co").await;

        let res = app
            .patch_as(
                &routes::vendor(vendor_id),
                &json!({ "store_description": "New", "is_verified": true }),
                owner,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["is_verified"], false);
    }
}

mod vendor_changes {
    use super::*;

    #[tokio::test]
    async fn owner_updates_store_and_profile() {
        let app = TestApp::spawn().await;
        let (owner, vendor_id) = app.create_vendor("potter", "Clay & Co").await;

        let res = app
            .patch_as(
                &routes::vendor(vendor_id),
                &json!({
                    "store_description": "Wheel-thrown stoneware",
                    "profile": { "website": "https://clay.example", "bank_account": "secret" },
                }),
                owner,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["store_description"], "Wheel-thrown stoneware");
        assert_eq!(res.body["store_name"], "Clay & Co");

        let own = app.get_as(routes::MY_VENDOR, owner).await;
        assert_eq!(own.body["profile"]["website"], "https://clay.example");
        assert!(own.body["profile"].get("bank_account").is_none());
    }

    #[tokio::test]
    async fn non_owner_cannot_update_or_delete() {
        let app = TestApp::spawn().await;
        let (_, vendor_id) = app.create_vendor("potter", "Clay & Co").await;
        let (rival, _) = app.create_vendor("rival", "Mugs R Us").await;

        let res = app
            .patch_as(&routes::vendor(vendor_id), &json!({ "store_name": "Mine" }), rival)
            .await;
        assert_eq!(res.status, 403);

        let res = app.delete_as(&routes::vendor(vendor_id), rival).await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn closing_store_reverts_owner_to_buyer() {
        let app = TestApp::spawn().await;
        let category = app.create_category("Kitchen").await;
        let (owner, vendor_id) = app.create_vendor("potter", "Clay & Co").await;
        let product = app.create_product(owner, category, "Mug", "5.00").await;
        let slug = product.body["product"]["slug"].as_str().unwrap().to_string();

        let res = app.delete_as(&routes::vendor(vendor_id), owner).await;
        assert_eq!(res.status, 204, "{}", res.text);

        assert_eq!(user_type(&app, owner).await, "buyer");
        assert_eq!(groups(&app, owner).await, vec!["Buyers"]);
        assert_eq!(app.get(&routes::vendor(vendor_id)).await.status, 404);
        assert_eq!(app.get(&routes::product(&slug)).await.status, 404);

        // The former owner may open a store again.
        app.register_vendor(owner, "Clay & Co Reborn").await;
        assert_eq!(user_type(&app, owner).await, "vendor");
    }

    #[tokio::test]
    async fn store_with_orders_cannot_be_closed() {
        let app = TestApp::spawn().await;
        let category = app.create_category("Kitchen").await;
        let (owner, vendor_id) = app.create_vendor("potter", "Clay & Co").await;
        let buyer = app.create_user("buyer").await;
        let product = app.create_product(owner, category, "Mug", "5.00").await;
        let product_id = product.body["product"]["id"].as_i64().unwrap() as i32;
        app.insert_order(buyer, OrderStatus::Delivered, &[(product_id, 1, "5.00")])
            .await;

        let res = app.delete_as(&routes::vendor(vendor_id), owner).await;
        assert_eq!(res.status, 409, "{}", res.text);
        assert_eq!(user_type(&app, owner).await, "vendor");
    }
}
