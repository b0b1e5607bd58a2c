mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Duration, Utc};

use community_api::error::ErrorKind;
use community_api::models::community::CommunityType;
use community_api::models::membership::MemberRole;
use community_api::models::post::PostStatus;
use community_api::service::{AllFeedOptions, CreateCommunity, FeedOptions};

fn feed_for(user_id: Option<&str>) -> FeedOptions {
    FeedOptions {
        user_id: user_id.map(str::to_string),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn feed_orders_pinned_then_announcement_then_newest() {
    let (service, store) = common::test_service();
    let owner_id = common::new_user_id();
    let community = common::setup_community(&service, &owner_id, false).await;
    let t0 = Utc::now();
    let id = Some(community.id.as_str());

    let pinned_t1 =
        common::insert_post(&store, id, true, false, PostStatus::Publish, t0 + Duration::seconds(1)).await;
    let ann_t3 =
        common::insert_post(&store, id, false, true, PostStatus::Publish, t0 + Duration::seconds(3)).await;
    let both_t2 =
        common::insert_post(&store, id, true, true, PostStatus::Publish, t0 + Duration::seconds(2)).await;
    let plain_t4 =
        common::insert_post(&store, id, false, false, PostStatus::Publish, t0 + Duration::seconds(4)).await;

    let feed = service
        .get_community_feed(&community.id, FeedOptions::default())
        .await
        .unwrap();

    let ids: Vec<&str> = feed.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(
        ids,
        [
            both_t2.id.as_str(),
            pinned_t1.id.as_str(),
            ann_t3.id.as_str(),
            plain_t4.id.as_str()
        ]
    );
}

#[tokio::test]
async fn feed_is_paginated_after_sorting() {
    let (service, store) = common::test_service();
    let owner_id = common::new_user_id();
    let community = common::setup_community(&service, &owner_id, false).await;
    let t0 = Utc::now();
    let id = Some(community.id.as_str());

    let mut newest_first = Vec::new();
    for i in 0..5 {
        let post = common::insert_post(
            &store,
            id,
            false,
            false,
            PostStatus::Publish,
            t0 + Duration::seconds(i),
        )
        .await;
        newest_first.insert(0, post.id);
    }

    let page = service
        .get_community_feed(
            &community.id,
            FeedOptions {
                limit: Some(2),
                offset: Some(1),
                user_id: None,
            },
        )
        .await
        .unwrap();

    let ids: Vec<String> = page.into_iter().map(|p| p.id).collect();
    assert_eq!(ids, newest_first[1..3]);
}

#[tokio::test]
async fn feed_limit_is_clamped() {
    let (service, store) = common::test_service();
    let owner_id = common::new_user_id();
    let community = common::setup_community(&service, &owner_id, false).await;
    let t0 = Utc::now();

    for i in 0..3 {
        common::insert_post(
            &store,
            Some(community.id.as_str()),
            false,
            false,
            PostStatus::Publish,
            t0 + Duration::seconds(i),
        )
        .await;
    }

    let page = service
        .get_community_feed(
            &community.id,
            FeedOptions {
                limit: Some(0),
                offset: Some(-5),
                user_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
}

#[tokio::test]
async fn feed_of_unknown_community_is_not_found() {
    let (service, _store) = common::test_service();

    let err = service
        .get_community_feed("com_missing", FeedOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn feed_excludes_other_communities_and_unlinked_posts() {
    let (service, store) = common::test_service();
    let owner_id = common::new_user_id();
    let community = common::setup_community(&service, &owner_id, false).await;
    let other = common::setup_community(&service, &owner_id, false).await;
    let now = Utc::now();

    let ours =
        common::insert_post(&store, Some(community.id.as_str()), false, false, PostStatus::Publish, now).await;
    common::insert_post(&store, Some(other.id.as_str()), false, false, PostStatus::Publish, now).await;
    common::insert_post(&store, None, false, false, PostStatus::Publish, now).await;

    let feed = service
        .get_community_feed(&community.id, FeedOptions::default())
        .await
        .unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].id, ours.id);
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pending_posts_are_visible_to_moderators_only() {
    let (service, _store) = common::test_service();
    let owner_id = common::new_user_id();
    let community = common::setup_community(&service, &owner_id, true).await;
    let admin_id = common::add_user(&service, &community.id, MemberRole::Admin).await;
    let member_id = common::add_user(&service, &community.id, MemberRole::Member).await;
    let stranger = common::new_user_id();

    let post = service
        .create_community_post(&community.id, &member_id, common::post_input("Awaiting review"))
        .await
        .unwrap();
    assert_eq!(post.status, PostStatus::Pending);

    for viewer in [None, Some(stranger.as_str()), Some(member_id.as_str())] {
        let feed = service
            .get_community_feed(&community.id, feed_for(viewer))
            .await
            .unwrap();
        assert!(feed.is_empty(), "pending post leaked to {viewer:?}");
    }

    for viewer in [owner_id.as_str(), admin_id.as_str()] {
        let feed = service
            .get_community_feed(&community.id, feed_for(Some(viewer)))
            .await
            .unwrap();
        assert_eq!(feed.len(), 1, "moderator {viewer} should see the pending post");
        assert_eq!(feed[0].id, post.id);
    }
}

// ---------------------------------------------------------------------------
// Merged feed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn merged_feed_spans_every_visible_community() {
    let (service, store) = common::test_service();
    let user_id = common::new_user_id();
    let global = service.ensure_global_community().await.unwrap();
    let branch = common::setup_community(&service, &user_id, false).await;
    let unrelated_owner = common::new_user_id();
    let unrelated = common::setup_community(&service, &unrelated_owner, false).await;
    let t0 = Utc::now();

    let in_global = common::insert_post(
        &store,
        Some(global.id.as_str()),
        false,
        false,
        PostStatus::Publish,
        t0 + Duration::seconds(1),
    )
    .await;
    let in_branch = common::insert_post(
        &store,
        Some(branch.id.as_str()),
        false,
        false,
        PostStatus::Publish,
        t0 + Duration::seconds(2),
    )
    .await;
    common::insert_post(&store, Some(unrelated.id.as_str()), true, true, PostStatus::Publish, t0).await;

    let feed = service
        .get_all_community_feed(&user_id, AllFeedOptions::default())
        .await
        .unwrap();
    let ids: Vec<&str> = feed.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, [in_branch.id.as_str(), in_global.id.as_str()]);

    let feed = service
        .get_all_community_feed(
            &user_id,
            AllFeedOptions {
                community_type: Some(CommunityType::Global),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0].id, in_global.id);
}

#[tokio::test]
async fn merged_feed_with_no_matching_type_is_empty() {
    let (service, store) = common::test_service();
    let user_id = common::new_user_id();
    let global = service.ensure_global_community().await.unwrap();
    common::insert_post(&store, Some(global.id.as_str()), false, false, PostStatus::Publish, Utc::now()).await;

    let feed = service
        .get_all_community_feed(
            &user_id,
            AllFeedOptions {
                community_type: Some(CommunityType::Division),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(feed.is_empty());
}

#[tokio::test]
async fn moderating_one_community_reveals_pending_posts_in_merged_feed() {
    let (service, store) = common::test_service();
    let user_id = common::new_user_id();
    let _moderated = common::setup_community(&service, &user_id, false).await;
    let other_owner = common::new_user_id();
    let joined = service
        .create_community(CreateCommunity::new("Joined", CommunityType::Division, &other_owner))
        .await
        .unwrap();
    service
        .join_community(&joined.id, &user_id, MemberRole::Member)
        .await
        .unwrap();
    let now = Utc::now();

    let pending_elsewhere =
        common::insert_post(&store, Some(joined.id.as_str()), false, false, PostStatus::Pending, now).await;

    let feed = service
        .get_all_community_feed(&user_id, AllFeedOptions::default())
        .await
        .unwrap();
    assert!(feed.iter().any(|p| p.id == pending_elsewhere.id));

    // Narrowed to the division only, the user moderates nothing.
    let feed = service
        .get_all_community_feed(
            &user_id,
            AllFeedOptions {
                community_type: Some(CommunityType::Division),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(feed.is_empty());

}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn http_feed_respects_caller_role() {
    let (app, state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let owner_id = common::new_user_id();
    let community = common::setup_community(&state.service, &owner_id, true).await;
    let member_id = common::add_user(&state.service, &community.id, MemberRole::Member).await;
    state
        .service
        .create_community_post(&community.id, &member_id, common::post_input("Needs approval"))
        .await
        .unwrap();
    let path = format!("/api/v1/communities/{}/feed", community.id);

    let resp = server.get(&path).await;
    resp.assert_status_ok();
    assert!(resp.json::<serde_json::Value>()["data"]
        .as_array()
        .unwrap()
        .is_empty());

    let resp = server
        .get(&path)
        .add_header(common::user_header(), owner_id)
        .await;
    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["status"], "pending");
}

#[tokio::test]
async fn http_merged_feed_requires_user() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server.get("/api/v1/feed").await;
    resp.assert_status(StatusCode::UNAUTHORIZED);

    let resp = server
        .get("/api/v1/feed?limit=5&type=global")
        .add_header(common::user_header(), common::new_user_id())
        .await;
    resp.assert_status_ok();
}
