mod common;

use axum::http::StatusCode;
use axum_test::TestServer;

use community_api::error::ErrorKind;
use community_api::models::community::{CommunityChanges, CommunityType};
use community_api::models::membership::MemberRole;
use community_api::service::{CreateCommunity, GLOBAL_COMMUNITY_NAME};
use yaksa_common::id::SYSTEM_USER_ID;

// ---------------------------------------------------------------------------
// ensure_global_community
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ensure_global_community_is_idempotent() {
    let (service, _store) = common::test_service();

    let first = service.ensure_global_community().await.unwrap();
    for _ in 0..5 {
        let again = service.ensure_global_community().await.unwrap();
        assert_eq!(again.id, first.id);
    }

    assert_eq!(first.community_type, CommunityType::Global);
    assert_eq!(first.name, GLOBAL_COMMUNITY_NAME);
    assert_eq!(first.owner_user_id.as_deref(), Some(SYSTEM_USER_ID));
    assert_eq!(first.metadata["is_system"], true);
    assert_eq!(first.metadata["auto_created"], true);

    let globals = service
        .list_communities_by_type(CommunityType::Global)
        .await
        .unwrap();
    assert_eq!(globals.len(), 1);
}

#[tokio::test]
async fn concurrent_first_callers_share_one_global_community() {
    let (service, _store) = common::test_service();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.ensure_global_community().await })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.dedup();
    assert_eq!(ids.len(), 1);

    let globals = service
        .list_communities_by_type(CommunityType::Global)
        .await
        .unwrap();
    assert_eq!(globals.len(), 1);
}

// ---------------------------------------------------------------------------
// create_community / get_community / list_communities_by_type
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_community_adds_owner_membership() {
    let (service, _store) = common::test_service();
    let owner_id = common::new_user_id();

    let mut input = CreateCommunity::new("Gangnam Branch", CommunityType::Branch, &owner_id);
    input.description = Some("Pharmacists in Gangnam".to_string());
    input.metadata = Some(serde_json::json!({ "region": "seoul" }));
    let community = service.create_community(input).await.unwrap();

    assert!(community.id.starts_with("com_"));
    assert_eq!(community.owner_user_id.as_deref(), Some(owner_id.as_str()));
    assert!(!community.require_approval);
    assert_eq!(community.metadata["region"], "seoul");

    let members = service.get_community_members(&community.id).await.unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].user_id, owner_id);
    assert_eq!(members[0].role, MemberRole::Owner);

    let fetched = service.get_community(&community.id).await.unwrap();
    assert_eq!(fetched, Some(community));
}

#[tokio::test]
async fn get_community_returns_none_for_unknown_id() {
    let (service, _store) = common::test_service();
    assert!(service.get_community("com_missing").await.unwrap().is_none());
}

#[tokio::test]
async fn create_community_rejects_blank_name_and_global_type() {
    let (service, _store) = common::test_service();
    let owner_id = common::new_user_id();

    let err = service
        .create_community(CreateCommunity::new("   ", CommunityType::Personal, &owner_id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = service
        .create_community(CreateCommunity::new("Second global", CommunityType::Global, &owner_id))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let mut input = CreateCommunity::new("Bad metadata", CommunityType::Personal, &owner_id);
    input.metadata = Some(serde_json::json!(["not", "an", "object"]));
    let err = service.create_community(input).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn list_communities_by_type_is_newest_first() {
    let (service, _store) = common::test_service();
    let owner_id = common::new_user_id();

    let mut created = Vec::new();
    for name in ["First Division", "Second Division", "Third Division"] {
        let community = service
            .create_community(CreateCommunity::new(name, CommunityType::Division, &owner_id))
            .await
            .unwrap();
        created.push(community.id);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    service
        .create_community(CreateCommunity::new("A branch", CommunityType::Branch, &owner_id))
        .await
        .unwrap();

    let listed: Vec<String> = service
        .list_communities_by_type(CommunityType::Division)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();

    created.reverse();
    assert_eq!(listed, created);
}

// ---------------------------------------------------------------------------
// update_community_settings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admins_can_turn_on_approval_but_members_cannot() {
    let (service, _store) = common::test_service();
    let owner_id = common::new_user_id();
    let community = common::setup_community(&service, &owner_id, false).await;
    let admin_id = common::add_user(&service, &community.id, MemberRole::Admin).await;
    let member_id = common::add_user(&service, &community.id, MemberRole::Member).await;

    let changes = CommunityChanges {
        require_approval: Some(true),
        ..Default::default()
    };

    let err = service
        .update_community_settings(&community.id, &member_id, changes.clone())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let updated = service
        .update_community_settings(&community.id, &admin_id, changes)
        .await
        .unwrap();
    assert!(updated.require_approval);
    assert_eq!(updated.name, community.name);
    assert!(updated.updated_at >= community.updated_at);

    let err = service
        .update_community_settings("com_missing", &owner_id, CommunityChanges::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ---------------------------------------------------------------------------
// list_my_communities
// ---------------------------------------------------------------------------

#[tokio::test]
async fn user_without_memberships_sees_only_global() {
    let (service, _store) = common::test_service();
    let user_id = common::new_user_id();

    let mine = service.list_my_communities(&user_id).await.unwrap();

    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].community_type, CommunityType::Global);
}

#[tokio::test]
async fn global_is_prepended_to_explicit_memberships() {
    let (service, _store) = common::test_service();
    let owner_id = common::new_user_id();

    let first = common::setup_community(&service, &owner_id, false).await;
    let second = service
        .create_community(CreateCommunity::new("Personal", CommunityType::Personal, &owner_id))
        .await
        .unwrap();

    let mine = service.list_my_communities(&owner_id).await.unwrap();
    let types: Vec<CommunityType> = mine.iter().map(|c| c.community_type).collect();
    assert_eq!(
        types,
        [CommunityType::Global, CommunityType::Branch, CommunityType::Personal]
    );
    assert_eq!(mine[1].id, first.id);
    assert_eq!(mine[2].id, second.id);
}

#[tokio::test]
async fn explicit_global_membership_is_not_duplicated() {
    let (service, _store) = common::test_service();
    let user_id = common::new_user_id();
    let global = service.ensure_global_community().await.unwrap();

    service
        .join_community(&global.id, &user_id, MemberRole::Member)
        .await
        .unwrap();

    let mine = service.list_my_communities(&user_id).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, global.id);
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn http_create_and_fetch_community() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();
    let owner_id = common::new_user_id();

    let resp = server
        .post("/api/v1/communities")
        .add_header(common::user_header(), owner_id.clone())
        .json(&serde_json::json!({
            "name": "Busan Branch",
            "type": "branch",
            "require_approval": true
        }))
        .await;

    resp.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["name"], "Busan Branch");
    assert_eq!(body["type"], "branch");
    assert_eq!(body["owner_user_id"], owner_id);
    assert_eq!(body["require_approval"], true);

    let id = body["id"].as_str().unwrap();
    let resp = server.get(&format!("/api/v1/communities/{id}")).await;
    resp.assert_status_ok();
    assert_eq!(resp.json::<serde_json::Value>()["id"], id);

    let resp = server.get("/api/v1/communities?type=branch").await;
    resp.assert_status_ok();
    let listed: serde_json::Value = resp.json();
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn http_create_community_requires_user() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .post("/api/v1/communities")
        .json(&serde_json::json!({ "name": "Anonymous", "type": "personal" }))
        .await;

    resp.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json::<serde_json::Value>()["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn http_unknown_community_is_404() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server.get("/api/v1/communities/com_missing").await;

    resp.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(resp.json::<serde_json::Value>()["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn http_mine_lists_global_for_new_user() {
    let (app, _state, _store) = common::test_app();
    let server = TestServer::new(app).unwrap();

    let resp = server
        .get("/api/v1/communities/mine")
        .add_header(common::user_header(), common::new_user_id())
        .await;

    resp.assert_status_ok();
    let body: serde_json::Value = resp.json();
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["type"], "global");
}
