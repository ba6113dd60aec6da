use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aggregator_service::{handlers, Aggregator, Config};

const TOKEN: &str = "test-token";

fn config_for(server: &MockServer) -> Config {
    Config::from_vars(vec![
        ("BASE_URL".to_string(), server.uri()),
        ("ACCESS_TOKEN".to_string(), TOKEN.to_string()),
        ("UPSTREAM_TIMEOUT_SECS".to_string(), "1".to_string()),
        ("MAX_CONCURRENT_REQUESTS".to_string(), "4".to_string()),
    ])
    .expect("valid config")
}

async fn call(server: &MockServer, uri: &str) -> (StatusCode, Value) {
    let aggregator = Aggregator::from_config(&config_for(server)).expect("aggregator");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(aggregator))
            .configure(handlers::configure),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
    let status = resp.status();
    let body: Value = test::read_body_json(resp).await;
    (status, body)
}

async fn mount_users(server: &MockServer, users: Value) {
    Mock::given(method("GET"))
        .and(path("/users"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(users))
        .mount(server)
        .await;
}

async fn mount_posts(server: &MockServer, user_id: &str, posts: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/users/{}/posts", user_id)))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts))
        .mount(server)
        .await;
}

async fn mount_comments(server: &MockServer, post_id: i64, count: usize) {
    let comments: Vec<Value> = (0..count)
        .map(|i| json!({"id": i, "postId": post_id, "content": "nice"}))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/posts/{}/comments", post_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(comments))
        .mount(server)
        .await;
}

fn posts_of(user_id: &str, ids: &[i64]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| json!({"id": id, "userId": user_id, "content": format!("post {}", id)}))
            .collect(),
    )
}

fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .expect("array")
        .iter()
        .map(|p| p["id"].as_i64().expect("numeric id"))
        .collect()
}

// ==================== GET /users/top ====================

#[actix_web::test]
async fn top_users_counts_posts_per_user() {
    let server = MockServer::start().await;
    mount_users(&server, json!({"u1": "Alice", "u2": "Bob"})).await;
    mount_posts(&server, "u1", posts_of("u1", &[1, 2, 3])).await;
    mount_posts(&server, "u2", posts_of("u2", &[4])).await;

    let (status, body) = call(&server, "/users/top").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "top_users": [
                {"user_id": "u1", "name": "Alice", "post_count": 3},
                {"user_id": "u2", "name": "Bob", "post_count": 1}
            ]
        })
    );
}

#[actix_web::test]
async fn top_users_returns_five_highest() {
    let server = MockServer::start().await;
    mount_users(
        &server,
        json!({"1": "A", "2": "B", "3": "C", "4": "D", "5": "E", "6": "F", "7": "G"}),
    )
    .await;
    let counts = [("1", 0), ("2", 4), ("3", 1), ("4", 2), ("5", 2), ("6", 5), ("7", 1)];
    let mut next_id = 0;
    for (user, count) in counts {
        let post_ids: Vec<i64> = (next_id..next_id + count).collect();
        next_id += count;
        mount_posts(&server, user, posts_of(user, &post_ids)).await;
    }

    let (status, body) = call(&server, "/users/top").await;

    assert_eq!(status, StatusCode::OK);
    let top = body["top_users"].as_array().expect("top_users");
    let returned: Vec<(&str, u64)> = top
        .iter()
        .map(|u| {
            (
                u["user_id"].as_str().expect("user_id"),
                u["post_count"].as_u64().expect("post_count"),
            )
        })
        .collect();
    // Users 3 and 7 tie at one post; upstream order keeps 3 ahead
    assert_eq!(
        returned,
        vec![("6", 5), ("2", 4), ("4", 2), ("5", 2), ("3", 1)]
    );
}

#[actix_web::test]
async fn top_users_accepts_wrapped_payloads() {
    let server = MockServer::start().await;
    mount_users(&server, json!({"users": {"10": "Zed", "11": "Amy"}})).await;
    mount_posts(&server, "10", json!({"posts": [{"id": 1, "userId": 10}]})).await;
    mount_posts(
        &server,
        "11",
        json!({"posts": [{"id": 2, "userId": 11}, {"id": 3, "userId": 11}]}),
    )
    .await;

    let (status, body) = call(&server, "/users/top").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["top_users"][0]["name"], "Amy");
    assert_eq!(body["top_users"][0]["post_count"], 2);
    assert_eq!(body["top_users"][1]["name"], "Zed");
}

#[actix_web::test]
async fn top_users_passes_through_upstream_status() {
    let server = MockServer::start().await;
    mount_users(&server, json!({"u1": "Alice", "u2": "Bob"})).await;
    mount_posts(&server, "u1", posts_of("u1", &[1])).await;
    Mock::given(method("GET"))
        .and(path("/users/u2/posts"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (status, body) = call(&server, "/users/top").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
    assert!(body.get("top_users").is_none());
}

#[actix_web::test]
async fn top_users_unreachable_upstream_is_500() {
    // Nothing listens on port 1, so the connection is refused
    let config = Config::from_vars(vec![
        ("BASE_URL".to_string(), "http://127.0.0.1:1".to_string()),
        ("ACCESS_TOKEN".to_string(), TOKEN.to_string()),
    ])
    .expect("valid config");

    let aggregator = Aggregator::from_config(&config).expect("aggregator");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(aggregator))
            .configure(handlers::configure),
    )
    .await;
    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/users/top").to_request()).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn top_users_times_out_slow_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"u1": "Alice"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let (status, body) = call(&server, "/users/top").await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body["error"].is_string());
}

// ==================== GET /posts ====================

#[actix_web::test]
async fn latest_posts_sorted_newest_first() {
    let server = MockServer::start().await;
    mount_users(&server, json!({"u1": "Alice", "u2": "Bob"})).await;
    mount_posts(&server, "u1", posts_of("u1", &[5])).await;
    mount_posts(&server, "u2", posts_of("u2", &[2, 9])).await;

    let (status, body) = call(&server, "/posts?type=latest").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["latest_posts"]), vec![9, 5, 2]);
    assert_eq!(body["latest_posts"][0]["userId"], "u2");
    assert!(body.get("popular_posts").is_none());
}

#[actix_web::test]
async fn latest_posts_capped_at_five() {
    let server = MockServer::start().await;
    mount_users(&server, json!({"u1": "Alice", "u2": "Bob"})).await;
    mount_posts(&server, "u1", posts_of("u1", &[11, 3, 7, 1])).await;
    mount_posts(&server, "u2", posts_of("u2", &[4, 12, 8])).await;

    let (status, body) = call(&server, "/posts?type=latest").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body["latest_posts"]), vec![12, 11, 8, 7, 4]);
}

#[actix_web::test]
async fn popular_posts_returns_all_tied_at_max() {
    let server = MockServer::start().await;
    mount_users(&server, json!({"u1": "Alice", "u2": "Bob"})).await;
    mount_posts(&server, "u1", posts_of("u1", &[1, 2])).await;
    mount_posts(&server, "u2", posts_of("u2", &[3])).await;
    mount_comments(&server, 1, 2).await;
    mount_comments(&server, 2, 0).await;
    mount_comments(&server, 3, 2).await;

    let (status, body) = call(&server, "/posts?type=popular").await;

    assert_eq!(status, StatusCode::OK);
    let popular = &body["popular_posts"];
    assert_eq!(ids(popular), vec![1, 3]);
    for post in popular.as_array().expect("array") {
        assert_eq!(post["comment_count"], 2);
        assert!(post["content"].is_string());
    }
}

#[actix_web::test]
async fn popular_posts_empty_when_no_posts_exist() {
    let server = MockServer::start().await;
    mount_users(&server, json!({"u1": "Alice"})).await;
    mount_posts(&server, "u1", json!([])).await;
    Mock::given(method("GET"))
        .and(path("/posts/0/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = call(&server, "/posts?type=popular").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"popular_posts": []}));
}

#[actix_web::test]
async fn popular_posts_comment_failure_aborts() {
    let server = MockServer::start().await;
    mount_users(&server, json!({"u1": "Alice"})).await;
    mount_posts(&server, "u1", posts_of("u1", &[1, 2])).await;
    mount_comments(&server, 1, 3).await;
    Mock::given(method("GET"))
        .and(path("/posts/2/comments"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (status, body) = call(&server, "/posts?type=popular").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Request failed with status code 503");
    assert!(body.get("popular_posts").is_none());
}

#[actix_web::test]
async fn posts_pass_through_upstream_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (status, body) = call(&server, "/posts?type=latest").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
    assert!(body.get("latest_posts").is_none());
    assert!(body.get("popular_posts").is_none());
}

#[actix_web::test]
async fn invalid_or_missing_type_is_rejected_without_upstream_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    for uri in ["/posts?type=invalid", "/posts", "/posts?type=", "/posts?type=LATEST"] {
        let (status, body) = call(&server, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {}", uri);
        assert_eq!(body, json!({"error": "Invalid type. Use 'popular' or 'latest'."}));
    }

    server.verify().await;
}

// ==================== GET /health ====================

#[actix_web::test]
async fn health_check_returns_ok() {
    let server = MockServer::start().await;
    let aggregator = Aggregator::from_config(&config_for(&server)).expect("aggregator");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(aggregator))
            .configure(handlers::configure),
    )
    .await;

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(&body[..], b"OK");
}
