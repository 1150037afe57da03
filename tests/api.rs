use std::net::SocketAddr;

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::{Request, connect_info::MockConnectInfo},
    http::{Response, StatusCode},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use yblog::{
    api,
    render::MarkdownRenderer,
    state::AppState,
    storage::{MemoryStore, PgStore, Storage, migrate, new_db_pool},
};

const ADMIN_TOKEN: &str = "test-admin-token";

struct TestApp {
    router: Router,
}

impl TestApp {
    fn new<S: Storage>(store: S, admin_token: Option<&str>) -> Self {
        let app = AppState::new(store, MarkdownRenderer, admin_token.map(str::to_string));

        let router = api::setup_route(app)
            .layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4321))));

        Self { router }
    }

    fn memory() -> Self {
        Self::new(MemoryStore::new(), Some(ADMIN_TOKEN))
    }

    async fn request(&self, req: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("oneshot fail")
    }

    async fn status(&self, req: Request<Body>) -> StatusCode {
        self.request(req).await.status()
    }

    async fn get_json(&self, uri: &str, msg: &str) -> Value {
        let req = Request::get(uri).body(Body::empty()).expect("请求失败");
        let resp = self.request(req).await;
        assert_eq!(StatusCode::OK, resp.status(), "{}", msg);
        let data = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("读取数据失败");
        serde_json::from_slice(&data).expect("反序列化失败")
    }

    async fn post_json(&self, uri: &str, body: Value) -> Response<Body> {
        let req = Request::post(uri)
            .header("Content-Type", "application/json")
            .body(Body::new(body.to_string()))
            .expect("请求失败");
        self.request(req).await
    }

    async fn admin(&self, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Authorization", format!("Bearer {ADMIN_TOKEN}"));
        let req = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::new(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("请求失败");
        self.request(req).await
    }

    async fn admin_create(&self, uri: &str, body: Value) -> i64 {
        let resp = self.admin("POST", uri, Some(body)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let data = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("读取数据失败");
        let created: Value = serde_json::from_slice(&data).expect("反序列化失败");
        created["id"].as_i64().expect("缺少 id")
    }

    async fn add_article(&self, title: &str, category_id: i64) -> i64 {
        self.admin_create(
            "/api/admin/article",
            json!({
                "title": title,
                "summary": format!("{title} summary"),
                "content": format!("# {title}\n\nbody of *{title}*"),
                "pictureUrl": format!("https://img.example/{title}.png"),
                "categoryId": category_id,
            }),
        )
        .await
    }
}

fn titles(list: &Value) -> Vec<&str> {
    list.as_array()
        .expect("应为数组")
        .iter()
        .map(|a| a["title"].as_str().expect("缺少 title"))
        .collect()
}

#[tokio::test]
async fn test_article_endpoints() {
    let app = TestApp::memory();

    assert_eq!(
        app.get_json("/api/article/list", "空库").await,
        json!([]),
        "空库应返回空列表"
    );

    let rust = app
        .admin_create("/api/admin/category", json!({ "name": "rust" }))
        .await;
    let go = app
        .admin_create("/api/admin/category", json!({ "name": "go" }))
        .await;

    let mut ids = Vec::new();
    for (n, category) in [rust, go, rust, go, rust, rust].into_iter().enumerate() {
        ids.push(app.add_article(&format!("a{n}"), category).await);
    }

    // 置顶 a3
    let resp = app
        .admin(
            "PUT",
            &format!("/api/admin/article/{}", ids[3]),
            Some(json!({
                "title": "a3",
                "summary": "a3 summary",
                "content": "# a3",
                "pictureUrl": "https://img.example/a3.png",
                "categoryId": go,
                "top": true,
            })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let all = app.get_json("/api/article/list", "所有文章").await;
    assert_eq!(titles(&all), vec!["a3", "a0", "a1", "a2", "a4", "a5"]);
    assert_eq!(all[0]["top"], json!(true));
    assert_eq!(all[1]["pictureUrl"], json!("https://img.example/a0.png"));

    let latest = app.get_json("/api/article/list/lastest", "最新文章").await;
    assert_eq!(titles(&latest), vec!["a3", "a0", "a1", "a2", "a4"]);

    let by_go = app
        .get_json(&format!("/api/article/list/sort/{go}"), "分类文章")
        .await;
    assert_eq!(titles(&by_go), vec!["a3", "a1"]);

    let article = app
        .get_json(&format!("/api/article/{}", ids[0]), "单篇文章")
        .await;
    assert_eq!(article["title"], json!("a0"));
    assert_eq!(article["categoryId"], json!(rust));
    assert_eq!(article["categoryName"], json!("rust"));
    assert_eq!(article["traffic"], json!(1));
    let content = article["content"].as_str().expect("缺少 content");
    assert!(content.contains("<h1>a0</h1>"), "正文应渲染为 HTML: {content}");
    assert!(content.contains("<em>a0</em>"), "{content}");

    let again = app
        .get_json(&format!("/api/article/{}", ids[0]), "再次获取")
        .await;
    assert_eq!(again["traffic"], json!(2));

    let categories = app.get_json("/api/category/list", "所有分类").await;
    assert_eq!(categories[0]["number"], json!(4));
    assert_eq!(categories[1]["number"], json!(2));
}

#[tokio::test]
async fn test_article_errors() {
    let app = TestApp::memory();

    let missing = Request::get("/api/article/42").body(Body::empty()).unwrap();
    assert_eq!(app.status(missing).await, StatusCode::NOT_FOUND);

    let bad_id = Request::get("/api/article/abc").body(Body::empty()).unwrap();
    assert_eq!(app.status(bad_id).await, StatusCode::BAD_REQUEST);

    let resp = app.admin("DELETE", "/api/admin/article/42", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_comment_endpoints() {
    let app = TestApp::memory();

    let resp = app
        .post_json("/api/comment/article/5", json!({ "content": "hi", "name": "Bob" }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert!(body.is_empty(), "新增评论不返回内容");

    let comments = app
        .get_json("/api/comment/article/5", "文章评论")
        .await;
    assert_eq!(comments.as_array().map(Vec::len), Some(1));
    assert_eq!(comments[0]["content"], json!("hi"));
    assert_eq!(comments[0]["name"], json!("Bob"));
    assert_eq!(comments[0]["ip"], json!("127.0.0.1"));
    assert_eq!(comments[0]["articleId"], json!(5));
    assert_eq!(comments[0]["email"], Value::Null);

    assert_eq!(
        app.get_json("/api/comment/article/6", "其他文章").await,
        json!([])
    );

    let resp = app
        .post_json(
            "/api/comment",
            json!({ "content": "guestbook", "name": "Alice", "email": "a@example.com" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let messages = app.get_json("/api/comment/list", "留言").await;
    assert_eq!(messages.as_array().map(Vec::len), Some(1));
    assert_eq!(messages[0]["email"], json!("a@example.com"));
    assert_eq!(messages[0]["ip"], json!("127.0.0.1"));
    assert!(messages[0]["createdAt"].is_string());

    let resp = app
        .post_json("/api/comment", json!({ "content": "no name" }))
        .await;
    assert!(resp.status().is_client_error(), "缺少 name 应拒绝");
}

#[tokio::test]
async fn test_admin_requires_token() {
    let app = TestApp::memory();

    let no_header = Request::post("/api/admin/category")
        .header("Content-Type", "application/json")
        .body(Body::new(json!({ "name": "x" }).to_string()))
        .unwrap();
    assert_eq!(app.status(no_header).await, StatusCode::UNAUTHORIZED);

    let wrong = Request::get("/api/admin/article/incomplete")
        .header("Authorization", "Bearer nope")
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.status(wrong).await, StatusCode::UNAUTHORIZED);

    let resp = app.admin("GET", "/api/admin/article/incomplete", None).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let disabled = TestApp::new(MemoryStore::new(), None);
    let req = Request::get("/api/admin/article/incomplete")
        .header("Authorization", format!("Bearer {ADMIN_TOKEN}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(disabled.status(req).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_category_maintenance() {
    let app = TestApp::memory();

    let old = app
        .admin_create("/api/admin/category", json!({ "name": "old" }))
        .await;
    let new = app
        .admin_create("/api/admin/category", json!({ "name": "new" }))
        .await;
    let id = app.add_article("moving", old).await;

    let resp = app
        .admin("DELETE", &format!("/api/admin/category/{old}"), None)
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT, "分类下有文章，不能删除");

    let resp = app
        .admin(
            "PUT",
            &format!("/api/admin/article/{id}/category/{new}"),
            None,
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let categories = app.get_json("/api/category/list", "分类").await;
    assert_eq!(categories[0]["number"], json!(0));
    assert_eq!(categories[1]["number"], json!(1));

    let resp = app
        .admin(
            "PUT",
            &format!("/api/admin/category/{new}"),
            Some(json!({ "name": "renamed" })),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .admin("DELETE", &format!("/api/admin/category/{old}"), None)
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.admin("POST", "/api/admin/category/recount", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let data = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let changed: Value = serde_json::from_slice(&data).unwrap();
    assert_eq!(changed, json!([]), "计数一直是成对维护的");

    let resp = app
        .admin("DELETE", &format!("/api/admin/article/{id}"), None)
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let categories = app.get_json("/api/category/list", "分类").await;
    assert_eq!(categories, json!([{ "id": new, "name": "renamed", "number": 0 }]));
}

#[tokio::test]
#[ignore = "API测试 依赖真实数据库"]
async fn test_api_postgres() {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let db = new_db_pool(&url).await.expect("连接数据库失败");
    migrate(&db).await.expect("初始化sql失败");

    let app = TestApp::new(PgStore::new(db), Some(ADMIN_TOKEN));

    let category = app
        .admin_create("/api/admin/category", json!({ "name": "pg" }))
        .await;
    let id = app.add_article("pg-article", category).await;

    let article = app
        .get_json(&format!("/api/article/{id}"), "获取文章")
        .await;
    assert_eq!(article["title"], json!("pg-article"));
    assert_eq!(article["traffic"], json!(1));

    let by_category = app
        .get_json(&format!("/api/article/list/sort/{category}"), "分类文章")
        .await;
    assert_eq!(titles(&by_category), vec!["pg-article"]);

    let resp = app
        .admin("DELETE", &format!("/api/admin/article/{id}"), None)
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let missing = Request::get(format!("/api/article/{id}"))
        .body(Body::empty())
        .unwrap();
    assert_eq!(app.status(missing).await, StatusCode::NOT_FOUND);
}
