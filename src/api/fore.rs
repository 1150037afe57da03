use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::{ConnectInfo, Path, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    error::Result,
    model::{ArticleComment, CategoryInfo, Comment, CommentForm},
    service::{ArticleDto, ArticleWithPictureDto},
    state::AppState,
    storage::Storage,
};

/// 配置前台路由。
///
/// 路由包括：
/// - `GET /article/list`：所有文章，置顶在前
/// - `GET /article/list/sort/{id}`：某个分类下的文章
/// - `GET /article/list/lastest`：最新的几篇文章
/// - `GET /article/{id}`：单篇文章，正文渲染为 HTML
/// - `GET /category/list`：所有分类
/// - `GET /comment/list`：所有留言
/// - `GET|POST /comment/article/{id}`：文章评论
/// - `POST /comment`：新增留言
pub fn setup_route<S: Storage>() -> Router<AppState<S>> {
    Router::new()
        .route("/article/list", get(article_list::<S>))
        .route("/article/list/sort/{id}", get(article_list_by_category::<S>))
        .route("/article/list/lastest", get(article_list_latest::<S>))
        .route("/article/{id}", get(article::<S>))
        .route("/category/list", get(category_list::<S>))
        .route("/comment/list", get(comment_list::<S>))
        .route(
            "/comment/article/{id}",
            get(article_comment_list::<S>).post(add_article_comment::<S>),
        )
        .route("/comment", post(add_comment::<S>))
}

async fn article_list<S: Storage>(
    State(app): State<AppState<S>>,
) -> Result<Json<Vec<ArticleWithPictureDto>>> {
    app.articles().list_all().await.map(Json)
}

async fn article_list_by_category<S: Storage>(
    Path(id): Path<i64>,
    State(app): State<AppState<S>>,
) -> Result<Json<Vec<ArticleWithPictureDto>>> {
    app.articles().list_by_category_id(id).await.map(Json)
}

async fn article_list_latest<S: Storage>(
    State(app): State<AppState<S>>,
) -> Result<Json<Vec<ArticleWithPictureDto>>> {
    app.articles().list_latest().await.map(Json)
}

/// 根据 id 获取单篇文章，markdown 正文转换为 HTML 后返回。
async fn article<S: Storage>(
    Path(id): Path<i64>,
    State(app): State<AppState<S>>,
) -> Result<Json<ArticleDto>> {
    let mut article = app.articles().get_one_by_id(id).await?;
    article.content = app.renderer().render(&article.content);
    Ok(Json(article))
}

async fn category_list<S: Storage>(
    State(app): State<AppState<S>>,
) -> Result<Json<Vec<CategoryInfo>>> {
    app.categories().list_all().await.map(Json)
}

async fn comment_list<S: Storage>(State(app): State<AppState<S>>) -> Result<Json<Vec<Comment>>> {
    app.comments().list_all().await.map(Json)
}

async fn article_comment_list<S: Storage>(
    Path(id): Path<i64>,
    State(app): State<AppState<S>>,
) -> Result<Json<Vec<ArticleComment>>> {
    app.comments().list_by_article_id(id).await.map(Json)
}

/// 给文章增加一条评论，ip 取自对端地址。
async fn add_article_comment<S: Storage>(
    Path(id): Path<i64>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(app): State<AppState<S>>,
    Json(form): Json<CommentForm>,
) -> Result<StatusCode> {
    app.comments()
        .add_to_article(id, form, &peer.ip().to_string())
        .await?;
    Ok(StatusCode::OK)
}

/// 增加一条留言，ip 取自对端地址。
async fn add_comment<S: Storage>(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(app): State<AppState<S>>,
    Json(form): Json<CommentForm>,
) -> Result<StatusCode> {
    app.comments().add(form, &peer.ip().to_string()).await?;
    Ok(StatusCode::OK)
}
