use axum::{
    Json, Router,
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::{
    error::{ApiError, Error, Result},
    model::CategoryInfo,
    service::ArticleDto,
    state::AppState,
    storage::Storage,
};

/// 配置管理路由，全部需要 `Authorization: Bearer <token>`。
///
/// 路由包括：
/// - `POST /article`、`PUT|DELETE /article/{id}`：文章增删改
/// - `PUT /article/{id}/category/{category_id}`：修改文章分类
/// - `GET /article/incomplete`：缺少组成记录的文章
/// - `POST /category`、`PUT|DELETE /category/{id}`：分类增删改
/// - `POST /category/recount`：重新计算分类文章数
pub fn setup_route<S: Storage>(app: AppState<S>) -> Router<AppState<S>> {
    Router::new()
        .route("/article", post(add_article::<S>))
        .route("/article/incomplete", get(incomplete_articles::<S>))
        .route(
            "/article/{id}",
            put(update_article::<S>).delete(delete_article::<S>),
        )
        .route(
            "/article/{id}/category/{category_id}",
            put(update_article_category::<S>),
        )
        .route("/category", post(add_category::<S>))
        .route("/category/recount", post(recount_categories::<S>))
        .route(
            "/category/{id}",
            put(rename_category::<S>).delete(delete_category::<S>),
        )
        .route_layer(middleware::from_fn_with_state(app, require_admin::<S>))
}

/// 校验管理 token，未配置 token 时管理接口不存在
async fn require_admin<S: Storage>(
    State(app): State<AppState<S>>,
    req: Request,
    next: Next,
) -> Result<Response> {
    let Some(expected) = app.admin_token() else {
        return Err(Error::not_found());
    };

    let authorized = req
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .is_some_and(|auth| bool::from(auth.token().as_bytes().ct_eq(expected.as_bytes())));

    if !authorized {
        tracing::warn!(path = %req.uri().path(), "admin request rejected");
        return Err(ApiError::Unauthorized.into());
    }
    Ok(next.run(req).await)
}

#[derive(Debug, Serialize)]
struct Created {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct CategoryForm {
    name: String,
}

async fn add_article<S: Storage>(
    State(app): State<AppState<S>>,
    Json(article): Json<ArticleDto>,
) -> Result<(StatusCode, Json<Created>)> {
    let id = app.articles().add(&article).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

async fn update_article<S: Storage>(
    Path(id): Path<i64>,
    State(app): State<AppState<S>>,
    Json(article): Json<ArticleDto>,
) -> Result<StatusCode> {
    app.articles().update(id, &article).await?;
    Ok(StatusCode::OK)
}

async fn delete_article<S: Storage>(
    Path(id): Path<i64>,
    State(app): State<AppState<S>>,
) -> Result<StatusCode> {
    app.articles().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn update_article_category<S: Storage>(
    Path((id, category_id)): Path<(i64, i64)>,
    State(app): State<AppState<S>>,
) -> Result<StatusCode> {
    app.articles().update_category(id, category_id).await?;
    Ok(StatusCode::OK)
}

async fn incomplete_articles<S: Storage>(State(app): State<AppState<S>>) -> Result<Json<Vec<i64>>> {
    app.articles().incomplete_articles().await.map(Json)
}

async fn add_category<S: Storage>(
    State(app): State<AppState<S>>,
    Json(form): Json<CategoryForm>,
) -> Result<(StatusCode, Json<Created>)> {
    let id = app.categories().add(&form.name).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

async fn rename_category<S: Storage>(
    Path(id): Path<i64>,
    State(app): State<AppState<S>>,
    Json(form): Json<CategoryForm>,
) -> Result<StatusCode> {
    app.categories().rename(id, &form.name).await?;
    Ok(StatusCode::OK)
}

async fn delete_category<S: Storage>(
    Path(id): Path<i64>,
    State(app): State<AppState<S>>,
) -> Result<StatusCode> {
    app.categories().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn recount_categories<S: Storage>(
    State(app): State<AppState<S>>,
) -> Result<Json<Vec<CategoryInfo>>> {
    app.categories().recount().await.map(Json)
}
