use std::io;

use axum::{http::StatusCode, response::IntoResponse};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not Found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),
}

/// 文章组成部分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArticlePart {
    Content,
    Picture,
    Category,
    CategoryInfo,
}

impl std::fmt::Display for ArticlePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ArticlePart::Content => "content",
            ArticlePart::Picture => "picture",
            ArticlePart::Category => "category",
            ArticlePart::CategoryInfo => "category info",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    ApiError(#[from] ApiError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("config error: {0}")]
    Config(String),

    /// 文章缺少某个组成行，无法组装
    #[error("article {article_id} has no {missing} row")]
    IncompleteArticle { article_id: i64, missing: ArticlePart },
}

impl Error {
    pub fn not_found() -> Self {
        Error::ApiError(ApiError::NotFound)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.message().to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Error::Sqlx(e) => {
                tracing::error!(%e, "sqlx error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            .into_response(),
            Error::Io(e) => {
                tracing::error!(%e, "file io error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            .into_response(),
            Error::IncompleteArticle {
                article_id,
                missing,
            } => {
                tracing::error!(article_id, %missing, "incomplete article");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
            .into_response(),
            Error::Config(s) => (StatusCode::INTERNAL_SERVER_ERROR, s).into_response(),
            Error::ApiError(api_error) => match api_error {
                ApiError::NotFound => (StatusCode::NOT_FOUND, "NOT FOUND").into_response(),
                ApiError::Unauthorized => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED").into_response()
                }
                ApiError::Conflict(s) => (StatusCode::CONFLICT, s).into_response(),
                ApiError::BadRequest(s) => (StatusCode::BAD_REQUEST, s).into_response(),
            },
        }
    }
}
