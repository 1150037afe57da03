use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// 文章基础信息，一篇文章的锚点行
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ArticleInfo {
    pub id: i64,
    pub title: String,
    pub summary: String,
    /// 是否置顶
    pub is_top: bool,
    /// 访问量
    pub traffic: i32,
    pub create_by: String,
}

/// 新增文章基础信息时使用，`id` 由存储层生成
#[derive(Debug, Clone, Default)]
pub struct NewArticleInfo {
    pub title: String,
    pub summary: String,
    pub is_top: bool,
    pub traffic: i32,
    pub create_by: String,
}

/// 文章正文（markdown 源文本），与 [`ArticleInfo`] 一对一
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ArticleContent {
    pub id: i64,
    pub article_id: i64,
    pub content: String,
}

/// 文章题图，与 [`ArticleInfo`] 一对一
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ArticlePicture {
    pub id: i64,
    pub article_id: i64,
    pub picture_url: String,
}

/// 文章与分类的关联
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ArticleCategory {
    pub id: i64,
    pub article_id: i64,
    pub category_id: i64,
}

/// 分类信息
///
/// `number` 是该分类下文章数量的冗余计数，由文章的增删和改分类操作成对维护。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CategoryInfo {
    pub id: i64,
    pub name: String,
    pub number: i32,
}

/// 留言板留言
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub name: String,
    pub email: Option<String>,
    pub ip: String,
    pub created_at: DateTime<Local>,
}

/// 文章评论，比 [`Comment`] 多一个文章 id
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ArticleComment {
    pub id: i64,
    pub article_id: i64,
    pub content: String,
    pub name: String,
    pub email: Option<String>,
    pub ip: String,
    pub created_at: DateTime<Local>,
}

/// 客户端提交的评论内容
///
/// `ip` 与时间由服务端填写，不从请求体读取。
#[derive(Debug, Clone, Deserialize)]
pub struct CommentForm {
    pub content: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// 待写入的评论
#[derive(Debug, Clone)]
pub struct NewComment {
    pub content: String,
    pub name: String,
    pub email: Option<String>,
    pub ip: String,
    pub created_at: DateTime<Local>,
}

impl NewComment {
    pub fn stamp(form: CommentForm, ip: impl Into<String>, created_at: DateTime<Local>) -> Self {
        Self {
            content: form.content,
            name: form.name,
            email: form.email,
            ip: ip.into(),
            created_at,
        }
    }
}
