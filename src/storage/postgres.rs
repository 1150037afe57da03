use std::time::Duration;

use sqlx::{Postgres, postgres::PgPoolOptions};

use super::{
    ArticleCategoryRepository, ArticleCommentRepository, ArticleContentRepository,
    ArticleInfoRepository, ArticlePictureRepository, CategoryInfoRepository, CommentRepository,
    Storage, UnitOfWork,
};
use crate::{
    error::Result,
    model::{
        ArticleCategory, ArticleComment, ArticleContent, ArticleInfo, ArticlePicture,
        CategoryInfo, Comment, NewArticleInfo, NewComment,
    },
};

/// 数据库连接池类型
pub type Db = sqlx::PgPool;

/// 建表语句
const SCHEMA: &str = include_str!("../../sql/01-CREATE_TABLE.sql");

/// 更新访问量时的语句超时
const TRAFFIC_UPDATE_TIMEOUT: &str = "20s";

/// 根据连接 URL 创建新的数据库连接池
///
/// 连接池配置：
///
/// - 最大空闲时间 60 秒
/// - 最大生存时间 1500 秒（约 25 分钟）
/// - 最大连接数 10
/// - 获取连接超时 2 秒
/// - 获取前测试连接
/// - 最小连接数 2
pub async fn new_db_pool(conn_url: &str) -> Result<Db> {
    Ok(PgPoolOptions::new()
        .idle_timeout(Duration::from_secs(60))
        .max_lifetime(Duration::from_secs(1500))
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(2))
        .test_before_acquire(true)
        .min_connections(2)
        .connect(conn_url)
        .await?)
}

/// 执行建表语句
///
/// 按 `;` 分割，每条 SQL 单独执行
pub async fn migrate(db: &Db) -> Result<()> {
    for sql in SCHEMA.split(';') {
        if sql.trim().is_empty() {
            continue;
        }
        sqlx::query(sql).execute(db).await?;
    }
    Ok(())
}

/// PostgreSQL 存储后端，每个工作单元是一个数据库事务
#[derive(Clone)]
pub struct PgStore {
    pool: Db,
}

impl PgStore {
    pub fn new(pool: Db) -> Self {
        Self { pool }
    }
}

impl Storage for PgStore {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx> {
        Ok(PgTx(self.pool.begin().await?))
    }
}

/// 基于 [`sqlx::Transaction`] 的工作单元，丢弃时自动回滚
pub struct PgTx(sqlx::Transaction<'static, Postgres>);

impl UnitOfWork for PgTx {
    async fn commit(self) -> Result<()> {
        Ok(self.0.commit().await?)
    }
}

impl ArticleInfoRepository for PgTx {
    async fn get_article_info(&mut self, id: i64) -> Result<Option<ArticleInfo>> {
        Ok(sqlx::query_as::<_, ArticleInfo>(
            r#"
            SELECT id, title, summary, is_top, traffic, create_by
            FROM tbl_article_info
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *self.0)
        .await?)
    }

    async fn list_article_info(&mut self) -> Result<Vec<ArticleInfo>> {
        Ok(sqlx::query_as::<_, ArticleInfo>(
            r#"
            SELECT id, title, summary, is_top, traffic, create_by
            FROM tbl_article_info
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *self.0)
        .await?)
    }

    async fn insert_article_info(&mut self, info: &NewArticleInfo) -> Result<i64> {
        Ok(sqlx::query_scalar(
            r#"
            INSERT INTO tbl_article_info (title, summary, is_top, traffic, create_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&info.title)
        .bind(&info.summary)
        .bind(info.is_top)
        .bind(info.traffic)
        .bind(&info.create_by)
        .fetch_one(&mut *self.0)
        .await?)
    }

    async fn save_article_info(&mut self, info: &ArticleInfo) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tbl_article_info
            SET title = $2, summary = $3, is_top = $4, traffic = $5, create_by = $6
            WHERE id = $1
            "#,
        )
        .bind(info.id)
        .bind(&info.title)
        .bind(&info.summary)
        .bind(info.is_top)
        .bind(info.traffic)
        .bind(&info.create_by)
        .execute(&mut *self.0)
        .await?;
        Ok(())
    }

    async fn delete_article_info(&mut self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM tbl_article_info WHERE id = $1")
            .bind(id)
            .execute(&mut *self.0)
            .await?;
        Ok(())
    }

    async fn find_max_article_id(&mut self) -> Result<Option<i64>> {
        Ok(sqlx::query_scalar("SELECT MAX(id) FROM tbl_article_info")
            .fetch_one(&mut *self.0)
            .await?)
    }

    async fn update_traffic_by_id(&mut self, id: i64, delta: i32) -> Result<()> {
        // 超时只作用于这一条 UPDATE，之后恢复事务原来的设置
        let previous: String = sqlx::query_scalar("SELECT current_setting('statement_timeout')")
            .fetch_one(&mut *self.0)
            .await?;
        self.set_statement_timeout(TRAFFIC_UPDATE_TIMEOUT).await?;

        sqlx::query(
            "UPDATE tbl_article_info \
             SET traffic = LEAST(traffic::BIGINT + $2, 2147483647)::INTEGER \
             WHERE id = $1",
        )
        .bind(id)
        .bind(delta)
        .execute(&mut *self.0)
        .await?;

        self.set_statement_timeout(&previous).await
    }
}

impl PgTx {
    /// 只在当前事务内生效的 `statement_timeout`
    async fn set_statement_timeout(&mut self, value: &str) -> Result<()> {
        sqlx::query("SELECT set_config('statement_timeout', $1, true)")
            .bind(value)
            .execute(&mut *self.0)
            .await?;
        Ok(())
    }
}

impl ArticleContentRepository for PgTx {
    async fn get_article_content(&mut self, id: i64) -> Result<Option<ArticleContent>> {
        Ok(sqlx::query_as::<_, ArticleContent>(
            "SELECT id, article_id, content FROM tbl_article_content WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.0)
        .await?)
    }

    async fn list_article_content(&mut self) -> Result<Vec<ArticleContent>> {
        Ok(sqlx::query_as::<_, ArticleContent>(
            "SELECT id, article_id, content FROM tbl_article_content ORDER BY id",
        )
        .fetch_all(&mut *self.0)
        .await?)
    }

    async fn find_content_by_article_id(
        &mut self,
        article_id: i64,
    ) -> Result<Option<ArticleContent>> {
        Ok(sqlx::query_as::<_, ArticleContent>(
            "SELECT id, article_id, content FROM tbl_article_content WHERE article_id = $1",
        )
        .bind(article_id)
        .fetch_optional(&mut *self.0)
        .await?)
    }

    async fn insert_article_content(&mut self, article_id: i64, content: &str) -> Result<i64> {
        Ok(sqlx::query_scalar(
            "INSERT INTO tbl_article_content (article_id, content) VALUES ($1, $2) RETURNING id",
        )
        .bind(article_id)
        .bind(content)
        .fetch_one(&mut *self.0)
        .await?)
    }

    async fn save_article_content(&mut self, content: &ArticleContent) -> Result<()> {
        sqlx::query("UPDATE tbl_article_content SET article_id = $2, content = $3 WHERE id = $1")
            .bind(content.id)
            .bind(content.article_id)
            .bind(&content.content)
            .execute(&mut *self.0)
            .await?;
        Ok(())
    }

    async fn delete_article_content(&mut self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM tbl_article_content WHERE id = $1")
            .bind(id)
            .execute(&mut *self.0)
            .await?;
        Ok(())
    }
}

impl ArticlePictureRepository for PgTx {
    async fn get_article_picture(&mut self, id: i64) -> Result<Option<ArticlePicture>> {
        Ok(sqlx::query_as::<_, ArticlePicture>(
            "SELECT id, article_id, picture_url FROM tbl_article_picture WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.0)
        .await?)
    }

    async fn list_article_picture(&mut self) -> Result<Vec<ArticlePicture>> {
        Ok(sqlx::query_as::<_, ArticlePicture>(
            "SELECT id, article_id, picture_url FROM tbl_article_picture ORDER BY id",
        )
        .fetch_all(&mut *self.0)
        .await?)
    }

    async fn find_picture_by_article_id(
        &mut self,
        article_id: i64,
    ) -> Result<Option<ArticlePicture>> {
        Ok(sqlx::query_as::<_, ArticlePicture>(
            "SELECT id, article_id, picture_url FROM tbl_article_picture WHERE article_id = $1",
        )
        .bind(article_id)
        .fetch_optional(&mut *self.0)
        .await?)
    }

    async fn insert_article_picture(&mut self, article_id: i64, picture_url: &str) -> Result<i64> {
        Ok(sqlx::query_scalar(
            r#"
            INSERT INTO tbl_article_picture (article_id, picture_url)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(article_id)
        .bind(picture_url)
        .fetch_one(&mut *self.0)
        .await?)
    }

    async fn save_article_picture(&mut self, picture: &ArticlePicture) -> Result<()> {
        sqlx::query(
            "UPDATE tbl_article_picture SET article_id = $2, picture_url = $3 WHERE id = $1",
        )
        .bind(picture.id)
        .bind(picture.article_id)
        .bind(&picture.picture_url)
        .execute(&mut *self.0)
        .await?;
        Ok(())
    }

    async fn delete_article_picture(&mut self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM tbl_article_picture WHERE id = $1")
            .bind(id)
            .execute(&mut *self.0)
            .await?;
        Ok(())
    }
}

impl ArticleCategoryRepository for PgTx {
    async fn get_article_category(&mut self, id: i64) -> Result<Option<ArticleCategory>> {
        Ok(sqlx::query_as::<_, ArticleCategory>(
            "SELECT id, article_id, category_id FROM tbl_article_category WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.0)
        .await?)
    }

    async fn list_article_category(&mut self) -> Result<Vec<ArticleCategory>> {
        Ok(sqlx::query_as::<_, ArticleCategory>(
            "SELECT id, article_id, category_id FROM tbl_article_category ORDER BY id",
        )
        .fetch_all(&mut *self.0)
        .await?)
    }

    async fn find_category_by_article_id(
        &mut self,
        article_id: i64,
    ) -> Result<Option<ArticleCategory>> {
        Ok(sqlx::query_as::<_, ArticleCategory>(
            "SELECT id, article_id, category_id FROM tbl_article_category WHERE article_id = $1",
        )
        .bind(article_id)
        .fetch_optional(&mut *self.0)
        .await?)
    }

    async fn find_by_category_id(&mut self, category_id: i64) -> Result<Vec<ArticleCategory>> {
        Ok(sqlx::query_as::<_, ArticleCategory>(
            r#"
            SELECT id, article_id, category_id
            FROM tbl_article_category
            WHERE category_id = $1
            ORDER BY id
            "#,
        )
        .bind(category_id)
        .fetch_all(&mut *self.0)
        .await?)
    }

    async fn insert_article_category(&mut self, article_id: i64, category_id: i64) -> Result<i64> {
        Ok(sqlx::query_scalar(
            r#"
            INSERT INTO tbl_article_category (article_id, category_id)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(article_id)
        .bind(category_id)
        .fetch_one(&mut *self.0)
        .await?)
    }

    async fn save_article_category(&mut self, category: &ArticleCategory) -> Result<()> {
        sqlx::query(
            "UPDATE tbl_article_category SET article_id = $2, category_id = $3 WHERE id = $1",
        )
        .bind(category.id)
        .bind(category.article_id)
        .bind(category.category_id)
        .execute(&mut *self.0)
        .await?;
        Ok(())
    }

    async fn delete_article_category(&mut self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM tbl_article_category WHERE id = $1")
            .bind(id)
            .execute(&mut *self.0)
            .await?;
        Ok(())
    }
}

impl CategoryInfoRepository for PgTx {
    async fn get_category_info(&mut self, id: i64) -> Result<Option<CategoryInfo>> {
        Ok(sqlx::query_as::<_, CategoryInfo>(
            "SELECT id, name, number FROM tbl_category_info WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.0)
        .await?)
    }

    async fn list_category_info(&mut self) -> Result<Vec<CategoryInfo>> {
        Ok(sqlx::query_as::<_, CategoryInfo>(
            "SELECT id, name, number FROM tbl_category_info ORDER BY id",
        )
        .fetch_all(&mut *self.0)
        .await?)
    }

    async fn insert_category_info(&mut self, name: &str) -> Result<i64> {
        Ok(sqlx::query_scalar(
            "INSERT INTO tbl_category_info (name, number) VALUES ($1, 0) RETURNING id",
        )
        .bind(name)
        .fetch_one(&mut *self.0)
        .await?)
    }

    async fn save_category_info(&mut self, category: &CategoryInfo) -> Result<()> {
        sqlx::query("UPDATE tbl_category_info SET name = $2, number = $3 WHERE id = $1")
            .bind(category.id)
            .bind(&category.name)
            .bind(category.number)
            .execute(&mut *self.0)
            .await?;
        Ok(())
    }

    async fn delete_category_info(&mut self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM tbl_category_info WHERE id = $1")
            .bind(id)
            .execute(&mut *self.0)
            .await?;
        Ok(())
    }

    async fn update_number_by_id(&mut self, id: i64, delta: i32) -> Result<()> {
        sqlx::query("UPDATE tbl_category_info SET number = number + $2 WHERE id = $1")
            .bind(id)
            .bind(delta)
            .execute(&mut *self.0)
            .await?;
        Ok(())
    }
}

impl CommentRepository for PgTx {
    async fn list_comments(&mut self) -> Result<Vec<Comment>> {
        Ok(sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, content, name, email, ip, created_at
            FROM tbl_comment
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *self.0)
        .await?)
    }

    async fn insert_comment(&mut self, comment: &NewComment) -> Result<i64> {
        Ok(sqlx::query_scalar(
            r#"
            INSERT INTO tbl_comment (content, name, email, ip, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(&comment.content)
        .bind(&comment.name)
        .bind(&comment.email)
        .bind(&comment.ip)
        .bind(comment.created_at)
        .fetch_one(&mut *self.0)
        .await?)
    }
}

impl ArticleCommentRepository for PgTx {
    async fn find_comments_by_article_id(&mut self, article_id: i64) -> Result<Vec<ArticleComment>> {
        Ok(sqlx::query_as::<_, ArticleComment>(
            r#"
            SELECT id, article_id, content, name, email, ip, created_at
            FROM tbl_article_comment
            WHERE article_id = $1
            ORDER BY id
            "#,
        )
        .bind(article_id)
        .fetch_all(&mut *self.0)
        .await?)
    }

    async fn insert_article_comment(&mut self, article_id: i64, comment: &NewComment) -> Result<i64> {
        Ok(sqlx::query_scalar(
            r#"
            INSERT INTO tbl_article_comment (article_id, content, name, email, ip, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(article_id)
        .bind(&comment.content)
        .bind(&comment.name)
        .bind(&comment.email)
        .bind(&comment.ip)
        .bind(comment.created_at)
        .fetch_one(&mut *self.0)
        .await?)
    }
}
