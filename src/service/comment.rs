use chrono::Local;

use crate::{
    error::Result,
    model::{ArticleComment, Comment, CommentForm, NewComment},
    storage::{ArticleCommentRepository, CommentRepository, Storage, UnitOfWork},
};

/// 留言与文章评论服务
#[derive(Clone)]
pub struct CommentService<S> {
    store: S,
}

impl<S: Storage> CommentService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 所有留言板留言
    pub async fn list_all(&self) -> Result<Vec<Comment>> {
        let mut tx = self.store.begin().await?;
        let comments = tx.list_comments().await?;
        tx.commit().await?;
        Ok(comments)
    }

    /// 新增一条留言，`ip` 与当前时间由服务端填写
    pub async fn add(&self, form: CommentForm, ip: &str) -> Result<i64> {
        let comment = NewComment::stamp(form, ip, Local::now());

        let mut tx = self.store.begin().await?;
        let id = tx.insert_comment(&comment).await?;
        tx.commit().await?;
        tracing::info!(id, ip, "comment added");
        Ok(id)
    }

    /// 某篇文章下的所有评论
    pub async fn list_by_article_id(&self, article_id: i64) -> Result<Vec<ArticleComment>> {
        let mut tx = self.store.begin().await?;
        let comments = tx.find_comments_by_article_id(article_id).await?;
        tx.commit().await?;
        Ok(comments)
    }

    /// 给文章新增一条评论，不检查文章是否存在
    pub async fn add_to_article(&self, article_id: i64, form: CommentForm, ip: &str) -> Result<i64> {
        let comment = NewComment::stamp(form, ip, Local::now());

        let mut tx = self.store.begin().await?;
        let id = tx.insert_article_comment(article_id, &comment).await?;
        tx.commit().await?;
        tracing::info!(id, article_id, ip, "article comment added");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn form(content: &str, name: &str) -> CommentForm {
        CommentForm {
            content: content.into(),
            name: name.into(),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_add_comment_stamps_ip_and_time() {
        let service = CommentService::new(MemoryStore::new());
        let before = Local::now();

        service.add(form("hello", "Alice"), "10.0.0.1").await.unwrap();
        service
            .add(
                CommentForm {
                    email: Some("bob@example.com".into()),
                    ..form("again", "Bob")
                },
                "10.0.0.2",
            )
            .await
            .unwrap();

        let comments = service.list_all().await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].content, "hello");
        assert_eq!(comments[0].ip, "10.0.0.1");
        assert!(comments[0].created_at >= before);
        assert_eq!(comments[1].email.as_deref(), Some("bob@example.com"));
    }

    #[tokio::test]
    async fn test_article_comments_are_scoped() {
        let service = CommentService::new(MemoryStore::new());

        service.add_to_article(5, form("hi", "Bob"), "127.0.0.1").await.unwrap();
        service.add_to_article(6, form("other", "Eve"), "127.0.0.2").await.unwrap();
        service.add_to_article(5, form("again", "Bob"), "127.0.0.1").await.unwrap();

        let comments = service.list_by_article_id(5).await.unwrap();
        let contents: Vec<&str> = comments.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "again"]);
        assert!(comments.iter().all(|c| c.article_id == 5 && c.name == "Bob"));
        assert!(service.list_by_article_id(7).await.unwrap().is_empty());

        // 文章评论不出现在留言板里
        assert!(service.list_all().await.unwrap().is_empty());
    }
}
