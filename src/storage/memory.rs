use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

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

/// 进程内存储后端
///
/// 所有表放在一把异步锁后面，工作单元持有锁并在副本上读写，提交时整体替换。
/// 未配置数据库时使用，测试也使用它。
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<MemoryTx> {
        let guard = self.tables.clone().lock_owned().await;
        Ok(MemoryTx { guard, work: None })
    }
}

/// [`MemoryStore`] 的工作单元
///
/// 第一次写入时才复制所有表，只读的工作单元直接读锁住的数据。
pub struct MemoryTx {
    guard: OwnedMutexGuard<Tables>,
    work: Option<Tables>,
}

impl MemoryTx {
    fn tables(&self) -> &Tables {
        self.work.as_ref().unwrap_or(&self.guard)
    }

    fn tables_mut(&mut self) -> &mut Tables {
        let Self { guard, work } = self;
        work.get_or_insert_with(|| Tables::clone(guard))
    }
}

impl UnitOfWork for MemoryTx {
    async fn commit(mut self) -> Result<()> {
        if let Some(work) = self.work.take() {
            *self.guard = work;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct Tables {
    article_info: Table<ArticleInfo>,
    article_content: Table<ArticleContent>,
    article_picture: Table<ArticlePicture>,
    article_category: Table<ArticleCategory>,
    category_info: Table<CategoryInfo>,
    comment: Table<Comment>,
    article_comment: Table<ArticleComment>,
}

/// 按 id 有序的行集合，id 自增且不复用
#[derive(Debug, Clone)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    last_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T: Clone> Table<T> {
    fn insert_with(&mut self, row: impl FnOnce(i64) -> T) -> i64 {
        self.last_id += 1;
        self.rows.insert(self.last_id, row(self.last_id));
        self.last_id
    }

    fn get(&self, id: i64) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn all(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }

    fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.rows.values().find(|r| pred(r)).cloned()
    }

    fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows.values().filter(|r| pred(r)).cloned().collect()
    }

    /// 与 `UPDATE ... WHERE id = ?` 一致，不存在的 id 不做任何事
    fn update(&mut self, id: i64, f: impl FnOnce(&mut T)) {
        if let Some(row) = self.rows.get_mut(&id) {
            f(row);
        }
    }

    fn remove(&mut self, id: i64) {
        self.rows.remove(&id);
    }

    fn max_id(&self) -> Option<i64> {
        self.rows.keys().next_back().copied()
    }
}

impl ArticleInfoRepository for MemoryTx {
    async fn get_article_info(&mut self, id: i64) -> Result<Option<ArticleInfo>> {
        Ok(self.tables().article_info.get(id))
    }

    async fn list_article_info(&mut self) -> Result<Vec<ArticleInfo>> {
        Ok(self.tables().article_info.all())
    }

    async fn insert_article_info(&mut self, info: &NewArticleInfo) -> Result<i64> {
        Ok(self.tables_mut().article_info.insert_with(|id| ArticleInfo {
            id,
            title: info.title.clone(),
            summary: info.summary.clone(),
            is_top: info.is_top,
            traffic: info.traffic,
            create_by: info.create_by.clone(),
        }))
    }

    async fn save_article_info(&mut self, info: &ArticleInfo) -> Result<()> {
        self.tables_mut()
            .article_info
            .update(info.id, |row| *row = info.clone());
        Ok(())
    }

    async fn delete_article_info(&mut self, id: i64) -> Result<()> {
        self.tables_mut().article_info.remove(id);
        Ok(())
    }

    async fn find_max_article_id(&mut self) -> Result<Option<i64>> {
        Ok(self.tables().article_info.max_id())
    }

    async fn update_traffic_by_id(&mut self, id: i64, delta: i32) -> Result<()> {
        self.tables_mut()
            .article_info
            .update(id, |row| row.traffic = row.traffic.saturating_add(delta));
        Ok(())
    }
}

impl ArticleContentRepository for MemoryTx {
    async fn get_article_content(&mut self, id: i64) -> Result<Option<ArticleContent>> {
        Ok(self.tables().article_content.get(id))
    }

    async fn list_article_content(&mut self) -> Result<Vec<ArticleContent>> {
        Ok(self.tables().article_content.all())
    }

    async fn find_content_by_article_id(
        &mut self,
        article_id: i64,
    ) -> Result<Option<ArticleContent>> {
        Ok(self
            .tables()
            .article_content
            .find(|c| c.article_id == article_id))
    }

    async fn insert_article_content(&mut self, article_id: i64, content: &str) -> Result<i64> {
        Ok(self.tables_mut().article_content.insert_with(|id| ArticleContent {
            id,
            article_id,
            content: content.to_owned(),
        }))
    }

    async fn save_article_content(&mut self, content: &ArticleContent) -> Result<()> {
        self.tables_mut()
            .article_content
            .update(content.id, |row| *row = content.clone());
        Ok(())
    }

    async fn delete_article_content(&mut self, id: i64) -> Result<()> {
        self.tables_mut().article_content.remove(id);
        Ok(())
    }
}

impl ArticlePictureRepository for MemoryTx {
    async fn get_article_picture(&mut self, id: i64) -> Result<Option<ArticlePicture>> {
        Ok(self.tables().article_picture.get(id))
    }

    async fn list_article_picture(&mut self) -> Result<Vec<ArticlePicture>> {
        Ok(self.tables().article_picture.all())
    }

    async fn find_picture_by_article_id(
        &mut self,
        article_id: i64,
    ) -> Result<Option<ArticlePicture>> {
        Ok(self
            .tables()
            .article_picture
            .find(|p| p.article_id == article_id))
    }

    async fn insert_article_picture(&mut self, article_id: i64, picture_url: &str) -> Result<i64> {
        Ok(self.tables_mut().article_picture.insert_with(|id| ArticlePicture {
            id,
            article_id,
            picture_url: picture_url.to_owned(),
        }))
    }

    async fn save_article_picture(&mut self, picture: &ArticlePicture) -> Result<()> {
        self.tables_mut()
            .article_picture
            .update(picture.id, |row| *row = picture.clone());
        Ok(())
    }

    async fn delete_article_picture(&mut self, id: i64) -> Result<()> {
        self.tables_mut().article_picture.remove(id);
        Ok(())
    }
}

impl ArticleCategoryRepository for MemoryTx {
    async fn get_article_category(&mut self, id: i64) -> Result<Option<ArticleCategory>> {
        Ok(self.tables().article_category.get(id))
    }

    async fn list_article_category(&mut self) -> Result<Vec<ArticleCategory>> {
        Ok(self.tables().article_category.all())
    }

    async fn find_category_by_article_id(
        &mut self,
        article_id: i64,
    ) -> Result<Option<ArticleCategory>> {
        Ok(self
            .tables()
            .article_category
            .find(|c| c.article_id == article_id))
    }

    async fn find_by_category_id(&mut self, category_id: i64) -> Result<Vec<ArticleCategory>> {
        Ok(self
            .tables()
            .article_category
            .filter(|c| c.category_id == category_id))
    }

    async fn insert_article_category(&mut self, article_id: i64, category_id: i64) -> Result<i64> {
        Ok(self.tables_mut().article_category.insert_with(|id| ArticleCategory {
            id,
            article_id,
            category_id,
        }))
    }

    async fn save_article_category(&mut self, category: &ArticleCategory) -> Result<()> {
        self.tables_mut()
            .article_category
            .update(category.id, |row| *row = category.clone());
        Ok(())
    }

    async fn delete_article_category(&mut self, id: i64) -> Result<()> {
        self.tables_mut().article_category.remove(id);
        Ok(())
    }
}

impl CategoryInfoRepository for MemoryTx {
    async fn get_category_info(&mut self, id: i64) -> Result<Option<CategoryInfo>> {
        Ok(self.tables().category_info.get(id))
    }

    async fn list_category_info(&mut self) -> Result<Vec<CategoryInfo>> {
        Ok(self.tables().category_info.all())
    }

    async fn insert_category_info(&mut self, name: &str) -> Result<i64> {
        Ok(self.tables_mut().category_info.insert_with(|id| CategoryInfo {
            id,
            name: name.to_owned(),
            number: 0,
        }))
    }

    async fn save_category_info(&mut self, category: &CategoryInfo) -> Result<()> {
        self.tables_mut()
            .category_info
            .update(category.id, |row| *row = category.clone());
        Ok(())
    }

    async fn delete_category_info(&mut self, id: i64) -> Result<()> {
        self.tables_mut().category_info.remove(id);
        Ok(())
    }

    async fn update_number_by_id(&mut self, id: i64, delta: i32) -> Result<()> {
        self.tables_mut()
            .category_info
            .update(id, |row| row.number = row.number.saturating_add(delta));
        Ok(())
    }
}

impl CommentRepository for MemoryTx {
    async fn list_comments(&mut self) -> Result<Vec<Comment>> {
        Ok(self.tables().comment.all())
    }

    async fn insert_comment(&mut self, comment: &NewComment) -> Result<i64> {
        Ok(self.tables_mut().comment.insert_with(|id| Comment {
            id,
            content: comment.content.clone(),
            name: comment.name.clone(),
            email: comment.email.clone(),
            ip: comment.ip.clone(),
            created_at: comment.created_at,
        }))
    }
}

impl ArticleCommentRepository for MemoryTx {
    async fn find_comments_by_article_id(&mut self, article_id: i64) -> Result<Vec<ArticleComment>> {
        Ok(self
            .tables()
            .article_comment
            .filter(|c| c.article_id == article_id))
    }

    async fn insert_article_comment(&mut self, article_id: i64, comment: &NewComment) -> Result<i64> {
        Ok(self.tables_mut().article_comment.insert_with(|id| ArticleComment {
            id,
            article_id,
            content: comment.content.clone(),
            name: comment.name.clone(),
            email: comment.email.clone(),
            ip: comment.ip.clone(),
            created_at: comment.created_at,
        }))
    }
}
