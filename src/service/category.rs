use std::collections::HashMap;

use crate::{
    error::{ApiError, Error, Result},
    model::CategoryInfo,
    storage::{ArticleCategoryRepository, CategoryInfoRepository, Storage, UnitOfWork},
};

/// 分类服务
#[derive(Clone)]
pub struct CategoryService<S> {
    store: S,
}

impl<S: Storage> CategoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 所有分类，按 id 升序
    pub async fn list_all(&self) -> Result<Vec<CategoryInfo>> {
        let mut tx = self.store.begin().await?;
        let categories = tx.list_category_info().await?;
        tx.commit().await?;
        Ok(categories)
    }

    /// 新增分类，文章数从 0 开始
    pub async fn add(&self, name: &str) -> Result<i64> {
        let mut tx = self.store.begin().await?;
        let id = tx.insert_category_info(name).await?;
        tx.commit().await?;
        tracing::info!(id, name, "category added");
        Ok(id)
    }

    pub async fn rename(&self, id: i64, name: &str) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let mut category = tx.get_category_info(id).await?.ok_or(Error::not_found())?;
        category.name = name.to_owned();
        tx.save_category_info(&category).await?;
        tx.commit().await?;
        tracing::info!(id, name, "category renamed");
        Ok(())
    }

    /// 删除分类，分类下仍有文章时拒绝
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.store.begin().await?;
        if tx.get_category_info(id).await?.is_none() {
            return Err(Error::not_found());
        }

        let in_use = tx.find_by_category_id(id).await?.len();
        if in_use > 0 {
            return Err(ApiError::Conflict(format!("category {id} still has {in_use} articles")).into());
        }

        tx.delete_category_info(id).await?;
        tx.commit().await?;
        tracing::info!(id, "category deleted");
        Ok(())
    }

    /// 按文章分类关联重新计算每个分类的文章数
    ///
    /// 返回计数被修正的分类（已是修正后的值）。
    pub async fn recount(&self) -> Result<Vec<CategoryInfo>> {
        let mut tx = self.store.begin().await?;

        let mut actual: HashMap<i64, i32> = HashMap::new();
        for association in tx.list_article_category().await? {
            *actual.entry(association.category_id).or_default() += 1;
        }

        let mut changed = Vec::new();
        for mut category in tx.list_category_info().await? {
            let number = actual.get(&category.id).copied().unwrap_or(0);
            if category.number != number {
                tracing::warn!(
                    id = category.id,
                    stored = category.number,
                    actual = number,
                    "category number out of sync"
                );
                category.number = number;
                tx.save_category_info(&category).await?;
                changed.push(category);
            }
        }

        tx.commit().await?;
        Ok(changed)
    }
}
