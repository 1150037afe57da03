use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ArticlePart, Error, Result},
    model::{ArticleInfo, NewArticleInfo},
    storage::{
        ArticleCategoryRepository, ArticleContentRepository, ArticleInfoRepository,
        ArticlePictureRepository, CategoryInfoRepository, Storage, UnitOfWork,
    },
};

/// 最新文章列表的最大篇数
pub const MAX_LATEST_ARTICLE_COUNT: usize = 5;

/// 完整文章，由基础信息、正文、题图、分类四张表组装而成
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArticleDto {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub top: bool,
    pub traffic: i32,
    pub create_by: String,
    pub content: String,
    pub picture_url: String,
    pub category_id: i64,
    pub category_name: String,
    pub category_number: i32,
    pub article_content_id: i64,
    pub article_picture_id: i64,
    pub article_category_id: i64,
}

/// 文章列表项，只带题图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleWithPictureDto {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub top: bool,
    pub traffic: i32,
    pub article_picture_id: i64,
    pub picture_url: String,
}

/// 文章服务
///
/// 负责把多张表的行组装成 [`ArticleDto`] / [`ArticleWithPictureDto`]，
/// 以及置顶优先的排序和最新文章的截断。每个操作都在一个工作单元内完成。
#[derive(Clone)]
pub struct ArticleService<S> {
    store: S,
}

impl<S: Storage> ArticleService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// 新增一篇文章，返回文章 id
    ///
    /// 访问量强制为 0，对应分类的文章数加 1。
    pub async fn add(&self, article: &ArticleDto) -> Result<i64> {
        let mut tx = self.store.begin().await?;

        let id = tx
            .insert_article_info(&NewArticleInfo {
                title: article.title.clone(),
                summary: article.summary.clone(),
                is_top: article.top,
                traffic: 0,
                create_by: article.create_by.clone(),
            })
            .await?;
        tx.insert_article_picture(id, &article.picture_url).await?;
        tx.insert_article_content(id, &article.content).await?;
        tx.insert_article_category(id, article.category_id).await?;
        tx.update_number_by_id(article.category_id, 1).await?;

        tx.commit().await?;
        tracing::info!(id, category_id = article.category_id, "article added");
        Ok(id)
    }

    /// 删除一篇文章的四张表记录，对应分类的文章数减 1
    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.store.begin().await?;

        let article = assemble(&mut tx, id).await?;
        tx.delete_article_info(article.id).await?;
        tx.delete_article_picture(article.article_picture_id).await?;
        tx.delete_article_content(article.article_content_id).await?;
        tx.delete_article_category(article.article_category_id).await?;
        tx.update_number_by_id(article.category_id, -1).await?;

        tx.commit().await?;
        tracing::info!(id, category_id = article.category_id, "article deleted");
        Ok(())
    }

    /// 用 `article` 的字段整体覆盖文章 `id`
    ///
    /// 分类变化时同时调整新旧分类的文章数。访问量不能为负。
    pub async fn update(&self, id: i64, article: &ArticleDto) -> Result<()> {
        if article.traffic < 0 {
            return Err(ApiError::BadRequest(format!(
                "traffic must not be negative: {}",
                article.traffic
            ))
            .into());
        }

        let mut tx = self.store.begin().await?;

        if tx.get_article_info(id).await?.is_none() {
            return Err(Error::not_found());
        }
        tx.save_article_info(&ArticleInfo {
            id,
            title: article.title.clone(),
            summary: article.summary.clone(),
            is_top: article.top,
            traffic: article.traffic,
            create_by: article.create_by.clone(),
        })
        .await?;

        let mut picture = tx
            .find_picture_by_article_id(id)
            .await?
            .ok_or(incomplete(id, ArticlePart::Picture))?;
        picture.picture_url = article.picture_url.clone();
        tx.save_article_picture(&picture).await?;

        let mut content = tx
            .find_content_by_article_id(id)
            .await?
            .ok_or(incomplete(id, ArticlePart::Content))?;
        content.content = article.content.clone();
        tx.save_article_content(&content).await?;

        let mut category = tx
            .find_category_by_article_id(id)
            .await?
            .ok_or(incomplete(id, ArticlePart::Category))?;
        if category.category_id != article.category_id {
            tx.update_number_by_id(category.category_id, -1).await?;
            tx.update_number_by_id(article.category_id, 1).await?;
            category.category_id = article.category_id;
            tx.save_article_category(&category).await?;
        }

        tx.commit().await?;
        tracing::info!(id, "article updated");
        Ok(())
    }

    /// 修改文章所属分类，旧分类文章数减 1，新分类加 1
    pub async fn update_category(&self, article_id: i64, category_id: i64) -> Result<()> {
        let mut tx = self.store.begin().await?;

        if tx.get_article_info(article_id).await?.is_none() {
            return Err(Error::not_found());
        }
        let mut association = tx
            .find_category_by_article_id(article_id)
            .await?
            .ok_or(incomplete(article_id, ArticlePart::Category))?;

        tx.update_number_by_id(association.category_id, -1).await?;
        tx.update_number_by_id(category_id, 1).await?;
        let from = association.category_id;
        association.category_id = category_id;
        tx.save_article_category(&association).await?;

        tx.commit().await?;
        tracing::info!(article_id, from, to = category_id, "article category changed");
        Ok(())
    }

    /// 获取一篇完整文章
    ///
    /// 每次获取都会把访问量加 1，返回的访问量已包含本次访问。
    pub async fn get_one_by_id(&self, id: i64) -> Result<ArticleDto> {
        let mut tx = self.store.begin().await?;
        let article = assemble(&mut tx, id).await?;
        tx.commit().await?;
        Ok(article)
    }

    /// 所有文章（带题图），置顶文章在前
    pub async fn list_all(&self) -> Result<Vec<ArticleWithPictureDto>> {
        let mut tx = self.store.begin().await?;

        let infos = tx.list_article_info().await?;
        let mut articles = Vec::with_capacity(infos.len());
        for info in infos {
            articles.push(with_picture(&mut tx, info).await?);
        }

        tx.commit().await?;
        pinned_first(&mut articles);
        Ok(articles)
    }

    /// 某个分类下的所有文章（带题图），置顶文章在前
    pub async fn list_by_category_id(&self, category_id: i64) -> Result<Vec<ArticleWithPictureDto>> {
        let mut tx = self.store.begin().await?;

        let associations = tx.find_by_category_id(category_id).await?;
        let mut articles = Vec::with_capacity(associations.len());
        for association in associations {
            let Some(info) = tx.get_article_info(association.article_id).await? else {
                tracing::warn!(
                    article_id = association.article_id,
                    category_id,
                    "category association without article"
                );
                continue;
            };
            articles.push(with_picture(&mut tx, info).await?);
        }

        tx.commit().await?;
        pinned_first(&mut articles);
        Ok(articles)
    }

    /// 最新文章，即 [`ArticleService::list_all`] 的前
    /// [`MAX_LATEST_ARTICLE_COUNT`] 篇
    pub async fn list_latest(&self) -> Result<Vec<ArticleWithPictureDto>> {
        let mut articles = self.list_all().await?;
        articles.truncate(MAX_LATEST_ARTICLE_COUNT);
        Ok(articles)
    }

    /// 缺少正文、题图或分类记录的文章 id，升序
    pub async fn incomplete_articles(&self) -> Result<Vec<i64>> {
        let mut tx = self.store.begin().await?;

        let infos = tx.list_article_info().await?;
        let contents: HashSet<i64> = tx
            .list_article_content()
            .await?
            .into_iter()
            .map(|c| c.article_id)
            .collect();
        let pictures: HashSet<i64> = tx
            .list_article_picture()
            .await?
            .into_iter()
            .map(|p| p.article_id)
            .collect();
        let categories: HashSet<i64> = tx
            .list_article_category()
            .await?
            .into_iter()
            .map(|c| c.article_id)
            .collect();
        tx.commit().await?;

        Ok(infos
            .into_iter()
            .map(|info| info.id)
            .filter(|id| {
                !(contents.contains(id) && pictures.contains(id) && categories.contains(id))
            })
            .collect())
    }
}

/// 组装完整文章，并把访问量加 1
async fn assemble<T: UnitOfWork>(tx: &mut T, id: i64) -> Result<ArticleDto> {
    let info = tx.get_article_info(id).await?.ok_or(Error::not_found())?;
    tx.update_traffic_by_id(id, 1).await?;

    let content = tx
        .find_content_by_article_id(id)
        .await?
        .ok_or(incomplete(id, ArticlePart::Content))?;
    let picture = tx
        .find_picture_by_article_id(id)
        .await?
        .ok_or(incomplete(id, ArticlePart::Picture))?;
    let association = tx
        .find_category_by_article_id(id)
        .await?
        .ok_or(incomplete(id, ArticlePart::Category))?;
    let category = tx
        .get_category_info(association.category_id)
        .await?
        .ok_or(incomplete(id, ArticlePart::CategoryInfo))?;

    Ok(ArticleDto {
        id: info.id,
        title: info.title,
        summary: info.summary,
        top: info.is_top,
        traffic: info.traffic.saturating_add(1),
        create_by: info.create_by,
        content: content.content,
        picture_url: picture.picture_url,
        category_id: category.id,
        category_name: category.name,
        category_number: category.number,
        article_content_id: content.id,
        article_picture_id: picture.id,
        article_category_id: association.id,
    })
}

async fn with_picture<T: UnitOfWork>(tx: &mut T, info: ArticleInfo) -> Result<ArticleWithPictureDto> {
    let picture = tx
        .find_picture_by_article_id(info.id)
        .await?
        .ok_or(incomplete(info.id, ArticlePart::Picture))?;

    Ok(ArticleWithPictureDto {
        id: info.id,
        title: info.title,
        summary: info.summary,
        top: info.is_top,
        traffic: info.traffic,
        article_picture_id: picture.id,
        picture_url: picture.picture_url,
    })
}

/// 置顶文章排在前面，两组内部保持原有顺序
fn pinned_first(articles: &mut [ArticleWithPictureDto]) {
    articles.sort_by_key(|a| !a.top);
}

fn incomplete(article_id: i64, missing: ArticlePart) -> Error {
    Error::IncompleteArticle {
        article_id,
        missing,
    }
}
