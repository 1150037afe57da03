use std::future::Future;

use crate::{
    error::Result,
    model::{
        ArticleCategory, ArticleComment, ArticleContent, ArticleInfo, ArticlePicture,
        CategoryInfo, Comment, NewArticleInfo, NewComment,
    },
};

/// `tbl_article_info` 的数据访问接口
pub trait ArticleInfoRepository: Send {
    fn get_article_info(
        &mut self,
        id: i64,
    ) -> impl Future<Output = Result<Option<ArticleInfo>>> + Send;

    /// 按 id 升序返回全部文章基础信息
    fn list_article_info(&mut self) -> impl Future<Output = Result<Vec<ArticleInfo>>> + Send;

    /// 插入文章基础信息，返回生成的 id
    fn insert_article_info(
        &mut self,
        info: &NewArticleInfo,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// 按 id 覆盖写入
    fn save_article_info(&mut self, info: &ArticleInfo) -> impl Future<Output = Result<()>> + Send;

    fn delete_article_info(&mut self, id: i64) -> impl Future<Output = Result<()>> + Send;

    /// 当前最大的文章 id，空表时为 `None`
    fn find_max_article_id(&mut self) -> impl Future<Output = Result<Option<i64>>> + Send;

    /// `traffic = traffic + delta`，单条 SQL 完成
    fn update_traffic_by_id(
        &mut self,
        id: i64,
        delta: i32,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// `tbl_article_content` 的数据访问接口
pub trait ArticleContentRepository: Send {
    fn get_article_content(
        &mut self,
        id: i64,
    ) -> impl Future<Output = Result<Option<ArticleContent>>> + Send;

    fn list_article_content(&mut self)
    -> impl Future<Output = Result<Vec<ArticleContent>>> + Send;

    fn find_content_by_article_id(
        &mut self,
        article_id: i64,
    ) -> impl Future<Output = Result<Option<ArticleContent>>> + Send;

    fn insert_article_content(
        &mut self,
        article_id: i64,
        content: &str,
    ) -> impl Future<Output = Result<i64>> + Send;

    fn save_article_content(
        &mut self,
        content: &ArticleContent,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_article_content(&mut self, id: i64) -> impl Future<Output = Result<()>> + Send;
}

/// `tbl_article_picture` 的数据访问接口
pub trait ArticlePictureRepository: Send {
    fn get_article_picture(
        &mut self,
        id: i64,
    ) -> impl Future<Output = Result<Option<ArticlePicture>>> + Send;

    fn list_article_picture(&mut self)
    -> impl Future<Output = Result<Vec<ArticlePicture>>> + Send;

    fn find_picture_by_article_id(
        &mut self,
        article_id: i64,
    ) -> impl Future<Output = Result<Option<ArticlePicture>>> + Send;

    fn insert_article_picture(
        &mut self,
        article_id: i64,
        picture_url: &str,
    ) -> impl Future<Output = Result<i64>> + Send;

    fn save_article_picture(
        &mut self,
        picture: &ArticlePicture,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_article_picture(&mut self, id: i64) -> impl Future<Output = Result<()>> + Send;
}

/// `tbl_article_category` 的数据访问接口
pub trait ArticleCategoryRepository: Send {
    fn get_article_category(
        &mut self,
        id: i64,
    ) -> impl Future<Output = Result<Option<ArticleCategory>>> + Send;

    fn list_article_category(
        &mut self,
    ) -> impl Future<Output = Result<Vec<ArticleCategory>>> + Send;

    fn find_category_by_article_id(
        &mut self,
        article_id: i64,
    ) -> impl Future<Output = Result<Option<ArticleCategory>>> + Send;

    /// 某个分类下的全部关联行，按 id 升序
    fn find_by_category_id(
        &mut self,
        category_id: i64,
    ) -> impl Future<Output = Result<Vec<ArticleCategory>>> + Send;

    fn insert_article_category(
        &mut self,
        article_id: i64,
        category_id: i64,
    ) -> impl Future<Output = Result<i64>> + Send;

    fn save_article_category(
        &mut self,
        category: &ArticleCategory,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_article_category(&mut self, id: i64) -> impl Future<Output = Result<()>> + Send;
}

/// `tbl_category_info` 的数据访问接口
pub trait CategoryInfoRepository: Send {
    fn get_category_info(
        &mut self,
        id: i64,
    ) -> impl Future<Output = Result<Option<CategoryInfo>>> + Send;

    fn list_category_info(&mut self) -> impl Future<Output = Result<Vec<CategoryInfo>>> + Send;

    /// 新分类的文章数为 0
    fn insert_category_info(&mut self, name: &str) -> impl Future<Output = Result<i64>> + Send;

    fn save_category_info(
        &mut self,
        category: &CategoryInfo,
    ) -> impl Future<Output = Result<()>> + Send;

    fn delete_category_info(&mut self, id: i64) -> impl Future<Output = Result<()>> + Send;

    /// `number = number + delta`，单条 SQL 完成
    fn update_number_by_id(
        &mut self,
        id: i64,
        delta: i32,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// `tbl_comment` 的数据访问接口
pub trait CommentRepository: Send {
    fn list_comments(&mut self) -> impl Future<Output = Result<Vec<Comment>>> + Send;

    fn insert_comment(&mut self, comment: &NewComment) -> impl Future<Output = Result<i64>> + Send;
}

/// `tbl_article_comment` 的数据访问接口
pub trait ArticleCommentRepository: Send {
    fn find_comments_by_article_id(
        &mut self,
        article_id: i64,
    ) -> impl Future<Output = Result<Vec<ArticleComment>>> + Send;

    fn insert_article_comment(
        &mut self,
        article_id: i64,
        comment: &NewComment,
    ) -> impl Future<Output = Result<i64>> + Send;
}

/// 一次工作单元，实现所有表的数据访问接口
///
/// 未调用 [`UnitOfWork::commit`] 就被丢弃时，其中的写入全部作废。
pub trait UnitOfWork:
    ArticleInfoRepository
    + ArticleContentRepository
    + ArticlePictureRepository
    + ArticleCategoryRepository
    + CategoryInfoRepository
    + CommentRepository
    + ArticleCommentRepository
    + Send
    + Sized
{
    fn commit(self) -> impl Future<Output = Result<()>> + Send;
}

/// 存储后端
pub trait Storage: Clone + Send + Sync + 'static {
    type Tx: UnitOfWork;

    /// 开启一个工作单元
    fn begin(&self) -> impl Future<Output = Result<Self::Tx>> + Send;
}
