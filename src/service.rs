mod article;
mod category;
mod comment;

pub use self::{
    article::{ArticleDto, ArticleService, ArticleWithPictureDto, MAX_LATEST_ARTICLE_COUNT},
    category::CategoryService,
    comment::CommentService,
};
