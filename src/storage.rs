mod memory;
mod postgres;
mod repository;

pub use self::{
    memory::{MemoryStore, MemoryTx},
    postgres::{Db, PgStore, PgTx, migrate, new_db_pool},
    repository::{
        ArticleCategoryRepository, ArticleCommentRepository, ArticleContentRepository,
        ArticleInfoRepository, ArticlePictureRepository, CategoryInfoRepository,
        CommentRepository, Storage, UnitOfWork,
    },
};
