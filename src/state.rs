use std::sync::Arc;

use crate::{
    render::Renderer,
    service::{ArticleService, CategoryService, CommentService},
    storage::Storage,
};

/// 应用程序上下文
///
/// [`AppState`] 封装了各个服务、Markdown 渲染器和管理 token，提供统一访问入口。
#[derive(Clone)]
pub struct AppState<S> {
    articles: ArticleService<S>,
    categories: CategoryService<S>,
    comments: CommentService<S>,
    renderer: Arc<dyn Renderer>,
    admin_token: Option<Arc<str>>,
}

impl<S: Storage> AppState<S> {
    /// 创建一个新的 [`AppState`] 实例
    pub fn new(store: S, renderer: impl Renderer + 'static, admin_token: Option<String>) -> Self {
        Self {
            articles: ArticleService::new(store.clone()),
            categories: CategoryService::new(store.clone()),
            comments: CommentService::new(store),
            renderer: Arc::new(renderer),
            admin_token: admin_token.map(Arc::from),
        }
    }

    pub fn articles(&self) -> &ArticleService<S> {
        &self.articles
    }

    pub fn categories(&self) -> &CategoryService<S> {
        &self.categories
    }

    pub fn comments(&self) -> &CommentService<S> {
        &self.comments
    }

    /// 获取 Markdown 渲染器
    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    /// 管理接口 token，`None` 表示管理接口关闭
    pub fn admin_token(&self) -> Option<&str> {
        self.admin_token.as_deref()
    }
}
