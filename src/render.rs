mod markdown;

pub use self::markdown::MarkdownRenderer;

/// 将 markdown 源文本渲染为 HTML
pub trait Renderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}
