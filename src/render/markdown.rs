use comrak::options::Options;

use super::Renderer;

/// 基于 comrak 的 markdown 渲染器
///
/// 开启 GFM 常用扩展（表格、删除线、自动链接、任务列表、脚注），
/// 正文中的原始 HTML 会被转义而不是原样输出。
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    fn options() -> Options<'static> {
        let mut options = Options::default();

        let ext = &mut options.extension;
        ext.strikethrough = true;
        ext.table = true;
        ext.autolink = true;
        ext.tasklist = true;
        ext.footnotes = true;

        let render = &mut options.render;
        render.github_pre_lang = true;
        render.escape = true;

        options
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> String {
        comrak::markdown_to_html(markdown, &Self::options())
    }
}
