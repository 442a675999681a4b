use ammonia::Builder;
use once_cell::sync::Lazy;

static ARTICLE_SANITIZER: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::default();
    builder
        .add_tags(&[
            "code", "pre", "span", "table", "thead", "tbody", "tr", "th", "td", "h2", "h3", "h4",
            "img",
        ])
        .add_generic_attributes(&["style", "src", "alt", "title", "width", "height"])
        .add_url_schemes(&["data"]);
    builder
});

/// Cleans user-authored article HTML against the allow-list.
pub fn sanitize_article_html(html: &str) -> String {
    ARTICLE_SANITIZER.clean(html).to_string()
}
