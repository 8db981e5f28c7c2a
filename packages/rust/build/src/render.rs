//! HTML page rendering for exported and dev-served documents.
//!
//! Every document is wrapped in the same tera page shell. The shell honors
//! the resolved configuration: `basename` prefixes asset links,
//! `fullscreen` drops the centered-layout wrapper, and `static_export`
//! omits the client script tag. The dev server reuses this renderer and
//! additionally injects a live-reload snippet.

use std::sync::OnceLock;

use tera::Tera;

use mdxgo_shared::{MdxGoError, ResolvedConfig, Result};

/// The built-in page shell.
const PAGE_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title }}</title>
<meta name="generator" content="mdx-go {{ version }}">
<style>
body { font-family: system-ui, sans-serif; margin: 0; line-height: 1.6; }
{% if not fullscreen %}main { max-width: 48rem; margin: 0 auto; padding: 2rem 1rem; }{% else %}main { padding: 2rem 1rem; }{% endif %}
.mdx-source { white-space: pre-wrap; font: inherit; margin: 0; }
</style>
</head>
<body>
<main>
<article>
<pre class="mdx-source">{{ content }}</pre>
</article>
</main>
{% if include_client %}<script type="module" src="{{ basename | safe }}/bundle.js"></script>
{% endif %}{% if live_reload %}<script>(function(){var c=null;async function t(){try{var r=await fetch('{{ basename | safe }}/__mdx_go__/version',{cache:'no-store'});var v=await r.text();if(c===null)c=v;else if(v!==c)location.reload();}catch(e){}setTimeout(t,1000);}t();})();</script>
{% endif %}</body>
</html>
"#;

fn templates() -> &'static Tera {
    static TERA: OnceLock<Tera> = OnceLock::new();
    TERA.get_or_init(|| {
        let mut tera = Tera::default();
        tera.add_raw_template("page.html", PAGE_TEMPLATE)
            .expect("built-in page template is valid");
        tera
    })
}

/// Extract a page title: the first `# ` heading, else the fallback.
pub fn page_title(source: &str, fallback: &str) -> String {
    source
        .lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(|t| t.trim().to_string())
        .unwrap_or_else(|| fallback.to_string())
}

/// Render one document into the page shell.
///
/// `live_reload` is set by the dev server only; exports never poll.
pub fn render_page(
    title: &str,
    source: &str,
    config: &ResolvedConfig,
    live_reload: bool,
) -> Result<String> {
    let mut ctx = tera::Context::new();
    ctx.insert("title", title);
    ctx.insert("content", source);
    ctx.insert("version", env!("CARGO_PKG_VERSION"));
    ctx.insert("basename", &config.basename);
    ctx.insert("fullscreen", &config.fullscreen);
    ctx.insert("include_client", &!config.static_export);
    ctx.insert("live_reload", &live_reload);

    templates()
        .render("page.html", &ctx)
        .map_err(|e| MdxGoError::Build(format!("page render failed for {title:?}: {e}")))
}
