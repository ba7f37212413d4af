//! Built-in [TagRule]s.
//!
//! Each rule is a plain function so custom rules can wrap them, see
//! [Compiler::set_tag](crate::Compiler::set_tag).

use std::sync::OnceLock;

use bb_html::{safe_url, HtmlTag};
use bb_parser::OpeningTagData;
use regex::Regex;

use crate::registry::{RuleContext, TagRegistry, TagRule};

/// Font size step of `[size=N]`, in px.
///
/// `[size=6]` renders as `font-size: 24px;`. There is no upper bound, sizes
/// are a hint from the author like colors are.
pub const SIZE_STEP_PX: u32 = 4;

/// Size of embedded video players.
const MEDIA_WIDTH: &str = "620";
const MEDIA_HEIGHT: &str = "349";

/// Regex to find the video id in a youtube link.
static YOUTUBE_RE: OnceLock<Regex> = OnceLock::new();

/// Register every built-in rule.
pub(crate) fn register_builtins(registry: &mut TagRegistry) {
    registry.set("url", url);
    registry.set("img", img);
    registry.set("center", center);
    registry.set("color", color);
    registry.set("size", size);
    registry.set("quote", quote);
    registry.set("spoiler", spoiler);
    registry.set("code", code);
    registry.set("media", media);
    registry.set("b", SimpleTag::new("b"));
    registry.set("i", SimpleTag::new("i"));
    registry.set("u", SimpleTag::new("u"));
    registry.set("s", SimpleTag::new("s"));
    registry.set("strike", SimpleTag::new("s"));
}

/// A tag with no arguments which converts directly to one html element.
///
/// `[b]x[/b]` with `SimpleTag::new("b")` gives `<b>x</b>`. Value and
/// arguments of the tag are ignored.
#[derive(Clone, Copy, Debug)]
pub struct SimpleTag {
    html: &'static str,
}

impl SimpleTag {
    pub const fn new(html: &'static str) -> Self {
        Self { html }
    }
}

impl TagRule for SimpleTag {
    fn render(&self, _: &RuleContext<'_>, _: &OpeningTagData) -> (HtmlTag, bool) {
        (HtmlTag::new(self.html), true)
    }
}

/// The tag value, or the text inside the tag when there is no value.
fn value_or_text(ctx: &RuleContext<'_>, tag: &OpeningTagData) -> String {
    if tag.value.is_empty() {
        ctx.text_content()
    } else {
        tag.value.clone()
    }
}

/// Tag `[url]$URL[/url]` or `[url=$URL]$DATA[/url]`. Url links.
pub fn url(ctx: &RuleContext<'_>, tag: &OpeningTagData) -> (HtmlTag, bool) {
    let href = safe_url(&value_or_text(ctx, tag));
    (HtmlTag::new("a").with_attr("href", href), true)
}

/// Tag `[img]$URL[/img]` or `[img=$URL]$ALT[/img]`. Images.
///
/// With a value, the text inside becomes both `alt` and `title`.
pub fn img(ctx: &RuleContext<'_>, tag: &OpeningTagData) -> (HtmlTag, bool) {
    let mut out = HtmlTag::new("img");
    if tag.value.is_empty() {
        out.set_attr("src", safe_url(&ctx.text_content()));
    } else {
        out.set_attr("src", safe_url(&tag.value));
        let alt = ctx.text_content();
        if !alt.is_empty() {
            out.set_attr("title", alt.clone());
            out.set_attr("alt", alt);
        }
    }
    (out, false)
}

/// Tag `[center]$DATA[/center]`.
pub fn center(_: &RuleContext<'_>, _: &OpeningTagData) -> (HtmlTag, bool) {
    (
        HtmlTag::new("div").with_attr("style", "text-align: center;"),
        true,
    )
}

/// Tag `[color=$COLOR]$DATA[/color]`. Text color.
///
/// The color is not validated, any css color works and anything else is
/// ignored by the browser. Escaping keeps it inside the attribute.
pub fn color(_: &RuleContext<'_>, tag: &OpeningTagData) -> (HtmlTag, bool) {
    let mut out = HtmlTag::new("span");
    if !tag.value.is_empty() {
        out.set_attr("style", format!("color: {};", tag.value));
    }
    (out, true)
}

/// Tag `[size=$N]$DATA[/size]`. Font size, [SIZE_STEP_PX] per step.
///
/// Values that are not a non-negative integer leave the text unstyled.
pub fn size(_: &RuleContext<'_>, tag: &OpeningTagData) -> (HtmlTag, bool) {
    let mut out = HtmlTag::new("span");
    if let Ok(size) = tag.value.trim().parse::<u32>() {
        out.set_attr(
            "style",
            format!("font-size: {}px;", size.saturating_mul(SIZE_STEP_PX)),
        );
    }
    (out, true)
}

/// Tag `[quote]`, `[quote=$WHO]` or `[quote name=$WHO]`. Block quote with
/// attribution.
///
/// The `name` argument wins over the value.
pub fn quote(_: &RuleContext<'_>, tag: &OpeningTagData) -> (HtmlTag, bool) {
    let who = tag.arg("name").unwrap_or(tag.value.as_str());
    let cite = if who.is_empty() {
        String::from("Quote")
    } else {
        format!("{who} said:")
    };

    let cite = HtmlTag::new("cite").with_child(HtmlTag::text(cite));
    (HtmlTag::new("blockquote").with_child(cite), true)
}

/// Tag `[spoiler]$DATA[/spoiler]`. Collapsed block, expanded by page
/// scripts.
pub fn spoiler(_: &RuleContext<'_>, _: &OpeningTagData) -> (HtmlTag, bool) {
    (
        HtmlTag::new("div").with_attr("class", "expandable collapsed"),
        true,
    )
}

/// Tag `[code]$DATA[/code]`. Preformatted block, markup inside is kept as
/// is.
pub fn code(ctx: &RuleContext<'_>, _: &OpeningTagData) -> (HtmlTag, bool) {
    let mut out = HtmlTag::new("pre");
    out.children = ctx.compile_raw_children();
    if out.children.is_empty() {
        out.append_child(HtmlTag::empty());
    }
    (out, false)
}

/// Tag `[media]$URL[/media]`. Embedded video player.
///
/// Only youtube links are supported, others render a placeholder.
pub fn media(ctx: &RuleContext<'_>, tag: &OpeningTagData) -> (HtmlTag, bool) {
    let source = value_or_text(ctx, tag);
    let out = match youtube_id(&source) {
        Some(id) => {
            let player = HtmlTag::new("iframe")
                .with_attr("src", format!("https://www.youtube.com/embed/{id}"))
                .with_attr("width", MEDIA_WIDTH)
                .with_attr("height", MEDIA_HEIGHT)
                .with_attr("frameborder", "0")
                .with_attr("allowfullscreen", "")
                .with_child(HtmlTag::empty());
            HtmlTag::new("div")
                .with_attr("class", "embedded-video")
                .with_child(player)
        }
        None => HtmlTag::new("div")
            .with_attr("class", "unsupported-media")
            .with_child(HtmlTag::text("Unsupported media")),
    };
    (out, false)
}

fn youtube_id(source: &str) -> Option<&str> {
    YOUTUBE_RE
        .get_or_init(|| {
            Regex::new(
                r"(?:https?://)?(?:www\.)?(?:youtube\.com|youtu\.be)/(?:watch\?v=)?([a-zA-Z0-9_-]+)",
            )
            .expect("youtube regex is valid")
        })
        .captures(source)
        .and_then(|x| x.get(1))
        .map(|x| x.as_str())
}
