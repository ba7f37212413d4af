//! Html output side of the bbcode compiler.
//!
//! [HtmlTag] is a small element tree built by the compiler. Text values are
//! stored unescaped and escaped exactly once when rendered.

use std::collections::HashMap;
use std::fmt;

mod sanitize;

pub use sanitize::safe_url;

/// An html element, a text run, or both.
///
/// * `name` empty: no wrapping element, render `value` then `children`.
/// * `name` set: render `value` followed by the element.
///
/// An element without children renders as a single open tag (`<br>`,
/// `<img src="...">`). Append an [HtmlTag::empty] child to force a closing
/// tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HtmlTag {
    /// Element name, empty for bare text.
    pub name: String,

    /// Literal text placed before the element.
    pub value: String,

    /// Element attributes.
    pub attrs: HashMap<String, String>,

    /// Child nodes, in order.
    pub children: Vec<HtmlTag>,
}

impl HtmlTag {
    /// An element named `name` with nothing in it.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Plain text.
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    /// Renders to nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `<br>`
    pub fn line_break() -> Self {
        Self::new("br")
    }

    /// Plain text where every `\n` turns into a [HtmlTag::line_break].
    ///
    /// The first line is the value, the following lines and breaks are
    /// children. Empty lines produce no text node but their break is kept:
    /// `"a\n\nb"` renders `a<br><br>b`.
    pub fn text_with_breaks(value: &str) -> Self {
        let mut lines = value.split('\n');
        let mut out = Self::text(lines.next().unwrap_or_default());
        for line in lines {
            out.children.push(Self::line_break());
            if !line.is_empty() {
                out.children.push(Self::text(line));
            }
        }
        out
    }

    /// Builder style [HtmlTag::set_attr].
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Builder style [HtmlTag::append_child].
    pub fn with_child(mut self, child: HtmlTag) -> Self {
        self.children.push(child);
        self
    }

    pub fn append_child(&mut self, child: HtmlTag) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Serialize to html.
    ///
    /// Attributes come out in map order unless `sort_attributes` is set, in
    /// which case they are sorted by name.
    pub fn render(&self, sort_attributes: bool) -> String {
        let mut out = String::new();
        self.write_html(&mut out, sort_attributes);
        out
    }

    fn write_html(&self, out: &mut String, sort_attributes: bool) {
        // Walk with an explicit stack, trees can be arbitrarily deep.
        let mut pending = vec![Step::Open(self)];
        while let Some(step) = pending.pop() {
            let tag = match step {
                Step::Open(tag) => tag,
                Step::Close(name) => {
                    out.push_str("</");
                    out.push_str(name);
                    out.push('>');
                    continue;
                }
            };

            out.push_str(&escape(&tag.value));
            if !tag.name.is_empty() {
                tag.write_open_tag(out, sort_attributes);
                if tag.children.is_empty() {
                    continue;
                }
                pending.push(Step::Close(&tag.name));
            }
            pending.extend(tag.children.iter().rev().map(Step::Open));
        }
    }

    fn write_open_tag(&self, out: &mut String, sort_attributes: bool) {
        out.push('<');
        out.push_str(&self.name);
        let mut attrs = self.attrs.iter().collect::<Vec<_>>();
        if sort_attributes {
            attrs.sort_unstable_by(|a, b| a.0.cmp(b.0));
        }
        for (name, value) in attrs {
            // Attribute values never carry line breaks.
            let value = value.replace(['\n', '\r'], "");
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(&value));
            out.push('"');
        }
        out.push('>');
    }
}

/// Pending work of [HtmlTag::write_html].
enum Step<'a> {
    Open(&'a HtmlTag),
    Close(&'a str),
}

impl fmt::Display for HtmlTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

/// Escape `&`, `<`, `>`, `"` and `'`.
pub fn escape(text: &str) -> std::borrow::Cow<'_, str> {
    html_escape::encode_quoted_attribute(text)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::HtmlTag;

    #[test]
    fn text_is_escaped() {
        assert_eq!(HtmlTag::text("<script>").render(false), "&lt;script&gt;");
        assert_eq!(HtmlTag::text("a & b").render(false), "a &amp; b");
        assert_eq!(HtmlTag::text("say \"hi\"").render(false), "say &quot;hi&quot;");
    }

    #[test]
    fn element_shapes() {
        assert_eq!(HtmlTag::line_break().render(false), "<br>");
        assert_eq!(
            HtmlTag::new("b").with_child(HtmlTag::text("x")).render(false),
            "<b>x</b>"
        );
        assert_eq!(
            HtmlTag::new("b").with_child(HtmlTag::empty()).render(false),
            "<b></b>"
        );
        assert_eq!(
            HtmlTag::text("lead")
                .with_child(HtmlTag::new("i").with_child(HtmlTag::text("x")))
                .render(false),
            "lead<i>x</i>"
        );
        assert_eq!(HtmlTag::empty().render(false), "");
    }

    #[test]
    fn named_tag_value_goes_first() {
        let mut tag = HtmlTag::new("b");
        tag.value = "before".into();
        tag.append_child(HtmlTag::text("in"));
        assert_eq!(tag.to_string(), "before<b>in</b>");
    }

    #[test]
    fn attributes_are_escaped_and_single_line() {
        let tag = HtmlTag::new("img").with_attr("alt", "a\n\"b\"\r<c>");
        assert_eq!(tag.render(true), r#"<img alt="a&quot;b&quot;&lt;c&gt;">"#);
    }

    #[test]
    fn sorted_attributes() {
        let tag = HtmlTag::new("img")
            .with_attr("title", "t")
            .with_attr("src", "s")
            .with_attr("alt", "a");
        assert_eq!(tag.render(true), r#"<img alt="a" src="s" title="t">"#);
    }

    #[test]
    fn unsorted_attributes_are_all_present() {
        let tag = HtmlTag::new("img").with_attr("src", "s").with_attr("alt", "a");
        let html = tag.render(false);
        assert!(html.starts_with("<img "));
        assert!(html.contains(r#" src="s""#));
        assert!(html.contains(r#" alt="a""#));
    }

    #[rstest]
    #[case("a\nb", "a<br>b")]
    #[case("a\n\nb", "a<br><br>b")]
    #[case("\n", "<br>")]
    #[case("a\n", "a<br>")]
    #[case("\na", "<br>a")]
    #[case("no breaks", "no breaks")]
    #[case("x<\ny>", "x&lt;<br>y&gt;")]
    fn line_breaks(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(HtmlTag::text_with_breaks(input).render(false), expected);
    }

    #[test]
    fn attribute_lookup() {
        let tag = HtmlTag::new("a").with_attr("href", "x");
        assert_eq!(tag.attr("href"), Some("x"));
        assert_eq!(tag.attr("missing"), None);
    }

    #[test]
    fn deep_nesting_renders() {
        let depth = 100_000;
        let mut tag = HtmlTag::text("x");
        for _ in 0..depth {
            tag = HtmlTag::new("b").with_child(tag);
        }
        let html = tag.render(false);
        assert_eq!(html.len(), depth * "<b></b>".len() + 1);
        assert!(html.starts_with("<b><b>"));
        assert!(html.ends_with("</b></b>"));
        // Dropping is recursive, unwind by hand.
        while let Some(child) = tag.children.pop() {
            tag = child;
        }
    }
}
