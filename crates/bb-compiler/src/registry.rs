use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bb_html::HtmlTag;
use bb_parser::{NodeId, OpeningTagData, Tree};

use crate::compiler::Compiler;
use crate::rules;

/// The primary trait for converting a bbcode tag to html.
///
/// A rule is only asked to render tags that were properly closed (or any
/// opening tag when auto close is on). It returns the rendered element and
/// whether the compiler shall append the compiled children of the tag to
/// it. Return `false` when the rule already took care of the children or
/// wants to drop them.
///
/// Plain functions and closures with the same signature are rules too:
///
/// ```
/// use bb_compiler::{Compiler, RuleContext};
/// use bb_html::HtmlTag;
/// use bb_parser::OpeningTagData;
///
/// fn shout(ctx: &RuleContext<'_>, _: &OpeningTagData) -> (HtmlTag, bool) {
///     (HtmlTag::text(ctx.text_content().to_uppercase()), false)
/// }
///
/// let mut compiler = Compiler::default();
/// compiler.set_tag("shout", shout);
/// assert_eq!(compiler.compile("[shout]hey[/shout]"), "HEY");
/// ```
pub trait TagRule: Send + Sync {
    fn render(&self, ctx: &RuleContext<'_>, tag: &OpeningTagData) -> (HtmlTag, bool);
}

impl<F> TagRule for F
where
    F: Fn(&RuleContext<'_>, &OpeningTagData) -> (HtmlTag, bool) + Send + Sync,
{
    fn render(&self, ctx: &RuleContext<'_>, tag: &OpeningTagData) -> (HtmlTag, bool) {
        self(ctx, tag)
    }
}

/// What a [TagRule] can see of the tag it renders.
pub struct RuleContext<'a> {
    pub(crate) compiler: &'a Compiler,
    pub(crate) tree: &'a Tree,
    pub(crate) node: NodeId,
}

impl<'a> RuleContext<'a> {
    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    /// The node of the tag being rendered.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// All text inside the tag, nested tags stripped.
    pub fn text_content(&self) -> String {
        self.tree.text_content(self.node)
    }

    /// Compile the children of the tag the normal way.
    pub fn compile_children(&self) -> Vec<HtmlTag> {
        self.compiler.compile_children(self.tree, self.node)
    }

    /// Render the children of the tag as literal text, nested markup
    /// included.
    pub fn compile_raw_children(&self) -> Vec<HtmlTag> {
        self.tree
            .children(self.node)
            .iter()
            .map(|x| self.compiler.compile_raw(self.tree, *x))
            .collect()
    }
}

/// Maps tag names to the [TagRule] rendering them.
///
/// Names are matched ignoring ascii case. [TagRegistry::default] holds all
/// built-in rules, see [rules](crate::rules).
#[derive(Clone)]
pub struct TagRegistry {
    rules: HashMap<String, Arc<dyn TagRule>>,
}

impl TagRegistry {
    /// A registry with no rules, every tag renders as literal text.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// Register `rule` for tag `name`, returning the rule it replaced.
    pub fn set(&mut self, name: &str, rule: impl TagRule + 'static) -> Option<Arc<dyn TagRule>> {
        self.set_shared(name, Arc::new(rule))
    }

    /// Same as [TagRegistry::set] for a rule already shared elsewhere.
    pub fn set_shared(&mut self, name: &str, rule: Arc<dyn TagRule>) -> Option<Arc<dyn TagRule>> {
        self.rules.insert(name.to_ascii_lowercase(), rule)
    }

    /// Unregister tag `name`. It renders as literal text afterwards.
    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn TagRule>> {
        self.rules.remove(&name.to_ascii_lowercase())
    }

    /// Attempt to locate the rule for the given tag, if one exists.
    pub fn get(&self, name: &str) -> Option<&dyn TagRule> {
        self.rules
            .get(&name.to_ascii_lowercase())
            .map(|x| &**x)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(&name.to_ascii_lowercase())
    }

    /// Names of all registered tags, lowercase, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        rules::register_builtins(&mut registry);
        registry
    }
}

impl fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.names().collect::<Vec<_>>();
        names.sort_unstable();
        f.debug_struct("TagRegistry").field("rules", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::TagRegistry;
    use crate::rules::SimpleTag;

    #[test]
    fn builtin_names() {
        let registry = TagRegistry::default();
        let mut names = registry.names().collect::<Vec<_>>();
        names.sort_unstable();
        assert_eq!(
            names,
            [
                "b", "center", "code", "color", "i", "img", "media", "quote", "s", "size",
                "spoiler", "strike", "u", "url"
            ]
        );
    }

    #[test]
    fn names_ignore_case() {
        let mut registry = TagRegistry::empty();
        assert!(registry.set("H1", SimpleTag::new("h1")).is_none());
        assert!(registry.contains("h1"));
        assert!(registry.get("H1").is_some());
        assert!(registry.set("h1", SimpleTag::new("h2")).is_some());
        assert!(registry.remove("H1").is_some());
        assert!(!registry.contains("h1"));
    }

    #[test]
    fn debug_lists_sorted_names() {
        let mut registry = TagRegistry::empty();
        registry.set("u", SimpleTag::new("u"));
        registry.set("b", SimpleTag::new("b"));
        assert_eq!(format!("{registry:?}"), r#"TagRegistry { rules: ["b", "u"] }"#);
    }
}
