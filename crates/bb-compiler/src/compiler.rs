use bb_html::HtmlTag;
use bb_parser::{NodeId, OpeningTagData, Token, Tree};
use tracing::{debug, trace};

use crate::options::CompilerOptions;
use crate::registry::{RuleContext, TagRegistry, TagRule};

/// Converts bbcode into html.
///
/// Every input compiles, markup that can not be matched degrades to literal
/// text. Text and attribute values are escaped when rendered so the output
/// is safe to embed in a page.
///
/// ```
/// use bb_compiler::Compiler;
///
/// let compiler = Compiler::default();
/// assert_eq!(compiler.compile("[b]hi[/b] <3"), "<b>hi</b> &lt;3");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Compiler {
    options: CompilerOptions,
    registry: TagRegistry,
}

impl Compiler {
    /// A compiler with all built-in tags.
    pub fn new(options: CompilerOptions) -> Self {
        Self::with_registry(options, TagRegistry::default())
    }

    pub fn with_registry(options: CompilerOptions, registry: TagRegistry) -> Self {
        Self { options, registry }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut CompilerOptions {
        &mut self.options
    }

    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TagRegistry {
        &mut self.registry
    }

    /// Render tag `name` with `rule` from now on, replacing any rule
    /// registered before.
    pub fn set_tag(&mut self, name: &str, rule: impl TagRule + 'static) -> &mut Self {
        self.registry.set(name, rule);
        self
    }

    /// Stop rendering tag `name`, it is kept as literal text afterwards.
    pub fn remove_tag(&mut self, name: &str) -> &mut Self {
        self.registry.remove(name);
        self
    }

    /// Compile bbcode `input` to an html string.
    pub fn compile(&self, input: &str) -> String {
        let tree = Tree::parse(input);
        self.compile_tree(&tree)
            .render(self.options.sort_output_attributes)
    }

    /// Compile a parsed bbcode tree to html nodes.
    pub fn compile_tree(&self, tree: &Tree) -> HtmlTag {
        self.compile_node(tree, tree.root())
    }

    /// Compile `id` and its descendants.
    ///
    /// Recurses once per nesting level, which the tree keeps within
    /// [Tree::MAX_DEPTH].
    pub(crate) fn compile_node(&self, tree: &Tree, id: NodeId) -> HtmlTag {
        let node = tree.node(id);
        match node.token() {
            Token::Text(text) => {
                let mut out = HtmlTag::text_with_breaks(text);
                out.children.extend(self.compile_children(tree, id));
                out
            }
            Token::ClosingTag(tag) => {
                let mut out = if self.options.ignore_unmatched_closing_tags {
                    trace!("dropping unmatched closing tag {:?}", tag.raw);
                    HtmlTag::empty()
                } else {
                    HtmlTag::text_with_breaks(&tag.raw)
                };
                out.children.extend(self.compile_children(tree, id));
                out
            }
            Token::OpeningTag(tag) => {
                if node.closing_tag().is_some() || self.options.auto_close_unterminated_tags {
                    self.compile_tag(tree, id, tag)
                } else {
                    trace!("unclosed tag {:?} kept as text", tag.raw);
                    let mut out = HtmlTag::text_with_breaks(&tag.raw);
                    out.children.extend(self.compile_children(tree, id));
                    out
                }
            }
        }
    }

    /// Compile every child of `id`, in order.
    pub(crate) fn compile_children(&self, tree: &Tree, id: NodeId) -> Vec<HtmlTag> {
        tree.children(id)
            .iter()
            .map(|x| self.compile_node(tree, *x))
            .collect()
    }

    /// Render `id` and all its descendants as the literal source they were
    /// parsed from.
    pub(crate) fn compile_raw(&self, tree: &Tree, id: NodeId) -> HtmlTag {
        let node = tree.node(id);
        let mut out = HtmlTag::text_with_breaks(node.token().raw());
        for child in node.children() {
            out.append_child(self.compile_raw(tree, *child));
        }
        if let Some(closing) = node.closing_tag() {
            out.append_child(HtmlTag::text_with_breaks(&closing.raw));
        }
        out
    }

    fn compile_tag(&self, tree: &Tree, id: NodeId, tag: &OpeningTagData) -> HtmlTag {
        let Some(rule) = self.registry.get(&tag.name) else {
            debug!("no rule for tag {:?}, kept as text", tag.name);
            let mut out = HtmlTag::empty();
            out.append_child(HtmlTag::text_with_breaks(&tag.raw));
            out.children.extend(self.compile_children(tree, id));
            if let Some(closing) = tree.node(id).closing_tag() {
                out.append_child(HtmlTag::text_with_breaks(&closing.raw));
            }
            return out;
        };

        let ctx = RuleContext {
            compiler: self,
            tree,
            node: id,
        };
        let (mut out, append_children) = rule.render(&ctx, tag);
        if append_children {
            out.children.extend(self.compile_children(tree, id));
            if out.children.is_empty() {
                out.append_child(HtmlTag::empty());
            }
        }
        out
    }
}
