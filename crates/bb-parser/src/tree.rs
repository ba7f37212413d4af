use tracing::{debug, trace};

use crate::lexer::Lexer;
use crate::token::{ClosingTagData, Token};

/// Index of a [BBCodeNode] inside its [Tree].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A node in the bbcode tree.
///
/// Every node wraps the [Token] it was built from. Opening tags hold the
/// content lexed after them as children, text and orphaned closing tags
/// never have children.
#[derive(Clone, Debug)]
pub struct BBCodeNode {
    token: Token,

    /// Back reference, `None` only for the root.
    parent: Option<NodeId>,

    children: Vec<NodeId>,

    /// The closing tag matched with this node, only for opening tags.
    closing: Option<ClosingTagData>,
}

impl BBCodeNode {
    fn new(token: Token, parent: Option<NodeId>) -> Self {
        Self {
            token,
            parent,
            children: vec![],
            closing: None,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The closing tag that matched this node, if any.
    pub fn closing_tag(&self) -> Option<&ClosingTagData> {
        self.closing.as_ref()
    }
}

/// Tree of bbcode nodes.
///
/// Nodes live in an arena owned by the tree, children and parents refer to
/// each other by [NodeId]. The root is a synthetic text node that holds the
/// leading text of the document as its own value.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<BBCodeNode>,
}

impl Tree {
    const ROOT: NodeId = NodeId(0);

    /// Deepest nesting of open tags kept as tag nodes.
    ///
    /// Opening tags below it are kept as text, so walking the tree
    /// recursively stays within this many levels.
    pub const MAX_DEPTH: usize = 128;

    /// Lex and build `input`.
    pub fn parse(input: &str) -> Self {
        Self::build(Lexer::new(input))
    }

    /// Build a tree from a token stream.
    ///
    /// A closing tag closes the nearest open ancestor with the same name,
    /// ignoring ascii case, even if other tags opened after it are still
    /// open. Those stay unclosed. A closing tag without such an ancestor is
    /// kept in place as an orphan.
    pub fn build(tokens: impl IntoIterator<Item = Token>) -> Self {
        let mut builder = TreeBuilder::new();
        for token in tokens {
            builder.push_token(token);
        }
        builder.finish()
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn node(&self, id: NodeId) -> &BBCodeNode {
        &self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// `id` itself followed by its parent, grand parent and so on up to the
    /// root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |x| self.nodes[x.0].parent)
    }

    /// Concatenated text of `id` and all its descendants, in document order.
    ///
    /// Only text nodes contribute; tags are skipped but their content is
    /// not.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let node = self.node(id);
            if let Token::Text(text) = &node.token {
                out.push_str(text);
            }
            pending.extend(node.children.iter().rev());
        }
        out
    }
}

/// Incremental tree construction.
///
/// Invariants:
/// - `current` always points at the root or at an opening tag that has no
///   closing tag yet.
/// - Nodes are only appended under `current`, so ids grow in document order.
/// - `depth` is the count of open tags from the root down to `current`, never
///   more than [Tree::MAX_DEPTH].
struct TreeBuilder {
    tree: Tree,
    current: NodeId,
    depth: usize,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            tree: Tree {
                nodes: vec![BBCodeNode::new(Token::Text(String::new()), None)],
            },
            current: Tree::ROOT,
            depth: 0,
        }
    }

    fn push_token(&mut self, token: Token) {
        match token {
            Token::Text(text) => self.push_text(text),
            Token::OpeningTag(tag) if self.depth >= Tree::MAX_DEPTH => {
                trace!("tag {:?} nested too deep, kept as text", tag.raw);
                self.push_text(tag.raw);
            }
            Token::OpeningTag(..) => {
                self.current = self.append(self.current, token);
                self.depth += 1;
            }
            Token::ClosingTag(tag) => self.push_closing(tag),
        }
    }

    fn push_text(&mut self, text: String) {
        let current = self.current;
        match self.tree.nodes[current.0].children.last().copied() {
            Some(last) => {
                if let Token::Text(prev) = &mut self.tree.nodes[last.0].token {
                    prev.push_str(&text);
                    return;
                }
            }
            None => {
                if let Token::Text(value) = &mut self.tree.nodes[current.0].token {
                    value.push_str(&text);
                    return;
                }
            }
        }
        self.append(current, Token::Text(text));
    }

    fn push_closing(&mut self, tag: ClosingTagData) {
        let matched = self.tree.ancestors(self.current).find(|id| {
            let node = self.tree.node(*id);
            node.closing.is_none()
                && matches!(&node.token, Token::OpeningTag(open) if tag.closes(&open.name))
        });

        match matched {
            Some(id) => {
                let node = &mut self.tree.nodes[id.0];
                node.closing = Some(tag);
                // Only the root has no parent and the root is never an opening tag.
                self.current = node.parent.unwrap_or(Tree::ROOT);
                self.depth = self.tree.ancestors(self.current).count() - 1;
            }
            None => {
                debug!("orphaned closing tag {:?}", tag.raw);
                self.append(self.current, Token::ClosingTag(tag));
            }
        }
    }

    fn append(&mut self, parent: NodeId, token: Token) -> NodeId {
        let id = NodeId(self.tree.nodes.len());
        self.tree.nodes.push(BBCodeNode::new(token, Some(parent)));
        self.tree.nodes[parent.0].children.push(id);
        id
    }

    fn finish(self) -> Tree {
        if self.current != Tree::ROOT {
            let unclosed = self
                .tree
                .ancestors(self.current)
                .filter(|x| *x != Tree::ROOT)
                .count();
            debug!("{unclosed} tag(s) left unclosed");
        }
        self.tree
    }
}
