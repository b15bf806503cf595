//! The Parse-Tree Builder (spec §4.4): a recursive-descent walk over the
//! post-preprocessor block sequence that produces a typed tree with
//! structural nesting validation, grounded on `original_source/src/liquid.c`'s
//! `liquid_is_valid` and the teacher's arena-backed `ASTNode` (`ast_node.rs`)
//! including its `ptree::TreeItem` impl for developer-facing printing.

use std::borrow::Cow;
use std::fmt;
use std::ops::Index;

use ptree::{Style, TreeItem};

use crate::block::{BlockArena, BlockType};
use crate::error::FluidError;
use crate::filter::Filter;
use crate::keyword::{is_valid, BlockKind, Keyword};
use crate::token::{tokenize_object, tokenize_tag, Operator, ObjectToken, TagToken};
use crate::util::{Code, Position};

/// Index of a [`Node`] inside a [`Tree`]. See [`crate::block::BlockId`]
/// for the same arena-over-pointer-graph rationale applied here to
/// parse-tree nodes instead of blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The fixed lhs/operator/rhs triple a tag's condition operand parses
/// into (spec §3's `Compare` variant), shared by `if`, `unless`, and the
/// synthesized equality check each `case`/`when` branch builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compare {
    pub lhs: String,
    pub operator: Operator,
    pub rhs: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Text(String),
    Object {
        identifier: String,
        filters: Vec<Filter>,
    },
    /// `break`/`continue`.
    Statement(Keyword),
    /// `assign`/`increment`/`decrement`; `expression` is absent for the
    /// latter two (spec §4.4).
    Assign {
        keyword: Keyword,
        identifier: String,
        expression: Option<String>,
    },
    Branch {
        condition: Compare,
        true_body: NodeId,
        false_body: Option<NodeId>,
    },
    Loop {
        identifier: String,
        expression: String,
        body: NodeId,
    },
    /// `capture`/`endcapture`. Not itemized among spec §3's node variants
    /// (which predate `capture` as a tag entry in the builder's dispatch
    /// table), but `capture` is a registered block-opening keyword with
    /// its own closer (§3's Keyword enum, `keyword.rs`'s block registry)
    /// — leaving it structurally unbuildable would make that table entry
    /// dead data. Modeled the same way `Loop` pairs an identifier with a
    /// body.
    Capture { identifier: String, body: NodeId },
    /// An ordered run of children — the concrete shape "body:node" takes
    /// in `Branch`/`Loop`/`Capture`, since a body is itself an ordered
    /// sequence of nodes (spec §3: "Children are an ordered sequence").
    Sequence(Vec<NodeId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub position: Position,
}

/// Flat storage for a template's parse-tree nodes (see [`crate::block::BlockArena`]
/// for the same design rationale).
#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        match &self.get(id).kind {
            NodeKind::Sequence(children) => children.clone(),
            NodeKind::Branch {
                true_body,
                false_body,
                ..
            } => std::iter::once(*true_body)
                .chain(*false_body)
                .collect(),
            NodeKind::Loop { body, .. } => vec![*body],
            NodeKind::Capture { body, .. } => vec![*body],
            _ => Vec::new(),
        }
    }

    fn label(&self, id: NodeId) -> String {
        match &self.get(id).kind {
            NodeKind::Text(text) => format!("Text {text:?}"),
            NodeKind::Object { identifier, filters } => {
                format!("Object {identifier} ({} filter(s))", filters.len())
            }
            NodeKind::Statement(kw) => format!("Statement {kw}"),
            NodeKind::Assign {
                keyword,
                identifier,
                expression,
            } => match expression {
                Some(expr) => format!("{keyword} {identifier} = {expr}"),
                None => format!("{keyword} {identifier}"),
            },
            NodeKind::Branch { condition, .. } => format!(
                "Branch {} {} {}",
                condition.lhs,
                condition.operator.literal(),
                condition.rhs
            ),
            NodeKind::Loop {
                identifier,
                expression,
                ..
            } => format!("Loop {identifier} in {expression}"),
            NodeKind::Capture { identifier, .. } => format!("Capture {identifier}"),
            NodeKind::Sequence(children) => format!("Sequence ({} node(s))", children.len()),
        }
    }

    /// A [`ptree`]-printable view rooted at `id`, for the CLI's
    /// high-verbosity parse-tree dump.
    pub fn view(&self, id: NodeId) -> TreeView<'_> {
        TreeView { tree: self, id }
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;
    fn index(&self, id: NodeId) -> &Node {
        self.get(id)
    }
}

/// Borrowed view pairing a [`Tree`] with one of its nodes, implementing
/// [`ptree::TreeItem`] the same way the teacher's `ASTNode` does.
#[derive(Clone, Copy)]
pub struct TreeView<'t> {
    tree: &'t Tree,
    id: NodeId,
}

impl<'t> TreeItem for TreeView<'t> {
    type Child = TreeView<'t>;

    fn write_self<W: std::io::Write>(&self, f: &mut W, style: &Style) -> std::io::Result<()> {
        write!(f, "{}", style.paint(self.tree.label(self.id)))
    }

    fn children(&self) -> Cow<[Self::Child]> {
        Cow::Owned(
            self.tree
                .child_ids(self.id)
                .into_iter()
                .map(|id| TreeView { tree: self.tree, id })
                .collect(),
        )
    }
}

/// One pre-tokenized lexical item the builder walks over: the Token
/// Stage's output for every block in source order.
enum Item {
    Text(String, Position),
    Object(ObjectToken),
    Tag(TagToken),
}

fn tokenize_all(blocks: &BlockArena) -> Result<Vec<Item>, FluidError> {
    let source = blocks.reconstruct();
    let code = Code::from(source.as_str());
    blocks
        .iter()
        .map(|(_, block)| match block.kind {
            BlockType::Data => Ok(Item::Text(block.content.clone(), code.position_at(block.start))),
            BlockType::Object => {
                tokenize_object(&block.content, block.start, &code).map(Item::Object)
            }
            BlockType::Tag => tokenize_tag(&block.content, block.start, &code).map(Item::Tag),
        })
        .collect()
}

fn parse_compare(token: &TagToken) -> Result<Compare, FluidError> {
    if token.words.len() != 3 {
        return Err(FluidError::InvalidParameter {
            message: format!(
                "'{}' requires a 'lhs operator rhs' condition, found {} word(s)",
                token.keyword,
                token.words.len()
            ),
        });
    }
    let operator = Operator::resolve(&token.words[1]).ok_or_else(|| FluidError::InvalidParameter {
        message: format!("'{}' is not a recognized operator", token.words[1]),
    })?;
    Ok(Compare {
        lhs: token.words[0].clone(),
        operator,
        rhs: token.words[2].clone(),
    })
}

/// Builds a [`Tree`] from a preprocessed [`BlockArena`], returning the
/// tree plus the ordered top-level node ids.
pub fn build(blocks: &BlockArena) -> Result<(Tree, Vec<NodeId>), FluidError> {
    let items = tokenize_all(blocks)?;
    let mut tree = Tree::new();
    let mut cursor = 0usize;
    let mut ancestors: Vec<Keyword> = Vec::new();
    let root = parse_sequence(&items, &mut cursor, &mut tree, &mut ancestors)?;

    if cursor < items.len() {
        if let Item::Tag(token) = &items[cursor] {
            return Err(FluidError::InvalidNesting {
                keyword: token.keyword.literal().to_string(),
                position: token.position,
            });
        }
    }

    Ok((tree, root))
}

/// True when `keyword` is one of the terminator keywords `parse_sequence`
/// must stop at and hand back to its caller: an end-tag, or an
/// enclosed-chaining keyword (`elsif`/`else`/`when`).
fn is_terminator(keyword: Keyword) -> bool {
    keyword.is_end_tag() || matches!(keyword, Keyword::Elsif | Keyword::Else | Keyword::When)
}

/// Consume items, appending one node per block, until a terminator tag
/// is at the cursor or the items run out. Returns the consumed nodes;
/// the cursor is left pointing at the terminator (not consumed) or at
/// `items.len()`.
fn parse_sequence(
    items: &[Item],
    cursor: &mut usize,
    tree: &mut Tree,
    ancestors: &mut Vec<Keyword>,
) -> Result<Vec<NodeId>, FluidError> {
    let mut nodes = Vec::new();

    while *cursor < items.len() {
        match &items[*cursor] {
            Item::Text(text, position) => {
                nodes.push(tree.push(Node {
                    kind: NodeKind::Text(text.clone()),
                    position: *position,
                }));
                *cursor += 1;
            }
            Item::Object(token) => {
                nodes.push(tree.push(Node {
                    kind: NodeKind::Object {
                        identifier: token.expression.clone(),
                        filters: token.filters.clone(),
                    },
                    position: token.position,
                }));
                *cursor += 1;
            }
            Item::Tag(token) => {
                if is_terminator(token.keyword) {
                    break;
                }

                let parent = ancestors.last().copied();
                let any_ancestor_is_for = ancestors.contains(&Keyword::For);
                if !is_valid(parent, token.keyword, any_ancestor_is_for) {
                    return Err(FluidError::InvalidNesting {
                        keyword: token.keyword.literal().to_string(),
                        position: token.position,
                    });
                }

                let node_id = build_tag_node(items, cursor, tree, ancestors, token.clone())?;
                nodes.push(node_id);
            }
        }
    }

    Ok(nodes)
}

fn build_tag_node(
    items: &[Item],
    cursor: &mut usize,
    tree: &mut Tree,
    ancestors: &mut Vec<Keyword>,
    token: TagToken,
) -> Result<NodeId, FluidError> {
    match token.keyword {
        Keyword::Assign => {
            *cursor += 1;
            let identifier = token
                .words
                .first()
                .ok_or_else(|| FluidError::InvalidParameter {
                    message: "'assign' requires an identifier".to_string(),
                })?
                .clone();
            let expression = token.words[1..].join(" ");
            Ok(tree.push(Node {
                kind: NodeKind::Assign {
                    keyword: Keyword::Assign,
                    identifier,
                    expression: Some(expression),
                },
                position: token.position,
            }))
        }
        Keyword::Increment | Keyword::Decrement => {
            *cursor += 1;
            let identifier = token
                .words
                .first()
                .ok_or_else(|| FluidError::InvalidParameter {
                    message: format!("'{}' requires an identifier", token.keyword),
                })?
                .clone();
            Ok(tree.push(Node {
                kind: NodeKind::Assign {
                    keyword: token.keyword,
                    identifier,
                    expression: None,
                },
                position: token.position,
            }))
        }
        Keyword::Break | Keyword::Continue => {
            *cursor += 1;
            Ok(tree.push(Node {
                kind: NodeKind::Statement(token.keyword),
                position: token.position,
            }))
        }
        Keyword::If => build_if_chain(items, cursor, tree, ancestors),
        Keyword::Unless => build_unless(items, cursor, tree, ancestors),
        Keyword::For => build_for(items, cursor, tree, ancestors),
        Keyword::Case => build_case(items, cursor, tree, ancestors),
        Keyword::Capture => build_capture(items, cursor, tree, ancestors),
        other => Err(FluidError::InvalidNesting {
            keyword: other.literal().to_string(),
            position: token.position,
        }),
    }
}

/// Expect the tag at the cursor to be `expected`; advance past it. Used
/// for every block-closer that should never chain (`endfor`,
/// `endunless`, `endcapture`).
fn expect_end(
    items: &[Item],
    cursor: &mut usize,
    expected: Keyword,
    opener_position: Position,
) -> Result<(), FluidError> {
    match items.get(*cursor) {
        Some(Item::Tag(token)) if token.keyword == expected => {
            *cursor += 1;
            Ok(())
        }
        Some(Item::Tag(token)) => Err(FluidError::InvalidNesting {
            keyword: token.keyword.literal().to_string(),
            position: token.position,
        }),
        _ => Err(FluidError::MissingTerminator {
            opener: expected.literal(),
            position: opener_position,
        }),
    }
}

fn build_if_chain(
    items: &[Item],
    cursor: &mut usize,
    tree: &mut Tree,
    ancestors: &mut Vec<Keyword>,
) -> Result<NodeId, FluidError> {
    let opener = match &items[*cursor] {
        Item::Tag(token) => token.clone(),
        _ => unreachable!("build_if_chain is only called at an if/elsif tag"),
    };
    let condition = parse_compare(&opener)?;
    *cursor += 1;

    ancestors.push(Keyword::If);
    let true_children = parse_sequence(items, cursor, tree, ancestors)?;
    let true_body = tree.push(Node {
        kind: NodeKind::Sequence(true_children),
        position: opener.position,
    });

    let false_body = match items.get(*cursor) {
        Some(Item::Tag(token)) if token.keyword == Keyword::Elsif => {
            Some(build_if_chain(items, cursor, tree, ancestors)?)
        }
        Some(Item::Tag(token)) if token.keyword == Keyword::Else => {
            *cursor += 1;
            let else_children = parse_sequence(items, cursor, tree, ancestors)?;
            let else_body = tree.push(Node {
                kind: NodeKind::Sequence(else_children),
                position: token.position,
            });
            expect_end(items, cursor, Keyword::EndIf, opener.position)?;
            Some(else_body)
        }
        _ => {
            expect_end(items, cursor, Keyword::EndIf, opener.position)?;
            None
        }
    };

    ancestors.pop();
    Ok(tree.push(Node {
        kind: NodeKind::Branch {
            condition,
            true_body,
            false_body,
        },
        position: opener.position,
    }))
}

fn build_unless(
    items: &[Item],
    cursor: &mut usize,
    tree: &mut Tree,
    ancestors: &mut Vec<Keyword>,
) -> Result<NodeId, FluidError> {
    let opener = match &items[*cursor] {
        Item::Tag(token) => token.clone(),
        _ => unreachable!(),
    };
    let condition = parse_compare(&opener)?;
    *cursor += 1;

    ancestors.push(Keyword::Unless);
    let true_children = parse_sequence(items, cursor, tree, ancestors)?;
    let true_body = tree.push(Node {
        kind: NodeKind::Sequence(true_children),
        position: opener.position,
    });

    // `unless` has no `else` (spec §3's keyword table lists `else` only
    // for `if`/`for`/`case`; `keyword.rs`'s `BlockKind` registry gives
    // `unless` an empty enclosed set): the only valid terminator is
    // `endunless`. A `{% else %}` here falls through to `expect_end`,
    // which rejects it as invalid nesting instead of silently building a
    // false-body branch.
    expect_end(items, cursor, Keyword::EndUnless, opener.position)?;
    let false_body = None;

    ancestors.pop();
    Ok(tree.push(Node {
        kind: NodeKind::Branch {
            condition,
            true_body,
            false_body,
        },
        position: opener.position,
    }))
}

fn build_for(
    items: &[Item],
    cursor: &mut usize,
    tree: &mut Tree,
    ancestors: &mut Vec<Keyword>,
) -> Result<NodeId, FluidError> {
    let opener = match &items[*cursor] {
        Item::Tag(token) => token.clone(),
        _ => unreachable!(),
    };
    if opener.words.len() < 3 || opener.words[1] != "in" {
        return Err(FluidError::InvalidParameter {
            message: "'for' requires '<var> in <expression>'".to_string(),
        });
    }
    let identifier = opener.words[0].clone();
    let expression = opener.words[2..].join(" ");
    *cursor += 1;

    ancestors.push(Keyword::For);
    let children = parse_sequence(items, cursor, tree, ancestors)?;
    let body = tree.push(Node {
        kind: NodeKind::Sequence(children),
        position: opener.position,
    });
    expect_end(items, cursor, Keyword::EndFor, opener.position)?;
    ancestors.pop();

    Ok(tree.push(Node {
        kind: NodeKind::Loop {
            identifier,
            expression,
            body,
        },
        position: opener.position,
    }))
}

fn build_capture(
    items: &[Item],
    cursor: &mut usize,
    tree: &mut Tree,
    ancestors: &mut Vec<Keyword>,
) -> Result<NodeId, FluidError> {
    let opener = match &items[*cursor] {
        Item::Tag(token) => token.clone(),
        _ => unreachable!(),
    };
    let identifier = opener
        .words
        .first()
        .ok_or_else(|| FluidError::InvalidParameter {
            message: "'capture' requires an identifier".to_string(),
        })?
        .clone();
    *cursor += 1;

    ancestors.push(Keyword::Capture);
    let children = parse_sequence(items, cursor, tree, ancestors)?;
    let body = tree.push(Node {
        kind: NodeKind::Sequence(children),
        position: opener.position,
    });
    expect_end(items, cursor, Keyword::EndCapture, opener.position)?;
    ancestors.pop();

    Ok(tree.push(Node {
        kind: NodeKind::Capture { identifier, body },
        position: opener.position,
    }))
}

fn build_case(
    items: &[Item],
    cursor: &mut usize,
    tree: &mut Tree,
    ancestors: &mut Vec<Keyword>,
) -> Result<NodeId, FluidError> {
    let opener = match &items[*cursor] {
        Item::Tag(token) => token.clone(),
        _ => unreachable!(),
    };
    let subject = opener
        .words
        .first()
        .ok_or_else(|| FluidError::InvalidParameter {
            message: "'case' requires a subject".to_string(),
        })?
        .clone();
    *cursor += 1;

    ancestors.push(Keyword::Case);
    // Skip Data between `case` and the first `when` (spec §4.4).
    while let Some(Item::Text(_, _)) = items.get(*cursor) {
        *cursor += 1;
    }

    let branch = build_when_chain(items, cursor, tree, ancestors, &subject, opener.position)?;
    ancestors.pop();
    Ok(branch)
}

fn build_when_chain(
    items: &[Item],
    cursor: &mut usize,
    tree: &mut Tree,
    ancestors: &mut Vec<Keyword>,
    subject: &str,
    case_position: Position,
) -> Result<NodeId, FluidError> {
    let when_token = match items.get(*cursor) {
        Some(Item::Tag(token)) if token.keyword == Keyword::When => token.clone(),
        Some(Item::Tag(token)) => {
            return Err(FluidError::InvalidNesting {
                keyword: token.keyword.literal().to_string(),
                position: token.position,
            })
        }
        _ => {
            return Err(FluidError::MissingTerminator {
                opener: Keyword::Case.literal(),
                position: case_position,
            })
        }
    };
    let value = when_token
        .words
        .first()
        .ok_or_else(|| FluidError::InvalidParameter {
            message: "'when' requires a value".to_string(),
        })?
        .clone();
    let condition = Compare {
        lhs: subject.to_string(),
        operator: Operator::Eq,
        rhs: value,
    };
    *cursor += 1;

    let true_children = parse_sequence(items, cursor, tree, ancestors)?;
    let true_body = tree.push(Node {
        kind: NodeKind::Sequence(true_children),
        position: when_token.position,
    });

    let false_body = match items.get(*cursor) {
        Some(Item::Tag(token)) if token.keyword == Keyword::When => Some(build_when_chain(
            items,
            cursor,
            tree,
            ancestors,
            subject,
            case_position,
        )?),
        Some(Item::Tag(token)) if token.keyword == Keyword::Else => {
            *cursor += 1;
            let else_children = parse_sequence(items, cursor, tree, ancestors)?;
            let else_body = tree.push(Node {
                kind: NodeKind::Sequence(else_children),
                position: token.position,
            });
            expect_end(items, cursor, Keyword::EndCase, case_position)?;
            Some(else_body)
        }
        _ => {
            expect_end(items, cursor, Keyword::EndCase, case_position)?;
            None
        }
    };

    Ok(tree.push(Node {
        kind: NodeKind::Branch {
            condition,
            true_body,
            false_body,
        },
        position: when_token.position,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::preprocessor::preprocess;
    use crate::include::MapIncludeLoader;

    fn build_from(source: &str) -> (Tree, Vec<NodeId>) {
        let loader = MapIncludeLoader::new();
        let blocks = preprocess(lex(source).unwrap(), &loader).unwrap();
        build(&blocks).unwrap()
    }

    #[test]
    fn empty_input_has_no_top_level_nodes() {
        let (_, root) = build_from("");
        assert!(root.is_empty());
    }

    #[test]
    fn plain_text_becomes_one_text_node() {
        let (tree, root) = build_from("hello");
        assert_eq!(root.len(), 1);
        assert!(matches!(tree.get(root[0]).kind, NodeKind::Text(ref s) if s == "hello"));
    }

    #[test]
    fn object_becomes_object_node() {
        let (tree, root) = build_from("Hello {{ name }}!");
        assert_eq!(root.len(), 3);
        assert!(matches!(
            tree.get(root[1]).kind,
            NodeKind::Object { ref identifier, .. } if identifier == "name"
        ));
    }

    #[test]
    fn if_else_builds_a_branch_with_both_bodies() {
        let (tree, root) = build_from("{% if a == 1 %}X{% else %}Y{% endif %}");
        assert_eq!(root.len(), 1);
        match &tree.get(root[0]).kind {
            NodeKind::Branch {
                condition,
                true_body,
                false_body,
            } => {
                assert_eq!(condition.lhs, "a");
                assert_eq!(condition.operator, Operator::Eq);
                assert_eq!(condition.rhs, "1");
                assert!(false_body.is_some());
                let NodeKind::Sequence(children) = &tree.get(*true_body).kind else {
                    panic!("expected Sequence");
                };
                assert_eq!(children.len(), 1);
            }
            other => panic!("expected Branch, got {other:?}"),
        }
    }

    #[test]
    fn elsif_chains_into_nested_branch() {
        let (tree, root) =
            build_from("{% if a == 1 %}A{% elsif a == 2 %}B{% else %}C{% endif %}");
        let NodeKind::Branch { false_body, .. } = &tree.get(root[0]).kind else {
            panic!("expected Branch");
        };
        let nested = false_body.expect("elsif produces a nested Branch");
        assert!(matches!(tree.get(nested).kind, NodeKind::Branch { .. }));
    }

    #[test]
    fn for_loop_builds_loop_node() {
        let (tree, root) = build_from("{% for i in items %}[{{ i }}]{% endfor %}");
        match &tree.get(root[0]).kind {
            NodeKind::Loop {
                identifier,
                expression,
                ..
            } => {
                assert_eq!(identifier, "i");
                assert_eq!(expression, "items");
            }
            other => panic!("expected Loop, got {other:?}"),
        }
    }

    #[test]
    fn case_when_chains_like_if_elsif() {
        let (tree, root) =
            build_from("{% case x %}{% when 1 %}A{% when 2 %}B{% else %}C{% endcase %}");
        match &tree.get(root[0]).kind {
            NodeKind::Branch {
                condition,
                false_body,
                ..
            } => {
                assert_eq!(condition.rhs, "1");
                let nested = false_body.expect("second when chains in");
                assert!(matches!(tree.get(nested).kind, NodeKind::Branch { .. }));
            }
            other => panic!("expected Branch, got {other:?}"),
        }
    }

    #[test]
    fn break_inside_for_is_valid() {
        let (_, root) = build_from("{% for i in items %}{% break %}{% endfor %}");
        assert_eq!(root.len(), 1);
    }

    #[test]
    fn break_inside_if_inside_for_is_still_valid() {
        let (_, root) =
            build_from("{% for i in items %}{% if i == 1 %}{% break %}{% endif %}{% endfor %}");
        assert_eq!(root.len(), 1);
    }

    #[test]
    fn break_at_top_level_is_invalid_nesting() {
        let loader = MapIncludeLoader::new();
        let blocks = preprocess(lex("{% break %}").unwrap(), &loader).unwrap();
        let err = build(&blocks).unwrap_err();
        assert!(matches!(err, FluidError::InvalidNesting { .. }));
    }

    #[test]
    fn unmatched_endfor_is_invalid_nesting() {
        let loader = MapIncludeLoader::new();
        let blocks = preprocess(lex("{% endfor %}").unwrap(), &loader).unwrap();
        let err = build(&blocks).unwrap_err();
        assert!(matches!(err, FluidError::InvalidNesting { .. }));
    }

    #[test]
    fn unterminated_if_is_missing_terminator() {
        let loader = MapIncludeLoader::new();
        let blocks = preprocess(lex("{% if a == 1 %}X").unwrap(), &loader).unwrap();
        let err = build(&blocks).unwrap_err();
        assert!(matches!(err, FluidError::MissingTerminator { .. }));
    }

    #[test]
    fn capture_builds_capture_node() {
        let (tree, root) = build_from("{% capture greeting %}Hi{% endcapture %}");
        match &tree.get(root[0]).kind {
            NodeKind::Capture { identifier, .. } => assert_eq!(identifier, "greeting"),
            other => panic!("expected Capture, got {other:?}"),
        }
    }

    #[test]
    fn unless_has_no_else_and_rejects_one() {
        let loader = MapIncludeLoader::new();
        let blocks =
            preprocess(lex("{% unless a == 1 %}X{% else %}Y{% endunless %}").unwrap(), &loader)
                .unwrap();
        let err = build(&blocks).unwrap_err();
        assert!(matches!(err, FluidError::InvalidNesting { .. }));
    }

    #[test]
    fn unless_without_else_builds_an_absent_false_body() {
        let (tree, root) = build_from("{% unless a == 1 %}X{% endunless %}");
        match &tree.get(root[0]).kind {
            NodeKind::Branch { false_body, .. } => assert!(false_body.is_none()),
            other => panic!("expected Branch, got {other:?}"),
        }
    }
}
