//! The dictionary's expression tree: the immutable, read-only input to the clause builder.
//!
//! Expression trees are owned by the dictionary and shared by reference across sentences parsed in
//! parallel, so nothing here carries interior mutability: position ids and all other
//! per-expansion bookkeeping live on the clause builder's own scratch records instead (see
//! `clause.rs`), never on the tree.

use crate::descriptor::DescriptorId;
use crate::error::CoreError;

/// Which side of a word a connector reaches toward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `-`: looks toward earlier words.
    Minus,
    /// `+`: looks toward later words.
    Plus,
}

/// An optional, semantically-inert annotation carried by any node for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub id: u32,
}

/// A leaf of the expression tree: one half-link requirement.
#[derive(Debug, Clone)]
pub struct ConnectorNode {
    pub direction: Direction,
    pub multi: bool,
    pub descriptor: DescriptorId,
    pub cost: f64,
    pub farthest_word: u32,
    pub tag: Option<Tag>,
}

/// An AND or OR node: an ordered list of operands plus the node's own cost.
#[derive(Debug, Clone)]
pub struct GroupNode {
    pub operands: Vec<Node>,
    pub cost: f64,
    pub tag: Option<Tag>,
}

/// One node of an expression tree.
///
/// Invariant (enforced by construction): a tree has at least one node; CONNECTOR nodes have no
/// children; AND/OR may have any number of operands, including zero or one (a unary AND is the
/// dictionary's way of spelling "optional content").
#[derive(Debug, Clone)]
pub enum Node {
    Connector(ConnectorNode),
    And(GroupNode),
    Or(GroupNode),
}

impl Node {
    pub fn cost(&self) -> f64 {
        match self {
            Node::Connector(c) => c.cost,
            Node::And(g) | Node::Or(g) => g.cost,
        }
    }

    /// Constructs a node from the tagged-union representation the dictionary loader hands across
    /// the external boundary (node tag: one of AND, OR, CONNECTOR). This is the one place
    /// an out-of-range tag can appear, since the in-memory `Node` enum is otherwise exhaustively
    /// matched by the Rust type system; everywhere else `MalformedExpression` is unreachable by
    /// construction.
    pub fn from_tagged(
        word: usize,
        tag_byte: u8,
        connector: Option<ConnectorNode>,
        operands: Vec<Node>,
        cost: f64,
        tag: Option<Tag>,
    ) -> Result<Node, CoreError> {
        match tag_byte {
            0 => {
                let c = connector.ok_or_else(|| CoreError::MalformedExpression {
                    word,
                    detail: "CONNECTOR tag with no connector payload".into(),
                })?;
                if !operands.is_empty() {
                    return Err(CoreError::MalformedExpression {
                        word,
                        detail: "CONNECTOR node carries children".into(),
                    });
                }
                Ok(Node::Connector(c))
            }
            1 => Ok(Node::And(GroupNode { operands, cost, tag })),
            2 => Ok(Node::Or(GroupNode { operands, cost, tag })),
            other => Err(CoreError::MalformedExpression {
                word,
                detail: format!("unknown node tag {other}"),
            }),
        }
    }
}
