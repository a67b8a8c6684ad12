//! Executable node trees.
//!
//! Parsed expressions are lowered once per source unit into shared,
//! immutable nodes (see [`crate::materialize`]). Literals are already heap
//! objects at this point, so both engines only ever push constants.

use std::sync::Arc;

use parser::Span;

use crate::Value;

pub type NodeRef = Arc<Node>;

/// One unit of source text, kept alive by every node lowered from it.
#[derive(Debug)]
pub struct Source {
    pub label: Option<String>,
    pub text: Arc<str>,
}

impl Source {
    pub fn new(text: impl Into<Arc<str>>, label: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            label: label.map(str::to_string),
            text: text.into(),
        })
    }
}

/// Where a node came from.
#[derive(Debug, Clone)]
pub struct Location {
    pub source: Arc<Source>,
    pub span: Span,
}

#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub source: Arc<Source>,
}

impl Node {
    pub fn location(&self) -> Location {
        Location {
            source: self.source.clone(),
            span: self.span,
        }
    }
}

#[derive(Debug)]
pub enum NodeKind {
    Constant(Value),
    Identifier(Arc<str>),
    Block(Arc<BlockCode>),
    Assignment(Arc<AssignCode>),
    Send(Arc<SendCode>),
}

#[derive(Debug)]
pub struct BlockCode {
    pub params: Vec<ParamCode>,
    pub body: Vec<NodeRef>,
}

#[derive(Debug)]
pub struct ParamCode {
    pub name: Arc<str>,
    pub default: Option<NodeRef>,
}

#[derive(Debug)]
pub struct AssignCode {
    /// `None` assigns into the current space.
    pub receiver: Option<NodeRef>,
    pub name: Arc<str>,
    pub value: NodeRef,
    pub comment: Option<Arc<str>>,
}

#[derive(Debug)]
pub struct SendCode {
    /// `None` sends to the current space.
    pub receiver: Option<NodeRef>,
    pub selector: Arc<str>,
    pub arguments: Vec<ArgumentCode>,
}

#[derive(Debug)]
pub struct ArgumentCode {
    pub name: Option<Arc<str>>,
    pub value: NodeRef,
}
