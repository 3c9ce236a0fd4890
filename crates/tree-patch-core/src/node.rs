//! Tree value model: the closed set of node kinds that patches operate on.
//!
//! A tree is an acyclic composition of four container kinds plus scalar
//! leaves. Containers hold their children behind [`Rc`] so that the apply
//! engine can share untouched subtrees between the input and output trees.

use std::fmt;
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

/// Key of a keyed-container entry, set element, or sequence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Str(String),
    Num(i64),
}

impl Key {
    /// Interprets the key as a sequence index. Negative and string keys
    /// have no index interpretation.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Num(n) if *n >= 0 => Some(*n as usize),
            _ => None,
        }
    }

    /// Record entry name for this key. Numeric keys coerce to their decimal
    /// string, matching how the recorder's host language keys plain records.
    pub fn as_record_key(&self) -> String {
        match self {
            Key::Str(s) => s.clone(),
            Key::Num(n) => n.to_string(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Str(s) => write!(f, "{s:?}"),
            Key::Num(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Num(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Num(value as i64)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::Num(value as i64)
    }
}

/// Leaf value.
///
/// `Stamp` is an opaque point-in-time scalar (epoch milliseconds). Apply and
/// merge pass it through untouched and never recurse into it.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Stamp(i64),
}

/// Kind tag of a [`Node`]; the single dispatch point of the apply engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Scalar,
    Record,
    Map,
    Set,
    Seq,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Scalar => "scalar",
            NodeKind::Record => "record",
            NodeKind::Map => "map",
            NodeKind::Set => "set",
            NodeKind::Seq => "sequence",
        };
        f.write_str(name)
    }
}

/// One tree node.
///
/// - `Record`: keyed by string entry names.
/// - `Map`: keyed by string-or-number [`Key`]s.
/// - `Set`: unordered distinct values, addressed by membership. Elements are
///   [`Key`] values (the hashable string/number subset the recorder emits).
/// - `Seq`: ordered, index-addressed, spliceable.
///
/// Equality is deep; `Record`, `Map`, and `Set` compare entry-wise without
/// regard to insertion order, `Seq` compares positionally.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    Record(IndexMap<String, Rc<Node>>),
    Map(IndexMap<Key, Rc<Node>>),
    Set(IndexSet<Key>),
    Seq(Vec<Rc<Node>>),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Scalar(_) => NodeKind::Scalar,
            Node::Record(_) => NodeKind::Record,
            Node::Map(_) => NodeKind::Map,
            Node::Set(_) => NodeKind::Set,
            Node::Seq(_) => NodeKind::Seq,
        }
    }

    pub fn null() -> Node {
        Node::Scalar(Scalar::Null)
    }

    /// Builds a record node from `(name, child)` pairs.
    pub fn record<K, I>(entries: I) -> Node
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node)>,
    {
        Node::Record(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), Rc::new(v)))
                .collect(),
        )
    }

    /// Builds an associative-map node from `(key, child)` pairs.
    pub fn map<K, I>(entries: I) -> Node
    where
        K: Into<Key>,
        I: IntoIterator<Item = (K, Node)>,
    {
        Node::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), Rc::new(v)))
                .collect(),
        )
    }

    /// Builds a value-set node from its elements.
    pub fn set<K, I>(elements: I) -> Node
    where
        K: Into<Key>,
        I: IntoIterator<Item = K>,
    {
        Node::Set(elements.into_iter().map(Into::into).collect())
    }

    /// Builds a sequence node from its items, in order.
    pub fn seq<I>(items: I) -> Node
    where
        I: IntoIterator<Item = Node>,
    {
        Node::Seq(items.into_iter().map(Rc::new).collect())
    }

    /// Converts a JSON value into a tree.
    ///
    /// Objects become records and arrays become sequences; JSON cannot
    /// express maps, sets, or stamps, so those kinds never come out of this
    /// conversion. Integers that fit `i64` stay integral.
    pub fn from_json(value: &Value) -> Node {
        match value {
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Node::Scalar(Scalar::Int(i)),
                None => Node::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => Node::Scalar(Scalar::Str(s.clone())),
            Value::Array(items) => Node::Seq(
                items
                    .iter()
                    .map(|item| Rc::new(Node::from_json(item)))
                    .collect(),
            ),
            Value::Object(entries) => Node::Record(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), Rc::new(Node::from_json(v))))
                    .collect(),
            ),
        }
    }

    /// Converts the tree into a JSON value.
    ///
    /// Lossy where JSON lacks a counterpart: map keys are stringified, sets
    /// become arrays in insertion order, stamps become integers.
    pub fn to_json(&self) -> Value {
        match self {
            Node::Scalar(Scalar::Null) => Value::Null,
            Node::Scalar(Scalar::Bool(b)) => Value::Bool(*b),
            Node::Scalar(Scalar::Int(i)) => Value::from(*i),
            Node::Scalar(Scalar::Float(x)) => {
                serde_json::Number::from_f64(*x).map_or(Value::Null, Value::Number)
            }
            Node::Scalar(Scalar::Str(s)) => Value::String(s.clone()),
            Node::Scalar(Scalar::Stamp(ms)) => Value::from(*ms),
            Node::Record(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Node::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.as_record_key(), v.to_json()))
                    .collect(),
            ),
            Node::Set(elements) => Value::Array(
                elements
                    .iter()
                    .map(|element| match element {
                        Key::Str(s) => Value::String(s.clone()),
                        Key::Num(n) => Value::from(*n),
                    })
                    .collect(),
            ),
            Node::Seq(items) => Value::Array(items.iter().map(|item| item.to_json()).collect()),
        }
    }
}

impl From<Scalar> for Node {
    fn from(value: Scalar) -> Self {
        Node::Scalar(value)
    }
}

impl From<bool> for Node {
    fn from(value: bool) -> Self {
        Node::Scalar(Scalar::Bool(value))
    }
}

impl From<i64> for Node {
    fn from(value: i64) -> Self {
        Node::Scalar(Scalar::Int(value))
    }
}

impl From<i32> for Node {
    fn from(value: i32) -> Self {
        Node::Scalar(Scalar::Int(value as i64))
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::Scalar(Scalar::Float(value))
    }
}

impl From<&str> for Node {
    fn from(value: &str) -> Self {
        Node::Scalar(Scalar::Str(value.to_string()))
    }
}
