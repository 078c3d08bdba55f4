//! Document tree (spec §3).
//!
//! A closed sum type for values — `Absent` is its own variant, never
//! overloaded onto `Null` (spec §9's "Dynamic value types" redesign note).

use std::collections::BTreeMap;

/// Where a parsed element started, for diagnostics and routing paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub text: String,
}

/// A value, per the §3 data model. Equality is structural; two `Holographic`
/// patterns compare equal only if their constraint chains match exactly.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(String),
    Number(String),
    Null,
    /// The field never appeared. Never emitted; see [`crate::octave::emitter`].
    Absent,
    List(Vec<Value>),
    /// Ordered, keys unique within the map. Every value here must be atomic —
    /// enforced at parse time (spec §4.2's nesting prohibition).
    InlineMap(Vec<(String, Value)>),
    LiteralZone(LiteralZoneValue),
    /// A stringified canonical operator chain, e.g. `A→B⊕C`.
    Flow(String),
    Holographic(HolographicPattern),
    /// `$NAME`, `$NAME:type`, carried opaquely.
    Variable(String),
}

impl Value {
    pub fn is_atomic(&self) -> bool {
        match self {
            Value::Scalar(_)
            | Value::Number(_)
            | Value::Null
            | Value::Absent
            | Value::Flow(_)
            | Value::Variable(_) => true,
            Value::List(items) => items.iter().all(Value::is_atomic_list_element),
            Value::InlineMap(_) | Value::LiteralZone(_) | Value::Holographic(_) => false,
        }
    }

    fn is_atomic_list_element(&self) -> bool {
        !matches!(self, Value::InlineMap(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralZoneValue {
    pub content: String,
    pub info_tag: Option<String>,
    pub fence_marker: String,
}

/// `["example"∧REQ∧ENUM[...]→§TARGET]`.
#[derive(Debug, Clone, PartialEq)]
pub struct HolographicPattern {
    pub example: String,
    pub constraints: Vec<Constraint>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Required,
    Optional,
    Enum(Vec<String>),
    Type(String),
    Regex(String),
    Named(String),
}

impl HolographicPattern {
    pub fn is_required(&self) -> bool {
        self.constraints.iter().any(|c| matches!(c, Constraint::Required))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub key: String,
    pub value: Value,
    pub leading_comments: Vec<Comment>,
    pub trailing_comment: Option<Comment>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub key: String,
    pub children: Vec<Section>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionNode {
    pub section_id: String,
    pub name: String,
    pub annotation: Option<String>,
    pub children: Vec<Section>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Assignment(Assignment),
    Block(Block),
    Section(SectionNode),
}

impl Section {
    pub fn key(&self) -> &str {
        match self {
            Section::Assignment(a) => &a.key,
            Section::Block(b) => &b.key,
            Section::Section(s) => &s.name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    UnknownBareLineDropped,
    UnclosedListAutoClosed,
    ConstructorMisuse,
    NumberedKeyCollision,
    DuplicateKey,
    RepairCandidate,
    MalformedHolographic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub kind: WarningKind,
    pub subtype: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// The document root, spec §3.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub name: String,
    pub grammar_version: Option<String>,
    /// Ordered so re-emission preserves authoring order; keys are unique
    /// within META per invariant 3.
    pub meta: BTreeMap<String, Value>,
    pub meta_order: Vec<String>,
    pub sections: Vec<Section>,
    pub warnings: Vec<Warning>,
    pub has_separator: bool,
}

impl Document {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            grammar_version: None,
            meta: BTreeMap::new(),
            meta_order: Vec::new(),
            sections: Vec::new(),
            warnings: Vec::new(),
            has_separator: false,
        }
    }

    pub fn meta_ordered(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.meta_order.iter().filter_map(move |k| self.meta.get(k).map(|v| (k, v)))
    }

    pub fn top_level_keys(&self) -> Vec<String> {
        self.sections.iter().map(|s| s.key().to_string()).collect()
    }
}
