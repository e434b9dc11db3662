//! Wikidata fact extraction: entity resolution, statement decoding, and the
//! qualifier-aware fact model.
//!
//! The fact model stores triples (subject, relation, object) with optional
//! qualifier annotations.
//!
//! - **Fact model** ([`Fact`]): one extracted statement plus its qualifiers
//! - **Value decoding** ([`value`]): declared-kind dispatch over raw snak values
//! - **Client** ([`client`]): label search, entity data, and fact extraction
//!   against the live Wikidata HTTP API

pub mod client;
pub mod value;

use serde::{Deserialize, Serialize};

/// One qualifier group on a fact: a relation and its accumulated values.
///
/// Values keep insertion order; a relation may accumulate several values
/// (e.g. a "cast member" statement qualified by multiple "character" names).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Qualifier {
    /// The qualifier relation label.
    pub relation: String,
    /// Values in insertion order.
    pub values: Vec<String>,
}

/// A (subject, relation, object) statement extracted from one entity,
/// plus zero or more qualifier annotations.
///
/// The core triple is immutable after construction; qualifiers accumulate
/// through [`Fact::add_qualifier`] during extraction and are never mutated
/// afterwards. The textual form is derived on demand by [`Fact::render`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// The subject label.
    pub subject: String,
    /// The relation label.
    pub relation: String,
    /// The object's decoded display string.
    pub object: String,
    /// Qualifier groups in first-seen relation order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<Qualifier>,
}

impl Fact {
    /// Create a fact with no qualifiers.
    pub fn new(
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            relation: relation.into(),
            object: object.into(),
            qualifiers: Vec::new(),
        }
    }

    /// Append a qualifier value, creating the relation's group on first use.
    ///
    /// Repeated calls with the same relation accumulate values in call order.
    pub fn add_qualifier(&mut self, relation: impl Into<String>, value: impl Into<String>) {
        let relation = relation.into();
        match self.qualifiers.iter_mut().find(|q| q.relation == relation) {
            Some(group) => group.values.push(value.into()),
            None => self.qualifiers.push(Qualifier {
                relation,
                values: vec![value.into()],
            }),
        }
    }

    /// Whether any qualifier group is attached.
    pub fn has_qualifiers(&self) -> bool {
        !self.qualifiers.is_empty()
    }

    /// Render the fact to its canonical text form.
    ///
    /// Without qualifiers: `(subject, relation, object)`. With qualifiers:
    /// `((subject, relation, object), {rel: value; rel2: [v1, v2]})`, where
    /// a group with a single value renders bare, a multi-value group renders
    /// as a bracketed comma-joined list, and groups are joined with `"; "`
    /// in insertion order.
    pub fn render(&self) -> String {
        let triple = format!("({}, {}, {})", self.subject, self.relation, self.object);

        if self.qualifiers.is_empty() {
            return triple;
        }

        let groups: Vec<String> = self
            .qualifiers
            .iter()
            .map(|q| {
                let joined = q.values.join(", ");
                if q.values.len() > 1 {
                    format!("{}: [{}]", q.relation, joined)
                } else {
                    format!("{}: {}", q.relation, joined)
                }
            })
            .collect();

        format!("({triple}, {{{}}})", groups.join("; "))
    }
}

impl std::fmt::Display for Fact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// Render a slice of facts to their canonical text forms.
pub fn verbalize(facts: &[Fact]) -> Vec<String> {
    facts.iter().map(Fact::render).collect()
}
