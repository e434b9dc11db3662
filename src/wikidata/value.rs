//! Snak value decoding: declared-kind dispatch over raw statement values.
//!
//! Wikidata statements carry values whose shape depends on a declared
//! datatype. Decoding is a closed dispatch over [`ValueKind`]: adding a
//! kind means adding a variant, so new datatypes are a compile-time-checked
//! change rather than an open-ended dynamic branch.

use serde_json::Value;

/// Declared value kinds a snak can carry.
///
/// Anything outside the supported set maps to [`ValueKind::Unsupported`]
/// and fails decoding, which callers treat as "skip this statement".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `wikibase-item`: a reference to another entity, decoded to its label.
    EntityRef,
    /// `time`: an ISO-ish time literal, passed through unchanged.
    Time,
    /// `string`: a plain string, passed through unchanged.
    Str,
    /// `quantity`: an amount with an optional entity-valued unit.
    Quantity,
    /// `globe-coordinate`: latitude/longitude pair.
    GlobeCoordinate,
    /// `math`: a LaTeX-ish literal, passed through unchanged.
    Math,
    /// Any datatype seshat does not decode.
    Unsupported,
}

impl ValueKind {
    /// Map a declared datatype string to its kind.
    pub fn from_datatype(datatype: &str) -> Self {
        match datatype {
            "wikibase-item" => ValueKind::EntityRef,
            "time" => ValueKind::Time,
            "string" => ValueKind::Str,
            "quantity" => ValueKind::Quantity,
            "globe-coordinate" => ValueKind::GlobeCoordinate,
            "math" => ValueKind::Math,
            _ => ValueKind::Unsupported,
        }
    }
}

/// An entity reference discovered while decoding a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedEntity {
    /// The referenced entity's English label.
    pub label: String,
    /// The referenced entity's QID.
    pub qid: String,
}

/// A successfully decoded snak value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Canonical display string for the value.
    pub text: String,
    /// Present when the value was an entity reference, so the caller can
    /// record the label→QID mapping it just learned.
    pub linked: Option<LinkedEntity>,
}

impl Decoded {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            linked: None,
        }
    }
}

/// Resolves a QID to its English label.
///
/// Entity-reference and quantity-unit decoding need label lookups, which in
/// production are further network calls. The trait keeps the decoder itself
/// network-free and lets tests supply a fixture.
pub trait LabelResolver {
    fn label_of(&self, qid: &str) -> Option<String>;
}

/// Decode the `datavalue.value` payload of a snak, given its declared kind.
///
/// Returns `None` when the value is malformed for its kind, references an
/// entity whose label cannot be resolved, carries a quantity unit that is
/// neither dimensionless nor a resolvable entity, or is of an unsupported
/// kind. Callers skip the enclosing statement or qualifier in that case.
pub fn decode(kind: ValueKind, datavalue: &Value, resolver: &dyn LabelResolver) -> Option<Decoded> {
    match kind {
        ValueKind::EntityRef => {
            let qid = datavalue.get("id")?.as_str()?;
            let label = resolver.label_of(qid)?;
            Some(Decoded {
                text: label.clone(),
                linked: Some(LinkedEntity {
                    label,
                    qid: qid.to_string(),
                }),
            })
        }

        ValueKind::Time => {
            let time = datavalue.get("time")?.as_str()?;
            Some(Decoded::text(time))
        }

        ValueKind::Str | ValueKind::Math => {
            let s = datavalue.as_str()?;
            Some(Decoded::text(s))
        }

        ValueKind::Quantity => {
            let amount = datavalue.get("amount")?.as_str()?;
            let unit = datavalue.get("unit")?.as_str()?;

            if unit == "1" {
                // Dimensionless marker: bare amount, no unit suffix.
                Some(Decoded::text(amount))
            } else if unit.contains("wikidata.org/entity") {
                let unit_qid = unit.rsplit('/').next()?;
                let unit_label = resolver.label_of(unit_qid)?;
                Some(Decoded::text(format!("{amount} {unit_label}")))
            } else {
                None
            }
        }

        ValueKind::GlobeCoordinate => {
            // serde_json's Number keeps the JSON text's own form, so a
            // latitude written as 1.0 renders "1.0", not "1".
            let lat = number_of(datavalue.get("latitude")?)?;
            let lon = number_of(datavalue.get("longitude")?)?;
            Some(Decoded::text(format!("({lat}, {lon})")))
        }

        ValueKind::Unsupported => None,
    }
}

fn number_of(value: &Value) -> Option<&serde_json::Number> {
    match value {
        Value::Number(n) => Some(n),
        _ => None,
    }
}
