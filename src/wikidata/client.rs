//! Wikidata client: label search, entity data, and fact extraction.
//!
//! `WikidataClient` wraps a [`WikidataApi`] transport and turns raw entity
//! records into [`Fact`]s. The production transport is [`HttpWikidataApi`],
//! a synchronous `ureq` agent against the public Wikidata endpoints; tests
//! substitute an in-memory fixture.
//!
//! Every network-shaped failure here degrades to `None` rather than an
//! error: a non-2xx status, a transport failure, an empty search result,
//! and a missing record all mean "no data for this item". The single
//! structural exception is an entity record without an English label,
//! which aborts extraction for that entity (there is no subject to build
//! facts around).

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, trace};

use crate::wikidata::Fact;
use crate::wikidata::value::{self, LabelResolver, ValueKind};

/// Raw access to the two Wikidata endpoints the client needs.
///
/// Both calls return the parsed JSON body on success and `None` on any
/// failure; callers never distinguish "service down" from "no data".
pub trait WikidataApi {
    /// Free-text label search (`wbsearchentities`).
    fn search(&self, label: &str) -> Option<Value>;

    /// Full entity record (`Special:EntityData/{id}.json`).
    fn entity_data(&self, id: &str) -> Option<Value>;
}

// ---------------------------------------------------------------------------
// HTTP transport
// ---------------------------------------------------------------------------

/// Endpoint configuration for [`HttpWikidataApi`].
#[derive(Debug, Clone)]
pub struct WikidataEndpoints {
    /// MediaWiki action API base (label search).
    pub api_url: String,
    /// EntityData base; `/{id}.json` is appended per request.
    pub entity_data_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WikidataEndpoints {
    fn default() -> Self {
        Self {
            api_url: "https://www.wikidata.org/w/api.php".into(),
            entity_data_url: "https://www.wikidata.org/wiki/Special:EntityData".into(),
            timeout_secs: 10,
        }
    }
}

/// Synchronous HTTP transport against the live Wikidata service.
pub struct HttpWikidataApi {
    endpoints: WikidataEndpoints,
    http: ureq::Agent,
}

impl HttpWikidataApi {
    /// Build a transport with the given endpoints.
    pub fn new(endpoints: WikidataEndpoints) -> Self {
        let http = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(endpoints.timeout_secs))
            .build();
        Self { endpoints, http }
    }

    fn get_json(&self, request: ureq::Request) -> Option<Value> {
        match request.call() {
            Ok(response) => response.into_json().ok(),
            Err(ureq::Error::Status(code, _)) => {
                debug!(code, "wikidata returned non-success status");
                None
            }
            Err(ureq::Error::Transport(transport)) => {
                debug!(%transport, "wikidata request failed");
                None
            }
        }
    }
}

impl Default for HttpWikidataApi {
    fn default() -> Self {
        Self::new(WikidataEndpoints::default())
    }
}

impl WikidataApi for HttpWikidataApi {
    fn search(&self, label: &str) -> Option<Value> {
        let request = self
            .http
            .get(&self.endpoints.api_url)
            .query("action", "wbsearchentities")
            .query("format", "json")
            .query("language", "en")
            .query("search", label);
        self.get_json(request)
    }

    fn entity_data(&self, id: &str) -> Option<Value> {
        let url = format!("{}/{id}.json", self.endpoints.entity_data_url);
        self.get_json(self.http.get(&url))
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Fact-extraction client over a [`WikidataApi`] transport.
pub struct WikidataClient<A: WikidataApi> {
    api: A,
}

impl WikidataClient<HttpWikidataApi> {
    /// Client against the live Wikidata service with default endpoints.
    pub fn http() -> Self {
        Self::new(HttpWikidataApi::default())
    }
}

impl<A: WikidataApi> WikidataClient<A> {
    /// Wrap a transport.
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// The underlying transport.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Resolve a free-text label to a QID.
    ///
    /// Takes the first search result without relevance or type filtering.
    /// This is a documented approximation, not guaranteed disambiguation:
    /// "Mercury" resolves to whichever entity the service ranks first.
    pub fn resolve_label(&self, label: &str) -> Option<String> {
        let response = self.api.search(label)?;
        let results = response.get("search")?.as_array()?;

        let qid = results.first()?.get("id")?.as_str()?;
        debug!(label, qid, "resolved label");
        Some(qid.to_string())
    }

    /// Fetch the short English description of an entity, if it has one.
    pub fn describe(&self, qid: &str) -> Option<String> {
        let response = self.api.entity_data(qid)?;
        let description = response
            .pointer(&format!("/entities/{qid}/descriptions/en/value"))?
            .as_str()?;
        Some(description.to_string())
    }

    /// Fetch the English label of an entity, if it has one.
    ///
    /// Used for property labels, entity-reference tails, and quantity units.
    /// Each call fetches the full entity record; within a single
    /// `extract_facts` run repeated property IDs are looked up repeatedly.
    /// Response caching is the caller's concern, not the client's.
    pub fn label_of(&self, qid: &str) -> Option<String> {
        let response = self.api.entity_data(qid)?;
        let label = response
            .pointer(&format!("/entities/{qid}/labels/en/value"))?
            .as_str()?;
        Some(label.to_string())
    }

    /// Extract all facts for one entity.
    ///
    /// Returns the facts in statement order plus the label→QID mappings
    /// discovered while decoding entity references (both statement values
    /// and qualifier values contribute).
    ///
    /// Returns `None` when the record is missing or has no English label.
    /// Every other malformed piece (a statement without a concrete value,
    /// an undecodable value, a qualifier that fails to decode) is skipped
    /// individually without affecting its neighbors: one bad qualifier
    /// drops neither the other qualifiers in its group nor the parent fact.
    pub fn extract_facts(&self, qid: &str) -> Option<(Vec<Fact>, HashMap<String, String>)> {
        let response = self.api.entity_data(qid)?;
        let entity = response.pointer(&format!("/entities/{qid}"))?;

        // No English label means no subject to build facts around.
        let Some(label) = entity.pointer("/labels/en/value").and_then(Value::as_str) else {
            debug!(qid, "entity has no English label, aborting extraction");
            return None;
        };

        let mut facts = Vec::new();
        let mut discovered: HashMap<String, String> = HashMap::new();

        // Synthetic description fact: (label, "is", description).
        if let Some(description) = entity.pointer("/descriptions/en/value").and_then(Value::as_str)
        {
            facts.push(Fact::new(label, "is", description));
        }

        let claims = entity
            .get("claims")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        for (property_id, statements) in &claims {
            let Some(property_label) = self.label_of(property_id) else {
                trace!(%property_id, "property label unresolvable, skipping group");
                continue;
            };
            let Some(statements) = statements.as_array() else {
                continue;
            };

            for statement in statements {
                if let Some(fact) =
                    self.extract_statement(label, &property_label, statement, &mut discovered)
                {
                    facts.push(fact);
                }
            }
        }

        debug!(
            qid,
            facts = facts.len(),
            discovered = discovered.len(),
            "extracted entity"
        );
        Some((facts, discovered))
    }

    /// Decode one statement into a fact, accumulating qualifier values.
    fn extract_statement(
        &self,
        subject: &str,
        relation: &str,
        statement: &Value,
        discovered: &mut HashMap<String, String>,
    ) -> Option<Fact> {
        let mainsnak = statement.get("mainsnak")?;
        let decoded = self.decode_snak(mainsnak, discovered)?;

        let mut fact = Fact::new(subject, relation, decoded.text);

        let Some(qualifiers) = statement.get("qualifiers").and_then(Value::as_object) else {
            return Some(fact);
        };

        for (qualifier_property, snaks) in qualifiers {
            let Some(qualifier_label) = self.label_of(qualifier_property) else {
                trace!(%qualifier_property, "qualifier label unresolvable, skipping group");
                continue;
            };
            let Some(snaks) = snaks.as_array() else {
                continue;
            };

            // Each qualifier value stands alone: a snak that fails to decode
            // is dropped without touching its siblings or the parent fact.
            for snak in snaks {
                if let Some(decoded) = self.decode_snak(snak, discovered) {
                    fact.add_qualifier(qualifier_label.clone(), decoded.text);
                }
            }
        }

        Some(fact)
    }

    /// Decode one snak, recording any entity reference it revealed.
    ///
    /// Unknown-value and no-value snaks carry no `datavalue` and are
    /// skipped via the `snaktype` check.
    fn decode_snak(
        &self,
        snak: &Value,
        discovered: &mut HashMap<String, String>,
    ) -> Option<value::Decoded> {
        if snak.get("snaktype")?.as_str()? != "value" {
            trace!("non-value snak, skipping");
            return None;
        }

        let kind = ValueKind::from_datatype(snak.get("datatype")?.as_str()?);
        let datavalue = snak.pointer("/datavalue/value")?;

        let decoded = value::decode(kind, datavalue, self)?;
        if let Some(linked) = &decoded.linked {
            discovered.insert(linked.label.clone(), linked.qid.clone());
        }
        Some(decoded)
    }
}

impl<A: WikidataApi> LabelResolver for WikidataClient<A> {
    fn label_of(&self, qid: &str) -> Option<String> {
        WikidataClient::label_of(self, qid)
    }
}

impl<A: WikidataApi> std::fmt::Debug for WikidataClient<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikidataClient").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// In-memory transport serving canned entity records.
    struct FixtureApi {
        search_results: HashMap<String, Value>,
        entities: HashMap<String, Value>,
    }

    impl FixtureApi {
        fn new() -> Self {
            Self {
                search_results: HashMap::new(),
                entities: HashMap::new(),
            }
        }

        fn with_entity(mut self, qid: &str, record: Value) -> Self {
            self.entities
                .insert(qid.to_string(), json!({ "entities": { qid: record } }));
            self
        }

        fn with_label_only(self, qid: &str, label: &str) -> Self {
            self.with_entity(qid, json!({ "labels": { "en": { "value": label } } }))
        }

        fn with_search(mut self, label: &str, qids: &[&str]) -> Self {
            let hits: Vec<Value> = qids.iter().map(|q| json!({ "id": q })).collect();
            self.search_results
                .insert(label.to_string(), json!({ "search": hits }));
            self
        }
    }

    impl WikidataApi for FixtureApi {
        fn search(&self, label: &str) -> Option<Value> {
            self.search_results.get(label).cloned()
        }

        fn entity_data(&self, id: &str) -> Option<Value> {
            self.entities.get(id).cloned()
        }
    }

    fn statement(datatype: &str, datavalue: Value) -> Value {
        json!({
            "mainsnak": {
                "snaktype": "value",
                "datatype": datatype,
                "datavalue": { "value": datavalue }
            }
        })
    }

    #[test]
    fn resolve_label_takes_first_result() {
        let api = FixtureApi::new().with_search("mercury", &["Q308", "Q925"]);
        let client = WikidataClient::new(api);
        assert_eq!(client.resolve_label("mercury").unwrap(), "Q308");
    }

    #[test]
    fn resolve_label_empty_results_is_absent() {
        let api = FixtureApi::new().with_search("xyzzy", &[]);
        let client = WikidataClient::new(api);
        assert!(client.resolve_label("xyzzy").is_none());
        assert!(client.resolve_label("never-searched").is_none());
    }

    #[test]
    fn describe_reads_english_description() {
        let api = FixtureApi::new().with_entity(
            "Q25188",
            json!({
                "labels": { "en": { "value": "Inception" } },
                "descriptions": { "en": { "value": "2010 film by Christopher Nolan" } }
            }),
        );
        let client = WikidataClient::new(api);
        assert_eq!(
            client.describe("Q25188").unwrap(),
            "2010 film by Christopher Nolan"
        );
        assert!(client.describe("Q404").is_none());
    }

    #[test]
    fn extract_facts_missing_label_aborts() {
        let api = FixtureApi::new().with_entity(
            "Q1",
            json!({ "descriptions": { "en": { "value": "something" } } }),
        );
        let client = WikidataClient::new(api);
        assert!(client.extract_facts("Q1").is_none());
    }

    #[test]
    fn extract_facts_missing_record_aborts() {
        let client = WikidataClient::new(FixtureApi::new());
        assert!(client.extract_facts("Q1").is_none());
    }

    #[test]
    fn extract_facts_missing_description_still_yields_claim_facts() {
        let api = FixtureApi::new()
            .with_entity(
                "Q1",
                json!({
                    "labels": { "en": { "value": "Thing" } },
                    "claims": { "P1": [statement("string", json!("value one"))] }
                }),
            )
            .with_label_only("P1", "identifier");
        let client = WikidataClient::new(api);

        let (facts, discovered) = client.extract_facts("Q1").unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].render(), "(Thing, identifier, value one)");
        assert!(discovered.is_empty());
    }

    #[test]
    fn extract_facts_synthesizes_description_fact_first() {
        let api = FixtureApi::new().with_entity(
            "Q1",
            json!({
                "labels": { "en": { "value": "Thing" } },
                "descriptions": { "en": { "value": "a test entity" } }
            }),
        );
        let client = WikidataClient::new(api);

        let (facts, _) = client.extract_facts("Q1").unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].render(), "(Thing, is, a test entity)");
    }

    #[test]
    fn extract_facts_records_discovered_entity_references() {
        let api = FixtureApi::new()
            .with_entity(
                "Q25188",
                json!({
                    "labels": { "en": { "value": "Inception" } },
                    "claims": {
                        "P57": [statement("wikibase-item", json!({ "id": "Q25191" }))]
                    }
                }),
            )
            .with_label_only("P57", "director")
            .with_label_only("Q25191", "Christopher Nolan");
        let client = WikidataClient::new(api);

        let (facts, discovered) = client.extract_facts("Q25188").unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(
            facts[0].render(),
            "(Inception, director, Christopher Nolan)"
        );
        assert_eq!(discovered.get("Christopher Nolan").unwrap(), "Q25191");
    }

    #[test]
    fn extract_facts_skips_novalue_and_undecodable_statements() {
        let api = FixtureApi::new()
            .with_entity(
                "Q1",
                json!({
                    "labels": { "en": { "value": "Thing" } },
                    "claims": {
                        "P1": [
                            { "mainsnak": { "snaktype": "novalue", "datatype": "string" } },
                            statement("musical-notation", json!("𝄞")),
                            statement("string", json!("kept"))
                        ]
                    }
                }),
            )
            .with_label_only("P1", "note");
        let client = WikidataClient::new(api);

        let (facts, _) = client.extract_facts("Q1").unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].object, "kept");
    }

    #[test]
    fn extract_facts_skips_group_with_unresolvable_property_label() {
        let api = FixtureApi::new()
            .with_entity(
                "Q1",
                json!({
                    "labels": { "en": { "value": "Thing" } },
                    "claims": {
                        "P404": [statement("string", json!("orphaned"))],
                        "P1": [statement("string", json!("kept"))]
                    }
                }),
            )
            .with_label_only("P1", "note");
        let client = WikidataClient::new(api);

        let (facts, _) = client.extract_facts("Q1").unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].object, "kept");
    }

    #[test]
    fn qualifier_failure_keeps_siblings_and_parent() {
        let mut stmt = statement("wikibase-item", json!({ "id": "Q100" }));
        stmt["qualifiers"] = json!({
            "P580": [
                { "snaktype": "value", "datatype": "time",
                  "datavalue": { "value": { "time": "+2009-01-01T00:00:00Z" } } },
                { "snaktype": "somevalue", "datatype": "time" },
                { "snaktype": "value", "datatype": "wikibase-item",
                  "datavalue": { "value": { "id": "Q999" } } }
            ]
        });

        let api = FixtureApi::new()
            .with_entity(
                "Q1",
                json!({
                    "labels": { "en": { "value": "Thing" } },
                    "claims": { "P161": [stmt] }
                }),
            )
            .with_label_only("P161", "cast member")
            .with_label_only("P580", "start time")
            .with_label_only("Q100", "Leonardo DiCaprio");
        // Q999 is unresolvable: that single qualifier value drops, the rest stay.
        let client = WikidataClient::new(api);

        let (facts, discovered) = client.extract_facts("Q1").unwrap();
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].qualifiers.len(), 1);
        assert_eq!(
            facts[0].qualifiers[0].values,
            vec!["+2009-01-01T00:00:00Z"]
        );
        assert_eq!(discovered.get("Leonardo DiCaprio").unwrap(), "Q100");
    }

    #[test]
    fn qualifier_entity_references_feed_discovered_map() {
        let mut stmt = statement("string", json!("role"));
        stmt["qualifiers"] = json!({
            "P453": [
                { "snaktype": "value", "datatype": "wikibase-item",
                  "datavalue": { "value": { "id": "Q500" } } }
            ]
        });

        let api = FixtureApi::new()
            .with_entity(
                "Q1",
                json!({
                    "labels": { "en": { "value": "Thing" } },
                    "claims": { "P1": [stmt] }
                }),
            )
            .with_label_only("P1", "note")
            .with_label_only("P453", "character role")
            .with_label_only("Q500", "Cobb");
        let client = WikidataClient::new(api);

        let (facts, discovered) = client.extract_facts("Q1").unwrap();
        assert_eq!(facts[0].render(), "((Thing, note, role), {character role: Cobb})");
        assert_eq!(discovered.get("Cobb").unwrap(), "Q500");
    }
}
