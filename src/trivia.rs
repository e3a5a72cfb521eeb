//! Trivia questions backed by a public SPARQL knowledge base.
//!
//! Hints can be gated behind a question: we pick a template, fill it with a
//! random entity from the endpoint, run the matching query, and keep the
//! bindings as the accepted answers. The frontend only sees [`Posed`].

use std::fs;
use std::path::Path;
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Entities whose IRI embeds an escaped parenthesis render badly as prompts.
const ESCAPED_PARENS: [&str; 2] = ["u0028", "u0029"];
/// Some entities have no bindings for a given template. Retry with another.
const MAX_ATTEMPTS: usize = 16;

const PREFIXES: &str = "\
PREFIX schema: <http://schema.org/>
PREFIX yago: <http://yago-knowledge.org/resource/>
PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
";

#[derive(Debug, Error)]
pub enum Error {
    #[error("endpoint request failed: {0}")]
    Http(#[from] Box<ureq::Error>),
    #[error("could not read question file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed question file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("question file contains no questions")]
    EmptyBank,
    #[error("endpoint returned no entities of type {0}")]
    NoEntities(String),
    #[error("no answerable question found after {0} attempts")]
    Exhausted(usize),
}

/// Shape of the query to run once an entity is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MemberCount,
    AnyMember,
    Leader,
    Capital,
}

/// A question template. `text` holds a single `?` placeholder for the entity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub entity_type: String,
    pub kind: QuestionKind,
}

impl Question {
    fn new(text: &str, entity_type: &str, kind: QuestionKind) -> Self {
        Self {
            text: text.to_owned(),
            entity_type: entity_type.to_owned(),
            kind,
        }
    }
}

pub fn default_questions() -> Vec<Question> {
    vec![
        Question::new(
            "How many band members does ? have",
            "schema:MusicGroup",
            QuestionKind::MemberCount,
        ),
        Question::new(
            "Can you name a band member of ?",
            "schema:MusicGroup",
            QuestionKind::AnyMember,
        ),
        Question::new("Who is the leader of ?", "schema:Country", QuestionKind::Leader),
        Question::new("What is the capital of ?", "schema:Country", QuestionKind::Capital),
    ]
}

/// Loads a question bank from a JSON file, replacing the defaults wholesale.
pub fn load_questions(path: &Path) -> Result<Vec<Question>, Error> {
    questions_from_json(&fs::read_to_string(path)?)
}

fn questions_from_json(text: &str) -> Result<Vec<Question>, Error> {
    let questions: Vec<Question> = serde_json::from_str(text)?;
    if questions.is_empty() {
        return Err(Error::EmptyBank);
    }
    Ok(questions)
}

/// A fully formulated question with its accepted answers.
#[derive(Clone, Debug)]
pub struct Posed {
    pub prompt: String,
    answers: Vec<String>,
}

impl Posed {
    /// Case-insensitive comparison against any accepted answer.
    pub fn check(&self, answer: &str) -> bool {
        let given = answer.trim().to_lowercase();
        self.answers.iter().any(|a| a.to_lowercase() == given)
    }

    /// One accepted answer, for the give-up path.
    pub fn reveal(&self) -> &str {
        self.answers.first().map(String::as_str).unwrap_or("")
    }
}

pub struct Client {
    endpoint: String,
    agent: ureq::Agent,
}

impl Client {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            agent: ureq::AgentBuilder::new()
                .timeout(Duration::from_secs(20))
                .build(),
        }
    }

    /// Picks a template, fills it with a random entity, and fetches the
    /// answers. Entities with no bindings are skipped and another is drawn.
    pub fn pose<R: Rng>(&self, questions: &[Question], rng: &mut R) -> Result<Posed, Error> {
        let question = questions.choose(rng).ok_or(Error::EmptyBank)?;
        let entities = self.entities(&question.entity_type)?;

        for _ in 0..MAX_ATTEMPTS {
            let iri = match entities.choose(rng) {
                Some(iri) => iri,
                None => return Err(Error::NoEntities(question.entity_type.clone())),
            };
            let entity = iri_tail(iri);
            let prompt = format!("{}?", question.text.replace('?', &entity.replace('_', " ")));
            debug!("posing: {}", prompt);

            let body = self.select(&build_query(question.kind, entity))?;
            let answers = answers_from(question.kind, &body);
            if answers.is_empty() {
                warn!("no bindings for {}, drawing another entity", entity);
                continue;
            }
            return Ok(Posed { prompt, answers });
        }
        Err(Error::Exhausted(MAX_ATTEMPTS))
    }

    /// All entities of a type, minus IRIs with escaped parentheses.
    fn entities(&self, entity_type: &str) -> Result<Vec<String>, Error> {
        let query = format!(
            "{PREFIXES}SELECT DISTINCT ?thing\nWHERE {{\n    ?thing a {entity_type} .\n}}"
        );
        let body = self.select(&query)?;
        let entities: Vec<String> = bindings(&body)
            .iter()
            .filter_map(|b| binding_value(b, "thing"))
            .filter(|iri| !ESCAPED_PARENS.iter().any(|esc| iri.contains(esc)))
            .map(str::to_owned)
            .collect();
        if entities.is_empty() {
            return Err(Error::NoEntities(entity_type.to_owned()));
        }
        Ok(entities)
    }

    fn select(&self, query: &str) -> Result<Value, Error> {
        let response = self
            .agent
            .get(&self.endpoint)
            .query("query", query)
            .set("Accept", "application/sparql-results+json")
            .call()
            .map_err(Box::new)?;
        Ok(response.into_json()?)
    }
}

pub fn build_query(kind: QuestionKind, entity: &str) -> String {
    match kind {
        QuestionKind::MemberCount => format!(
            "{PREFIXES}SELECT (COUNT(DISTINCT ?thing) AS ?count)\nWHERE {{\n    ?thing schema:memberOf yago:{entity} .\n}}"
        ),
        QuestionKind::AnyMember => format!(
            "{PREFIXES}SELECT DISTINCT ?thing\nWHERE {{\n    ?thing schema:memberOf yago:{entity} .\n}}\nLIMIT 10"
        ),
        QuestionKind::Leader => format!(
            "{PREFIXES}SELECT DISTINCT ?thing\nWHERE {{\n    yago:{entity} schema:leader ?thing .\n}}\nLIMIT 1"
        ),
        QuestionKind::Capital => format!(
            "{PREFIXES}SELECT DISTINCT ?thing\nWHERE {{\n    yago:{entity} yago:capital ?thing .\n}}\nLIMIT 1"
        ),
    }
}

fn answers_from(kind: QuestionKind, body: &Value) -> Vec<String> {
    let bindings = bindings(body);
    match kind {
        QuestionKind::MemberCount => bindings
            .iter()
            .filter_map(|b| binding_value(b, "count"))
            .filter(|count| *count != "0")
            .map(|count| format!("{} members", count))
            .collect(),
        _ => bindings
            .iter()
            .filter_map(|b| binding_value(b, "thing"))
            .map(|iri| iri_tail(iri).replace('_', " "))
            .collect(),
    }
}

fn bindings(body: &Value) -> &[Value] {
    body["results"]["bindings"].as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn binding_value<'a>(binding: &'a Value, name: &str) -> Option<&'a str> {
    binding[name]["value"].as_str()
}

/// Last path segment of an IRI, or the whole string when there is no slash.
fn iri_tail(iri: &str) -> &str {
    iri.rsplit('/').next().unwrap_or(iri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn results(bindings: Value) -> Value {
        json!({ "results": { "bindings": bindings } })
    }

    #[test]
    fn iri_tail_takes_the_last_segment() {
        assert_eq!(iri_tail("http://yago-knowledge.org/resource/The_Beatles"), "The_Beatles");
        assert_eq!(iri_tail("Already_a_tail"), "Already_a_tail");
    }

    #[test]
    fn count_bindings_become_a_member_total() {
        let body = results(json!([{ "count": { "value": "4" } }]));
        assert_eq!(
            answers_from(QuestionKind::MemberCount, &body),
            vec!["4 members".to_owned()]
        );
    }

    #[test]
    fn zero_counts_are_not_offered_as_answers() {
        let body = results(json!([{ "count": { "value": "0" } }]));
        assert!(answers_from(QuestionKind::MemberCount, &body).is_empty());
    }

    #[test]
    fn entity_bindings_become_readable_names() {
        let body = results(json!([
            { "thing": { "value": "http://yago-knowledge.org/resource/John_Lennon" } },
            { "thing": { "value": "http://yago-knowledge.org/resource/Ringo_Starr" } },
        ]));
        assert_eq!(
            answers_from(QuestionKind::AnyMember, &body),
            vec!["John Lennon".to_owned(), "Ringo Starr".to_owned()]
        );
    }

    #[test]
    fn malformed_bodies_yield_no_answers() {
        assert!(answers_from(QuestionKind::Leader, &json!({ "head": {} })).is_empty());
    }

    #[test]
    fn answer_check_ignores_case_and_padding() {
        let posed = Posed {
            prompt: "Who is the leader of Sweden?".to_owned(),
            answers: vec!["Ulf Kristersson".to_owned()],
        };
        assert!(posed.check("  ulf kristersson "));
        assert!(!posed.check("someone else"));
        assert_eq!(posed.reveal(), "Ulf Kristersson");
    }

    #[test]
    fn count_queries_aggregate_and_member_queries_limit() {
        let count = build_query(QuestionKind::MemberCount, "Queen_(band)");
        assert!(count.contains("COUNT(DISTINCT ?thing)"));
        assert!(count.contains("schema:memberOf yago:Queen_(band)"));

        let members = build_query(QuestionKind::AnyMember, "Queen_(band)");
        assert!(members.contains("LIMIT 10"));

        let capital = build_query(QuestionKind::Capital, "Sweden");
        assert!(capital.contains("yago:Sweden yago:capital ?thing"));
        assert!(capital.contains("LIMIT 1"));
    }

    #[test]
    fn question_banks_parse_from_json() {
        let text = r#"[
            { "text": "Who is the leader of ?", "entity_type": "schema:Country", "kind": "leader" }
        ]"#;
        let bank = questions_from_json(text).unwrap();
        assert_eq!(bank.len(), 1);
        assert_eq!(bank[0].kind, QuestionKind::Leader);

        assert!(matches!(questions_from_json("[]"), Err(Error::EmptyBank)));
    }

    #[test]
    fn default_bank_covers_every_kind() {
        let kinds: Vec<QuestionKind> = default_questions().iter().map(|q| q.kind).collect();
        for kind in [
            QuestionKind::MemberCount,
            QuestionKind::AnyMember,
            QuestionKind::Leader,
            QuestionKind::Capital,
        ] {
            assert!(kinds.contains(&kind));
        }
    }
}
