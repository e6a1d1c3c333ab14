use crate::error::QuerySyntaxError;
use crate::tokenizer::Analyzer;
use std::collections::BTreeSet;

/// The only indexed document field.
pub const TEXT_FIELD: &str = "text";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    pub term: String,
    /// Fields this term is matched against, sorted and deduplicated.
    pub fields: Vec<String>,
}

impl QueryTerm {
    pub fn targets(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// A disjunction of terms: a document matches if it holds any of them, and
/// every matching term adds to its score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub terms: Vec<QueryTerm>,
}

impl Query {
    pub fn len(&self) -> usize { self.terms.len() }

    pub fn is_empty(&self) -> bool { self.terms.is_empty() }
}

/// Turns free text into a [`Query`], normalizing terms with the index's analyzer.
pub struct QueryParser {
    analyzer: Analyzer,
    fields: BTreeSet<String>,
}

impl QueryParser {
    pub fn new(analyzer: Analyzer) -> Self {
        Self { analyzer, fields: BTreeSet::from([TEXT_FIELD.to_string()]) }
    }

    /// Replace the set of fields every term is searched in.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn parse(&self, input: &str) -> Result<Query, QuerySyntaxError> {
        if input.trim().is_empty() {
            return Err(QuerySyntaxError::Empty);
        }
        if self.fields.is_empty() {
            return Err(QuerySyntaxError::NoFields);
        }
        let fields: Vec<String> = self.fields.iter().cloned().collect();
        let terms: Vec<QueryTerm> = input
            .split_whitespace()
            .flat_map(|chunk| self.analyzer.analyze(chunk))
            .map(|term| QueryTerm { term, fields: fields.clone() })
            .collect();
        if terms.is_empty() {
            return Err(QuerySyntaxError::NoTerms(input.to_string()));
        }
        Ok(Query { terms })
    }
}

/// Parse `input` against `fields` with `analyzer`.
pub fn parse<I, S>(input: &str, fields: I, analyzer: &Analyzer) -> Result<Query, QuerySyntaxError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    QueryParser::new(*analyzer).with_fields(fields).parse(input)
}
