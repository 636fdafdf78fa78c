//! Filtro de filas por una consulta `columna op literal [and ...]`.
//!
//! Operadores: `<`, `<=`, `>`, `>=`, `==`, `!=`. Literales: números, texto
//! entre comillas simples o dobles, `true`, `false` y `null`. Un nombre de
//! columna con espacios va entre backticks.
//!
//! Una celda de tipo incompatible con el literal sólo satisface `!=`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use stepflow_core::{ArtifactMap, Table, TransformError, Transformable};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("empty query")]
    Empty,
    #[error("unexpected end of query, expected {0}")]
    UnexpectedEnd(&'static str),
    #[error("unexpected `{found}` at offset {at}, expected {expected}")]
    Unexpected {
        found: String,
        at: usize,
        expected: &'static str,
    },
    #[error("unterminated quote starting at offset {0}")]
    Unterminated(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    fn holds(self, ord: Option<Ordering>) -> bool {
        match (self, ord) {
            (Comparison::Ne, None) => true,
            (_, None) => false,
            (Comparison::Lt, Some(o)) => o == Ordering::Less,
            (Comparison::Le, Some(o)) => o != Ordering::Greater,
            (Comparison::Gt, Some(o)) => o == Ordering::Greater,
            (Comparison::Ge, Some(o)) => o != Ordering::Less,
            (Comparison::Eq, Some(o)) => o == Ordering::Equal,
            (Comparison::Ne, Some(o)) => o != Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl Literal {
    fn compare(&self, cell: &Value) -> Option<Ordering> {
        match (self, cell) {
            (Literal::Null, Value::Null) => Some(Ordering::Equal),
            (Literal::Null, _) => None,
            (Literal::Number(n), v) => v.as_f64().and_then(|x| x.partial_cmp(n)),
            (Literal::Text(s), Value::String(x)) => Some(x.as_str().cmp(s.as_str())),
            (Literal::Bool(b), Value::Bool(x)) => Some(x.cmp(b)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub column: String,
    pub op: Comparison,
    pub literal: Literal,
}

impl Clause {
    fn matches(&self, cell: &Value) -> bool {
        let ord = self.literal.compare(cell);
        // `x <op> null` sólo admite igualdad.
        if matches!(self.literal, Literal::Null) && !matches!(self.op, Comparison::Eq | Comparison::Ne) {
            return false;
        }
        self.op.holds(ord)
    }
}

/// Consulta ya parseada. Conserva el texto original para serializarse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Query {
    source: String,
    clauses: Vec<Clause>,
}

impl Query {
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl From<Query> for String {
    fn from(q: Query) -> Self {
        q.source
    }
}

impl TryFrom<String> for Query {
    type Error = QueryError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Op(Comparison),
    Number(f64),
    Text(String),
}

fn tokenize(src: &str) -> Result<Vec<(usize, Token)>, QueryError> {
    let chars: Vec<(usize, char)> = src.char_indices().collect();
    let mut out = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (at, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '<' | '>' | '=' | '!' => {
                let next_eq = chars.get(i + 1).is_some_and(|(_, n)| *n == '=');
                let op = match (c, next_eq) {
                    ('<', true) => Comparison::Le,
                    ('<', false) => Comparison::Lt,
                    ('>', true) => Comparison::Ge,
                    ('>', false) => Comparison::Gt,
                    ('=', true) => Comparison::Eq,
                    ('!', true) => Comparison::Ne,
                    _ => {
                        return Err(QueryError::Unexpected { found: c.to_string(),
                                                            at,
                                                            expected: "comparison operator" })
                    }
                };
                out.push((at, Token::Op(op)));
                i += if next_eq { 2 } else { 1 };
            }
            '\'' | '"' | '`' => {
                let close = chars[i + 1..].iter()
                                          .position(|(_, n)| *n == c)
                                          .ok_or(QueryError::Unterminated(at))?;
                let text: String = chars[i + 1..i + 1 + close].iter().map(|(_, ch)| ch).collect();
                out.push((at, if c == '`' { Token::Ident(text) } else { Token::Text(text) }));
                i += close + 2;
            }
            _ => {
                let start = i;
                while i < chars.len() && !chars[i].1.is_whitespace() && !"<>=!'\"`".contains(chars[i].1) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().map(|(_, ch)| ch).collect();
                let tok = match word.parse::<f64>() {
                    Ok(n) if word.starts_with(|ch: char| ch.is_ascii_digit() || ch == '-' || ch == '.') => {
                        Token::Number(n)
                    }
                    _ => Token::Ident(word),
                };
                out.push((at, tok));
            }
        }
    }
    Ok(out)
}

fn describe(tok: &Token) -> String {
    match tok {
        Token::Ident(s) => s.clone(),
        Token::Op(o) => format!("{o:?}"),
        Token::Number(n) => n.to_string(),
        Token::Text(s) => format!("'{s}'"),
    }
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let tokens = tokenize(src)?;
        if tokens.is_empty() {
            return Err(QueryError::Empty);
        }
        let mut it = tokens.into_iter();
        let mut clauses = Vec::new();
        loop {
            let column = match it.next() {
                Some((_, Token::Ident(name))) => name,
                Some((at, t)) => {
                    return Err(QueryError::Unexpected { found: describe(&t),
                                                        at,
                                                        expected: "column name" })
                }
                None => return Err(QueryError::UnexpectedEnd("column name")),
            };
            let op = match it.next() {
                Some((_, Token::Op(op))) => op,
                Some((at, t)) => {
                    return Err(QueryError::Unexpected { found: describe(&t),
                                                        at,
                                                        expected: "comparison operator" })
                }
                None => return Err(QueryError::UnexpectedEnd("comparison operator")),
            };
            let literal = match it.next() {
                Some((_, Token::Number(n))) => Literal::Number(n),
                Some((_, Token::Text(s))) => Literal::Text(s),
                Some((_, Token::Ident(w))) if w == "true" => Literal::Bool(true),
                Some((_, Token::Ident(w))) if w == "false" => Literal::Bool(false),
                Some((_, Token::Ident(w))) if w == "null" => Literal::Null,
                Some((at, t)) => {
                    return Err(QueryError::Unexpected { found: describe(&t),
                                                        at,
                                                        expected: "literal" })
                }
                None => return Err(QueryError::UnexpectedEnd("literal")),
            };
            clauses.push(Clause { column, op, literal });
            match it.next() {
                None => break,
                Some((_, Token::Ident(w))) if w == "and" => continue,
                Some((at, t)) => {
                    return Err(QueryError::Unexpected { found: describe(&t),
                                                        at,
                                                        expected: "`and` or end of query" })
                }
            }
        }
        Ok(Self { source: src.to_string(),
                  clauses })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterTool {
    pub query: Query,
}

impl FilterTool {
    pub const KIND: &'static str = "filter";

    pub fn new(query: &str) -> Result<Self, QueryError> {
        Ok(Self { query: query.parse()? })
    }
}

impl Transformable for FilterTool {
    fn kind(&self) -> &'static str {
        Self::KIND
    }

    fn config(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn transform(&self, mut data: Table, _other: &ArtifactMap) -> Result<(Table, ArtifactMap), TransformError> {
        let bound = self.query
                        .clauses()
                        .iter()
                        .map(|c| {
                            data.column_index(&c.column)
                                .map(|idx| (idx, c))
                                .ok_or_else(|| TransformError::MissingColumn(c.column.clone()))
                        })
                        .collect::<Result<Vec<_>, _>>()?;
        data.retain_rows(|_, row| bound.iter().all(|(idx, c)| c.matches(&row[*idx])));
        Ok((data, ArtifactMap::new()))
    }

    fn box_clone(&self) -> Box<dyn Transformable> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data() -> Table {
        Table::from_rows(vec!["a".into(), "b".into(), "name".into()],
                         vec![vec![json!(1), json!(1), json!("fe")],
                              vec![json!(0), json!(0), json!("ni")],
                              vec![json!(null), json!(5), json!("co")]]).unwrap()
    }

    fn apply(q: &str) -> Table {
        FilterTool::new(q).unwrap().transform(data(), &ArtifactMap::new()).unwrap().0
    }

    #[test]
    fn numeric_comparison_keeps_matching_rows() {
        let out = apply("a < 0.5");
        assert_eq!(out.len(), 1);
        assert_eq!(out.rows[0][2], json!("ni"));
    }

    #[test]
    fn conjunctions_and_text_literals() {
        assert_eq!(apply("b >= 0 and name != 'ni'").len(), 2);
        assert_eq!(apply("name == \"co\"").len(), 1);
        assert_eq!(apply("a == null").len(), 1);
        // null no es comparable con números
        assert_eq!(apply("a != 1").len(), 2);
    }

    #[test]
    fn parse_errors_are_positioned() {
        assert_eq!("".parse::<Query>(), Err(QueryError::Empty));
        assert_eq!("a <".parse::<Query>(), Err(QueryError::UnexpectedEnd("literal")));
        assert!(matches!("a = 1".parse::<Query>(), Err(QueryError::Unexpected { at: 2, .. })));
        assert_eq!("a == 'x".parse::<Query>(), Err(QueryError::Unterminated(5)));
        assert!(matches!("a == 1 or b == 2".parse::<Query>(), Err(QueryError::Unexpected { .. })));
    }

    #[test]
    fn backticks_name_columns_with_spaces() {
        let q: Query = "`band gap` > 1.5".parse().unwrap();
        assert_eq!(q.clauses()[0].column, "band gap");
    }

    #[test]
    fn unknown_column_is_reported() {
        let err = FilterTool::new("zzz > 1").unwrap().transform(data(), &ArtifactMap::new()).unwrap_err();
        assert!(matches!(err, TransformError::MissingColumn(c) if c == "zzz"));
    }

    #[test]
    fn invalid_query_is_rejected_on_deserialize() {
        assert!(serde_json::from_value::<FilterTool>(json!({"query": "a <"})).is_err());
        let t: FilterTool = serde_json::from_value(json!({"query": "a < 1"})).unwrap();
        assert_eq!(t.config(), json!({"query": "a < 1"}));
    }
}
