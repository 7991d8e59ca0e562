//! Token-level view of SQL text
//!
//! The query guard and the validator both need to know how many statements a
//! piece of SQL holds, what kind each one is, and which tables it names. All
//! of that is read from the sqlparser tokenizer, so string literals, quoted
//! identifiers and comments never confuse the scan.

use sqlparser::dialect::{Dialect, GenericDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::tokenizer::{Token, Tokenizer, TokenizerError};
use std::collections::HashSet;

/// Parser dialect for a connection endpoint
pub fn dialect_for(endpoint: &str) -> Box<dyn Dialect> {
    if endpoint.starts_with("postgres") {
        Box::new(PostgreSqlDialect {})
    } else if endpoint.starts_with("sqlite") {
        Box::new(SQLiteDialect {})
    } else {
        Box::new(GenericDialect {})
    }
}

/// Splits SQL text into statements of significant tokens.
///
/// Whitespace and comments are dropped. Separators with nothing between them
/// produce no statement, so `"SELECT 1;"` is one statement and `";"` is none.
pub fn split_statements(sql: &str) -> Result<Vec<Vec<Token>>, TokenizerError> {
    let tokens = Tokenizer::new(&GenericDialect {}, sql).tokenize()?;

    let mut statements = Vec::new();
    let mut current = Vec::new();
    for token in tokens {
        match token {
            Token::SemiColon => {
                if !current.is_empty() {
                    statements.push(std::mem::take(&mut current));
                }
            }
            Token::Whitespace(_) | Token::EOF => {}
            other => current.push(other),
        }
    }
    if !current.is_empty() {
        statements.push(current);
    }
    Ok(statements)
}

/// Upper-cased text of an unquoted word
pub(crate) fn keyword(token: &Token) -> Option<String> {
    match token {
        Token::Word(word) if word.quote_style.is_none() => Some(word.value.to_ascii_uppercase()),
        _ => None,
    }
}

fn is_keyword(token: &Token, expected: &str) -> bool {
    keyword(token).is_some_and(|k| k == expected)
}

/// Functions whose argument syntax uses FROM without naming a table
const FROM_TAKING_FUNCTIONS: &[&str] = &["EXTRACT", "SUBSTRING", "TRIM", "OVERLAY", "POSITION"];

/// Words that may sit between a table-introducing keyword and the table name
const NAME_PREFIXES: &[&str] = &["ONLY", "LATERAL", "IGNORE", "OR"];

/// Tables named after FROM, JOIN, UPDATE or INTO, in order of first mention.
///
/// Only the first table of a comma-separated FROM list is seen. Names bound by
/// the statement's WITH clause and schema qualifiers are left out.
pub fn referenced_tables(tokens: &[Token]) -> Vec<String> {
    let ctes = cte_names(tokens);
    let mut tables: Vec<String> = Vec::new();

    // one entry per open parenthesis: true inside EXTRACT(... FROM ...) and friends
    let mut parens: Vec<bool> = Vec::new();
    let mut previous: Option<&Token> = None;

    for (index, token) in tokens.iter().enumerate() {
        match token {
            Token::LParen => {
                let function_args = previous
                    .and_then(keyword)
                    .is_some_and(|k| FROM_TAKING_FUNCTIONS.contains(&k.as_str()));
                parens.push(function_args);
            }
            Token::RParen => {
                parens.pop();
            }
            _ => {
                let introduces = keyword(token).is_some_and(|k| {
                    matches!(k.as_str(), "FROM" | "JOIN" | "UPDATE" | "INTO")
                });
                let in_function = parens.last().copied().unwrap_or(false);

                if introduces && !in_function {
                    if let Some(name) = table_name_at(&tokens[index + 1..]) {
                        if !ctes.contains(&name) && !tables.contains(&name) {
                            tables.push(name);
                        }
                    }
                }
            }
        }
        previous = Some(token);
    }

    tables
}

/// Reads `[prefix] name [. name ...]` and returns the last part
fn table_name_at(tokens: &[Token]) -> Option<String> {
    let mut rest = tokens;
    while let Some(first) = rest.first() {
        match keyword(first) {
            Some(k) if NAME_PREFIXES.contains(&k.as_str()) => rest = &rest[1..],
            _ => break,
        }
    }

    let Some(Token::Word(word)) = rest.first() else {
        return None;
    };
    let mut name = word.value.clone();

    let mut i = 1;
    while let (Some(Token::Period), Some(Token::Word(part))) = (rest.get(i), rest.get(i + 1)) {
        name = part.value.clone();
        i += 2;
    }
    Some(name)
}

/// Names defined by a leading WITH clause
fn cte_names(tokens: &[Token]) -> HashSet<String> {
    let mut names = HashSet::new();
    if !tokens.first().is_some_and(|t| is_keyword(t, "WITH")) {
        return names;
    }

    for (index, token) in tokens.iter().enumerate() {
        if !is_keyword(token, "AS") {
            continue;
        }

        // AS [NOT] [MATERIALIZED] (
        let mut next = index + 1;
        while tokens
            .get(next)
            .is_some_and(|t| is_keyword(t, "NOT") || is_keyword(t, "MATERIALIZED"))
        {
            next += 1;
        }
        if !matches!(tokens.get(next), Some(Token::LParen)) || index == 0 {
            continue;
        }

        // name [ ( columns ) ] AS
        let mut before = index - 1;
        if matches!(tokens[before], Token::RParen) {
            while before > 0 && !matches!(tokens[before], Token::LParen) {
                before -= 1;
            }
            before = before.saturating_sub(1);
        }
        if let Token::Word(word) = &tokens[before] {
            names.insert(word.value.clone());
        }
    }
    names
}
