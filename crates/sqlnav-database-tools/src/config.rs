//! Configuration types for database tools

use crate::statement::{keyword, split_statements};
use sqlnav_core::ToolsConfig;
use sqlparser::tokenizer::Token;
use std::collections::HashSet;

/// SQL statement kinds, recognized by their leading keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlOperation {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    Truncate,
    /// Anything else (EXPLAIN, SHOW, PRAGMA, ...), run as a read
    Other,
}

impl SqlOperation {
    /// Classifies the first statement of `sql`.
    ///
    /// Text that does not tokenize is [`SqlOperation::Other`].
    pub fn classify(sql: &str) -> Self {
        match split_statements(sql) {
            Ok(statements) => statements
                .first()
                .map_or(SqlOperation::Other, |tokens| Self::from_tokens(tokens)),
            Err(_) => SqlOperation::Other,
        }
    }

    /// Classifies one statement by its leading keyword. For `WITH`, the
    /// statement following the common table expressions decides.
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let Some(first) = tokens.first().and_then(keyword) else {
            return SqlOperation::Other;
        };
        if first != "WITH" {
            return Self::from_keyword(&first).unwrap_or(SqlOperation::Other);
        }

        let mut depth = 0usize;
        for token in &tokens[1..] {
            match token {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                _ if depth == 0 => {
                    if let Some(operation) = keyword(token).and_then(|k| Self::from_keyword(&k)) {
                        return operation;
                    }
                }
                _ => {}
            }
        }
        SqlOperation::Other
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "SELECT" => Some(SqlOperation::Select),
            "INSERT" | "REPLACE" => Some(SqlOperation::Insert),
            "UPDATE" => Some(SqlOperation::Update),
            "DELETE" => Some(SqlOperation::Delete),
            "CREATE" => Some(SqlOperation::Create),
            "DROP" => Some(SqlOperation::Drop),
            "ALTER" => Some(SqlOperation::Alter),
            "TRUNCATE" => Some(SqlOperation::Truncate),
            _ => None,
        }
    }

    /// True for statements that change data or schema
    pub fn is_modification(self) -> bool {
        !matches!(self, SqlOperation::Select | SqlOperation::Other)
    }
}

/// Configuration for database tools
#[derive(Debug, Clone)]
pub struct DatabaseToolConfig {
    /// Whether modification statements are refused (default: true)
    pub read_only: bool,
    /// Maximum number of rows to return (default: 1000)
    pub max_rows: usize,
    /// Connection and statement timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Modification statements permitted when not read-only
    pub allowed_operations: HashSet<SqlOperation>,
}

impl Default for DatabaseToolConfig {
    fn default() -> Self {
        Self {
            read_only: true,
            max_rows: 1000,
            timeout_secs: 30,
            allowed_operations: HashSet::new(),
        }
    }
}

impl DatabaseToolConfig {
    /// Create a new config with write permissions enabled
    pub fn with_write_enabled() -> Self {
        Self {
            read_only: false,
            allowed_operations: HashSet::from([
                SqlOperation::Insert,
                SqlOperation::Update,
                SqlOperation::Delete,
            ]),
            ..Default::default()
        }
    }

    /// Create a new config with DDL permissions enabled
    pub fn with_ddl_enabled() -> Self {
        let mut config = Self::with_write_enabled();
        config.allowed_operations.extend([
            SqlOperation::Create,
            SqlOperation::Drop,
            SqlOperation::Alter,
            SqlOperation::Truncate,
        ]);
        config
    }

    /// Build from the `[tools]` section of the configuration file
    pub fn from_tools_config(tools: &ToolsConfig) -> Self {
        let base = if tools.read_only {
            Self::default()
        } else {
            Self::with_write_enabled()
        };
        Self {
            max_rows: tools.max_rows,
            timeout_secs: tools.timeout_secs,
            ..base
        }
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Whether a statement of this kind may run under this config
    pub fn permits(&self, operation: SqlOperation) -> bool {
        if !operation.is_modification() {
            return true;
        }
        !self.read_only && self.allowed_operations.contains(&operation)
    }
}
