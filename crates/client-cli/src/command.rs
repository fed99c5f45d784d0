//! Gateway operations as clap subcommands, shared by one-shot and REPL mode.

use anyhow::{Result, anyhow, bail};
use clap::{Parser, Subcommand};
use client::ColumnMap;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Register a user and print its connection-string template
    CreateUser { username: String, password: String },
    /// Create the database named by the connection string
    CreateDatabase {
        #[arg(short = 'c', long = "cs")]
        connection: Option<String>,
    },
    /// Create a table from `name=TYPE` column definitions
    CreateTable {
        table: String,
        #[arg(required = true, value_parser = parse_pair)]
        columns: Vec<(String, String)>,
        #[arg(short = 'c', long = "cs")]
        connection: Option<String>,
    },
    /// Insert one record from `column=value` pairs
    Insert {
        table: String,
        #[arg(required = true, value_parser = parse_pair)]
        values: Vec<(String, String)>,
        #[arg(short = 'c', long = "cs")]
        connection: Option<String>,
    },
    /// Insert several records atomically; each `--record` is `col=val,col=val`
    InsertMany {
        table: String,
        #[arg(short = 'r', long = "record", required = true, value_parser = parse_record)]
        records: Vec<ColumnMap>,
        #[arg(short = 'c', long = "cs")]
        connection: Option<String>,
    },
    /// Select rows
    Query {
        table: String,
        #[arg(long, default_value = "*")]
        columns: String,
        #[arg(short = 'w', long = "where", default_value = "")]
        condition: String,
        #[arg(short = 'c', long = "cs")]
        connection: Option<String>,
    },
    /// Add a column to a table
    AddColumn {
        table: String,
        column: String,
        column_type: String,
        #[arg(short = 'c', long = "cs")]
        connection: Option<String>,
    },
    /// Update rows matching a condition from `column=value` pairs
    Update {
        table: String,
        #[arg(required = true, value_parser = parse_pair)]
        values: Vec<(String, String)>,
        #[arg(short = 'w', long = "where")]
        condition: String,
        #[arg(short = 'c', long = "cs")]
        connection: Option<String>,
    },
    /// Create an index on a comma-separated column list
    AddIndex {
        table: String,
        #[arg(value_delimiter = ',', required = true)]
        columns: Vec<String>,
        #[arg(short = 'n', long)]
        name: Option<String>,
        #[arg(short = 'c', long = "cs")]
        connection: Option<String>,
    },
    /// Drop an index
    DeleteIndex {
        name: String,
        #[arg(short = 'c', long = "cs")]
        connection: Option<String>,
    },
    /// List indexes recorded for a database
    ListIndexes {
        #[arg(short = 'c', long = "cs")]
        connection: Option<String>,
    },
}

impl Command {
    /// Connection string given on the command itself, if any.
    pub fn connection(&self) -> Option<&str> {
        match self {
            Command::CreateUser { .. } => None,
            Command::CreateDatabase { connection }
            | Command::CreateTable { connection, .. }
            | Command::Insert { connection, .. }
            | Command::InsertMany { connection, .. }
            | Command::Query { connection, .. }
            | Command::AddColumn { connection, .. }
            | Command::Update { connection, .. }
            | Command::AddIndex { connection, .. }
            | Command::DeleteIndex { connection, .. }
            | Command::ListIndexes { connection } => connection.as_deref(),
        }
    }
}

/// Wrapper so a REPL line can be parsed as a bare subcommand.
#[derive(Parser, Debug)]
#[command(name = "repl", no_binary_name = true)]
pub struct ReplLine {
    #[command(subcommand)]
    pub command: Command,
}

/// Parse `key=value`.
pub fn parse_pair(raw: &str) -> Result<(String, String)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        bail!("empty key in '{raw}'");
    }
    Ok((key.to_string(), value.to_string()))
}

/// Parse `col=val,col=val` into one record.
pub fn parse_record(raw: &str) -> Result<ColumnMap> {
    raw.split(',').map(parse_pair).collect()
}

/// Split a REPL line into words. Single or double quotes group words and are
/// removed.
pub fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if let Some(q) = quote {
        bail!("unterminated {q} quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        ReplLine::try_parse_from(split_words(line).unwrap())
            .unwrap()
            .command
    }

    #[test]
    fn splits_quoted_words() {
        assert_eq!(
            split_words(r#"query orders -w "qty > 1 AND name = 'a b'""#).unwrap(),
            vec!["query", "orders", "-w", "qty > 1 AND name = 'a b'"]
        );
        assert_eq!(split_words("  ").unwrap(), Vec::<String>::new());
        assert_eq!(split_words("insert t name=''").unwrap(), vec!["insert", "t", "name="]);
        assert!(split_words("query 'oops").is_err());
    }

    #[test]
    fn parses_pairs() {
        assert_eq!(
            parse_pair("id=INTEGER PRIMARY KEY").unwrap(),
            ("id".to_string(), "INTEGER PRIMARY KEY".to_string())
        );
        assert_eq!(parse_pair("note=").unwrap(), ("note".into(), "".into()));
        assert!(parse_pair("novalue").is_err());
        assert!(parse_pair("=x").is_err());

        let record = parse_record("id=1,name=widget").unwrap();
        assert_eq!(record["id"], "1");
        assert_eq!(record["name"], "widget");
    }

    #[test]
    fn parses_repl_commands() {
        assert_eq!(
            parse("create-table orders 'id=INTEGER PRIMARY KEY' name=TEXT"),
            Command::CreateTable {
                table: "orders".into(),
                columns: vec![
                    ("id".into(), "INTEGER PRIMARY KEY".into()),
                    ("name".into(), "TEXT".into()),
                ],
                connection: None,
            }
        );
        assert_eq!(
            parse("add-index orders name,qty -n by_name_qty"),
            Command::AddIndex {
                table: "orders".into(),
                columns: vec!["name".into(), "qty".into()],
                name: Some("by_name_qty".into()),
                connection: None,
            }
        );
        let query = parse("query orders --cs grpc://a:b/db");
        assert_eq!(query.connection(), Some("grpc://a:b/db"));
        assert!(matches!(
            query,
            Command::Query { ref columns, ref condition, .. } if columns == "*" && condition.is_empty()
        ));
    }

    #[test]
    fn update_requires_condition() {
        let words = split_words("update orders qty=2").unwrap();
        assert!(ReplLine::try_parse_from(words).is_err());
    }
}
