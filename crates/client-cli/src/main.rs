//! Command-line client for the tenant database gateway.
//!
//! Runs one operation when given a subcommand, otherwise starts a REPL that
//! accepts the same subcommands line by line.

mod command;

use anyhow::{Result, anyhow};
use clap::{Parser, ValueEnum};
use client::Client;
use command::{Command, ReplLine, split_words};
use common::pretty::{self, TableStyleKind};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde::Serialize;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 50051;

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum Style {
    #[default]
    Modern,
    Ascii,
    Plain,
}

impl From<Style> for TableStyleKind {
    fn from(style: Style) -> Self {
        match style {
            Style::Modern => TableStyleKind::Modern,
            Style::Ascii => TableStyleKind::Ascii,
            Style::Plain => TableStyleKind::Plain,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "gatewaydb-client", about = "Client for the tenant database gateway")]
struct Args {
    /// Host address to connect to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port to connect to
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Connection string used when a command does not pass `--cs`
    #[arg(long, global = true)]
    connection: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Table style for text output
    #[arg(long, value_enum, default_value_t = Style::default())]
    style: Style,

    #[command(subcommand)]
    command: Option<Command>,
}

/// Output settings plus the connection string commands fall back to.
struct Session {
    connection: Option<String>,
    json: bool,
    style: TableStyleKind,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let mut client = Client::connect(&addr).await?;
    let mut session = Session {
        connection: args.connection,
        json: args.json,
        style: args.style.into(),
    };

    if let Some(command) = args.command {
        run_command(&mut client, &session, command).await?;
    } else {
        println!("Connected to {addr}");
        interactive_loop(&mut client, &mut session).await?;
    }

    client.close().await?;
    Ok(())
}

/// Run one operation and print its result.
async fn run_command(client: &mut Client, session: &Session, command: Command) -> Result<()> {
    let cs = command
        .connection()
        .map(str::to_string)
        .or_else(|| session.connection.clone());
    let require_cs = || {
        cs.clone()
            .ok_or_else(|| anyhow!("no connection string: pass --cs or run `use <connection-string>`"))
    };

    match command {
        Command::CreateUser { username, password } => {
            let template = client.create_user(&username, &password).await?;
            session.print_message(&format!("User created. Connection string: {template}"));
        }
        Command::CreateDatabase { .. } => {
            let message = client.create_database(&require_cs()?).await?;
            session.print_message(&message);
        }
        Command::CreateTable { table, columns, .. } => {
            let message = client
                .create_table(&require_cs()?, &table, columns.into_iter().collect())
                .await?;
            session.print_message(&message);
        }
        Command::Insert { table, values, .. } => {
            let message = client
                .insert_record(&require_cs()?, &table, values.into_iter().collect())
                .await?;
            session.print_message(&message);
        }
        Command::InsertMany { table, records, .. } => {
            let message = client
                .insert_multiple_records(&require_cs()?, &table, records)
                .await?;
            session.print_message(&message);
        }
        Command::Query {
            table,
            columns,
            condition,
            ..
        } => {
            let batch = client
                .query_data(&require_cs()?, &table, &columns, &condition)
                .await?;
            if session.json {
                print_json(&batch)?;
            } else {
                println!("{}", pretty::render_record_batch(&batch, session.style));
                if let Some(cursor) = &batch.next_cursor {
                    println!("{} row(s), next cursor: {cursor}", batch.len());
                }
            }
        }
        Command::AddColumn {
            table,
            column,
            column_type,
            ..
        } => {
            let message = client
                .update_table(&require_cs()?, &table, &column, &column_type)
                .await?;
            session.print_message(&message);
        }
        Command::Update {
            table,
            values,
            condition,
            ..
        } => {
            let message = client
                .update_record(
                    &require_cs()?,
                    &table,
                    values.into_iter().collect(),
                    &condition,
                )
                .await?;
            session.print_message(&message);
        }
        Command::AddIndex {
            table,
            columns,
            name,
            ..
        } => {
            let message = client
                .add_index(&require_cs()?, &table, columns, name.as_deref())
                .await?;
            session.print_message(&message);
        }
        Command::DeleteIndex { name, .. } => {
            let message = client.delete_index(&require_cs()?, &name).await?;
            session.print_message(&message);
        }
        Command::ListIndexes { .. } => {
            let indexes = client.list_indexes(&require_cs()?).await?;
            if session.json {
                print_json(&indexes)?;
            } else {
                println!("{}", pretty::render_indexes(&indexes, session.style));
            }
        }
    }
    Ok(())
}

impl Session {
    fn print_message(&self, message: &str) {
        if self.json {
            println!("{}", serde_json::json!({ "message": message }));
        } else {
            println!("{message}");
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Process a line of input from the REPL.
/// Returns true to continue the loop, false to exit.
async fn process_line(client: &mut Client, session: &mut Session, line: &str) -> bool {
    if line.is_empty() {
        return true;
    }

    if line == ".quit" || line == ".exit" {
        return false;
    }

    if line == ".help" || line == "help" {
        print_help();
        return true;
    }

    if let Some(cs) = line.strip_prefix("use ") {
        session.connection = Some(cs.trim().to_string());
        println!("Using {}", redact(cs.trim()));
        return true;
    }

    let words = match split_words(line) {
        Ok(words) => words,
        Err(e) => {
            eprintln!("Error: {e}");
            return true;
        }
    };
    match ReplLine::try_parse_from(words) {
        Ok(parsed) => {
            if let Err(e) = run_command(client, session, parsed.command).await {
                eprintln!("Error: {e}");
            }
        }
        Err(e) => eprintln!("{e}"),
    }

    true
}

/// Hide the password of `scheme://user:password/db` when echoing it.
fn redact(connection_string: &str) -> String {
    let Some((scheme, rest)) = connection_string.split_once("://") else {
        return connection_string.to_string();
    };
    let Some((credentials, database)) = rest.split_once('/') else {
        return connection_string.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***/{database}"),
        None => connection_string.to_string(),
    }
}

/// Handle readline errors.
/// Returns true to continue the loop, false to exit.
fn handle_readline_error(error: ReadlineError) -> bool {
    match error {
        ReadlineError::Interrupted => {
            println!("^C");
            false
        }
        ReadlineError::Eof => {
            println!("^D");
            false
        }
        err => {
            eprintln!("Error: {err:?}");
            false
        }
    }
}

/// Run an interactive REPL loop.
async fn interactive_loop(client: &mut Client, session: &mut Session) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!();
    println!("Type 'help' for commands or '.quit' to exit");
    println!();

    loop {
        let readline = rl.readline("gatewaydb> ");

        let should_continue = match readline {
            Ok(line) => {
                let line = line.trim();
                let _ = rl.add_history_entry(line);
                process_line(client, session, line).await
            }
            Err(e) => handle_readline_error(e),
        };

        if !should_continue {
            break;
        }
    }

    Ok(())
}

fn print_help() {
    println!("Commands (connection string from `use` or --cs <cs>):");
    println!("  use <scheme://user:password/db>       Set the default connection string");
    println!("  create-user <username> <password>     Register a user");
    println!("  create-database                       Create the database");
    println!("  create-table <table> <col=TYPE>...    Create a table");
    println!("  insert <table> <col=value>...         Insert one record");
    println!("  insert-many <table> -r a=1,b=2 ...    Insert records atomically");
    println!("  query <table> [--columns c] [-w cond] Select rows");
    println!("  add-column <table> <column> <type>    Add a column");
    println!("  update <table> <col=value>... -w cond Update matching rows");
    println!("  add-index <table> <c1,c2> [-n name]   Create an index");
    println!("  delete-index <name>                   Drop an index");
    println!("  list-indexes                          List recorded indexes");
    println!("  .quit, .exit                          Exit the client");
    println!();
    println!("Quote values containing spaces: query orders -w \"qty > 1\"");
}
