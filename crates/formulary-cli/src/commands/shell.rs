//! Shell command - interactive session over a data file.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use formulary::{LlmProvider, Session, SuggestionSet, Table, Value};

use crate::cli::LlmProviderChoice;

use super::suggest::print_suggestions;
use super::{build_provider, open_session};

const HELP: &str = "\
Commands:
  columns                 List columns and types
  head [N]                Show the first N rows (default 10)
  crop START END          Keep rows START..=END
  check EXPR              Evaluate an expression without applying it
  derive NAME = FORMULA   Add a derived column
  flag RULE               Add a flag column Flag_<RULE>
  rm-col NAME             Remove a derived column
  rm-flag RULE            Remove a flag rule
  history                 Show applied columns and rules
  suggest QUERY           Ask the LLM for suggestions
  apply-col N             Apply suggested derived column N
  apply-flag N            Apply suggested flag rule N
  reload [FILE]           Reload the source and replay history
  export PATH             Write the table as CSV
  help                    Show this help
  quit                    Leave the shell";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Columns,
    Head(usize),
    Crop(usize, usize),
    Check(String),
    Derive { name: String, formula: String },
    Flag(String),
    RemoveColumn(String),
    RemoveFlag(String),
    History,
    Suggest(String),
    ApplyColumn(usize),
    ApplyFlag(usize),
    Reload(Option<PathBuf>),
    Export(PathBuf),
    Help,
    Quit,
}

impl ShellCommand {
    /// Parse a line. Returns `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let require = |what: &str| {
            if rest.is_empty() {
                Err(format!("'{}' needs {}", word, what))
            } else {
                Ok(rest.to_string())
            }
        };
        let index = |what: &str| {
            rest.parse::<usize>()
                .map_err(|_| format!("'{}' needs {}", word, what))
        };

        let command = match word {
            "columns" | "cols" => ShellCommand::Columns,
            "head" => ShellCommand::Head(if rest.is_empty() {
                10
            } else {
                index("a row count")?
            }),
            "crop" => {
                let bounds: Vec<usize> = rest
                    .split_whitespace()
                    .map(|s| s.parse::<usize>())
                    .collect::<Result<_, _>>()
                    .map_err(|_| "'crop' needs START END".to_string())?;
                match bounds.as_slice() {
                    [start, end] => ShellCommand::Crop(*start, *end),
                    _ => return Err("'crop' needs START END".to_string()),
                }
            }
            "check" => ShellCommand::Check(require("an expression")?),
            "derive" => {
                let (name, formula) = rest
                    .split_once('=')
                    .map(|(n, f)| (n.trim(), f.trim()))
                    .filter(|(n, f)| !n.is_empty() && !f.is_empty())
                    .ok_or_else(|| "'derive' needs NAME = FORMULA".to_string())?;
                ShellCommand::Derive {
                    name: name.to_string(),
                    formula: formula.to_string(),
                }
            }
            "flag" => ShellCommand::Flag(require("a rule")?),
            "rm-col" => ShellCommand::RemoveColumn(require("a column name")?),
            "rm-flag" => ShellCommand::RemoveFlag(require("a rule")?),
            "history" => ShellCommand::History,
            "suggest" => ShellCommand::Suggest(require("a query")?),
            "apply-col" => ShellCommand::ApplyColumn(index("a suggestion index")?),
            "apply-flag" => ShellCommand::ApplyFlag(index("a suggestion index")?),
            "reload" => ShellCommand::Reload((!rest.is_empty()).then(|| PathBuf::from(rest))),
            "export" => ShellCommand::Export(PathBuf::from(require("a path")?)),
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => return Err(format!("Unknown command '{}'. Type 'help'.", other)),
        };
        Ok(Some(command))
    }
}

/// Interactive state: the session plus the last suggestion set.
struct Shell {
    session: Session,
    provider: Option<Arc<dyn LlmProvider>>,
    suggestions: SuggestionSet,
    verbose: bool,
}

impl Shell {
    fn execute(&mut self, command: ShellCommand) -> Result<(), Box<dyn std::error::Error>> {
        match command {
            ShellCommand::Columns => {
                for column in self.session.table()?.columns() {
                    println!(
                        "  {:24} {}",
                        column.name().white().bold(),
                        column.column_type().label().cyan()
                    );
                }
            }
            ShellCommand::Head(n) => print_head(self.session.table()?, n),
            ShellCommand::Crop(start, end) => {
                let table = self.session.crop(start, end)?;
                println!("{} {} rows", "Cropped to".green(), table.row_count());
            }
            ShellCommand::Check(expression) => {
                let series = self.session.evaluate(&expression)?;
                if self.verbose {
                    let parsed = formulary::Expression::parse(&expression)?;
                    println!("  {} {}", "reads".dimmed(), parsed.columns().join(", "));
                }
                let preview: Vec<String> = series.values().iter().take(10).map(Value::render).collect();
                println!(
                    "{} [{}]{}",
                    series.column_type().label().cyan(),
                    preview.join(", "),
                    if series.len() > 10 { ", ..." } else { "" }
                );
            }
            ShellCommand::Derive { name, formula } => {
                let record = self.session.apply_derived_column(&name, &formula, None)?;
                println!("{} {} = {}", "Added".green(), record.name.white().bold(), record.formula);
            }
            ShellCommand::Flag(rule) => {
                let record = self.session.apply_flag_rule(&rule, None)?;
                println!("{} {}", "Added".green(), record.column_name().white().bold());
            }
            ShellCommand::RemoveColumn(name) => {
                if self.session.remove_derived_column(&name)? {
                    println!("{} {}", "Removed".green(), name);
                } else {
                    println!("{} no derived column named {}", "Note:".yellow(), name);
                }
            }
            ShellCommand::RemoveFlag(rule) => {
                if self.session.remove_flag_rule(&rule)? {
                    println!("{} flag {}", "Removed".green(), rule);
                } else {
                    println!("{} no flag rule {}", "Note:".yellow(), rule);
                }
            }
            ShellCommand::History => print_history(&self.session),
            ShellCommand::Suggest(query) => {
                let provider = self
                    .provider
                    .as_ref()
                    .ok_or("No LLM provider configured. Start the shell with --llm.")?;
                self.suggestions = match self.session.suggest(provider.as_ref(), &query) {
                    Ok(set) => set,
                    Err(e) => {
                        eprintln!("{} {}", "Warning:".yellow(), e);
                        SuggestionSet::empty()
                    }
                };
                print_suggestions(&self.suggestions);
            }
            ShellCommand::ApplyColumn(i) => {
                let record = self.session.apply_suggested_column(&self.suggestions, i)?;
                println!("{} {} = {}", "Added".green(), record.name.white().bold(), record.formula);
            }
            ShellCommand::ApplyFlag(i) => {
                let record = self.session.apply_suggested_rule(&self.suggestions, i)?;
                println!("{} {}", "Added".green(), record.column_name().white().bold());
            }
            ShellCommand::Reload(path) => {
                let report = self.session.reload_and_replay(path.as_deref())?;
                println!(
                    "{} {} columns, {} rules",
                    "Replayed".green(),
                    report.applied_columns,
                    report.applied_rules
                );
                for failure in &report.failures {
                    println!("  {} {}: {}", "dropped".red(), failure.target, failure.error);
                }
                if self.verbose {
                    if let Some(source) = self.session.source() {
                        println!("  {} {} ({})", "source".dimmed(), source.file, source.hash);
                    }
                }
            }
            ShellCommand::Export(path) => {
                let file = std::fs::File::create(&path)?;
                self.session.export_csv(io::BufWriter::new(file))?;
                println!("{} {}", "Saved to".green().bold(), path.display());
            }
            ShellCommand::Help => println!("{}", HELP),
            ShellCommand::Quit => {}
        }
        Ok(())
    }
}

fn print_head(table: &Table, n: usize) {
    let names = table.column_names();
    println!("{}", names.join(" | ").white().bold());
    for row in table.head(n) {
        let cells: Vec<String> = row.iter().map(|v| v.render()).collect();
        println!("{}", cells.join(" | "));
    }
    if table.row_count() > n {
        println!("{}", format!("... {} more rows", table.row_count() - n).dimmed());
    }
}

fn print_history(session: &Session) {
    let history = session.history();
    if history.is_empty() {
        println!("{}", "Nothing applied yet.".dimmed());
        return;
    }
    for record in history.derived_columns() {
        println!("  {} {} = {}", "column".cyan(), record.name.white().bold(), record.formula);
    }
    for record in history.flag_rules() {
        println!("  {} {}", "flag".cyan(), record.rule.white().bold());
    }

    if let Ok(table) = session.table() {
        for divergence in history.verify(table) {
            println!("  {} {:?}", "inconsistent:".red(), divergence);
        }
    }
}

pub fn run(
    file: PathBuf,
    llm: LlmProviderChoice,
    model: Option<String>,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session(&file, None)?;
    let provider = build_provider(&llm, model)?;

    {
        let table = session.table()?;
        println!(
            "{} {} ({} rows, {} columns). Type 'help' for commands.",
            "Loaded".cyan().bold(),
            file.display().to_string().white(),
            table.row_count(),
            table.column_count()
        );
    }

    let mut shell = Shell {
        session,
        provider,
        suggestions: SuggestionSet::empty(),
        verbose,
    };

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", "formulary>".green().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        match ShellCommand::parse(&line?) {
            Ok(None) => {}
            Ok(Some(ShellCommand::Quit)) => break,
            Ok(Some(command)) => {
                if let Err(e) = shell.execute(command) {
                    eprintln!("{} {}", "Error:".red(), e);
                }
            }
            Err(message) => eprintln!("{} {}", "Error:".red(), message),
        }
    }

    Ok(())
}
