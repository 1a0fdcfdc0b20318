//! Columns command - list the columns of a data file.

use std::path::PathBuf;

use colored::Colorize;

use super::open_session;

pub fn run(
    file: PathBuf,
    sheet: Option<String>,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = open_session(&file, sheet)?;
    let table = session.table()?;

    if json_output {
        let columns: Vec<_> = table
            .columns()
            .map(|c| {
                serde_json::json!({
                    "name": c.name(),
                    "type": c.column_type(),
                    "nulls": c.null_count(),
                })
            })
            .collect();
        let output = serde_json::json!({
            "source": session.source(),
            "row_count": table.row_count(),
            "columns": columns,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Columns of".cyan().bold(),
        file.display().to_string().white()
    );
    if let Some(sheet) = session.source().and_then(|s| s.sheet.as_deref()) {
        println!("Sheet: {}", sheet.white());
    }
    println!();

    for column in table.columns() {
        let nulls = column.null_count();
        let null_note = if nulls > 0 {
            format!("{} nulls", nulls).yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:24} {:10} {}",
            column.name().white().bold(),
            column.column_type().label().cyan(),
            null_note
        );
    }

    println!();
    println!(
        "{} rows, {} columns",
        table.row_count().to_string().white().bold(),
        table.column_count().to_string().white().bold()
    );

    if verbose {
        if let Some(source) = session.source() {
            println!("Format: {}  Hash: {}", source.format, source.hash);
        }
    }

    Ok(())
}
