//! Process command - crop, derive and flag in one pass, then export CSV.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use colored::Colorize;

use crate::cli::{Derivation, RowRange};

use super::open_session;

/// Arguments for a batch run.
pub struct ProcessArgs {
    pub file: PathBuf,
    pub sheet: Option<String>,
    pub crop: Option<RowRange>,
    pub derive: Vec<Derivation>,
    pub flag: Vec<String>,
    pub output: Option<PathBuf>,
}

pub fn run(args: ProcessArgs, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = open_session(&args.file, args.sheet)?;

    if let Some(range) = args.crop {
        let table = session.crop(range.start, range.end)?;
        if verbose {
            eprintln!("Cropped to {} rows", table.row_count());
        }
    }

    for derivation in &args.derive {
        session
            .apply_derived_column(&derivation.name, &derivation.formula, None)
            .map_err(|e| format!("--derive {}: {}", derivation.name, e))?;
    }

    for rule in &args.flag {
        session
            .apply_flag_rule(rule, None)
            .map_err(|e| format!("--flag {}: {}", rule, e))?;
    }

    match &args.output {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| format!("Cannot create {}: {}", path.display(), e))?;
            session.export_csv(BufWriter::new(file))?;

            let table = session.table()?;
            eprintln!(
                "{} {} ({} rows, {} columns)",
                "Saved to".green().bold(),
                path.display().to_string().white(),
                table.row_count(),
                table.column_count()
            );
        }
        None => session.export_csv(io::stdout().lock())?,
    }

    Ok(())
}
