//! `roachwatch config`

use anyhow::Result;
use roachwatch_config::{validate, Settings};

use crate::terminal_output::{note_error, note_success, note_warn, render_table, Column};

pub fn run(settings: &Settings) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&settings.redacted())?);

    let report = validate(settings);
    let rows: Vec<Vec<String>> = report
        .errors
        .iter()
        .map(|e| vec!["error".to_string(), e.path.clone(), e.message.clone()])
        .chain(
            report
                .warnings
                .iter()
                .map(|w| vec!["warning".to_string(), w.path.clone(), w.message.clone()]),
        )
        .collect();
    if !rows.is_empty() {
        let columns = [Column::left("Level"), Column::left("Setting"), Column::left("Problem")];
        print!("\n{}", render_table(&columns, &rows));
    }

    match (report.errors.len(), report.warnings.len()) {
        (0, 0) => note_success("Configuration is valid"),
        (0, w) => note_warn(&format!("Configuration is valid with {w} warning(s)")),
        (e, _) => note_error(&format!("Configuration has {e} error(s)")),
    }
    Ok(())
}
