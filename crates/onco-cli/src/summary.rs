//! Batch summary rendering.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use onco_core::{BatchRun, RunStatus};
use onco_model::StepOutcome;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn outcome_cell(outcome: &StepOutcome) -> Cell {
    let mut text = outcome.reason.as_str().to_string();
    if let Some(within) = outcome.within_filter {
        text = format!("{text} ({})", if within { "in" } else { "out" });
    }
    if outcome.success {
        Cell::new(text).fg(Color::Green)
    } else {
        Cell::new(text).fg(Color::Red)
    }
}

pub fn print_summary(run: &BatchRun) {
    match &run.status {
        RunStatus::Completed => println!("Run completed."),
        RunStatus::Cancelled => println!("Run cancelled; partial summary follows."),
        RunStatus::Errored(message) => {
            println!("Run aborted with an error: {message}");
            println!("Partial summary follows.");
        }
    }

    if run.summary.patient_count() > 0 {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Patient"),
            header_cell("Stage"),
            header_cell("Outcome"),
        ]);
        apply_table_style(&mut table);
        for (patient, steps) in run.summary.patients() {
            for (stage, outcome) in steps {
                table.add_row(vec![
                    Cell::new(patient),
                    Cell::new(stage.as_str()),
                    outcome_cell(outcome),
                ]);
            }
        }
        println!("{table}");
    }

    let batch: Vec<_> = run.summary.batch_outcomes().collect();
    if !batch.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![header_cell("Batch stage"), header_cell("Outcome")]);
        apply_table_style(&mut table);
        for (stage, outcome) in batch {
            table.add_row(vec![Cell::new(stage.as_str()), outcome_cell(&outcome)]);
        }
        println!("{table}");
    }
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn print_summary_json(run: &BatchRun) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&run.summary)?);
    Ok(())
}
