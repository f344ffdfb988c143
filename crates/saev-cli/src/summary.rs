use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use saev_model::{MigrationSummary, PipelineOutcome, TransformSummary, ValidationSummary};

pub fn print_outcome(outcome: &PipelineOutcome) {
    println!("Reached: {}", outcome.reached);

    if let Some(ingest) = &outcome.ingest {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("File"),
            header_cell("Read"),
            header_cell("Filtered"),
            header_cell("Loaded"),
        ]);
        apply_table_style(&mut table);
        for column in 1..=3 {
            align_column(&mut table, column, CellAlignment::Right);
        }
        for file in &ingest.files {
            table.add_row(vec![
                Cell::new(file.path.display()),
                Cell::new(file.rows_read),
                count_cell(file.rows_filtered, Color::Yellow),
                Cell::new(file.rows_loaded),
            ]);
        }
        table.add_row(vec![
            header_cell("TOTAL"),
            Cell::new(ingest.rows_read).add_attribute(Attribute::Bold),
            count_cell(ingest.rows_filtered, Color::Yellow).add_attribute(Attribute::Bold),
            Cell::new(ingest.rows_loaded).add_attribute(Attribute::Bold),
        ]);
        println!("{table}");
    }

    if let Some(validation) = &outcome.validation {
        print_validation(validation);
    }
    if let Some(transform) = &outcome.transform {
        print_transform(transform);
    }
    if let Some(migration) = &outcome.migration {
        print_migration(migration);
    }

    if !outcome.warnings.is_empty() {
        eprintln!("Warnings:");
        for warning in &outcome.warnings {
            match warning.kind {
                Some(kind) => eprintln!("- [{}] {kind}: {}", warning.stage, warning.message),
                None => eprintln!("- [{}] {}", warning.stage, warning.message),
            }
        }
    }
    if let Some(failure) = &outcome.failure {
        eprintln!(
            "error: {} failed ({}): {}",
            failure.stage, failure.kind, failure.message
        );
        if let Some(resource) = &failure.resource {
            eprintln!("  at {resource}");
        }
    }
}

fn print_validation(summary: &ValidationSummary) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Check"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let rows = [
        ("Total records", summary.total_records, None),
        ("Unique students", summary.unique_students, None),
        ("Schools", summary.school_count, None),
        ("Municipalities", summary.city_count, None),
        ("Missing student", summary.null_student_count, Some(Color::Yellow)),
        ("Invalid answers", summary.invalid_answer_count, Some(Color::Yellow)),
        ("Missing competency", summary.null_descriptor_count, Some(Color::Yellow)),
        ("Non-numeric identifiers", summary.non_integer_key_count, Some(Color::Yellow)),
    ];
    for (label, value, highlight) in rows {
        let value_cell = match highlight {
            Some(color) => count_cell(value, color),
            None => Cell::new(value),
        };
        table.add_row(vec![Cell::new(label), value_cell]);
    }
    println!("{table}");
}

fn print_transform(summary: &TransformSummary) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Table"), header_cell("Rows")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (name, rows) in &summary.dimension_counts {
        table.add_row(vec![Cell::new(name).fg(Color::Blue), Cell::new(rows)]);
    }
    table.add_row(vec![
        header_cell("fact_student_response"),
        Cell::new(summary.fact_row_count).add_attribute(Attribute::Bold),
    ]);
    for (name, rows) in &summary.aggregate_counts {
        table.add_row(vec![Cell::new(name).fg(Color::Magenta), Cell::new(rows)]);
    }
    if summary.excluded_rows > 0 {
        table.add_row(vec![
            dim_cell("excluded raw rows"),
            count_cell(summary.excluded_rows, Color::Yellow),
        ]);
    }
    println!("{table}");
}

fn print_migration(summary: &MigrationSummary) {
    println!("Replica: {}", summary.destination.display());
    if summary.skipped {
        println!("Replica existed; copy skipped (use --force to rebuild).");
    } else {
        println!(
            "Copied {} tables, {} rows.",
            summary.tables_copied, summary.rows_copied
        );
    }
    if summary.checks.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Metric"),
        header_cell("Row store"),
        header_cell("Replica"),
        header_cell("Match"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    for check in &summary.checks {
        let status = if check.matches() {
            Cell::new("ok").fg(Color::Green)
        } else {
            Cell::new("MISMATCH")
                .fg(Color::Red)
                .add_attribute(Attribute::Bold)
        };
        table.add_row(vec![
            Cell::new(&check.table),
            dim_cell(&check.metric),
            Cell::new(check.source),
            Cell::new(check.destination),
            status,
        ]);
    }
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(value: u64, color: Color) -> Cell {
    if value == 0 {
        dim_cell(value)
    } else {
        Cell::new(value).fg(color)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
