//! Markdown tables

use comfy_table::{presets::ASCII_MARKDOWN, ContentArrangement, Table};

/// Build a markdown table; rows shorter than the header are padded blank
pub fn markdown_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut table = Table::new();
    table
        .load_preset(ASCII_MARKDOWN)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(header);

    for row in rows {
        let mut cells = row.clone();
        cells.resize(header.len(), String::new());
        table.add_row(cells);
    }

    table.to_string()
}

/// A report's markdown file: title, image references, then the table
pub fn markdown_document(title: &str, images: &[&str], table: &str) -> String {
    let mut doc = format!("# {}\n\n", title);
    for image in images {
        doc.push_str(&format!("![{}]({})\n\n", image, image));
    }
    doc.push_str(table);
    doc.push('\n');
    doc
}
