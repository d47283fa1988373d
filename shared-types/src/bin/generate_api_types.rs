use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for API types
    let mut types = Vec::new();

    // Snapshot types
    types.push(clean_type(TransactionType::export_to_string()?));
    types.push(clean_type(Transaction::export_to_string()?));
    types.push(clean_type(Goal::export_to_string()?));
    types.push(clean_type(Totals::export_to_string()?));
    types.push(clean_type(FinancialSnapshot::export_to_string()?));

    // Insight types
    types.push(clean_type(InsightType::export_to_string()?));
    types.push(clean_type(InsightCategory::export_to_string()?));
    types.push(clean_type(InsightItem::export_to_string()?));
    types.push(clean_type(InsightsResponse::export_to_string()?));

    types.push(clean_type(ErrorResponse::export_to_string()?));

    let output_dir = Path::new("../gui/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("types.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // All types land in one file, so cross-type imports are dropped
    type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
