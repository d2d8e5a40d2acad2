//! Turns an uploaded sheet into insertable businesses plus per-row errors.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::schema::{coerce, CanonicalField, FieldValue, REQUIRED_FIELDS};
use super::tokenizer::{numbered_lines, tokenize_line};
use crate::models::{NewBusiness, PricingTier};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    #[error("The uploaded file is empty")]
    Empty,
    #[error("The uploaded file has a header row but no data rows")]
    NoDataRows,
}

/// Outcome of parsing a sheet: valid rows ready for one bulk insert, and
/// messages for the rows that were skipped.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub total_rows: usize,
    pub records: Vec<NewBusiness>,
    pub errors: Vec<String>,
    pub ignored_headers: Vec<String>,
}

impl ImportReport {
    pub fn accepted(&self) -> usize {
        self.records.len()
    }

    pub fn rejected(&self) -> usize {
        self.errors.len()
    }
}

/// Parses the whole upload. The first non-blank line is the header.
pub fn parse_business_sheet(content: &str) -> Result<ImportReport, ImportError> {
    // spreadsheet "CSV UTF-8" exports lead with a byte order mark
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = numbered_lines(content);
    let (_, header_line) = lines.next().ok_or(ImportError::Empty)?;

    let mut columns: Vec<Option<CanonicalField>> = Vec::new();
    let mut ignored_headers = Vec::new();
    for header in tokenize_line(header_line) {
        let field = CanonicalField::from_header(&header);
        if field.is_none() && !header.is_empty() {
            ignored_headers.push(header);
        }
        columns.push(field);
    }

    let mut report = ImportReport {
        total_rows: 0,
        records: Vec::new(),
        errors: Vec::new(),
        ignored_headers,
    };

    for (line_number, line) in lines {
        report.total_rows += 1;
        let values = tokenize_line(line);
        let row = map_row(&columns, &values);

        let missing = missing_required(&row);
        if !missing.is_empty() {
            report.errors.push(format!(
                "Row {}: Missing required fields ({})",
                line_number,
                missing.join(", ")
            ));
            continue;
        }

        report.records.push(row.into_new_business());
    }

    if report.total_rows == 0 {
        return Err(ImportError::NoDataRows);
    }

    Ok(report)
}

/// Coerced cells of one row, keyed by canonical field.
#[derive(Debug, Default)]
struct ImportRow {
    values: HashMap<CanonicalField, FieldValue>,
}

fn map_row(columns: &[Option<CanonicalField>], values: &[String]) -> ImportRow {
    let mut row = ImportRow::default();
    for (column, raw) in columns.iter().zip(values) {
        if let Some(field) = column {
            // later duplicate columns win
            row.values.insert(*field, coerce(*field, raw));
        }
    }
    row
}

fn missing_required(row: &ImportRow) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .filter(|field| row.text(**field).is_none())
        .map(|field| field.column_name())
        .collect()
}

impl ImportRow {
    fn text(&self, field: CanonicalField) -> Option<String> {
        match self.values.get(&field) {
            Some(FieldValue::Text(value)) if !value.trim().is_empty() => {
                Some(value.trim().to_string())
            }
            _ => None,
        }
    }

    fn list(&self, field: CanonicalField) -> Vec<String> {
        match self.values.get(&field) {
            Some(FieldValue::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    fn float(&self, field: CanonicalField) -> f64 {
        match self.values.get(&field) {
            Some(FieldValue::Float(value)) => *value,
            _ => 0.0,
        }
    }

    fn int(&self, field: CanonicalField) -> i32 {
        match self.values.get(&field) {
            Some(FieldValue::Int(value)) => *value,
            _ => 0,
        }
    }

    fn flag(&self, field: CanonicalField) -> bool {
        matches!(self.values.get(&field), Some(FieldValue::Bool(true)))
    }

    fn into_new_business(self) -> NewBusiness {
        let now = Utc::now();
        NewBusiness {
            id: Uuid::new_v4(),
            name: self.text(CanonicalField::Name).unwrap_or_default(),
            description: self.text(CanonicalField::Description),
            address: self.text(CanonicalField::Address).unwrap_or_default(),
            city: self.text(CanonicalField::City).unwrap_or_default(),
            state: self.text(CanonicalField::State).unwrap_or_default(),
            zip_code: self.text(CanonicalField::ZipCode).unwrap_or_default(),
            phone: self.text(CanonicalField::Phone),
            email: self.text(CanonicalField::Email),
            website: self.text(CanonicalField::Website),
            services: self.list(CanonicalField::Services),
            rating: self.float(CanonicalField::Rating),
            review_count: self.int(CanonicalField::ReviewCount),
            featured: self.flag(CanonicalField::Featured),
            insurance_verified: self.flag(CanonicalField::InsuranceVerified),
            license_number: self.text(CanonicalField::LicenseNumber),
            owner_user_id: None,
            tier: PricingTier::Free,
            created_at: now,
            updated_at: now,
        }
    }
}
