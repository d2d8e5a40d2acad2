use csv::{QuoteStyle, WriterBuilder};

use super::schema::{CanonicalField, CANONICAL_ORDER};
use crate::models::Business;

type Error = Box<dyn std::error::Error + Send + Sync>;

/// Writes listings as a sheet with the canonical header, re-importable as-is.
///
/// Text cells are always quoted since the importer also splits on bare tabs,
/// and flattened to one line since it reads one record per line.
pub fn export_businesses(businesses: &[Business]) -> Result<String, Error> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(Vec::new());

    writer.write_record(CANONICAL_ORDER.iter().map(|field| field.column_name()))?;
    for business in businesses {
        writer.write_record(CANONICAL_ORDER.iter().map(|field| cell(business, *field)))?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

fn cell(business: &Business, field: CanonicalField) -> String {
    let optional = |value: &Option<String>| {
        value.as_deref().map(single_line).unwrap_or_default()
    };
    match field {
        CanonicalField::Name => single_line(&business.name),
        CanonicalField::Description => optional(&business.description),
        CanonicalField::Address => single_line(&business.address),
        CanonicalField::City => single_line(&business.city),
        CanonicalField::State => single_line(&business.state),
        CanonicalField::ZipCode => single_line(&business.zip_code),
        CanonicalField::Phone => optional(&business.phone),
        CanonicalField::Email => optional(&business.email),
        CanonicalField::Website => optional(&business.website),
        CanonicalField::Services => single_line(&business.services.join(", ")),
        CanonicalField::Rating => business.rating.to_string(),
        CanonicalField::ReviewCount => business.review_count.to_string(),
        CanonicalField::LicenseNumber => optional(&business.license_number),
        CanonicalField::InsuranceVerified => business.insurance_verified.to_string(),
        CanonicalField::Featured => business.featured.to_string(),
    }
}

fn single_line(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(|c: char| c == '\r' || c == '\n', " ")
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::bulk::parse_business_sheet;
    use crate::bulk::tokenizer::tokenize_line;
    use crate::models::PricingTier;

    fn business() -> Business {
        Business {
            id: Uuid::new_v4(),
            name: "Frosty's \"Best\" AC".into(),
            description: Some("Repairs\tinstalls, tune-ups".into()),
            address: "12 Coral Way, Unit 4".into(),
            city: "Miami".into(),
            state: "FL".into(),
            zip_code: "33145".into(),
            phone: Some("305-555-0199".into()),
            email: None,
            website: None,
            services: vec!["AC Repair".into(), "Duct Cleaning".into()],
            rating: 4.8,
            review_count: 212,
            featured: true,
            insurance_verified: true,
            license_number: Some("CAC1816000".into()),
            owner_user_id: None,
            tier: PricingTier::Premium,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_export_header_is_canonical() {
        let sheet = export_businesses(&[]).unwrap();
        let header = tokenize_line(sheet.trim_end());
        let expected: Vec<&str> = CANONICAL_ORDER.iter().map(|f| f.column_name()).collect();
        assert_eq!(header, expected);
        assert_eq!(header.len(), 15);
    }

    #[test]
    fn test_export_reimports_to_same_listing() {
        let original = business();
        let sheet = export_businesses(std::slice::from_ref(&original)).unwrap();
        let report = parse_business_sheet(&sheet).unwrap();

        assert!(report.errors.is_empty());
        let imported = &report.records[0];
        assert_eq!(imported.name, original.name);
        assert_eq!(imported.description, original.description);
        assert_eq!(imported.address, original.address);
        assert_eq!(imported.services, original.services);
        assert_eq!(imported.rating, original.rating);
        assert_eq!(imported.review_count, original.review_count);
        assert_eq!(imported.license_number, original.license_number);
        assert!(imported.featured);
        assert!(imported.insurance_verified);
    }

    #[test]
    fn test_multiline_description_stays_one_record() {
        let mut original = business();
        original.description = Some("Family owned.\nLicensed, insured, 24/7\r\nCall us".into());
        let sheet = export_businesses(std::slice::from_ref(&original)).unwrap();
        assert_eq!(sheet.trim_end().lines().count(), 2);

        let report = parse_business_sheet(&sheet).unwrap();
        assert!(report.errors.is_empty());
        assert_eq!(report.records.len(), 1);
        assert_eq!(
            report.records[0].description.as_deref(),
            Some("Family owned. Licensed, insured, 24/7 Call us")
        );
        assert_eq!(report.records[0].address, original.address);
    }
}
