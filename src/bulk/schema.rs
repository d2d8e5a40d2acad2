//! Canonical import schema: header synonyms and per-field coercion.

use serde::Serialize;

/// Destination columns a sheet header can map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Name,
    Description,
    Address,
    City,
    State,
    ZipCode,
    Phone,
    Email,
    Website,
    Services,
    Rating,
    ReviewCount,
    LicenseNumber,
    InsuranceVerified,
    Featured,
}

/// Fields that must be non-empty for a row to be imported.
pub const REQUIRED_FIELDS: [CanonicalField; 5] = [
    CanonicalField::Name,
    CanonicalField::Address,
    CanonicalField::City,
    CanonicalField::State,
    CanonicalField::ZipCode,
];

/// Export column order.
pub const CANONICAL_ORDER: [CanonicalField; 15] = [
    CanonicalField::Name,
    CanonicalField::Description,
    CanonicalField::Address,
    CanonicalField::City,
    CanonicalField::State,
    CanonicalField::ZipCode,
    CanonicalField::Phone,
    CanonicalField::Email,
    CanonicalField::Website,
    CanonicalField::Services,
    CanonicalField::Rating,
    CanonicalField::ReviewCount,
    CanonicalField::LicenseNumber,
    CanonicalField::InsuranceVerified,
    CanonicalField::Featured,
];

const SYNONYMS: &[(&str, CanonicalField)] = &[
    ("name", CanonicalField::Name),
    ("business_name", CanonicalField::Name),
    ("company", CanonicalField::Name),
    ("company_name", CanonicalField::Name),
    ("description", CanonicalField::Description),
    ("about", CanonicalField::Description),
    ("address", CanonicalField::Address),
    ("street", CanonicalField::Address),
    ("street_address", CanonicalField::Address),
    ("address1", CanonicalField::Address),
    ("city", CanonicalField::City),
    ("town", CanonicalField::City),
    ("state", CanonicalField::State),
    ("province", CanonicalField::State),
    ("zip", CanonicalField::ZipCode),
    ("zipcode", CanonicalField::ZipCode),
    ("zip_code", CanonicalField::ZipCode),
    ("postal_code", CanonicalField::ZipCode),
    ("postcode", CanonicalField::ZipCode),
    ("phone", CanonicalField::Phone),
    ("phone_number", CanonicalField::Phone),
    ("telephone", CanonicalField::Phone),
    ("tel", CanonicalField::Phone),
    ("email", CanonicalField::Email),
    ("email_address", CanonicalField::Email),
    ("e_mail", CanonicalField::Email),
    ("website", CanonicalField::Website),
    ("url", CanonicalField::Website),
    ("web", CanonicalField::Website),
    ("services", CanonicalField::Services),
    ("service", CanonicalField::Services),
    ("service_types", CanonicalField::Services),
    ("rating", CanonicalField::Rating),
    ("stars", CanonicalField::Rating),
    ("review_count", CanonicalField::ReviewCount),
    ("reviews", CanonicalField::ReviewCount),
    ("reviews_count", CanonicalField::ReviewCount),
    ("license_number", CanonicalField::LicenseNumber),
    ("license", CanonicalField::LicenseNumber),
    ("license_no", CanonicalField::LicenseNumber),
    ("insurance_verified", CanonicalField::InsuranceVerified),
    ("insured", CanonicalField::InsuranceVerified),
    ("insurance", CanonicalField::InsuranceVerified),
    ("featured", CanonicalField::Featured),
    ("is_featured", CanonicalField::Featured),
];

impl CanonicalField {
    pub fn column_name(self) -> &'static str {
        match self {
            CanonicalField::Name => "name",
            CanonicalField::Description => "description",
            CanonicalField::Address => "address",
            CanonicalField::City => "city",
            CanonicalField::State => "state",
            CanonicalField::ZipCode => "zip_code",
            CanonicalField::Phone => "phone",
            CanonicalField::Email => "email",
            CanonicalField::Website => "website",
            CanonicalField::Services => "services",
            CanonicalField::Rating => "rating",
            CanonicalField::ReviewCount => "review_count",
            CanonicalField::LicenseNumber => "license_number",
            CanonicalField::InsuranceVerified => "insurance_verified",
            CanonicalField::Featured => "featured",
        }
    }

    /// Maps a raw header token onto the canonical schema.
    pub fn from_header(header: &str) -> Option<Self> {
        let normalized: String = header
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .collect();

        SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == normalized)
            .map(|(_, field)| *field)
    }
}

/// A raw cell after coercion to its destination type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
    Float(f64),
    Int(i32),
    Bool(bool),
}

/// Coerces a raw cell for the given field. Never fails: bad numbers become 0.
pub fn coerce(field: CanonicalField, raw: &str) -> FieldValue {
    match field {
        CanonicalField::Services => FieldValue::List(split_list(raw)),
        CanonicalField::Rating => FieldValue::Float(
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .unwrap_or(0.0),
        ),
        CanonicalField::ReviewCount => FieldValue::Int(raw.trim().parse().unwrap_or(0)),
        CanonicalField::InsuranceVerified | CanonicalField::Featured => {
            FieldValue::Bool(parse_flag(raw))
        }
        _ => FieldValue::Text(raw.to_string()),
    }
}

pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    let value = raw.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_synonyms() {
        assert_eq!(CanonicalField::from_header("zip"), Some(CanonicalField::ZipCode));
        assert_eq!(CanonicalField::from_header("ZipCode"), Some(CanonicalField::ZipCode));
        assert_eq!(CanonicalField::from_header(" postal_code "), Some(CanonicalField::ZipCode));
        assert_eq!(CanonicalField::from_header("Zip Code"), Some(CanonicalField::ZipCode));
        assert_eq!(CanonicalField::from_header("phone_number"), Some(CanonicalField::Phone));
        assert_eq!(CanonicalField::from_header("Telephone"), Some(CanonicalField::Phone));
        assert_eq!(CanonicalField::from_header("E-mail"), Some(CanonicalField::Email));
        assert_eq!(CanonicalField::from_header("fax"), None);
    }

    #[test]
    fn test_every_canonical_name_maps_to_itself() {
        for field in CANONICAL_ORDER {
            assert_eq!(CanonicalField::from_header(field.column_name()), Some(field));
        }
    }

    #[test]
    fn test_services_split_into_list() {
        assert_eq!(
            coerce(CanonicalField::Services, "AC Repair, Installation,,"),
            FieldValue::List(vec!["AC Repair".into(), "Installation".into()])
        );
    }

    #[test]
    fn test_unparseable_numbers_default_to_zero() {
        assert_eq!(coerce(CanonicalField::Rating, "great"), FieldValue::Float(0.0));
        assert_eq!(coerce(CanonicalField::Rating, ""), FieldValue::Float(0.0));
        assert_eq!(coerce(CanonicalField::ReviewCount, "n/a"), FieldValue::Int(0));
        assert_eq!(coerce(CanonicalField::Rating, "4.5"), FieldValue::Float(4.5));
        assert_eq!(coerce(CanonicalField::ReviewCount, "10"), FieldValue::Int(10));
    }

    #[test]
    fn test_flags() {
        assert_eq!(coerce(CanonicalField::InsuranceVerified, "TRUE"), FieldValue::Bool(true));
        assert_eq!(coerce(CanonicalField::InsuranceVerified, "1"), FieldValue::Bool(true));
        assert_eq!(coerce(CanonicalField::InsuranceVerified, "yes"), FieldValue::Bool(false));
        assert_eq!(coerce(CanonicalField::Featured, "false"), FieldValue::Bool(false));
    }
}
