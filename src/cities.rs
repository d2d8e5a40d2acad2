//! Served cities and their zip codes, backing the location landing pages.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct City {
    pub name: &'static str,
    pub state: &'static str,
    pub slug: &'static str,
    pub zip_codes: &'static [&'static str],
}

static CITIES: &[City] = &[
    City {
        name: "Miami",
        state: "FL",
        slug: "miami-fl",
        zip_codes: &[
            "33101", "33125", "33127", "33128", "33129", "33130", "33131", "33132", "33133",
            "33135", "33136", "33137", "33142", "33145",
        ],
    },
    City {
        name: "Miami Beach",
        state: "FL",
        slug: "miami-beach-fl",
        zip_codes: &["33109", "33139", "33140", "33141"],
    },
    City {
        name: "Fort Lauderdale",
        state: "FL",
        slug: "fort-lauderdale-fl",
        zip_codes: &[
            "33301", "33304", "33305", "33306", "33308", "33311", "33312", "33315", "33316",
        ],
    },
    City {
        name: "Hollywood",
        state: "FL",
        slug: "hollywood-fl",
        zip_codes: &["33019", "33020", "33021", "33023", "33024"],
    },
    City {
        name: "West Palm Beach",
        state: "FL",
        slug: "west-palm-beach-fl",
        zip_codes: &["33401", "33405", "33407", "33409", "33411"],
    },
    City {
        name: "Tampa",
        state: "FL",
        slug: "tampa-fl",
        zip_codes: &[
            "33601", "33602", "33603", "33604", "33605", "33606", "33609", "33610", "33611",
        ],
    },
    City {
        name: "Orlando",
        state: "FL",
        slug: "orlando-fl",
        zip_codes: &["32801", "32803", "32804", "32805", "32806", "32807", "32808", "32809"],
    },
    City {
        name: "Jacksonville",
        state: "FL",
        slug: "jacksonville-fl",
        zip_codes: &["32202", "32204", "32205", "32206", "32207", "32208", "32209", "32210"],
    },
    City {
        name: "Houston",
        state: "TX",
        slug: "houston-tx",
        zip_codes: &["77002", "77003", "77004", "77005", "77006", "77007", "77008", "77009"],
    },
    City {
        name: "Phoenix",
        state: "AZ",
        slug: "phoenix-az",
        zip_codes: &["85003", "85004", "85006", "85007", "85008", "85009", "85012", "85013"],
    },
];

pub fn all_cities() -> &'static [City] {
    CITIES
}

pub fn find_by_slug(slug: &str) -> Option<&'static City> {
    let slug = slug.trim().to_ascii_lowercase();
    CITIES.iter().find(|city| city.slug == slug)
}

pub fn find_by_zip(zip: &str) -> Option<&'static City> {
    // ZIP+4 codes resolve by their five-digit prefix
    let zip = zip.trim();
    let zip = zip.split('-').next().unwrap_or(zip);
    CITIES.iter().find(|city| city.zip_codes.contains(&zip))
}
