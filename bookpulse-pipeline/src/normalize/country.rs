//! Country name canonicalization
//!
//! Source location text arrives as anything from "USA" to
//! "London, England". A static variant table maps common spellings to one
//! canonical name. Unmatched text is preserved as given; absent text
//! becomes "unknown".

pub const UNKNOWN: &str = "unknown";

/// Variant -> canonical country name (variants pre-lowercased)
const VARIANTS: &[(&str, &str)] = &[
    ("usa", "United States"),
    ("us", "United States"),
    ("u.s.", "United States"),
    ("u.s.a.", "United States"),
    ("america", "United States"),
    ("united states", "United States"),
    ("united states of america", "United States"),
    ("uk", "United Kingdom"),
    ("u.k.", "United Kingdom"),
    ("britain", "United Kingdom"),
    ("great britain", "United Kingdom"),
    ("england", "United Kingdom"),
    ("scotland", "United Kingdom"),
    ("wales", "United Kingdom"),
    ("northern ireland", "United Kingdom"),
    ("united kingdom", "United Kingdom"),
    ("republic of ireland", "Ireland"),
    ("ireland", "Ireland"),
    ("france", "France"),
    ("germany", "Germany"),
    ("spain", "Spain"),
    ("italy", "Italy"),
    ("portugal", "Portugal"),
    ("netherlands", "Netherlands"),
    ("holland", "Netherlands"),
    ("belgium", "Belgium"),
    ("switzerland", "Switzerland"),
    ("austria", "Austria"),
    ("sweden", "Sweden"),
    ("norway", "Norway"),
    ("denmark", "Denmark"),
    ("finland", "Finland"),
    ("poland", "Poland"),
    ("czech republic", "Czechia"),
    ("czechia", "Czechia"),
    ("hungary", "Hungary"),
    ("romania", "Romania"),
    ("greece", "Greece"),
    ("ukraine", "Ukraine"),
    ("russia", "Russia"),
    ("russian federation", "Russia"),
    ("turkey", "Turkey"),
    ("israel", "Israel"),
    ("egypt", "Egypt"),
    ("south africa", "South Africa"),
    ("nigeria", "Nigeria"),
    ("kenya", "Kenya"),
    ("ivory coast", "Côte d'Ivoire"),
    ("india", "India"),
    ("pakistan", "Pakistan"),
    ("china", "China"),
    ("japan", "Japan"),
    ("south korea", "South Korea"),
    ("north korea", "North Korea"),
    ("vietnam", "Vietnam"),
    ("viet nam", "Vietnam"),
    ("thailand", "Thailand"),
    ("indonesia", "Indonesia"),
    ("philippines", "Philippines"),
    ("burma", "Myanmar"),
    ("myanmar", "Myanmar"),
    ("australia", "Australia"),
    ("new zealand", "New Zealand"),
    ("canada", "Canada"),
    ("mexico", "Mexico"),
    ("brazil", "Brazil"),
    ("argentina", "Argentina"),
    ("chile", "Chile"),
    ("colombia", "Colombia"),
    ("iran", "Iran"),
    ("iraq", "Iraq"),
];

/// Canonicalize location text to a country name
pub fn canonical_country(text: Option<&str>) -> String {
    let Some(raw) = text else {
        return UNKNOWN.to_string();
    };
    let trimmed = raw.trim();
    let lower = trimmed.to_lowercase();
    if lower.is_empty() || lower == "unknown" || lower == "nan" || lower == "none" {
        return UNKNOWN.to_string();
    }

    // Exact match first
    for (variant, canonical) in VARIANTS {
        if lower == *variant {
            return canonical.to_string();
        }
    }

    // Then whole-word / whole-phrase match within location text
    // ("New York, United States" -> "United States"). Word-level matching
    // avoids substring traps like "us" inside "Australia".
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric() && c != '.')
        .filter(|w| !w.is_empty())
        .collect();
    for (variant, canonical) in VARIANTS {
        if variant.contains(' ') {
            if lower.contains(variant) {
                return canonical.to_string();
            }
        } else if words.iter().any(|w| w == variant) {
            return canonical.to_string();
        }
    }

    trimmed.to_string()
}
