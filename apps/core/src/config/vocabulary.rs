//! Fixed vocabularies for entity recognition.

/// Indian states and union territories.
pub const INDIAN_STATES: &[&str] = &[
    "Andhra Pradesh",
    "Arunachal Pradesh",
    "Assam",
    "Bihar",
    "Chhattisgarh",
    "Goa",
    "Gujarat",
    "Haryana",
    "Himachal Pradesh",
    "Jharkhand",
    "Karnataka",
    "Kerala",
    "Madhya Pradesh",
    "Maharashtra",
    "Manipur",
    "Meghalaya",
    "Mizoram",
    "Nagaland",
    "Odisha",
    "Punjab",
    "Rajasthan",
    "Sikkim",
    "Tamil Nadu",
    "Telangana",
    "Tripura",
    "Uttar Pradesh",
    "Uttarakhand",
    "West Bengal",
    "Delhi",
    "Jammu and Kashmir",
    "Ladakh",
    "Puducherry",
    "Chandigarh",
    "Dadra and Nagar Haveli",
    "Daman and Diu",
    "Lakshadweep",
    "Andaman and Nicobar Islands",
];

/// Two-letter codes, matched only when written in upper case.
pub const STATE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("AP", "Andhra Pradesh"),
    ("AR", "Arunachal Pradesh"),
    ("AS", "Assam"),
    ("BR", "Bihar"),
    ("CG", "Chhattisgarh"),
    ("GA", "Goa"),
    ("GJ", "Gujarat"),
    ("HR", "Haryana"),
    ("HP", "Himachal Pradesh"),
    ("JH", "Jharkhand"),
    ("KA", "Karnataka"),
    ("KL", "Kerala"),
    ("MP", "Madhya Pradesh"),
    ("MH", "Maharashtra"),
    ("MN", "Manipur"),
    ("ML", "Meghalaya"),
    ("MZ", "Mizoram"),
    ("NL", "Nagaland"),
    ("OD", "Odisha"),
    ("PB", "Punjab"),
    ("RJ", "Rajasthan"),
    ("SK", "Sikkim"),
    ("TN", "Tamil Nadu"),
    ("TG", "Telangana"),
    ("TR", "Tripura"),
    ("UP", "Uttar Pradesh"),
    ("UK", "Uttarakhand"),
    ("WB", "West Bengal"),
    ("DL", "Delhi"),
    ("JK", "Jammu and Kashmir"),
    ("LA", "Ladakh"),
    ("PY", "Puducherry"),
];

pub const MAJOR_CROPS: &[&str] = &[
    "Rice",
    "Wheat",
    "Maize",
    "Bajra",
    "Jowar",
    "Barley",
    "Ragi",
    "Cotton",
    "Sugarcane",
    "Jute",
    "Tobacco",
    "Tea",
    "Coffee",
    "Coconut",
    "Groundnut",
    "Soybean",
    "Sunflower",
    "Rapeseed",
    "Mustard",
    "Potato",
    "Onion",
    "Tomato",
    "Pulses",
    "Chickpea",
    "Lentil",
    "Arhar",
    "Moong",
    "Urad",
    "Masoor",
    "Fruits",
    "Vegetables",
];

/// Category name (as typed, with `_` for spaces) and its member crops.
pub const CROP_CATEGORIES: &[(&str, &[&str])] = &[
    ("cereals", &["Rice", "Wheat", "Maize", "Bajra", "Jowar", "Barley", "Ragi"]),
    ("pulses", &["Chickpea", "Arhar", "Moong", "Urad", "Lentil", "Masoor"]),
    ("oilseeds", &["Groundnut", "Soybean", "Sunflower", "Rapeseed", "Mustard"]),
    ("cash_crops", &["Cotton", "Sugarcane", "Jute", "Tobacco", "Tea", "Coffee"]),
    ("horticulture", &["Fruits", "Vegetables", "Potato", "Onion", "Tomato", "Coconut"]),
];

/// Example questions shown by the CLI.
pub const SAMPLE_QUERIES: &[&str] = &[
    "Compare rainfall in Punjab and Haryana for last 5 years",
    "Top 3 crops produced in Maharashtra",
    "Rice production trend in West Bengal 2015-2020",
    "District with highest wheat production in UP",
    "What is the impact of rainfall on production in Punjab and Haryana?",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviations_resolve_to_known_states() {
        for (abbr, state) in STATE_ABBREVIATIONS {
            assert_eq!(abbr.len(), 2);
            assert!(INDIAN_STATES.contains(state), "{} -> {}", abbr, state);
        }
    }

    #[test]
    fn test_category_members_are_major_crops() {
        for (category, crops) in CROP_CATEGORIES {
            for crop in *crops {
                assert!(MAJOR_CROPS.contains(crop), "{} in {}", crop, category);
            }
        }
    }
}
