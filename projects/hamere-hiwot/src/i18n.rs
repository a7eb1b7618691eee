//! Flat key → label translation table (English and Amharic).

use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Am,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Language::En),
            "am" => Ok(Language::Am),
            _ => Err(format!("Unsupported language: {}", s)),
        }
    }
}

const EN: &[(&str, &str)] = &[
    ("dashboard", "Dashboard"),
    ("members", "Members"),
    ("allMembers", "All Members"),
    ("registerMember", "Register Member"),
    ("memberTransfers", "Member Transfers"),
    ("classes", "Classes"),
    ("finance", "Finance"),
    ("departments", "Departments"),
    ("reports", "Reports"),
    ("aboutUs", "About Us"),
    ("settings", "Settings"),
    ("present", "Present"),
    ("absent", "Absent"),
    ("active", "Active"),
    ("transferred", "Transferred"),
    ("qedamay", "Qedamay"),
    ("kalay", "Kalay"),
    ("salsay", "Salsay"),
    ("rabay", "Rabay"),
];

const AM: &[(&str, &str)] = &[
    ("dashboard", "ዳሽቦርድ"),
    ("members", "አባላት"),
    ("allMembers", "ሁሉም አባላት"),
    ("registerMember", "አባል መመዝገብ"),
    ("memberTransfers", "የአባላት ዝውውር"),
    ("classes", "ክፍሎች"),
    ("finance", "ፋይናንስ"),
    ("departments", "ክፍላት"),
    ("reports", "ሪፖርቶች"),
    ("aboutUs", "ስለ እኛ"),
    ("settings", "ቅንብሮች"),
    ("present", "ተገኝቷል"),
    ("absent", "አልተገኘም"),
    ("active", "ንቁ"),
    ("transferred", "የተዛወረ"),
    ("qedamay", "ቀዳማይ"),
    ("kalay", "ካልዓይ"),
    ("salsay", "ሣልሳይ"),
    ("rabay", "ራብዓይ"),
];

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Label for `key`; falls back to English, then to the key itself.
pub fn translate<'a>(lang: Language, key: &'a str) -> &'a str {
    let table = match lang {
        Language::En => EN,
        Language::Am => AM,
    };
    lookup(table, key).or_else(|| lookup(EN, key)).unwrap_or(key)
}
