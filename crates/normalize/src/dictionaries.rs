//! Built-in dictionaries for healthcare, disclosure and corporate ledgers.
//!
//! These are defaults only; every list can be replaced through
//! [`NormalizeConfig`](crate::NormalizeConfig).

/// Abbreviation → expansion pairs. Keys may span several tokens
/// (`"med ctr"`); the longest key wins at each position.
pub const DEFAULT_ABBREVIATIONS: &[(&str, &str)] = &[
    ("assn", "association"),
    ("assoc", "association"),
    ("bros", "brothers"),
    ("cntr", "center"),
    ("coll", "college"),
    ("ctr", "center"),
    ("dept", "department"),
    ("ft", "fort"),
    ("grp", "group"),
    ("hlth", "health"),
    ("hosp", "hospital"),
    ("inst", "institute"),
    ("intl", "international"),
    ("lab", "laboratory"),
    ("labs", "laboratories"),
    ("med ctr", "medical center"),
    ("mfg", "manufacturing"),
    ("mgmt", "management"),
    ("mt", "mount"),
    ("natl", "national"),
    ("pharm", "pharmacy"),
    ("st", "saint"),
    ("ste", "sainte"),
    ("svc", "services"),
    ("svcs", "services"),
    ("sys", "systems"),
    ("tech", "technology"),
    ("univ", "university"),
];

/// Corporate / legal-form suffixes, removed only as trailing tokens.
pub const DEFAULT_SUFFIXES: &[&str] = &[
    "bv",
    "co",
    "company",
    "corp",
    "corporation",
    "gmbh",
    "inc",
    "incorporated",
    "limited",
    "llc",
    "llp",
    "lp",
    "ltd",
    "pc",
    "plc",
    "pllc",
    "pty",
    "sarl",
];

/// Tokens dropped anywhere in the name.
///
/// Besides function words this includes generic facility descriptors that
/// vary freely between ledgers ("Medical Center" vs "Hospital").
pub const DEFAULT_STOPWORDS: &[&str] = &[
    "a", "an", "and", "at", "by", "center", "centre", "for", "in", "medical", "of", "on",
    "the", "to", "with",
];
