//! # Stop names
//!
//! The agency records each direction of travel through an intersection as a
//! separate stop, and names them from the point of view of the vehicle: the
//! inbound stop might be "Forbes Ave at Morewood Ave" while the outbound one is
//! "Forbes Ave opp Morewood Ave FS". [`normalize`] reduces both to the same
//! [`NameKey`]. [`standardize`] produces the shorter label shown to riders.

use std::fmt::{self, Display, Formatter};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Equality key for stop names. Only meaningful for comparison: it is never
/// shown to riders.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NameKey(String);

impl NameKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NameKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Words describing where the stop sits relative to the cross street.
const QUALIFIERS: &[&str] = &[
    "opp",
    "opposite",
    "past",
    "at",
    "nearside",
    "farside",
    "near-side",
    "far-side",
    "(nearside)",
    "(farside)",
    "(near-side)",
    "(far-side)",
];

// Street types, plus the FS/NS (far side/near side) abbreviations.
const STREET_TYPES: &[&str] = &["ave", "blvd", "st", "rd", "dr", "pl", "way", "fs", "ns"];

/// Reduce a raw stop name to its grouping key.
///
/// Positional qualifiers and street types are dropped, the remaining words are
/// case-folded and joined without whitespace.
#[must_use]
pub fn normalize(raw: &str) -> NameKey {
    let lowered = raw.trim().to_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();
    let words = KeyGuard::apply_all(words);

    let key: String = words
        .into_iter()
        .map(|word| word.trim_end_matches(['.', ',']))
        .filter(|word| !QUALIFIERS.contains(word) && !STREET_TYPES.contains(word))
        .collect();

    if key.is_empty() {
        // a name made only of qualifiers still needs a stable key
        return NameKey(lowered.split_whitespace().collect());
    }
    NameKey(key)
}

/// Special cases applied to the lowercased words of a name before qualifiers
/// are dropped, in declaration order.
#[derive(Debug, Clone, Copy)]
enum KeyGuard {
    /// "Wood Street Station stop A" and "Wood Street Station stop B" are
    /// platforms of one station. Applies when the name mentions both "station"
    /// and "stop"; everything after the word "station" is discarded. Names
    /// where "station" is not a word of its own are left alone.
    StationPlatform,
}

impl KeyGuard {
    const ORDER: [Self; 1] = [Self::StationPlatform];

    fn apply_all(words: Vec<&str>) -> Vec<&str> {
        Self::ORDER.iter().fold(words, |words, guard| guard.apply(words))
    }

    fn apply(self, mut words: Vec<&str>) -> Vec<&str> {
        match self {
            Self::StationPlatform => {
                let mentions = |needle: &str| words.iter().any(|w| w.contains(needle));
                if mentions("station")
                    && mentions("stop")
                    && let Some(pos) = words.iter().position(|w| *w == "station")
                {
                    words.truncate(pos + 1);
                }
                words
            }
        }
    }
}

static CONJUNCTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:opp|past|at)\s+").expect("conjunction regex"));

static REDUNDANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\s+(?:Ave|Blvd|St|Rd|Dr|Pl|Way|FS|NS)(?:\s+|$))|(?:\(farside\)|\(nearside\))")
        .expect("redundant token regex")
});

static AVENUE_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Ave [A-Z](?:\s|$)").expect("avenue letter regex"));

/// Produce the label shown to riders for a raw stop name.
///
/// "Forbes Ave opp Morewood Ave" becomes "Forbes + Morewood".
#[must_use]
pub fn standardize(raw: &str) -> String {
    let name = raw.trim();
    let rule = DisplayRule::ORDER.into_iter().find(|rule| rule.applies(name));
    rule.unwrap_or(DisplayRule::Intersection).rewrite(name)
}

/// Display rules, checked in declaration order. The first that applies wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DisplayRule {
    /// Names mentioning a station ("Steel Plaza Station") are already display
    /// ready and are left as they are.
    Station,

    /// Route-numbered stops ("Blvd of the Allies at #1200") read better with
    /// " @ " than with " + ". Checked before lettered avenues.
    RouteNumbered,

    /// Lettered avenues ("Ave A" in Munhall) would lose their letter's street
    /// type, so names containing one are left as they are.
    AvenueLetter,

    /// Everything else is a plain intersection: " + " between the streets.
    Intersection,
}

impl DisplayRule {
    const ORDER: [Self; 4] = [Self::Station, Self::RouteNumbered, Self::AvenueLetter, Self::Intersection];

    fn applies(self, name: &str) -> bool {
        match self {
            Self::Station => name.to_lowercase().contains("station"),
            Self::AvenueLetter => AVENUE_LETTER.is_match(name),
            Self::RouteNumbered => name.contains('#'),
            Self::Intersection => true,
        }
    }

    fn rewrite(self, name: &str) -> String {
        let joined = match self {
            Self::Station | Self::AvenueLetter => return name.to_string(),
            Self::RouteNumbered => CONJUNCTION.replace_all(name, " @ "),
            Self::Intersection => CONJUNCTION.replace_all(name, " + "),
        };
        REDUNDANT.replace_all(&joined, " ").trim().to_string()
    }
}
