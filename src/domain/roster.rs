use std::collections::HashMap;
use std::sync::OnceLock;

use tracing::info;

use crate::domain::entities::attendance::{RollToken, Section};
use crate::domain::errors::RosterError;

static STANDARD: OnceLock<Result<SectionRoster, RosterError>> = OnceLock::new();

/// Fixed partition of roll tokens into sections A, B and C, with a reverse
/// index for membership lookups.
#[derive(Debug, Clone)]
pub struct SectionRoster {
    sections: Vec<(Section, Vec<RollToken>)>,
    index: HashMap<RollToken, Section>,
}

impl SectionRoster {
    /// Builds a roster, failing if any token is listed twice.
    pub fn from_sections(
        sections: Vec<(Section, Vec<RollToken>)>,
    ) -> Result<Self, RosterError> {
        let mut index = HashMap::new();
        for (section, tokens) in &sections {
            for token in tokens {
                if let Some(first) = index.insert(token.clone(), *section) {
                    return Err(RosterError::DuplicateToken {
                        token: token.to_string(),
                        first,
                        second: *section,
                    });
                }
            }
        }
        Ok(Self { sections, index })
    }

    /// The process-wide roster, built on first use.
    pub fn standard() -> Result<&'static SectionRoster, RosterError> {
        STANDARD
            .get_or_init(|| {
                let roster = SectionRoster::from_sections(standard_layout())?;
                info!(rolls = roster.len(), "section roster ready");
                Ok(roster)
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    pub fn section_of(&self, roll: &RollToken) -> Option<Section> {
        self.index.get(roll).copied()
    }

    pub fn members(&self, section: Section) -> &[RollToken] {
        self.sections
            .iter()
            .find(|(candidate, _)| *candidate == section)
            .map(|(_, tokens)| tokens.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

fn numbered(range: std::ops::RangeInclusive<u32>) -> impl Iterator<Item = RollToken> {
    range.map(|n| RollToken::new(&n.to_string()))
}

fn lateral_entry(range: std::ops::RangeInclusive<u32>) -> impl Iterator<Item = RollToken> {
    range.map(|n| RollToken::new(&format!("LE{n}")))
}

fn lettered<'a>(
    prefixes: &'a [char],
    digits: std::ops::RangeInclusive<u32>,
) -> impl Iterator<Item = RollToken> + 'a {
    prefixes.iter().flat_map(move |prefix| {
        digits
            .clone()
            .map(move |digit| RollToken::new(&format!("{prefix}{digit}")))
    })
}

pub fn standard_layout() -> Vec<(Section, Vec<RollToken>)> {
    let section_a = numbered(1..=65).chain(lateral_entry(1..=7)).collect();
    let section_b = numbered(66..=99)
        .chain(lettered(&['A', 'B', 'C'], 0..=9))
        .chain(lateral_entry(8..=13))
        .collect();
    let section_c = lettered(&['D', 'E', 'F', 'G', 'H', 'I'], 0..=9)
        .chain(lettered(&['J'], 0..=5))
        .chain(lateral_entry(14..=19))
        .collect();

    vec![
        (Section::A, section_a),
        (Section::B, section_b),
        (Section::C, section_c),
    ]
}
