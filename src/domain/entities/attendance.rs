use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A roll designation, stored trimmed and upper-cased. Compared as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RollToken(String);

impl RollToken {
    pub fn new(raw: &str) -> Self {
        RollToken(raw.trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RollToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    A,
    B,
    C,
}

impl Section {
    pub const ALL: [Section; 3] = [Section::A, Section::B, Section::C];

    pub fn label(self) -> &'static str {
        match self {
            Section::A => "A",
            Section::B => "B",
            Section::C => "C",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Section::A),
            "B" => Ok(Section::B),
            "C" => Ok(Section::C),
            other => Err(format!("unknown section: {other}")),
        }
    }
}

pub type ActiveSectionSet = BTreeSet<Section>;

/// How the free-text roll list is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMeaning {
    /// Listed rolls are present, everyone else in the active sections absent.
    MarksPresent,
    /// Listed rolls are absent, everyone else in the active sections present.
    #[default]
    MarksAbsent,
}

impl InputMeaning {
    pub fn label(self) -> &'static str {
        match self {
            InputMeaning::MarksPresent => "listed rolls marked present",
            InputMeaning::MarksAbsent => "listed rolls marked absent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceMark {
    pub roll: RollToken,
    pub section: Section,
    pub present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttendanceSummary {
    pub present: usize,
    pub absent: usize,
    /// Rolls belonging to a section that was not selected.
    pub foreign: Vec<(RollToken, Section)>,
    /// Tokens that match no section at all, as typed after normalization.
    pub unknown: Vec<String>,
    pub duplicates: Vec<RollToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceReport {
    pub meaning: InputMeaning,
    pub sections: ActiveSectionSet,
    pub marks: Vec<AttendanceMark>,
    pub summary: AttendanceSummary,
}

impl AttendanceReport {
    pub fn absentees(&self) -> impl Iterator<Item = &RollToken> {
        self.marks
            .iter()
            .filter(|mark| !mark.present)
            .map(|mark| &mark.roll)
    }

    #[cfg(test)]
    pub fn mark_for(&self, roll: &RollToken) -> Option<&AttendanceMark> {
        self.marks.iter().find(|mark| &mark.roll == roll)
    }

    pub fn feedback_lines(&self) -> Vec<String> {
        let sections = self
            .sections
            .iter()
            .map(|section| section.label())
            .collect::<Vec<_>>()
            .join(", ");
        let mut lines = vec![format!(
            "Sections {sections} ({}): {} present, {} absent",
            self.meaning.label(),
            self.summary.present,
            self.summary.absent
        )];

        if !self.summary.foreign.is_empty() {
            let listed = self
                .summary
                .foreign
                .iter()
                .map(|(roll, section)| format!("{roll} (section {section})"))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!(
                "Not in the selected sections ({}), ignored: {listed}",
                self.summary.foreign.len()
            ));
        }
        if !self.summary.unknown.is_empty() {
            lines.push(format!(
                "Unknown roll numbers ({}), ignored: {}",
                self.summary.unknown.len(),
                self.summary.unknown.join(", ")
            ));
        }
        if !self.summary.duplicates.is_empty() {
            let listed = self
                .summary
                .duplicates
                .iter()
                .map(RollToken::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("Entered more than once: {listed}"));
        }
        lines
    }
}
