use std::collections::{HashMap, HashSet};

use tracing::info;

use crate::domain::entities::attendance::{
    ActiveSectionSet, AttendanceMark, AttendanceReport, AttendanceSummary, InputMeaning,
    RollToken,
};
use crate::domain::entities::dataset::{ColumnValue, Dataset};
use crate::domain::errors::AttendanceError;
use crate::domain::roster::SectionRoster;

pub const PRESENT_LABEL: &str = "Present";
pub const ABSENT_LABEL: &str = "Absent";

/// Splits on any run of non-alphanumeric characters and upper-cases.
pub fn tokenize(input: &str) -> Vec<String> {
    input
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(|token| token.to_uppercase())
        .collect()
}

pub struct AttendanceResolver<'r> {
    roster: &'r SectionRoster,
    meaning: InputMeaning,
}

impl<'r> AttendanceResolver<'r> {
    pub fn new(roster: &'r SectionRoster, meaning: InputMeaning) -> Self {
        Self { roster, meaning }
    }

    pub fn meaning(&self) -> InputMeaning {
        self.meaning
    }

    pub fn set_meaning(&mut self, meaning: InputMeaning) {
        self.meaning = meaning;
    }

    /// Marks every roll of the active sections. Tokens from other sections
    /// and unknown tokens are reported, never scored.
    pub fn resolve(
        &self,
        input: &str,
        active: &ActiveSectionSet,
    ) -> Result<AttendanceReport, AttendanceError> {
        if active.is_empty() {
            return Err(AttendanceError::EmptyActiveSectionSet);
        }

        let mut listed: HashSet<RollToken> = HashSet::new();
        let mut summary = AttendanceSummary::default();
        for raw in tokenize(input) {
            let token = RollToken::new(&raw);
            match self.roster.section_of(&token) {
                Some(section) if active.contains(&section) => {
                    if !listed.insert(token.clone()) && !summary.duplicates.contains(&token) {
                        summary.duplicates.push(token);
                    }
                }
                Some(section) => {
                    if !summary.foreign.iter().any(|(seen, _)| seen == &token) {
                        summary.foreign.push((token, section));
                    }
                }
                None => {
                    if !summary.unknown.iter().any(|seen| seen == token.as_str()) {
                        summary.unknown.push(token.as_str().to_string());
                    }
                }
            }
        }

        let marks: Vec<AttendanceMark> = active
            .iter()
            .flat_map(|section| {
                self.roster
                    .members(*section)
                    .iter()
                    .map(move |roll| (*section, roll))
            })
            .map(|(section, roll)| {
                let is_listed = listed.contains(roll);
                let present = match self.meaning {
                    InputMeaning::MarksPresent => is_listed,
                    InputMeaning::MarksAbsent => !is_listed,
                };
                AttendanceMark {
                    roll: roll.clone(),
                    section,
                    present,
                }
            })
            .collect();

        summary.present = marks.iter().filter(|mark| mark.present).count();
        summary.absent = marks.len() - summary.present;
        info!(
            present = summary.present,
            absent = summary.absent,
            foreign = summary.foreign.len(),
            unknown = summary.unknown.len(),
            "attendance resolved"
        );

        Ok(AttendanceReport {
            meaning: self.meaning,
            sections: active.clone(),
            marks,
            summary,
        })
    }
}

/// Writes the marks into `column`, matching rows by the roll number column.
/// Rows without a mark keep what the column already holds, or get an empty
/// cell when the column is new.
pub fn merge_marks(
    dataset: &Dataset,
    report: &AttendanceReport,
    column: &str,
) -> Result<Dataset, AttendanceError> {
    let roll_idx = dataset
        .manifest()
        .roll_column()
        .ok_or(AttendanceError::MissingRollColumn)?;
    let existing_idx = dataset.manifest().position(column);
    let by_roll: HashMap<&RollToken, bool> = report
        .marks
        .iter()
        .map(|mark| (&mark.roll, mark.present))
        .collect();

    let values = dataset
        .records()
        .iter()
        .map(|record| {
            let roll = RollToken::new(record.text(roll_idx));
            match by_roll.get(&roll) {
                Some(true) => ColumnValue::Text(PRESENT_LABEL.to_string()),
                Some(false) => ColumnValue::Text(ABSENT_LABEL.to_string()),
                None => existing_idx
                    .and_then(|idx| record.get(idx).cloned())
                    .unwrap_or_else(ColumnValue::empty),
            }
        })
        .collect();

    Ok(dataset.with_column(column, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::attendance::Section;
    use crate::domain::entities::dataset::{HeaderManifest, Record};

    fn roster() -> &'static SectionRoster {
        SectionRoster::standard().expect("standard roster should build")
    }

    fn sections(list: &[Section]) -> ActiveSectionSet {
        list.iter().copied().collect()
    }

    fn roll(value: &str) -> RollToken {
        RollToken::new(value)
    }

    #[test]
    fn tokenize_splits_on_any_separator_run() {
        assert_eq!(
            tokenize(" 3, 7\nle2;;A5\t\t 12 "),
            vec!["3", "7", "LE2", "A5", "12"]
        );
        assert!(tokenize(" ,\n ").is_empty());
    }

    #[test]
    fn marks_absent_lists_absentees_and_everyone_else_present() {
        let resolver = AttendanceResolver::new(roster(), InputMeaning::MarksAbsent);

        let report = resolver
            .resolve("3, 7 LE2 200", &sections(&[Section::A]))
            .expect("should resolve");

        assert_eq!(report.marks.len(), 72);
        let absent: Vec<&str> = report.absentees().map(RollToken::as_str).collect();
        assert_eq!(absent, vec!["3", "7", "LE2"]);
        assert_eq!(report.summary.present, 69);
        assert_eq!(report.summary.absent, 3);
        assert_eq!(report.summary.unknown, vec!["200".to_string()]);
        assert!(report.mark_for(&roll("200")).is_none());
    }

    #[test]
    fn marks_present_inverts_the_meaning() {
        let resolver = AttendanceResolver::new(roster(), InputMeaning::MarksPresent);

        let report = resolver
            .resolve("66 a0", &sections(&[Section::B]))
            .expect("should resolve");

        assert_eq!(report.summary.present, 2);
        assert_eq!(report.summary.absent, 68);
        assert_eq!(report.mark_for(&roll("A0")).map(|m| m.present), Some(true));
        assert_eq!(report.mark_for(&roll("67")).map(|m| m.present), Some(false));
    }

    #[test]
    fn empty_input_with_marks_absent_means_everyone_present() {
        let resolver = AttendanceResolver::new(roster(), InputMeaning::MarksAbsent);

        let report = resolver
            .resolve("", &sections(&[Section::A, Section::C]))
            .expect("should resolve");

        assert_eq!(report.marks.len(), 144);
        assert_eq!(report.summary.absent, 0);
    }

    #[test]
    fn foreign_tokens_are_reported_with_their_section() {
        let resolver = AttendanceResolver::new(roster(), InputMeaning::MarksAbsent);

        let report = resolver
            .resolve("5, D3, 70, D3", &sections(&[Section::A]))
            .expect("should resolve");

        assert_eq!(
            report.summary.foreign,
            vec![(roll("D3"), Section::C), (roll("70"), Section::B)]
        );
        assert_eq!(report.summary.absent, 1);
        assert!(report.marks.iter().all(|mark| mark.section == Section::A));
    }

    #[test]
    fn feedback_counts_foreign_and_unknown_tokens() {
        let resolver = AttendanceResolver::new(roster(), InputMeaning::MarksAbsent);

        let report = resolver
            .resolve("5 D3 70 ZZ9 200", &sections(&[Section::A]))
            .expect("should resolve");
        let feedback = report.feedback_lines();

        assert_eq!(
            feedback[0],
            "Sections A (listed rolls marked absent): 71 present, 1 absent"
        );
        assert_eq!(
            feedback[1],
            "Not in the selected sections (2), ignored: D3 (section C), 70 (section B)"
        );
        assert_eq!(feedback[2], "Unknown roll numbers (2), ignored: ZZ9, 200");
    }

    #[test]
    fn duplicates_are_scored_once_and_reported() {
        let resolver = AttendanceResolver::new(roster(), InputMeaning::MarksAbsent);

        let report = resolver
            .resolve("4 4 4 5", &sections(&[Section::A]))
            .expect("should resolve");

        assert_eq!(report.summary.absent, 2);
        assert_eq!(report.summary.duplicates, vec![roll("4")]);
        let feedback = report.feedback_lines().join("\n");
        assert!(feedback.contains("Entered more than once: 4"), "{feedback}");
    }

    #[test]
    fn empty_section_set_is_refused() {
        let resolver = AttendanceResolver::new(roster(), InputMeaning::MarksAbsent);

        let result = resolver.resolve("1 2 3", &ActiveSectionSet::new());

        assert_eq!(result, Err(AttendanceError::EmptyActiveSectionSet));
    }

    #[test]
    fn merge_marks_writes_column_by_roll_number() {
        let dataset = Dataset::new(
            HeaderManifest::from_raw(["RollNo", "Name"]),
            vec![
                Record::new(vec![ColumnValue::from_cell("3"), ColumnValue::from_cell("Ann")]),
                Record::new(vec![ColumnValue::from_cell("4"), ColumnValue::from_cell("Bob")]),
                Record::new(vec![ColumnValue::from_cell("D1"), ColumnValue::from_cell("Cid")]),
            ],
        );
        let report = AttendanceResolver::new(roster(), InputMeaning::MarksAbsent)
            .resolve("3", &sections(&[Section::A]))
            .expect("should resolve");

        let merged = merge_marks(&dataset, &report, "Attendance").expect("roll column exists");

        assert_eq!(merged.manifest().columns(), &["RollNo", "Name", "Attendance"]);
        let column: Vec<&str> = merged.records().iter().map(|r| r.text(2)).collect();
        assert_eq!(column, vec![ABSENT_LABEL, PRESENT_LABEL, ""]);
    }

    #[test]
    fn merge_marks_keeps_earlier_marks_for_unmarked_rows() {
        let dataset = Dataset::new(
            HeaderManifest::from_raw(["RollNo", "Name"]),
            vec![
                Record::new(vec![ColumnValue::from_cell("3"), ColumnValue::from_cell("Ann")]),
                Record::new(vec![ColumnValue::from_cell("70"), ColumnValue::from_cell("Bob")]),
            ],
        );
        let resolver = AttendanceResolver::new(roster(), InputMeaning::MarksAbsent);
        let section_a = resolver
            .resolve("3", &sections(&[Section::A]))
            .expect("should resolve");
        let section_b = resolver
            .resolve("", &sections(&[Section::B]))
            .expect("should resolve");

        let first = merge_marks(&dataset, &section_a, "Attendance").expect("roll column exists");
        let second = merge_marks(&first, &section_b, "Attendance").expect("roll column exists");

        let first_column: Vec<&str> = first.records().iter().map(|r| r.text(2)).collect();
        assert_eq!(first_column, vec![ABSENT_LABEL, ""]);
        let second_column: Vec<&str> = second.records().iter().map(|r| r.text(2)).collect();
        assert_eq!(second_column, vec![ABSENT_LABEL, PRESENT_LABEL]);
        assert_eq!(second.manifest().len(), 3);
    }

    #[test]
    fn merge_marks_requires_roll_column() {
        let dataset = Dataset::new(
            HeaderManifest::from_raw(["Name"]),
            vec![Record::new(vec![ColumnValue::from_cell("Ann")])],
        );
        let report = AttendanceResolver::new(roster(), InputMeaning::MarksAbsent)
            .resolve("", &sections(&[Section::A]))
            .expect("should resolve");

        let result = merge_marks(&dataset, &report, "Attendance");

        assert_eq!(result.map(|_| ()), Err(AttendanceError::MissingRollColumn));
    }
}
