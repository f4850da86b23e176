use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::features::{coerce_input, FeatureField, FeatureVector};

/// Header names treated as a row identifier.
const ID_COLUMNS: [&str; 4] = ["", "Id", "id", "Unnamed: 0"];

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("failed to read applicant file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid applicant CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("applicant CSV has no recognised feature columns")]
    NoFeatureColumns,
}

/// One applicant read from a batch file.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantRow {
    pub id: String,
    pub features: FeatureVector,
}

/// Reads applicant batches laid out like the credit training export.
///
/// Columns may use either the wire names or the dataset spellings. Unknown columns are
/// ignored, missing feature columns read as zero, unparseable cells as zero.
pub struct ApplicantCsvReader;

impl ApplicantCsvReader {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Vec<ApplicantRow>, IntakeError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ApplicantRow>, IntakeError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let mut columns: Vec<(usize, FeatureField)> = Vec::new();
        let mut id_column = None;
        for (index, header) in headers.iter().enumerate() {
            if let Some(field) = FeatureField::from_name(header) {
                if columns.iter().all(|(_, existing)| *existing != field) {
                    columns.push((index, field));
                }
            } else if id_column.is_none() && ID_COLUMNS.contains(&header) {
                id_column = Some(index);
            }
        }

        if columns.is_empty() {
            return Err(IntakeError::NoFeatureColumns);
        }

        let mut rows = Vec::new();
        for (row_number, record) in csv_reader.records().enumerate() {
            let record = record?;
            let mut features = FeatureVector::default();
            for (index, field) in &columns {
                let raw = record.get(*index).unwrap_or_default();
                features = features.with(*field, coerce_input(raw));
            }

            let id = id_column
                .and_then(|index| record.get(index))
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("row-{}", row_number + 1));

            rows.push(ApplicantRow { id, features });
        }

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn reads_training_export_layout() {
        let csv = "\
,SeriousDlqin2yrs,RevolvingUtilizationOfUnsecuredLines,age,NumberOfTime30-59DaysPastDueNotWorse,DebtRatio,MonthlyIncome,NumberOfOpenCreditLinesAndLoans,NumberOfTimes90DaysLate,NumberRealEstateLoansOrLines,NumberOfTime60-89DaysPastDueNotWorse,NumberOfDependents
1,1,0.766126609,45,2,0.802982129,9120,13,0,6,0,2
2,0,0.957151019,40,0,0.121876201,NA,4,0,0,0,NA
";
        let rows = ApplicantCsvReader::from_reader(Cursor::new(csv)).expect("csv parses");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "1");
        assert_eq!(rows[0].features.late_30_59_days, 2.0);
        assert_eq!(rows[0].features.monthly_income, 9120.0);
        assert_eq!(rows[1].features.monthly_income, 0.0);
        assert_eq!(rows[1].features.dependents, 0.0);
        assert_eq!(rows[1].features.age, 40.0);
    }

    #[test]
    fn numbers_rows_without_id_column() {
        let csv = "DebtRatio,NumberOfTimes90DaysLate\n0.55,1\n0.1,0\n";
        let rows = ApplicantCsvReader::from_reader(Cursor::new(csv)).expect("csv parses");

        assert_eq!(rows[0].id, "row-1");
        assert_eq!(rows[1].id, "row-2");
        assert_eq!(rows[0].features.debt_ratio, 0.55);
        assert_eq!(rows[0].features.age, 0.0);
    }

    #[test]
    fn rejects_files_without_feature_columns() {
        let csv = "name,score\nalice,1\n";
        let err = ApplicantCsvReader::from_reader(Cursor::new(csv)).expect_err("no features");
        assert!(matches!(err, IntakeError::NoFeatureColumns));
    }
}
