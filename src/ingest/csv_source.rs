//! CSV reading and row projection

use crate::error::{PipelineError, Result};
use crate::pipeline::ResolvedTable;
use crate::record::Record;
use csv::StringRecord;
use std::path::{Path, PathBuf};

/// A whole CSV file held in memory
#[derive(Debug)]
pub(crate) struct CsvSource {
    path: PathBuf,
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl CsvSource {
    pub(crate) fn read(path: &Path) -> Result<Self> {
        let csv_err = |source: csv::Error| PipelineError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_path(path)
            .map_err(csv_err)?;

        let headers = reader.headers().map_err(csv_err)?.clone();
        let mut rows = Vec::new();
        for result in reader.records() {
            rows.push(result.map_err(csv_err)?);
        }

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    /// Project every row onto the attributes of `table`
    ///
    /// Columns the table does not declare are ignored. An empty cell leaves a
    /// defaulted or nullable attribute to its default; for a required
    /// attribute it is an error. Row numbers in errors count data rows from 1.
    pub(crate) fn project(&self, table: &ResolvedTable) -> Result<Vec<Record>> {
        let mut layout = Vec::with_capacity(table.def.columns.len());
        for column in table.def.columns {
            match self.headers.iter().position(|h| h == column.name) {
                Some(idx) => layout.push((column, idx)),
                None if column.is_required() => {
                    return Err(PipelineError::malformed(
                        &table.full_name,
                        self.origin(),
                        None,
                        format!("missing required column '{}'", column.name),
                    ))
                }
                None => {}
            }
        }

        let mut records = Vec::with_capacity(self.rows.len());
        for (idx, row) in self.rows.iter().enumerate() {
            let row_number = idx + 1;
            let mut record = Record::new();
            for (column, position) in &layout {
                let cell = row.get(*position).unwrap_or("");
                if cell.is_empty() {
                    if column.is_required() {
                        return Err(PipelineError::malformed(
                            &table.full_name,
                            self.origin(),
                            Some(row_number),
                            format!("empty value for required attribute '{}'", column.name),
                        ));
                    }
                    continue;
                }
                let value = column.ty.parse(cell).map_err(|reason| {
                    PipelineError::malformed(
                        &table.full_name,
                        self.origin(),
                        Some(row_number),
                        format!("{}: {}", column.name, reason),
                    )
                })?;
                record.set(column.name, value);
            }
            records.push(record);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;
    use crate::record::Value;
    use crate::WorkflowConfig;
    use std::io::Write;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_project_ignores_extra_columns() {
        let pipeline = Pipeline::compose(&WorkflowConfig::in_memory("t_")).unwrap();
        let file = csv_file(&[
            "subject,session_dir,session_id,session_datetime",
            "subject3,subject3/opto_session1/,1,2022-04-04 12:13:14",
        ]);
        let source = CsvSource::read(file.path()).unwrap();
        let table = pipeline.registry().table("session", "session").unwrap();

        let records = source.project(table).unwrap();
        assert_eq!(source.len(), 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].len(), 3);
        assert_eq!(records[0].get("session_id"), Some(&Value::Int(1)));
        assert_eq!(records[0].get("session_dir"), None);
    }

    #[test]
    fn test_project_empty_optional_cell_uses_default() {
        let pipeline = Pipeline::compose(&WorkflowConfig::in_memory("t_")).unwrap();
        let file = csv_file(&[
            "subject,sex,subject_birth_date,subject_description",
            "subject3,F,2022-03-03,",
        ]);
        let source = CsvSource::read(file.path()).unwrap();
        let table = pipeline.registry().table("subject", "subject").unwrap();

        let records = source.project(table).unwrap();
        assert_eq!(records[0].get("subject_description"), None);
        assert_eq!(
            records[0].get("subject_birth_date"),
            Some(&Value::from("2022-03-03"))
        );
    }

    #[test]
    fn test_project_missing_header() {
        let pipeline = Pipeline::compose(&WorkflowConfig::in_memory("t_")).unwrap();
        let file = csv_file(&["subject,session_id", "subject3,1"]);
        let source = CsvSource::read(file.path()).unwrap();
        let table = pipeline.registry().table("session", "session").unwrap();

        let err = source.project(table).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedRecord { row: None, ref reason, .. }
                if reason.contains("session_datetime")
        ));
    }

    #[test]
    fn test_project_bad_value_reports_row() {
        let pipeline = Pipeline::compose(&WorkflowConfig::in_memory("t_")).unwrap();
        let file = csv_file(&[
            "subject,sex,subject_birth_date",
            "subject3,F,2022-03-03",
            "subject4,X,2022-03-03",
        ]);
        let source = CsvSource::read(file.path()).unwrap();
        let table = pipeline.registry().table("subject", "subject").unwrap();

        let err = source.project(table).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedRecord { row: Some(2), ref reason, .. } if reason.starts_with("sex")
        ));
    }

    #[test]
    fn test_read_missing_file() {
        let err = CsvSource::read(Path::new("/nonexistent/subjects.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::Csv { .. }));
    }
}
