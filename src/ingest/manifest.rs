//! Ingestion manifests
//!
//! A manifest pairs CSV files with the tables they feed, in the order the
//! tables must be filled. One file usually feeds several tables; each table
//! picks the columns it needs from the shared header.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Named ingestion stages, in the order `ingest_all` runs them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Subjects,
    Sessions,
    Events,
    Opto,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Subjects, Stage::Sessions, Stage::Events, Stage::Opto];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Subjects => "subjects",
            Stage::Sessions => "sessions",
            Stage::Events => "events",
            Stage::Opto => "opto",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "subjects" | "subject" => Ok(Stage::Subjects),
            "sessions" | "session" => Ok(Stage::Sessions),
            "events" | "event" => Ok(Stage::Events),
            "opto" | "optogenetics" => Ok(Stage::Opto),
            _ => Err(format!(
                "unknown stage '{}', expected one of: subjects, sessions, events, opto",
                s
            )),
        }
    }
}

/// Behaviour-recording CSV inputs of the events stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCsvPaths {
    pub recordings: PathBuf,
    pub blocks: PathBuf,
    pub trials: PathBuf,
    pub events: PathBuf,
}

/// CSV inputs of the optogenetics stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptoCsvPaths {
    pub waveforms: PathBuf,
    pub surgeries: PathBuf,
    pub sessions: PathBuf,
    pub events: PathBuf,
}

/// Every CSV input of `ingest_all`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDataPaths {
    pub subjects: PathBuf,
    pub sessions: PathBuf,
    pub events: EventCsvPaths,
    pub opto: OptoCsvPaths,
}

impl UserDataPaths {
    /// Default file names under `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            subjects: dir.join("subjects.csv"),
            sessions: dir.join("sessions.csv"),
            events: EventCsvPaths {
                recordings: dir.join("behavior_recordings.csv"),
                blocks: dir.join("blocks.csv"),
                trials: dir.join("trials.csv"),
                events: dir.join("events.csv"),
            },
            opto: OptoCsvPaths {
                waveforms: dir.join("opto_waveforms.csv"),
                surgeries: dir.join("opto_surgeries.csv"),
                sessions: dir.join("opto_sessions.csv"),
                events: dir.join("opto_events.csv"),
            },
        }
    }
}

/// One `(file, table)` pair of a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ManifestEntry {
    pub file: PathBuf,
    pub namespace: &'static str,
    pub table: &'static str,
}

/// Ordered list of `(file, table)` pairs ingested together
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub stage: Stage,
    pub entries: Vec<ManifestEntry>,
    /// Let the stage fill imported tables and their parts
    pub allow_direct_insert: bool,
}

impl Manifest {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            entries: Vec::new(),
            allow_direct_insert: false,
        }
    }

    /// Append one table fed by `file`
    pub fn entry(mut self, file: &Path, namespace: &'static str, table: &'static str) -> Self {
        self.entries.push(ManifestEntry {
            file: file.to_path_buf(),
            namespace,
            table,
        });
        self
    }

    /// Append several tables fed by the same `file`, in order
    pub fn entries(mut self, file: &Path, tables: &[(&'static str, &'static str)]) -> Self {
        for &(namespace, table) in tables {
            self = self.entry(file, namespace, table);
        }
        self
    }

    pub fn subjects(subjects_csv: &Path) -> Self {
        Self::new(Stage::Subjects).entry(subjects_csv, "subject", "subject")
    }

    pub fn sessions(sessions_csv: &Path) -> Self {
        Self::new(Stage::Sessions).entry(sessions_csv, "session", "session")
    }

    /// Recordings, blocks, trials and events; fills imported tables directly
    pub fn events(paths: &EventCsvPaths) -> Self {
        let mut manifest = Self::new(Stage::Events)
            .entries(
                &paths.recordings,
                &[("event", "behavior_recording"), ("event", "behavior_recording__file")],
            )
            .entries(&paths.blocks, &[("trial", "block"), ("trial", "block__attribute")])
            .entries(
                &paths.trials,
                &[
                    ("trial", "trial_type"),
                    ("trial", "trial"),
                    ("trial", "trial__attribute"),
                    ("trial", "block_trial"),
                ],
            )
            .entries(
                &paths.events,
                &[("event", "event_type"), ("event", "event"), ("trial", "trial_event")],
            );
        manifest.allow_direct_insert = true;
        manifest
    }

    /// Waveforms, implantations, protocols and stimulation events
    ///
    /// Parents come before children: a protocol needs its implantation and
    /// stimulation parameters, an event needs its protocol.
    pub fn opto(paths: &OptoCsvPaths) -> Self {
        Self::new(Stage::Opto)
            .entries(
                &paths.waveforms,
                &[
                    ("optogenetics", "opto_waveform"),
                    ("optogenetics", "opto_waveform__square"),
                    ("optogenetics", "opto_stim_params"),
                ],
            )
            .entries(
                &paths.surgeries,
                &[
                    ("surgery", "coordinate_reference"),
                    ("surgery", "brain_region"),
                    ("lab", "user"),
                    ("surgery", "implantation"),
                    ("surgery", "implantation__coordinate"),
                ],
            )
            .entry(&paths.sessions, "optogenetics", "opto_protocol")
            .entry(&paths.events, "optogenetics", "opto_event")
    }

    /// Distinct files of the manifest, in first-use order
    pub fn files(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = Vec::new();
        for entry in &self.entries {
            if !files.contains(&entry.file.as_path()) {
                files.push(&entry.file);
            }
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_from_str() {
        assert_eq!(Stage::from_str("subjects"), Ok(Stage::Subjects));
        assert_eq!(Stage::from_str("Opto"), Ok(Stage::Opto));
        assert_eq!(Stage::from_str("optogenetics"), Ok(Stage::Opto));
        assert!(Stage::from_str("trials").is_err());
    }

    #[test]
    fn test_user_data_paths() {
        let paths = UserDataPaths::in_dir("./user_data");
        assert_eq!(paths.subjects, PathBuf::from("./user_data/subjects.csv"));
        assert_eq!(
            paths.events.recordings,
            PathBuf::from("./user_data/behavior_recordings.csv")
        );
        assert_eq!(paths.opto.waveforms, PathBuf::from("./user_data/opto_waveforms.csv"));
    }

    #[test]
    fn test_events_manifest() {
        let paths = UserDataPaths::in_dir("d");
        let manifest = Manifest::events(&paths.events);

        assert!(manifest.allow_direct_insert);
        assert_eq!(manifest.entries.len(), 11);
        assert_eq!(manifest.files().len(), 4);
        assert_eq!(manifest.entries[10].table, "trial_event");
    }

    #[test]
    fn test_opto_manifest_order() {
        let paths = UserDataPaths::in_dir("d");
        let manifest = Manifest::opto(&paths.opto);
        let tables: Vec<&str> = manifest.entries.iter().map(|e| e.table).collect();

        assert!(!manifest.allow_direct_insert);
        assert_eq!(
            tables,
            vec![
                "opto_waveform",
                "opto_waveform__square",
                "opto_stim_params",
                "coordinate_reference",
                "brain_region",
                "user",
                "implantation",
                "implantation__coordinate",
                "opto_protocol",
                "opto_event",
            ]
        );
        let position = |t: &str| tables.iter().position(|x| *x == t).unwrap();
        assert!(position("implantation") < position("opto_protocol"));
        assert!(position("opto_stim_params") < position("opto_protocol"));
        assert!(position("opto_protocol") < position("opto_event"));
    }

    #[test]
    fn test_only_events_allow_direct_insert() {
        let paths = UserDataPaths::in_dir("d");
        assert!(!Manifest::subjects(&paths.subjects).allow_direct_insert);
        assert!(!Manifest::sessions(&paths.sessions).allow_direct_insert);
        assert!(Manifest::events(&paths.events).allow_direct_insert);
        assert!(!Manifest::opto(&paths.opto).allow_direct_insert);
    }
}
