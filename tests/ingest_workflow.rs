//! End-to-end ingestion of the subject3 optogenetics session

use opto_workflow::ingest::{ingest_all, IngestOptions, UserDataPaths};
use opto_workflow::{Pipeline, Value, WorkflowConfig};
use std::fs;
use std::path::Path;

fn write_csv(path: &Path, lines: &[&str]) {
    fs::write(path, format!("{}\n", lines.join("\n"))).unwrap();
}

/// Subject, session and opto CSV files, without behavior events
fn write_user_data(dir: &Path) -> UserDataPaths {
    let paths = UserDataPaths::in_dir(dir);

    write_csv(
        &paths.subjects,
        &[
            "subject,sex,subject_birth_date,subject_description",
            "subject3,F,2022-03-03,Optogenetic pilot subject",
        ],
    );
    write_csv(
        &paths.sessions,
        &[
            "subject,session_dir,session_id,session_datetime",
            "subject3,subject3/opto_session1/,1,2022-04-04 12:13:14",
        ],
    );
    write_csv(
        &paths.opto.waveforms,
        &[
            "waveform_type,waveform_name,waveform_description,on_proportion,off_proportion,\
             opto_params_id,wavelength,light_intensity,frequency,duration",
            "square,square_10,Square waveform with 10-90 on-off cycle,.10,.90,1,470,10.2,1,241",
        ],
    );
    write_csv(
        &paths.opto.surgeries,
        &[
            "subject,implant_date,reference,region_acronym,region_name,hemisphere,implant_type,\
             ap,ap_ref,ml,ml_ref,dv,dv_ref,theta,phi,user,surgeon,target_region,target_hemisphere",
            "subject3,2022-04-01 12:13:14,bregma,dHP,Dorsal Hippocampus,left,opto,\
             -7.9,bregma,-1.8,bregma,5,skull_surface,11.5,0,user1,user1,dHP,left",
        ],
    );
    write_csv(
        &paths.opto.sessions,
        &[
            "subject,session_id,protocol_id,opto_params_id,implant_date,implant_type,\
             target_region,target_hemisphere",
            "subject3,1,1,1,2022-04-01 12:13:14,opto,dHP,left",
        ],
    );
    write_csv(
        &paths.opto.events,
        &[
            "subject,session_id,protocol_id,stim_start_time,stim_end_time",
            "subject3,1,1,241,482",
            "subject3,1,1,482,723",
        ],
    );

    // headers only: the events stage has nothing to load
    write_csv(
        &paths.events.recordings,
        &["subject,session_id,recording_start_time,recording_duration,filepath"],
    );
    write_csv(
        &paths.events.blocks,
        &["subject,session_id,block_id,block_start_time,block_stop_time,attribute_name,attribute_value"],
    );
    write_csv(
        &paths.events.trials,
        &["subject,session_id,block_id,trial_id,trial_type,trial_start_time,trial_stop_time,\
           attribute_name,attribute_value"],
    );
    write_csv(
        &paths.events.events,
        &["subject,session_id,trial_id,event_type,event_start_time,event_end_time"],
    );

    paths
}

#[test]
fn test_subject3_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_user_data(dir.path());
    let pipeline = Pipeline::compose(&WorkflowConfig::in_memory("test_")).unwrap();

    ingest_all(&pipeline, &paths, &IngestOptions::default()).unwrap();

    let expected = [
        ("subject", "subject", 1, Value::from("subject3")),
        ("session", "session", 1, Value::from("2022-04-04 12:13:14")),
        ("surgery", "implantation__coordinate", 1, Value::Float(11.5)),
        ("optogenetics", "opto_stim_params", 1, Value::from("square_10")),
        ("optogenetics", "opto_event", 2, Value::Float(482.0)),
    ];

    for (namespace, table, rows, value) in expected {
        assert_eq!(
            pipeline.count(namespace, table).unwrap(),
            rows,
            "row count of {}.{}",
            namespace,
            table
        );
        let fetched = pipeline.fetch(namespace, table).unwrap();
        assert!(
            fetched[0].contains(&value),
            "first row of {}.{} should contain {}",
            namespace,
            table,
            value
        );
    }

    assert_eq!(pipeline.count("trial", "trial").unwrap(), 0);
}

#[test]
fn test_reopen_file_store() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_user_data(dir.path());
    let db_path = dir.path().join("store").join("workflow.sqlite3");

    let config = WorkflowConfig {
        database_path: Some(db_path.to_string_lossy().to_string()),
        database_prefix: "lab1_".to_string(),
        ..Default::default()
    };

    {
        let pipeline = Pipeline::compose(&config).unwrap();
        ingest_all(&pipeline, &paths, &IngestOptions::default()).unwrap();
    }

    let pipeline = Pipeline::compose(&config).unwrap();
    assert_eq!(pipeline.count("reference", "device").unwrap(), 1);
    assert_eq!(pipeline.count("optogenetics", "opto_event").unwrap(), 2);
    assert_eq!(
        pipeline.full_table_name("subject", "subject").unwrap(),
        "lab1_subject__subject"
    );

    let reports = ingest_all(&pipeline, &paths, &IngestOptions::default()).unwrap();
    assert!(reports.iter().all(|r| r.inserted() == 0));
}
