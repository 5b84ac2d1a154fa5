//! Event namespace: behavior recordings and the events found in them
//!
//! `event` is an imported table; outside of ingestion it only receives rows
//! from a populate step.

use super::{Column, ColumnType, ForeignKey, NamespaceDescriptor, SchemaModule, TableDef, Tier};

pub const NAME: &str = "event";

pub struct Event;

impl SchemaModule for Event {
    fn describe(&self) -> NamespaceDescriptor {
        NamespaceDescriptor {
            name: NAME,
            schema: "event",
            dependencies: &["session"],
        }
    }

    fn tables(&self) -> &'static [TableDef] {
        TABLES
    }
}

const SUBJECT: Column = Column::key("subject", ColumnType::Varchar(8));
const SESSION_ID: Column = Column::key("session_id", ColumnType::Int);
const RECORDING_FK: ForeignKey = ForeignKey::local(
    "behavior_recording",
    &[("subject", "subject"), ("session_id", "session_id")],
);

static TABLES: &[TableDef] = &[
    TableDef {
        name: "event_type",
        tier: Tier::Lookup,
        columns: &[
            Column::key("event_type", ColumnType::Varchar(16)),
            Column::with_default("event_type_description", ColumnType::Varchar(256), ""),
        ],
        foreign_keys: &[],
        contents: &[],
    },
    TableDef {
        name: "behavior_recording",
        tier: Tier::Manual,
        columns: &[
            SUBJECT,
            SESSION_ID,
            Column::nullable("recording_start_time", ColumnType::Datetime),
            Column::nullable("recording_duration", ColumnType::Float),
            Column::with_default("recording_notes", ColumnType::Varchar(256), ""),
        ],
        foreign_keys: &[ForeignKey::linked(
            "Session",
            &[("subject", "subject"), ("session_id", "session_id")],
        )],
        contents: &[],
    },
    TableDef {
        name: "behavior_recording__file",
        tier: Tier::Part,
        columns: &[
            SUBJECT,
            SESSION_ID,
            Column::key("filepath", ColumnType::Varchar(255)),
        ],
        foreign_keys: &[RECORDING_FK],
        contents: &[],
    },
    TableDef {
        name: "event",
        tier: Tier::Imported,
        columns: &[
            SUBJECT,
            SESSION_ID,
            Column::key("event_type", ColumnType::Varchar(16)),
            Column::key("event_start_time", ColumnType::Decimal(10, 4)),
            Column::nullable("event_end_time", ColumnType::Float),
        ],
        foreign_keys: &[
            RECORDING_FK,
            ForeignKey::local("event_type", &[("event_type", "event_type")]),
        ],
        contents: &[],
    },
];
