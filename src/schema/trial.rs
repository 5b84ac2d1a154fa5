//! Trial namespace: blocks of trials within a behavior recording
//!
//! Blocks, trials and their links are imported tables. Ingestion loads them
//! with direct insert enabled.

use super::{Column, ColumnType, ForeignKey, NamespaceDescriptor, SchemaModule, TableDef, Tier};

pub const NAME: &str = "trial";

pub struct Trial;

impl SchemaModule for Trial {
    fn describe(&self) -> NamespaceDescriptor {
        NamespaceDescriptor {
            name: NAME,
            schema: "trial",
            dependencies: &["event"],
        }
    }

    fn tables(&self) -> &'static [TableDef] {
        TABLES
    }
}

const SUBJECT: Column = Column::key("subject", ColumnType::Varchar(8));
const SESSION_ID: Column = Column::key("session_id", ColumnType::Int);
const BLOCK_ID: Column = Column::key("block_id", ColumnType::SmallInt);
const TRIAL_ID: Column = Column::key("trial_id", ColumnType::SmallInt);
const RECORDING_FK: ForeignKey = ForeignKey::linked(
    "BehaviorRecording",
    &[("subject", "subject"), ("session_id", "session_id")],
);
const BLOCK_FK: ForeignKey = ForeignKey::local(
    "block",
    &[
        ("subject", "subject"),
        ("session_id", "session_id"),
        ("block_id", "block_id"),
    ],
);
const TRIAL_FK: ForeignKey = ForeignKey::local(
    "trial",
    &[
        ("subject", "subject"),
        ("session_id", "session_id"),
        ("trial_id", "trial_id"),
    ],
);

static TABLES: &[TableDef] = &[
    TableDef {
        name: "block",
        tier: Tier::Imported,
        columns: &[
            SUBJECT,
            SESSION_ID,
            BLOCK_ID,
            Column::required("block_start_time", ColumnType::Float),
            Column::required("block_stop_time", ColumnType::Float),
        ],
        foreign_keys: &[RECORDING_FK],
        contents: &[],
    },
    TableDef {
        name: "block__attribute",
        tier: Tier::Part,
        columns: &[
            SUBJECT,
            SESSION_ID,
            BLOCK_ID,
            Column::key("attribute_name", ColumnType::Varchar(32)),
            Column::with_default("attribute_value", ColumnType::Varchar(2000), ""),
        ],
        foreign_keys: &[BLOCK_FK],
        contents: &[],
    },
    TableDef {
        name: "trial_type",
        tier: Tier::Lookup,
        columns: &[
            Column::key("trial_type", ColumnType::Varchar(16)),
            Column::with_default("trial_type_description", ColumnType::Varchar(256), ""),
        ],
        foreign_keys: &[],
        contents: &[],
    },
    TableDef {
        name: "trial",
        tier: Tier::Imported,
        columns: &[
            SUBJECT,
            SESSION_ID,
            TRIAL_ID,
            Column::required("trial_type", ColumnType::Varchar(16)),
            Column::required("trial_start_time", ColumnType::Float),
            Column::required("trial_stop_time", ColumnType::Float),
        ],
        foreign_keys: &[
            RECORDING_FK,
            ForeignKey::local("trial_type", &[("trial_type", "trial_type")]),
        ],
        contents: &[],
    },
    TableDef {
        name: "trial__attribute",
        tier: Tier::Part,
        columns: &[
            SUBJECT,
            SESSION_ID,
            TRIAL_ID,
            Column::key("attribute_name", ColumnType::Varchar(32)),
            Column::with_default("attribute_value", ColumnType::Varchar(2000), ""),
        ],
        foreign_keys: &[TRIAL_FK],
        contents: &[],
    },
    TableDef {
        name: "block_trial",
        tier: Tier::Imported,
        columns: &[SUBJECT, SESSION_ID, BLOCK_ID, TRIAL_ID],
        foreign_keys: &[BLOCK_FK, TRIAL_FK],
        contents: &[],
    },
    TableDef {
        name: "trial_event",
        tier: Tier::Imported,
        columns: &[
            SUBJECT,
            SESSION_ID,
            TRIAL_ID,
            Column::key("event_type", ColumnType::Varchar(16)),
            Column::key("event_start_time", ColumnType::Decimal(10, 4)),
        ],
        foreign_keys: &[
            TRIAL_FK,
            ForeignKey::linked(
                "Event",
                &[
                    ("subject", "subject"),
                    ("session_id", "session_id"),
                    ("event_type", "event_type"),
                    ("event_start_time", "event_start_time"),
                ],
            ),
        ],
        contents: &[],
    },
];
