//! Session namespace: recording sessions identified by subject and session id

use super::{Column, ColumnType, ForeignKey, NamespaceDescriptor, SchemaModule, TableDef, Tier};

pub const NAME: &str = "session";

pub struct Session;

impl SchemaModule for Session {
    fn describe(&self) -> NamespaceDescriptor {
        NamespaceDescriptor {
            name: NAME,
            schema: "session",
            dependencies: &["lab", "subject"],
        }
    }

    fn tables(&self) -> &'static [TableDef] {
        TABLES
    }
}

const SUBJECT: Column = Column::key("subject", ColumnType::Varchar(8));
const SESSION_ID: Column = Column::key("session_id", ColumnType::Int);
const SESSION_FK: ForeignKey = ForeignKey::local(
    "session",
    &[("subject", "subject"), ("session_id", "session_id")],
);

static TABLES: &[TableDef] = &[
    TableDef {
        name: "session",
        tier: Tier::Manual,
        columns: &[
            SUBJECT,
            SESSION_ID,
            Column::required("session_datetime", ColumnType::Datetime),
        ],
        foreign_keys: &[ForeignKey::linked("Subject", &[("subject", "subject")])],
        contents: &[],
    },
    TableDef {
        name: "session_directory",
        tier: Tier::Manual,
        columns: &[
            SUBJECT,
            SESSION_ID,
            Column::required("session_dir", ColumnType::Varchar(256)),
        ],
        foreign_keys: &[SESSION_FK],
        contents: &[],
    },
    TableDef {
        name: "session_experimenter",
        tier: Tier::Manual,
        columns: &[
            SUBJECT,
            SESSION_ID,
            Column::key("user", ColumnType::Varchar(32)),
        ],
        foreign_keys: &[
            SESSION_FK,
            ForeignKey::linked("Experimenter", &[("user", "user")]),
        ],
        contents: &[],
    },
    TableDef {
        name: "session_note",
        tier: Tier::Manual,
        columns: &[
            SUBJECT,
            SESSION_ID,
            Column::required("session_note", ColumnType::Varchar(1024)),
        ],
        foreign_keys: &[SESSION_FK],
        contents: &[],
    },
    TableDef {
        name: "project_session",
        tier: Tier::Manual,
        columns: &[
            Column::key("project", ColumnType::Varchar(32)),
            SUBJECT,
            SESSION_ID,
        ],
        foreign_keys: &[
            ForeignKey::linked("Project", &[("project", "project")]),
            SESSION_FK,
        ],
        contents: &[],
    },
];
