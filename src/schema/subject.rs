//! Subject namespace: experimental animals

use super::{Column, ColumnType, ForeignKey, NamespaceDescriptor, SchemaModule, TableDef, Tier};

pub const NAME: &str = "subject";

pub struct Subject;

impl SchemaModule for Subject {
    fn describe(&self) -> NamespaceDescriptor {
        NamespaceDescriptor {
            name: NAME,
            schema: "subject",
            dependencies: &["lab"],
        }
    }

    fn tables(&self) -> &'static [TableDef] {
        TABLES
    }
}

const SUBJECT: Column = Column::key("subject", ColumnType::Varchar(8));
const SUBJECT_FK: ForeignKey = ForeignKey::local("subject", &[("subject", "subject")]);

static TABLES: &[TableDef] = &[
    TableDef {
        name: "subject",
        tier: Tier::Manual,
        columns: &[
            SUBJECT,
            Column::with_default("subject_nickname", ColumnType::Varchar(64), ""),
            Column::required("sex", ColumnType::Enum(&["M", "F", "U"])),
            Column::required("subject_birth_date", ColumnType::Date),
            Column::with_default("subject_description", ColumnType::Varchar(1024), ""),
        ],
        foreign_keys: &[],
        contents: &[],
    },
    TableDef {
        name: "subject__user",
        tier: Tier::Part,
        columns: &[SUBJECT, Column::key("user", ColumnType::Varchar(32))],
        foreign_keys: &[SUBJECT_FK, ForeignKey::linked("User", &[("user", "user")])],
        contents: &[],
    },
    TableDef {
        name: "subject__lab",
        tier: Tier::Part,
        columns: &[
            SUBJECT,
            Column::key("lab", ColumnType::Varchar(24)),
            Column::with_default("subject_alias", ColumnType::Varchar(32), ""),
        ],
        foreign_keys: &[SUBJECT_FK, ForeignKey::linked("Lab", &[("lab", "lab")])],
        contents: &[],
    },
    TableDef {
        name: "subject__source",
        tier: Tier::Part,
        columns: &[SUBJECT, Column::required("source", ColumnType::Varchar(32))],
        foreign_keys: &[
            SUBJECT_FK,
            ForeignKey::linked("Source", &[("source", "source")]),
        ],
        contents: &[],
    },
    TableDef {
        name: "subject_death",
        tier: Tier::Manual,
        columns: &[
            SUBJECT,
            Column::required("death_date", ColumnType::Date),
            Column::with_default("cause", ColumnType::Varchar(255), ""),
        ],
        foreign_keys: &[SUBJECT_FK],
        contents: &[],
    },
];
