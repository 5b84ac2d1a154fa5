//! Optogenetics namespace: stimulation waveforms, parameters, protocols and
//! stimulation events
//!
//! A protocol ties a session to a stimulation parameter set, the implantation
//! delivering the light and optionally the pulse generator device.

use super::{Column, ColumnType, ForeignKey, NamespaceDescriptor, SchemaModule, TableDef, Tier};

pub const NAME: &str = "optogenetics";

pub struct Optogenetics;

impl SchemaModule for Optogenetics {
    fn describe(&self) -> NamespaceDescriptor {
        NamespaceDescriptor {
            name: NAME,
            schema: "opto",
            dependencies: &["reference", "surgery", "session"],
        }
    }

    fn tables(&self) -> &'static [TableDef] {
        TABLES
    }
}

const WAVEFORM_NAME: Column = Column::key("waveform_name", ColumnType::Varchar(32));
const WAVEFORM_FK: ForeignKey =
    ForeignKey::local("opto_waveform", &[("waveform_name", "waveform_name")]);
const PROTOCOL_KEY: &[(&str, &str)] = &[
    ("subject", "subject"),
    ("session_id", "session_id"),
    ("protocol_id", "protocol_id"),
];

static TABLES: &[TableDef] = &[
    TableDef {
        name: "opto_waveform_type",
        tier: Tier::Lookup,
        columns: &[Column::key("waveform_type", ColumnType::Varchar(32))],
        foreign_keys: &[],
        contents: &[&["square"], &["sine"], &["ramp"]],
    },
    TableDef {
        name: "opto_waveform",
        tier: Tier::Lookup,
        columns: &[
            WAVEFORM_NAME,
            Column::required("waveform_type", ColumnType::Varchar(32)),
            Column::with_default("waveform_description", ColumnType::Varchar(255), ""),
        ],
        foreign_keys: &[ForeignKey::local(
            "opto_waveform_type",
            &[("waveform_type", "waveform_type")],
        )],
        contents: &[],
    },
    TableDef {
        name: "opto_waveform__square",
        tier: Tier::Part,
        columns: &[
            WAVEFORM_NAME,
            Column::required("on_proportion", ColumnType::Decimal(2, 2)),
            Column::required("off_proportion", ColumnType::Decimal(2, 2)),
        ],
        foreign_keys: &[WAVEFORM_FK],
        contents: &[],
    },
    TableDef {
        name: "opto_waveform__sine",
        tier: Tier::Part,
        columns: &[
            WAVEFORM_NAME,
            Column::required("number_of_cycles", ColumnType::SmallInt),
            Column::with_default("starting_phase", ColumnType::Decimal(4, 3), "0"),
        ],
        foreign_keys: &[WAVEFORM_FK],
        contents: &[],
    },
    TableDef {
        name: "opto_waveform__ramp",
        tier: Tier::Part,
        columns: &[
            WAVEFORM_NAME,
            Column::required("ramp_up_proportion", ColumnType::Decimal(2, 2)),
            Column::required("ramp_down_proportion", ColumnType::Decimal(2, 2)),
        ],
        foreign_keys: &[WAVEFORM_FK],
        contents: &[],
    },
    TableDef {
        name: "opto_stim_params",
        tier: Tier::Manual,
        columns: &[
            Column::key("opto_params_id", ColumnType::SmallInt),
            Column::required("waveform_name", ColumnType::Varchar(32)),
            Column::required("wavelength", ColumnType::Int),
            Column::nullable("power", ColumnType::Decimal(6, 2)),
            Column::nullable("light_intensity", ColumnType::Decimal(6, 2)),
            Column::required("frequency", ColumnType::Decimal(5, 1)),
            Column::required("duration", ColumnType::Decimal(5, 1)),
        ],
        foreign_keys: &[WAVEFORM_FK],
        contents: &[],
    },
    TableDef {
        name: "opto_protocol",
        tier: Tier::Manual,
        columns: &[
            Column::key("subject", ColumnType::Varchar(8)),
            Column::key("session_id", ColumnType::Int),
            Column::key("protocol_id", ColumnType::Int),
            Column::required("opto_params_id", ColumnType::SmallInt),
            Column::required("implant_date", ColumnType::Datetime),
            Column::required("implant_type", ColumnType::Varchar(16)),
            Column::required("target_region", ColumnType::Varchar(32)),
            Column::required("target_hemisphere", ColumnType::Varchar(32)),
            Column::nullable("device", ColumnType::Varchar(32)),
            Column::with_default("protocol_description", ColumnType::Varchar(255), ""),
        ],
        foreign_keys: &[
            ForeignKey::linked(
                "Session",
                &[("subject", "subject"), ("session_id", "session_id")],
            ),
            ForeignKey::local("opto_stim_params", &[("opto_params_id", "opto_params_id")]),
            ForeignKey::linked(
                "Implantation",
                &[
                    ("subject", "subject"),
                    ("implant_date", "implant_date"),
                    ("implant_type", "implant_type"),
                    ("target_region", "target_region"),
                    ("target_hemisphere", "target_hemisphere"),
                ],
            ),
            ForeignKey::linked("Device", &[("device", "device")]),
        ],
        contents: &[],
    },
    TableDef {
        name: "opto_event",
        tier: Tier::Manual,
        columns: &[
            Column::key("subject", ColumnType::Varchar(8)),
            Column::key("session_id", ColumnType::Int),
            Column::key("protocol_id", ColumnType::Int),
            Column::key("stim_start_time", ColumnType::Float),
            Column::required("stim_end_time", ColumnType::Float),
        ],
        foreign_keys: &[ForeignKey::local("opto_protocol", PROTOCOL_KEY)],
        contents: &[],
    },
];
