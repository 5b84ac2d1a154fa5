use crate::record::Value;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Table tier, following the usual manual / lookup / auto-populated split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Rows entered by people or ingestion
    Manual,
    /// Small reference tables, optionally seeded with fixed contents
    Lookup,
    /// Populated from external files by a make step
    Imported,
    /// Populated from other tables by a make step
    Computed,
    /// Detail rows owned by a master table (`master__part`)
    Part,
}

/// Attribute domain
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColumnType {
    Varchar(usize),
    Enum(&'static [&'static str]),
    Date,
    Datetime,
    Int,
    SmallInt,
    Float,
    /// `Decimal(precision, scale)`
    Decimal(u8, u8),
}

impl ColumnType {
    /// SQLite storage class for the attribute
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Varchar(_) | ColumnType::Enum(_) | ColumnType::Date | ColumnType::Datetime => {
                "TEXT"
            }
            ColumnType::Int | ColumnType::SmallInt => "INTEGER",
            ColumnType::Float | ColumnType::Decimal(_, _) => "REAL",
        }
    }

    /// Parse a raw text value into this domain
    ///
    /// The error string describes why the value is outside the domain.
    pub fn parse(&self, raw: &str) -> Result<Value, String> {
        let raw = raw.trim();
        match *self {
            ColumnType::Varchar(max) => {
                let len = raw.chars().count();
                if len > max {
                    return Err(format!("'{}' exceeds varchar({}) ({} chars)", raw, max, len));
                }
                Ok(Value::Text(raw.to_string()))
            }
            ColumnType::Enum(values) => {
                if values.contains(&raw) {
                    Ok(Value::Text(raw.to_string()))
                } else {
                    Err(format!("'{}' is not one of {:?}", raw, values))
                }
            }
            ColumnType::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map(|d| Value::Text(d.format(DATE_FORMAT).to_string()))
                .map_err(|e| format!("'{}' is not a date ({})", raw, e)),
            ColumnType::Datetime => parse_datetime(raw)
                .map(|dt| Value::Text(dt.format(DATETIME_FORMAT).to_string()))
                .ok_or_else(|| format!("'{}' is not a datetime", raw)),
            ColumnType::Int => raw
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| format!("'{}' is not an integer ({})", raw, e)),
            ColumnType::SmallInt => {
                let v = raw
                    .parse::<i64>()
                    .map_err(|e| format!("'{}' is not an integer ({})", raw, e))?;
                if v < i16::MIN as i64 || v > i16::MAX as i64 {
                    return Err(format!("{} is out of smallint range", v));
                }
                Ok(Value::Int(v))
            }
            ColumnType::Float => parse_finite(raw).map(Value::Float),
            ColumnType::Decimal(precision, scale) => {
                let v = parse_finite(raw)?;
                let factor = 10f64.powi(scale as i32);
                let rounded = (v * factor).round() / factor;
                let limit = 10f64.powi(precision as i32 - scale as i32);
                if rounded.abs() >= limit {
                    return Err(format!(
                        "{} is out of range for decimal({},{})",
                        v, precision, scale
                    ));
                }
                Ok(Value::Float(rounded))
            }
        }
    }
}

fn parse_finite(raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(format!("'{}' is not a finite number", raw)),
        Err(e) => Err(format!("'{}' is not a number ({})", raw, e)),
    }
}

/// Parse a datetime, rounding fractional seconds half-up to whole seconds
fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .and_then(round_to_second)
}

fn round_to_second(dt: NaiveDateTime) -> Option<NaiveDateTime> {
    let whole = dt.with_nanosecond(0)?;
    // leap seconds report nanoseconds past 1e9
    if dt.nanosecond() % 1_000_000_000 >= 500_000_000 {
        whole.checked_add_signed(TimeDelta::seconds(1))
    } else {
        Some(whole)
    }
}

/// Default of a secondary attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// Must be supplied
    Required,
    /// Nullable, defaults to NULL
    Null,
    /// Defaults to the given literal
    Value(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub name: &'static str,
    pub ty: ColumnType,
    pub default: DefaultValue,
    pub primary_key: bool,
}

impl Column {
    /// Primary-key attribute
    pub const fn key(name: &'static str, ty: ColumnType) -> Self {
        Column {
            name,
            ty,
            default: DefaultValue::Required,
            primary_key: true,
        }
    }

    pub const fn required(name: &'static str, ty: ColumnType) -> Self {
        Column {
            name,
            ty,
            default: DefaultValue::Required,
            primary_key: false,
        }
    }

    pub const fn nullable(name: &'static str, ty: ColumnType) -> Self {
        Column {
            name,
            ty,
            default: DefaultValue::Null,
            primary_key: false,
        }
    }

    pub const fn with_default(name: &'static str, ty: ColumnType, default: &'static str) -> Self {
        Column {
            name,
            ty,
            default: DefaultValue::Value(default),
            primary_key: false,
        }
    }

    pub fn is_required(&self) -> bool {
        self.default == DefaultValue::Required
    }
}

/// Target of a foreign key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRef {
    /// A table of the same namespace
    Local(&'static str),
    /// An alias resolved through the linking context
    Linked(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKey {
    pub target: TableRef,
    /// `(local attribute, parent attribute)` pairs
    pub columns: &'static [(&'static str, &'static str)],
}

impl ForeignKey {
    pub const fn local(table: &'static str, columns: &'static [(&'static str, &'static str)]) -> Self {
        ForeignKey {
            target: TableRef::Local(table),
            columns,
        }
    }

    pub const fn linked(alias: &'static str, columns: &'static [(&'static str, &'static str)]) -> Self {
        ForeignKey {
            target: TableRef::Linked(alias),
            columns,
        }
    }
}

/// Static table definition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableDef {
    pub name: &'static str,
    pub tier: Tier,
    pub columns: &'static [Column],
    pub foreign_keys: &'static [ForeignKey],
    /// Seed rows for lookup tables, one value per column in column order
    pub contents: &'static [&'static [&'static str]],
}

impl TableDef {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.primary_key)
    }

    /// Attributes a source row must supply
    pub fn required_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_required())
    }

    /// Master table name for part tables (`master__part`)
    pub fn master(&self) -> Option<&'static str> {
        if self.tier != Tier::Part {
            return None;
        }
        self.name.split_once("__").map(|(master, _)| master)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varchar_length() {
        assert_eq!(
            ColumnType::Varchar(8).parse("subject3"),
            Ok(Value::Text("subject3".to_string()))
        );
        assert!(ColumnType::Varchar(8).parse("subject_long").is_err());
    }

    #[test]
    fn test_enum_domain() {
        let sex = ColumnType::Enum(&["M", "F", "U"]);
        assert!(sex.parse("F").is_ok());
        assert!(sex.parse("X").is_err());
    }

    #[test]
    fn test_date_and_datetime_canonical() {
        assert_eq!(
            ColumnType::Date.parse("2022-03-03"),
            Ok(Value::Text("2022-03-03".to_string()))
        );
        assert_eq!(
            ColumnType::Datetime.parse("2022-04-04T12:13:14"),
            Ok(Value::Text("2022-04-04 12:13:14".to_string()))
        );
        assert_eq!(
            ColumnType::Datetime.parse("2022-04-04"),
            Ok(Value::Text("2022-04-04 00:00:00".to_string()))
        );
        assert!(ColumnType::Date.parse("04/04/2022").is_err());
    }

    #[test]
    fn test_datetime_rounds_fractional_seconds() {
        let parse = |raw| ColumnType::Datetime.parse(raw).unwrap();
        assert_eq!(parse("2022-04-01 12:13:14.2"), Value::from("2022-04-01 12:13:14"));
        assert_eq!(parse("2022-04-01 12:13:14.5"), Value::from("2022-04-01 12:13:15"));
        assert_eq!(parse("2022-04-01T12:13:14.9"), Value::from("2022-04-01 12:13:15"));
        assert_eq!(parse("2022-12-31 23:59:59.75"), Value::from("2023-01-01 00:00:00"));
        assert_eq!(parse("2022-04-01 12:13:14"), Value::from("2022-04-01 12:13:14"));
        assert_eq!(parse("2022-04-01 12:13"), Value::from("2022-04-01 12:13:00"));
    }

    #[test]
    fn test_numeric_domains() {
        assert_eq!(ColumnType::Int.parse("1"), Ok(Value::Int(1)));
        assert!(ColumnType::Int.parse("1.5").is_err());
        assert!(ColumnType::SmallInt.parse("40000").is_err());
        assert_eq!(ColumnType::Float.parse("482"), Ok(Value::Float(482.0)));
        assert!(ColumnType::Float.parse("nan").is_err());
    }

    #[test]
    fn test_decimal_range() {
        assert_eq!(ColumnType::Decimal(2, 2).parse(".10"), Ok(Value::Float(0.1)));
        assert!(ColumnType::Decimal(2, 2).parse("1.5").is_err());
        assert_eq!(ColumnType::Decimal(5, 2).parse("11.5"), Ok(Value::Float(11.5)));
        assert_eq!(ColumnType::Decimal(6, 3).parse("-7.9"), Ok(Value::Float(-7.9)));
    }

    #[test]
    fn test_part_master() {
        let part = TableDef {
            name: "implantation__coordinate",
            tier: Tier::Part,
            columns: &[],
            foreign_keys: &[],
            contents: &[],
        };
        assert_eq!(part.master(), Some("implantation"));
    }
}
