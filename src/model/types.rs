//! Abstract field types.
//!
//! Every field carries one of these; platforms map them to their own SQL
//! type names.

use std::fmt;
use std::str::FromStr;

use crate::error::StrataError;

/// Abstract, dialect-neutral column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldType {
    Char,
    Varchar,
    LongVarchar,
    Clob,
    Numeric,
    Decimal,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Float,
    Double,
    Binary,
    VarBinary,
    LongVarBinary,
    Blob,
    Date,
    Time,
    Timestamp,
    Boolean,
    /// Boolean stored as an integer
    BooleanEmu,
    /// Serialized object
    Object,
    /// List of scalars stored as a delimited string
    Array,
    Enum,
    Set,
    Json,
    Uuid,
    Geometry,
}

impl FieldType {
    pub const ALL: [FieldType; 29] = [
        Self::Char,
        Self::Varchar,
        Self::LongVarchar,
        Self::Clob,
        Self::Numeric,
        Self::Decimal,
        Self::TinyInt,
        Self::SmallInt,
        Self::Integer,
        Self::BigInt,
        Self::Real,
        Self::Float,
        Self::Double,
        Self::Binary,
        Self::VarBinary,
        Self::LongVarBinary,
        Self::Blob,
        Self::Date,
        Self::Time,
        Self::Timestamp,
        Self::Boolean,
        Self::BooleanEmu,
        Self::Object,
        Self::Array,
        Self::Enum,
        Self::Set,
        Self::Json,
        Self::Uuid,
        Self::Geometry,
    ];

    /// Canonical upper-case name, also the generic SQL type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Char => "CHAR",
            Self::Varchar => "VARCHAR",
            Self::LongVarchar => "LONGVARCHAR",
            Self::Clob => "CLOB",
            Self::Numeric => "NUMERIC",
            Self::Decimal => "DECIMAL",
            Self::TinyInt => "TINYINT",
            Self::SmallInt => "SMALLINT",
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Real => "REAL",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Binary => "BINARY",
            Self::VarBinary => "VARBINARY",
            Self::LongVarBinary => "LONGVARBINARY",
            Self::Blob => "BLOB",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Boolean => "BOOLEAN",
            Self::BooleanEmu => "BOOLEAN_EMU",
            Self::Object => "OBJECT",
            Self::Array => "ARRAY",
            Self::Enum => "ENUM",
            Self::Set => "SET",
            Self::Json => "JSON",
            Self::Uuid => "UUID",
            Self::Geometry => "GEOMETRY",
        }
    }

    /// Types whose literal defaults are quoted. Temporal types count as text.
    pub const fn is_text(&self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::Varchar
                | Self::LongVarchar
                | Self::Clob
                | Self::Date
                | Self::Time
                | Self::Timestamp
                | Self::Json
                | Self::Uuid
        )
    }

    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Numeric
                | Self::Decimal
                | Self::TinyInt
                | Self::SmallInt
                | Self::Integer
                | Self::BigInt
                | Self::Real
                | Self::Float
                | Self::Double
        )
    }

    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::TinyInt | Self::SmallInt | Self::Integer | Self::BigInt
        )
    }

    /// Large-object types.
    pub const fn is_lob(&self) -> bool {
        matches!(
            self,
            Self::VarBinary | Self::LongVarBinary | Self::Blob | Self::Object | Self::Geometry
        )
    }

    pub const fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::Time | Self::Timestamp)
    }

    pub const fn is_boolean(&self) -> bool {
        matches!(self, Self::Boolean | Self::BooleanEmu)
    }

    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array)
    }

    /// Binary types need an explicit transaction when read from PostgreSQL.
    pub const fn needs_transaction_in_postgres(&self) -> bool {
        matches!(self, Self::VarBinary | Self::LongVarBinary | Self::Blob)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = StrataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "INT" => return Ok(Self::Integer),
            "BOOL" => return Ok(Self::Boolean),
            "TEXT" => return Ok(Self::LongVarchar),
            _ => {}
        }
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == upper)
            .ok_or_else(|| StrataError::UnknownType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("varchar".parse::<FieldType>().unwrap(), FieldType::Varchar);
        assert_eq!("INT".parse::<FieldType>().unwrap(), FieldType::Integer);
        assert_eq!("boolean_emu".parse::<FieldType>().unwrap(), FieldType::BooleanEmu);
        assert!("uuud".parse::<FieldType>().is_err());
    }

    #[test]
    fn test_categories() {
        assert!(FieldType::Timestamp.is_text());
        assert!(FieldType::Timestamp.is_temporal());
        assert!(FieldType::Decimal.is_numeric());
        assert!(!FieldType::Decimal.is_integer());
        assert!(FieldType::Blob.is_lob());
        assert!(FieldType::Blob.needs_transaction_in_postgres());
        assert!(!FieldType::Object.needs_transaction_in_postgres());
    }
}
