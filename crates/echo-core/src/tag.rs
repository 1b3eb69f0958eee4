use std::fmt;

/// Discriminant of an [`EchoObject`](crate::EchoObject).
///
/// The numeric values are stable and used as wire tags by the codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TagType {
    Null = 0,
    Byte = 1,
    SByte = 2,
    Short = 3,
    UShort = 4,
    Int = 5,
    UInt = 6,
    Long = 7,
    ULong = 8,
    Float = 9,
    Double = 10,
    Decimal = 11,
    String = 12,
    ByteArray = 13,
    Bool = 14,
    List = 15,
    Compound = 16,
}

impl TagType {
    pub const ALL: [TagType; 17] = [
        TagType::Null,
        TagType::Byte,
        TagType::SByte,
        TagType::Short,
        TagType::UShort,
        TagType::Int,
        TagType::UInt,
        TagType::Long,
        TagType::ULong,
        TagType::Float,
        TagType::Double,
        TagType::Decimal,
        TagType::String,
        TagType::ByteArray,
        TagType::Bool,
        TagType::List,
        TagType::Compound,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TagType::Null => "null",
            TagType::Byte => "byte",
            TagType::SByte => "sbyte",
            TagType::Short => "short",
            TagType::UShort => "ushort",
            TagType::Int => "int",
            TagType::UInt => "uint",
            TagType::Long => "long",
            TagType::ULong => "ulong",
            TagType::Float => "float",
            TagType::Double => "double",
            TagType::Decimal => "decimal",
            TagType::String => "string",
            TagType::ByteArray => "byte-array",
            TagType::Bool => "bool",
            TagType::List => "list",
            TagType::Compound => "compound",
        }
    }

    /// One of the eleven numeric kinds.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            TagType::Byte
                | TagType::SByte
                | TagType::Short
                | TagType::UShort
                | TagType::Int
                | TagType::UInt
                | TagType::Long
                | TagType::ULong
                | TagType::Float
                | TagType::Double
                | TagType::Decimal
        )
    }

    /// Lists and compounds.
    pub fn is_container(self) -> bool {
        matches!(self, TagType::List | TagType::Compound)
    }

    /// Everything that is neither a container nor null.
    pub fn is_primitive(self) -> bool {
        !self.is_container() && self != TagType::Null
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
