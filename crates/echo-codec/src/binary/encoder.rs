use echo_buffers::Writer;
use echo_core::{EchoObject, Primitive, TagType};

use super::{BinaryMode, HEADER};
use crate::CodecError;

pub struct BinaryEncoder {
    pub writer: Writer,
    mode: BinaryMode,
}

impl Default for BinaryEncoder {
    fn default() -> Self {
        Self::new(BinaryMode::default())
    }
}

impl BinaryEncoder {
    pub fn new(mode: BinaryMode) -> Self {
        Self {
            writer: Writer::new(),
            mode,
        }
    }

    /// Encodes a full document, header included.
    pub fn encode(&mut self, node: &EchoObject) -> Result<Vec<u8>, CodecError> {
        self.writer.u8(HEADER);
        self.writer.u8(self.mode.as_u8());
        self.write_any(node)?;
        Ok(self.writer.flush())
    }

    pub fn write_any(&mut self, node: &EchoObject) -> Result<(), CodecError> {
        let tag = node.tag_type();
        self.writer.u8(tag.as_u8());
        match tag {
            TagType::List => {
                let items = node.list_items()?;
                self.write_len(items.len(), tag)?;
                for item in &items {
                    self.write_any(item)?;
                }
            }
            TagType::Compound => {
                let tags = node.tags()?;
                self.write_len(tags.len(), tag)?;
                for (key, child) in &tags {
                    self.write_str(key, TagType::String)?;
                    self.write_any(child)?;
                }
            }
            _ => {
                if let Some(primitive) = node.primitive() {
                    self.write_primitive(&primitive)?;
                }
            }
        }
        Ok(())
    }

    fn write_primitive(&mut self, value: &Primitive) -> Result<(), CodecError> {
        let compact = self.mode == BinaryMode::Compact;
        let w = &mut self.writer;
        match value {
            Primitive::Null => {}
            Primitive::Byte(v) => w.u8(*v),
            Primitive::SByte(v) => w.i8(*v),
            Primitive::Short(v) if compact => w.vint(i64::from(*v)),
            Primitive::Short(v) => w.i16(*v),
            Primitive::UShort(v) if compact => w.vuint(u64::from(*v)),
            Primitive::UShort(v) => w.u16(*v),
            Primitive::Int(v) if compact => w.vint(i64::from(*v)),
            Primitive::Int(v) => w.i32(*v),
            Primitive::UInt(v) if compact => w.vuint(u64::from(*v)),
            Primitive::UInt(v) => w.u32(*v),
            Primitive::Long(v) if compact => w.vint(*v),
            Primitive::Long(v) => w.i64(*v),
            Primitive::ULong(v) if compact => w.vuint(*v),
            Primitive::ULong(v) => w.u64(*v),
            Primitive::Float(v) => w.f32(*v),
            Primitive::Double(v) => w.f64(*v),
            Primitive::Decimal(v) => self.write_str(&v.to_string(), TagType::Decimal)?,
            Primitive::String(v) => self.write_str(v, TagType::String)?,
            Primitive::ByteArray(v) => {
                self.write_len(v.len(), TagType::ByteArray)?;
                self.writer.buf(v);
            }
            Primitive::Bool(v) => w.u8(u8::from(*v)),
        }
        Ok(())
    }

    fn write_len(&mut self, len: usize, tag: TagType) -> Result<(), CodecError> {
        match self.mode {
            BinaryMode::Compact => {
                let len = u64::try_from(len).map_err(|_| CodecError::OutOfRange { tag })?;
                self.writer.vuint(len);
            }
            BinaryMode::Fast => self.writer.u32(fast_len(len, tag)?),
        }
        Ok(())
    }

    fn write_str(&mut self, value: &str, tag: TagType) -> Result<(), CodecError> {
        self.write_len(value.len(), tag)?;
        self.writer.utf8(value);
        Ok(())
    }
}

/// Lengths in `Fast` mode are a fixed `u32`.
fn fast_len(len: usize, tag: TagType) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::OutOfRange { tag })
}
