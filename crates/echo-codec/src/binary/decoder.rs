use std::str::FromStr;

use echo_buffers::Reader;
use echo_core::{BigDecimal, EchoObject, TagType};

use super::{BinaryMode, HEADER};
use crate::CodecError;

#[derive(Default)]
pub struct BinaryDecoder {
    mode: BinaryMode,
}

fn narrow<T: TryFrom<i64>>(value: i64, tag: TagType) -> Result<T, CodecError> {
    T::try_from(value).map_err(|_| CodecError::OutOfRange { tag })
}

fn narrow_unsigned<T: TryFrom<u64>>(value: u64, tag: TagType) -> Result<T, CodecError> {
    T::try_from(value).map_err(|_| CodecError::OutOfRange { tag })
}

impl BinaryDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a full document. The mode is taken from the header.
    pub fn decode(&mut self, input: &[u8]) -> Result<EchoObject, CodecError> {
        let mut reader = Reader::new(input);
        let header = reader.u8()?;
        if header != HEADER {
            return Err(CodecError::InvalidHeader(header));
        }
        let mode = reader.u8()?;
        self.mode = BinaryMode::from_u8(mode).ok_or(CodecError::UnknownMode(mode))?;
        let node = self.read_any(&mut reader)?;
        if !reader.is_eof() {
            return Err(CodecError::TrailingBytes(reader.size()));
        }
        Ok(node)
    }

    pub fn read_any(&self, reader: &mut Reader<'_>) -> Result<EchoObject, CodecError> {
        let raw = reader.u8()?;
        let tag = TagType::from_u8(raw).ok_or(CodecError::UnknownTag(raw))?;
        let compact = self.mode == BinaryMode::Compact;
        Ok(match tag {
            TagType::Null => EchoObject::null(),
            TagType::Byte => reader.u8()?.into(),
            TagType::SByte => reader.i8()?.into(),
            TagType::Short if compact => narrow::<i16>(reader.vint()?, tag)?.into(),
            TagType::Short => reader.i16()?.into(),
            TagType::UShort if compact => narrow_unsigned::<u16>(reader.vuint()?, tag)?.into(),
            TagType::UShort => reader.u16()?.into(),
            TagType::Int if compact => narrow::<i32>(reader.vint()?, tag)?.into(),
            TagType::Int => reader.i32()?.into(),
            TagType::UInt if compact => narrow_unsigned::<u32>(reader.vuint()?, tag)?.into(),
            TagType::UInt => reader.u32()?.into(),
            TagType::Long if compact => reader.vint()?.into(),
            TagType::Long => reader.i64()?.into(),
            TagType::ULong if compact => reader.vuint()?.into(),
            TagType::ULong => reader.u64()?.into(),
            TagType::Float => reader.f32()?.into(),
            TagType::Double => reader.f64()?.into(),
            TagType::Decimal => {
                let text = self.read_str(reader)?;
                BigDecimal::from_str(text)
                    .map_err(|_| CodecError::InvalidDecimal(text.to_string()))?
                    .into()
            }
            TagType::String => self.read_str(reader)?.into(),
            TagType::ByteArray => {
                let len = self.read_len(reader)?;
                reader.buf(len)?.into()
            }
            TagType::Bool => match reader.u8()? {
                0 => false.into(),
                1 => true.into(),
                _ => return Err(CodecError::OutOfRange { tag }),
            },
            TagType::List => {
                let len = self.read_len(reader)?;
                let list = EchoObject::new_list();
                for _ in 0..len {
                    list.list_add(self.read_any(reader)?)?;
                }
                list
            }
            TagType::Compound => {
                let len = self.read_len(reader)?;
                let compound = EchoObject::new_compound();
                for _ in 0..len {
                    let key = self.read_str(reader)?;
                    compound.add(key, self.read_any(reader)?)?;
                }
                compound
            }
        })
    }

    fn read_len(&self, reader: &mut Reader<'_>) -> Result<usize, CodecError> {
        let len = match self.mode {
            BinaryMode::Compact => reader.vuint()?,
            BinaryMode::Fast => u64::from(reader.u32()?),
        };
        let len = usize::try_from(len).map_err(|_| CodecError::OutOfRange { tag: TagType::List })?;
        // every element takes at least one byte
        if len > reader.size() {
            return Err(echo_buffers::BufferError::EndOfBuffer {
                offset: reader.position(),
                needed: len,
            }
            .into());
        }
        Ok(len)
    }

    fn read_str<'a>(&self, reader: &mut Reader<'a>) -> Result<&'a str, CodecError> {
        let len = self.read_len(reader)?;
        Ok(reader.utf8(len)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_foreign_headers() {
        let mut decoder = BinaryDecoder::new();
        assert!(matches!(decoder.decode(&[0x00, 0, 0]), Err(CodecError::InvalidHeader(0))));
        assert!(matches!(decoder.decode(&[HEADER, 9, 0]), Err(CodecError::UnknownMode(9))));
        assert!(matches!(decoder.decode(&[HEADER, 0, 42]), Err(CodecError::UnknownTag(42))));
    }

    #[test]
    fn rejects_truncated_and_trailing_input() {
        let mut decoder = BinaryDecoder::new();
        assert!(matches!(
            decoder.decode(&[HEADER, 1, TagType::Int.as_u8(), 0, 0]),
            Err(CodecError::Buffer(_))
        ));
        assert!(matches!(
            decoder.decode(&[HEADER, 0, TagType::Null.as_u8(), 0]),
            Err(CodecError::TrailingBytes(1))
        ));
    }

    #[test]
    fn compact_values_must_fit_their_tag() {
        // zigzag 70000 does not fit an i16
        let mut bytes = vec![HEADER, 0, TagType::Short.as_u8()];
        let mut writer = echo_buffers::Writer::new();
        writer.vint(70_000);
        bytes.extend(writer.flush());
        assert!(matches!(
            BinaryDecoder::new().decode(&bytes),
            Err(CodecError::OutOfRange { tag: TagType::Short })
        ));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let bytes = [
            HEADER,
            0,
            TagType::Compound.as_u8(),
            2,
            1,
            b'a',
            TagType::Null.as_u8(),
            1,
            b'a',
            TagType::Null.as_u8(),
        ];
        assert!(matches!(BinaryDecoder::new().decode(&bytes), Err(CodecError::Echo(_))));
    }
}
