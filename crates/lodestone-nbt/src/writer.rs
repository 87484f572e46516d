use crate::error::NbtError;
use crate::tag::{Tag, TagKind};
use byteorder::{BigEndian, WriteBytesExt};
use std::io::Write;

/// An open container on the writer stack. List frames carry their own bookkeeping, so closing a
/// nested container hands control straight back to the parent frame.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Frame {
    Compound,
    List {
        element_kind: TagKind,
        length: i32,
        index: i32,
    },
}

impl Frame {
    fn kind(&self) -> TagKind {
        match self {
            Frame::Compound => TagKind::Compound,
            Frame::List { .. } => TagKind::List,
        }
    }
}

/// Streaming tag encoder.
///
/// Every write is validated against the innermost open frame: inside a list the tag must be
/// nameless and of the declared element kind, and no more than the declared length may be
/// written; inside a compound (or at the root) the tag must be named. An empty name means
/// "nameless".
pub struct TagWriter<W: Write> {
    writer: W,
    frames: Vec<Frame>,
}

impl<W: Write> TagWriter<W> {
    pub fn new(writer: W) -> Self {
        TagWriter {
            writer,
            frames: Vec::new(),
        }
    }

    /// Kind of the innermost open container, `None` at the document root.
    pub fn root_kind(&self) -> Option<TagKind> {
        self.frames.last().map(Frame::kind)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn write_tag(&mut self, name: &str, tag: &Tag) -> Result<(), NbtError> {
        match tag {
            Tag::Byte(v) => self.write_byte(name, *v),
            Tag::Short(v) => self.write_short(name, *v),
            Tag::Int(v) => self.write_int(name, *v),
            Tag::Long(v) => self.write_long(name, *v),
            Tag::Float(v) => self.write_float(name, *v),
            Tag::Double(v) => self.write_double(name, *v),
            Tag::String(v) => self.write_string(name, v),
            Tag::List(list) => {
                self.start_list(name, list.element_kind(), list.len() as i32)?;
                for child in list {
                    self.write_tag("", child)?;
                }
                self.end_list()
            }
            Tag::Compound(compound) => {
                self.start_compound(name)?;
                for (child_name, child) in compound.iter() {
                    self.write_tag(child_name, child)?;
                }
                self.end_compound()
            }
            Tag::ByteArray(_) | Tag::IntArray(_) | Tag::LongArray(_) => {
                self.write_array(name, tag)
            }
        }
    }

    pub fn start_compound(&mut self, name: &str) -> Result<(), NbtError> {
        self.begin(name, TagKind::Compound)?;
        self.frames.push(Frame::Compound);
        Ok(())
    }

    pub fn end_compound(&mut self) -> Result<(), NbtError> {
        match self.frames.last() {
            Some(Frame::Compound) => {
                self.frames.pop();
                self.writer.write_u8(TagKind::End.id())?;
                Ok(())
            }
            other => Err(NbtError::FrameMismatch {
                expected: TagKind::Compound,
                found: other.map(Frame::kind),
            }),
        }
    }

    pub fn start_list(
        &mut self,
        name: &str,
        element_kind: TagKind,
        length: i32,
    ) -> Result<(), NbtError> {
        if length < 0 {
            return Err(NbtError::NegativeLength(length));
        }
        self.begin(name, TagKind::List)?;
        self.writer.write_u8(element_kind.id())?;
        self.writer.write_i32::<BigEndian>(length)?;
        self.frames.push(Frame::List {
            element_kind,
            length,
            index: 0,
        });
        Ok(())
    }

    pub fn end_list(&mut self) -> Result<(), NbtError> {
        match self.frames.last() {
            Some(Frame::List { length, index, .. }) => {
                if index < length {
                    return Err(NbtError::ListLengthNotReached {
                        declared: *length,
                        written: *index,
                    });
                }
                self.frames.pop();
                Ok(())
            }
            other => Err(NbtError::FrameMismatch {
                expected: TagKind::List,
                found: other.map(Frame::kind),
            }),
        }
    }

    /// Writes a byte, int or long array, chosen by the payload variant of `array`.
    pub fn write_array(&mut self, name: &str, array: &Tag) -> Result<(), NbtError> {
        match array {
            Tag::ByteArray(values) => {
                self.begin(name, TagKind::ByteArray)?;
                self.writer.write_i32::<BigEndian>(values.len() as i32)?;
                let bytes: Vec<u8> = values.iter().map(|&b| b as u8).collect();
                self.writer.write_all(&bytes)?;
            }
            Tag::IntArray(values) => {
                self.begin(name, TagKind::IntArray)?;
                self.writer.write_i32::<BigEndian>(values.len() as i32)?;
                for &value in values {
                    self.writer.write_i32::<BigEndian>(value)?;
                }
            }
            Tag::LongArray(values) => {
                self.begin(name, TagKind::LongArray)?;
                self.writer.write_i32::<BigEndian>(values.len() as i32)?;
                for &value in values {
                    self.writer.write_i64::<BigEndian>(value)?;
                }
            }
            other => return Err(NbtError::UnsupportedArrayType(other.kind())),
        }
        Ok(())
    }

    pub fn write_byte(&mut self, name: &str, value: i8) -> Result<(), NbtError> {
        self.begin(name, TagKind::Byte)?;
        self.writer.write_i8(value)?;
        Ok(())
    }

    pub fn write_bool(&mut self, name: &str, value: bool) -> Result<(), NbtError> {
        self.write_byte(name, value as i8)
    }

    pub fn write_short(&mut self, name: &str, value: i16) -> Result<(), NbtError> {
        self.begin(name, TagKind::Short)?;
        self.writer.write_i16::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_int(&mut self, name: &str, value: i32) -> Result<(), NbtError> {
        self.begin(name, TagKind::Int)?;
        self.writer.write_i32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_long(&mut self, name: &str, value: i64) -> Result<(), NbtError> {
        self.begin(name, TagKind::Long)?;
        self.writer.write_i64::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_float(&mut self, name: &str, value: f32) -> Result<(), NbtError> {
        self.begin(name, TagKind::Float)?;
        self.writer.write_f32::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_double(&mut self, name: &str, value: f64) -> Result<(), NbtError> {
        self.begin(name, TagKind::Double)?;
        self.writer.write_f64::<BigEndian>(value)?;
        Ok(())
    }

    pub fn write_string(&mut self, name: &str, value: &str) -> Result<(), NbtError> {
        check_str_len(value)?;
        self.begin(name, TagKind::String)?;
        self.write_str(value)
    }

    /// Fails if any list or compound is still open, otherwise flushes the sink.
    pub fn try_finish(&mut self) -> Result<(), NbtError> {
        if !self.frames.is_empty() {
            return Err(NbtError::UnclosedFrames(self.frames.len()));
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W, NbtError> {
        self.try_finish()?;
        Ok(self.writer)
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Validates a tag of `kind` against the open frame and writes its header (kind byte and
    /// name) unless it is a list element.
    fn begin(&mut self, name: &str, kind: TagKind) -> Result<(), NbtError> {
        let in_list = self.validate(name, kind)?;
        if !in_list {
            self.writer.write_u8(kind.id())?;
            self.write_str(name)?;
        }
        Ok(())
    }

    /// Nothing may be emitted, and no frame may change, when this fails.
    fn validate(&mut self, name: &str, kind: TagKind) -> Result<bool, NbtError> {
        check_str_len(name)?;
        match self.frames.last_mut() {
            Some(Frame::List {
                element_kind,
                length,
                index,
            }) => {
                if !name.is_empty() {
                    return Err(NbtError::NamedTagInList(name.to_owned()));
                }
                if *element_kind != kind {
                    return Err(NbtError::ListKindMismatch {
                        expected: *element_kind,
                        found: kind,
                    });
                }
                if *index >= *length {
                    return Err(NbtError::ListOverflow { declared: *length });
                }
                *index += 1;
                Ok(true)
            }
            Some(Frame::Compound) | None => {
                if name.is_empty() {
                    return Err(NbtError::UnnamedTag(kind));
                }
                Ok(false)
            }
        }
    }

    fn write_str(&mut self, value: &str) -> Result<(), NbtError> {
        let length = check_str_len(value)?;
        self.writer.write_u16::<BigEndian>(length)?;
        self.writer.write_all(value.as_bytes())?;
        Ok(())
    }
}

fn check_str_len(value: &str) -> Result<u16, NbtError> {
    u16::try_from(value.len()).map_err(|_| NbtError::NameTooLong(value.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{Compound, List};
    use assert_matches::assert_matches;

    fn writer() -> TagWriter<Vec<u8>> {
        TagWriter::new(Vec::new())
    }

    #[test]
    fn test_hello_world_bytes() {
        let mut w = writer();
        w.start_compound("hello world").unwrap();
        w.write_string("name", "Bananrama").unwrap();
        w.end_compound().unwrap();
        let bytes = w.finish().unwrap();

        let mut expected = vec![0x0a, 0x00, 0x0b];
        expected.extend_from_slice(b"hello world");
        expected.extend_from_slice(&[0x08, 0x00, 0x04]);
        expected.extend_from_slice(b"name");
        expected.extend_from_slice(&[0x00, 0x09]);
        expected.extend_from_slice(b"Bananrama");
        expected.push(0x00);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_list_elements_are_payload_only() {
        let mut w = writer();
        w.start_list("nums", TagKind::Short, 2).unwrap();
        w.write_short("", 1).unwrap();
        w.write_short("", -2).unwrap();
        w.end_list().unwrap();
        let bytes = w.finish().unwrap();

        assert_eq!(
            bytes,
            vec![9, 0, 4, b'n', b'u', b'm', b's', 2, 0, 0, 0, 2, 0, 1, 0xff, 0xfe]
        );
    }

    #[test]
    fn test_list_of_compounds_resumes_counting() {
        let mut w = writer();
        w.start_compound("root").unwrap();
        w.start_list("entries", TagKind::Compound, 2).unwrap();
        for i in 0..2 {
            w.start_compound("").unwrap();
            assert_eq!(w.root_kind(), Some(TagKind::Compound));
            w.write_int("i", i).unwrap();
            w.end_compound().unwrap();
            assert_eq!(w.root_kind(), Some(TagKind::List));
        }
        assert_matches!(
            w.start_compound(""),
            Err(NbtError::ListOverflow { declared: 2 })
        );
        w.end_list().unwrap();
        w.end_compound().unwrap();
        assert_eq!(w.depth(), 0);
        w.try_finish().unwrap();
    }

    #[test]
    fn test_list_of_lists() {
        let mut inner = List::new(TagKind::Int);
        inner.push(Tag::Int(7)).unwrap();
        let mut outer = List::new(TagKind::List);
        outer.push(Tag::List(inner.clone())).unwrap();
        outer.push(Tag::List(inner)).unwrap();

        let mut w = writer();
        w.write_tag("nested", &Tag::List(outer)).unwrap();
        let bytes = w.finish().unwrap();

        // header, outer element kind + length, then two bare inner lists
        assert_eq!(&bytes[..9], &[9, 0, 6, b'n', b'e', b's', b't', b'e', b'd']);
        assert_eq!(&bytes[9..14], &[9, 0, 0, 0, 2]);
        assert_eq!(&bytes[14..23], &[3, 0, 0, 0, 1, 0, 0, 0, 7]);
        assert_eq!(bytes.len(), 14 + 9 * 2);
    }

    #[test]
    fn test_unnamed_tag_in_compound_fails() {
        let mut w = writer();
        w.start_compound("root").unwrap();
        assert_matches!(w.write_int("", 1), Err(NbtError::UnnamedTag(TagKind::Int)));
        assert_matches!(w.write_int("", 1), Err(NbtError::UnnamedTag(_)));

        let mut root = writer();
        assert_matches!(
            root.write_tag("", &Tag::Compound(Compound::new())),
            Err(NbtError::UnnamedTag(TagKind::Compound))
        );
    }

    #[test]
    fn test_named_tag_in_list_fails() {
        let mut w = writer();
        w.start_list("l", TagKind::Int, 1).unwrap();
        assert_matches!(
            w.write_int("oops", 1),
            Err(NbtError::NamedTagInList(name)) if name == "oops"
        );
    }

    #[test]
    fn test_list_kind_mismatch_fails() {
        let mut w = writer();
        w.start_list("l", TagKind::Int, 1).unwrap();
        assert_matches!(
            w.write_long("", 1),
            Err(NbtError::ListKindMismatch {
                expected: TagKind::Int,
                found: TagKind::Long
            })
        );
    }

    #[test]
    fn test_list_overflow_fails() {
        let mut w = writer();
        w.start_list("l", TagKind::Byte, 1).unwrap();
        w.write_byte("", 1).unwrap();
        assert_matches!(
            w.write_byte("", 2),
            Err(NbtError::ListOverflow { declared: 1 })
        );
    }

    #[test]
    fn test_closing_short_list_fails() {
        let mut w = writer();
        w.start_list("l", TagKind::Byte, 3).unwrap();
        w.write_byte("", 1).unwrap();
        assert_matches!(
            w.end_list(),
            Err(NbtError::ListLengthNotReached {
                declared: 3,
                written: 1
            })
        );
    }

    #[test]
    fn test_closing_wrong_frame_fails() {
        let mut w = writer();
        w.start_compound("root").unwrap();
        assert_matches!(
            w.end_list(),
            Err(NbtError::FrameMismatch {
                expected: TagKind::List,
                found: Some(TagKind::Compound)
            })
        );
        w.start_list("l", TagKind::Int, 0).unwrap();
        assert_matches!(
            w.end_compound(),
            Err(NbtError::FrameMismatch {
                expected: TagKind::Compound,
                found: Some(TagKind::List)
            })
        );

        let mut empty = writer();
        assert_matches!(
            empty.end_compound(),
            Err(NbtError::FrameMismatch { found: None, .. })
        );
    }

    #[test]
    fn test_finish_with_open_container_fails() {
        let mut w = writer();
        w.start_compound("root").unwrap();
        w.start_list("l", TagKind::Int, 0).unwrap();
        assert_matches!(w.try_finish(), Err(NbtError::UnclosedFrames(2)));
    }

    #[test]
    fn test_array_dispatch_by_payload() {
        let mut w = writer();
        w.write_array("bytes", &Tag::ByteArray(vec![1, -1])).unwrap();
        w.write_array("longs", &Tag::LongArray(vec![-1])).unwrap();
        assert_matches!(
            w.write_array("nope", &Tag::Int(3)),
            Err(NbtError::UnsupportedArrayType(TagKind::Int))
        );
        let bytes = w.finish().unwrap();

        let mut expected = vec![7, 0, 5];
        expected.extend_from_slice(b"bytes");
        expected.extend_from_slice(&[0, 0, 0, 2, 1, 0xff]);
        expected.extend_from_slice(&[12, 0, 5]);
        expected.extend_from_slice(b"longs");
        expected.extend_from_slice(&[0, 0, 0, 1]);
        expected.extend_from_slice(&[0xff; 8]);
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_rejected_strings_leave_no_trace() {
        let long = "x".repeat(u16::MAX as usize + 1);
        let mut w = writer();
        w.start_compound("root").unwrap();
        let header_len = w.writer.len();

        assert_matches!(w.write_int(&long, 1), Err(NbtError::NameTooLong(65536)));
        assert_matches!(w.start_compound(&long), Err(NbtError::NameTooLong(_)));
        assert_eq!(w.writer.len(), header_len);
        assert_eq!(w.depth(), 1);

        w.start_list("names", TagKind::String, 1).unwrap();
        let list_len = w.writer.len();
        assert_matches!(w.write_string("", &long), Err(NbtError::NameTooLong(_)));
        assert_eq!(w.writer.len(), list_len);
        // the failed element did not use up the list
        w.write_string("", "ok").unwrap();
        w.end_list().unwrap();
        w.end_compound().unwrap();
        w.finish().unwrap();
    }
}
