use crate::error::NbtError;

/// Discriminant of a tag on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TagKind {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagKind {
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for TagKind {
    type Error = NbtError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Ok(match id {
            0 => TagKind::End,
            1 => TagKind::Byte,
            2 => TagKind::Short,
            3 => TagKind::Int,
            4 => TagKind::Long,
            5 => TagKind::Float,
            6 => TagKind::Double,
            7 => TagKind::ByteArray,
            8 => TagKind::String,
            9 => TagKind::List,
            10 => TagKind::Compound,
            11 => TagKind::IntArray,
            12 => TagKind::LongArray,
            _ => return Err(NbtError::UnknownTagKind(id)),
        })
    }
}

/// A tag payload. Names live with the parent compound (or with the writer call at the root);
/// list elements never carry one.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(List),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Tag::Byte(_) => TagKind::Byte,
            Tag::Short(_) => TagKind::Short,
            Tag::Int(_) => TagKind::Int,
            Tag::Long(_) => TagKind::Long,
            Tag::Float(_) => TagKind::Float,
            Tag::Double(_) => TagKind::Double,
            Tag::ByteArray(_) => TagKind::ByteArray,
            Tag::String(_) => TagKind::String,
            Tag::List(_) => TagKind::List,
            Tag::Compound(_) => TagKind::Compound,
            Tag::IntArray(_) => TagKind::IntArray,
            Tag::LongArray(_) => TagKind::LongArray,
        }
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&List> {
        match self {
            Tag::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Tag::Long(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Tag::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Tag::Short(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i8(&self) -> Option<i8> {
        match self {
            Tag::Byte(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Tag::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Tag::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_int_array(&self) -> Option<&[i32]> {
        match self {
            Tag::IntArray(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_long_array(&self) -> Option<&[i64]> {
        match self {
            Tag::LongArray(values) => Some(values),
            _ => None,
        }
    }
}

/// Homogeneous sequence of nameless tags.
///
/// The list keeps no separate declared length: its element count becomes the declared length
/// when it is written, and the `TagWriter` frame opened for it then fixes that length until the
/// list is closed. A decoded list holds exactly the declared number of elements.
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    element_kind: TagKind,
    items: Vec<Tag>,
}

impl List {
    pub fn new(element_kind: TagKind) -> Self {
        List {
            element_kind,
            items: Vec::new(),
        }
    }

    pub fn with_capacity(element_kind: TagKind, capacity: usize) -> Self {
        List {
            element_kind,
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn element_kind(&self) -> TagKind {
        self.element_kind
    }

    pub fn push(&mut self, tag: Tag) -> Result<(), NbtError> {
        if tag.kind() != self.element_kind {
            return Err(NbtError::ListKindMismatch {
                expected: self.element_kind,
                found: tag.kind(),
            });
        }
        self.items.push(tag);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.items.iter()
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Name -> tag mapping. Insertion order is kept because it is the byte order on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    entries: Vec<(String, Tag)>,
}

impl Compound {
    pub fn new() -> Self {
        Compound::default()
    }

    /// Inserts `tag` under `name`. An existing entry with the same name is replaced in place and
    /// returned.
    pub fn insert(&mut self, name: impl Into<String>, tag: Tag) -> Option<Tag> {
        let name = name.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, tag)),
            None => {
                self.entries.push((name, tag));
                None
            }
        }
    }

    pub fn with(mut self, name: impl Into<String>, tag: Tag) -> Self {
        self.insert(name, tag);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, tag)| tag)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(name, tag)| (name.as_str(), tag))
    }

    pub fn get_byte(&self, name: &str) -> Option<i8> {
        self.get(name).and_then(Tag::as_i8)
    }

    pub fn get_int(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(Tag::as_i32)
    }

    pub fn get_long(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Tag::as_i64)
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Tag::as_string)
    }

    pub fn get_list(&self, name: &str) -> Option<&List> {
        self.get(name).and_then(Tag::as_list)
    }

    pub fn get_compound(&self, name: &str) -> Option<&Compound> {
        self.get(name).and_then(Tag::as_compound)
    }

    pub fn get_int_array(&self, name: &str) -> Option<&[i32]> {
        self.get(name).and_then(Tag::as_int_array)
    }

    pub fn get_long_array(&self, name: &str) -> Option<&[i64]> {
        self.get(name).and_then(Tag::as_long_array)
    }
}
