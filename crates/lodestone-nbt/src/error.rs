use crate::tag::TagKind;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NbtError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("list cannot end: declared length {declared} not reached, {written} written")]
    ListLengthNotReached { declared: i32, written: i32 },
    #[error("exceeded declared list length {declared}")]
    ListOverflow { declared: i32 },
    #[error("cannot close a {expected:?} frame, the open frame is {found:?}")]
    FrameMismatch {
        expected: TagKind,
        found: Option<TagKind>,
    },
    #[error("unable to finish: {0} tag(s) have yet to be closed")]
    UnclosedFrames(usize),
    #[error("tags inside lists must be nameless, got \"{0}\"")]
    NamedTagInList(String),
    #[error("tags inside a compound must have a name ({0:?})")]
    UnnamedTag(TagKind),
    #[error("expected list element kind {expected:?}, got {found:?}")]
    ListKindMismatch { expected: TagKind, found: TagKind },
    #[error("{0:?} is not an array tag")]
    UnsupportedArrayType(TagKind),
    #[error("end tags are written by closing a compound")]
    EndTag,
    #[error("invalid tag type: {0}")]
    UnknownTagKind(u8),
    #[error("string is not valid UTF-8")]
    InvalidString,
    #[error("negative length: {0}")]
    NegativeLength(i32),
    #[error("end tag outside of a compound")]
    StrayEndTag,
    #[error("nesting deeper than {0} levels")]
    DepthLimit(usize),
    #[error("name or string of {0} bytes does not fit a 2-byte length")]
    NameTooLong(usize),
    #[error("expected a root compound, found {0:?}")]
    RootNotCompound(Option<TagKind>),
}
