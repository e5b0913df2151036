//! Line-level parsers for the extended header of a `diff --git` block.
//!
//! Each pattern is a small `nom` parser. Parsers commit with `cut` once the
//! fixed prefix of their line has matched, so callers can tell a line that is
//! simply something else (`Err::Error`) from one that starts right but is
//! garbled (`Err::Failure`).

use crate::blob::ObjectId;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, hex_digit1},
    combinator::{cut, map, map_opt, map_res, opt, rest, verify},
    error::{Error, ErrorKind},
    sequence::{preceded, separated_pair, terminated},
};

/// The change-type marker that may follow the path header and mode pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marker<'a> {
    NewFile { mode: &'a str },
    DeletedFile { mode: &'a str },
    Similarity { percent: u8 },
}

/// Fields of an `index <before>..<after>[ <mode>]` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IndexLine<'a> {
    pub before: ObjectId,
    pub after: ObjectId,
    pub mode: Option<&'a str>,
}

/// Result of trying one pattern against a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineMatch<T> {
    Matched(T),
    /// The line belongs to some other pattern.
    Other,
    /// The line carries this pattern's prefix but not its shape.
    Malformed,
}

fn classify<T>(result: IResult<&str, T>) -> LineMatch<T> {
    match result {
        Ok((_, value)) => LineMatch::Matched(value),
        Err(nom::Err::Failure(_)) => LineMatch::Malformed,
        Err(_) => LineMatch::Other,
    }
}

/// `diff --git a/<before> b/<after>`
pub(crate) fn diff_git(line: &str) -> LineMatch<(&str, &str)> {
    classify(preceded(tag("diff --git "), cut(git_paths)).parse(line))
}

/// `old mode <digits>`
pub(crate) fn old_mode(line: &str) -> LineMatch<&str> {
    classify(preceded(tag("old mode "), cut(digit1)).parse(line))
}

/// `new mode <digits>`
pub(crate) fn new_mode(line: &str) -> LineMatch<&str> {
    classify(preceded(tag("new mode "), cut(digit1)).parse(line))
}

/// One of `new file mode`, `deleted file mode` or `similarity index`, tried in that order.
pub(crate) fn marker(line: &str) -> LineMatch<Marker<'_>> {
    let mut parser = alt((
        map(preceded(tag("new file mode "), cut(non_empty_rest)), |mode| {
            Marker::NewFile { mode }
        }),
        map(
            preceded(tag("deleted file mode "), cut(non_empty_rest)),
            |mode| Marker::DeletedFile { mode },
        ),
        map(
            preceded(tag("similarity index "), cut(terminated(percent, char('%')))),
            |percent| Marker::Similarity { percent },
        ),
    ));
    classify(parser.parse(line))
}

/// `index <hex>..<hex>` with an optional trailing mode.
pub(crate) fn index(line: &str) -> LineMatch<IndexLine<'_>> {
    let mut parser = map(
        preceded(
            tag("index "),
            cut((
                separated_pair(object_id, tag(".."), object_id),
                preceded(opt(char(' ')), rest),
            )),
        ),
        |((before, after), mode): ((ObjectId, ObjectId), &str)| {
            let mode = mode.trim();
            IndexLine {
                before,
                after,
                mode: (!mode.is_empty()).then_some(mode),
            }
        },
    );
    classify(parser.parse(line))
}

/// Any line that ends the patch body of the current block.
pub(crate) fn starts_block(line: &str) -> bool {
    line.starts_with("diff")
}

fn object_id(input: &str) -> IResult<&str, ObjectId> {
    map_opt(hex_digit1, ObjectId::from_hex).parse(input)
}

fn non_empty_rest(input: &str) -> IResult<&str, &str> {
    verify(rest, |s: &str| !s.is_empty()).parse(input)
}

fn percent(input: &str) -> IResult<&str, u8> {
    verify(map_res(digit1, str::parse::<u8>), |p: &u8| *p <= 100).parse(input)
}

/// Split `a/<before> b/<after>` at the first ` b/` that leaves a non-empty
/// path on both sides.
fn git_paths(input: &str) -> IResult<&str, (&str, &str)> {
    let fail = || nom::Err::Error(Error::new(input, ErrorKind::Verify));

    let paths = input.strip_prefix("a/").ok_or_else(fail)?;
    let skip = paths.chars().next().map(char::len_utf8).ok_or_else(fail)?;
    let split = paths[skip..].find(" b/").ok_or_else(fail)? + skip;

    let before = &paths[..split];
    let after = &paths[split + " b/".len()..];
    if after.is_empty() {
        return Err(fail());
    }

    Ok(("", (before, after)))
}
