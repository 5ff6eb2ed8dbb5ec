//! Execution payload rewriting
//!
//! Wire format sent to the backend on the lineage path:
//!
//! ```text
//! [%%<passthrough magic line>]
//! %%execute_cell <selfId> <parentId>
//! <user source, verbatim>
//! ```
//!
//! `<parentId>` is empty for graph roots.

use crate::types::NodeName;
use std::fmt;

/// Prefix of an interpreter cell magic
pub const CELL_MAGIC_PREFIX: &str = "%%";

/// Name of the backend magic that receives lineage
pub const EXECUTE_CELL_MAGIC: &str = "execute_cell";

/// The synthesized `%%execute_cell` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecuteCellHeader {
    /// Identity of the executing cell
    pub node: NodeName,
    /// Nearest participating ancestor, `None` for roots
    pub parent: Option<NodeName>,
}

impl ExecuteCellHeader {
    /// Header for a node and its resolved parent
    #[must_use]
    pub fn new(node: NodeName, parent: Option<NodeName>) -> Self {
        Self { node, parent }
    }

    /// Parse a header line as the backend magic reads it
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let args = line
            .strip_prefix(CELL_MAGIC_PREFIX)?
            .strip_prefix(EXECUTE_CELL_MAGIC)?;
        if !args.is_empty() && !args.starts_with(' ') {
            return None;
        }
        let args = args.trim_start();
        let (node, parent) = args.split_once(' ').unwrap_or((args, ""));
        if node.is_empty() {
            return None;
        }
        let parent = parent.trim_end();
        Some(Self {
            node: NodeName::new(node),
            parent: (!parent.is_empty()).then(|| NodeName::new(parent)),
        })
    }
}

impl fmt::Display for ExecuteCellHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{CELL_MAGIC_PREFIX}{EXECUTE_CELL_MAGIC} {} {}",
            self.node,
            self.parent.as_ref().map_or("", NodeName::as_str)
        )
    }
}

/// Split a leading cell magic line off the source.
///
/// Returns the magic line (without its newline) and the remaining body.
#[must_use]
pub fn split_cell_magic(source: &str) -> (Option<&str>, &str) {
    if !source.starts_with(CELL_MAGIC_PREFIX) {
        return (None, source);
    }
    match source.split_once('\n') {
        Some((magic, body)) => (Some(magic), body),
        None => (Some(source), ""),
    }
}

/// Build the lineage payload for `source`
#[must_use]
pub fn rewrite_source(source: &str, header: &ExecuteCellHeader) -> String {
    match split_cell_magic(source) {
        (Some(magic), body) => format!("{magic}\n{header}\n{body}"),
        (None, body) => format!("{header}\n{body}"),
    }
}

/// A lineage payload taken apart again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPayload<'a> {
    /// Passthrough magic line, if any
    pub magic: Option<&'a str>,
    /// Lineage header
    pub header: ExecuteCellHeader,
    /// User source
    pub body: &'a str,
}

/// Inverse of [`rewrite_source`]; `None` for payloads without a header
#[must_use]
pub fn decode_payload(text: &str) -> Option<DecodedPayload<'_>> {
    let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
    if let Some(header) = ExecuteCellHeader::parse(first) {
        return Some(DecodedPayload {
            magic: None,
            header,
            body: rest,
        });
    }
    let (second, body) = rest.split_once('\n').unwrap_or((rest, ""));
    let header = ExecuteCellHeader::parse(second)?;
    Some(DecodedPayload {
        magic: Some(first),
        header,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn header(node: &str, parent: Option<&str>) -> ExecuteCellHeader {
        ExecuteCellHeader::new(NodeName::new(node), parent.map(NodeName::new))
    }

    #[test]
    fn root_header_has_empty_parent() {
        assert_eq!(header("idA", None).to_string(), "%%execute_cell idA ");
        assert_eq!(
            rewrite_source("a = 1", &header("idA", None)),
            "%%execute_cell idA \na = 1"
        );
    }

    #[test]
    fn child_header_names_parent() {
        assert_eq!(
            rewrite_source("b = a", &header("idB", Some("idA"))),
            "%%execute_cell idB idA\nb = a"
        );
    }

    #[test]
    fn cell_magic_stays_in_front() {
        assert_eq!(
            rewrite_source("%%time\nx=1", &header("s1", Some("p1"))),
            "%%time\n%%execute_cell s1 p1\nx=1"
        );
    }

    #[test]
    fn magic_only_source() {
        assert_eq!(split_cell_magic("%%time"), (Some("%%time"), ""));
        assert_eq!(
            rewrite_source("%%time", &header("s", None)),
            "%%time\n%%execute_cell s \n"
        );
    }

    #[test]
    fn line_magic_is_not_split() {
        assert_eq!(split_cell_magic("%time x=1"), (None, "%time x=1"));
    }

    #[test]
    fn parse_header_variants() {
        assert_eq!(
            ExecuteCellHeader::parse("%%execute_cell a b"),
            Some(header("a", Some("b")))
        );
        assert_eq!(
            ExecuteCellHeader::parse("%%execute_cell a "),
            Some(header("a", None))
        );
        assert_eq!(
            ExecuteCellHeader::parse("%%execute_cell  a b"),
            Some(header("a", Some("b")))
        );
        assert_eq!(ExecuteCellHeader::parse("%%execute_cellx a b"), None);
        assert_eq!(ExecuteCellHeader::parse("%%execute_cell"), None);
        assert_eq!(ExecuteCellHeader::parse("%%time"), None);
    }

    #[test]
    fn decode_recovers_parts() {
        let text = rewrite_source("%%time\nx=1\ny=2", &header("s1", Some("p1")));
        let decoded = decode_payload(&text).unwrap();
        assert_eq!(decoded.magic, Some("%%time"));
        assert_eq!(decoded.header, header("s1", Some("p1")));
        assert_eq!(decoded.body, "x=1\ny=2");

        assert!(decode_payload("#pragma nodebook off\nprint(1)").is_none());
    }
}
