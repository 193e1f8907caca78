//! Record text parser.
//!
//! Two passes over the input. The first only checks that parentheses
//! balance, nesting stays within [`MAX_VARIATION_DEPTH`] and every `[`
//! value is closed, so gross damage is reported with a precise position
//! before any structure is built. The second is a
//! recursive-descent parse of the collection.
//!
//! ```text
//! Collection = GameTree*
//! GameTree   = "(" Node+ GameTree* ")"
//! Node       = ";" Property*
//! Property   = Ident Value+
//! Ident      = 'A'..'Z'+
//! Value      = "[" text "]"          ; "\" escapes the next character
//! ```

use crate::constants::MAX_VARIATION_DEPTH;
use crate::error::SgfError;
use crate::sgf::property::Property;

/// A node: its properties in record order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SgfNode {
    pub properties: Vec<Property>,
}

impl SgfNode {
    pub fn find(&self, ident: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.ident() == ident)
    }
}

/// A parenthesized game tree: a node sequence followed by variations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SgfTree {
    pub nodes: Vec<SgfNode>,
    pub variations: Vec<SgfTree>,
}

impl SgfTree {
    /// Number of nodes including all variations.
    pub fn node_count(&self) -> usize {
        self.nodes.len() + self.variations.iter().map(SgfTree::node_count).sum::<usize>()
    }
}

/// Parse a whole collection. Text outside of game trees is ignored.
pub fn parse(text: &str) -> Result<Vec<SgfTree>, SgfError> {
    check_balance(text)?;
    Parser::new(text).collection()
}

/// First pass: parentheses, nesting depth and value brackets.
fn check_balance(text: &str) -> Result<(), SgfError> {
    let mut open_parens = Vec::new();
    let mut value_start = None;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if value_start.is_some() {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                ']' => value_start = None,
                _ => {}
            }
            continue;
        }
        match ch {
            '[' => value_start = Some(i),
            '(' => {
                if open_parens.len() == MAX_VARIATION_DEPTH {
                    return Err(SgfError::syntax(text, i, "variations nested too deeply"));
                }
                open_parens.push(i);
            }
            ')' => {
                if open_parens.pop().is_none() {
                    return Err(SgfError::syntax(text, i, "unmatched ')'"));
                }
            }
            _ => {}
        }
    }

    if let Some(start) = value_start {
        return Err(SgfError::syntax(text, start, "unterminated property value"));
    }
    if let Some(&start) = open_parens.last() {
        return Err(SgfError::syntax(text, start, "unmatched '('"));
    }
    Ok(())
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn error(&self, message: impl Into<String>) -> SgfError {
        SgfError::syntax(self.text, self.pos, message)
    }

    fn unexpected(&self) -> SgfError {
        match self.text[self.pos..].chars().next() {
            Some(ch) => self.error(format!("unexpected character '{ch}'")),
            None => self.error("unexpected end of input"),
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), SgfError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn collection(&mut self) -> Result<Vec<SgfTree>, SgfError> {
        let mut trees = Vec::new();
        loop {
            match self.text[self.pos..].find('(') {
                Some(offset) => self.pos += offset,
                None => return Ok(trees),
            }
            trees.push(self.game_tree()?);
        }
    }

    fn game_tree(&mut self) -> Result<SgfTree, SgfError> {
        self.expect(b'(')?;
        self.skip_whitespace();
        if self.peek() != Some(b';') {
            return Err(self.error("game tree must start with a node (';')"));
        }

        let mut tree = SgfTree::default();
        while self.peek() == Some(b';') {
            tree.nodes.push(self.node()?);
            self.skip_whitespace();
        }
        while self.peek() == Some(b'(') {
            tree.variations.push(self.game_tree()?);
            self.skip_whitespace();
        }
        self.expect(b')')?;
        Ok(tree)
    }

    fn node(&mut self) -> Result<SgfNode, SgfError> {
        self.expect(b';')?;
        let mut node = SgfNode::default();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b) if b.is_ascii_uppercase() => node.properties.push(self.property()?),
                _ => return Ok(node),
            }
        }
    }

    fn property(&mut self) -> Result<Property, SgfError> {
        let text = self.text;
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_uppercase()) {
            self.pos += 1;
        }
        let ident = &text[start..self.pos];

        self.skip_whitespace();
        if self.peek() != Some(b'[') {
            return Err(self.error(format!("property {ident} has no value")));
        }

        let mut values = Vec::new();
        while self.peek() == Some(b'[') {
            values.push(self.value()?);
            self.skip_whitespace();
        }
        Property::from_raw(ident, values, text, start)
    }

    /// Read one bracketed value, resolving escapes.
    fn value(&mut self) -> Result<String, SgfError> {
        let start = self.pos;
        self.expect(b'[')?;
        let text = self.text;
        let mut value = String::new();
        let mut chars = text[self.pos..].char_indices();
        while let Some((i, ch)) = chars.next() {
            match ch {
                '\\' => {
                    if let Some((_, next)) = chars.next() {
                        value.push(next);
                    }
                }
                ']' => {
                    self.pos += i + 1;
                    return Ok(value);
                }
                _ => value.push(ch),
            }
        }
        Err(SgfError::syntax(text, start, "unterminated property value"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Color;
    use crate::sgf::property::MoveValue;

    fn position_of(err: SgfError) -> (usize, usize) {
        match err {
            SgfError::Syntax { position, .. } => (position.line, position.column),
            other => panic!("expected a syntax error, got {other:?}"),
        }
    }

    #[test]
    fn test_simple_sequence() {
        let trees = parse("(;SZ[9];B[ee];W[ge])").unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].nodes.len(), 3);
        assert_eq!(
            trees[0].nodes[1].find("B"),
            Some(&Property::Move {
                color: Color::Black,
                value: MoveValue::At((4, 4))
            })
        );
    }

    #[test]
    fn test_variations() {
        let trees = parse("(;SZ[9];B[aa](;W[bb];B[cc])(;W[dd]))").unwrap();
        let tree = &trees[0];
        assert_eq!(tree.nodes.len(), 2);
        assert_eq!(tree.variations.len(), 2);
        assert_eq!(tree.variations[0].nodes.len(), 2);
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_whitespace_and_junk() {
        let text = "junk before\n( ; SZ [9]\n ; B [aa] [bb]\n)\ntrailer (;C[second])";
        let trees = parse(text).unwrap();
        assert_eq!(trees.len(), 2);
        assert_eq!(trees[0].nodes.len(), 2);
    }

    #[test]
    fn test_escapes() {
        let trees = parse(r"(;C[a \] b \\ c])").unwrap();
        assert_eq!(
            trees[0].nodes[0].find("C"),
            Some(&Property::Comment(r"a ] b \ c".to_string()))
        );
    }

    #[test]
    fn test_parens_inside_values_ignored() {
        let trees = parse("(;C[smile :)])").unwrap();
        assert_eq!(trees[0].nodes[0].properties.len(), 1);
    }

    #[test]
    fn test_unmatched_close() {
        let err = parse("(;B[aa]))").unwrap_err();
        assert_eq!(position_of(err), (1, 9));
    }

    #[test]
    fn test_unmatched_open() {
        let err = parse("(;B[aa]\n(;W[bb])").unwrap_err();
        assert_eq!(position_of(err), (1, 1));
    }

    #[test]
    fn test_unterminated_value() {
        let err = parse("(;\nC[never closed)").unwrap_err();
        assert_eq!(position_of(err), (2, 2));
    }

    #[test]
    fn test_property_without_value() {
        let err = parse("(;B;W[aa])").unwrap_err();
        assert!(err.to_string().contains("has no value"), "{err}");
    }

    #[test]
    fn test_tree_must_start_with_node() {
        let err = parse("(B[aa])").unwrap_err();
        assert_eq!(position_of(err), (1, 2));
    }

    #[test]
    fn test_bad_character() {
        let err = parse("(;B[aa] b[cc])").unwrap_err();
        assert!(err.to_string().contains("unexpected character 'b'"), "{err}");
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |depth: usize| format!("{}{}", "(;B[aa]".repeat(depth), ")".repeat(depth));

        let trees = parse(&nested(MAX_VARIATION_DEPTH)).unwrap();
        assert_eq!(trees[0].node_count(), MAX_VARIATION_DEPTH);

        let err = parse(&nested(MAX_VARIATION_DEPTH + 1)).unwrap_err();
        assert!(err.to_string().contains("nested too deeply"), "{err}");
        let column = MAX_VARIATION_DEPTH * "(;B[aa]".len() + 1;
        assert_eq!(position_of(err), (1, column));

        let err = parse(&nested(100_000)).unwrap_err();
        assert!(matches!(err, SgfError::Syntax { .. }));
    }

    #[test]
    fn test_empty_collection() {
        assert_eq!(parse("no record here").unwrap(), Vec::new());
    }
}
