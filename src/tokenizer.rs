//! Reference event source: pull tokenizer over XML text
//!
//! Produces the [`Event`] stream the decoder consumes, validating lexical
//! well-formedness (matching tags, UTF-8, entities) on the way. The decoder
//! itself never reads bytes; any event source honoring the same contract can
//! drive it.

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::event::Event;

/// Cursor for navigating byte input with position tracking
#[derive(Clone, Debug)]
struct Cursor<'a> {
    input: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
}

impl<'a> Cursor<'a> {
    const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn current(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_bytes(&self, len: usize) -> Option<&[u8]> {
        self.input.get(self.pos..self.pos.saturating_add(len))
    }

    fn advance(&mut self) {
        if let Some(b) = self.current() {
            self.pos += 1;
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
    }

    fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.current() {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                self.advance();
            } else {
                break;
            }
        }
    }

    const fn position(&self) -> Pos {
        Pos::new(self.pos, self.line, self.col)
    }

    const fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    const fn pos(&self) -> usize {
        self.pos
    }

    fn slice_from(&self, start: usize) -> &'a [u8] {
        self.input.get(start..self.pos).unwrap_or_default()
    }
}

/// Pull tokenizer emitting XML parse events
#[derive(Debug)]
pub struct Tokenizer<'a> {
    cursor: Cursor<'a>,
    /// Names of currently open elements, innermost last
    open: Vec<String>,
    /// End event owed after a self-closing tag
    pending_end: Option<String>,
    root_closed: bool,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer over raw input bytes
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(input),
            open: Vec::new(),
            pending_end: None,
            root_closed: false,
        }
    }

    /// Produce the next event, or `None` at end of input
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        if let Some(name) = self.pending_end.take() {
            if self.open.is_empty() {
                self.root_closed = true;
            }
            return Ok(Some(Event::EndElement(name)));
        }

        loop {
            if self.open.is_empty() {
                self.cursor.skip_whitespace();
                if self.cursor.is_eof() {
                    return Ok(None);
                }
                if self.root_closed && self.cursor.current() != Some(b'<') {
                    return Err(self.error_here("content after document element"));
                }
            }

            match self.cursor.current() {
                None => {
                    // Only reachable with elements still open
                    return Err(Error::at(
                        ErrorKind::UnterminatedElement,
                        self.cursor.pos(),
                        self.cursor.position().line,
                        self.cursor.position().col,
                    ));
                }
                Some(b'<') => {
                    if let Some(event) = self.markup()? {
                        return Ok(Some(event));
                    }
                    // Comment/PI/declaration: keep scanning
                }
                Some(_) => {
                    let text = self.text_run()?;
                    return Ok(Some(Event::Characters(text)));
                }
            }
        }
    }

    /// Collect every remaining event
    pub fn events(&mut self) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        while let Some(event) = self.next_event()? {
            events.push(event);
        }
        Ok(events)
    }

    /// Handle one `<`-introduced construct; `None` means it was skippable
    /// markup (comment, PI, declaration)
    fn markup(&mut self) -> Result<Option<Event>> {
        self.expect_byte(b'<')?;

        match self.cursor.current() {
            Some(b'?') => {
                self.cursor.advance();
                self.skip_until(b"?>")?;
                Ok(None)
            }
            Some(b'!') => {
                if self.cursor.peek_bytes(3) == Some(b"!--") {
                    self.cursor.advance_by(3);
                    self.skip_until(b"-->")?;
                    return Ok(None);
                }
                if self.cursor.peek_bytes(8) == Some(b"![CDATA[") {
                    self.cursor.advance_by(8);
                    let text = self.cdata_run()?;
                    return Ok(Some(Event::Characters(text)));
                }
                // DOCTYPE and friends
                self.skip_until(b">")?;
                Ok(None)
            }
            Some(b'/') => {
                self.cursor.advance();
                self.close_tag().map(Some)
            }
            Some(_) => self.open_tag().map(Some),
            None => Err(Error::at(
                ErrorKind::UnterminatedElement,
                self.cursor.pos(),
                self.cursor.position().line,
                self.cursor.position().col,
            )),
        }
    }

    fn open_tag(&mut self) -> Result<Event> {
        if self.root_closed {
            return Err(self.error_here("document has more than one root element"));
        }

        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.cursor.current() == Some(b'/') {
            self.cursor.advance();
            self.expect_byte(b'>')?;
            // Self-closing: the matching end event follows immediately
            self.pending_end = Some(name.clone());
            return Ok(Event::StartElement { name, attributes });
        }

        self.expect_byte(b'>')?;
        self.open.push(name.clone());
        Ok(Event::StartElement { name, attributes })
    }

    fn close_tag(&mut self) -> Result<Event> {
        let name = self.parse_name()?;
        self.cursor.skip_whitespace();
        self.expect_byte(b'>')?;

        match self.open.pop() {
            Some(expected) if expected == name => {
                if self.open.is_empty() {
                    self.root_closed = true;
                }
                Ok(Event::EndElement(name))
            }
            Some(expected) => Err(Error::with_message(
                ErrorKind::UnbalancedTags {
                    expected,
                    found: format!("</{name}>"),
                },
                Span::new(self.cursor.position(), self.cursor.position()),
                "mismatched closing tag",
            )),
            None => Err(self.error_here("closing tag without open element")),
        }
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) => {}
                None => return Err(self.error_here("unexpected end of input")),
            }

            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(Error::at(
                    ErrorKind::DuplicateAttribute { name },
                    self.cursor.pos(),
                    self.cursor.position().line,
                    self.cursor.position().col,
                ));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => return Err(self.error_here("expected quoted attribute value")),
        };
        self.cursor.advance();

        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = bytes_to_string(raw)?;
                return decode_entities(&text);
            }
            self.cursor.advance();
        }

        Err(self.error_here("unterminated attribute value"))
    }

    fn text_run(&mut self) -> Result<String> {
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = self.cursor.slice_from(start);
        let text = bytes_to_string(raw)?;
        decode_entities(&text)
    }

    /// Raw character run inside `<![CDATA[ ... ]]>`; no entity decoding
    fn cdata_run(&mut self) -> Result<String> {
        let start = self.cursor.pos();
        while self.cursor.current().is_some() {
            if self.cursor.peek_bytes(3) == Some(b"]]>") {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance_by(3);
                return bytes_to_string(raw);
            }
            self.cursor.advance();
        }
        Err(self.error_here("unterminated CDATA section"))
    }

    fn parse_name(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();

        let Some(first) = self.cursor.current() else {
            return Err(self.error_here("expected name"));
        };
        if !is_name_start(first) {
            return Err(Error::at(
                ErrorKind::InvalidToken,
                start_pos.offset,
                start_pos.line,
                start_pos.col,
            ));
        }

        self.cursor.advance();
        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        let raw = self.cursor.slice_from(start);
        bytes_to_string(raw)
    }

    fn skip_until(&mut self, pattern: &[u8]) -> Result<()> {
        while self.cursor.current().is_some() {
            if self.cursor.peek_bytes(pattern.len()) == Some(pattern) {
                self.cursor.advance_by(pattern.len());
                return Ok(());
            }
            self.cursor.advance();
        }
        Err(self.error_here("unterminated markup"))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.current() == Some(expected) {
            self.cursor.advance();
            Ok(())
        } else {
            Err(self.error_here("unexpected token"))
        }
    }

    fn error_here(&self, message: &str) -> Error {
        let pos = self.cursor.position();
        Error::with_message(
            ErrorKind::InvalidToken,
            Span::new(pos, pos),
            message.to_string(),
        )
    }
}

fn bytes_to_string(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(|s| s.to_string())
        .map_err(|_| Error::new(ErrorKind::InvalidUtf8, Span::empty()))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':')
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str) -> Result<String> {
    let mut result = String::new();
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '&' {
            result.push(ch);
            continue;
        }

        let mut entity = String::new();
        let mut terminated = false;
        for next in chars.by_ref() {
            if next == ';' {
                terminated = true;
                break;
            }
            entity.push(next);
        }

        let decoded = if terminated {
            match entity.as_str() {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => decode_numeric_entity(&entity),
            }
        } else {
            None
        };

        match decoded {
            Some(ch) => result.push(ch),
            None => {
                return Err(Error::new(
                    ErrorKind::InvalidEntity { entity },
                    Span::empty(),
                ));
            }
        }
    }

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_events(input: &[u8]) -> Result<Vec<Event>> {
        Tokenizer::new(input).events()
    }

    #[test]
    fn test_simple_element() -> Result<()> {
        let events = all_events(b"<root>hi</root>")?;
        assert_eq!(
            events,
            vec![Event::start("root"), Event::text("hi"), Event::end("root")]
        );
        Ok(())
    }

    #[test]
    fn test_self_closing_emits_both_events() -> Result<()> {
        let events = all_events(b"<root><tag/></root>")?;
        assert_eq!(
            events,
            vec![
                Event::start("root"),
                Event::start("tag"),
                Event::end("tag"),
                Event::end("root"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_attributes_in_document_order() -> Result<()> {
        let events = all_events(b"<root id=\"1\" name='test'></root>")?;
        let Some(Event::StartElement { attributes, .. }) = events.first() else {
            return Err(Error::new(ErrorKind::InvalidToken, Span::empty()));
        };
        let pairs: Vec<_> = attributes.iter().collect();
        assert_eq!(
            pairs,
            vec![
                (&"id".to_string(), &"1".to_string()),
                (&"name".to_string(), &"test".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_duplicate_attribute_rejected() {
        let err = all_events(b"<root a=\"1\" a=\"2\"></root>").unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::DuplicateAttribute { name } if name == "a"
        ));
    }

    #[test]
    fn test_prolog_comments_and_pi_are_skipped() -> Result<()> {
        let input = b"<?xml version=\"1.0\"?><!-- hi --><root><?pi data?><!-- x --><a>1</a></root>";
        let events = all_events(input)?;
        assert_eq!(
            events,
            vec![
                Event::start("root"),
                Event::start("a"),
                Event::text("1"),
                Event::end("a"),
                Event::end("root"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_cdata_is_raw_text() -> Result<()> {
        let events = all_events(b"<root><![CDATA[a < b & c]]></root>")?;
        assert_eq!(
            events,
            vec![
                Event::start("root"),
                Event::text("a < b & c"),
                Event::end("root"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_entities_decoded() -> Result<()> {
        let events = all_events(b"<root>a &lt;,&gt; b &amp; &#65;&#x42;</root>")?;
        assert_eq!(
            events,
            vec![
                Event::start("root"),
                Event::text("a <,> b & AB"),
                Event::end("root"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_unknown_entity_rejected() {
        let err = all_events(b"<root>&nope;</root>").unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::InvalidEntity { entity } if entity == "nope"
        ));
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = all_events(b"<a><b></a></b>").unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnbalancedTags { expected, found }
                if expected == "b" && found == "</a>"
        ));
    }

    #[test]
    fn test_unterminated_element() {
        let err = all_events(b"<root><a>text").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UnterminatedElement);
    }

    #[test]
    fn test_second_root_rejected() {
        let err = all_events(b"<a></a><b></b>").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidToken);
    }

    #[test]
    fn test_empty_input_yields_no_events() -> Result<()> {
        assert!(all_events(b"")?.is_empty());
        assert!(all_events(b"  \n ")?.is_empty());
        Ok(())
    }

    #[test]
    fn test_whitespace_between_elements_is_surfaced() -> Result<()> {
        let events = all_events(b"<root>\n  <a>1</a>\n</root>")?;
        assert_eq!(
            events,
            vec![
                Event::start("root"),
                Event::text("\n  "),
                Event::start("a"),
                Event::text("1"),
                Event::end("a"),
                Event::text("\n"),
                Event::end("root"),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let err = all_events(b"<root>\xff\xfe</root>").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidUtf8);
    }
}
