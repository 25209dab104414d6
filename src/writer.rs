//! XML text encoder for value trees
//!
//! The inverse of the decoder: sequence entries repeat their parent key's
//! element name, [`Value::Empty`] becomes a self-closing tag, and text is
//! entity-escaped. No attributes are emitted, matching what the decoder
//! surfaces.

use crate::value::Value;

/// Serialize a value tree under a caller-supplied root element name
pub fn write_xml(root_name: &str, value: &Value) -> String {
    let mut output = String::new();
    write_element(root_name, value, &mut output);
    output
}

fn write_element(name: &str, value: &Value, output: &mut String) {
    match value {
        Value::Sequence(seq) => {
            for item in seq {
                write_element(name, item, output);
            }
        }
        Value::Empty => {
            output.push('<');
            output.push_str(name);
            output.push_str("/>");
        }
        Value::Text(text) => {
            output.push('<');
            output.push_str(name);
            output.push('>');
            escape_into(text, output);
            output.push_str("</");
            output.push_str(name);
            output.push('>');
        }
        Value::Mapping(map) => {
            output.push('<');
            output.push_str(name);
            output.push('>');
            for (key, child) in map {
                write_element(key, child, output);
            }
            output.push_str("</");
            output.push_str(name);
            output.push('>');
        }
    }
}

fn escape_into(text: &str, output: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Mapping, Sequence};

    #[test]
    fn test_write_scalar() {
        let value = Value::Text("hello".to_string());
        assert_eq!(write_xml("a", &value), "<a>hello</a>");
    }

    #[test]
    fn test_write_empty_marker_is_self_closing() {
        assert_eq!(write_xml("tag", &Value::Empty), "<tag/>");
    }

    #[test]
    fn test_write_mapping_preserves_order() {
        let mut map = Mapping::new();
        map.insert("name", "Al");
        map.insert("age", "5");
        let value = Value::Mapping(map);

        assert_eq!(
            write_xml("person", &value),
            "<person><name>Al</name><age>5</age></person>"
        );
    }

    #[test]
    fn test_write_sequence_repeats_element_name() {
        let mut map = Mapping::new();
        map.insert(
            "item",
            Value::Sequence(Sequence::from(vec![
                Value::Text("1".to_string()),
                Value::Text("2".to_string()),
            ])),
        );
        let value = Value::Mapping(map);

        assert_eq!(
            write_xml("root", &value),
            "<root><item>1</item><item>2</item></root>"
        );
    }

    #[test]
    fn test_write_escapes_markup_characters() {
        let value = Value::Text("a < b & c > d".to_string());
        assert_eq!(write_xml("t", &value), "<t>a &lt; b &amp; c &gt; d</t>");
    }
}
