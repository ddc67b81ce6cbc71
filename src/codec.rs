use crate::value::Attributes;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::LazyLock;

const XML_ROOT: &str = "info";
const XML_NAME_PATTERN: &str = r"^[_\p{L}][_\p{L}\p{N}.\-]*$";
const XML_DOCUMENT_PATTERN: &str = r"(?s)^\s*(?:<info\s*/>|<info>(.*)</info>)\s*$";
const XML_ENTRY_PATTERN: &str = r"(?s)\s*<([_\p{L}][_\p{L}\p{N}.\-]*)>([^<]*)</([_\p{L}][_\p{L}\p{N}.\-]*)>";

type Pattern = LazyLock<Result<Regex, regex::Error>>;

static XML_NAME: Pattern = LazyLock::new(|| Regex::new(XML_NAME_PATTERN));
static XML_DOCUMENT: Pattern = LazyLock::new(|| Regex::new(XML_DOCUMENT_PATTERN));
static XML_ENTRY: Pattern = LazyLock::new(|| Regex::new(XML_ENTRY_PATTERN));

fn compiled(pattern: &'static Pattern) -> Result<&'static Regex, CodecError> {
    LazyLock::force(pattern)
        .as_ref()
        .map_err(|error| CodecError::Pattern(error.clone()))
}

/// Errors raised while encoding or decoding a mapping field.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid JSON mapping: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON mapping must be an object, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid XML mapping: {0}")]
    Xml(String),

    #[error("key '{0}' is not a valid XML element name")]
    XmlName(String),

    #[error("codec pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

/// Text encoding for [`Attributes`] columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingCodec {
    #[default]
    Json,
    Xml,
}

impl MappingCodec {
    pub fn encode(self, attributes: &Attributes) -> Result<String, CodecError> {
        match self {
            MappingCodec::Json => Ok(serde_json::to_string(attributes)?),
            MappingCodec::Xml => encode_xml(attributes),
        }
    }

    pub fn decode(self, text: &str) -> Result<Attributes, CodecError> {
        match self {
            MappingCodec::Json => match serde_json::from_str::<JsonValue>(text)? {
                JsonValue::Object(attributes) => Ok(attributes),
                other => Err(CodecError::NotAnObject(json_type(&other))),
            },
            MappingCodec::Xml => decode_xml(text),
        }
    }
}

fn json_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn encode_xml(attributes: &Attributes) -> Result<String, CodecError> {
    let name = compiled(&XML_NAME)?;
    let mut xml = format!("<{XML_ROOT}>");
    for (key, value) in attributes {
        if !name.is_match(key) {
            return Err(CodecError::XmlName(key.clone()));
        }
        let text = match value {
            JsonValue::String(text) => text.clone(),
            JsonValue::Null => String::new(),
            other => other.to_string(),
        };
        xml.push_str(&format!("<{key}>{}</{key}>", escape(&text)));
    }
    xml.push_str(&format!("</{XML_ROOT}>"));
    Ok(xml)
}

fn decode_xml(text: &str) -> Result<Attributes, CodecError> {
    let document = compiled(&XML_DOCUMENT)?;
    let entries = compiled(&XML_ENTRY)?;

    let captures = document
        .captures(text)
        .ok_or_else(|| CodecError::Xml(format!("expected <{XML_ROOT}> document")))?;
    let Some(body) = captures.get(1) else {
        return Ok(Attributes::new());
    };
    let body = body.as_str();

    let mut attributes = Attributes::new();
    let mut consumed = 0;
    for entry in entries.captures_iter(body) {
        let (Some(span), Some(open), Some(value), Some(close)) =
            (entry.get(0), entry.get(1), entry.get(2), entry.get(3))
        else {
            continue;
        };
        if span.start() != consumed {
            return Err(CodecError::Xml(format!(
                "unexpected content at offset {consumed}"
            )));
        }
        if open.as_str() != close.as_str() {
            return Err(CodecError::Xml(format!(
                "<{}> closed by </{}>",
                open.as_str(),
                close.as_str()
            )));
        }
        attributes.insert(open.as_str().to_owned(), scalar(&unescape(value.as_str())));
        consumed = span.end();
    }
    if !body[consumed..].trim().is_empty() {
        return Err(CodecError::Xml(format!(
            "unexpected content at offset {consumed}"
        )));
    }
    Ok(attributes)
}

// Element text is untyped; literals that read back as numbers or booleans keep
// that type, everything else stays a string.
fn scalar(text: &str) -> JsonValue {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(value @ (JsonValue::Bool(_) | JsonValue::Number(_))) => value,
        _ => JsonValue::String(text.to_owned()),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attributes(value: JsonValue) -> Attributes {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_json_round_trip() {
        let source = attributes(json!({"speedLimit": 80, "alarm": "sos", "ignition": true}));
        let text = MappingCodec::Json.encode(&source).unwrap();
        assert_eq!(MappingCodec::Json.decode(&text).unwrap(), source);
    }

    #[test]
    fn test_json_rejects_malformed_and_non_objects() {
        assert!(matches!(
            MappingCodec::Json.decode("{not json"),
            Err(CodecError::Json(_))
        ));
        assert!(matches!(
            MappingCodec::Json.decode("[1, 2]"),
            Err(CodecError::NotAnObject("array"))
        ));
    }

    #[test]
    fn test_xml_encode_shape_and_escaping() {
        let source = attributes(json!({"alarm": "a<b & 'c'", "power": 12.5}));
        let text = MappingCodec::Xml.encode(&source).unwrap();
        assert_eq!(
            text,
            "<info><alarm>a&lt;b &amp; &apos;c&apos;</alarm><power>12.5</power></info>"
        );
    }

    #[test]
    fn test_xml_decode_restores_scalars() {
        let decoded = MappingCodec::Xml
            .decode("<info>\n  <ignition>true</ignition>\n  <odometer>1200</odometer>\n  <driver>J &amp; K</driver>\n</info>")
            .unwrap();
        assert_eq!(
            decoded,
            attributes(json!({"ignition": true, "odometer": 1200, "driver": "J & K"}))
        );
    }

    #[test]
    fn test_xml_empty_documents() {
        assert!(MappingCodec::Xml.decode("<info/>").unwrap().is_empty());
        assert!(MappingCodec::Xml.decode("<info></info>").unwrap().is_empty());
        let text = MappingCodec::Xml.encode(&Attributes::new()).unwrap();
        assert_eq!(text, "<info></info>");
    }

    #[test]
    fn test_xml_patterns_compile_once() {
        for pattern in [&XML_NAME, &XML_DOCUMENT, &XML_ENTRY] {
            let first = compiled(pattern).unwrap();
            assert!(std::ptr::eq(first, compiled(pattern).unwrap()));
        }
    }

    #[test]
    fn test_xml_rejects_bad_input() {
        assert!(matches!(
            MappingCodec::Xml.decode("{\"a\": 1}"),
            Err(CodecError::Xml(_))
        ));
        assert!(matches!(
            MappingCodec::Xml.decode("<info><a>1</b></info>"),
            Err(CodecError::Xml(_))
        ));
        assert!(matches!(
            MappingCodec::Xml.decode("<info>junk<a>1</a></info>"),
            Err(CodecError::Xml(_))
        ));
        assert!(matches!(
            MappingCodec::Xml.encode(&attributes(json!({"two words": 1}))),
            Err(CodecError::XmlName(_))
        ));
    }
}
