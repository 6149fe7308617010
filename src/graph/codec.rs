//! graph::codec
//!
//! Line-oriented text encoding of a triple store, one triple per line:
//!
//! ```text
//! <vpc-1> <cloud:vpc/Name> "main"^^xsd:string .
//! <vpc-1> <rdf:type> "vpc"^^xsd:string .
//! <vpc-1> <rel:parent_of> <subnet-1> .
//! ```
//!
//! Writers emit triples in canonical order, so encoding the same content
//! twice yields identical bytes. Blank lines and lines starting with `#`
//! are ignored on read.

use std::io::{self, BufRead, Write};
use std::iter::Peekable;
use std::str::Chars;

use thiserror::Error;

use super::triple::{Datatype, Literal, Object, Triple};
use super::GraphError;

/// A syntax error in encoded input.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct CodecError {
    pub line: usize,
    pub message: String,
}

/// Write triples, one per line, in the order given.
pub fn write_triples<'a, W>(
    triples: impl Iterator<Item = (&'a str, &'a str, &'a Object)>,
    writer: &mut W,
) -> io::Result<()>
where
    W: Write + ?Sized,
{
    let mut line = String::new();
    for (subject, predicate, object) in triples {
        line.clear();
        push_node(&mut line, subject);
        line.push(' ');
        push_node(&mut line, predicate);
        line.push(' ');
        match object {
            Object::Node(node) => push_node(&mut line, node),
            Object::Literal(lit) => push_literal(&mut line, lit),
        }
        line.push_str(" .\n");
        writer.write_all(line.as_bytes())?;
    }
    writer.flush()
}

/// Encode one triple as a line without its trailing newline.
pub fn encode_triple(triple: &Triple) -> String {
    let mut buf = Vec::new();
    // writing into a Vec cannot fail
    let _ = write_triples(
        std::iter::once((
            triple.subject.as_str(),
            triple.predicate.as_str(),
            &triple.object,
        )),
        &mut buf,
    );
    let mut line = String::from_utf8_lossy(&buf).into_owned();
    line.truncate(line.trim_end().len());
    line
}

/// Read every triple from `reader`.
pub fn read_triples<R: BufRead>(reader: R) -> Result<Vec<Triple>, GraphError> {
    let mut triples = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let triple = parse_line(trimmed).map_err(|message| CodecError {
            line: idx + 1,
            message,
        })?;
        triples.push(triple);
    }
    Ok(triples)
}

fn push_node(out: &mut String, value: &str) {
    out.push('<');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '>' => out.push_str("\\>"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('>');
}

fn push_literal(out: &mut String, lit: &Literal) {
    out.push('"');
    for c in lit.lexical.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push_str("\"^^");
    out.push_str(lit.datatype.as_str());
}

fn parse_line(line: &str) -> Result<Triple, String> {
    let mut chars = line.chars().peekable();

    let subject = parse_node(&mut chars).map_err(|e| format!("subject: {e}"))?;
    skip_ws(&mut chars);
    let predicate = parse_node(&mut chars).map_err(|e| format!("predicate: {e}"))?;
    skip_ws(&mut chars);
    let object = match chars.peek() {
        Some('<') => Object::Node(parse_node(&mut chars).map_err(|e| format!("object: {e}"))?),
        Some('"') => Object::Literal(parse_literal(&mut chars)?),
        Some(c) => return Err(format!("object: unexpected '{c}'")),
        None => return Err("object: missing".to_string()),
    };
    skip_ws(&mut chars);

    if chars.next() != Some('.') {
        return Err("expected '.' after object".to_string());
    }
    skip_ws(&mut chars);
    if let Some(c) = chars.next() {
        return Err(format!("unexpected '{c}' after '.'"));
    }

    Ok(Triple::new(subject, predicate, object))
}

fn skip_ws(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

fn unescape(c: char) -> Option<char> {
    match c {
        '\\' => Some('\\'),
        '>' => Some('>'),
        '"' => Some('"'),
        'n' => Some('\n'),
        'r' => Some('\r'),
        't' => Some('\t'),
        _ => None,
    }
}

fn parse_node(chars: &mut Peekable<Chars<'_>>) -> Result<String, String> {
    if chars.next() != Some('<') {
        return Err("expected '<'".to_string());
    }
    let mut out = String::new();
    loop {
        match chars.next() {
            Some('>') => return Ok(out),
            Some('\\') => {
                let escaped = chars.next().ok_or("dangling escape")?;
                out.push(unescape(escaped).ok_or_else(|| format!("bad escape '\\{escaped}'"))?);
            }
            Some(c) => out.push(c),
            None => return Err("unterminated node".to_string()),
        }
    }
}

fn parse_literal(chars: &mut Peekable<Chars<'_>>) -> Result<Literal, String> {
    chars.next(); // opening quote
    let mut lexical = String::new();
    loop {
        match chars.next() {
            Some('"') => break,
            Some('\\') => {
                let escaped = chars.next().ok_or("dangling escape")?;
                lexical
                    .push(unescape(escaped).ok_or_else(|| format!("bad escape '\\{escaped}'"))?);
            }
            Some(c) => lexical.push(c),
            None => return Err("unterminated literal".to_string()),
        }
    }

    if chars.next() != Some('^') || chars.next() != Some('^') {
        return Err("expected '^^' after literal".to_string());
    }
    let mut name = String::new();
    while let Some(c) = chars.peek().copied() {
        if c.is_whitespace() {
            break;
        }
        name.push(c);
        chars.next();
    }
    let datatype = Datatype::parse(&name).ok_or_else(|| format!("unknown datatype '{name}'"))?;
    Ok(Literal::new(lexical, datatype))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_all(triples: &[Triple]) -> String {
        let mut buf = Vec::new();
        write_triples(
            triples
                .iter()
                .map(|t| (t.subject.as_str(), t.predicate.as_str(), &t.object)),
            &mut buf,
        )
        .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn encodes_nodes_and_literals() {
        let t = Triple::new("vpc-1", "cloud:Name", Object::Literal(Literal::string("main")));
        assert_eq!(encode_triple(&t), r#"<vpc-1> <cloud:Name> "main"^^xsd:string ."#);

        let t = Triple::parent_of("vpc-1", "sub-1");
        assert_eq!(encode_triple(&t), "<vpc-1> <rel:parent_of> <sub-1> .");
    }

    #[test]
    fn escapes_survive_reading() {
        let triples = vec![
            Triple::new(
                "odd>id\\x",
                "cloud:Note",
                Object::Literal(Literal::string("say \"hi\"\n\ttab\\")),
            ),
            Triple::new("a", "cloud:Cores", Object::Literal(Literal::new("4", Datatype::Int))),
        ];
        let text = write_all(&triples);
        assert_eq!(text.lines().count(), 2);
        let back = read_triples(text.as_bytes()).unwrap();
        assert_eq!(back, triples);
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        let text = "\n# header\n<a> <rdf:type> \"vpc\"^^xsd:string .\n   \n";
        let triples = read_triples(text.as_bytes()).unwrap();
        assert_eq!(triples.len(), 1);
    }

    #[test]
    fn reports_line_of_syntax_error() {
        let text = "<a> <rdf:type> \"vpc\"^^xsd:string .\n<b> <rdf:type> vpc .\n";
        let err = read_triples(text.as_bytes()).unwrap_err();
        match err {
            GraphError::Codec(CodecError { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_unknown_datatype_and_trailing_garbage() {
        assert!(parse_line("<a> <p> \"x\"^^xsd:float .").is_err());
        assert!(parse_line("<a> <p> <b> . extra").is_err());
        assert!(parse_line("<a> <p> <b>").is_err());
        assert!(parse_line("<a <p> <b> .").is_err());
    }
}
