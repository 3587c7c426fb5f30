//! `{{name}}` substitution inside WordprocessingML.
//!
//! Word splits text into runs wherever formatting, spell-check state or edit
//! history changes, so a token typed as `{{title}}` can arrive as
//! `{{ti` + `tle}}` in two `w:t` nodes. Substitution works on the joined
//! text of each paragraph: the value goes into the node where the token
//! starts and the token's characters are removed from the nodes it spans.
//! Run properties are never touched.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use regex::Regex;

use crate::error::XmlError;

/// `{{ name }}` with a dotted identifier name.
pub static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z][A-Za-z0-9_.]*)\s*\}\}").unwrap());

/// Placeholder names used in `text`.
pub fn placeholder_names(text: &str) -> BTreeSet<String> {
    TOKEN
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// A `w:t` text event and where it sits in the event list.
struct TextNode {
    event: usize,
    open_tag: Option<usize>,
    text: String,
}

/// Changes to apply when writing the events back out.
#[derive(Default)]
struct Rewrites {
    /// Text event index to its new text.
    text: HashMap<usize, String>,
    /// `w:t` start tags that need `xml:space="preserve"`.
    preserve: BTreeSet<usize>,
}

/// Replace tokens in an XML fragment.
///
/// `resolve` returns the value for a name, or `None` to leave that token as
/// written. Returns `Ok(None)` when nothing was replaced.
pub fn substitute(
    xml: &str,
    resolve: &mut dyn FnMut(&str) -> Option<String>,
) -> Result<Option<String>, XmlError> {
    let mut reader = Reader::from_str(xml);
    let mut events: Vec<Event<'static>> = Vec::new();

    // Stack of open paragraphs; the bottom group catches text outside any.
    let mut groups: Vec<Vec<TextNode>> = vec![Vec::new()];
    let mut open_t: Option<usize> = None;
    let mut rewrites = Rewrites::default();

    loop {
        let event = reader.read_event().map_err(XmlError::parse)?;
        let idx = events.len();
        match &event {
            Event::Eof => break,
            Event::Start(e) if e.name().as_ref() == b"w:p" => groups.push(Vec::new()),
            Event::Start(e) if e.name().as_ref() == b"w:t" => open_t = Some(idx),
            Event::End(e) if e.name().as_ref() == b"w:t" => open_t = None,
            Event::End(e) if e.name().as_ref() == b"w:p" => {
                if groups.len() > 1 {
                    if let Some(group) = groups.pop() {
                        replace_in_group(&group, resolve, &mut rewrites);
                    }
                }
            }
            Event::Text(t) if open_t.is_some() => {
                let text = t.unescape().map_err(XmlError::parse)?.into_owned();
                if let Some(group) = groups.last_mut() {
                    group.push(TextNode {
                        event: idx,
                        open_tag: open_t,
                        text,
                    });
                }
            }
            _ => {}
        }
        events.push(event.into_owned());
    }
    while let Some(group) = groups.pop() {
        replace_in_group(&group, resolve, &mut rewrites);
    }

    if rewrites.text.is_empty() {
        return Ok(None);
    }

    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    for (idx, event) in events.into_iter().enumerate() {
        if let Some(text) = rewrites.text.get(&idx) {
            write_text(&mut writer, text)?;
        } else if rewrites.preserve.contains(&idx) {
            writer
                .write_event(Event::Start(with_preserve(&event)))
                .map_err(XmlError::write)?;
        } else {
            writer.write_event(event).map_err(XmlError::write)?;
        }
    }
    String::from_utf8(writer.into_inner())
        .map(Some)
        .map_err(XmlError::write)
}

/// Replace tokens across one paragraph's text nodes, recording the new text
/// of every node that changed.
fn replace_in_group(
    nodes: &[TextNode],
    resolve: &mut dyn FnMut(&str) -> Option<String>,
    rewrites: &mut Rewrites,
) {
    if nodes.is_empty() {
        return;
    }
    let joined: String = nodes.iter().map(|n| n.text.as_str()).collect();
    if !joined.contains("{{") {
        return;
    }

    let mut bounds = Vec::with_capacity(nodes.len());
    let mut offset = 0;
    for node in nodes {
        bounds.push((offset, offset + node.text.len()));
        offset += node.text.len();
    }

    let mut outs: Vec<String> = vec![String::new(); nodes.len()];
    let copy = |outs: &mut Vec<String>, start: usize, end: usize| {
        for (i, &(ns, ne)) in bounds.iter().enumerate() {
            let (s, e) = (start.max(ns), end.min(ne));
            if s < e {
                outs[i].push_str(&joined[s..e]);
            }
        }
    };

    let mut cursor = 0;
    let mut changed = false;
    for caps in TOKEN.captures_iter(&joined) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(value) = resolve(&caps[1]) else {
            continue;
        };
        copy(&mut outs, cursor, whole.start());
        if let Some(i) = bounds
            .iter()
            .position(|&(ns, ne)| ns <= whole.start() && whole.start() < ne)
        {
            outs[i].push_str(&value);
        }
        cursor = whole.end();
        changed = true;
    }
    if !changed {
        return;
    }
    copy(&mut outs, cursor, joined.len());

    for (node, out) in nodes.iter().zip(outs) {
        if out != node.text {
            rewrites.text.insert(node.event, out);
            rewrites.preserve.extend(node.open_tag);
        }
    }
}

fn with_preserve(event: &Event<'_>) -> BytesStart<'static> {
    let mut start = match event {
        Event::Start(e) => e.clone().into_owned(),
        _ => BytesStart::new("w:t"),
    };
    let has_space = start
        .attributes()
        .flatten()
        .any(|a| a.key.as_ref() == b"xml:space");
    if !has_space {
        start.push_attribute(("xml:space", "preserve"));
    }
    start
}

/// Write replacement text; each `\n` becomes a `w:br` between `w:t` nodes of
/// the same run.
fn write_text(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<(), XmlError> {
    let text = text.replace("\r\n", "\n");
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            let mut reopen = BytesStart::new("w:t");
            reopen.push_attribute(("xml:space", "preserve"));
            writer
                .write_event(Event::End(BytesEnd::new("w:t")))
                .map_err(XmlError::write)?;
            writer
                .write_event(Event::Empty(BytesStart::new("w:br")))
                .map_err(XmlError::write)?;
            writer
                .write_event(Event::Start(reopen))
                .map_err(XmlError::write)?;
        }
        if !line.is_empty() {
            writer
                .write_event(Event::Text(BytesText::new(line)))
                .map_err(XmlError::write)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(xml: &str, pairs: &[(&str, &str)]) -> Option<String> {
        let map: HashMap<&str, &str> = pairs.iter().copied().collect();
        substitute(xml, &mut |name| map.get(name).map(|v| v.to_string())).unwrap()
    }

    #[test]
    fn finds_names() {
        let names = placeholder_names("{{title}} by {{ assignee }} ({{report.date}}) {{#x}}");
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["assignee", "report.date", "title"]
        );
    }

    #[test]
    fn single_run() {
        let out = run(
            "<w:p><w:r><w:t>Title: {{title}}.</w:t></w:r></w:p>",
            &[("title", "Widget")],
        )
        .unwrap();
        assert_eq!(
            out,
            "<w:p><w:r><w:t xml:space=\"preserve\">Title: Widget.</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn token_split_across_runs_keeps_formatting() {
        let xml = "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>See {{ti</w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t>tle}} now</w:t></w:r></w:p>";
        let out = run(xml, &[("title", "Widget")]).unwrap();
        assert_eq!(
            out,
            "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space=\"preserve\">See Widget</w:t></w:r><w:r><w:rPr><w:i/></w:rPr><w:t xml:space=\"preserve\"> now</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn token_spanning_three_runs() {
        let xml = "<w:p><w:r><w:t>{{</w:t></w:r><w:r><w:t>abstract</w:t></w:r><w:r><w:t>}}</w:t></w:r></w:p>";
        let out = run(xml, &[("abstract", "A widget.")]).unwrap();
        assert_eq!(
            out,
            "<w:p><w:r><w:t xml:space=\"preserve\">A widget.</w:t></w:r><w:r><w:t xml:space=\"preserve\"></w:t></w:r><w:r><w:t xml:space=\"preserve\"></w:t></w:r></w:p>"
        );
    }

    #[test]
    fn unresolved_tokens_stay() {
        let xml = "<w:p><w:r><w:t>{{report.date}} {{title}}</w:t></w:r></w:p>";
        let out = run(xml, &[("report.date", "JUNE 1, 2024")]).unwrap();
        assert!(out.contains(">JUNE 1, 2024 {{title}}<"));
        assert_eq!(run(xml, &[]), None);
    }

    #[test]
    fn values_are_escaped() {
        let out = run(
            "<w:p><w:r><w:t>{{title}}</w:t></w:r></w:p>",
            &[("title", "A<B & C")],
        )
        .unwrap();
        assert!(out.contains("A&lt;B &amp; C"));
    }

    #[test]
    fn newlines_become_breaks() {
        let out = run(
            "<w:p><w:r><w:t>{{claims}}</w:t></w:r></w:p>",
            &[("claims", "1. One.\n\n2. Two.")],
        )
        .unwrap();
        assert_eq!(
            out,
            "<w:p><w:r><w:t xml:space=\"preserve\">1. One.</w:t><w:br/><w:t xml:space=\"preserve\"></w:t><w:br/><w:t xml:space=\"preserve\">2. Two.</w:t></w:r></w:p>"
        );
    }

    #[test]
    fn existing_preserve_attribute_not_duplicated() {
        let out = run(
            "<w:p><w:r><w:t xml:space=\"preserve\"> {{title}} </w:t></w:r></w:p>",
            &[("title", "X")],
        )
        .unwrap();
        assert_eq!(out.matches("xml:space").count(), 1);
        assert!(out.contains("> X <"));
    }

    #[test]
    fn tokens_do_not_join_across_paragraphs() {
        let xml = "<w:tc><w:p><w:r><w:t>{{ti</w:t></w:r></w:p><w:p><w:r><w:t>tle}}</w:t></w:r></w:p></w:tc>";
        assert_eq!(run(xml, &[("title", "X")]), None);
    }

    #[test]
    fn table_cells_each_substituted() {
        let xml = "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>{{identifier}}</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>{{title}}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>";
        let out = run(xml, &[("identifier", "US1"), ("title", "Widget")]).unwrap();
        assert!(out.contains(">US1<"));
        assert!(out.contains(">Widget<"));
    }
}
