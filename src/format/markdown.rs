//! Markdown translation
//!
//! The document is parsed into pulldown-cmark events and folded into an
//! outline tree whose nodes carry the event range they cover. Runs of
//! adjacent `Text` events become one `{"type": "text", "value": ...}` leaf so a
//! sentence split by the parser is translated as a whole. Text inside code
//! blocks, HTML blocks, metadata blocks and autolinks becomes a `literal` leaf
//! and is never sent. Translated runs are spliced back into the event stream
//! as single `Text` events and the stream is rendered with
//! pulldown-cmark-to-cmark.

use crate::error::{TranslateError, TranslateResult};
use crate::format::{DocumentTranslator, text_leaves};
use crate::tree::{ContentTree, get_at};
use pulldown_cmark::{CowStr, Event, LinkType, Options, Parser, Tag};
use serde_json::{Value, json};

fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Parse `markdown` into its event stream
pub fn events(markdown: &str) -> Vec<Event<'_>> {
    Parser::new_ext(markdown, parser_options()).collect()
}

/// Render an event stream back to Markdown
pub fn render(events: &[Event<'_>]) -> TranslateResult<String> {
    let mut out = String::new();
    pulldown_cmark_to_cmark::cmark(events.iter(), &mut out)
        .map_err(|e| TranslateError::Parse(format!("Could not render Markdown: {}", e)))?;
    Ok(out)
}

fn tag_name(tag: &Tag<'_>) -> &'static str {
    match tag {
        Tag::Paragraph => "paragraph",
        Tag::Heading { .. } => "heading",
        Tag::BlockQuote(_) => "blockquote",
        Tag::CodeBlock(_) => "code",
        Tag::HtmlBlock => "htmlBlock",
        Tag::List(_) => "list",
        Tag::Item => "listItem",
        Tag::FootnoteDefinition(_) => "footnoteDefinition",
        Tag::Table(_) => "table",
        Tag::TableHead => "tableHead",
        Tag::TableRow => "tableRow",
        Tag::TableCell => "tableCell",
        Tag::Emphasis => "emphasis",
        Tag::Strong => "strong",
        Tag::Strikethrough => "delete",
        Tag::Link { .. } => "link",
        Tag::Image { .. } => "image",
        Tag::MetadataBlock(_) => "yaml",
        _ => "other",
    }
}

/// Containers whose text is markup or source, not prose
fn is_literal(tag: &Tag<'_>) -> bool {
    match tag {
        Tag::CodeBlock(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => true,
        Tag::Link { link_type, .. } => matches!(link_type, LinkType::Autolink | LinkType::Email),
        _ => false,
    }
}

fn event_name(event: &Event<'_>) -> &'static str {
    match event {
        Event::SoftBreak => "softBreak",
        Event::HardBreak => "break",
        Event::Rule => "thematicBreak",
        Event::TaskListMarker(_) => "taskListMarker",
        Event::FootnoteReference(_) => "footnoteReference",
        Event::InlineMath(_) | Event::DisplayMath(_) => "math",
        _ => "other",
    }
}

struct Frame {
    kind: &'static str,
    start: usize,
    literal: bool,
    children: Vec<Value>,
}

impl Frame {
    fn new(kind: &'static str, start: usize, literal: bool) -> Self {
        Self {
            kind,
            start,
            literal,
            children: Vec::new(),
        }
    }
}

fn flush_run(run: &mut Option<(usize, String)>, end: usize, stack: &mut [Frame]) {
    let Some((start, value)) = run.take() else {
        return;
    };
    if let Some(frame) = stack.last_mut() {
        let kind = if frame.literal { "literal" } else { "text" };
        frame
            .children
            .push(json!({"type": kind, "start": start, "end": end, "value": value}));
    }
}

/// Fold an event stream into an outline tree
///
/// Every node records `start` and `end`, the half-open range of event indexes
/// it spans.
pub fn outline(events: &[Event<'_>]) -> ContentTree {
    let mut stack = vec![Frame::new("root", 0, false)];
    let mut run: Option<(usize, String)> = None;

    for (index, event) in events.iter().enumerate() {
        if let Event::Text(text) = event {
            match &mut run {
                Some((_, value)) => value.push_str(text),
                None => run = Some((index, text.to_string())),
            }
            continue;
        }
        flush_run(&mut run, index, &mut stack);

        match event {
            Event::Start(tag) => {
                let literal = stack.last().is_some_and(|f| f.literal) || is_literal(tag);
                stack.push(Frame::new(tag_name(tag), index, literal));
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    if let Some(frame) = stack.pop() {
                        let node = json!({
                            "type": frame.kind,
                            "start": frame.start,
                            "end": index + 1,
                            "children": frame.children,
                        });
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(node);
                        }
                    }
                }
            }
            Event::Code(code) => push_leaf(&mut stack, "inlineCode", index, code),
            Event::Html(html) | Event::InlineHtml(html) => push_leaf(&mut stack, "html", index, html),
            other => {
                if let Some(frame) = stack.last_mut() {
                    frame
                        .children
                        .push(json!({"type": event_name(other), "start": index, "end": index + 1}));
                }
            }
        }
    }
    flush_run(&mut run, events.len(), &mut stack);

    // Unbalanced streams do not occur from the parser; fold anything left
    while stack.len() > 1 {
        if let Some(frame) = stack.pop() {
            let node = json!({
                "type": frame.kind,
                "start": frame.start,
                "end": events.len(),
                "children": frame.children,
            });
            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
            }
        }
    }

    let children = stack.pop().map(|root| root.children).unwrap_or_default();
    json!({"type": "root", "start": 0, "end": events.len(), "children": children})
}

fn push_leaf(stack: &mut [Frame], kind: &str, index: usize, value: &str) {
    if let Some(frame) = stack.last_mut() {
        frame
            .children
            .push(json!({"type": kind, "start": index, "end": index + 1, "value": value}));
    }
}

fn event_range(node: &ContentTree) -> Option<(usize, usize)> {
    let start = node.get("start")?.as_u64()?;
    let end = node.get("end")?.as_u64()?;
    Some((usize::try_from(start).ok()?, usize::try_from(end).ok()?))
}

impl DocumentTranslator {
    /// Translate the prose of a Markdown document
    ///
    /// Code, inline code, HTML and link destinations are carried over
    /// unchanged. The output is re-rendered, so insignificant formatting such
    /// as list markers or emphasis delimiters may be normalised.
    pub async fn translate_markdown(&self, markdown: &str) -> TranslateResult<String> {
        if markdown.trim().is_empty() {
            return Ok(markdown.to_string());
        }

        let mut events = events(markdown);
        let tree = outline(&events);
        let leaves = text_leaves(&tree, "value", "type", "text");
        let translated = self.translate_leaves(tree.clone(), leaves.clone()).await?;

        let mut splices: Vec<(usize, usize, String)> = leaves
            .iter()
            .filter_map(|leaf| {
                let node = &leaf[..leaf.len().saturating_sub(1)];
                let before = get_at(&tree, node)?;
                let after = get_at(&translated, node)?.get("value")?.as_str()?;
                if before.get("value")?.as_str()? == after {
                    return None;
                }
                let (start, end) = event_range(before)?;
                Some((start, end, after.to_string()))
            })
            .collect();

        splices.sort_by(|a, b| b.0.cmp(&a.0));
        for (start, end, text) in splices {
            events.splice(start..end, std::iter::once(Event::Text(CowStr::from(text))));
        }

        render(&events)
    }
}
