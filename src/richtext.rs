//! Restricted rich-text fragments: the only markup a prose field may carry
//! is bold, italic and bulleted-list structure (plus line breaks). Fragments
//! are parsed into a line/span model, edited there, and serialized back to a
//! canonical form, so formatting commands never have to pattern-match raw
//! markup variants.

/// One styled run of text within a line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Span {
    text: String,
    bold: bool,
    italic: bool,
}

/// One visual line. Bulleted lines serialize as `<li>` items inside a
/// shared `<ul>`; plain lines are joined with `<br>`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Line {
    bullet: bool,
    spans: Vec<Span>,
}

impl Line {
    fn text_len(&self) -> usize {
        self.spans.iter().map(|s| s.text.chars().count()).sum()
    }

    fn push_text(&mut self, text: &str, bold: bool, italic: bool) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.spans.last_mut() {
            if last.bold == bold && last.italic == italic {
                last.text.push_str(text);
                return;
            }
        }
        self.spans.push(Span {
            text: text.to_string(),
            bold,
            italic,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Document {
    lines: Vec<Line>,
}

fn decode_entities(raw: &str) -> String {
    raw.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

struct Parser {
    lines: Vec<Line>,
    cur: Line,
    bold: u32,
    italic: u32,
    in_li: bool,
}

impl Parser {
    fn new() -> Self {
        Parser {
            lines: Vec::new(),
            cur: Line::default(),
            bold: 0,
            italic: 0,
            in_li: false,
        }
    }

    fn text(&mut self, chunk: &str) {
        let decoded = decode_entities(chunk);
        let bold = self.bold > 0;
        let italic = self.italic > 0;
        self.cur.push_text(&decoded, bold, italic);
    }

    /// Line break the user typed: the (possibly empty) current line is kept.
    fn flush_break(&mut self) {
        let bullet = self.in_li;
        self.lines.push(std::mem::take(&mut self.cur));
        self.cur.bullet = bullet;
    }

    /// Boundary forced by list/block structure: whitespace-only residue
    /// between structural tags is dropped instead of becoming a ghost line.
    fn flush_structure(&mut self) {
        let has_text = self.cur.spans.iter().any(|s| !s.text.trim().is_empty());
        if has_text {
            self.lines.push(std::mem::take(&mut self.cur));
        } else {
            self.cur.spans.clear();
        }
        self.cur.bullet = self.in_li;
    }

    fn tag(&mut self, name: &str, closing: bool) {
        match name {
            "b" | "strong" => {
                if closing {
                    self.bold = self.bold.saturating_sub(1);
                } else {
                    self.bold += 1;
                }
            }
            "i" | "em" => {
                if closing {
                    self.italic = self.italic.saturating_sub(1);
                } else {
                    self.italic += 1;
                }
            }
            "br" => {
                if !closing {
                    self.flush_break();
                }
            }
            "ul" | "ol" => {
                if closing {
                    self.in_li = false;
                }
                self.flush_structure();
            }
            "li" => {
                if closing {
                    self.flush_structure();
                    self.in_li = false;
                    self.cur.bullet = false;
                } else {
                    self.flush_structure();
                    self.in_li = true;
                    self.cur.bullet = true;
                }
            }
            "div" | "p" => {
                if !self.cur.spans.is_empty() {
                    self.flush_break();
                }
            }
            // Anything outside the allowed grammar contributes no text.
            _ => {}
        }
    }

    fn finish(mut self) -> Document {
        if !self.cur.spans.is_empty() {
            self.lines.push(self.cur);
        }
        Document { lines: self.lines }
    }
}

fn parse(fragment: &str) -> Document {
    let mut p = Parser::new();
    let bytes = fragment.as_bytes();
    let mut i = 0;
    let mut text_start = 0;
    while i < bytes.len() {
        if bytes[i] == b'<' {
            if text_start < i {
                p.text(&fragment[text_start..i]);
            }
            match fragment[i..].find('>') {
                Some(rel) => {
                    let inner = fragment[i + 1..i + rel].trim();
                    let closing = inner.starts_with('/');
                    let body = inner.trim_start_matches('/');
                    let name: String = body
                        .chars()
                        .take_while(|c| c.is_ascii_alphanumeric())
                        .collect::<String>()
                        .to_ascii_lowercase();
                    p.tag(&name, closing);
                    i += rel + 1;
                    text_start = i;
                }
                None => {
                    // Unterminated tag; treat the rest as text.
                    p.text(&fragment[i..]);
                    i = bytes.len();
                    text_start = i;
                }
            }
        } else {
            i += 1;
        }
    }
    if text_start < bytes.len() {
        p.text(&fragment[text_start..]);
    }
    p.finish()
}

fn serialize_spans(line: &Line, out: &mut String) {
    for span in &line.spans {
        if span.bold {
            out.push_str("<b>");
        }
        if span.italic {
            out.push_str("<i>");
        }
        out.push_str(&escape_text(&span.text));
        if span.italic {
            out.push_str("</i>");
        }
        if span.bold {
            out.push_str("</b>");
        }
    }
}

fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    let mut i = 0;
    while i < doc.lines.len() {
        if doc.lines[i].bullet {
            out.push_str("<ul>");
            while i < doc.lines.len() && doc.lines[i].bullet {
                out.push_str("<li>");
                serialize_spans(&doc.lines[i], &mut out);
                out.push_str("</li>");
                i += 1;
            }
            out.push_str("</ul>");
        } else {
            serialize_spans(&doc.lines[i], &mut out);
            i += 1;
            if i < doc.lines.len() && !doc.lines[i].bullet {
                out.push_str("<br>");
            }
        }
    }
    out
}

/// Plain text of a fragment; lines are separated by `\n`.
pub fn plain_text(fragment: &str) -> String {
    let doc = parse(fragment);
    let mut out = String::new();
    for (idx, line) in doc.lines.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        for span in &line.spans {
            out.push_str(&span.text);
        }
    }
    out
}

/// A fragment counts as empty when its extracted plain text trims to
/// nothing; formatting-only markup (`<br>`, an empty list) carries no text.
pub fn is_empty_fragment(fragment: &str) -> bool {
    plain_text(fragment).trim().is_empty()
}

/// Produce the canonical serialization of a fragment.
pub fn canonicalize(fragment: &str) -> String {
    serialize(&parse(fragment))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatCommand {
    Bold,
    Italic,
    BulletList,
}

impl FormatCommand {
    pub fn parse(raw: &str) -> Option<FormatCommand> {
        match raw {
            "bold" => Some(FormatCommand::Bold),
            "italic" => Some(FormatCommand::Italic),
            "bulletList" => Some(FormatCommand::BulletList),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CharRef {
    line: usize,
    span: usize,
    offset: usize, // char offset within the span
}

fn char_refs(doc: &Document) -> Vec<Option<CharRef>> {
    // `None` marks the virtual `\n` between lines.
    let mut refs = Vec::new();
    for (li, line) in doc.lines.iter().enumerate() {
        if li > 0 {
            refs.push(None);
        }
        for (si, span) in line.spans.iter().enumerate() {
            for off in 0..span.text.chars().count() {
                refs.push(Some(CharRef {
                    line: li,
                    span: si,
                    offset: off,
                }));
            }
        }
    }
    refs
}

fn rebuild_line(chars: &[(char, bool, bool)], bullet: bool) -> Line {
    let mut line = Line {
        bullet,
        spans: Vec::new(),
    };
    for &(ch, bold, italic) in chars {
        let mut buf = [0u8; 4];
        line.push_text(ch.encode_utf8(&mut buf), bold, italic);
    }
    line
}

fn toggle_inline(doc: &mut Document, start: usize, end: usize, want_bold: bool) {
    let refs = char_refs(doc);
    let total = refs.len();
    let start = start.min(total);
    let end = end.min(total).max(start);
    if start == end {
        // A caret has no run to restyle.
        return;
    }

    let selected: Vec<CharRef> = refs[start..end].iter().flatten().copied().collect();
    if selected.is_empty() {
        return;
    }
    let all_styled = selected.iter().all(|r| {
        let span = &doc.lines[r.line].spans[r.span];
        if want_bold {
            span.bold
        } else {
            span.italic
        }
    });
    let new_value = !all_styled;

    // Flatten each touched line to chars, restyle the selected ones, rebuild.
    let mut touched: Vec<usize> = selected.iter().map(|r| r.line).collect();
    touched.dedup();
    for li in touched {
        let flat: Vec<(char, bool, bool)> = doc.lines[li]
            .spans
            .iter()
            .flat_map(|s| s.text.chars().map(move |c| (c, s.bold, s.italic)))
            .collect();
        let mut flat = flat;
        for r in selected.iter().filter(|r| r.line == li) {
            // Position of this char within the flattened line.
            let base: usize = doc.lines[li].spans[..r.span]
                .iter()
                .map(|s| s.text.chars().count())
                .sum();
            let idx = base + r.offset;
            if want_bold {
                flat[idx].1 = new_value;
            } else {
                flat[idx].2 = new_value;
            }
        }
        let bullet = doc.lines[li].bullet;
        doc.lines[li] = rebuild_line(&flat, bullet);
    }
}

fn toggle_bullets(doc: &mut Document, start: usize, end: usize) {
    if doc.lines.is_empty() {
        return;
    }
    // Map char offsets to line indices.
    let mut line_bounds = Vec::with_capacity(doc.lines.len());
    let mut pos = 0;
    for line in &doc.lines {
        let len = line.text_len();
        line_bounds.push((pos, pos + len));
        pos += len + 1; // the virtual \n
    }
    let total = pos.saturating_sub(1);
    let start = start.min(total);
    let end = end.min(total).max(start);

    let touched: Vec<usize> = if start == end && start == 0 && total == 0 {
        (0..doc.lines.len()).collect()
    } else if start == end {
        // Caret: a list toggle acts on the whole field.
        (0..doc.lines.len()).collect()
    } else {
        line_bounds
            .iter()
            .enumerate()
            .filter(|(_, &(lo, hi))| start <= hi && end > lo || (lo >= start && lo < end))
            .map(|(i, _)| i)
            .collect()
    };
    if touched.is_empty() {
        return;
    }
    let all_bulleted = touched.iter().all(|&i| doc.lines[i].bullet);
    for &i in &touched {
        doc.lines[i].bullet = !all_bulleted;
    }
}

/// Apply a formatting command to the selection `[start, end)` expressed in
/// plain-text char offsets (line breaks count as one char). Returns the new
/// canonical fragment.
pub fn apply_command(fragment: &str, command: FormatCommand, start: usize, end: usize) -> String {
    let mut doc = parse(fragment);
    match command {
        FormatCommand::Bold => toggle_inline(&mut doc, start, end, true),
        FormatCommand::Italic => toggle_inline(&mut doc, start, end, false),
        FormatCommand::BulletList => toggle_bullets(&mut doc, start, end),
    }
    serialize(&doc)
}

/// Interaction state of an editable rich-text field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldState {
    Idle,
    Editing,
    PendingExternalUpdate,
}

impl FieldState {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldState::Idle => "idle",
            FieldState::Editing => "editing",
            FieldState::PendingExternalUpdate => "pendingExternalUpdate",
        }
    }
}

/// One editable prose field. External writes (generation results) apply
/// immediately while the field is idle; while it is being edited they park
/// in `pending` and flush on blur, so an in-progress edit is never
/// clobbered mid-keystroke.
#[derive(Debug, Clone, Default)]
pub struct RichTextField {
    content: String,
    pending: Option<String>,
    focused: bool,
}

impl RichTextField {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn state(&self) -> FieldState {
        if !self.focused {
            FieldState::Idle
        } else if self.pending.is_some() {
            FieldState::PendingExternalUpdate
        } else {
            FieldState::Editing
        }
    }

    pub fn is_empty(&self) -> bool {
        is_empty_fragment(&self.content)
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    /// Leaving the field flushes a parked external write, if one is still
    /// pending.
    pub fn blur(&mut self) {
        self.focused = false;
        if let Some(pending) = self.pending.take() {
            self.content = pending;
        }
    }

    /// User-driven edit; only accepted while the field holds focus.
    /// Returns whether the content actually changed.
    pub fn input(&mut self, html: &str) -> bool {
        if !self.focused || self.content == html {
            return false;
        }
        self.content = html.to_string();
        // The user's edit supersedes whatever an external writer wanted.
        self.pending = None;
        true
    }

    /// External write (e.g. a generation result). Applied now when idle,
    /// parked until blur when the field is being edited.
    pub fn set_content(&mut self, html: &str) -> bool {
        if self.focused {
            self.pending = Some(html.to_string());
            false
        } else {
            let changed = self.content != html;
            self.content = html.to_string();
            changed
        }
    }

    /// Toolbar formatting command; counts as a user edit on the current
    /// content.
    pub fn command(&mut self, command: FormatCommand, start: usize, end: usize) -> bool {
        let next = apply_command(&self.content, command, start, end);
        if next == self.content {
            return false;
        }
        self.content = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_bold_and_list_fragment() {
        let src = "<b>Hello</b><ul><li>World</li></ul>";
        assert_eq!(canonicalize(src), src);
        assert_eq!(plain_text(src), "Hello\nWorld");
    }

    #[test]
    fn line_breaks_round_trip() {
        assert_eq!(canonicalize("a<br>b"), "a<br>b");
        assert_eq!(canonicalize("a<br><br>b"), "a<br><br>b");
        assert_eq!(plain_text("a<br><br>b"), "a\n\nb");
    }

    #[test]
    fn formatting_only_markup_is_empty() {
        assert!(is_empty_fragment(""));
        assert!(is_empty_fragment("<br>"));
        assert!(is_empty_fragment("<div><br></div>"));
        assert!(is_empty_fragment("<ul><li></li></ul>"));
        assert!(is_empty_fragment("  \n "));
        assert!(!is_empty_fragment("<b>x</b>"));
    }

    #[test]
    fn entities_decode_and_reescape() {
        assert_eq!(plain_text("fish &amp; chips"), "fish & chips");
        assert_eq!(canonicalize("fish &amp; chips"), "fish &amp; chips");
    }

    #[test]
    fn toggle_bold_sets_then_clears() {
        let once = apply_command("hello world", FormatCommand::Bold, 0, 5);
        assert_eq!(once, "<b>hello</b> world");
        let twice = apply_command(&once, FormatCommand::Bold, 0, 5);
        assert_eq!(twice, "hello world");
    }

    #[test]
    fn partial_bold_selection_extends_instead_of_clearing() {
        // "hel" is bold, selection covers "hello": not all styled, so the
        // toggle bolds the whole range.
        let frag = "<b>hel</b>lo";
        let out = apply_command(frag, FormatCommand::Bold, 0, 5);
        assert_eq!(out, "<b>hello</b>");
    }

    #[test]
    fn italic_nests_inside_bold() {
        let out = apply_command("<b>plan</b>", FormatCommand::Italic, 0, 4);
        assert_eq!(out, "<b><i>plan</i></b>");
    }

    #[test]
    fn caret_bold_is_a_no_op() {
        assert_eq!(apply_command("abc", FormatCommand::Bold, 1, 1), "abc");
    }

    #[test]
    fn bullet_toggle_converts_lines_both_ways() {
        let listed = apply_command("one<br>two", FormatCommand::BulletList, 0, 7);
        assert_eq!(listed, "<ul><li>one</li><li>two</li></ul>");
        let back = apply_command(&listed, FormatCommand::BulletList, 0, 7);
        assert_eq!(back, "one<br>two");
    }

    #[test]
    fn bullet_toggle_on_one_line_splits_the_list_boundary() {
        let out = apply_command("one<br>two", FormatCommand::BulletList, 0, 2);
        assert_eq!(out, "<ul><li>one</li></ul>two");
    }

    #[test]
    fn field_accepts_input_only_while_focused() {
        let mut field = RichTextField::default();
        assert!(!field.input("<b>x</b>"));
        assert_eq!(field.content(), "");

        field.focus();
        assert!(field.input("<b>x</b>"));
        assert_eq!(field.content(), "<b>x</b>");
        assert_eq!(field.state(), FieldState::Editing);
    }

    #[test]
    fn external_write_parks_while_editing_and_flushes_on_blur() {
        let mut field = RichTextField::default();
        field.focus();
        field.input("draft");
        assert!(!field.set_content("<i>generated</i>"));
        assert_eq!(field.state(), FieldState::PendingExternalUpdate);
        assert_eq!(field.content(), "draft");

        field.blur();
        assert_eq!(field.state(), FieldState::Idle);
        assert_eq!(field.content(), "<i>generated</i>");
    }

    #[test]
    fn user_edit_discards_parked_external_write() {
        let mut field = RichTextField::default();
        field.focus();
        field.set_content("<i>generated</i>");
        field.input("the user kept typing");
        field.blur();
        assert_eq!(field.content(), "the user kept typing");
    }

    #[test]
    fn external_write_applies_immediately_when_idle() {
        let mut field = RichTextField::default();
        assert!(field.set_content("<b>aid</b>"));
        assert_eq!(field.content(), "<b>aid</b>");
        assert_eq!(field.state(), FieldState::Idle);
    }
}
