//! Split finalized assistant text into prose and fenced code segments
//!
//! The scanner walks the text line by line. A line starting with three
//! backticks opens a code block only when a later line consisting of exactly
//! three backticks closes it; the first such line wins, so fences never nest.
//! An opener without a matching closer stays literal prose.
//!
//! Parsing is lossless: each code segment keeps the exact text of its fence
//! lines, so [`reconstruct`] of the returned segments gives back the input
//! byte for byte.

/// Language label reported for a code block without a tag
pub const UNSPECIFIED_LANGUAGE: &str = "unspecified";

const FENCE: &str = "```";

/// Verbatim fence text around a code body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fence {
    /// Opening line including its terminator
    pub open: String,
    /// Terminator of the last body line, empty when the body has no lines
    pub body_end: String,
    /// Closing line without its terminator
    pub close: String,
}

impl Fence {
    /// Fences as written for a body produced by a model with `\n` endings
    fn canonical(language: Option<&str>, code: &str) -> Self {
        Self {
            open: format!("{FENCE}{}\n", language.unwrap_or_default()),
            body_end: if code.is_empty() { String::new() } else { "\n".to_string() },
            close: FENCE.to_string(),
        }
    }
}

/// A run of prose or one fenced code block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text outside any fenced block, verbatim
    Prose { text: String },
    /// Body of a fenced block, without the fence lines
    Code {
        language: Option<String>,
        code: String,
        fence: Fence,
    },
}

impl Segment {
    pub fn prose(text: impl Into<String>) -> Self {
        Segment::Prose { text: text.into() }
    }

    pub fn code(language: Option<&str>, code: impl Into<String>) -> Self {
        let code = code.into();
        Segment::Code {
            language: language.map(str::to_string),
            fence: Fence::canonical(language, &code),
            code,
        }
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Segment::Code { .. })
    }

    /// Prose made only of whitespace; views skip these
    pub fn is_blank(&self) -> bool {
        match self {
            Segment::Prose { text } => text.trim().is_empty(),
            Segment::Code { .. } => false,
        }
    }

    /// Label shown above a code block
    pub fn language_label(&self) -> Option<&str> {
        match self {
            Segment::Code { language, .. } => {
                Some(language.as_deref().unwrap_or(UNSPECIFIED_LANGUAGE))
            }
            Segment::Prose { .. } => None,
        }
    }

    /// Source text of the segment with fences restored
    pub fn raw(&self) -> String {
        match self {
            Segment::Prose { text } => text.clone(),
            Segment::Code { code, fence, .. } => {
                format!("{}{}{}{}", fence.open, code, fence.body_end, fence.close)
            }
        }
    }
}

/// Parse text into an ordered list of segments
pub fn parse(text: &str) -> Vec<Segment> {
    BlockScanner::new(text).scan()
}

/// Concatenate the raw forms of segments
pub fn reconstruct(segments: &[Segment]) -> String {
    segments.iter().map(Segment::raw).collect()
}

/// Code bodies in order of appearance
pub fn code_blocks(segments: &[Segment]) -> impl Iterator<Item = &str> {
    segments.iter().filter_map(|segment| match segment {
        Segment::Code { code, .. } => Some(code.as_str()),
        Segment::Prose { .. } => None,
    })
}

struct BlockScanner<'a> {
    lines: Vec<&'a str>,
    pos: usize,
    prose: String,
    segments: Vec<Segment>,
}

impl<'a> BlockScanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.split_inclusive('\n').collect(),
            pos: 0,
            prose: String::new(),
            segments: Vec::new(),
        }
    }

    fn scan(mut self) -> Vec<Segment> {
        while self.pos < self.lines.len() {
            let line = self.lines[self.pos];

            if let Some(language) = opening_fence(line) {
                if let Some(close) = self.find_close(self.pos + 1) {
                    self.emit_code(language, close);
                    continue;
                }
            }

            self.prose.push_str(line);
            self.pos += 1;
        }

        self.flush_prose();
        self.segments
    }

    fn find_close(&self, from: usize) -> Option<usize> {
        (from..self.lines.len()).find(|&i| is_closing_fence(self.lines[i]))
    }

    fn emit_code(&mut self, language: Option<&str>, close: usize) {
        self.flush_prose();

        let mut code = self.lines[self.pos + 1..close].concat();
        let body_end = split_line_terminator(&mut code);

        // The closing line's own terminator belongs to the prose that follows.
        let closing = self.lines[close];
        let close_len = closing.trim_end_matches(['\r', '\n']).len();
        let fence = Fence {
            open: self.lines[self.pos].to_string(),
            body_end,
            close: closing[..close_len].to_string(),
        };
        self.segments.push(Segment::Code {
            language: language.map(str::to_string),
            code,
            fence,
        });

        self.prose.push_str(&closing[close_len..]);
        self.pos = close + 1;
    }

    fn flush_prose(&mut self) {
        if !self.prose.is_empty() {
            let text = std::mem::take(&mut self.prose);
            self.segments.push(Segment::Prose { text });
        }
    }
}

/// Language tag of an opening fence line, `Some(None)` for an untagged fence
fn opening_fence(line: &str) -> Option<Option<&str>> {
    let rest = line.trim_end().strip_prefix(FENCE)?;
    if rest.is_empty() {
        return Some(None);
    }
    if rest.chars().any(|c| c.is_whitespace() || c == '`') {
        return None;
    }
    Some(Some(rest))
}

fn is_closing_fence(line: &str) -> bool {
    line.trim() == FENCE
}

/// Remove one trailing `\n` or `\r\n` and return it
fn split_line_terminator(text: &mut String) -> String {
    let keep = if text.ends_with("\r\n") {
        text.len() - 2
    } else if text.ends_with('\n') {
        text.len() - 1
    } else {
        text.len()
    };
    text.split_off(keep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_single_prose() {
        let segments = parse("Just some text.\nAnother line.");
        assert_eq!(segments, vec![Segment::prose("Just some text.\nAnother line.")]);
    }

    #[test]
    fn test_empty_text_has_no_segments() {
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_fenced_block_with_language() {
        let segments = parse("Here:\n```rust\nfn main() {}\n```\nDone.");
        assert_eq!(
            segments,
            vec![
                Segment::prose("Here:\n"),
                Segment::code(Some("rust"), "fn main() {}"),
                Segment::prose("\nDone."),
            ]
        );
    }

    #[test]
    fn test_untagged_block_reports_unspecified() {
        let segments = parse("```\nls -la\n```");
        assert_eq!(segments, vec![Segment::code(None, "ls -la")]);
        assert_eq!(segments[0].language_label(), Some(UNSPECIFIED_LANGUAGE));
    }

    #[test]
    fn test_unterminated_fence_is_literal_prose() {
        let text = "abc\n```python\nprint(1)\n";
        assert_eq!(parse(text), vec![Segment::prose(text)]);
    }

    #[test]
    fn test_first_close_wins() {
        let segments = parse("```md\nouter\n```python\ninner\n```\nafter\n```\n");
        assert_eq!(
            segments,
            vec![
                Segment::code(Some("md"), "outer\n```python\ninner"),
                Segment::prose("\nafter\n```\n"),
            ]
        );
    }

    #[test]
    fn test_language_tag_with_space_is_not_a_fence() {
        let text = "```not a tag\nbody\n```";
        let segments = parse(text);
        // The tagged line is prose, the lone closer then opens an unterminated fence.
        assert_eq!(segments, vec![Segment::prose(text)]);
    }

    #[test]
    fn test_multiline_code_keeps_inner_blank_lines() {
        let segments = parse("```py\na = 1\n\nb = 2\n```");
        assert_eq!(segments, vec![Segment::code(Some("py"), "a = 1\n\nb = 2")]);
    }

    #[test]
    fn test_empty_code_block() {
        let segments = parse("```\n```");
        assert_eq!(segments, vec![Segment::code(None, "")]);
        assert_eq!(segments[0].raw(), "```\n```");
    }

    fn code_parts(segment: &Segment) -> (Option<&str>, &str) {
        match segment {
            Segment::Code { language, code, .. } => (language.as_deref(), code.as_str()),
            Segment::Prose { .. } => panic!("expected code, got {:?}", segment),
        }
    }

    #[test]
    fn test_closing_fence_tolerates_surrounding_whitespace() {
        let segments = parse("```sh\necho hi\n   ```   \n");
        assert_eq!(segments.len(), 2);
        assert_eq!(code_parts(&segments[0]), (Some("sh"), "echo hi"));
        assert_eq!(segments[1], Segment::prose("\n"));
        assert!(segments[1].is_blank());
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "x\r\n```js\r\nlet a;\r\n```\r\ny";
        let segments = parse(text);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0], Segment::prose("x\r\n"));
        assert_eq!(code_parts(&segments[1]), (Some("js"), "let a;"));
        assert_eq!(segments[2], Segment::prose("\r\ny"));
        assert_eq!(reconstruct(&segments), text);
    }

    #[test]
    fn test_blank_body_differs_from_empty_body() {
        let blank = parse("```\n\n```");
        let empty = parse("```\n```");
        assert_eq!(code_parts(&blank[0]), (None, ""));
        assert_eq!(code_parts(&empty[0]), (None, ""));
        assert_ne!(blank, empty);
        assert_eq!(reconstruct(&blank), "```\n\n```");
    }

    #[test]
    fn test_trailing_space_after_language_tag() {
        let text = "```rust  \nfn a(){}\n```";
        let segments = parse(text);
        assert_eq!(code_parts(&segments[0]), (Some("rust"), "fn a(){}"));
        assert_eq!(reconstruct(&segments), text);
    }

    #[test]
    fn test_round_trip() {
        let texts = [
            "",
            "no fences at all",
            "intro\n```rust\nfn a() {}\n```\nmiddle\n```\nplain\n```\noutro\n",
            "```python\nprint('x')\n```",
            "two\n```a\n1\n```\n```b\n2\n```\n",
            "dangling\n```c\nint x;\n",
            "```md\n```inner\n```\n",
            "```\n\n```",
            "x\r\n```js\r\nlet a;\r\n```\r\ny",
            "```rust  \nfn a(){}\n```",
            "```sh\necho hi\n   ```   \n",
            "```\r\n\r\n```\r\n",
        ];

        for text in texts {
            assert_eq!(reconstruct(&parse(text)), text, "round trip failed for {:?}", text);
        }
    }

    #[test]
    fn test_code_blocks_in_order() {
        let segments = parse("```a\none\n```\ntext\n```b\ntwo\n```");
        let codes: Vec<&str> = code_blocks(&segments).collect();
        assert_eq!(codes, vec!["one", "two"]);
    }

    #[test]
    fn test_emphasis_markers_left_alone() {
        let segments = parse("**bold** and *italic*");
        assert_eq!(segments, vec![Segment::prose("**bold** and *italic*")]);
    }
}
