//! Header-scoped fragmentation of HTML documents.
//!
//! Walks the parsed tree in document order, starts a new fragment at every
//! h1..h{max} heading, and tags each fragment with the ordered heading path
//! that scopes it.

use scraper::{ElementRef, Html};

/// A header-scoped run of body text, not yet size-bounded.
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Ordered (level, heading) pairs, outermost first.
    pub header_path: Vec<(u8, String)>,
    pub text: String,
}

/// Split `html` into fragments at h1..h{max_header_level} boundaries.
/// Headings deeper than the cutoff are kept as body text.
pub fn split_at_headers(html: &str, max_header_level: u8) -> Vec<Fragment> {
    let document = Html::parse_document(html);
    let mut collector = FragmentCollector::new(max_header_level);
    collector.walk(document.root_element());
    collector.finish()
}

struct FragmentCollector {
    max_header_level: u8,
    header_path: Vec<(u8, String)>,
    current: String,
    fragments: Vec<Fragment>,
}

impl FragmentCollector {
    fn new(max_header_level: u8) -> Self {
        Self {
            max_header_level,
            header_path: Vec::new(),
            current: String::new(),
            fragments: Vec::new(),
        }
    }

    fn walk(&mut self, root: ElementRef<'_>) {
        for element in root.descendent_elements() {
            self.visit(element);
        }
    }

    fn visit(&mut self, element: ElementRef<'_>) {
        let tag = element.value().name();
        if matches!(tag, "script" | "style" | "template" | "noscript" | "svg") {
            return;
        }

        let heading_level = match tag {
            "h1" => Some(1),
            "h2" => Some(2),
            "h3" => Some(3),
            "h4" => Some(4),
            "h5" => Some(5),
            "h6" => Some(6),
            _ => None,
        };

        if let Some(level) = heading_level {
            let heading = collapse_whitespace(&element.text().collect::<String>());
            if heading.is_empty() {
                return;
            }
            if level <= self.max_header_level {
                self.flush();
                self.update_header_path(level, heading);
            } else {
                self.push_block(&heading);
            }
            return;
        }

        // Block-level containers carry the body text; everything else is
        // reached through them. A block nested inside another block is
        // skipped: the outer element's text already covers it.
        let preserve_newlines = tag == "pre";
        if is_block_tag(tag) {
            if has_block_ancestor(element) {
                return;
            }
            let raw: String = element.text().collect();
            let text = if preserve_newlines {
                collapse_newlines(&raw)
            } else {
                collapse_whitespace(&raw)
            };
            self.push_block(&text);
        }
    }

    fn update_header_path(&mut self, level: u8, heading: String) {
        while self
            .header_path
            .last()
            .is_some_and(|(last, _)| *last >= level)
        {
            self.header_path.pop();
        }
        self.header_path.push((level, heading));
    }

    fn push_block(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.current.is_empty() {
            self.current.push_str("\n\n");
        }
        self.current.push_str(text);
    }

    fn flush(&mut self) {
        if self.current.trim().is_empty() {
            self.current.clear();
            return;
        }
        self.fragments.push(Fragment {
            header_path: self.header_path.clone(),
            text: std::mem::take(&mut self.current),
        });
    }

    fn finish(mut self) -> Vec<Fragment> {
        self.flush();
        self.fragments
    }
}

fn is_block_tag(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "li" | "blockquote" | "pre" | "td" | "th" | "dt" | "dd"
    )
}

fn has_block_ancestor(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| is_block_tag(ancestor.value().name()))
}

fn collapse_whitespace(input: &str) -> String {
    let mut buf = String::with_capacity(input.len());
    let mut last_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_space && !buf.is_empty() {
                buf.push(' ');
            }
            last_space = true;
        } else {
            buf.push(ch);
            last_space = false;
        }
    }
    buf.trim_end().to_string()
}

fn collapse_newlines(input: &str) -> String {
    input
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
