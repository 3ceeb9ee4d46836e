//! Line-based creole 1.0 → HTML renderer.
//!
//! Covers the constructs the wiki corpus uses: `=`..`======` headings,
//! `*`/`#` lists, `**bold**`, `//italic//`, `{{{…}}}` nowiki (inline and
//! block), `[[target|label]]` links, `----` rules and `\\` line breaks.
//! Unknown markup passes through as text. The output feeds the HTML header
//! splitter, so structural fidelity (headings, block boundaries) matters
//! more than presentational fidelity.

/// Render creole markup to HTML.
pub fn to_html(creole: &str) -> String {
    let mut out = String::with_capacity(creole.len() * 2);
    let mut paragraph: Vec<String> = Vec::new();
    let mut list_stack: Vec<&'static str> = Vec::new();
    let mut nowiki: Option<Vec<String>> = None;

    for line in creole.lines() {
        // Block nowiki: swallow everything verbatim until the closing brace.
        if let Some(block) = nowiki.as_mut() {
            if line.trim() == "}}}" {
                out.push_str("<pre>");
                out.push_str(&escape(&block.join("\n")));
                out.push_str("</pre>\n");
                nowiki = None;
            } else {
                block.push(line.to_string());
            }
            continue;
        }
        if line.trim() == "{{{" {
            flush_paragraph(&mut out, &mut paragraph);
            close_lists(&mut out, &mut list_stack, 0);
            nowiki = Some(Vec::new());
            continue;
        }

        let trimmed = line.trim();

        if trimmed.is_empty() {
            flush_paragraph(&mut out, &mut paragraph);
            close_lists(&mut out, &mut list_stack, 0);
            continue;
        }

        // Horizontal rule.
        if trimmed.len() >= 4 && trimmed.chars().all(|c| c == '-') {
            flush_paragraph(&mut out, &mut paragraph);
            close_lists(&mut out, &mut list_stack, 0);
            out.push_str("<hr />\n");
            continue;
        }

        // Heading: leading '=' run, optional matching trailing run.
        if let Some(rest) = trimmed.strip_prefix('=') {
            let level = 1 + rest.chars().take_while(|&c| c == '=').count().min(5);
            let body = trimmed
                .trim_matches('=')
                .trim();
            flush_paragraph(&mut out, &mut paragraph);
            close_lists(&mut out, &mut list_stack, 0);
            out.push_str(&format!("<h{level}>{}</h{level}>\n", inline(body)));
            continue;
        }

        // List item: run of '*' or '#' followed by whitespace.
        if let Some((depth, marker, body)) = parse_list_item(trimmed) {
            flush_paragraph(&mut out, &mut paragraph);
            adjust_lists(&mut out, &mut list_stack, depth, marker);
            out.push_str(&format!("<li>{}</li>\n", inline(body)));
            continue;
        }

        paragraph.push(trimmed.to_string());
    }

    // Unterminated nowiki block: emit what we have.
    if let Some(block) = nowiki {
        out.push_str("<pre>");
        out.push_str(&escape(&block.join("\n")));
        out.push_str("</pre>\n");
    }
    flush_paragraph(&mut out, &mut paragraph);
    close_lists(&mut out, &mut list_stack, 0);
    out
}

fn parse_list_item(line: &str) -> Option<(usize, &'static str, &str)> {
    let marker_char = line.chars().next()?;
    let marker = match marker_char {
        '*' => "ul",
        '#' => "ol",
        _ => return None,
    };
    let depth = line.chars().take_while(|&c| c == marker_char).count();
    let rest = &line[depth..];
    // Bold (**…**) is not a list item.
    if marker_char == '*' && depth >= 2 && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((depth, marker, rest.trim()))
}

fn adjust_lists(out: &mut String, stack: &mut Vec<&'static str>, depth: usize, marker: &'static str) {
    close_lists(out, stack, depth);
    while stack.len() < depth {
        out.push_str(&format!("<{marker}>\n"));
        stack.push(marker);
    }
}

fn close_lists(out: &mut String, stack: &mut Vec<&'static str>, keep: usize) {
    while stack.len() > keep {
        let tag = stack.pop().unwrap();
        out.push_str(&format!("</{tag}>\n"));
    }
}

fn flush_paragraph(out: &mut String, paragraph: &mut Vec<String>) {
    if paragraph.is_empty() {
        return;
    }
    let joined = paragraph.join(" ");
    paragraph.clear();
    out.push_str("<p>");
    out.push_str(&inline(&joined));
    out.push_str("</p>\n");
}

/// Inline markup: escaping, bold, italic, links, line breaks, inline nowiki.
fn inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut bold = false;
    let mut italic = false;
    let mut i = 0;

    while i < chars.len() {
        // Inline nowiki {{{…}}}.
        if chars[i..].starts_with(&['{', '{', '{']) {
            if let Some(close) = find_seq(&chars, i + 3, &['}', '}', '}']) {
                let code: String = chars[i + 3..close].iter().collect();
                out.push_str("<code>");
                out.push_str(&escape(&code));
                out.push_str("</code>");
                i = close + 3;
                continue;
            }
        }
        // Link [[target|label]] or [[target]].
        if chars[i..].starts_with(&['[', '[']) {
            if let Some(close) = find_seq(&chars, i + 2, &[']', ']']) {
                let body: String = chars[i + 2..close].iter().collect();
                let (target, label) = match body.split_once('|') {
                    Some((t, l)) => (t.trim(), l.trim()),
                    None => (body.trim(), body.trim()),
                };
                out.push_str(&format!(
                    "<a href=\"{}\">{}</a>",
                    escape(target),
                    escape(label)
                ));
                i = close + 2;
                continue;
            }
        }
        // Forced line break.
        if chars[i..].starts_with(&['\\', '\\']) {
            out.push_str("<br />");
            i += 2;
            continue;
        }
        // Bold toggle.
        if chars[i..].starts_with(&['*', '*']) {
            out.push_str(if bold { "</b>" } else { "<b>" });
            bold = !bold;
            i += 2;
            continue;
        }
        // Italic toggle, unless it is the // of a URL scheme.
        if chars[i..].starts_with(&['/', '/']) && (i == 0 || chars[i - 1] != ':') {
            out.push_str(if italic { "</i>" } else { "<i>" });
            italic = !italic;
            i += 2;
            continue;
        }
        match chars[i] {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
        i += 1;
    }

    if italic {
        out.push_str("</i>");
    }
    if bold {
        out.push_str("</b>");
    }
    out
}

fn find_seq(chars: &[char], from: usize, needle: &[char]) -> Option<usize> {
    (from..chars.len().saturating_sub(needle.len() - 1))
        .find(|&i| chars[i..].starts_with(needle))
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
