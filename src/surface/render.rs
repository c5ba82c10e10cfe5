use crate::analysis::Verdict;
use console::style;

/// Render a verdict for the terminal: light markdown (headings, bold,
/// bullets) plus a colored classification banner. Formatting only; nothing
/// here affects any decision.
#[must_use]
pub fn render_verdict(verdict: &Verdict) -> String {
    let mut out = String::new();
    for line in verdict.summary.lines() {
        out.push_str(&render_line(line));
        out.push('\n');
    }
    if !verdict.summary.is_empty() {
        out.push('\n');
    }
    out.push_str(&classification_banner(verdict));
    out
}

#[must_use]
pub fn classification_banner(verdict: &Verdict) -> String {
    if verdict.is_allowed() {
        style("Content approved for viewing").green().bold().to_string()
    } else {
        style("Content blocked - not suitable for children")
            .red()
            .bold()
            .to_string()
    }
}

fn render_line(line: &str) -> String {
    let trimmed = line.trim_start();
    if let Some(heading) = trimmed
        .strip_prefix("### ")
        .or_else(|| trimmed.strip_prefix("## "))
        .or_else(|| trimmed.strip_prefix("# "))
    {
        return style(heading).bold().underlined().to_string();
    }
    if let Some(item) = trimmed.strip_prefix("- ") {
        return format!("  • {}", render_inline(item));
    }
    render_inline(line)
}

/// Replace `**bold**` spans with styled text; unpaired markers pass through.
fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        let Some(len) = after.find("**") else {
            break;
        };
        out.push_str(&rest[..start]);
        out.push_str(&style(&after[..len]).bold().to_string());
        rest = &after[len + 2..];
    }
    out.push_str(rest);
    out
}
