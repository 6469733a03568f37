use super::action_extractor::{balanced_object_spans, decode_candidate, fenced_block_spans};

/// Prose left for the transcript once action payloads and code fences are
/// stripped. Falls back to the raw reply when nothing readable remains.
pub fn display_text(raw: &str) -> String {
    let cleaned = clean_display_text(raw);
    if cleaned.is_empty() {
        return raw.trim().to_string();
    }
    cleaned
}

/// Removes structured-data fences and embedded action objects. Fences around
/// non-JSON content are dropped but their text is kept.
pub fn clean_display_text(raw: &str) -> String {
    let mut text = raw.to_string();

    for block in fenced_block_spans(raw) {
        let body = block.body.trim();
        let replacement = if body.starts_with('{') || body.starts_with('[') {
            String::new()
        } else {
            body.to_string()
        };
        text = text.replacen(block.span, &replacement, 1);
    }

    let payloads: Vec<String> = balanced_object_spans(&text)
        .into_iter()
        .filter(|span| decode_candidate(span).is_some())
        .map(str::to_string)
        .collect();
    for payload in payloads {
        text = text.replacen(&payload, "", 1);
    }

    collapse_blank_lines(&text)
}

fn collapse_blank_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blank_run = 0;
    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line);
    }
    out.join("\n").trim().to_string()
}
