/// Strip markdown fences and wrapping quotes from model output.
pub fn clean_output(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // drop the info string on the opening fence
        let body = rest.split_once('\n').map_or("", |(_, body)| body);
        text = body.trim_end().strip_suffix("```").unwrap_or(body).trim();
    }

    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}'), ('\'', '\'')] {
        if let Some(inner) = text.strip_prefix(open).and_then(|t| t.strip_suffix(close)) {
            if !inner.contains(open) && !inner.contains(close) {
                text = inner.trim();
                break;
            }
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences() {
        assert_eq!(clean_output("```text\nHe was a scholar.\n```"), "He was a scholar.");
        assert_eq!(clean_output("```\nShe ruled.\n```\n"), "She ruled.");
    }

    #[test]
    fn strips_wrapping_quotes_only() {
        assert_eq!(clean_output("  \"A quiet life.\" "), "A quiet life.");
        assert_eq!(clean_output("\u{201c}A quiet life.\u{201d}"), "A quiet life.");
        assert_eq!(clean_output("He said \"no\"."), "He said \"no\".");
        assert_eq!(clean_output("\"One\" and \"two\""), "\"One\" and \"two\"");
    }
}
