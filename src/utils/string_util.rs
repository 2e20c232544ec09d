/// Locates the JSON body inside free-form judgment text.
pub trait JsonPayload {
    /// Strips a surrounding code fence; if prose remains around the body,
    /// slices from the first `{`/`[` to the last matching closer.
    fn json_payload(&self) -> &str;
}

impl JsonPayload for str {
    fn json_payload(&self) -> &str {
        let body = strip_fence(self.trim());
        if body.starts_with(['{', '[']) {
            return body;
        }

        let Some(start) = body.find(['{', '[']) else {
            return body;
        };
        let closer = if body[start..].starts_with('{') { '}' } else { ']' };
        match body.rfind(closer) {
            Some(end) if end > start => &body[start..=end],
            _ => body,
        }
    }
}

fn strip_fence(text: &str) -> &str {
    let Some(open) = text.find("```") else {
        return text;
    };
    let after = &text[open + 3..];
    // the info string ("json") runs to the end of the fence line
    let Some(newline) = after.find('\n') else {
        return text;
    };
    let inner = &after[newline + 1..];
    match inner.find("```") {
        Some(close) => inner[..close].trim(),
        None => inner.trim(),
    }
}
