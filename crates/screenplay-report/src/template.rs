//! Narration template rendering

/// Substitute `{actor}` and positional `{N}` placeholders
///
/// Unknown or out-of-range placeholders are kept verbatim so a bad template
/// still shows up readably in the report.
#[must_use]
pub fn render(template: &str, actor: &str, arguments: &[String]) -> String {
    let mut out = String::with_capacity(template.len() + actor.len());
    let mut rest = template;

    while let Some(pos) = rest.find(|c: char| c == '{' || c == '}') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") {
            out.push('{');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with("}}") {
            out.push('}');
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        let Some(end) = tail.find('}') else {
            out.push_str(tail);
            return out;
        };
        let key = &tail[1..end];
        match key {
            "actor" => out.push_str(actor),
            _ => match key.parse::<usize>().ok().and_then(|i| arguments.get(i)) {
                Some(argument) => out.push_str(argument),
                None => out.push_str(&tail[..=end]),
            },
        }
        rest = &tail[end + 1..];
    }

    out.push_str(rest);
    out
}
