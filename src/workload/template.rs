use super::context::{Builtins, VariableContext};

const OPEN: &str = "${";
const CLOSE: char = '}';

/// Replaces `${name}` placeholders, built-ins first, then the context.
/// Unknown names and an unterminated `${` are left as written.
#[must_use]
pub fn render_template(input: &str, builtins: &Builtins, context: &VariableContext) -> String {
    if !input.contains(OPEN) {
        return input.to_owned();
    }

    let mut rest = input;
    let mut output = String::with_capacity(input.len());

    loop {
        let start = match rest.find(OPEN) {
            Some(start) => start,
            None => {
                output.push_str(rest);
                break;
            }
        };
        let (before, after_start) = rest.split_at(start);
        output.push_str(before);
        let after = match after_start.strip_prefix(OPEN) {
            Some(after) => after,
            None => {
                output.push_str(after_start);
                break;
            }
        };
        let end = match after.find(CLOSE) {
            Some(end) => end,
            None => {
                output.push_str(OPEN);
                output.push_str(after);
                break;
            }
        };
        let (name, after_end) = after.split_at(end);
        let value = builtins
            .resolve(name)
            .or_else(|| context.get(name).map(str::to_owned))
            .unwrap_or_else(|| format!("{}{}{}", OPEN, name, CLOSE));
        output.push_str(&value);
        rest = match after_end.strip_prefix(CLOSE) {
            Some(remaining) => remaining,
            None => {
                output.push_str(after_end);
                break;
            }
        };
    }

    output
}
