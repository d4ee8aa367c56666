//! Line wrapping for message balloons.

#[cfg(test)]
#[path = "text_test.rs"]
mod tests;

/// Splits text into lines of at most `max_chars` characters.
pub trait LineWrap {
    fn wrap_lines(&self, text: &str, max_chars: usize) -> Vec<String>;
}

/// Greedy word wrap. Words longer than a line are split hard.
#[derive(Clone, Copy, Debug, Default)]
pub struct GreedyWrap;

impl LineWrap for GreedyWrap {
    fn wrap_lines(&self, text: &str, max_chars: usize) -> Vec<String> {
        let max_chars = max_chars.max(1);
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for word in text.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();

            while word.len() > max_chars {
                if current_len > 0 {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let rest = word.split_off(max_chars);
                lines.push(word.into_iter().collect());
                word = rest;
            }
            if word.is_empty() {
                continue;
            }

            let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
            if needed > max_chars {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(word.iter());
            current_len += word.len();
        }

        if current_len > 0 {
            lines.push(current);
        }
        lines
    }
}
