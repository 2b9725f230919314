//! Cursor-aware editing of the form's text fields. Cursors count chars, not bytes.

/// Convert a character index to a byte index for UTF-8 safe string operations
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn insert_str(text: &mut String, cursor: &mut usize, s: &str) {
    let byte_pos = char_to_byte_index(text, *cursor);
    text.insert_str(byte_pos, s);
    *cursor += s.chars().count();
}

pub fn backspace(text: &mut String, cursor: &mut usize) {
    if *cursor > 0 {
        *cursor -= 1;
        let byte_pos = char_to_byte_index(text, *cursor);
        text.remove(byte_pos);
    }
}

pub fn delete(text: &mut String, cursor: &mut usize) {
    if *cursor < text.chars().count() {
        let byte_pos = char_to_byte_index(text, *cursor);
        text.remove(byte_pos);
    }
}

pub fn move_left(cursor: &mut usize) {
    *cursor = cursor.saturating_sub(1);
}

pub fn move_right(text: &str, cursor: &mut usize) {
    *cursor = (*cursor + 1).min(text.chars().count());
}

/// Line and column of a cursor within multi-line text.
pub fn line_col(text: &str, cursor: usize) -> (usize, usize) {
    let mut line = 0;
    let mut col = 0;
    for c in text.chars().take(cursor) {
        if c == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Move the cursor up or down one line, keeping the column where
/// the target line is long enough.
pub fn move_vertical(text: &str, cursor: &mut usize, up: bool) {
    let (line, col) = line_col(text, *cursor);
    let target = if up {
        match line.checked_sub(1) {
            Some(target) => target,
            None => {
                *cursor = 0;
                return;
            }
        }
    } else {
        line + 1
    };

    let mut offset = 0;
    for (i, l) in text.split('\n').enumerate() {
        let len = l.chars().count();
        if i == target {
            *cursor = offset + col.min(len);
            return;
        }
        offset += len + 1;
    }
    *cursor = text.chars().count();
}

/// Start of the cursor's line and end of it, in chars.
pub fn line_bounds(text: &str, cursor: usize) -> (usize, usize) {
    let (line, _) = line_col(text, cursor);
    let mut start = 0;
    for (i, l) in text.split('\n').enumerate() {
        let len = l.chars().count();
        if i == line {
            return (start, start + len);
        }
        start += len + 1;
    }
    (start, start)
}

/// Single-line fields take pasted text with line breaks flattened.
pub fn single_line(s: &str) -> String {
    s.split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
