//! Byte offsets and their line/column positions

/// A half-open byte range in a unit's source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Convert byte offset to line and column numbers (1-based)
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_column() {
        let source = "line1\nline2\nline3";
        assert_eq!(line_column(source, 0), (1, 1));
        assert_eq!(line_column(source, 5), (1, 6));
        assert_eq!(line_column(source, 6), (2, 1));
        assert_eq!(line_column(source, 12), (3, 1));
    }

    #[test]
    fn test_line_column_counts_chars() {
        // "é" is two bytes but one column
        let source = "é x";
        assert_eq!(line_column(source, 3), (1, 3));
    }

    #[test]
    fn test_span_len() {
        let span = Span::new(4, 10);
        assert_eq!(span.len(), 6);
        assert!(!span.is_empty());
        assert!(Span::new(3, 3).is_empty());
    }
}
