/// Retained console history cap. Oldest lines are evicted first.
pub const MAX_CONSOLE_LINES: usize = 100;

/// In-process console collaborator. The interpreter writes program output
/// and runtime diagnostics here; hosts read the retained lines back.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    lines: Vec<String>,
    echo: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror every line to stdout in addition to retaining it.
    pub fn with_echo() -> Self {
        Self {
            lines: Vec::new(),
            echo: true,
        }
    }

    pub fn write(&mut self, text: &str) {
        if self.echo {
            println!("{}", text);
        }
        self.lines.push(text.to_string());
        if self.lines.len() > MAX_CONSOLE_LINES {
            self.lines.remove(0);
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn last_line(&self) -> Option<&str> {
        self.lines.last().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_capped() {
        let mut console = ConsoleSink::new();
        for i in 0..150 {
            console.write(&format!("line {}", i));
        }
        assert_eq!(console.lines().len(), MAX_CONSOLE_LINES);
        assert_eq!(console.lines()[0], "line 50");
        assert_eq!(console.last_line(), Some("line 149"));
    }

    #[test]
    fn test_clear_empties_history() {
        let mut console = ConsoleSink::new();
        console.write("hello");
        console.clear();
        assert!(console.lines().is_empty());
    }
}
