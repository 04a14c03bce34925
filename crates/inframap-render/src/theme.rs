/// Visual theme for dot output. `header` lines contain a `{title}`
/// placeholder substituted at render time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    pub name: &'static str,
    pub header: Vec<&'static str>,
    /// Color for edge decorations such as edit labels.
    pub edit_color: &'static str,
    /// Fill for nodes carrying an error or warning, and for placeholders.
    pub error_fill: &'static str,
}

impl Theme {
    #[must_use]
    pub fn light() -> Self {
        Self {
            name: "light",
            header: vec![
                "digraph Assets {",
                "  graph [rankdir=LR, concentrate=true,",
                "       label=\"{title}\", fontname=FreeSans, tooltip=\" \"]",
                "  node [fontname=FreeSans, fontsize=10]",
                "  edge [fontname=FreeSans, fontsize=10]",
            ],
            edit_color: "#c0c0c0",
            error_fill: "pink",
        }
    }

    #[must_use]
    pub fn dark() -> Self {
        Self {
            name: "dark",
            header: vec![
                "digraph Assets {",
                "  graph [rankdir=LR, concentrate=true,",
                "         label=\"{title}\", fontname=FreeSans, tooltip=\" \",",
                "         bgcolor=black]",
                "  node [fontname=FreeSans, fontsize=10, color=\"#808080\", fontcolor=\"#808080\"]",
                "  edge [fontname=FreeSans, fontsize=10, color=\"#808080\"]",
            ],
            edit_color: "#303030",
            error_fill: "#200000",
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "light" => Some(Self::light()),
            "dark" => Some(Self::dark()),
            _ => None,
        }
    }

    /// Header lines with the graph title substituted.
    #[must_use]
    pub fn header_lines(&self, title: &str) -> Vec<String> {
        self.header
            .iter()
            .map(|line| line.replace("{title}", title))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_is_substituted_into_header() {
        let lines = Theme::light().header_lines("Assets updated today");
        assert!(lines.iter().any(|l| l.contains("label=\"Assets updated today\"")));
    }

    #[test]
    fn dark_theme_sets_background() {
        let lines = Theme::dark().header_lines("t");
        assert!(lines.iter().any(|l| l.contains("bgcolor=black")));
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(Theme::by_name("dark").map(|t| t.name), Some("dark"));
        assert!(Theme::by_name("sepia").is_none());
    }
}
