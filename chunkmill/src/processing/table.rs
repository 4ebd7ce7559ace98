use regex::Regex;
use scraper::{Html, Selector};

/// Label prefixed to an extracted table caption, kept verbatim so already
/// normalized output round-trips unchanged.
const CAPTION_LABEL: &str = "표제목:";

/// Flattens raw table markup into compact, embedding-friendly text: one line
/// per row, cells joined by single spaces, caption first as a label line.
///
/// Accepts both input shapes the extraction stage has produced historically:
/// structured HTML (`<table>`/`<tr>`/`<td>`) and legacy pipe-delimited text.
/// Total function: empty or unparseable input yields an empty or caption-only
/// string, and normalizing already normalized text is a no-op.
pub struct TableNormalizer {
    whitespace: Regex,
    caption_selector: Selector,
    row_selector: Selector,
    cell_selector: Selector,
}

impl TableNormalizer {
    pub fn new() -> Self {
        Self {
            whitespace: Regex::new(r"\s+").unwrap(),
            caption_selector: Selector::parse("caption").unwrap(),
            row_selector: Selector::parse("tr").unwrap(),
            cell_selector: Selector::parse("th, td").unwrap(),
        }
    }

    pub fn normalize(&self, raw: &str) -> String {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let lines = if Self::looks_like_html(trimmed) {
            self.html_lines(trimmed)
        } else {
            self.delimited_lines(trimmed)
        };

        lines.join("\n")
    }

    fn looks_like_html(raw: &str) -> bool {
        let lowered = raw.to_lowercase();
        lowered.contains("<table") || lowered.contains("<tr")
    }

    fn html_lines(&self, raw: &str) -> Vec<String> {
        let fragment = Html::parse_fragment(raw);
        let mut lines = Vec::new();

        if let Some(caption) = fragment.select(&self.caption_selector).next() {
            let text = self.clean_cell(&caption.text().collect::<String>());
            if !text.is_empty() {
                lines.push(format!("{CAPTION_LABEL} {text}"));
            }
        }

        for row in fragment.select(&self.row_selector) {
            let cells: Vec<String> = row
                .select(&self.cell_selector)
                .map(|cell| self.clean_cell(&cell.text().collect::<String>()))
                .filter(|cell| !cell.is_empty())
                .collect();
            if !cells.is_empty() {
                lines.push(cells.join(" "));
            }
        }

        lines
    }

    fn delimited_lines(&self, raw: &str) -> Vec<String> {
        let mut lines = Vec::new();

        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(caption) = line.strip_prefix(CAPTION_LABEL) {
                let text = self.clean_cell(caption);
                if !text.is_empty() {
                    lines.push(format!("{CAPTION_LABEL} {text}"));
                }
                continue;
            }

            if Self::is_separator_row(line) {
                continue;
            }

            let cells: Vec<String> = line
                .split('|')
                .map(|cell| self.clean_cell(cell))
                .filter(|cell| !cell.is_empty())
                .collect();
            if !cells.is_empty() {
                lines.push(cells.join(" "));
            }
        }

        lines
    }

    /// Markdown-style alignment rows (`|---|:--:|`) carry no content.
    fn is_separator_row(line: &str) -> bool {
        line.contains('-') && line.chars().all(|c| matches!(c, '|' | '-' | ':' | '+' | ' '))
    }

    fn clean_cell(&self, cell: &str) -> String {
        let without_commas = strip_thousands_commas(cell);
        self.whitespace
            .replace_all(without_commas.trim(), " ")
            .into_owned()
    }
}

impl Default for TableNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Drop commas sitting between two digits (`1,234,567` → `1234567`) without
/// touching commas used as prose punctuation.
fn strip_thousands_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, c) in chars.iter().enumerate() {
        if *c == ','
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).is_some_and(|next| next.is_ascii_digit())
        {
            continue;
        }
        out.push(*c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_html_table_with_caption() {
        let normalizer = TableNormalizer::new();
        let raw = r#"<table>
            <caption>연도별 예산</caption>
            <tr><th>연도</th><th>예산</th></tr>
            <tr><td>2023</td><td>1,234,567</td></tr>
        </table>"#;
        let normalized = normalizer.normalize(raw);
        assert_eq!(normalized, "표제목: 연도별 예산\n연도 예산\n2023 1234567");
    }

    #[test]
    fn test_normalize_pipe_delimited() {
        let normalizer = TableNormalizer::new();
        let raw = "항목 | 금액\n--- | ---\n인건비 | 5,000";
        assert_eq!(normalizer.normalize(raw), "항목 금액\n인건비 5000");
    }

    #[test]
    fn test_normalize_skips_empty_cells() {
        let normalizer = TableNormalizer::new();
        let raw = "| a |  | b |";
        assert_eq!(normalizer.normalize(raw), "a b");
    }

    #[test]
    fn test_normalize_empty_input() {
        let normalizer = TableNormalizer::new();
        assert_eq!(normalizer.normalize(""), "");
        assert_eq!(normalizer.normalize("   \n  "), "");
    }

    #[test]
    fn test_normalize_unparseable_html_is_caption_only_or_empty() {
        let normalizer = TableNormalizer::new();
        let raw = "<table><caption>제목</caption></table>";
        assert_eq!(normalizer.normalize(raw), "표제목: 제목");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let normalizer = TableNormalizer::new();
        let raw = r#"<table>
            <caption>분기 실적</caption>
            <tr><td>1분기</td><td>10,000</td></tr>
            <tr><td>2분기</td><td>12,500</td></tr>
        </table>"#;
        let once = normalizer.normalize(raw);
        let twice = normalizer.normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        let normalizer = TableNormalizer::new();
        assert_eq!(normalizer.normalize("a   b  \t c"), "a b c");
    }

    #[test]
    fn test_strip_thousands_commas_preserves_prose_commas() {
        assert_eq!(strip_thousands_commas("1,234원, 그리고"), "1234원, 그리고");
        assert_eq!(strip_thousands_commas("12,345,678"), "12345678");
        assert_eq!(strip_thousands_commas("a, b"), "a, b");
    }

    #[test]
    fn test_both_shapes_normalize_to_same_output() {
        let normalizer = TableNormalizer::new();
        let html = "<table><tr><td>서울</td><td>9,700</td></tr></table>";
        let pipes = "서울 | 9,700";
        assert_eq!(normalizer.normalize(html), normalizer.normalize(pipes));
    }
}
