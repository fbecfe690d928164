//! Syntax highlighting for code message bodies (syntect → ratatui `Text`).

use std::sync::LazyLock;

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span, Text};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

const THEME: &str = "base16-ocean.dark";

/// Highlight `code` as `language`. Unknown languages fall back to plain white.
///
/// One output line per source line, so line counts match the source.
pub fn highlight(code: &str, language: &str) -> Text<'static> {
    let syntax = (!language.is_empty())
        .then(|| SYNTAX_SET.find_syntax_by_token(language))
        .flatten();
    let theme = THEME_SET.themes.get(THEME);

    let (Some(syntax), Some(theme)) = (syntax, theme) else {
        return plain(code);
    };

    let mut hl = HighlightLines::new(syntax, theme);
    let mut lines = Vec::new();
    for line in LinesWithEndings::from(code) {
        let Ok(ranges) = hl.highlight_line(line, &SYNTAX_SET) else {
            return plain(code);
        };
        let spans: Vec<Span<'static>> = ranges
            .into_iter()
            .filter_map(|(hl_style, frag)| {
                let content = expand_tabs(frag.trim_end_matches(['\n', '\r']));
                if content.is_empty() {
                    return None;
                }
                let fg = Color::Rgb(
                    hl_style.foreground.r,
                    hl_style.foreground.g,
                    hl_style.foreground.b,
                );
                Some(Span::styled(content, Style::default().fg(fg)))
            })
            .collect();
        lines.push(Line::from(spans));
    }
    Text::from(lines)
}

fn plain(code: &str) -> Text<'static> {
    let style = Style::default().fg(Color::White);
    code.lines()
        .map(|l| Line::from(Span::styled(expand_tabs(l), style)))
        .collect::<Vec<_>>()
        .into()
}

// ratatui renders \t as zero-width
fn expand_tabs(s: &str) -> String {
    s.replace('\t', "    ")
}
