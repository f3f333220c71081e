//! Output formats for file listings and merged views.

use std::fmt::Write as _;
use std::io::IsTerminal;

use clap::ValueEnum;
use nu_ansi_term::{Color, Style};
use regex::Regex;
use serde::Serialize;

use crate::e_config::HighlightRule;
use crate::e_error::ConfigError;
use crate::e_index::AnnotationIndex;
use crate::e_merge::{MergedLine, MergedView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    #[default]
    Json,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Color when stdout is a terminal and `NO_COLOR` is unset.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn enabled(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
            }
        }
    }
}

/// Compiled [`HighlightRule`]s.
#[derive(Debug, Clone)]
pub struct Highlighter {
    rules: Vec<(String, Regex)>,
}

impl Highlighter {
    pub fn new(rules: &[HighlightRule]) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|regex| (rule.tag.clone(), regex))
                    .map_err(|source| ConfigError::Pattern {
                        tag: rule.tag.clone(),
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Highlighter { rules })
    }

    /// Tags whose pattern matches any message of `line`, in rule order.
    pub fn tags<'r>(&'r self, line: &MergedLine<'_>) -> Vec<&'r str> {
        if line.info.is_empty() {
            return Vec::new();
        }
        let joined = line.info.join("\n");
        self.rules
            .iter()
            .filter(|(_, regex)| regex.is_match(&joined))
            .map(|(tag, _)| tag.as_str())
            .collect()
    }
}

fn style_for(tags: &[&str]) -> Style {
    let has = |tag: &str| tags.iter().any(|t| *t == tag);
    if has("cannot-inline") && has("escapes-to-heap") {
        Color::Red.bold()
    } else if has("cannot-inline") {
        Color::Red.normal()
    } else if has("escapes-to-heap") {
        Color::Blue.normal()
    } else if has("inlining") {
        Color::Green.normal()
    } else if !tags.is_empty() {
        Color::Yellow.normal()
    } else {
        Style::new()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextOptions {
    pub color: bool,
    pub only_annotated: bool,
}

/// Renders a view as numbered source lines, each message indented below its line.
///
/// ```text
/// 3 | func foo() {}  [cannot-inline]
///   = cannot inline foo: function too complex
/// ```
pub fn render_text(
    view: &MergedView<'_>,
    highlighter: &Highlighter,
    options: TextOptions,
) -> String {
    let width = view.lines.len().to_string().len();
    let mut out = String::new();
    let _ = writeln!(out, "==> {} ({})", view.path, view.abs_path.display());
    for line in &view.lines {
        if options.only_annotated && line.info.is_empty() {
            continue;
        }
        let tags = highlighter.tags(line);
        let mut row = format!("{:>width$} | {}", line.number, line.content, width = width);
        if !tags.is_empty() {
            let _ = write!(row, "  [{}]", tags.join(", "));
        }
        if options.color {
            row = style_for(&tags).paint(row).to_string();
        }
        out.push_str(&row);
        out.push('\n');
        for message in &line.info {
            let _ = writeln!(out, "{:>width$} = {}", "", message, width = width);
        }
    }
    out
}

pub fn render_json(view: &MergedView<'_>, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(view)
    } else {
        serde_json::to_string(view)
    }
}

#[derive(Debug, Serialize)]
struct FileEntry<'a> {
    path: &'a str,
    #[serde(rename = "absPath")]
    abs_path: String,
    annotations: usize,
}

/// One `path<TAB>absolute path` row per indexed file, or a JSON array of the same.
pub fn render_file_list(index: &AnnotationIndex, json: bool) -> serde_json::Result<String> {
    if json {
        let entries: Vec<FileEntry<'_>> = index
            .files()
            .map(|file| FileEntry {
                path: file.path(),
                abs_path: file.abs_path().display().to_string(),
                annotations: file.annotations().len(),
            })
            .collect();
        return serde_json::to_string(&entries);
    }
    let mut out = String::new();
    for file in index.files() {
        let _ = writeln!(out, "{}\t{}", file.path(), file.abs_path().display());
    }
    Ok(out)
}
