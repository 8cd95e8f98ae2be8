use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// Directories holding the crate's own sources. Everything else in the tree is
// left alone.
const SOURCE_ROOTS: [&str; 6] = ["src", "data", "model", "update", "tests", "benches"];

const FORBIDDEN_WORDS: &str = "FIXED|CORRECTED|FIX|FIXES|NEW|CHANGED|CHANGES|CHANGE|MODIFIED|MODIFIES|MODIFY|UPDATED|UPDATES|UPDATE";

#[derive(Clone, Copy)]
enum Rule {
    UnderscorePrefix,
    AllowDeadCode,
    ForbiddenWords,
    StarsInComment,
    AllCapsComment,
}

impl Rule {
    fn pattern(self) -> String {
        match self {
            Rule::UnderscorePrefix => r"\b(_[a-zA-Z0-9_]+)\b".to_string(),
            Rule::AllowDeadCode => r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]".to_string(),
            Rule::ForbiddenWords => format!(r"(//|/\*).*\b(?:{FORBIDDEN_WORDS})\b"),
            Rule::StarsInComment => r"(//|/\*).*\*\*".to_string(),
            Rule::AllCapsComment => r"(//|/\*).*".to_string(),
        }
    }

    fn description(self) -> &'static str {
        match self {
            Rule::UnderscorePrefix => "underscore-prefixed bindings",
            Rule::AllowDeadCode => "#[allow(dead_code)] attributes",
            Rule::ForbiddenWords => "comments narrating edits (FIX, NEW, CHANGE, UPDATE and the like)",
            Rule::StarsInComment => "'**' in regular comments",
            Rule::AllCapsComment => "comments written entirely in capitals",
        }
    }

    /// Whether a line the pattern matched really breaks the rule.
    fn violated_by(self, line: &str) -> bool {
        let trimmed = line.trim_start();
        match self {
            Rule::UnderscorePrefix => !trimmed.starts_with("//") && !inside_string(line),
            Rule::AllowDeadCode | Rule::ForbiddenWords => true,
            Rule::StarsInComment => !trimmed.starts_with("///") && !trimmed.starts_with("//!"),
            Rule::AllCapsComment => {
                let Some(comment) = comment_text(trimmed) else {
                    return false;
                };
                let letters: Vec<char> = comment.chars().filter(|c| c.is_alphabetic()).collect();
                !letters.is_empty() && letters.iter().all(|c| c.is_uppercase())
            }
        }
    }
}

// True when an underscore appears between a pair of double quotes.
fn inside_string(line: &str) -> bool {
    line.split('"')
        .enumerate()
        .any(|(i, part)| i % 2 == 1 && part.contains('_'))
}

fn comment_text(trimmed: &str) -> Option<&str> {
    for prefix in ["///", "//!", "//"] {
        if let Some(rest) = trimmed.strip_prefix(prefix) {
            return Some(rest.trim());
        }
    }
    None
}

struct Collector {
    rule: Rule,
    violations: Vec<String>,
    file_path: PathBuf,
}

impl Collector {
    fn new(rule: Rule, file_path: &Path) -> Self {
        Self {
            rule,
            violations: Vec::new(),
            file_path: file_path.to_path_buf(),
        }
    }

    fn error_message(&self) -> Option<String> {
        if self.violations.is_empty() {
            return None;
        }
        let mut msg = format!(
            "\n❌ ERROR: Found {} {} in {}:\n",
            self.violations.len(),
            self.rule.description(),
            self.file_path.display()
        );
        for violation in &self.violations {
            msg.push_str(&format!("   {violation}\n"));
        }
        msg.push_str("\n⚠️ These are not allowed in this project. Remove them before committing.\n");
        Some(msg)
    }
}

impl Sink for Collector {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();
        if self.rule.violated_by(line_text) {
            self.violations.push(format!("{line_number}:{line_text}"));
        }
        Ok(true)
    }
}

fn source_files() -> Vec<PathBuf> {
    SOURCE_ROOTS
        .iter()
        .flat_map(|root| WalkDir::new(root).into_iter().filter_map(|e| e.ok()))
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| e.into_path())
        .collect()
}

fn scan(rule: Rule, files: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    let matcher = RegexMatcher::new_line_matcher(&rule.pattern())?;
    let mut searcher = Searcher::new();
    for path in files {
        let mut collector = Collector::new(rule, path);
        searcher.search_path(&matcher, path, &mut collector)?;
        if let Some(message) = collector.error_message() {
            return Err(message.into());
        }
    }
    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for root in SOURCE_ROOTS {
        println!("cargo:rerun-if-changed={root}");
    }

    let files = source_files();
    let rules = [
        Rule::UnderscorePrefix,
        Rule::AllowDeadCode,
        Rule::ForbiddenWords,
        Rule::StarsInComment,
        Rule::AllCapsComment,
    ];
    for rule in rules {
        if let Err(e) = scan(rule, &files) {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
