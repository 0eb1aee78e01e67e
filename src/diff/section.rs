//! Splits unified diff text into per-file sections.
//!
//! Sections are keyed by the post-image (`b/`) path from the `diff --git`
//! header, so renames are attributed to their new location. Anything before
//! the first header (mode lines, stray output) is dropped.

use regex_lite::Regex;

/// One file's portion of a unified diff, header line included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSection {
    /// Post-image path, as spelled in the diff header.
    pub path: String,
    /// Full section text from the `diff --git` line up to the next header.
    pub content: String,
}

/// Partition a unified diff into per-file sections, in encounter order.
///
/// A path that appears twice keeps its first position but takes the later
/// occurrence's content. An empty or headerless diff yields no sections.
pub fn parse_sections(diff: &str) -> Vec<DiffSection> {
    let header = Regex::new(r"^diff --git a/(.+?) b/(.+)$").expect("Invalid regex");

    let mut sections: Vec<DiffSection> = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for line in diff.split('\n') {
        if let Some(caps) = header.captures(line) {
            if let Some((path, lines)) = current.take() {
                push_section(&mut sections, path, lines);
            }
            let path = caps.get(2).map(|m| m.as_str()).unwrap_or_default().to_string();
            current = Some((path, vec![line]));
        } else if let Some((_, lines)) = current.as_mut() {
            lines.push(line);
        }
    }
    if let Some((path, lines)) = current.take() {
        push_section(&mut sections, path, lines);
    }

    sections
}

fn push_section(sections: &mut Vec<DiffSection>, path: String, lines: Vec<&str>) {
    let content = lines.join("\n");
    match sections.iter_mut().find(|s| s.path == path) {
        Some(existing) => existing.content = content,
        None => sections.push(DiffSection { path, content }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_FILE_DIFF: &str = "\
diff --git a/src/main.rs b/src/main.rs
index 1111111..2222222 100644
--- a/src/main.rs
+++ b/src/main.rs
@@ -1,3 +1,4 @@
 fn main() {
+    println!(\"hello\");
 }
diff --git a/README.md b/README.md
index 3333333..4444444 100644
--- a/README.md
+++ b/README.md
@@ -1 +1,2 @@
 # readme
+new line";

    #[test]
    fn splits_diff_into_one_section_per_file() {
        let sections = parse_sections(TWO_FILE_DIFF);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].path, "src/main.rs");
        assert_eq!(sections[1].path, "README.md");
    }

    #[test]
    fn section_content_starts_at_its_header_line() {
        let sections = parse_sections(TWO_FILE_DIFF);

        assert!(
            sections[0]
                .content
                .starts_with("diff --git a/src/main.rs b/src/main.rs")
        );
        assert!(sections[0].content.contains("println!"));
        assert!(!sections[0].content.contains("readme"));
    }

    #[test]
    fn last_section_runs_to_end_of_input() {
        let sections = parse_sections(TWO_FILE_DIFF);
        assert!(sections[1].content.ends_with("+new line"));
    }

    #[test]
    fn empty_diff_yields_no_sections() {
        assert!(parse_sections("").is_empty());
    }

    #[test]
    fn content_before_first_header_is_discarded() {
        let diff = "warning: LF will be replaced by CRLF\n".to_string() + TWO_FILE_DIFF;
        let sections = parse_sections(&diff);

        assert_eq!(sections.len(), 2);
        assert!(sections[0].content.starts_with("diff --git"));
    }

    #[test]
    fn headerless_text_yields_no_sections() {
        let sections = parse_sections("just some text\nwith lines\n");
        assert!(sections.is_empty());
    }

    #[test]
    fn rename_is_keyed_by_new_path() {
        let diff = "\
diff --git a/old_name.rs b/new_name.rs
similarity index 90%
rename from old_name.rs
rename to new_name.rs";
        let sections = parse_sections(diff);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].path, "new_name.rs");
    }

    #[test]
    fn paths_with_spaces_are_parsed() {
        let diff = "\
diff --git a/docs/my notes.md b/docs/my notes.md
index 1111111..2222222 100644
--- a/docs/my notes.md
+++ b/docs/my notes.md
@@ -1 +1 @@
-a
+b";
        let sections = parse_sections(diff);

        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].path, "docs/my notes.md");
    }

    #[test]
    fn duplicate_path_keeps_position_but_takes_later_content() {
        let diff = "\
diff --git a/a.txt b/a.txt
first version
diff --git a/b.txt b/b.txt
other file
diff --git a/a.txt b/a.txt
second version";
        let sections = parse_sections(diff);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].path, "a.txt");
        assert!(sections[0].content.contains("second version"));
        assert!(!sections[0].content.contains("first version"));
        assert_eq!(sections[1].path, "b.txt");
    }
}
