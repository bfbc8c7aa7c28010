//! Text rendering of virtual trees for diagnostics.

use std::fmt::Write as _;

use itertools::{EitherOrBoth, Itertools};

use crate::folder::VirtualFolder;
use crate::item::VirtualItem;
use crate::node::ContentHash;
use crate::transform::NamePattern;

const INDENT: &str = "  ";
const CONTENT_MARK: &str = "| ";

impl VirtualFolder {
    /// Render the tree as indented text.
    ///
    /// Children are sorted (items first, then folders) so two equal trees
    /// always render identically regardless of insertion order. `indent` is
    /// the starting depth. With `filter`, only items whose name matches are
    /// listed; folders are always shown. With `show_contents`, text content is
    /// printed below each item and binary content is summarized by its digest.
    pub fn print_folder(
        &self,
        show_contents: bool,
        indent: usize,
        filter: Option<&NamePattern>,
    ) -> String {
        let mut out = String::new();
        self.render_into(&mut out, show_contents, indent, filter);
        out
    }

    fn render_into(
        &self,
        out: &mut String,
        show_contents: bool,
        depth: usize,
        filter: Option<&NamePattern>,
    ) {
        let pad = INDENT.repeat(depth);
        let _ = writeln!(out, "{pad}{}/", self.name);

        let items = self
            .items
            .iter()
            .filter(|i| filter.is_none_or(|p| p.is_match(&i.name())))
            .sorted_by_cached_key(|i| i.sort_key());
        for item in items {
            let _ = writeln!(out, "{pad}{INDENT}{}", item.name());
            if show_contents {
                render_contents(out, item, &format!("{pad}{INDENT}{INDENT}"));
            }
        }

        for folder in self.folders.iter().sorted_by(|a, b| a.name.cmp(&b.name)) {
            folder.render_into(out, show_contents, depth + 1, filter);
        }
    }
}

fn render_contents(out: &mut String, item: &VirtualItem, pad: &str) {
    match item.load_contents() {
        Ok(data) if data.is_empty() => {
            let _ = writeln!(out, "{pad}<empty>");
        }
        Ok(data) => match std::str::from_utf8(&data) {
            Ok(text) if !text.contains('\0') => {
                for line in text.lines() {
                    let _ = writeln!(out, "{pad}{CONTENT_MARK}{line}");
                }
            }
            _ => {
                let _ = writeln!(
                    out,
                    "{pad}<binary {} bytes, blake3 {}>",
                    data.len(),
                    ContentHash::of(&data).short_hex()
                );
            }
        },
        Err(e) => {
            let _ = writeln!(out, "{pad}<unreadable: {e}>");
        }
    }
}

/// Render an expected and an actual tree in two columns.
///
/// Lines that differ are marked with `*` between the columns.
pub fn render_side_by_side(
    expected: &VirtualFolder,
    actual: &VirtualFolder,
    show_contents: bool,
) -> String {
    let left = expected.print_folder(show_contents, 0, None);
    let right = actual.print_folder(show_contents, 0, None);

    let width = left
        .lines()
        .map(|l| l.chars().count())
        .chain(std::iter::once("expected".len()))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}   {}", "expected", "actual");
    let _ = writeln!(out, "{:<width$}   {}", "--------", "------");

    for pair in left.lines().zip_longest(right.lines()) {
        let (l, r) = match pair {
            EitherOrBoth::Both(l, r) => (l, r),
            EitherOrBoth::Left(l) => (l, ""),
            EitherOrBoth::Right(r) => ("", r),
        };
        let mark = if l == r { ' ' } else { '*' };
        let line = format!("{l:<width$} {mark} {r}");
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(order: &[&str]) -> VirtualFolder {
        let mut root = VirtualFolder::new("root").unwrap();
        for name in order {
            root.add_item(VirtualItem::from_file_name(name, Some(b"hi".to_vec())).unwrap())
                .unwrap();
        }
        let sub = root.add_sub_folder(VirtualFolder::new("sub").unwrap()).unwrap();
        sub.add_item(VirtualItem::new("bin", "dat", Some(vec![0, 159, 146, 150])).unwrap())
            .unwrap();
        root
    }

    #[test]
    fn test_print_folder_layout() {
        let rendered = tree(&["b.txt", "a.ps1"]).print_folder(false, 0, None);
        assert_eq!(rendered, "root/\n  a.ps1\n  b.txt\n  sub/\n    bin.dat\n");
    }

    #[test]
    fn test_print_folder_is_order_independent() {
        let a = tree(&["a.ps1", "b.txt", "c.json"]);
        let b = tree(&["c.json", "b.txt", "a.ps1"]);
        assert_eq!(a.print_folder(true, 1, None), b.print_folder(true, 1, None));
    }

    #[test]
    fn test_print_folder_contents_and_filter() {
        let root = tree(&["a.ps1", "b.txt"]);
        let rendered = root.print_folder(true, 0, None);
        assert!(rendered.contains("    | hi"));
        assert!(rendered.contains("<binary 4 bytes, blake3 "));

        let filter = NamePattern::new("*.txt").unwrap();
        let rendered = root.print_folder(false, 0, Some(&filter));
        assert!(rendered.contains("b.txt"));
        assert!(!rendered.contains("a.ps1"));
        assert!(rendered.contains("sub/"));
    }

    #[test]
    fn test_side_by_side_marks_differences() {
        let expected = tree(&["a.ps1"]);
        let actual = tree(&["a.txt"]);
        let rendered = render_side_by_side(&expected, &actual, false);
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].starts_with("expected"));
        assert!(lines.iter().any(|l| l.contains("a.ps1") && l.contains('*') && l.contains("a.txt")));
        assert!(lines.iter().any(|l| l.contains("sub/") && !l.contains('*')));
    }
}
