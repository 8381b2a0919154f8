//! DOM text helpers shared by the HTML extractors.

use scraper::{ElementRef, Node, Selector};

/// Elements that start a new line when flattening text.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "footer", "form", "h1",
    "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "ol", "p", "section", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Collapse every whitespace run to a single space and trim.
pub fn compact_ws(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All text below `elem`, whitespace-compacted.
pub fn text_content(elem: ElementRef<'_>) -> String {
    compact_ws(&elem.text().collect::<Vec<_>>().join(" "))
}

/// Text below `elem` split at block boundaries and `<br>`.
///
/// Each line is whitespace-compacted; empty lines are dropped.
pub fn block_lines(elem: ElementRef<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    collect_lines(elem, &mut lines, &mut current);
    flush_line(&mut lines, &mut current);
    lines
}

fn collect_lines(elem: ElementRef<'_>, lines: &mut Vec<String>, current: &mut String) {
    for child in elem.children() {
        match child.value() {
            Node::Text(text) => {
                current.push(' ');
                current.push_str(text);
            }
            Node::Element(element) => {
                let name = element.name();
                if name == "br" {
                    flush_line(lines, current);
                    continue;
                }
                if matches!(name, "script" | "style" | "head") {
                    continue;
                }
                let block = BLOCK_TAGS.contains(&name);
                if block {
                    flush_line(lines, current);
                }
                if let Some(child_elem) = ElementRef::wrap(child) {
                    collect_lines(child_elem, lines, current);
                }
                if block {
                    flush_line(lines, current);
                }
            }
            _ => {}
        }
    }
}

fn flush_line(lines: &mut Vec<String>, current: &mut String) {
    let line = compact_ws(current);
    if !line.is_empty() {
        lines.push(line);
    }
    current.clear();
}

/// First element below `root` matching `css`, excluding `root` itself.
pub fn select_first<'a>(root: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    select_all(root, css).into_iter().next()
}

/// Every element below `root` matching `css`, in document order.
pub fn select_all<'a>(root: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };
    root.select(&selector)
        .filter(|elem| elem.id() != root.id())
        .collect()
}

/// Direct element children of `elem` with the given tag name.
pub fn child_elements<'a>(elem: ElementRef<'a>, tag: &str) -> Vec<ElementRef<'a>> {
    elem.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == tag)
        .collect()
}

/// Whether the inline `style` attribute declares a flex container.
pub fn has_flex_style(elem: ElementRef<'_>) -> bool {
    let style = elem.value().attr("style").unwrap_or("").to_lowercase();
    style.contains("display") && style.contains("flex")
}

/// Whether `elem` lies inside the subtree of `ancestor`.
pub fn is_within(elem: ElementRef<'_>, ancestor: ElementRef<'_>) -> bool {
    elem.ancestors().any(|node| node.id() == ancestor.id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_compact_ws() {
        assert_eq!(compact_ws("  a \n\t b  "), "a b");
        assert_eq!(compact_ws(""), "");
    }

    #[test]
    fn test_block_lines_split_on_blocks_and_br() {
        let doc = Html::parse_fragment(
            "<div><strong>Customer</strong><br>ACME  Ltd<p>Main St 1</p><span>VAT:</span> 123</div>",
        );
        let root = doc.root_element();
        assert_eq!(
            block_lines(root),
            vec!["Customer", "ACME Ltd", "Main St 1", "VAT: 123"]
        );
    }

    #[test]
    fn test_select_first_excludes_root() {
        let doc = Html::parse_document("<div class='a'><div class='a'>inner</div></div>");
        let outer = select_first(doc.root_element(), "div.a").unwrap();
        let inner = select_first(outer, "div.a").unwrap();
        assert_eq!(text_content(inner), "inner");
        assert!(is_within(inner, outer));
    }

    #[test]
    fn test_has_flex_style() {
        let doc = Html::parse_fragment("<div style='Display: FLEX; gap: 4px'></div>");
        let div = select_first(doc.root_element(), "div").unwrap();
        assert!(has_flex_style(div));
    }
}
