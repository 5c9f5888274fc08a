//! Renders parsed sections into an HTML fragment or normalized markdown.
//! Both renderers only borrow the parsed sections and keep their order.

use crate::sections::{Section, SectionKind};

/// Renders sections as an HTML fragment, one `<section>` per parsed section.
pub fn render_html(sections: &[Section]) -> String {
    let mut html = String::with_capacity(1024);

    for section in sections {
        match section.kind {
            SectionKind::TopicSection => {
                html.push_str("<section class=\"topic\">\n");
                html.push_str(&format!("<h2>{}</h2>\n", escape_html(&section.heading)));
                for line in &section.raw_lines {
                    html.push_str(&format!("<p>{}</p>\n", escape_html(line)));
                }
            }
            SectionKind::ItemSection => {
                html.push_str("<section class=\"item\">\n");
                html.push_str(&format!("<h2>{}</h2>\n", escape_html(&section.heading)));
                for detail in &section.details {
                    html.push_str("<div class=\"detail\">\n");
                    html.push_str(&format!("<h3>{}</h3>\n", escape_html(&detail.title)));
                    for line in &detail.lines {
                        html.push_str(&format!("<p>{}</p>\n", escape_html(line)));
                    }
                    html.push_str("</div>\n");
                }
            }
        }
        html.push_str("</section>\n");
    }

    html
}

/// Renders sections back to markdown: `##` per section, `###` per detail, `-` per line.
pub fn render_markdown(sections: &[Section]) -> String {
    let mut md = String::new();

    for section in sections {
        if !md.is_empty() {
            md.push('\n');
        }
        md.push_str(&format!("## {}\n", section.heading));
        for line in &section.raw_lines {
            md.push_str(&format!("- {}\n", bullet_text(line)));
        }
        for detail in &section.details {
            md.push_str(&format!("\n### {}\n", detail.title));
            for line in &detail.lines {
                md.push_str(&format!("- {}\n", bullet_text(line)));
            }
        }
    }

    md
}

fn bullet_text(line: &str) -> &str {
    line.strip_prefix("- ").unwrap_or(line)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::parse;

    #[test]
    fn test_render_html_topic_section() {
        let sections = parse("Tips:\nDo X\nDo Y");
        let html = render_html(&sections);
        assert_eq!(
            html,
            "<section class=\"topic\">\n<h2>Tips</h2>\n<p>Do X</p>\n<p>Do Y</p>\n</section>\n"
        );
    }

    #[test]
    fn test_render_html_item_section_details() {
        let sections = parse("myrepo\nfirst note\nDescription: A sample app");
        let html = render_html(&sections);
        assert!(html.starts_with("<section class=\"item\">\n<h2>myrepo</h2>\n"));
        let general = html.find("<h3>General</h3>").unwrap();
        let description = html.find("<h3>Description</h3>").unwrap();
        assert!(general < description);
        assert!(html.contains("<p>A sample app</p>"));
    }

    #[test]
    fn test_render_html_escapes_text() {
        let sections = parse("Notes:\nUse <script> & \"quotes\"");
        let html = render_html(&sections);
        assert!(html.contains("<p>Use &lt;script&gt; &amp; &quot;quotes&quot;</p>"));
    }

    #[test]
    fn test_render_empty_sections() {
        assert_eq!(render_html(&[]), "");
        assert_eq!(render_markdown(&[]), "");
    }

    #[test]
    fn test_render_markdown_normalizes_bullets() {
        let sections = parse("## Strengths\n- Clean code\nportfolio\nLive Demo: missing");
        let md = render_markdown(&sections);
        assert_eq!(
            md,
            "## Strengths\n- Clean code\n\n## portfolio\n\n### Live Demo\n- missing\n"
        );
    }

    #[test]
    fn test_render_does_not_reorder() {
        let sections = parse("Zeta:\na line\nAlpha:\nanother line");
        let md = render_markdown(&sections);
        assert!(md.find("Zeta").unwrap() < md.find("Alpha").unwrap());
    }
}
