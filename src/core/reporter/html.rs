//! HTML rendering for the duplicate report.

use super::{ReportGroup, ReportImage};
use chrono::Local;
use std::io::Write;

/// Render a standalone HTML page for `groups`
pub fn render_html<W: Write>(groups: &[ReportGroup], title: &str, mut writer: W) -> std::io::Result<()> {
    let removed: usize = groups.iter().map(|g| g.removed.len()).sum();

    write!(
        writer,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 20px; }}
        .summary {{ color: #555; margin-bottom: 2rem; }}
        .group {{ margin-bottom: 40px; border: 1px solid #ccc; border-radius: 8px; padding: 10px; }}
        .group-header {{ font-weight: bold; margin-bottom: 10px; }}
        .match-badge {{ font-weight: normal; font-size: 0.8em; color: #666; margin-left: 0.5rem; }}
        .images {{ display: flex; flex-wrap: wrap; }}
        .image-container {{ margin: 5px; text-align: center; }}
        .thumbnail {{ max-width: 200px; max-height: 200px; }}
        .kept {{ border: 3px solid #22c55e; }}
        .removed {{ border: 3px solid #ef4444; }}
        .missing {{ width: 200px; height: 120px; line-height: 120px; background: #eee; color: #999; }}
        .filename {{ font-size: 0.8em; max-width: 200px; word-wrap: break-word; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <p class="summary">Generated on: {generated} &middot; {groups} duplicate groups &middot; {removed} images removed</p>
"#,
        title = escape(title),
        generated = Local::now().format("%Y-%m-%d %H:%M:%S"),
        groups = groups.len(),
        removed = removed,
    )?;

    if groups.is_empty() {
        writeln!(writer, "    <p>No duplicates found.</p>")?;
    }

    for group in groups {
        write!(
            writer,
            r#"
    <div class="group">
        <div class="group-header">Group {}: {} similar images<span class="match-badge">{}</span></div>
        <div class="images">
"#,
            group.number,
            group.len(),
            group.match_type
        )?;

        write_image(&mut writer, &group.kept, "kept", "KEPT")?;
        for image in &group.removed {
            write_image(&mut writer, image, "removed", "REMOVED")?;
        }

        writeln!(writer, "        </div>\n    </div>")?;
    }

    write!(writer, "</body>\n</html>\n")?;
    writer.flush()
}

fn write_image<W: Write>(writer: &mut W, image: &ReportImage, class: &str, label: &str) -> std::io::Result<()> {
    let original = image
        .source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let picture = if image.available {
        format!(
            r#"<img src="{}" class="thumbnail {}">"#,
            escape(&image.file_name),
            class
        )
    } else {
        format!(r#"<div class="missing {}">unavailable</div>"#, class)
    };

    write!(
        writer,
        r#"            <div class="image-container">
                {}
                <div class="filename">{} ({})</div>
            </div>
"#,
        picture,
        escape(&original),
        label
    )
}

/// Minimal escaping for text and attribute values
fn escape(text: &str) -> String {
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
