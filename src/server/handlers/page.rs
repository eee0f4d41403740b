// 列表页渲染
//
// 纯展示层：消费核心产出的 DirectoryEntry，不触碰文件系统

use crate::filesystem::{DirectoryEntry, EntryKind};

use super::href_for;

/// 渲染目录列表页
pub fn render_listing(current_rel: &str, entries: &[DirectoryEntry]) -> String {
    let title = if current_rel.is_empty() {
        "Root".to_string()
    } else {
        format!("/{}", html_escape::encode_quoted_attribute(current_rel))
    };

    let mut html = String::with_capacity(8 * 1024);
    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>My Drive - {title}</title>
<style>
body {{ font-family: sans-serif; background: #f1f3f4; margin: 0; padding: 20px; color: #333; }}
.container {{ background: #fff; padding: 20px 30px; border-radius: 10px; max-width: 1100px; margin: auto; }}
h1 {{ border-bottom: 1px solid #ddd; padding-bottom: 10px; }}
a {{ color: #1a73e8; text-decoration: none; }}
a:hover {{ text-decoration: underline; }}
.breadcrumbs {{ margin-bottom: 16px; font-size: 14px; color: #5f6368; }}
.upload-section, .search-section {{ margin-bottom: 16px; padding: 12px; background: #e8f0fe; border-radius: 8px; }}
table {{ width: 100%; border-collapse: collapse; }}
th, td {{ text-align: left; padding: 8px 10px; border-bottom: 1px solid #eee; font-size: 14px; }}
.meta {{ color: #5f6368; font-size: 12px; }}
.inaccessible {{ color: #d93025; }}
.actions form {{ display: inline; }}
.actions input[type=text] {{ width: 120px; }}
</style>
<script>
function filterItems() {{
  var term = document.getElementById('search-input').value.toLowerCase();
  var rows = document.getElementsByClassName('searchable-item');
  for (var i = 0; i < rows.length; i++) {{
    var name = rows[i].getAttribute('data-name').toLowerCase();
    rows[i].style.display = name.includes(term) ? '' : 'none';
  }}
}}
function confirmDelete(name) {{
  return confirm("确定要删除 '" + name + "' 吗？该操作不可恢复。");
}}
</script>
</head>
<body>
<div class="container">
<h1>📁 My Drive</h1>
{breadcrumbs}
<div class="upload-section">
<form enctype="multipart/form-data" method="post" action="/upload?path={upload_path}">
<input type="file" name="file" required>
<button type="submit">⬆ Upload File Here</button>
</form>
</div>
<div class="search-section">
<input type="search" id="search-input" placeholder="🔍 Search this folder..." oninput="filterItems()">
</div>
<table>
<tr><th>名称</th><th>大小</th><th>修改时间</th><th>操作</th></tr>
"#,
        title = title,
        breadcrumbs = render_breadcrumbs(current_rel),
        upload_path = urlencoding::encode(current_rel),
    ));

    for entry in entries {
        html.push_str(&render_entry(entry));
    }

    html.push_str("</table>\n</div>\n</body>\n</html>\n");
    html
}

/// 面包屑导航：Root > 一级 > 二级
fn render_breadcrumbs(current_rel: &str) -> String {
    let mut nav = String::from(r#"<nav class="breadcrumbs"><a href="/">Root</a>"#);
    if !current_rel.is_empty() {
        let mut accumulated = String::new();
        let parts: Vec<&str> = current_rel.split('/').collect();
        for (i, part) in parts.iter().enumerate() {
            if !accumulated.is_empty() {
                accumulated.push('/');
            }
            accumulated.push_str(part);
            let escaped = html_escape::encode_quoted_attribute(part);
            if i == parts.len() - 1 {
                nav.push_str(&format!(" &gt; <span>{}</span>", escaped));
            } else {
                nav.push_str(&format!(
                    " &gt; <a href=\"{}\">{}</a>",
                    href_for(&accumulated),
                    escaped
                ));
            }
        }
    }
    nav.push_str("</nav>");
    nav
}

/// 渲染单行条目，附带重命名与删除表单
fn render_entry(entry: &DirectoryEntry) -> String {
    let escaped_name = html_escape::encode_quoted_attribute(&entry.name);
    // confirm 对话框里的名称先做 JS 字符串转义，再做 HTML 转义
    let js_escaped = entry.name.replace('\\', "\\\\").replace('\'', "\\'");
    let js_name = html_escape::encode_quoted_attribute(&js_escaped);
    let link = href_for(&entry.rel_path);
    // 表单值放编码后的路径，浏览器提交时会再套一层表单编码
    let encoded_rel = urlencoding::encode(&entry.rel_path);

    let (display_name, meta) = match entry.kind {
        EntryKind::Directory => (format!("📂 {}", escaped_name), String::new()),
        EntryKind::File if entry.inaccessible => (
            format!("📄 <span class=\"inaccessible\">{} ( inaccessible )</span>", escaped_name),
            "0.00 MB | N/A".to_string(),
        ),
        EntryKind::File => {
            let size_mb = entry.size_bytes.unwrap_or(0) as f64 / (1024.0 * 1024.0);
            let mtime = entry.modified_at.as_deref().unwrap_or("N/A");
            (format!("📄 {}", escaped_name), format!("{:.2} MB | {}", size_mb, mtime))
        }
    };

    let (size_cell, mtime_cell) = match meta.split_once(" | ") {
        Some((size, mtime)) => (size.to_string(), mtime.to_string()),
        None => (String::new(), String::new()),
    };

    format!(
        r#"<tr class="searchable-item" data-name="{escaped_name}">
<td><a href="{link}">{display_name}</a></td>
<td class="meta">{size_cell}</td>
<td class="meta">{mtime_cell}</td>
<td class="actions">
<form method="post" action="/rename">
<input type="hidden" name="old_path" value="{encoded_rel}">
<input type="text" name="new_name" placeholder="新名称" required>
<button type="submit">Rename</button>
</form>
<form method="post" action="/delete" onsubmit="return confirmDelete('{js_name}')">
<input type="hidden" name="path" value="{encoded_rel}">
<button type="submit">Delete</button>
</form>
</td>
</tr>
"#,
        escaped_name = escaped_name,
        link = link,
        display_name = display_name,
        size_cell = size_cell,
        mtime_cell = mtime_cell,
        encoded_rel = encoded_rel,
        js_name = js_name,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_entry(name: &str, rel: &str) -> DirectoryEntry {
        DirectoryEntry {
            name: name.to_string(),
            kind: EntryKind::File,
            rel_path: rel.to_string(),
            size_bytes: Some(3 * 1024 * 1024),
            modified_at: Some("27-08-2026 10:15".to_string()),
            inaccessible: false,
        }
    }

    #[test]
    fn test_render_entry_escapes_quotes() {
        let entry = file_entry("it's \"mine\".txt", "it's \"mine\".txt");
        let html = render_entry(&entry);
        assert!(!html.contains("\"mine\""));
        assert!(html.contains("&quot;mine&quot;"));
        // 单引号不能原样落进 onsubmit 的 JS 字符串
        assert!(html.contains("it&#x27;s"));
    }

    #[test]
    fn test_render_entry_escapes_name() {
        let entry = file_entry("<script>.txt", "<script>.txt");
        let html = render_entry(&entry);
        assert!(!html.contains("<script>.txt"));
        assert!(html.contains("&lt;script&gt;.txt"));
        assert!(html.contains("3.00 MB"));
    }

    #[test]
    fn test_render_listing_contains_upload_target() {
        let html = render_listing("docs/项目", &[]);
        assert!(html.contains("/upload?path=docs%2F%E9%A1%B9%E7%9B%AE"));
        assert!(html.contains("Root"));
    }

    #[test]
    fn test_breadcrumbs_link_intermediate_segments() {
        let nav = render_breadcrumbs("a/b/c");
        assert!(nav.contains("href=\"/a\""));
        assert!(nav.contains("href=\"/a/b\""));
        // 末段不带链接
        assert!(!nav.contains("href=\"/a/b/c\""));
    }

    #[test]
    fn test_inaccessible_marker() {
        let mut entry = file_entry("broken.dat", "broken.dat");
        entry.inaccessible = true;
        entry.size_bytes = Some(0);
        entry.modified_at = None;
        let html = render_entry(&entry);
        assert!(html.contains("( inaccessible )"));
        assert!(html.contains("N/A"));
    }
}
