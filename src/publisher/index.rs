use chrono::{DateTime, TimeZone};
use std::fmt::Display;

use super::checksum::{checksums_text, ChecksumEntry};
use super::{combined_filename, ARCHIVE_FILE};
use crate::routes::AddressFamily;

pub const INDEX_FILE: &str = "index.html";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<title>Blocklists</title>
<style>body {margin: 0 auto; max-width: 768px;}</style>
</head>
<body>
<h1>Blocklists</h1>
<pre>
<a href="{archive}">{archive}</a>
<a href="{combined_v4}">{combined_v4}</a>
<a href="{combined_v6}">{combined_v6}</a>

<b>SHA256</b>								 <b>Blocklist</b>
{files}

Generated at {datetime}
</pre>
</body>
</html>"#;

/// Render the static index page listing the published files
pub fn render_index<Tz>(checksums: &[ChecksumEntry], generated_at: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    TEMPLATE
        .replace("{archive}", ARCHIVE_FILE)
        .replace("{combined_v4}", &combined_filename(AddressFamily::V4))
        .replace("{combined_v6}", &combined_filename(AddressFamily::V6))
        .replace("{files}", &escape_html(&checksums_text(checksums)))
        .replace(
            "{datetime}",
            &generated_at.format("%Y-%m-%d %H:%M").to_string(),
        )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
