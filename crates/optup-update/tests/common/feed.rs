//! Release feed payloads

use serde_json::{json, Value};

/// Feed document with a single linux release for `code`
pub fn feed_body(code: &str, build: &str, link: &str, size: u64) -> Value {
    json!({
        code: [{
            "date": "2024-05-22",
            "type": "release",
            "version": build,
            "build": build,
            "downloads": {
                "linux": {
                    "link": link,
                    "size": size.to_string(),
                    "checksumLink": format!("{}.sha256", link)
                }
            }
        }]
    })
}
