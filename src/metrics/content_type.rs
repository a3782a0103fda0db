//! Content type classification for response MIME types

pub fn content_type(mime_type: &str) -> &'static str {
    let mime_type = mime_type.to_ascii_lowercase();

    if mime_type.contains("html") {
        "doc"
    } else if mime_type.contains("css") {
        "css"
    } else if mime_type.contains("javascript") {
        "js"
    } else if mime_type.contains("json") {
        "json"
    } else if mime_type.starts_with("image") {
        "image"
    } else if mime_type.contains("flash") {
        "flash"
    } else if mime_type.contains("font") {
        "font"
    } else {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types() {
        assert_eq!(content_type("text/html; charset=utf-8"), "doc");
        assert_eq!(content_type("text/css"), "css");
        assert_eq!(content_type("application/x-javascript"), "js");
        assert_eq!(content_type("application/json"), "json");
        assert_eq!(content_type("image/png"), "image");
        assert_eq!(content_type("application/x-shockwave-flash"), "flash");
        assert_eq!(content_type("font/woff2"), "font");
        assert_eq!(content_type(""), "unknown");
    }
}
