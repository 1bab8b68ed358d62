//! Single place where a stored relative media path becomes a public URL.
//! Upload handlers store paths like `avatars/<uuid>`; everything that
//! serializes a profile or recipe out of the API goes through here.

pub fn media_url(base: &str, stored: &str) -> String {
    // Already-absolute URLs (external recipe images) pass through untouched.
    if stored.starts_with("http://") || stored.starts_with("https://") {
        return stored.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        stored.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_base_and_path() {
        assert_eq!(media_url("/media", "avatars/abc"), "/media/avatars/abc");
    }

    #[test]
    fn absolute_urls_pass_through() {
        assert_eq!(
            media_url("/media", "https://cdn.example/pic.jpg"),
            "https://cdn.example/pic.jpg"
        );
    }

    #[test]
    fn normalizes_redundant_slashes() {
        assert_eq!(media_url("/media/", "/avatars/abc"), "/media/avatars/abc");
        assert_eq!(
            media_url("https://forge.example/media/", "avatars/abc"),
            "https://forge.example/media/avatars/abc"
        );
    }
}
