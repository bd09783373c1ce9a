use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use url::Url;

/// `![alt](path)`
static IMAGE_REF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[(.*?)\]\(([^)]+)\)").expect("valid image reference regex"));

/// Characters left alone by JavaScript's `encodeURIComponent`
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// How a single image reference was resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageResolution {
    /// Already absolute, left untouched
    Absolute,
    /// Matched by filename against the recipe's known image URLs
    KnownImage(String),
    /// Built from a GitHub blob source URL as a raw content URL
    GitHubRaw(String),
    /// Joined onto the source URL's directory
    Relative(String),
    /// Nothing worked; the reference renders as a broken image
    Unresolved,
}

impl ImageResolution {
    pub fn url(&self) -> Option<&str> {
        match self {
            ImageResolution::KnownImage(url)
            | ImageResolution::GitHubRaw(url)
            | ImageResolution::Relative(url) => Some(url),
            ImageResolution::Absolute | ImageResolution::Unresolved => None,
        }
    }
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://")
        || path.starts_with("https://")
        || path.starts_with("//")
        || path.starts_with("data:")
}

/// Drop one leading `./` or `../`
fn strip_relative_prefix(path: &str) -> &str {
    path.strip_prefix("./")
        .or_else(|| path.strip_prefix("../"))
        .unwrap_or(path)
}

fn matches_filename(candidate: &str, filename: &str) -> bool {
    if candidate.contains(filename)
        || candidate.contains(&utf8_percent_encode(filename, URI_COMPONENT).to_string())
    {
        return true;
    }

    match Url::parse(candidate) {
        Ok(parsed) => {
            let url_filename = parsed
                .path_segments()
                .and_then(|segments| segments.last())
                .unwrap_or_default();
            url_filename == filename
                || percent_decode_str(url_filename)
                    .decode_utf8()
                    .map(|decoded| decoded == filename)
                    .unwrap_or(false)
        }
        Err(_) => false,
    }
}

/// Resolve one image path against the recipe's images and source URL.
///
/// Best-effort: tries known image URLs by filename, then a GitHub raw URL
/// derived from a blob source, then the source URL's directory.
pub fn resolve_image_path(path: &str, base_url: &str, image_urls: &[String]) -> ImageResolution {
    let path = path.trim();
    if is_absolute(path) {
        return ImageResolution::Absolute;
    }

    let cleaned = strip_relative_prefix(path);
    let filename = cleaned.rsplit('/').next().unwrap_or_default();
    if filename.is_empty() {
        return ImageResolution::Unresolved;
    }

    if let Some(found) = image_urls
        .iter()
        .filter(|url| is_absolute(url))
        .find(|url| matches_filename(url, filename))
    {
        return ImageResolution::KnownImage(found.clone());
    }

    if base_url.is_empty() {
        return ImageResolution::Unresolved;
    }

    if base_url.contains("github.com") && base_url.contains("/blob/") {
        let raw_base = base_url
            .replacen("github.com", "raw.githubusercontent.com", 1)
            .replacen("/blob/", "/", 1);
        if let Some(joined) = join(&raw_base, path) {
            return ImageResolution::GitHubRaw(joined);
        }
    }

    match join(base_url, path) {
        Some(joined) => ImageResolution::Relative(joined),
        None => ImageResolution::Unresolved,
    }
}

fn join(base: &str, path: &str) -> Option<String> {
    Url::parse(base)
        .and_then(|base| base.join(path))
        .map(String::from)
        .ok()
}

/// Rewrite every relative image reference in `markdown`
pub fn resolve_image_paths(markdown: &str, base_url: &str, image_urls: &[String]) -> String {
    if markdown.is_empty() {
        return String::new();
    }

    IMAGE_REF_REGEX
        .replace_all(markdown, |caps: &Captures| {
            let alt = &caps[1];
            let path = &caps[2];
            match resolve_image_path(path, base_url, image_urls).url() {
                Some(url) => {
                    debug!("Replaced {} with {}", path, url);
                    format!("![{}]({})", alt, url)
                }
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOB_SOURCE: &str = "https://github.com/x/y/blob/master/dishes/drink/z.md";

    #[test]
    fn test_github_blob_source_becomes_raw_directory() {
        let resolved = resolve_image_paths("![alt](./photo.jpg)", BLOB_SOURCE, &[]);
        assert_eq!(
            resolved,
            "![alt](https://raw.githubusercontent.com/x/y/master/dishes/drink/photo.jpg)"
        );
    }

    #[test]
    fn test_known_image_wins() {
        let images = vec![
            "./photo.jpg".to_string(),
            "https://media.githubusercontent.com/media/x/y/master/dishes/drink/photo.jpg"
                .to_string(),
        ];
        let resolution = resolve_image_path("./photo.jpg", BLOB_SOURCE, &images);
        assert_eq!(
            resolution,
            ImageResolution::KnownImage(
                "https://media.githubusercontent.com/media/x/y/master/dishes/drink/photo.jpg"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_known_image_matches_encoded_filename() {
        let images = vec!["https://cdn.example.com/img/%E9%85%B8%E6%A2%85%E6%B1%A4.jpg".to_string()];
        let resolution = resolve_image_path("./酸梅汤.jpg", "", &images);
        assert_eq!(resolution, ImageResolution::KnownImage(images[0].clone()));
    }

    #[test]
    fn test_plain_source_uses_directory() {
        let resolution = resolve_image_path("img/a.png", "https://example.com/recipes/z.md", &[]);
        assert_eq!(
            resolution,
            ImageResolution::Relative("https://example.com/recipes/img/a.png".to_string())
        );
    }

    #[test]
    fn test_absolute_untouched() {
        let markdown = "![a](https://example.com/a.jpg)";
        assert_eq!(resolve_image_paths(markdown, BLOB_SOURCE, &[]), markdown);
    }

    #[test]
    fn test_unresolvable_left_alone() {
        let markdown = "![a](./a.jpg)";
        assert_eq!(resolve_image_paths(markdown, "", &[]), markdown);
        assert_eq!(resolve_image_paths(markdown, "#", &[]), markdown);
    }

    #[test]
    fn test_text_around_images_preserved() {
        let resolved = resolve_image_paths(
            "先泡 ![a](./a.jpg) 再煮 ![b](https://x.com/b.jpg)",
            "https://example.com/r/",
            &[],
        );
        assert_eq!(
            resolved,
            "先泡 ![a](https://example.com/r/a.jpg) 再煮 ![b](https://x.com/b.jpg)"
        );
    }
}
