use percent_encoding::percent_decode_str;
use url::Url;

/// Extract filename from URL path
pub fn filename_from_url(url: &str) -> Option<String> {
    Url::parse(url).ok().and_then(|u| {
        u.path_segments()
            .and_then(|mut s| s.next_back())
            .filter(|s| !s.is_empty())
            .and_then(|s| {
                percent_decode_str(s)
                    .decode_utf8()
                    .ok()
                    .map(|cow| cow.into_owned())
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://github.com/o/r/releases/download/v1/GlyphMono_v1.0.zip"),
            Some("GlyphMono_v1.0.zip".to_string())
        );
        assert_eq!(
            filename_from_url("https://example.com/a/My%20Font.zip?x=1"),
            Some("My Font.zip".to_string())
        );
        assert_eq!(filename_from_url("https://example.com/dir/"), None);
        assert_eq!(filename_from_url("not a url"), None);
    }
}
