/// Resolves view paths against the configured backend URL.
#[derive(Debug, Clone)]
pub struct UrlBuilder {
    base_url: String,
}

impl UrlBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Builds the absolute URL for `path`.
    ///
    /// Absolute paths (`http://`, `https://`) are returned as is. Relative
    /// paths are joined to `base_url` (or the builder's default) with exactly
    /// one `/` in between, so `"example"` and `"/example"` resolve the same
    /// and `""` resolves to the base URL's root.
    pub fn build(&self, path: &str, base_url: Option<&str>) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = base_url.unwrap_or(&self.base_url).trim_end_matches('/');
        format!("{}/{}", base, path.trim_start_matches('/'))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_relative_paths() {
        let builder = UrlBuilder::new("http://teste.com");
        assert_eq!(builder.build("/myview", None), "http://teste.com/myview");
        assert_eq!(builder.build("example", None), "http://teste.com/example");
        assert_eq!(builder.build("", None), "http://teste.com/");
    }

    #[test]
    fn test_build_trims_base_slash() {
        let builder = UrlBuilder::new("http://teste.com/api/");
        assert_eq!(builder.build("/home", None), "http://teste.com/api/home");
    }

    #[test]
    fn test_build_absolute_path_untouched() {
        let builder = UrlBuilder::new("http://teste.com");
        assert_eq!(
            builder.build("https://other.com/view", None),
            "https://other.com/view"
        );
    }

    #[test]
    fn test_build_with_base_override() {
        let builder = UrlBuilder::new("http://teste.com");
        assert_eq!(
            builder.build("view", Some("http://override.com")),
            "http://override.com/view"
        );
    }
}
