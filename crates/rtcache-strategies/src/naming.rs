//! Cache-name resolution.

use crate::config::EngineConfig;

/// Resolves a strategy's cache-name hint into a fully-qualified name.
pub trait CacheNames: Send + Sync {
    fn runtime_name(&self, hint: Option<&str>) -> String;
}

/// `<prefix>-runtime-<suffix>` unless the caller supplied a name.
#[derive(Debug, Clone)]
pub struct DefaultCacheNames {
    prefix: String,
    suffix: Option<String>,
}

impl DefaultCacheNames {
    pub fn new(prefix: impl Into<String>, suffix: Option<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.cache_prefix.clone(), config.cache_suffix.clone())
    }
}

impl CacheNames for DefaultCacheNames {
    fn runtime_name(&self, hint: Option<&str>) -> String {
        if let Some(name) = hint.filter(|h| !h.is_empty()) {
            return name.to_string();
        }

        [
            Some(self.prefix.as_str()),
            Some("runtime"),
            self.suffix.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hint_used_verbatim() {
        let names = DefaultCacheNames::new("rtcache", Some("v2".to_string()));
        assert_eq!(names.runtime_name(Some("images")), "images");
    }

    #[test]
    fn test_generated_name() {
        let names = DefaultCacheNames::new("rtcache", Some("v2".to_string()));
        assert_eq!(names.runtime_name(None), "rtcache-runtime-v2");
        assert_eq!(names.runtime_name(Some("")), "rtcache-runtime-v2");

        let names = DefaultCacheNames::new("", None);
        assert_eq!(names.runtime_name(None), "runtime");
    }
}
