use std::collections::HashSet;

/// Script URLs in first-seen order with duplicates dropped.
#[derive(Debug, Clone, Default)]
pub struct ScriptList {
    urls: Vec<String>,
    seen: HashSet<String>,
}

impl ScriptList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, url: &str) {
        let url = url.trim();
        if url.is_empty() || self.seen.contains(url) {
            return;
        }
        self.seen.insert(url.to_string());
        self.urls.push(url.to_string());
    }

    pub fn extend<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for url in urls {
            self.push(url.as_ref());
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        self.urls
    }
}

#[cfg(test)]
mod tests {
    use super::ScriptList;

    #[test]
    fn keeps_first_occurrence_order() {
        let mut scripts = ScriptList::new();
        scripts.extend(["a.js", "b.js"]);
        scripts.extend(["b.js", "c.js"]);
        scripts.extend(["a.js"]);
        assert_eq!(scripts.into_vec(), vec!["a.js", "b.js", "c.js"]);
    }

    #[test]
    fn ignores_blank_urls() {
        let mut scripts = ScriptList::new();
        scripts.extend(["", "  ", " /app.js "]);
        assert_eq!(scripts.into_vec(), vec!["/app.js"]);
    }
}
