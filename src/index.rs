use serde::{Deserialize, Serialize};

/// One directory of the precomputed source index.
///
/// The index file is a JSON object mapping root name -> node; `name` on a
/// top-level node is filled in from its key at load time. `files` holds base
/// names without the generated `.html` extension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub dirs: Vec<DirectoryNode>,
    #[serde(default)]
    pub files: Vec<String>,
}

/// The full index: one root per top-level key, in file order.
#[derive(Debug, Clone, Default)]
pub struct SourceIndex {
    pub roots: Vec<DirectoryNode>,
}

impl SourceIndex {
    /// Parse the JSON index. Key order and array order are kept as written;
    /// the generator's order is authoritative.
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)?;
        let mut roots = Vec::with_capacity(map.len());
        for (key, value) in map {
            let mut node: DirectoryNode = serde_json::from_value(value)?;
            node.name = key;
            roots.push(node);
        }
        Ok(Self { roots })
    }
}

/// Strip the `#fragment` suffix from a page URL, if any.
pub fn strip_fragment(url: &str) -> &str {
    url.split('#').next().unwrap_or(url)
}

/// Split a location into its page URL and fragment parts.
pub fn split_location(location: &str) -> (&str, &str) {
    match location.split_once('#') {
        Some((page, fragment)) => (page, fragment),
        None => (location, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_roots_in_file_order() {
        let json = r#"{
            "zeta": { "dirs": [], "files": ["one"] },
            "alpha": { "dirs": [], "files": [] }
        }"#;

        let index = SourceIndex::parse(json).unwrap();
        assert_eq!(index.roots.len(), 2);
        assert_eq!(index.roots[0].name, "zeta");
        assert_eq!(index.roots[1].name, "alpha");
        assert_eq!(index.roots[0].files, vec!["one"]);
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let index = SourceIndex::parse(r#"{ "root": {} }"#).unwrap();
        assert_eq!(index.roots[0].name, "root");
        assert!(index.roots[0].dirs.is_empty());
        assert!(index.roots[0].files.is_empty());
    }

    #[test]
    fn nested_directories_keep_their_names() {
        let json = r#"{
            "root": { "dirs": [{ "name": "a", "dirs": [], "files": ["lib"] }], "files": [] }
        }"#;

        let index = SourceIndex::parse(json).unwrap();
        assert_eq!(index.roots[0].dirs[0].name, "a");
        assert_eq!(index.roots[0].dirs[0].files, vec!["lib"]);
    }

    #[test]
    fn malformed_index_is_an_error() {
        assert!(SourceIndex::parse("not json").is_err());
        assert!(SourceIndex::parse(r#"{ "root": 3 }"#).is_err());
    }

    #[test]
    fn strips_fragment_from_urls() {
        assert_eq!(strip_fragment("site/src/a/lib.html#10-20"), "site/src/a/lib.html");
        assert_eq!(strip_fragment("site/src/a/lib.html"), "site/src/a/lib.html");
        assert_eq!(strip_fragment(""), "");
    }

    #[test]
    fn splits_locations() {
        assert_eq!(split_location("page.html#12"), ("page.html", "12"));
        assert_eq!(split_location("page.html"), ("page.html", ""));
        assert_eq!(split_location("#5"), ("", "5"));
    }
}
