use crate::index::{strip_fragment, DirectoryNode, SourceIndex};

/// A file entry in the sidebar, with its precomputed link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFile {
    pub name: String,
    pub href: String,
    pub selected: bool,
}

/// A directory entry in the sidebar. `open` is set on the ancestor chain of
/// the file matching the current page, and nowhere else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeDir {
    pub name: String,
    pub open: bool,
    pub dirs: Vec<TreeDir>,
    pub files: Vec<TreeFile>,
}

/// View model for the whole sidebar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SidebarTree {
    pub roots: Vec<TreeDir>,
    pub has_selection: bool,
}

/// Build the sidebar view model from the index and the current page URL.
///
/// One depth-first pass, subdirectories before files, in index order. The
/// first file (pre-order) whose target equals the current URL with its
/// fragment stripped is marked selected; once a match is found, no later
/// entry is marked or expanded, even if its target would also match.
pub fn build_tree(index: &SourceIndex, root_path: &str, current_url: &str) -> SidebarTree {
    let current_page = strip_fragment(current_url);
    let mut found = false;
    let roots = index
        .roots
        .iter()
        .map(|node| build_dir(node, root_path, "", current_page, &mut found))
        .collect();
    SidebarTree {
        roots,
        has_selection: found,
    }
}

fn build_dir(
    node: &DirectoryNode,
    root_path: &str,
    parent_path: &str,
    current_page: &str,
    found: &mut bool,
) -> TreeDir {
    let full_path = format!("{}{}/", parent_path, node.name);
    let mut open = false;

    let dirs: Vec<TreeDir> = node
        .dirs
        .iter()
        .map(|dir| {
            let child = build_dir(dir, root_path, &full_path, current_page, found);
            if child.open {
                open = true;
            }
            child
        })
        .collect();

    let files: Vec<TreeFile> = node
        .files
        .iter()
        .map(|file| {
            let href = format!("{}src/{}{}.html", root_path, full_path, file);
            let selected = !*found && href == current_page;
            if selected {
                open = true;
                *found = true;
            }
            TreeFile {
                name: file.clone(),
                href,
                selected,
            }
        })
        .collect();

    TreeDir {
        name: node.name.clone(),
        open,
        dirs,
        files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir(name: &str, dirs: Vec<DirectoryNode>, files: &[&str]) -> DirectoryNode {
        DirectoryNode {
            name: name.to_string(),
            dirs,
            files: files.iter().map(|f| f.to_string()).collect(),
        }
    }

    fn index_of(roots: Vec<DirectoryNode>) -> SourceIndex {
        SourceIndex { roots }
    }

    #[test]
    fn computes_link_targets_by_convention() {
        let index = index_of(vec![dir("root", vec![dir("a", vec![], &["lib"])], &["main"])]);
        let tree = build_tree(&index, "site/", "");

        assert_eq!(tree.roots[0].files[0].href, "site/src/root/main.html");
        assert_eq!(tree.roots[0].dirs[0].files[0].href, "site/src/root/a/lib.html");
    }

    #[test]
    fn expands_ancestors_and_marks_current_file() {
        let index = index_of(vec![dir("root", vec![dir("a", vec![], &["lib"])], &["main"])]);
        let tree = build_tree(&index, "site/", "site/src/root/a/lib.html");

        assert!(tree.has_selection);
        assert!(tree.roots[0].open);
        assert!(tree.roots[0].dirs[0].open);
        assert!(tree.roots[0].dirs[0].files[0].selected);
        assert!(!tree.roots[0].files[0].selected);
    }

    #[test]
    fn fragment_is_stripped_before_matching() {
        let index = index_of(vec![dir("root", vec![], &["main"])]);
        let tree = build_tree(&index, "site/", "site/src/root/main.html#10-20");

        assert!(tree.has_selection);
        assert!(tree.roots[0].files[0].selected);
    }

    #[test]
    fn duplicate_base_names_mark_only_the_matching_path() {
        let a = dir("a", vec![], &["mod"]);
        let b = dir("b", vec![], &["mod"]);
        let index = index_of(vec![dir("root", vec![a, b], &[])]);
        let tree = build_tree(&index, "", "src/root/b/mod.html");

        assert!(!tree.roots[0].dirs[0].open);
        assert!(!tree.roots[0].dirs[0].files[0].selected);
        assert!(tree.roots[0].dirs[1].open);
        assert!(tree.roots[0].dirs[1].files[0].selected);
        assert!(tree.roots[0].open);
    }

    #[test]
    fn first_match_wins_for_duplicate_targets() {
        // Two entries computing the same href: only the first one is marked.
        let index = index_of(vec![dir("root", vec![], &["lib", "lib"])]);
        let tree = build_tree(&index, "", "src/root/lib.html");

        assert!(tree.roots[0].files[0].selected);
        assert!(!tree.roots[0].files[1].selected);
    }

    #[test]
    fn sibling_directories_stay_collapsed_after_a_match() {
        let a = dir("a", vec![], &["lib"]);
        let c = dir("c", vec![dir("deep", vec![], &["other"])], &[]);
        let index = index_of(vec![dir("root", vec![a, c], &[])]);
        let tree = build_tree(&index, "", "src/root/a/lib.html");

        assert!(tree.roots[0].dirs[0].open);
        assert!(!tree.roots[0].dirs[1].open);
        assert!(!tree.roots[0].dirs[1].dirs[0].open);
    }

    #[test]
    fn later_roots_stay_collapsed_after_a_match() {
        let first = dir("first", vec![], &["lib"]);
        let second = dir("second", vec![dir("inner", vec![], &["lib"])], &[]);
        let index = index_of(vec![first, second]);
        let tree = build_tree(&index, "", "src/first/lib.html");

        assert!(tree.roots[0].open);
        assert!(!tree.roots[1].open);
        assert!(!tree.roots[1].dirs[0].open);
    }

    #[test]
    fn no_match_builds_a_plain_tree() {
        let index = index_of(vec![dir("root", vec![dir("a", vec![], &["lib"])], &["main"])]);
        let tree = build_tree(&index, "site/", "site/src/root/missing.html");

        assert!(!tree.has_selection);
        assert!(!tree.roots[0].open);
        assert!(!tree.roots[0].dirs[0].open);
        assert!(!tree.roots[0].dirs[0].files[0].selected);
    }

    #[test]
    fn preserves_index_order() {
        let index = index_of(vec![dir(
            "root",
            vec![dir("zz", vec![], &[]), dir("aa", vec![], &[])],
            &["zebra", "apple"],
        )]);
        let tree = build_tree(&index, "", "");

        assert_eq!(tree.roots[0].dirs[0].name, "zz");
        assert_eq!(tree.roots[0].dirs[1].name, "aa");
        assert_eq!(tree.roots[0].files[0].name, "zebra");
        assert_eq!(tree.roots[0].files[1].name, "apple");
    }

    #[test]
    fn empty_dirs_and_files_are_valid() {
        let index = index_of(vec![dir("root", vec![], &[])]);
        let tree = build_tree(&index, "site/", "site/src/root/anything.html");

        assert!(!tree.has_selection);
        assert!(tree.roots[0].dirs.is_empty());
        assert!(tree.roots[0].files.is_empty());
    }
}
