// src/core/trie.rs

use std::collections::HashMap;

/// A prefix tree over whitespace-split verb words.
///
/// Resolution is greedy with backtracking: the walk follows matching child
/// nodes as deep as the candidate words allow, then retreats toward the root
/// until it finds a node actually holding a value. The number of consumed
/// words is reported so the caller can mark exactly that many positionals as
/// used and leave the rest for the handler's own argument parsing.
#[derive(Debug, Clone)]
pub struct VerbTrie<V> {
    root: Node<V>,
}

#[derive(Debug, Clone)]
struct Node<V> {
    value: Option<V>,
    children: HashMap<String, Node<V>>,
}

impl<V> Default for Node<V> {
    fn default() -> Self {
        Self {
            value: None,
            children: HashMap::new(),
        }
    }
}

impl<V> Default for VerbTrie<V> {
    fn default() -> Self {
        Self {
            root: Node::default(),
        }
    }
}

impl<V> VerbTrie<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value at the end of the lower-cased word path, creating
    /// intermediate nodes as needed. Re-insertion along an existing path only
    /// replaces the terminal node's value; the path itself is never clobbered.
    /// Returns the previous value at that node, if any.
    pub fn insert<S: AsRef<str>>(&mut self, words: &[S], value: V) -> Option<V> {
        let mut node = &mut self.root;
        for word in words {
            node = node
                .children
                .entry(word.as_ref().to_lowercase())
                .or_default();
        }
        node.value.replace(value)
    }

    /// Resolves the longest registered verb matching a prefix of
    /// `candidates`, lower-casing each candidate word before comparison.
    ///
    /// The longest matching *path* is not enough: the match must end on a
    /// node holding a value, so the walk backtracks to the nearest valued
    /// ancestor. Returns the value and the count of words consumed, or `None`
    /// (zero words consumed) when no valued node lies on the matched path.
    pub fn get<S: AsRef<str>>(&self, candidates: &[S]) -> Option<(&V, usize)> {
        let mut path: Vec<&Node<V>> = vec![&self.root];
        let mut node = &self.root;
        for word in candidates {
            match node.children.get(&word.as_ref().to_lowercase()) {
                Some(child) => {
                    path.push(child);
                    node = child;
                }
                None => break,
            }
        }
        // Walk the matched path backward from the deepest node; depth in
        // `path` equals the number of words consumed to reach it.
        for (depth, visited) in path.iter().enumerate().rev() {
            if let Some(value) = &visited.value {
                return Some((value, depth));
            }
        }
        None
    }

    /// True when the exact word path holds a value.
    pub fn contains_exact<S: AsRef<str>>(&self, words: &[S]) -> bool {
        let mut node = &self.root;
        for word in words {
            match node.children.get(&word.as_ref().to_lowercase()) {
                Some(child) => node = child,
                None => return false,
            }
        }
        node.value.is_some()
    }

    /// Enumerates every registered (full word path, value) pair, for help and
    /// listing purposes. Order is unspecified.
    pub fn get_all(&self) -> Vec<(Vec<String>, &V)> {
        let mut out = Vec::new();
        let mut prefix = Vec::new();
        collect(&self.root, &mut prefix, &mut out);
        out
    }
}

fn collect<'a, V>(
    node: &'a Node<V>,
    prefix: &mut Vec<String>,
    out: &mut Vec<(Vec<String>, &'a V)>,
) {
    if let Some(value) = &node.value {
        out.push((prefix.clone(), value));
    }
    for (word, child) in &node.children {
        prefix.push(word.clone());
        collect(child, prefix, out);
        prefix.pop();
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_valued_match_wins_and_reports_consumption() {
        let mut trie = VerbTrie::new();
        trie.insert(&["a"], "X");
        trie.insert(&["a", "b"], "Y");

        let (value, consumed) = trie.get(&["a", "b", "c"]).unwrap();
        assert_eq!((*value, consumed), ("Y", 2));

        let (value, consumed) = trie.get(&["a", "c"]).unwrap();
        assert_eq!((*value, consumed), ("X", 1));

        assert!(trie.get(&["z"]).is_none());
    }

    #[test]
    fn backtracks_past_valueless_intermediate_nodes() {
        let mut trie = VerbTrie::new();
        trie.insert(&["a", "b"], "Y");
        trie.insert(&["a", "b", "c", "d"], "Z");

        // "a b c" matches three nodes but only "a b" holds a value: the
        // shorter match wins and only two words are consumed.
        let (value, consumed) = trie.get(&["a", "b", "c"]).unwrap();
        assert_eq!((*value, consumed), ("Y", 2));

        // "a" matches a path node with no value anywhere above it.
        assert!(trie.get(&["a"]).is_none());
    }

    #[test]
    fn insertion_never_overwrites_a_different_path() {
        let mut trie = VerbTrie::new();
        trie.insert(&["env", "clear"], 1);
        trie.insert(&["env"], 2);
        trie.insert(&["env", "list"], 3);

        assert_eq!(trie.get(&["env", "clear"]).unwrap(), (&1, 2));
        assert_eq!(trie.get(&["env", "list"]).unwrap(), (&3, 2));
        assert_eq!(trie.get(&["env", "other"]).unwrap(), (&2, 1));
    }

    #[test]
    fn reinsertion_replaces_only_the_terminal_value() {
        let mut trie = VerbTrie::new();
        assert!(trie.insert(&["run"], 1).is_none());
        assert_eq!(trie.insert(&["run"], 2), Some(1));
        assert_eq!(trie.get(&["run"]).unwrap(), (&2, 1));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut trie = VerbTrie::new();
        trie.insert(&["Deploy", "ALL"], ());
        assert_eq!(trie.get(&["deploy", "all", "now"]).unwrap().1, 2);
        assert!(trie.contains_exact(&["DEPLOY", "all"]));
    }

    #[test]
    fn get_all_enumerates_full_paths() {
        let mut trie = VerbTrie::new();
        trie.insert(&["a"], 1);
        trie.insert(&["a", "b"], 2);
        trie.insert(&["c"], 3);

        let mut all: Vec<(String, i32)> = trie
            .get_all()
            .into_iter()
            .map(|(path, v)| (path.join(" "), *v))
            .collect();
        all.sort();
        assert_eq!(
            all,
            vec![
                ("a".to_string(), 1),
                ("a b".to_string(), 2),
                ("c".to_string(), 3)
            ]
        );
    }
}
