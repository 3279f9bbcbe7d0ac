// Lexical feature pipeline over a small corpus.
//
// Invariants exercised:
// - Vocabulary is the union of canonical tokens across ingested documents.
// - Per-document counts equal an independent recount of the tokens.
// - Frequency rows line up with the vocabulary and sum to one for any
//   document with at least one in-vocabulary token.
use cellar_lexicon::{tokenize, LayoutFeatures, LexicalExtractor};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

const CORPUS: [&str; 3] = [
    "int main(void)\n{\n\treturn 0;\n}\n",
    "/* sum */\nint sum(int *a, int n) {\n    int s = 0;\n    for (int i = 0; i < n; ++i)\n        s += a[i];\n    return s;\n}\n",
    "#include <stdio.h>\nint main() { printf(\"%d\\n\", 42); // done\n}\n",
];

fn recount(src: &[u8]) -> BTreeMap<Vec<u8>, u32> {
    let mut counts = BTreeMap::new();
    for token in tokenize(src).0 {
        *counts.entry(token.text(src).to_vec()).or_insert(0) += 1;
    }
    counts
}

// Test: vocabulary equals the set of all tokens in the corpus.
#[test]
fn vocabulary_is_union_of_documents() {
    let mut lex = LexicalExtractor::new();
    let mut expected = BTreeMap::new();
    for doc in CORPUS {
        let summary = lex.ingest(doc.as_bytes());
        let counts = recount(doc.as_bytes());
        assert_eq!(summary.tokens as u32, counts.values().sum::<u32>());
        expected.extend(counts);
    }
    let mut vocabulary: Vec<Vec<u8>> = lex.vocabulary().map(<[u8]>::to_vec).collect();
    vocabulary.sort();
    let expected: Vec<Vec<u8>> = expected.into_keys().collect();
    assert_eq!(vocabulary, expected);
    assert_eq!(lex.documents(), CORPUS.len());
}

// Test: per-document profile against an independent recount.
#[test]
fn profiles_match_recount() {
    let mut lex = LexicalExtractor::new();
    for doc in CORPUS {
        lex.ingest(doc.as_bytes());
    }
    for doc in CORPUS {
        let profile = lex.profile(doc.as_bytes());
        let mut got: BTreeMap<Vec<u8>, u32> = BTreeMap::new();
        for (key, count) in profile.iter() {
            got.insert(key.to_vec(), count);
        }
        assert_eq!(got, recount(doc.as_bytes()));
        assert_eq!(profile.out_of_vocabulary(), 0);
    }
    assert_eq!(lex.profile(CORPUS[1].as_bytes()).comments(), 1);
    assert_eq!(lex.profile(CORPUS[2].as_bytes()).comments(), 1);
}

// Test: relative frequencies form a distribution over the vocabulary.
#[test]
fn term_frequencies_sum_to_one() {
    let mut lex = LexicalExtractor::new();
    for doc in CORPUS {
        lex.ingest(doc.as_bytes());
    }
    for doc in CORPUS {
        let profile = lex.profile(doc.as_bytes());
        let row = lex.term_frequencies(&profile);
        assert_eq!(row.len(), lex.vocabulary_len());
        let sum: f64 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9, "row sums to {sum}");
    }
}

// Test: layout features over the same corpus.
// Verifies: Allman bracing with tab indentation is told apart from K&R
// bracing with space indentation.
#[test]
fn layout_distinguishes_styles() {
    let allman = LayoutFeatures::from_source(CORPUS[0].as_bytes());
    assert!(allman.brace_on_own_line);
    assert!(allman.tab_indented);

    let knr = LayoutFeatures::from_source(CORPUS[1].as_bytes());
    assert!(!knr.brace_on_own_line);
    assert!(!knr.tab_indented);
    assert!(knr.space_ratio > allman.space_ratio);
}
