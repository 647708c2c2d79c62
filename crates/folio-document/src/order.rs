// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Ordering resolution: map a client-declared, comma-separated list of
// filenames onto the uploaded images.
//
// Filenames are client-chosen and may repeat, so the result is expressed in
// ingress indices. Everything downstream keys on the index, never the name.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

/// Resolve `order` against `identifiers` (in upload order) into a permutation
/// of `0..identifiers.len()`.
///
/// Each token claims the first unclaimed upload with that exact identifier.
/// Unknown tokens and repeats beyond the available uploads are ignored. Any
/// upload left unclaimed is appended in upload order. Never fails.
pub fn resolve_order<S: AsRef<str>>(identifiers: &[S], order: &str) -> Vec<usize> {
    let mut by_identifier: HashMap<&str, VecDeque<usize>> = HashMap::new();
    for (index, identifier) in identifiers.iter().enumerate() {
        by_identifier
            .entry(identifier.as_ref())
            .or_default()
            .push_back(index);
    }

    let mut placed = vec![false; identifiers.len()];
    let mut sequence = Vec::with_capacity(identifiers.len());

    for token in order.split(',').filter(|token| !token.is_empty()) {
        let Some(index) = by_identifier.get_mut(token).and_then(VecDeque::pop_front) else {
            debug!(token, "order token matches no remaining upload");
            continue;
        };
        placed[index] = true;
        sequence.push(index);
    }

    let claimed = sequence.len();
    sequence.extend((0..identifiers.len()).filter(|&index| !placed[index]));

    debug!(
        uploads = identifiers.len(),
        claimed,
        appended = identifiers.len() - claimed,
        "Upload order resolved"
    );
    sequence
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_permutation(sequence: &[usize], len: usize) -> bool {
        let mut sorted = sequence.to_vec();
        sorted.sort_unstable();
        sorted == (0..len).collect::<Vec<_>>()
    }

    #[test]
    fn explicit_order_is_followed() {
        let ids = ["a.png", "b.png", "c.png"];
        assert_eq!(resolve_order(&ids, "c.png,a.png,b.png"), vec![2, 0, 1]);
    }

    #[test]
    fn empty_order_keeps_upload_order() {
        let ids = ["a.png", "b.png", "c.png"];
        assert_eq!(resolve_order(&ids, ""), vec![0, 1, 2]);
    }

    #[test]
    fn omitted_uploads_are_appended_in_upload_order() {
        let ids = ["a.png", "b.png", "c.png", "d.png"];
        assert_eq!(resolve_order(&ids, "c.png"), vec![2, 0, 1, 3]);
    }

    #[test]
    fn unknown_and_repeated_tokens_are_ignored() {
        let ids = ["a.png", "b.png"];
        assert_eq!(resolve_order(&ids, "zzz.png,b.png,b.png,,"), vec![1, 0]);
    }

    #[test]
    fn duplicate_identifiers_are_claimed_first_come() {
        let ids = ["scan.jpg", "other.jpg", "scan.jpg"];
        assert_eq!(resolve_order(&ids, "scan.jpg,other.jpg"), vec![0, 1, 2]);
        assert_eq!(
            resolve_order(&ids, "other.jpg,scan.jpg,scan.jpg"),
            vec![1, 0, 2]
        );
    }

    #[test]
    fn tokens_are_matched_verbatim() {
        let ids = ["a.png", "b.png"];
        assert_eq!(resolve_order(&ids, " b.png,A.PNG"), vec![0, 1]);
    }

    #[test]
    fn no_uploads_gives_empty_sequence() {
        let ids: [&str; 0] = [];
        assert!(resolve_order(&ids, "a.png,b.png").is_empty());
    }

    #[test]
    fn always_a_complete_permutation() {
        let ids = ["x", "y", "x", "../etc/passwd", "", "z"];
        let orders = [
            "",
            ",,,",
            "z,y,x,x,x",
            "nope",
            "../etc/passwd,z",
            "y,y,y,y,y,y,y",
            "x,,x",
        ];
        for order in orders {
            let sequence = resolve_order(&ids, order);
            assert!(is_permutation(&sequence, ids.len()), "order {order:?}");
        }
    }
}
