//! Hand-picked vectors around word boundaries.

use bitdb_core::BitVector;

/// Universe sizes that exercise empty, partial and exact-multiple word
/// layouts.
pub fn edge_universes() -> Vec<usize> {
    vec![0, 1, 7, 63, 64, 65, 127, 128, 129, 1000]
}

/// Named vectors for table-driven tests: empty, full, first and last bit,
/// and alternating bits, for every universe in [`edge_universes`].
pub fn sample_vectors() -> Vec<(String, BitVector)> {
    let mut out = Vec::new();
    for n in edge_universes() {
        out.push((format!("empty_{n}"), BitVector::new(n).unwrap()));

        let mut full = BitVector::new(n).unwrap();
        full.fill();
        out.push((format!("full_{n}"), full));

        if n > 0 {
            let ends = if n == 1 { vec![0] } else { vec![0, n - 1] };
            out.push((
                format!("ends_{n}"),
                BitVector::from_indices(n, &ends).unwrap(),
            ));

            let alternating: Vec<usize> = (0..n).step_by(2).collect();
            out.push((
                format!("alternating_{n}"),
                BitVector::from_indices(n, &alternating).unwrap(),
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let samples = sample_vectors();
        let mut names: Vec<_> = samples.iter().map(|(n, _)| n.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), samples.len());
    }

    #[test]
    fn full_vectors_are_full() {
        for (name, v) in sample_vectors() {
            if name.starts_with("full_") {
                assert!(v.is_full(), "{name}");
            }
        }
    }
}
