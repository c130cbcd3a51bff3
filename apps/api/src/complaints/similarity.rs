//! Duplicate detection over stored complaint embeddings.
//!
//! The scan is O(n) in the size of `complaint_vectors` — acceptable at
//! municipal scale, but not indexed. Revisit with pgvector if the corpus
//! outgrows a linear pass.

use uuid::Uuid;

use crate::models::complaint::VectorRow;

/// Similarity above which a new submission is flagged as a duplicate.
/// Policy constant, strict `>` comparison.
pub const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Cosine similarity between two equal-length vectors.
/// Returns 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let mag_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let mag_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    pub complaint_id: Uuid,
    pub similarity: f64,
}

/// Scans the stored-vector corpus for the closest match to `new_embedding`.
///
/// Rows whose embedding column is missing or not valid JSON are skipped
/// without aborting the scan. On exact score ties the first-seen row wins
/// (best score only advances on strict `>`). Returns a match only when the
/// best score exceeds [`SIMILARITY_THRESHOLD`].
pub fn find_duplicate(new_embedding: &[f64], stored: &[VectorRow]) -> Option<DuplicateMatch> {
    let mut best: Option<DuplicateMatch> = None;
    let mut best_score = 0.0_f64;

    for row in stored {
        let existing: Vec<f64> = match serde_json::from_str(&row.embedding) {
            Ok(v) => v,
            Err(_) => continue,
        };
        if existing.is_empty() {
            continue;
        }
        let score = cosine_similarity(new_embedding, &existing);
        if score > best_score {
            best_score = score;
            best = Some(DuplicateMatch {
                complaint_id: row.complaint_id,
                similarity: score,
            });
        }
    }

    if best_score > SIMILARITY_THRESHOLD {
        best
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: Uuid, embedding: &[f64]) -> VectorRow {
        VectorRow {
            complaint_id: id,
            embedding: serde_json::to_string(embedding).unwrap(),
        }
    }

    #[test]
    fn test_self_similarity_is_one() {
        let v = vec![0.3, -1.2, 4.0, 0.5];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-12, "similarity was {sim}");
    }

    #[test]
    fn test_zero_vector_similarity_is_zero() {
        let v = vec![1.0, 2.0, 3.0];
        let zero = vec![0.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_orthogonal_vectors_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_score_exactly_at_threshold_is_not_a_duplicate() {
        // (17, 10, 3, 1, 1) has magnitude exactly 20, so the similarity
        // against the first axis is exactly 17/20 = 0.85.
        let query = vec![1.0, 0.0, 0.0, 0.0, 0.0];
        let stored = vec![row(Uuid::new_v4(), &[17.0, 10.0, 3.0, 1.0, 1.0])];
        assert_eq!(
            cosine_similarity(&query, &[17.0, 10.0, 3.0, 1.0, 1.0]),
            0.85
        );
        assert!(find_duplicate(&query, &stored).is_none());
    }

    #[test]
    fn test_score_above_threshold_is_a_duplicate() {
        // (18, 6, 6, 2) has magnitude exactly 20 → similarity 18/20 = 0.9.
        let query = vec![1.0, 0.0, 0.0, 0.0];
        let id = Uuid::new_v4();
        let stored = vec![row(id, &[18.0, 6.0, 6.0, 2.0])];
        let m = find_duplicate(&query, &stored).expect("expected a match");
        assert_eq!(m.complaint_id, id);
        assert_eq!(m.similarity, 0.9);
    }

    #[test]
    fn test_unparseable_rows_are_skipped() {
        let good = Uuid::new_v4();
        let stored = vec![
            VectorRow {
                complaint_id: Uuid::new_v4(),
                embedding: "not json".to_string(),
            },
            VectorRow {
                complaint_id: Uuid::new_v4(),
                embedding: "[]".to_string(),
            },
            row(good, &[2.0, 0.0]),
        ];
        let m = find_duplicate(&[1.0, 0.0], &stored).expect("valid row should still match");
        assert_eq!(m.complaint_id, good);
    }

    #[test]
    fn test_first_seen_wins_exact_ties() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let stored = vec![row(first, &[1.0, 1.0]), row(second, &[1.0, 1.0])];
        let m = find_duplicate(&[1.0, 1.0], &stored).unwrap();
        assert_eq!(m.complaint_id, first);
    }

    #[test]
    fn test_best_match_is_chosen_over_weaker_ones() {
        let near = Uuid::new_v4();
        let stored = vec![
            row(Uuid::new_v4(), &[0.0, 1.0]),
            row(near, &[5.0, 0.0]),
            row(Uuid::new_v4(), &[1.0, 1.0]),
        ];
        let m = find_duplicate(&[1.0, 0.0], &stored).unwrap();
        assert_eq!(m.complaint_id, near);
    }
}
