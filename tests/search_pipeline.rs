//! End-to-end run of both search passes over a domain small enough to
//! enumerate exhaustively.

use rug::Float;
use tempfile::tempdir;

use gcf_search::{CoefficientDomain, FrSearch, SearchConfig, TargetConstant};

/// Domain: a(n) = 1 fixed, b(n) ranging over {-1, 0, 1}.
///
/// - b = 0 degenerates immediately and must fail the FR screen.
/// - b = 1 gives the golden-ratio fraction 1 + 1/(1 + 1/(...)); its
///   convergents are consecutive Fibonacci numbers, which are coprime, so
///   the reduction estimate is exactly zero and the screen passes.
/// - b = -1 also keeps coprime convergents and passes the screen, but its
///   denominators vanish periodically, so refinement rejects it.
fn tiny_domain() -> CoefficientDomain {
    CoefficientDomain::new(0, (1, 1), 0, (-1, 1), true).unwrap()
}

#[test]
fn full_pipeline_on_golden_ratio_domain() {
    let dir = tempdir().unwrap();
    let config = SearchConfig {
        checkpoint_dir: dir.path().to_path_buf(),
        constants: vec![TargetConstant::E],
        ..SearchConfig::default()
    };
    let search = FrSearch::new(tiny_domain(), config);

    let matches = search.enumerate_matches().unwrap();
    let pairs: Vec<(&[i64], &[i64])> = matches
        .iter()
        .map(|m| (m.a.as_slice(), m.b.as_slice()))
        .collect();
    assert_eq!(pairs, vec![(&[1][..], &[-1][..]), (&[1][..], &[1][..])]);
    for m in &matches {
        assert_eq!(m.depth, 400);
    }

    let refined = search.refine(&matches);

    // b = -1 hits a zero denominator under deep evaluation and is dropped.
    assert_eq!(refined.len(), 1);
    let result = &refined[0];
    assert_eq!(result.b, vec![1]);

    // 1 + 1/(1 + 1/(...)) is the golden ratio.
    let phi = (Float::with_val(512, 5).sqrt() + 1u32) / 2u32;
    let error = Float::with_val(512, &result.value - &phi).abs();
    assert!(error < 1e-40, "value {} too far from {}", result.value, phi);
    assert!(result.precision >= 40);

    // phi is algebraic and e is transcendental; no quadratic relation in e
    // can tie them together.
    assert!(result.relation.is_none());
}

#[test]
fn completed_run_leaves_no_checkpoint_behind() {
    let dir = tempdir().unwrap();
    let config = SearchConfig {
        checkpoint_dir: dir.path().to_path_buf(),
        constants: Vec::new(),
        ..SearchConfig::default()
    };
    let search = FrSearch::new(tiny_domain(), config);
    search.enumerate_matches().unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert!(leftovers.is_empty(), "stray files: {:?}", leftovers);
}

#[test]
fn rerun_finds_the_same_matches() {
    let dir = tempdir().unwrap();
    let config = SearchConfig {
        checkpoint_dir: dir.path().to_path_buf(),
        constants: Vec::new(),
        ..SearchConfig::default()
    };
    let search = FrSearch::new(tiny_domain(), config);

    let first = search.enumerate_matches().unwrap();
    let second = search.enumerate_matches().unwrap();
    assert_eq!(first, second);
}
