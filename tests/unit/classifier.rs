//! Bucket classification tests

use test_log::test;

use stock_valuator::analysis::{classify, Bucket, BucketSelector};

#[test]
fn test_documented_boundaries() {
    assert_eq!(classify(0.0), Bucket::Overvalued);
    assert_eq!(classify(30.0), Bucket::UndervaluedMid);
    assert_eq!(classify(39.99), Bucket::UndervaluedMid);
    assert_eq!(classify(40.0), Bucket::UndervaluedHigh);
}

#[test]
fn test_buckets_partition_the_line() {
    let samples = [-1e6, -0.0001, 0.0, 1e-12, 15.0, 29.9999, 30.0, 35.5, 39.9999, 40.0, 1e6];
    for pct in samples {
        let matching: Vec<Bucket> = Bucket::ALL
            .into_iter()
            .filter(|b| BucketSelector::Only(*b).matches(classify(pct)))
            .collect();
        assert_eq!(matching.len(), 1, "pct {} matched {:?}", pct, matching);
    }
}

#[test]
fn test_selectors() {
    assert!(BucketSelector::All.matches(Bucket::Overvalued));
    assert!(BucketSelector::AnyUndervalued.matches(Bucket::UndervaluedMid));
    assert!(!BucketSelector::AnyUndervalued.matches(Bucket::Overvalued));
    assert!(!BucketSelector::Only(Bucket::UndervaluedHigh).matches(Bucket::UndervaluedMid));
}
