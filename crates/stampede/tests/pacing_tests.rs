use rand::rngs::SmallRng;
use rand::SeedableRng;
use stampede::engine::pacing::Pacing;
use std::time::Duration;

#[test]
fn delays_stay_within_bounds() {
    let pacing = Pacing::new(0.5, 1.5).unwrap();
    let mut rng = SmallRng::seed_from_u64(11);

    for _ in 0..10_000 {
        let delay = pacing.next_delay(&mut rng);
        assert!(delay >= Duration::from_secs_f64(0.5), "delay {:?} below min", delay);
        assert!(delay <= Duration::from_secs_f64(1.5), "delay {:?} above max", delay);
    }
}

#[test]
fn constant_when_min_equals_max() {
    let pacing = Pacing::new(0.75, 0.75).unwrap();
    let mut rng = SmallRng::seed_from_u64(11);

    let expected = Duration::from_secs_f64(0.75);
    for _ in 0..1_000 {
        assert_eq!(pacing.next_delay(&mut rng), expected);
    }
}

#[test]
fn zero_pacing_is_allowed() {
    let pacing = Pacing::new(0.0, 0.0).unwrap();
    let mut rng = SmallRng::seed_from_u64(11);
    assert_eq!(pacing.next_delay(&mut rng), Duration::ZERO);
}

#[test]
fn min_greater_than_max_is_rejected() {
    assert!(Pacing::new(2.0, 1.0).is_err());
}

#[test]
fn negative_bounds_are_rejected() {
    assert!(Pacing::new(-1.0, 1.0).is_err());
    assert!(Pacing::new(0.0, -0.5).is_err());
}

#[test]
fn draws_are_independent_of_each_other() {
    // A uniform draw over a wide interval should not repeat the same
    // value thousands of times; guards against accidental state.
    let pacing = Pacing::new(0.0, 10.0).unwrap();
    let mut rng = SmallRng::seed_from_u64(23);

    let first = pacing.next_delay(&mut rng);
    let all_equal = (0..1_000).all(|_| pacing.next_delay(&mut rng) == first);
    assert!(!all_equal);
}
