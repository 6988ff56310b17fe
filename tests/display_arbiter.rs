mod tests {
    use embassy_time::{Duration, Instant};
    use hearse_director::display::{DisplayArbiter, Text4};
    use hearse_director::mock::MockDisplay;

    const FOREVER: Duration = Duration::from_millis(0);

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn arbiter() -> DisplayArbiter<MockDisplay> {
        DisplayArbiter::new(MockDisplay::new(), 10)
    }

    #[test]
    fn test_higher_priority_preempts() {
        let mut display = arbiter();
        assert!(display.acquire("A", 5, FOREVER, at(0)));
        assert!(display.acquire("B", 10, FOREVER, at(1)));
        assert_eq!(display.owner(at(1)), Some("B"));

        let mut display = arbiter();
        assert!(display.acquire("B", 10, FOREVER, at(0)));
        assert!(!display.acquire("A", 5, FOREVER, at(1)));
        assert_eq!(display.owner(at(1)), Some("B"));
    }

    #[test]
    fn test_equal_priority_does_not_preempt() {
        let mut display = arbiter();
        assert!(display.acquire("A", 5, FOREVER, at(0)));
        assert!(!display.acquire("C", 5, FOREVER, at(1)));
        assert!(display.is_owner("A", at(1)));
        // The owner itself may re-acquire
        assert!(display.acquire("A", 5, FOREVER, at(2)));
    }

    #[test]
    fn test_lease_expires() {
        let mut display = arbiter();
        assert!(display.acquire("A", 5, Duration::from_millis(1_000), at(0)));
        assert!(display.is_owner("A", at(1_000)));
        assert!(!display.acquire("C", 1, FOREVER, at(1_000)));
        assert!(display.is_free(at(1_001)));
        assert!(display.acquire("C", 1, FOREVER, at(1_001)));
        assert_eq!(display.owner(at(1_001)), Some("C"));
    }

    #[test]
    fn test_losing_acquire_changes_nothing() {
        let mut display = arbiter();
        assert!(display.acquire("A", 5, Duration::from_millis(1_000), at(0)));
        assert!(!display.acquire("B", 3, Duration::from_millis(10_000), at(500)));
        assert!(display.is_owner("A", at(1_000)));
        assert!(display.is_free(at(1_001)));
    }

    #[test]
    fn test_renew_extends_hold() {
        let mut display = arbiter();
        assert!(display.acquire("A", 5, Duration::from_millis(1_000), at(0)));
        assert!(!display.renew("B", Duration::from_millis(5_000), at(900)));
        assert!(display.renew("A", Duration::from_millis(1_000), at(900)));
        assert!(display.is_owner("A", at(1_900)));
        assert!(display.is_free(at(1_901)));
    }

    #[test]
    fn test_writes_are_gated_on_ownership() {
        let mut display = arbiter();
        assert!(display.acquire("A", 5, FOREVER, at(0)));
        assert!(!display.write_owned("B", &Text4::new("BBBB"), at(1)));
        assert_eq!(display.device().writes, 0);

        assert!(display.write_owned("A", &Text4::new("AAAA"), at(2)));
        assert!(display.write_owned("A", &Text4::new("AAAA"), at(3)));
        assert_eq!(display.device().writes, 1);
        assert_eq!(display.device().text(), "AAAA");

        assert!(!display.write_idle(&Text4::new("IDLE"), at(4)));
        assert_eq!(display.device().text(), "AAAA");
    }

    #[test]
    fn test_release_only_by_owner() {
        let mut display = arbiter();
        assert!(display.acquire("A", 5, FOREVER, at(0)));
        display.release("B", at(1));
        assert!(display.is_owner("A", at(1)));
        display.release("A", at(2));
        assert!(display.is_free(at(2)));
        assert!(display.write_idle(&Text4::new("ARMD"), at(3)));
        assert_eq!(display.device().text(), "ARMD");
    }

    #[test]
    fn test_brightness_is_owned_and_clamped() {
        let mut display = arbiter();
        assert_eq!(display.device().brightness, 10);
        assert!(!display.set_brightness_owned("A", 3, at(0)));
        assert!(display.acquire("A", 5, FOREVER, at(0)));
        assert!(display.set_brightness_owned("A", 40, at(1)));
        assert_eq!(display.device().brightness, 15);
        // Releasing restores the idle brightness
        display.release("A", at(2));
        assert_eq!(display.device().brightness, 10);
    }

    #[test]
    fn test_empty_owner_is_rejected() {
        let mut display = arbiter();
        assert!(!display.acquire("", 99, FOREVER, at(0)));
        assert!(display.is_free(at(0)));
    }
}
