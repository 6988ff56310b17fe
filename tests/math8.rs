mod tests {
    use embassy_time::Duration;
    use hearse_director::math8::{lerp8, lerp16, scale8, triangle8};

    #[test]
    fn test_scale8() {
        assert_eq!(scale8(255, 128), 128);
        assert_eq!(scale8(0, 128), 0);
        assert_eq!(scale8(128, 128), 64);
        assert_eq!(scale8(128, 255), 128);
        assert_eq!(scale8(128, 0), 0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp8(30, 255, 0, 1200), 30);
        assert_eq!(lerp8(30, 255, 600, 1200), 142);
        assert_eq!(lerp8(255, 30, 1200, 1200), 30);
        assert_eq!(lerp8(10, 20, 5, 0), 20);
        assert_eq!(lerp16(400, 1800, 400, 800), 1100);
        assert_eq!(lerp16(1800, 600, 400, 800), 1200);
    }

    #[test]
    fn test_triangle8() {
        let period = Duration::from_millis(2400);
        assert_eq!(triangle8(Duration::from_millis(0), period, 30, 255), 30);
        assert_eq!(triangle8(Duration::from_millis(1200), period, 30, 255), 255);
        assert_eq!(triangle8(Duration::from_millis(2400), period, 30, 255), 30);
        assert_eq!(triangle8(Duration::from_millis(600), period, 30, 255), 142);
        assert_eq!(triangle8(Duration::from_millis(1800), period, 30, 255), 143);
    }
}
