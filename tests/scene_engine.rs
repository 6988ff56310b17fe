mod tests {
    use embassy_time::{Duration, Instant};
    use hearse_director::BeamMap;
    use hearse_director::beam::{BeamMonitor, BeamTiming};
    use hearse_director::display::DisplayArbiter;
    use hearse_director::mock::{MockBoard, MockDisplay};
    use hearse_director::scene::{
        Force, Phase, SceneEngine, SceneId, SceneTimings, ShowMode, Transitions,
    };
    use hearse_director::trigger::TriggerChannel;

    const FOREVER: Duration = Duration::from_millis(0);

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    struct Rig {
        board: MockBoard,
        display: DisplayArbiter<MockDisplay>,
        beams: BeamMonitor,
        map: BeamMap,
        engine: SceneEngine,
    }

    impl Rig {
        fn new(hold: u64, cooldown: u64, mode: ShowMode) -> Self {
            let map = BeamMap::default();
            let beams = BeamMonitor::configure(
                &map.beam_configs(None),
                BeamTiming {
                    debounce: Duration::from_millis(10),
                    rearm: Duration::from_millis(0),
                },
                at(0),
            );
            let timings = SceneTimings {
                hold: Duration::from_millis(hold),
                cooldown: Duration::from_millis(cooldown),
            };
            Self {
                board: MockBoard::new(),
                display: DisplayArbiter::new(MockDisplay::new(), 10),
                beams,
                map,
                engine: SceneEngine::new(timings, mode, 7, at(0)),
            }
        }

        fn tick(&mut self, ms: u64) -> Transitions {
            self.beams.tick(&mut self.board, at(ms));
            self.engine.tick(
                &mut self.beams,
                &self.map,
                &mut self.display,
                &mut self.board,
                at(ms),
            )
        }

        fn run(&mut self, from: u64, to: u64) {
            for ms in from..to {
                self.tick(ms);
            }
        }
    }

    #[test]
    fn test_phases_follow_timers() {
        let mut rig = Rig::new(5_000, 20_000, ShowMode::Triggered);
        rig.tick(0);
        rig.engine.force(Force::Scene(SceneId::FrankenLab));
        let entered = rig.tick(1_000);
        assert_eq!(entered.len(), 1);
        assert_eq!(entered[0].scene, SceneId::FrankenLab);
        assert_eq!(entered[0].phase, Phase::Hold);

        rig.run(1_001, 6_000);
        assert_eq!(rig.engine.phase(), Phase::Hold);
        let entered = rig.tick(6_000);
        assert_eq!(entered[0].phase, Phase::Cooldown);

        rig.run(6_001, 26_000);
        assert_eq!(rig.engine.phase(), Phase::Cooldown);
        let entered = rig.tick(26_000);
        assert_eq!(entered[0].phase, Phase::Idle);
        assert_eq!(rig.engine.scene(), None);
        assert_eq!(rig.engine.last_scene(), Some(SceneId::FrankenLab));
    }

    #[test]
    fn test_outputs_follow_phase() {
        let mut rig = Rig::new(5_000, 20_000, ShowMode::Triggered);
        rig.tick(0);
        assert!(!rig.board.magnet);
        assert_eq!(rig.display.device().text(), "ARMD");

        rig.engine.force(Force::Scene(SceneId::FrankenLab));
        rig.tick(1);
        assert!(rig.board.magnet);
        assert!(rig.board.tone.is_some());
        assert_eq!(rig.display.owner(at(1)), Some("FRNK"));
        assert_eq!(rig.display.device().text(), "----");
        assert_eq!(rig.display.device().brightness, 15);

        // The hold started at 1
        rig.run(2, 5_001);
        assert!(rig.board.magnet);
        rig.tick(5_001);
        assert_eq!(rig.engine.phase(), Phase::Cooldown);
        assert!(!rig.board.magnet);
        assert_eq!(rig.board.tone, None);
        assert_eq!(rig.board.leds[1], hearse_director::Rgb::default());
        assert!(rig.board.leds[2].r > 0);
    }

    #[test]
    fn test_done_shows_before_countdown() {
        let mut rig = Rig::new(1_000, 20_000, ShowMode::Triggered);
        rig.engine.force(Force::Scene(SceneId::FrankenLab));
        rig.run(0, 1_000);
        let writes = rig.display.device().writes;

        rig.tick(1_000);
        assert_eq!(rig.engine.phase(), Phase::Cooldown);
        assert_eq!(rig.display.owner(at(1_000)), Some("FRNK"));
        assert_eq!(rig.display.device().text(), "DONE");
        assert_eq!(rig.display.device().writes, writes + 1);

        rig.run(1_001, 1_500);
        assert_eq!(rig.display.owner(at(1_499)), Some("FRNK"));
        assert_eq!(rig.display.device().text(), "DONE");
        assert_eq!(rig.display.device().brightness, 15);

        rig.tick(1_500);
        assert!(rig.display.is_free(at(1_500)));
        assert_eq!(rig.display.device().text(), "C 20");
        assert_eq!(rig.display.device().brightness, 10);
    }

    #[test]
    fn test_denied_display_does_not_gate_outputs() {
        let mut rig = Rig::new(1_000, 1_000, ShowMode::Triggered);
        assert!(rig.display.acquire("OPS", 200, FOREVER, at(0)));
        rig.engine.force(Force::Scene(SceneId::FrankenLab));
        rig.tick(0);
        assert_eq!(rig.engine.phase(), Phase::Hold);
        assert!(rig.board.magnet);
        assert_eq!(rig.display.owner(at(0)), Some("OPS"));
        assert_eq!(rig.display.device().writes, 0);

        rig.run(1, 1_001);
        assert_eq!(rig.engine.phase(), Phase::Cooldown);
        assert!(!rig.board.magnet);
        assert_eq!(rig.display.device().writes, 0);
    }

    #[test]
    fn test_lost_lease_is_reclaimed_on_renew() {
        let mut rig = Rig::new(5_000, 1_000, ShowMode::Triggered);
        assert!(rig.display.acquire("OPS", 200, Duration::from_millis(1_500), at(0)));
        rig.engine.force(Force::Scene(SceneId::FrankenLab));
        rig.run(0, 1_999);
        // The foreign lease lapsed at 1500, the next renew is at 2000
        assert!(!rig.display.is_owner("FRNK", at(1_998)));
        rig.run(1_999, 2_001);
        assert_eq!(rig.display.owner(at(2_000)), Some("FRNK"));
        assert_eq!(rig.display.device().brightness, 15);
    }

    #[test]
    fn test_beam_starts_its_scene() {
        let mut rig = Rig::new(1_000, 5_000, ShowMode::Triggered);
        rig.run(0, 100);
        // Beam 1 on pin 3 is mapped to the blood room
        rig.board.break_beam(3);
        rig.run(100, 111);
        assert_eq!(rig.engine.scene(), Some(SceneId::BloodRoom));
        assert_eq!(rig.engine.phase(), Phase::Hold);
        rig.board.clear_beam(3);

        // Ignored during hold
        rig.board.break_beam(2);
        rig.run(111, 600);
        rig.board.clear_beam(2);
        assert_eq!(rig.engine.scene(), Some(SceneId::BloodRoom));

        rig.run(600, 1_500);
        assert_eq!(rig.engine.phase(), Phase::Cooldown);

        // The same scene does not restart from its own cooldown
        rig.board.break_beam(3);
        rig.run(1_500, 1_600);
        rig.board.clear_beam(3);
        assert_eq!(rig.engine.phase(), Phase::Cooldown);

        // A different scene does
        rig.board.break_beam(4);
        rig.run(1_600, 1_611);
        assert_eq!(rig.engine.scene(), Some(SceneId::Graveyard));
        assert_eq!(rig.engine.phase(), Phase::Hold);
    }

    #[test]
    fn test_sequence_mode_chains_scenes() {
        let mut rig = Rig::new(100, 100, ShowMode::Sequence);
        let entered = rig.tick(0);
        assert_eq!(entered[0].scene, SceneId::Intro);
        assert_eq!(entered[0].phase, Phase::Hold);

        rig.run(1, 100);
        let entered = rig.tick(100);
        assert_eq!(entered[0].phase, Phase::Cooldown);

        rig.run(101, 200);
        let entered = rig.tick(200);
        assert_eq!(entered.len(), 2);
        assert_eq!((entered[0].scene, entered[0].phase), (SceneId::Intro, Phase::Idle));
        assert_eq!((entered[1].scene, entered[1].phase), (SceneId::BloodRoom, Phase::Hold));
    }

    #[test]
    fn test_standby_ignores_beams() {
        let mut rig = Rig::new(1_000, 1_000, ShowMode::Standby);
        rig.board.break_beam(2);
        rig.run(0, 200);
        assert_eq!(rig.engine.phase(), Phase::Idle);
        assert_eq!(rig.display.device().text(), "STBY");
        assert!(rig.board.leds.iter().all(|led| led.g == 0));
    }

    #[test]
    fn test_attract_ignores_beams() {
        let mut rig = Rig::new(1_000, 1_000, ShowMode::Attract);
        rig.board.break_beam(2);
        rig.run(0, 200);
        assert_eq!(rig.engine.phase(), Phase::Idle);
        assert_eq!(rig.display.device().text(), "ATTR");
        assert!(rig.board.leds[0].g > 0);
    }

    #[test]
    fn test_attract_lets_running_scene_finish() {
        let mut rig = Rig::new(1_000, 1_000, ShowMode::Triggered);
        rig.engine.force(Force::Scene(SceneId::FrankenLab));
        rig.run(0, 100);
        rig.engine.set_mode(ShowMode::Attract);
        rig.run(100, 1_000);
        assert_eq!(rig.engine.phase(), Phase::Hold);
        assert!(rig.board.magnet);

        rig.run(1_000, 2_001);
        assert_eq!(rig.engine.phase(), Phase::Idle);
        assert_eq!(rig.engine.scene(), None);
        assert_eq!(rig.display.device().text(), "ATTR");
    }

    #[test]
    fn test_standby_stops_running_scene() {
        let mut rig = Rig::new(5_000, 5_000, ShowMode::Triggered);
        rig.engine.force(Force::Scene(SceneId::FrankenLab));
        rig.run(0, 100);
        assert!(rig.board.magnet);

        rig.engine.set_mode(ShowMode::Standby);
        rig.tick(100);
        assert_eq!(rig.engine.phase(), Phase::Idle);
        assert!(!rig.board.magnet);
        assert_eq!(rig.board.tone, None);
        assert!(rig.display.is_free(at(100)));
    }

    #[test]
    fn test_forced_phase_without_scene_uses_franken_lab() {
        let mut rig = Rig::new(5_000, 5_000, ShowMode::Triggered);
        rig.tick(0);
        rig.engine.force(Force::Phase(Phase::Hold));
        rig.tick(1);
        assert_eq!(rig.engine.scene(), Some(SceneId::FrankenLab));

        rig.engine.force(Force::Phase(Phase::Cooldown));
        rig.tick(2);
        assert_eq!(rig.engine.phase(), Phase::Cooldown);
        assert_eq!(rig.display.device().text(), "DONE");

        rig.engine.force(Force::Phase(Phase::Idle));
        rig.tick(3);
        assert_eq!(rig.engine.phase(), Phase::Idle);

        // The last scene is reused once one has run
        rig.engine.force(Force::Scene(SceneId::Graveyard));
        rig.tick(4);
        rig.engine.force(Force::Phase(Phase::Idle));
        rig.tick(5);
        rig.engine.force(Force::Phase(Phase::Hold));
        rig.tick(6);
        assert_eq!(rig.engine.scene(), Some(SceneId::Graveyard));
    }

    #[test]
    fn test_higher_priority_scene_takes_display() {
        let mut rig = Rig::new(5_000, 5_000, ShowMode::Triggered);
        assert!(rig.display.acquire("OPS", 11, FOREVER, at(0)));
        rig.engine.force(Force::Scene(SceneId::Intro));
        rig.tick(0);
        assert_eq!(rig.display.owner(at(0)), Some("INTR"));
    }

    #[test]
    fn test_scene_codes() {
        assert_eq!(SceneId::parse("frankenlab"), Some(SceneId::FrankenLab));
        assert_eq!(SceneId::parse("18"), Some(SceneId::ExitHole));
        assert_eq!(SceneId::parse("16"), None);
        assert_eq!(SceneId::ExitHole.next_in_sequence(), SceneId::Intro);
        assert_eq!(SceneId::FrankenLab.code(), 1);
        assert!(SceneId::Standby.profile().is_none());
        assert_eq!(SceneId::FrankenLab.profile().map(|p| p.priority), Some(10));
        assert_eq!(ShowMode::parse("attract"), Some(ShowMode::Attract));
        assert_eq!(ShowMode::Standby.cue(), TriggerChannel::StopAll);
        assert_eq!(ShowMode::Sequence.cue(), TriggerChannel::StartLoop);
    }
}
