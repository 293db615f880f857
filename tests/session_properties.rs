use std::time::{Duration, Instant};

use proptest::prelude::*;

use keypace::passage::{Difficulty, Passage};
use keypace::session::{Mode, Session, TIME_LIMIT_MS};

#[derive(Debug, Clone)]
enum Op {
    Char(char),
    Backspace,
    Tick(u64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => prop::sample::select(vec!['a', 'b', 'c', ' ']).prop_map(Op::Char),
        2 => Just(Op::Backspace),
        1 => (0u64..5_000).prop_map(Op::Tick),
    ]
}

fn mode() -> impl Strategy<Value = Mode> {
    prop_oneof![Just(Mode::Timed), Just(Mode::Passage)]
}

fn apply(s: &mut Session, op: &Op, clock: &mut Instant) {
    match op {
        Op::Char(c) => s.on_char(*c, *clock),
        Op::Backspace => s.on_backspace(),
        Op::Tick(ms) => {
            *clock += Duration::from_millis(*ms);
            s.on_tick(*clock);
        }
    }
}

proptest! {
    #[test]
    fn cursor_tracks_typed_and_errors_only_grow(
        text in "[abc ]{0,20}",
        mode in mode(),
        ops in prop::collection::vec(op(), 0..80),
    ) {
        let mut s = Session::new(Passage::new("p", text.clone(), Difficulty::Easy), mode);
        let mut clock = Instant::now();
        let mut errors_before = 0;

        for op in &ops {
            apply(&mut s, op, &mut clock);

            prop_assert_eq!(s.cursor(), s.typed().chars().count());
            prop_assert!(s.cursor() <= text.chars().count());
            prop_assert!(s.errors().len() >= errors_before);
            prop_assert!(s.errors().iter().all(|&i| i < text.chars().count()));
            errors_before = s.errors().len();

            let m = s.metrics();
            prop_assert!(m.accuracy <= 100);
            if s.cursor() == 0 {
                prop_assert_eq!(m.accuracy, 100);
            }
            if s.elapsed_ms() == 0 {
                prop_assert_eq!(m.wpm, 0);
            }
            if mode == Mode::Timed {
                prop_assert!(s.elapsed_ms() <= TIME_LIMIT_MS);
            }
        }
    }

    #[test]
    fn finished_sessions_do_not_change(
        text in "[abc]{1,8}",
        mode in mode(),
        after in prop::collection::vec(op(), 0..30),
    ) {
        let mut s = Session::new(Passage::new("p", text.clone(), Difficulty::Easy), mode);
        let mut clock = Instant::now();
        for c in text.chars() {
            clock += Duration::from_millis(100);
            s.on_char(c, clock);
        }
        prop_assert!(s.has_finished());

        let typed = s.typed();
        let errors = s.errors().clone();
        let elapsed = s.elapsed_ms();
        let _ = s.drain_events().count();

        for op in &after {
            apply(&mut s, op, &mut clock);
        }

        prop_assert!(s.has_finished());
        prop_assert_eq!(s.typed(), typed);
        prop_assert_eq!(s.errors(), &errors);
        prop_assert_eq!(s.elapsed_ms(), elapsed);
        prop_assert_eq!(s.drain_events().count(), 0);
    }

    #[test]
    fn restart_returns_to_idle(
        text in "[abc]{1,10}",
        ops in prop::collection::vec(op(), 0..40),
    ) {
        let mut s = Session::new(Passage::new("p", text, Difficulty::Easy), Mode::Timed);
        let mut clock = Instant::now();
        for op in &ops {
            apply(&mut s, op, &mut clock);
        }

        s.restart();

        prop_assert!(!s.has_started());
        prop_assert!(!s.has_finished());
        prop_assert_eq!(s.cursor(), 0);
        prop_assert!(s.errors().is_empty());
        prop_assert_eq!(s.elapsed_ms(), 0);
    }
}
