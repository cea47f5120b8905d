use randompin_core::{
    KeySnapshot, KeypadContainer, KeypadError, KeypadSession, ShuffleOutcome,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// In-memory stand-in for a keyguard keypad `ViewGroup`.
struct FakePad {
    children: Vec<KeySnapshot>,
    reorders: usize,
}

impl FakePad {
    fn full() -> Self {
        let mut children: Vec<KeySnapshot> = (1..=9)
            .map(|digit| KeySnapshot::new("com.android.keyguard.NumPadKey").with_digit_field(digit))
            .collect();
        children.push(
            KeySnapshot::new("com.android.keyguard.NumPadButton")
                .with_content_description("Delete"),
        );
        children.push(KeySnapshot::new("com.android.keyguard.NumPadKey").with_digit_field(0));
        children.push(
            KeySnapshot::new("com.android.keyguard.NumPadButton")
                .with_content_description("Enter"),
        );
        Self {
            children,
            reorders: 0,
        }
    }

    fn digits(&self) -> Vec<i32> {
        self.children
            .iter()
            .filter_map(|child| child.digit_field)
            .collect()
    }
}

impl KeypadContainer for FakePad {
    fn keys(&mut self) -> Result<Vec<KeySnapshot>, KeypadError> {
        Ok(self.children.clone())
    }

    fn reorder(&mut self, order: &[usize]) -> Result<(), KeypadError> {
        if order.len() != self.children.len() {
            return Err(KeypadError::Container("order length mismatch".to_string()));
        }
        self.children = order.iter().map(|idx| self.children[*idx].clone()).collect();
        self.reorders += 1;
        Ok(())
    }
}

struct BrokenPad;

impl KeypadContainer for BrokenPad {
    fn keys(&mut self) -> Result<Vec<KeySnapshot>, KeypadError> {
        Err(KeypadError::Container("view detached".to_string()))
    }

    fn reorder(&mut self, _order: &[usize]) -> Result<(), KeypadError> {
        unreachable!("reorder must not run when keys cannot be read")
    }
}

#[test]
fn shuffle_keeps_every_digit_and_moves_controls_last() {
    let mut pad = FakePad::full();
    let mut session = KeypadSession::default();
    let mut rng = StdRng::seed_from_u64(42);

    let outcome = session
        .shuffle_once(&mut pad, &mut rng)
        .expect("full pad shuffles");
    assert_eq!(outcome, ShuffleOutcome::Shuffled { digits: 10 });

    let mut digits = pad.digits();
    digits.sort_unstable();
    assert_eq!(digits, (0..=9).collect::<Vec<_>>());

    let tail: Vec<_> = pad.children[10..]
        .iter()
        .map(|child| child.content_description.clone().unwrap_or_default())
        .collect();
    assert_eq!(tail, vec!["Delete".to_string(), "Enter".to_string()]);
}

#[test]
fn latched_session_skips_until_bouncer_hides() {
    let mut pad = FakePad::full();
    let mut session = KeypadSession::default();
    let mut rng = StdRng::seed_from_u64(3);

    session.shuffle_once(&mut pad, &mut rng).expect("first");
    assert!(session.is_shuffled());
    assert_eq!(
        session.shuffle_once(&mut pad, &mut rng).expect("second"),
        ShuffleOutcome::AlreadyShuffled
    );
    assert_eq!(pad.reorders, 1);

    session.reset();
    assert!(!session.is_shuffled());
    session.shuffle_once(&mut pad, &mut rng).expect("after reset");
    assert_eq!(pad.reorders, 2);
}

#[test]
fn fresh_shuffle_ignores_latch() {
    let mut pad = FakePad::full();
    let mut session = KeypadSession::default();
    let mut rng = StdRng::seed_from_u64(9);

    session.shuffle_fresh(&mut pad, &mut rng).expect("first");
    session.shuffle_fresh(&mut pad, &mut rng).expect("second");
    assert_eq!(pad.reorders, 2);
}

#[test]
fn incomplete_pad_is_left_untouched_and_latch_stays_clear() {
    let mut pad = FakePad::full();
    pad.children.truncate(5);
    let before = pad.children.clone();
    let mut session = KeypadSession::default();
    let mut rng = StdRng::seed_from_u64(1);

    let err = session
        .shuffle_once(&mut pad, &mut rng)
        .expect_err("five digits are not a full pad");
    assert!(matches!(err, KeypadError::NotEnoughDigits { found: 5, .. }));
    assert_eq!(pad.children, before);
    assert!(!session.is_shuffled());
}

#[test]
fn relaxed_minimum_accepts_partial_pads() {
    let mut pad = FakePad::full();
    pad.children.truncate(5);
    let mut session = KeypadSession::new(1);
    let mut rng = StdRng::seed_from_u64(1);

    assert_eq!(
        session.shuffle_fresh(&mut pad, &mut rng).expect("relaxed"),
        ShuffleOutcome::Shuffled { digits: 5 }
    );
}

#[test]
fn container_errors_propagate() {
    let mut session = KeypadSession::default();
    let mut rng = StdRng::seed_from_u64(1);
    let err = session
        .shuffle_once(&mut BrokenPad, &mut rng)
        .expect_err("detached view");
    assert_eq!(err, KeypadError::Container("view detached".to_string()));
}
