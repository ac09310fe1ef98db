//! Scripted input for the emulator.
//!
//! Exercises every reference module: counter keys and dials, a strip swipe,
//! the clock's seconds toggle and a spotlight round trip.

use std::time::Duration;

use surface::{DialId, KeyId, Point};
use surface_emulator::{Emulator, InputQueue};
use tokio_util::sync::CancellationToken;

/// One scripted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Press `key`, hold it, release.
    Key(KeyId, Duration),
    /// Turn a dial by signed detents.
    Turn(DialId, i8),
    /// Push and release a dial.
    Click(DialId),
    /// Tap the strip.
    Tap(Point),
    /// Swipe along the strip.
    Swipe(Point, Point),
    /// Do nothing for a while.
    Wait(Duration),
}

const fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

/// The default tour.
pub fn script() -> Vec<Step> {
    vec![
        Step::Wait(ms(1000)),
        // counter: +1 +1 -1, bigger steps, spin
        Step::Key(KeyId::Key6, ms(80)),
        Step::Key(KeyId::Key6, ms(80)),
        Step::Key(KeyId::Key5, ms(80)),
        Step::Turn(DialId::Dial2, 4),
        Step::Turn(DialId::Dial1, 3),
        Step::Swipe(Point::new(40, 50), Point::new(280, 50)),
        Step::Wait(ms(1000)),
        // clock: hide seconds
        Step::Tap(Point::new(600, 50)),
        Step::Wait(ms(1000)),
        // spotlight: open, pick the fifth choice
        Step::Key(KeyId::Key3, ms(900)),
        Step::Wait(ms(1500)),
        Step::Key(KeyId::Key5, ms(80)),
        Step::Wait(ms(1000)),
        // counter: dial press resets
        Step::Click(DialId::Dial1),
        Step::Wait(ms(1000)),
    ]
}

/// Play `steps` into the emulator's live session.
///
/// Waits for a session to exist first. Stops early on `cancel` or if the
/// session goes away mid-script.
pub async fn play(emulator: Emulator, steps: Vec<Step>, cancel: CancellationToken) {
    let Some(input) = cancel.run_until_cancelled(session(&emulator)).await else {
        return;
    };
    tracing::info!(steps = steps.len(), "demo script started");
    for step in steps {
        if cancel.is_cancelled() || !emulator.is_plugged() {
            tracing::info!("demo script interrupted");
            return;
        }
        tracing::debug!(?step, "demo step");
        if cancel.run_until_cancelled(perform(&input, step)).await.is_none() {
            return;
        }
    }
    tracing::info!("demo script finished");
}

async fn session(emulator: &Emulator) -> InputQueue {
    loop {
        if let Some(input) = emulator.input() {
            return input;
        }
        tokio::time::sleep(ms(50)).await;
    }
}

async fn perform(input: &InputQueue, step: Step) {
    match step {
        Step::Key(key, hold) => {
            input.press_key(key);
            tokio::time::sleep(hold).await;
            input.release_key(key);
        }
        Step::Turn(dial, ticks) => input.turn_dial(dial, ticks),
        Step::Click(dial) => {
            input.press_dial(dial);
            tokio::time::sleep(ms(80)).await;
            input.release_dial(dial);
        }
        Step::Tap(at) => input.tap_strip(at),
        Step::Swipe(from, to) => input.swipe_strip(from, to),
        Step::Wait(d) => tokio::time::sleep(d).await,
    }
    // Let the coordinator observe each step before the next one.
    tokio::time::sleep(ms(150)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_touches_every_module() {
        let steps = script();
        assert!(steps.contains(&Step::Key(KeyId::Key3, ms(900))));
        assert!(steps.iter().any(|s| matches!(s, Step::Tap(p) if p.x >= 400)));
        assert!(steps.iter().any(|s| matches!(s, Step::Turn(DialId::Dial1, _))));
    }

    #[tokio::test(start_paused = true)]
    async fn play_waits_for_a_session() {
        let emulator = Emulator::new();
        let cancel = CancellationToken::new();
        let player = tokio::spawn(play(
            emulator.clone(),
            vec![Step::Turn(DialId::Dial1, 2)],
            cancel.clone(),
        ));
        tokio::time::sleep(ms(500)).await;
        assert!(!player.is_finished());

        let (_device, _events) = emulator.connect().unwrap();
        player.await.unwrap();
        assert_eq!(emulator.input().unwrap().pending(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_playback() {
        let emulator = Emulator::new();
        let (_device, _events) = emulator.connect().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        play(emulator.clone(), script(), cancel).await;
        assert_eq!(emulator.input().unwrap().pending(), 0);
    }
}
