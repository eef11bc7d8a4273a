mod common;
use crate::common::fakes::{Delivered, Messages, RecordingLauncher};
use crate::common::init_tracing;

use std::io;
use std::sync::Arc;

use procguard::errors::ProcguardError;
use procguard::interrupt::{EscalationAction, EscalationState, InterruptEscalation};

#[test]
fn state_machine_escalates_once_on_two_tier_platforms() {
    let (state, action) = EscalationState::Normal.on_interrupt(true);
    assert_eq!((state, action), (EscalationState::Terminating, EscalationAction::Stop));

    let (state, action) = state.on_interrupt(true);
    assert_eq!((state, action), (EscalationState::Terminating, EscalationAction::Kill));

    let (state, action) = state.on_interrupt(true);
    assert_eq!((state, action), (EscalationState::Terminating, EscalationAction::Kill));
}

#[test]
fn state_machine_repeats_stop_on_single_tier_platforms() {
    let mut state = EscalationState::default();
    for _ in 0..3 {
        let (next, action) = state.on_interrupt(false);
        assert_eq!(action, EscalationAction::Stop);
        assert_eq!(next, EscalationState::Terminating);
        state = next;
    }
}

#[test]
fn interrupts_notify_then_signal() {
    init_tracing();

    let launcher = RecordingLauncher::two_tier();
    let messages = Messages::new();
    let mut escalation = InterruptEscalation::new(4242, "web", messages.notifier())
        .with_launcher(Arc::new(launcher.clone()));

    assert_eq!(escalation.state(), EscalationState::Normal);
    assert_eq!(escalation.handle_interrupt().unwrap(), EscalationAction::Stop);
    assert_eq!(escalation.state(), EscalationState::Terminating);
    assert_eq!(escalation.handle_interrupt().unwrap(), EscalationAction::Kill);
    assert_eq!(escalation.handle_interrupt().unwrap(), EscalationAction::Kill);

    assert_eq!(
        messages.all(),
        ["Stopping web...", "Killing web...", "Killing web..."]
    );
    assert_eq!(
        launcher.delivered(),
        [
            Delivered::Terminate(4242),
            Delivered::Kill(4242),
            Delivered::Kill(4242)
        ]
    );
}

#[test]
fn single_tier_launcher_only_ever_stops() {
    init_tracing();

    let launcher = RecordingLauncher::single_tier();
    let messages = Messages::new();
    let mut escalation = InterruptEscalation::new(7, "job", messages.notifier())
        .with_launcher(Arc::new(launcher.clone()));

    escalation.handle_interrupt().unwrap();
    escalation.handle_interrupt().unwrap();

    assert_eq!(messages.all(), ["Stopping job...", "Stopping job..."]);
    assert_eq!(
        launcher.delivered(),
        [Delivered::Terminate(7), Delivered::Terminate(7)]
    );
}

#[test]
fn vanished_process_is_not_an_error() {
    init_tracing();

    let launcher = RecordingLauncher::two_tier().failing(io::ErrorKind::NotFound);
    let mut escalation =
        InterruptEscalation::new(99, "gone", |_: &str| {}).with_launcher(Arc::new(launcher));

    assert_eq!(escalation.handle_interrupt().unwrap(), EscalationAction::Stop);
    assert_eq!(escalation.handle_interrupt().unwrap(), EscalationAction::Kill);
}

#[test]
fn other_delivery_failures_are_signal_errors() {
    init_tracing();

    let launcher = RecordingLauncher::two_tier().failing(io::ErrorKind::PermissionDenied);
    let mut escalation =
        InterruptEscalation::new(1, "init", |_: &str| {}).with_launcher(Arc::new(launcher));

    let err = escalation.handle_interrupt().unwrap_err();
    assert!(matches!(err, ProcguardError::SignalError(_)), "{err:?}");
    // The state still advanced.
    assert_eq!(escalation.state(), EscalationState::Terminating);
}

#[cfg(unix)]
mod native {
    use super::*;
    use crate::common::builders::sh;
    use crate::common::with_timeout;

    use std::os::unix::process::ExitStatusExt;

    use procguard::exec::{ProcessGuard, SpawnOptions};
    use procguard::output::TextChunks;
    use procguard::types::StdioMode;

    #[tokio::test]
    async fn first_interrupt_terminates_a_real_child() {
        init_tracing();

        let mut guard = ProcessGuard::acquire(["sleep", "30"], &SpawnOptions::default()).unwrap();
        let messages = Messages::new();
        let mut escalation = InterruptEscalation::new(guard.pid(), "sleep", messages.notifier());

        assert_eq!(escalation.handle_interrupt().unwrap(), EscalationAction::Stop);

        let status = with_timeout(guard.handle_mut().wait()).await.unwrap();
        assert_eq!(status.signal(), Some(15));
        assert_eq!(messages.all(), ["Stopping sleep..."]);

        guard.release().await;
    }

    #[tokio::test]
    async fn second_interrupt_kills_a_child_ignoring_the_first() {
        init_tracing();

        let options = SpawnOptions::new().stdout(StdioMode::Piped);
        let mut guard =
            ProcessGuard::acquire(sh("trap '' TERM; echo ready; exec sleep 30"), &options).unwrap();
        let stdout = guard.handle_mut().take_stdout().unwrap();
        let mut chunks = TextChunks::new(stdout);
        assert_eq!(
            with_timeout(chunks.next_chunk()).await.unwrap().as_deref(),
            Some("ready\n")
        );

        let messages = Messages::new();
        let mut escalation = InterruptEscalation::new(guard.pid(), "stubborn", messages.notifier());

        escalation.handle_interrupt().unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert!(guard.handle_mut().is_running());

        assert_eq!(escalation.handle_interrupt().unwrap(), EscalationAction::Kill);
        let status = with_timeout(guard.handle_mut().wait()).await.unwrap();
        assert_eq!(status.signal(), Some(9));
        assert_eq!(messages.all(), ["Stopping stubborn...", "Killing stubborn..."]);

        guard.release().await;
    }

    #[tokio::test]
    async fn interrupting_an_exited_child_is_harmless() {
        init_tracing();

        let mut guard = ProcessGuard::acquire(["true"], &SpawnOptions::default()).unwrap();
        let pid = guard.pid();
        with_timeout(guard.handle_mut().wait()).await.unwrap();
        guard.release().await;

        let mut escalation = InterruptEscalation::new(pid, "true", |_: &str| {});
        assert_eq!(escalation.handle_interrupt().unwrap(), EscalationAction::Stop);
    }
}
